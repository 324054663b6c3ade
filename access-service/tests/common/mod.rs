//! Wiremock fixture of the hierarchy API shared by the integration tests.
#![allow(dead_code)]

use access_service::models::UserRecord;
use access_service::services::{GitLabClient, PaginationMode};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "glpat-test-token";

pub const DEVELOPER: i64 = 30;
pub const REPORTER: i64 = 20;
pub const MAINTAINER: i64 = 40;
pub const OWNER: i64 = 50;
pub const GUEST: i64 = 10;

pub struct Fixture {
    pub server: MockServer,
}

impl Fixture {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn client(&self) -> GitLabClient {
        self.client_with(PaginationMode::Accumulate)
    }

    pub fn client_with(&self, mode: PaginationMode) -> GitLabClient {
        GitLabClient::with_client(reqwest::Client::new(), &self.server.uri(), 100, mode)
    }

    /// `GET /groups/{id}` details.
    pub async fn group(&self, id: u64, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/groups/{}", id)))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(named(id, name)))
            .mount(&self.server)
            .await;
    }

    /// A single-page collection at `route`.
    pub async fn rows(&self, route: &str, rows: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(&self.server)
            .await;
    }

    /// Same as [`Fixture::rows`], asserting the route is hit exactly `times`.
    pub async fn rows_expect(&self, route: &str, rows: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Projects of the whole subtree (`include_subgroups=true`).
    pub async fn subtree_projects(&self, group_id: u64, rows: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/groups/{}/projects", group_id)))
            .and(query_param("include_subgroups", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    pub async fn status(&self, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// One group with its own roster, projects and subgroups, mounted for
    /// every discovery style.
    pub async fn mount_group(&self, group: &GroupSpec) {
        self.group(group.id, &group.name).await;
        self.rows(
            &format!("/groups/{}/members", group.id),
            Value::Array(group.members.clone()),
        )
        .await;
        self.rows(
            &format!("/groups/{}/projects", group.id),
            Value::Array(
                group
                    .projects
                    .iter()
                    .map(|p| named(p.id, &p.name))
                    .collect(),
            ),
        )
        .await;
        self.rows(
            &format!("/groups/{}/subgroups", group.id),
            Value::Array(group.subgroups.iter().map(|(id, name)| named(*id, name)).collect()),
        )
        .await;
        for project in &group.projects {
            self.rows(
                &format!("/projects/{}/members", project.id),
                Value::Array(project.members.clone()),
            )
            .await;
        }
    }

    /// Mount a whole tree: every group, plus descendant and subtree-project
    /// listings for `root`.
    pub async fn mount_tree(&self, root: u64, groups: &[GroupSpec]) {
        for group in groups {
            self.mount_group(group).await;
        }

        let descendants: Vec<Value> = groups
            .iter()
            .filter(|g| g.id != root)
            .map(|g| named(g.id, &g.name))
            .collect();
        self.rows(
            &format!("/groups/{}/descendant_groups", root),
            Value::Array(descendants),
        )
        .await;

        let projects: Vec<Value> = groups
            .iter()
            .flat_map(|g| g.projects.iter().map(|p| named(p.id, &p.name)))
            .collect();
        self.subtree_projects(root, Value::Array(projects)).await;
    }
}

#[derive(Debug, Clone)]
pub struct ProjectSpec {
    pub id: u64,
    pub name: String,
    pub members: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub id: u64,
    pub name: String,
    pub members: Vec<Value>,
    pub projects: Vec<ProjectSpec>,
    pub subgroups: Vec<(u64, String)>,
}

impl GroupSpec {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            members: Vec::new(),
            projects: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    pub fn member(mut self, row: Value) -> Self {
        self.members.push(row);
        self
    }

    pub fn project(mut self, id: u64, name: &str, members: Vec<Value>) -> Self {
        self.projects.push(ProjectSpec {
            id,
            name: name.to_string(),
            members,
        });
        self
    }

    pub fn subgroup(mut self, id: u64, name: &str) -> Self {
        self.subgroups.push((id, name.to_string()));
        self
    }
}

pub fn named(id: u64, name: &str) -> Value {
    json!({ "id": id, "name": name })
}

pub fn member(id: u64, name: &str, access_level: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "username": name.to_lowercase(),
        "access_level": access_level,
        "state": "active"
    })
}

/// G1 (Alice: Developer) with subgroup G2 (Bob: Maintainer) and project P1
/// under G1 (Alice: Reporter).
pub fn basic_tree() -> Vec<GroupSpec> {
    vec![
        GroupSpec::new(1, "G1")
            .member(member(7, "Alice", DEVELOPER))
            .project(11, "P1", vec![member(7, "Alice", REPORTER)])
            .subgroup(2, "G2"),
        GroupSpec::new(2, "G2").member(member(8, "Bob", MAINTAINER)),
    ]
}

/// Four groups, five projects, users granted in several places.
pub fn wide_tree() -> Vec<GroupSpec> {
    vec![
        GroupSpec::new(1, "Platform")
            .member(member(1, "Root", OWNER))
            .member(member(2, "Dana", MAINTAINER))
            .project(101, "gateway", vec![member(3, "Eli", DEVELOPER), member(2, "Dana", OWNER)])
            .subgroup(2, "Core")
            .subgroup(3, "Edge"),
        GroupSpec::new(2, "Core")
            .member(member(3, "Eli", DEVELOPER))
            .member(member(4, "Fay", REPORTER))
            .project(102, "engine", vec![member(4, "Fay", DEVELOPER)])
            .project(103, "storage", vec![member(5, "Gus", GUEST), member(3, "Eli", MAINTAINER)])
            .subgroup(4, "Core Tools"),
        GroupSpec::new(3, "Edge")
            .member(member(5, "Gus", REPORTER))
            .project(104, "cdn", vec![]),
        GroupSpec::new(4, "Core Tools")
            .member(member(2, "Dana", DEVELOPER))
            .project(105, "cli", vec![member(6, "Hal", DEVELOPER)]),
    ]
}

/// Records with grant lists sorted, for order-independent comparison.
pub fn normalized(mut users: Vec<UserRecord>) -> Vec<UserRecord> {
    for user in &mut users {
        user.groups.sort();
        user.projects.sort();
    }
    users.sort_by_key(|user| user.id);
    users
}
