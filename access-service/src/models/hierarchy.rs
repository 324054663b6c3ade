//! Wire shapes of the hierarchy API rows the aggregation reads.
//!
//! Only the fields the aggregation needs are declared; serde ignores the
//! rest of each upstream object.

use serde::{Deserialize, Serialize};

/// A container node in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
}

/// A leaf resource owned by some group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

/// One row of a group or project member roster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MembershipGrant {
    #[serde(rename = "id")]
    pub user_id: u64,
    pub name: String,
    pub username: String,
    #[serde(rename = "access_level")]
    pub access_level_code: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn membership_grant_reads_member_row() {
        let grant: MembershipGrant = serde_json::from_value(json!({
            "id": 7,
            "name": "Alice",
            "username": "alice",
            "access_level": 30,
            "state": "active",
            "web_url": "https://gitlab.example.com/alice"
        }))
        .unwrap();

        assert_eq!(grant.user_id, 7);
        assert_eq!(grant.username, "alice");
        assert_eq!(grant.access_level_code, 30);
    }
}
