//! Access level codes and their labels.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Permission tier of a grant.
///
/// Codes outside the known set are kept as `Unknown` instead of being
/// rejected, so one odd roster row never aborts an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    NoAccess,
    MinimalAccess,
    Guest,
    Planner,
    Reporter,
    Developer,
    Maintainer,
    Owner,
    Admin,
    Unknown(i64),
}

impl AccessLevel {
    pub const KNOWN: [AccessLevel; 9] = [
        AccessLevel::NoAccess,
        AccessLevel::MinimalAccess,
        AccessLevel::Guest,
        AccessLevel::Planner,
        AccessLevel::Reporter,
        AccessLevel::Developer,
        AccessLevel::Maintainer,
        AccessLevel::Owner,
        AccessLevel::Admin,
    ];

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => AccessLevel::NoAccess,
            5 => AccessLevel::MinimalAccess,
            10 => AccessLevel::Guest,
            15 => AccessLevel::Planner,
            20 => AccessLevel::Reporter,
            30 => AccessLevel::Developer,
            40 => AccessLevel::Maintainer,
            50 => AccessLevel::Owner,
            60 => AccessLevel::Admin,
            other => AccessLevel::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            AccessLevel::NoAccess => 0,
            AccessLevel::MinimalAccess => 5,
            AccessLevel::Guest => 10,
            AccessLevel::Planner => 15,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
            AccessLevel::Admin => 60,
            AccessLevel::Unknown(code) => *code,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, AccessLevel::Unknown(_))
    }

    pub fn label(&self) -> Cow<'static, str> {
        match label_for(self.code()) {
            Some(label) => Cow::Borrowed(label),
            None => Cow::Owned(format!("Unknown level {}", self.code())),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Label for one of the nine defined codes, `None` for anything else.
pub fn label_for(code: i64) -> Option<&'static str> {
    match code {
        0 => Some("No access"),
        5 => Some("Minimal access"),
        10 => Some("Guest"),
        15 => Some("Planner"),
        20 => Some("Reporter"),
        30 => Some("Developer"),
        40 => Some("Maintainer"),
        50 => Some("Owner"),
        60 => Some("Admin"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn developer_and_owner_labels() {
        assert_eq!(label_for(30), Some("Developer"));
        assert_eq!(label_for(50), Some("Owner"));
    }

    #[test]
    fn known_codes_are_bijective_with_labels() {
        let codes: HashSet<i64> = AccessLevel::KNOWN.iter().map(|l| l.code()).collect();
        let labels: HashSet<_> = AccessLevel::KNOWN.iter().map(|l| l.label()).collect();

        assert_eq!(codes, HashSet::from([0, 5, 10, 15, 20, 30, 40, 50, 60]));
        assert_eq!(labels.len(), 9);

        for level in AccessLevel::KNOWN {
            assert_eq!(AccessLevel::from_code(level.code()), level);
        }
    }

    #[test]
    fn level_labels_come_from_the_code_table() {
        for level in AccessLevel::KNOWN {
            assert_eq!(Some(level.label().as_ref()), label_for(level.code()));
        }
        assert_eq!(
            crate::models::user_record::grant_label("G1", AccessLevel::from_code(40)),
            format!("G1 ({})", label_for(40).unwrap())
        );
    }

    #[test]
    fn undefined_code_is_unknown() {
        let level = AccessLevel::from_code(35);
        assert_eq!(level, AccessLevel::Unknown(35));
        assert!(!level.is_known());
        assert_eq!(level.to_string(), "Unknown level 35");
        assert_eq!(label_for(35), None);
    }
}
