pub mod access_level;
pub mod hierarchy;
pub mod user_record;

pub use access_level::{label_for, AccessLevel};
pub use hierarchy::{Group, MembershipGrant, Project};
pub use user_record::{AccessWarning, UserRecord};
