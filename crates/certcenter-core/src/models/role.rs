//! Role domain model.

use serde::{Deserialize, Serialize};

/// Role of a principal. Serialized as its integer code (`0`, `1`, `2`),
/// which is how the user store records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Role {
    User = 0,
    Creator = 1,
    Admin = 2,
}

impl TryFrom<i64> for Role {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Role::User),
            1 => Ok(Role::Creator),
            2 => Ok(Role::Admin),
            other => Err(format!("unknown role code {other}")),
        }
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role as i64
    }
}
