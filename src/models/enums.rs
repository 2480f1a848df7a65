use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a project item.
///
/// Every item starts `Pending` and ends in a visible status; none of the
/// other states are truly terminal because retry and manual override
/// remain available (see `pipeline::state` for the transition rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Found,
    NotFound,
    ManualEntry,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::ManualEntry => "manual_entry",
        }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "found" => Ok(Self::Found),
            "not_found" => Ok(Self::NotFound),
            "manual_entry" => Ok(Self::ManualEntry),
            _ => Err(DatabaseError::InvalidEnum {
                field: "ItemStatus".into(),
                value: s.into(),
            }),
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
