use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A project groups the line items created from one contract upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Reference to the stored contract file (path or storage key); the
    /// pipeline only records it, storage itself lives elsewhere.
    pub contract_file: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Project {
    pub fn new(name: &str, contract_file: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            contract_file: contract_file.map(str::to_string),
            created_at: Utc::now().naive_utc(),
        }
    }
}
