use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ItemStatus;

/// One equipment line extracted from a project's contract.
///
/// Invariants (enforced by `pipeline::state`):
/// - status is never `Found` without a manual URL;
/// - `ManualEntry` always carries a user-supplied manual URL and no
///   product link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub raw_line: String,
    pub brand: Option<String>,
    pub model_number: Option<String>,
    pub product_name: Option<String>,
    pub status: ItemStatus,
    pub manual_url: Option<String>,
    pub notes: Option<String>,
    pub product_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

impl ProjectItem {
    /// Create a pending item from a parsed candidate's fields. Empty
    /// strings become None so the columns stay nullable.
    pub fn new_pending(
        project_id: Uuid,
        raw_line: &str,
        brand: &str,
        model_number: &str,
        product_name: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            raw_line: raw_line.to_string(),
            brand: non_empty(brand),
            model_number: non_empty(model_number),
            product_name: non_empty(product_name),
            status: ItemStatus::Pending,
            manual_url: None,
            notes: None,
            product_id: None,
            created_at: Utc::now().naive_utc(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pending_maps_empty_fields_to_none() {
        let item = ProjectItem::new_pending(
            Uuid::new_v4(),
            "Bosch SHP878ZD5N dishwasher",
            "Bosch",
            "SHP878ZD5N",
            "",
        );
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.brand.as_deref(), Some("Bosch"));
        assert_eq!(item.product_name, None);
        assert_eq!(item.manual_url, None);
        assert_eq!(item.product_id, None);
    }
}
