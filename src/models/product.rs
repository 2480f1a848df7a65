use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalize a model number for cache keying: strip all whitespace and
/// uppercase. Idempotent by construction.
pub fn normalize_model_number(raw: &str) -> String {
    raw.split_whitespace().collect::<String>().to_uppercase()
}

/// A resolved product record, shared across all projects.
///
/// Identified by normalized model number (unique). Unknown string fields
/// are empty, never null — the merge rule below depends on that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub brand: String,
    pub model_number: String,
    pub product_name: String,
    pub manual_url: String,
    pub manual_storage: String,
    pub warranty_length: String,
    pub last_verified: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Product {
    pub fn new(model_number: &str) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            brand: String::new(),
            model_number: normalize_model_number(model_number),
            product_name: String::new(),
            manual_url: String::new(),
            manual_storage: String::new(),
            warranty_length: String::new(),
            last_verified: now,
            created_at: now,
        }
    }

    /// Merge a newer record over this one, field by field: a non-empty
    /// incoming field wins, an empty incoming field keeps the existing
    /// value. Identity and creation time stay with the existing record;
    /// `last_verified` is refreshed.
    pub fn merged_with(&self, incoming: &Product) -> Product {
        Product {
            id: self.id,
            brand: pick(&incoming.brand, &self.brand),
            model_number: self.model_number.clone(),
            product_name: pick(&incoming.product_name, &self.product_name),
            manual_url: pick(&incoming.manual_url, &self.manual_url),
            manual_storage: pick(&incoming.manual_storage, &self.manual_storage),
            warranty_length: pick(&incoming.warranty_length, &self.warranty_length),
            last_verified: Utc::now().naive_utc(),
            created_at: self.created_at,
        }
    }
}

fn pick(incoming: &str, existing: &str) -> String {
    if incoming.trim().is_empty() {
        existing.to_string()
    } else {
        incoming.to_string()
    }
}
