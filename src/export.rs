//! Read-only export view over a project's items. Produces plain rows
//! for a downstream formatter (spreadsheet, binder, web view); this
//! module formats nothing itself.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::ItemStatus;

/// One exported row: the item joined with its resolved product, where
/// one exists. `warranty_length` comes from the product record and is
/// empty for unresolved or manually entered items.
#[derive(Debug, Clone, Serialize)]
pub struct ItemExportView {
    pub raw_line: String,
    pub brand: Option<String>,
    pub model_number: Option<String>,
    pub product_name: Option<String>,
    pub status: ItemStatus,
    pub manual_url: Option<String>,
    pub warranty_length: Option<String>,
    pub notes: Option<String>,
}

/// All items of a project as export rows, in contract order.
pub fn project_export(
    conn: &Connection,
    project_id: &Uuid,
) -> Result<Vec<ItemExportView>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT i.raw_line, i.brand, i.model_number,
                COALESCE(NULLIF(p.product_name, ''), i.product_name) AS product_name,
                i.status, i.manual_url,
                NULLIF(p.warranty_length, '') AS warranty_length,
                i.notes
         FROM project_items i
         LEFT JOIN products p ON p.id = i.product_id
         WHERE i.project_id = ?1
         ORDER BY i.created_at, i.id",
    )?;

    let rows = stmt.query_map([project_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
        ))
    })?;

    let mut views = Vec::new();
    for row in rows {
        let (raw_line, brand, model_number, product_name, status, manual_url, warranty, notes) =
            row?;
        views.push(ItemExportView {
            raw_line,
            brand,
            model_number,
            product_name,
            status: status.parse()?,
            manual_url,
            warranty_length: warranty,
            notes,
        });
    }
    Ok(views)
}
