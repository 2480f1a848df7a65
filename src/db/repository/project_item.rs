use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::{ItemStatus, ProjectItem};

const ITEM_COLUMNS: &str = "id, project_id, raw_line, brand, model_number, product_name, \
     status, manual_url, notes, product_id, created_at";

/// Bulk-insert the items created from one contract, in one transaction so
/// a partial batch never becomes visible.
pub fn insert_project_items(
    conn: &Connection,
    items: &[ProjectItem],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    for item in items {
        tx.execute(
            &format!(
                "INSERT INTO project_items ({ITEM_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                item.id.to_string(),
                item.project_id.to_string(),
                item.raw_line,
                item.brand,
                item.model_number,
                item.product_name,
                item.status.as_str(),
                item.manual_url,
                item.notes,
                item.product_id.map(|id| id.to_string()),
                fmt_ts(&item.created_at),
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_project_item(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ProjectItem>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM project_items WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], map_item_row);
    match result {
        Ok(row) => Ok(Some(item_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_project_items(
    conn: &Connection,
    project_id: &Uuid,
) -> Result<Vec<ProjectItem>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM project_items
         WHERE project_id = ?1 ORDER BY created_at, id"
    ))?;

    let rows = stmt.query_map(params![project_id.to_string()], map_item_row)?;
    let mut items = Vec::new();
    for row in rows {
        items.push(item_from_row(row?)?);
    }
    Ok(items)
}

pub fn update_project_item(conn: &Connection, item: &ProjectItem) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE project_items SET brand = ?2, model_number = ?3, product_name = ?4,
         status = ?5, manual_url = ?6, notes = ?7, product_id = ?8
         WHERE id = ?1",
        params![
            item.id.to_string(),
            item.brand,
            item.model_number,
            item.product_name,
            item.status.as_str(),
            item.manual_url,
            item.notes,
            item.product_id.map(|id| id.to_string()),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ProjectItem".into(),
            id: item.id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for ProjectItem mapping
struct ItemRow {
    id: String,
    project_id: String,
    raw_line: String,
    brand: Option<String>,
    model_number: Option<String>,
    product_name: Option<String>,
    status: String,
    manual_url: Option<String>,
    notes: Option<String>,
    product_id: Option<String>,
    created_at: String,
}

fn map_item_row(row: &rusqlite::Row) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        raw_line: row.get(2)?,
        brand: row.get(3)?,
        model_number: row.get(4)?,
        product_name: row.get(5)?,
        status: row.get(6)?,
        manual_url: row.get(7)?,
        notes: row.get(8)?,
        product_id: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn item_from_row(row: ItemRow) -> Result<ProjectItem, DatabaseError> {
    Ok(ProjectItem {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        project_id: Uuid::parse_str(&row.project_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        raw_line: row.raw_line,
        brand: row.brand,
        model_number: row.model_number,
        product_name: row.product_name,
        status: ItemStatus::from_str(&row.status)?,
        manual_url: row.manual_url,
        notes: row.notes,
        product_id: row.product_id.and_then(|s| Uuid::parse_str(&s).ok()),
        created_at: parse_ts(&row.created_at),
    })
}
