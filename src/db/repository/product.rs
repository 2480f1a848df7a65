use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::{normalize_model_number, Product};

const PRODUCT_COLUMNS: &str = "id, brand, model_number, product_name, manual_url, \
     manual_storage, warranty_length, last_verified, created_at";

pub fn get_product_by_model(
    conn: &Connection,
    model_number: &str,
) -> Result<Option<Product>, DatabaseError> {
    let model = normalize_model_number(model_number);
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE model_number = ?1"
    ))?;

    let result = stmt.query_row(params![model], map_product_row);
    match result {
        Ok(row) => Ok(Some(product_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert or merge a product, keyed by normalized model number.
///
/// An existing record is merged field-by-field (non-empty incoming fields
/// win, empty ones keep the stored value) and its last_verified refreshed.
/// Returns the stored record. Callers needing per-key atomicity serialize
/// access to the connection (see `SqliteProductCache`).
pub fn upsert_product(conn: &Connection, product: &Product) -> Result<Product, DatabaseError> {
    let model = normalize_model_number(&product.model_number);
    if model.is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "product model number is empty".into(),
        ));
    }

    match get_product_by_model(conn, &model)? {
        Some(existing) => {
            let merged = existing.merged_with(product);
            conn.execute(
                "UPDATE products SET brand = ?2, product_name = ?3, manual_url = ?4,
                 manual_storage = ?5, warranty_length = ?6, last_verified = ?7
                 WHERE id = ?1",
                params![
                    merged.id.to_string(),
                    merged.brand,
                    merged.product_name,
                    merged.manual_url,
                    merged.manual_storage,
                    merged.warranty_length,
                    fmt_ts(&merged.last_verified),
                ],
            )?;
            Ok(merged)
        }
        None => {
            let mut fresh = product.clone();
            fresh.model_number = model;
            conn.execute(
                &format!(
                    "INSERT INTO products ({PRODUCT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    fresh.id.to_string(),
                    fresh.brand,
                    fresh.model_number,
                    fresh.product_name,
                    fresh.manual_url,
                    fresh.manual_storage,
                    fresh.warranty_length,
                    fmt_ts(&fresh.last_verified),
                    fmt_ts(&fresh.created_at),
                ],
            )?;
            Ok(fresh)
        }
    }
}

pub fn list_products(conn: &Connection) -> Result<Vec<Product>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
    ))?;

    let rows = stmt.query_map([], map_product_row)?;
    let mut products = Vec::new();
    for row in rows {
        products.push(product_from_row(row?)?);
    }
    Ok(products)
}

// Internal row type for Product mapping
struct ProductRow {
    id: String,
    brand: String,
    model_number: String,
    product_name: String,
    manual_url: String,
    manual_storage: String,
    warranty_length: String,
    last_verified: String,
    created_at: String,
}

fn map_product_row(row: &rusqlite::Row) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        id: row.get(0)?,
        brand: row.get(1)?,
        model_number: row.get(2)?,
        product_name: row.get(3)?,
        manual_url: row.get(4)?,
        manual_storage: row.get(5)?,
        warranty_length: row.get(6)?,
        last_verified: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn product_from_row(row: ProductRow) -> Result<Product, DatabaseError> {
    Ok(Product {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        brand: row.brand,
        model_number: row.model_number,
        product_name: row.product_name,
        manual_url: row.manual_url,
        manual_storage: row.manual_storage,
        warranty_length: row.warranty_length,
        last_verified: parse_ts(&row.last_verified),
        created_at: parse_ts(&row.created_at),
    })
}
