use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository;
use crate::models::{normalize_model_number, Product};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache storage error: {0}")]
    Storage(String),
}

/// The product cache the resolver reads and writes. Keys are normalized
/// model numbers; `upsert` merges field-by-field and must be atomic per
/// key, so concurrent resolutions of the same model converge to one
/// merged record instead of clobbering each other.
///
/// Injected into the resolver rather than held as a process-wide
/// singleton, so tests substitute an in-memory mapping.
pub trait ProductCache: Send + Sync {
    fn lookup(&self, model_number: &str) -> Result<Option<Product>, CacheError>;

    fn upsert(&self, product: Product) -> Result<Product, CacheError>;
}

/// In-memory cache over a mutex-guarded map. The default for tests and
/// for single-run tooling without a database.
#[derive(Default)]
pub struct MemoryProductCache {
    entries: Mutex<HashMap<String, Product>>,
}

impl MemoryProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProductCache for MemoryProductCache {
    fn lookup(&self, model_number: &str) -> Result<Option<Product>, CacheError> {
        let key = normalize_model_number(model_number);
        let entries = self.entries.lock().expect("cache lock poisoned");
        Ok(entries.get(&key).cloned())
    }

    fn upsert(&self, product: Product) -> Result<Product, CacheError> {
        let key = normalize_model_number(&product.model_number);
        if key.is_empty() {
            return Err(CacheError::Storage("product model number is empty".into()));
        }

        // Lock held across read-merge-write: atomic per key.
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let stored = match entries.get(&key) {
            Some(existing) => existing.merged_with(&product),
            None => {
                let mut fresh = product;
                fresh.model_number = key.clone();
                fresh
            }
        };
        entries.insert(key, stored.clone());
        Ok(stored)
    }
}

/// Durable cache backed by the products table. The connection mutex
/// serializes upserts, which makes the read-merge-write in the
/// repository atomic per key.
pub struct SqliteProductCache {
    conn: Mutex<Connection>,
}

impl SqliteProductCache {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl ProductCache for SqliteProductCache {
    fn lookup(&self, model_number: &str) -> Result<Option<Product>, CacheError> {
        let conn = self.conn.lock().expect("cache lock poisoned");
        repository::get_product_by_model(&conn, model_number)
            .map_err(|e| CacheError::Storage(e.to_string()))
    }

    fn upsert(&self, product: Product) -> Result<Product, CacheError> {
        let conn = self.conn.lock().expect("cache lock poisoned");
        repository::upsert_product(&conn, &product)
            .map_err(|e| CacheError::Storage(e.to_string()))
    }
}
