//! # Repository Module
//!
//! Typed access to the documents of the record store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories over one table                          │
//! │                                                                         │
//! │  ComponentRepository   ProductRepository   SaleRepository              │
//! │          │                     │                  │                     │
//! │          │ Component           │ Product          │ Sale                │
//! │          │ (serde)             │ (simple|composite)│ (serde)            │
//! │          └─────────────────────┼──────────────────┘                     │
//! │                                ▼                                        │
//! │                         RecordStore (JSON)                              │
//! │                                │                                        │
//! │                                ▼                                        │
//! │                      data_store (SQLite)                                │
//! │                                                                         │
//! │  list: invalid documents are skipped with a warning                    │
//! │  get:  an invalid document is an error                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`RecordStore`](records::RecordStore) - Raw documents, aliases, batches
//! - [`ComponentRepository`](component::ComponentRepository) - Components and prices
//! - [`ProductRepository`](product::ProductRepository) - Products, costing, migration
//! - [`SaleRepository`](sale::SaleRepository) - Sales with stock bookkeeping

pub mod component;
pub mod product;
pub mod records;
pub mod sale;

use std::fmt::Display;

use serde_json::Value;
use tracing::warn;

use crate::error::{DbError, DbResult};

/// Decodes a listing, dropping documents that fail to decode.
pub(crate) fn decode_valid<T, E, F>(entity: &str, documents: Vec<Value>, decode: F) -> Vec<T>
where
    E: Display,
    F: Fn(Value) -> Result<T, E>,
{
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document_id(&document);
            match decode(document) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(entity = %entity, id = %id, error = %err, "Skipping invalid document");
                    None
                }
            }
        })
        .collect()
}

/// Decodes a single fetched document.
pub(crate) fn decode_one<T, E, F>(
    entity: &str,
    id: &str,
    document: Option<Value>,
    decode: F,
) -> DbResult<T>
where
    E: Display,
    F: FnOnce(Value) -> Result<T, E>,
{
    let document = document.ok_or_else(|| DbError::not_found(entity, id))?;
    decode(document).map_err(|err| DbError::invalid_document(entity, id, err))
}

fn document_id(document: &Value) -> String {
    document
        .get("id")
        .and_then(atelier_core::lenient::id_from_value)
        .unwrap_or_else(|| "?".to_string())
}
