//! # Record Store
//!
//! Schemaless JSON documents in the `data_store` table.
//!
//! ## Addressing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (collection, external_id) ──► data (JSON text)                         │
//! │                                                                         │
//! │  "productos" ─┐                                                         │
//! │  "producto"  ─┴─► products        "componentes" ─┐                      │
//! │  "categorias" ─┐                  "componente"  ─┴─► components         │
//! │  "categoria"  ─┴─► categories     "ventas" / "venta" ──► sales          │
//! │                                                                         │
//! │  put(doc without "id") ──► uuid v4 assigned and written into the doc   │
//! │  put(doc with "id": 12) ──► external_id "12" (ids are always text)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes are upserts on the primary key; `created_at` is kept and
//! `updated_at` is bumped.

use atelier_core::lenient;
use serde_json::Value;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Default page size of [`RecordStore::list`].
pub const DEFAULT_LIST_LIMIT: u32 = 200;

pub const PRODUCTS: &str = "products";
pub const COMPONENTS: &str = "components";
pub const SALES: &str = "sales";
pub const CATEGORIES: &str = "categories";

/// Maps a collection name or one of its legacy Spanish aliases to the
/// canonical collection.
pub fn resolve_collection(name: &str) -> &str {
    match name.trim() {
        "productos" | "producto" => PRODUCTS,
        "categorias" | "categoria" => CATEGORIES,
        "componentes" | "componente" => COMPONENTS,
        "ventas" | "venta" => SALES,
        other => other,
    }
}

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put { collection: String, document: Value },
    Delete { collection: String, id: String },
}

impl WriteOp {
    pub fn put(collection: &str, document: Value) -> Self {
        WriteOp::Put {
            collection: collection.to_string(),
            document,
        }
    }

    pub fn delete(collection: &str, id: impl Into<String>) -> Self {
        WriteOp::Delete {
            collection: collection.to_string(),
            id: id.into(),
        }
    }
}

/// Repository over the raw `data_store` table.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        RecordStore { pool }
    }

    /// Fetches one document.
    pub async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Value>> {
        let collection = resolve_collection(collection);

        let row = sqlx::query(
            r#"
            SELECT data
            FROM data_store
            WHERE collection = ?1 AND external_id = ?2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_row(&row)).transpose()
    }

    /// Lists up to `limit` documents in insertion order.
    pub async fn list(&self, collection: &str, limit: u32) -> DbResult<Vec<Value>> {
        self.list_with_limit(collection, i64::from(limit)).await
    }

    /// Lists every document of a collection.
    pub async fn list_all(&self, collection: &str) -> DbResult<Vec<Value>> {
        // SQLite treats a negative LIMIT as "no limit".
        self.list_with_limit(collection, -1).await
    }

    async fn list_with_limit(&self, collection: &str, limit: i64) -> DbResult<Vec<Value>> {
        let collection = resolve_collection(collection);

        let rows = sqlx::query(
            r#"
            SELECT data
            FROM data_store
            WHERE collection = ?1
            ORDER BY rowid
            LIMIT ?2
            "#,
        )
        .bind(collection)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(collection = %collection, count = rows.len(), "Listed records");
        rows.iter().map(decode_row).collect()
    }

    /// Upserts a document and returns it as stored (with its id).
    pub async fn put(&self, collection: &str, document: Value) -> DbResult<Value> {
        let collection = resolve_collection(collection);
        let (id, document) = with_id(document)?;
        upsert(&self.pool, collection, &id, &document).await?;
        debug!(collection = %collection, id = %id, "Stored record");
        Ok(document)
    }

    /// Deletes a document. Returns whether it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> DbResult<bool> {
        let collection = resolve_collection(collection);
        let deleted = remove(&self.pool, collection, id).await?;
        debug!(collection = %collection, id = %id, deleted, "Deleted record");
        Ok(deleted)
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM data_store WHERE collection = ?1")
            .bind(resolve_collection(collection))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Applies every write in one transaction; all succeed or none do.
    ///
    /// ## Returns
    /// The stored documents of the `Put` operations, in order.
    pub async fn apply(&self, ops: Vec<WriteOp>) -> DbResult<Vec<Value>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::new();

        for op in ops {
            match op {
                WriteOp::Put {
                    collection,
                    document,
                } => {
                    let collection = resolve_collection(&collection);
                    let (id, document) = with_id(document)?;
                    upsert(&mut *tx, collection, &id, &document).await?;
                    stored.push(document);
                }
                WriteOp::Delete { collection, id } => {
                    remove(&mut *tx, resolve_collection(&collection), &id).await?;
                }
            }
        }

        tx.commit().await?;
        debug!(writes = stored.len(), "Committed record batch");
        Ok(stored)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn decode_row(row: &sqlx::sqlite::SqliteRow) -> DbResult<Value> {
    let data: String = row.try_get("data")?;
    Ok(serde_json::from_str(&data)?)
}

/// Extracts the document id, assigning a fresh UUID when it has none.
fn with_id(mut document: Value) -> DbResult<(String, Value)> {
    let Some(object) = document.as_object_mut() else {
        return Err(DbError::invalid_document(
            "Record",
            "unknown",
            "document is not a JSON object",
        ));
    };

    let id = match object.get("id").and_then(lenient::id_from_value) {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            object.insert("id".to_string(), Value::String(id.clone()));
            id
        }
    };

    Ok((id, document))
}

async fn upsert<'e, E>(executor: E, collection: &str, id: &str, document: &Value) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let data = serde_json::to_string(document)?;
    sqlx::query(
        r#"
        INSERT INTO data_store (collection, external_id, data)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (collection, external_id) DO UPDATE SET
            data = excluded.data,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(data)
    .execute(executor)
    .await?;
    Ok(())
}

async fn remove<'e, E>(executor: E, collection: &str, id: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM data_store WHERE collection = ?1 AND external_id = ?2")
        .bind(collection)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use serde_json::json;

    async fn store() -> RecordStore {
        Database::new(DbConfig::in_memory()).await.unwrap().records()
    }

    #[test]
    fn test_aliases() {
        assert_eq!(resolve_collection("productos"), "products");
        assert_eq!(resolve_collection("categoria"), "categories");
        assert_eq!(resolve_collection("componentes"), "components");
        assert_eq!(resolve_collection("venta"), "sales");
        assert_eq!(resolve_collection("default"), "default");
    }

    #[tokio::test]
    async fn test_put_get_with_numeric_id() {
        let store = store().await;
        store
            .put("productos", json!({ "id": 12, "name": "Mochila" }))
            .await
            .unwrap();

        let doc = store.get("products", "12").await.unwrap().unwrap();
        assert_eq!(doc["name"], "Mochila");
        assert_eq!(doc["id"], 12);
    }

    #[tokio::test]
    async fn test_put_assigns_uuid() {
        let store = store().await;
        let doc = store.put("sales", json!({ "quantity": 1 })).await.unwrap();
        let id = doc["id"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 36);
        assert!(store.get("sales", &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_document() {
        let store = store().await;
        store.put("components", json!({ "id": "c1", "price": 10 })).await.unwrap();
        store.put("components", json!({ "id": "c1", "price": 12 })).await.unwrap();

        assert_eq!(store.count("components").await.unwrap(), 1);
        let doc = store.get("components", "c1").await.unwrap().unwrap();
        assert_eq!(doc["price"], 12);
    }

    #[tokio::test]
    async fn test_list_limit_and_order() {
        let store = store().await;
        for i in 0..5 {
            store.put("sales", json!({ "id": format!("s{i}") })).await.unwrap();
        }
        let page = store.list("sales", 3).await.unwrap();
        let ids: Vec<&str> = page.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["s0", "s1", "s2"]);
        assert_eq!(store.list_all("ventas").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = store().await;
        store.put("sales", json!({ "id": "s1" })).await.unwrap();
        assert!(store.delete("sales", "s1").await.unwrap());
        assert!(!store.delete("sales", "s1").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_non_object() {
        let store = store().await;
        let result = store.put("sales", json!([1, 2])).await;
        assert!(matches!(result, Err(DbError::InvalidDocument { .. })));
    }

    #[tokio::test]
    async fn test_apply_is_atomic() {
        let store = store().await;
        store.put("products", json!({ "id": "p1", "available": 3 })).await.unwrap();

        let result = store
            .apply(vec![
                WriteOp::put("sales", json!({ "id": "s1" })),
                WriteOp::delete("products", "p1"),
                WriteOp::put("sales", json!("not an object")),
            ])
            .await;

        assert!(result.is_err());
        assert_eq!(store.count("sales").await.unwrap(), 0);
        assert_eq!(store.count("products").await.unwrap(), 1);
    }
}
