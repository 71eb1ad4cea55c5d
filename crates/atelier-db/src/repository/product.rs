//! # Product Repository
//!
//! Products, their cost summaries, and the one-time migration of default
//! price adjustments.
//!
//! ## Save Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product (edited)                                                       │
//! │       │                                                                 │
//! │       ├── validate_product                                              │
//! │       ├── prepare_for_save(component index)                             │
//! │       │      drop pending rows, re-tag confección,                      │
//! │       │      effective costoConfeccion, composite category              │
//! │       ├── to_document                                                   │
//! │       │      priceAdjustments + modificadores (pricing and root)        │
//! │       ▼                                                                 │
//! │  data_store["products"]                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use atelier_core::adjustments::ensure_default_adjustments;
use atelier_core::costing::{summarize, CostSummary};
use atelier_core::validation::validate_product;
use atelier_core::{CoreError, Product, ProductIndex};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::component::ComponentRepository;
use super::records::{RecordStore, WriteOp, PRODUCTS};
use super::{decode_one, decode_valid};
use crate::error::DbResult;

const ENTITY: &str = "Product";

/// Outcome of [`ProductRepository::migrate_default_adjustments`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub scanned: usize,
    pub migrated: usize,
}

/// Repository for product documents.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    records: RecordStore,
}

impl ProductRepository {
    pub fn new(records: RecordStore) -> Self {
        ProductRepository { records }
    }

    /// Every readable product. Documents with an unknown `type` or a
    /// composite carrying material rows are skipped.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let documents = self.records.list_all(PRODUCTS).await?;
        Ok(decode_valid(ENTITY, documents, Product::from_document))
    }

    /// Snapshot used to resolve composite parts.
    pub async fn index(&self) -> DbResult<ProductIndex> {
        Ok(ProductIndex::new(self.list().await?))
    }

    pub async fn get(&self, id: &str) -> DbResult<Product> {
        let document = self.records.get(PRODUCTS, id).await?;
        decode_one(ENTITY, id, document, Product::from_document)
    }

    /// Normalizes and stores a product. Returns it as stored.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn save(&self, mut product: Product) -> DbResult<Product> {
        validate_product(&product).map_err(CoreError::from)?;

        let components = ComponentRepository::new(self.records.clone()).index().await?;
        product.prepare_for_save(&components);

        let stored = self.records.put(PRODUCTS, product.to_document()?).await?;
        debug!("Product saved");
        Ok(Product::from_document(stored)?)
    }

    /// Loads a product and computes its cost summary against the current
    /// catalog.
    pub async fn cost_summary(&self, id: &str) -> DbResult<(Product, CostSummary)> {
        let products = self.index().await?;
        let product = products
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        let summary = summarize(&product, &products);
        Ok((product, summary))
    }

    /// Adds the default price adjustments to every product that has not been
    /// migrated yet. Only changed products are written, all in one batch.
    #[instrument(skip(self))]
    pub async fn migrate_default_adjustments(&self) -> DbResult<MigrationReport> {
        let products = self.list().await?;
        let scanned = products.len();

        let writes: Vec<WriteOp> = products
            .into_iter()
            .filter_map(|mut product| {
                ensure_default_adjustments(&mut product)
                    .then(|| product.to_document().map(|doc| WriteOp::put(PRODUCTS, doc)))
            })
            .collect::<Result<_, _>>()?;
        let migrated = writes.len();

        if migrated > 0 {
            self.records.apply(writes).await?;
        }

        info!(scanned, migrated, "Default adjustments migrated");
        Ok(MigrationReport { scanned, migrated })
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        self.records.delete(PRODUCTS, id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use rust_decimal::Decimal;
    use serde_json::json;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed(db: &Database) {
        let records = db.records();
        for doc in [
            json!({ "id": "mano", "name": "Confección mochila", "category": "Mano de obra", "price": 3000 }),
            json!({ "id": "hebilla", "name": "Hebilla", "category": "herrajes", "price": 200 }),
        ] {
            records.put("components", doc).await.unwrap();
        }
        for doc in [
            json!({
                "id": "mochila", "name": "Mochila", "type": "simple", "costoConfeccion": 999,
                "priceAdjustments": [{ "name": "Inflación", "percent": 2 }],
                "componentes": { "telas": [], "otros": [
                    { "componentId": "hebilla", "unidades": 2, "precioUnitario": 200 },
                    { "componentId": "mano", "unidades": 1, "precioUnitario": 3000, "tagConfeccion": true },
                    { "unidades": 4 }
                ]}
            }),
            json!({ "id": "set", "name": "Set viaje", "type": "composite", "category": "Bolsos",
                    "compositeItems": [{ "productId": "mochila" }] }),
            json!({ "id": "raro", "name": "Raro", "type": "bundle" }),
        ] {
            records.put("productos", doc).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_list_skips_unknown_type() {
        let db = db().await;
        seed(&db).await;

        let products = db.products().list().await.unwrap();
        assert_eq!(products.len(), 2);
        assert!(matches!(
            db.products().get("raro").await,
            Err(DbError::InvalidDocument { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_normalizes_rows_and_labor() {
        let db = db().await;
        seed(&db).await;

        let mut product = db.products().get("mochila").await.unwrap();
        // Stale tags are re-derived from the component names.
        let otros = &mut product.componentes_mut().unwrap().otros;
        otros[0].tag_confeccion = true;
        otros[1].tag_confeccion = false;
        let saved = db.products().save(product).await.unwrap();

        let componentes = saved.componentes().unwrap();
        assert_eq!(componentes.otros.len(), 2);
        assert!(!componentes.otros[0].tag_confeccion);
        assert!(componentes.otros[1].tag_confeccion);
        assert_eq!(saved.costo_confeccion(), Decimal::from(3000));

        let stored = db.records().get("products", "mochila").await.unwrap().unwrap();
        assert!(stored["pricing"]["modificadores"].is_object());
        assert!(stored["modificadores"].is_object());
    }

    #[tokio::test]
    async fn test_cost_summary_resolves_composites() {
        let db = db().await;
        seed(&db).await;

        let (product, summary) = db.products().cost_summary("set").await.unwrap();
        assert_eq!(product.category, atelier_core::COMPOSITE_CATEGORY);
        assert!(summary.is_composite);
        assert_eq!(summary.cost_materials, Decimal::from(400));
        assert_eq!(summary.estimated_gain, Decimal::from(3000));
        assert_eq!(summary.breakdown.len(), 1);
    }

    #[tokio::test]
    async fn test_cost_summary_missing_product() {
        let db = db().await;
        let result = db.products().cost_summary("nope").await;
        assert!(matches!(result, Err(DbError::Core(CoreError::ProductNotFound(_)))));
    }

    #[tokio::test]
    async fn test_migrate_default_adjustments_once() {
        let db = db().await;
        seed(&db).await;

        let first = db.products().migrate_default_adjustments().await.unwrap();
        assert_eq!(first, MigrationReport { scanned: 2, migrated: 2 });

        let mochila = db.products().get("mochila").await.unwrap();
        assert!(mochila.defaults_migrated);
        assert!(!mochila.price_adjustments.is_empty());

        let second = db.products().migrate_default_adjustments().await.unwrap();
        assert_eq!(second.migrated, 0);
    }
}
