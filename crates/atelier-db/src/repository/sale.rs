//! # Sale Repository
//!
//! Recording, editing and deleting sales, with the product stock kept in
//! step.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── build_sale() snapshots cost + labor, reconciles payments       │
//! │     └── ┌ SINGLE TRANSACTION ───────────────────────────┐              │
//! │         │ put sale                                      │              │
//! │         │ put product (available − quantity, floor 0)   │              │
//! │         └───────────────────────────────────────────────┘              │
//! │                                                                         │
//! │  2. EDIT                                                               │
//! │     └── apply_edit() per field, full pipeline re-run, put sale         │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── ┌ SINGLE TRANSACTION ───────────────────────────┐              │
//! │         │ delete sale                                   │              │
//! │         │ put product (available + quantity)            │              │
//! │         └───────────────────────────────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use atelier_core::payments::SaleFinancials;
use atelier_core::sales::{build_sale, NewSale};
use atelier_core::validation::validate_id;
use atelier_core::{CoreError, Sale, SaleEdit};
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::product::ProductRepository;
use super::records::{RecordStore, WriteOp, PRODUCTS, SALES};
use super::{decode_one, decode_valid};
use crate::error::DbResult;

const ENTITY: &str = "Sale";

/// Repository for sale documents.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    records: RecordStore,
}

impl SaleRepository {
    pub fn new(records: RecordStore) -> Self {
        SaleRepository { records }
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.records.clone())
    }

    /// Every readable sale, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let documents = self.records.list_all(SALES).await?;
        Ok(decode_valid(ENTITY, documents, serde_json::from_value::<Sale>))
    }

    pub async fn get(&self, id: &str) -> DbResult<Sale> {
        let document = self.records.get(SALES, id).await?;
        decode_one(ENTITY, id, document, serde_json::from_value::<Sale>)
    }

    /// Records a sale and takes the quantity out of the product's stock.
    ///
    /// `today` is used when the input carries no date.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create(&self, input: NewSale, today: NaiveDate) -> DbResult<Sale> {
        validate_id("productId", &input.product_id).map_err(CoreError::from)?;

        let products = self.products().index().await?;
        let mut product = products
            .get(&input.product_id)
            .cloned()
            .ok_or_else(|| CoreError::ProductNotFound(input.product_id.clone()))?;

        let sale = build_sale(
            input,
            &product,
            &products,
            Uuid::new_v4().to_string(),
            today,
        )?;
        product.decrement_stock(sale.quantity);

        self.records
            .apply(vec![
                WriteOp::put(SALES, serde_json::to_value(&sale)?),
                WriteOp::put(PRODUCTS, product.to_document()?),
            ])
            .await?;

        info!(
            sale_id = %sale.id,
            total = %sale.total,
            available = product.available,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Applies edits in order, re-running the payment pipeline after each,
    /// and stores the result.
    pub async fn update(&self, id: &str, edits: &[SaleEdit]) -> DbResult<(Sale, SaleFinancials)> {
        let mut sale = self.get(id).await?;
        let mut financials = sale.financials();
        for edit in edits {
            financials = sale.apply_edit(*edit);
        }
        self.records.put(SALES, serde_json::to_value(&sale)?).await?;
        debug!(sale_id = %id, status = %financials.payment_status, "Sale updated");
        Ok((sale, financials))
    }

    /// Marks the whole effective value as received.
    pub async fn mark_paid(&self, id: &str) -> DbResult<(Sale, SaleFinancials)> {
        let total = self.get(id).await?.financials().effective_sale_value;
        self.update(id, &[SaleEdit::PaymentReceived(total)]).await
    }

    /// Re-runs reconciliation over every stored sale and writes back the
    /// ones whose figures changed. Returns how many were rewritten.
    pub async fn reconcile_all(&self) -> DbResult<usize> {
        let writes: Vec<WriteOp> = self
            .list()
            .await?
            .into_iter()
            .filter_map(|mut sale| {
                let before = sale.clone();
                sale.reconcile();
                (sale != before).then(|| serde_json::to_value(&sale).map(|doc| WriteOp::put(SALES, doc)))
            })
            .collect::<Result<_, _>>()?;
        let changed = writes.len();
        if changed > 0 {
            self.records.apply(writes).await?;
        }
        info!(changed, "Sales reconciled");
        Ok(changed)
    }

    /// Deletes a sale and puts its quantity back into stock.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> DbResult<Sale> {
        let sale = self.get(id).await?;
        let mut writes = vec![WriteOp::delete(SALES, id)];

        match self.products().get(&sale.product_id).await {
            Ok(mut product) => {
                product.restock(sale.quantity);
                writes.push(WriteOp::put(PRODUCTS, product.to_document()?));
            }
            Err(err) => {
                warn!(product_id = %sale.product_id, error = %err, "Sold product unavailable, stock not restored");
            }
        }

        self.records.apply(writes).await?;
        info!(sale_id = %id, "Sale deleted");
        Ok(sale)
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
    use atelier_core::PaymentStatus;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    async fn db_with_product() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.records()
            .put(
                "products",
                json!({ "id": "p1", "name": "Cartuchera", "type": "simple", "available": 3,
                        "price": 100, "costoConfeccion": 50 }),
            )
            .await
            .unwrap();
        db
    }

    fn new_sale(quantity: i64) -> NewSale {
        NewSale {
            product_id: "p1".into(),
            quantity: Decimal::from(quantity),
            ..NewSale::default()
        }
    }

    #[tokio::test]
    async fn test_create_decrements_stock() {
        let db = db_with_product().await;
        let sale = db.sales().create(new_sale(2), today()).await.unwrap();

        assert_eq!(sale.total, Decimal::from(300));
        assert_eq!(sale.date, Some(today()));
        assert_eq!(db.products().get("p1").await.unwrap().available, 1);

        // Stock never goes below zero.
        db.sales().create(new_sale(5), today()).await.unwrap();
        assert_eq!(db.products().get("p1").await.unwrap().available, 0);
        assert_eq!(db.sales().list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_unknown_product() {
        let db = db_with_product().await;
        let input = NewSale {
            product_id: "zz".into(),
            ..new_sale(1)
        };
        let result = db.sales().create(input, today()).await;
        assert!(matches!(result, Err(DbError::Core(CoreError::ProductNotFound(_)))));
    }

    #[tokio::test]
    async fn test_update_and_mark_paid() {
        let db = db_with_product().await;
        let sale = db.sales().create(new_sale(2), today()).await.unwrap();

        let (updated, financials) = db
            .sales()
            .update(&sale.id, &[SaleEdit::PaymentPending(Decimal::from(200))])
            .await
            .unwrap();
        assert_eq!(updated.payment_received, Some(Decimal::from(100)));
        assert_eq!(financials.payment_status, PaymentStatus::Partial);

        let (paid, financials) = db.sales().mark_paid(&sale.id).await.unwrap();
        assert_eq!(paid.payment_pending, Some(Decimal::ZERO));
        assert_eq!(financials.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_delete_restocks() {
        let db = db_with_product().await;
        let sale = db.sales().create(new_sale(2), today()).await.unwrap();

        db.sales().delete(&sale.id).await.unwrap();

        assert_eq!(db.products().get("p1").await.unwrap().available, 3);
        assert!(matches!(
            db.sales().get(&sale.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reconcile_all_heals_legacy_records() {
        let db = db_with_product().await;
        db.records()
            .put(
                "ventas",
                json!({ "id": "old", "productId": "p1", "quantity": "2", "unitPrice": "100",
                        "gananciaUnit": 50, "total": 10, "paymentReceived": 500 }),
            )
            .await
            .unwrap();

        assert_eq!(db.sales().reconcile_all().await.unwrap(), 1);
        let healed = db.sales().get("old").await.unwrap();
        assert_eq!(healed.total, Decimal::from(300));
        assert_eq!(healed.payment_received, Some(Decimal::from(300)));
        assert_eq!(healed.payment_pending, Some(Decimal::ZERO));

        assert_eq!(db.sales().reconcile_all().await.unwrap(), 0);
    }
}
