//! # Component Repository
//!
//! Raw materials: fabrics, notions and the confección labor entry.

use atelier_core::validation::validate_component;
use atelier_core::{Component, ComponentIndex, CoreError};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::records::{RecordStore, COMPONENTS};
use super::{decode_one, decode_valid};
use crate::error::DbResult;

const ENTITY: &str = "Component";

/// Repository for component documents.
#[derive(Debug, Clone)]
pub struct ComponentRepository {
    records: RecordStore,
}

impl ComponentRepository {
    pub fn new(records: RecordStore) -> Self {
        ComponentRepository { records }
    }

    /// Every readable component.
    pub async fn list(&self) -> DbResult<Vec<Component>> {
        let documents = self.records.list_all(COMPONENTS).await?;
        Ok(decode_valid(ENTITY, documents, serde_json::from_value::<Component>))
    }

    /// Snapshot for row calculators and tag recomputation.
    pub async fn index(&self) -> DbResult<ComponentIndex> {
        Ok(ComponentIndex::new(self.list().await?))
    }

    pub async fn get(&self, id: &str) -> DbResult<Component> {
        let document = self.records.get(COMPONENTS, id).await?;
        decode_one(ENTITY, id, document, serde_json::from_value::<Component>)
    }

    /// Validates and stores a component. Returns it with its id.
    pub async fn save(&self, component: &Component) -> DbResult<Component> {
        validate_component(component).map_err(CoreError::from)?;
        let stored = self
            .records
            .put(COMPONENTS, serde_json::to_value(component)?)
            .await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Replaces the purchase price of one component.
    #[instrument(skip(self))]
    pub async fn update_price(&self, id: &str, price: Decimal) -> DbResult<Component> {
        let mut component = self.get(id).await?;
        let old = component.price;
        component.price = price;
        let saved = self.save(&component).await?;
        debug!(id = %id, %old, new = %price, "Component price updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        self.records.delete(COMPONENTS, id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
