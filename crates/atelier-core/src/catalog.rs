//! # Catalog Snapshots
//!
//! Read-only `id → entity` maps handed to the pure calculators.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fetch components ──► ComponentIndex ──┐                                │
//! │                                        ├──► one costing pass            │
//! │  fetch products   ──► ProductIndex   ──┘    (no store access inside)    │
//! │                                                                         │
//! │  Re-fetch before the next pass if prices may have changed.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::product::Product;
use crate::types::Component;

/// Snapshot of the component registry.
#[derive(Debug, Clone, Default)]
pub struct ComponentIndex {
    by_id: HashMap<String, Component>,
}

impl ComponentIndex {
    pub fn new(components: impl IntoIterator<Item = Component>) -> Self {
        ComponentIndex {
            by_id: components
                .into_iter()
                .map(|component| (component.id.clone(), component))
                .collect(),
        }
    }

    /// Looks up a component; `None` for blank or unknown ids.
    pub fn get(&self, id: Option<&str>) -> Option<&Component> {
        id.and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.by_id.values()
    }
}

impl FromIterator<Component> for ComponentIndex {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        ComponentIndex::new(iter)
    }
}

/// Snapshot of the product registry, used as the arena for composite
/// resolution.
#[derive(Debug, Clone, Default)]
pub struct ProductIndex {
    by_id: HashMap<String, Product>,
}

impl ProductIndex {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        ProductIndex {
            by_id: products
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.by_id.values()
    }
}

impl FromIterator<Product> for ProductIndex {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        ProductIndex::new(iter)
    }
}
