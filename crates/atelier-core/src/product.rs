//! # Products
//!
//! A product is either **simple** (its own fabric and material rows) or
//! **composite** (a set built from other products). The stored document
//! carries a `type` string; here the two shapes are separate variants so
//! the rest of the crate never has to guess.
//!
//! ## Boundary Validation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored JSON ──► ProductDocument ──TryFrom──► Product ──Into──► JSON     │
//! │                  (lenient fields)    │                                  │
//! │                                      ├─ type absent / "simple"          │
//! │                                      │      → ProductKind::Simple       │
//! │                                      ├─ type "composite", no rows       │
//! │                                      │      → ProductKind::Composite    │
//! │                                      ├─ type "composite" + rows → Err   │
//! │                                      └─ any other type          → Err   │
//! │                                                                         │
//! │  On load  priceAdjustments ⊕ modificadores → price_adjustments          │
//! │  On write price_adjustments → priceAdjustments, modificadores,          │
//! │                               pricing.modificadores                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::adjustments;
use crate::catalog::ComponentIndex;
use crate::costing;
use crate::error::{CoreError, CoreResult};
use crate::lenient;
use crate::money::round_to;
use crate::rows;
use crate::text;
use crate::types::{
    Componentes, CompositeItem, FabricRow, MaterialRow, PriceAdjustment, COMPOSITE_CATEGORY,
};

/// Key of the legacy modifiers map, both at the root and under `pricing`.
const MODIFIERS_KEY: &str = "modificadores";

// =============================================================================
// Product Type
// =============================================================================

/// The `type` discriminator of a product document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Simple,
    Composite,
}

impl ProductType {
    /// Reads the stored discriminator. Absent or blank means simple.
    pub fn parse(raw: Option<&str>) -> CoreResult<Self> {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(ProductType::Simple);
        };
        match text::fold(raw).as_str() {
            "simple" => Ok(ProductType::Simple),
            "composite" => Ok(ProductType::Composite),
            _ => Err(CoreError::UnknownProductType(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Simple => "simple",
            ProductType::Composite => "composite",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// What a product is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductKind {
    /// Made from material rows.
    Simple {
        componentes: Componentes,
        /// Manual labor cost, used when no row is tagged confección.
        costo_confeccion: Decimal,
    },
    /// A set of other products.
    Composite { items: Vec<CompositeItem> },
}

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductDocument", into = "ProductDocument")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Units in stock.
    pub available: i64,
    pub featured: bool,
    pub comment: Option<String>,
    /// Data URL; opaque here.
    pub image: Option<String>,
    /// Flat price of legacy products that have no rows.
    pub price: Decimal,
    pub price_adjustments: Vec<PriceAdjustment>,
    pub defaults_migrated: bool,
    pub kind: ProductKind,
    /// Other keys under `pricing`, written back untouched.
    pub pricing: Map<String, Value>,
    /// Unmodelled root keys, written back untouched.
    pub extra: Map<String, Value>,
}

impl Product {
    /// An empty simple product.
    pub fn simple(id: impl Into<String>, name: impl Into<String>) -> Self {
        Product::with_kind(
            id.into(),
            name.into(),
            ProductKind::Simple {
                componentes: Componentes::default(),
                costo_confeccion: Decimal::ZERO,
            },
        )
    }

    /// A composite product over the given product ids.
    pub fn composite<I, S>(id: impl Into<String>, name: impl Into<String>, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = parts.into_iter().map(CompositeItem::new).collect();
        let mut product =
            Product::with_kind(id.into(), name.into(), ProductKind::Composite { items });
        product.category = COMPOSITE_CATEGORY.to_string();
        product
    }

    fn with_kind(id: String, name: String, kind: ProductKind) -> Self {
        Product {
            id,
            name,
            category: String::new(),
            available: 0,
            featured: false,
            comment: None,
            image: None,
            price: Decimal::ZERO,
            price_adjustments: Vec::new(),
            defaults_migrated: false,
            kind,
            pricing: Map::new(),
            extra: Map::new(),
        }
    }

    /// Reads and validates a stored document.
    pub fn from_document(value: Value) -> CoreResult<Self> {
        let document: ProductDocument = serde_json::from_value(value)?;
        Product::try_from(document)
    }

    /// Renders the stored document shape.
    pub fn to_document(&self) -> CoreResult<Value> {
        let document = ProductDocument::from(self.clone());
        Ok(serde_json::to_value(document)?)
    }

    pub fn product_type(&self) -> ProductType {
        match self.kind {
            ProductKind::Simple { .. } => ProductType::Simple,
            ProductKind::Composite { .. } => ProductType::Composite,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, ProductKind::Composite { .. })
    }

    /// Material rows of a simple product.
    pub fn componentes(&self) -> Option<&Componentes> {
        match &self.kind {
            ProductKind::Simple { componentes, .. } => Some(componentes),
            ProductKind::Composite { .. } => None,
        }
    }

    pub fn componentes_mut(&mut self) -> Option<&mut Componentes> {
        match &mut self.kind {
            ProductKind::Simple { componentes, .. } => Some(componentes),
            ProductKind::Composite { .. } => None,
        }
    }

    /// Parts of a composite product; empty for simple ones.
    pub fn composite_items(&self) -> &[CompositeItem] {
        match &self.kind {
            ProductKind::Composite { items } => items,
            ProductKind::Simple { .. } => &[],
        }
    }

    /// The manual labor cost of a simple product.
    pub fn costo_confeccion(&self) -> Decimal {
        match &self.kind {
            ProductKind::Simple {
                costo_confeccion, ..
            } => *costo_confeccion,
            ProductKind::Composite { .. } => Decimal::ZERO,
        }
    }

    /// The `modificadores` map derived from the adjustment list.
    pub fn modifiers(&self) -> BTreeMap<String, Decimal> {
        adjustments::modifiers_from_adjustments(&self.price_adjustments)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Normalizes a product before it is written back.
    ///
    /// - rows without a component are dropped
    /// - confección tags are re-derived from `components`
    /// - `costoConfeccion` becomes the effective labor figure
    /// - composite products are filed under the locked category
    pub fn prepare_for_save(&mut self, components: &ComponentIndex) {
        match &mut self.kind {
            ProductKind::Simple {
                componentes,
                costo_confeccion,
            } => {
                componentes.telas.retain(|row| !row.is_pending());
                componentes.otros.retain(|row| !row.is_pending());
                for row in &mut componentes.otros {
                    row.refresh_tag(components);
                }
                *costo_confeccion =
                    costing::MaterialTotals::of(componentes).effective_labor(*costo_confeccion);
            }
            ProductKind::Composite { .. } => {
                self.category = COMPOSITE_CATEGORY.to_string();
            }
        }
    }

    /// Appends an empty fabric row. No-op for composite products.
    pub fn add_fabric_row(&mut self) -> Option<&mut FabricRow> {
        let componentes = self.componentes_mut()?;
        componentes.telas.push(FabricRow::default());
        componentes.telas.last_mut()
    }

    /// Appends an empty other-material row. No-op for composite products.
    pub fn add_material_row(&mut self) -> Option<&mut MaterialRow> {
        let componentes = self.componentes_mut()?;
        componentes.otros.push(MaterialRow::default());
        componentes.otros.last_mut()
    }

    /// Drag-and-drop move within the fabric rows.
    pub fn move_fabric_row(&mut self, from: usize, to: usize) -> bool {
        self.componentes_mut()
            .is_some_and(|componentes| rows::move_row(&mut componentes.telas, from, to))
    }

    /// Drag-and-drop move within the other-material rows.
    pub fn move_material_row(&mut self, from: usize, to: usize) -> bool {
        self.componentes_mut()
            .is_some_and(|componentes| rows::move_row(&mut componentes.otros, from, to))
    }

    /// Sorts both row lists by component name.
    pub fn sort_rows(&mut self, components: &ComponentIndex) {
        if let Some(componentes) = self.componentes_mut() {
            rows::sort_by_component_name(&mut componentes.telas, components);
            rows::sort_by_component_name(&mut componentes.otros, components);
        }
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Takes `quantity` units out of stock, never below zero.
    pub fn decrement_stock(&mut self, quantity: Decimal) {
        self.available = (self.available - whole_units(quantity)).max(0);
    }

    /// Puts `quantity` units back, e.g. when a sale is deleted.
    pub fn restock(&mut self, quantity: Decimal) {
        self.available = self.available.saturating_add(whole_units(quantity));
    }
}

fn whole_units(quantity: Decimal) -> i64 {
    round_to(quantity, 0).to_i64().unwrap_or(0).max(0)
}

// =============================================================================
// Stored Document
// =============================================================================

/// Stored shape of a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "\"simple\" | \"composite\" | null")]
    pub product_type: Option<String>,

    #[serde(default, deserialize_with = "lenient::count")]
    #[ts(type = "number")]
    pub available: i64,

    #[serde(default, deserialize_with = "lenient::boolean")]
    pub featured: bool,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,

    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(type = "number")]
    pub price: Decimal,

    #[serde(
        default,
        deserialize_with = "lenient::decimal",
        skip_serializing_if = "Decimal::is_zero"
    )]
    #[ts(type = "number")]
    pub costo_confeccion: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub componentes: Option<Componentes>,

    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub composite_items: Vec<CompositeItem>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub price_adjustments: Vec<PriceAdjustment>,

    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Map::is_empty"
    )]
    #[ts(type = "Record<string, unknown>")]
    pub pricing: Map<String, Value>,

    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Map::is_empty"
    )]
    #[ts(type = "Record<string, number>")]
    pub modificadores: Map<String, Value>,

    #[serde(default, deserialize_with = "lenient::boolean")]
    pub defaults_migrated: bool,

    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl TryFrom<ProductDocument> for Product {
    type Error = CoreError;

    fn try_from(mut document: ProductDocument) -> CoreResult<Self> {
        let product_type = ProductType::parse(document.product_type.as_deref())?;

        let legacy_modifiers = match document.pricing.remove(MODIFIERS_KEY) {
            Some(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => Some(document.modificadores).filter(|map| !map.is_empty()),
        };
        let price_adjustments =
            adjustments::merge_adjustments(&document.price_adjustments, legacy_modifiers.as_ref());

        let (kind, category) = match product_type {
            ProductType::Simple => (
                ProductKind::Simple {
                    componentes: document.componentes.unwrap_or_default(),
                    costo_confeccion: document.costo_confeccion,
                },
                document.category,
            ),
            ProductType::Composite => {
                if document
                    .componentes
                    .as_ref()
                    .is_some_and(|componentes| !componentes.is_empty())
                {
                    return Err(CoreError::CompositeWithMaterials(document.id));
                }
                (
                    ProductKind::Composite {
                        items: document.composite_items,
                    },
                    COMPOSITE_CATEGORY.to_string(),
                )
            }
        };

        Ok(Product {
            id: document.id,
            name: document.name,
            category,
            available: document.available,
            featured: document.featured,
            comment: document.comment,
            image: document.image,
            price: document.price,
            price_adjustments,
            defaults_migrated: document.defaults_migrated,
            kind,
            pricing: document.pricing,
            extra: document.extra,
        })
    }
}

impl From<Product> for ProductDocument {
    fn from(product: Product) -> Self {
        let product_type = Some(product.product_type().as_str().to_string());
        let modifiers: Map<String, Value> = product
            .modifiers()
            .into_iter()
            .map(|(name, fraction)| (name, lenient::decimal_to_value(fraction)))
            .collect();
        let mut pricing = product.pricing;
        pricing.insert(MODIFIERS_KEY.to_string(), Value::Object(modifiers.clone()));

        let (componentes, composite_items, costo_confeccion) = match product.kind {
            ProductKind::Simple {
                componentes,
                costo_confeccion,
            } => (Some(componentes), Vec::new(), costo_confeccion),
            ProductKind::Composite { items } => (None, items, Decimal::ZERO),
        };

        ProductDocument {
            id: product.id,
            name: product.name,
            category: product.category,
            product_type,
            available: product.available,
            featured: product.featured,
            comment: product.comment,
            image: product.image,
            price: product.price,
            costo_confeccion,
            componentes,
            composite_items,
            price_adjustments: product.price_adjustments,
            pricing,
            modificadores: modifiers,
            defaults_migrated: product.defaults_migrated,
            extra: product.extra,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Component;
    use serde_json::json;

    fn d(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    #[test]
    fn test_missing_type_is_simple() {
        let product = Product::from_document(json!({
            "id": 1,
            "name": "Bolso",
            "price": "500",
            "costoConfeccion": 50
        }))
        .unwrap();
        assert_eq!(product.id, "1");
        assert_eq!(product.product_type(), ProductType::Simple);
        assert_eq!(product.price, d(500, 0));
        assert_eq!(product.costo_confeccion(), d(50, 0));
        assert!(product.componentes().unwrap().is_empty());
    }

    #[test]
    fn test_composite_category_is_locked() {
        let product = Product::from_document(json!({
            "id": "set-1",
            "type": "Composite",
            "category": "Bolsos",
            "compositeItems": [{ "productId": "a" }, { "productId": 2, "qty": 1 }]
        }))
        .unwrap();
        assert!(product.is_composite());
        assert_eq!(product.category, COMPOSITE_CATEGORY);
        assert_eq!(product.composite_items().len(), 2);
        assert_eq!(product.composite_items()[1].product_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_composite_with_rows_is_rejected() {
        let result = Product::from_document(json!({
            "id": "set-2",
            "type": "composite",
            "componentes": { "telas": [{ "componentId": "lino" }], "otros": [] }
        }));
        assert!(matches!(result, Err(CoreError::CompositeWithMaterials(id)) if id == "set-2"));
    }

    #[test]
    fn test_composite_with_empty_rows_is_accepted() {
        let product = Product::from_document(json!({
            "id": "set-3",
            "type": "composite",
            "componentes": { "telas": [], "otros": [] }
        }))
        .unwrap();
        assert!(product.is_composite());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = Product::from_document(json!({ "id": "x", "type": "bundle" }));
        assert!(matches!(result, Err(CoreError::UnknownProductType(t)) if t == "bundle"));
    }

    #[test]
    fn test_legacy_modifiers_are_merged_on_load() {
        let product = Product::from_document(json!({
            "id": "p",
            "priceAdjustments": [{ "name": "Tarjeta", "percent": 10 }],
            "pricing": { "modificadores": { "tarjeta": 0.2, "Cuotas": 0.15 }, "margen": 2 }
        }))
        .unwrap();
        assert_eq!(
            product.price_adjustments,
            vec![
                PriceAdjustment::new("Tarjeta", d(10, 0)),
                PriceAdjustment::new("Cuotas", d(15, 0)),
            ]
        );
        assert_eq!(product.pricing.get("margen"), Some(&json!(2)));
    }

    #[test]
    fn test_root_modifiers_used_when_pricing_has_none() {
        let product = Product::from_document(json!({
            "id": "p",
            "modificadores": { "Inflación": 0.02 }
        }))
        .unwrap();
        assert_eq!(
            product.price_adjustments,
            vec![PriceAdjustment::new("Inflación", d(2, 0))]
        );
    }

    #[test]
    fn test_document_writes_modifiers_in_both_places() {
        let mut product = Product::simple("p", "Cartuchera");
        product.price_adjustments = vec![PriceAdjustment::new("En dos veces", d(15, 0))];
        product.pricing.insert("margen".into(), json!(2));

        let doc = product.to_document().unwrap();
        assert_eq!(doc["type"], "simple");
        assert_eq!(doc["modificadores"]["En dos veces"], json!(0.15));
        assert_eq!(doc["pricing"]["modificadores"]["En dos veces"], json!(0.15));
        assert_eq!(doc["pricing"]["margen"], json!(2));
        assert_eq!(doc["componentes"]["telas"], json!([]));

        let back = Product::from_document(doc).unwrap();
        assert_eq!(back.price_adjustments, product.price_adjustments);
    }

    #[test]
    fn test_composite_document_keeps_its_type() {
        let product = Product::composite("set", "Set matero", ["bolso", "yerbera"]);

        let doc = product.to_document().unwrap();
        assert_eq!(doc["type"], "composite");
        assert_eq!(doc["category"], COMPOSITE_CATEGORY);
        assert_eq!(doc["compositeItems"][1]["productId"], "yerbera");

        let back = Product::from_document(doc).unwrap();
        assert_eq!(back.product_type(), ProductType::Composite);
        assert_eq!(back.composite_items().len(), 2);
        assert_eq!(back.composite_items()[0].product_id.as_deref(), Some("bolso"));
    }

    #[test]
    fn test_prepare_for_save() {
        let parse = |value| serde_json::from_value::<Component>(value).unwrap();
        let components = ComponentIndex::new([
            parse(json!({ "id": "conf", "name": "Confección", "price": 3000 })),
            parse(json!({ "id": "cierre", "name": "Cierre", "price": 200 })),
        ]);
        let mut product = Product::from_document(json!({
            "id": "p",
            "costoConfeccion": 999,
            "componentes": {
                "telas": [{ "componentId": "" }, { "componentId": "lino", "costoMaterial": 10 }],
                "otros": [
                    { "componentId": "conf", "unidades": 1, "precioUnitario": 3000, "tagConfeccion": false },
                    { "componentId": "cierre", "unidades": 2, "precioUnitario": 200, "tagConfeccion": true },
                    { "unidades": 5 }
                ]
            }
        }))
        .unwrap();

        product.prepare_for_save(&components);

        let componentes = product.componentes().unwrap();
        assert_eq!(componentes.telas.len(), 1);
        assert_eq!(componentes.otros.len(), 2);
        assert!(componentes.otros[0].tag_confeccion);
        assert!(!componentes.otros[1].tag_confeccion);
        assert_eq!(product.costo_confeccion(), d(3000, 0));
    }

    #[test]
    fn test_prepare_for_save_keeps_manual_labor_without_confeccion_rows() {
        let mut product = Product::simple("p", "Bolso");
        if let ProductKind::Simple {
            costo_confeccion, ..
        } = &mut product.kind
        {
            *costo_confeccion = d(120, 0);
        }
        product.prepare_for_save(&ComponentIndex::default());
        assert_eq!(product.costo_confeccion(), d(120, 0));
    }

    #[test]
    fn test_stock_never_negative() {
        let mut product = Product::simple("p", "Bolso");
        product.available = 3;
        product.decrement_stock(d(5, 0));
        assert_eq!(product.available, 0);
        product.restock(d(2, 0));
        assert_eq!(product.available, 2);
    }

    #[test]
    fn test_row_moves_only_on_simple_products() {
        let mut product = Product::simple("p", "Bolso");
        product.add_fabric_row();
        product.add_fabric_row();
        assert!(product.move_fabric_row(0, 2));

        let mut set = Product::composite("s", "Set", ["p"]);
        assert!(set.add_fabric_row().is_none());
        assert!(!set.move_fabric_row(0, 1));
    }
}
