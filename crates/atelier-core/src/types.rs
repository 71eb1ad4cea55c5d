//! # Domain Types
//!
//! Components, material rows, sales and their JSON document shapes.
//! Products live in [`crate::product`] because of their two-variant shape.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Entity Relationships                             │
//! │                                                                         │
//! │  ┌─────────────┐        ┌─────────────┐                                 │
//! │  │  Component  │◄───────┤  FabricRow  │  category "telas"               │
//! │  │             │        └──────┬──────┘                                 │
//! │  │ price       │               │ many                                   │
//! │  │ unitDivisor │        ┌──────┴──────┐        ┌─────────────┐          │
//! │  │ link        │◄───────┤ MaterialRow │ many ──┤   Product   │          │
//! │  └─────────────┘        └─────────────┘        │ simple      │          │
//! │                                                │ composite ──┼──┐       │
//! │                         ┌─────────────┐        └──────┬──────┘  │       │
//! │                         │    Sale     ├───────────────┘  ▲      │       │
//! │                         │ snapshot of │ productId        └──────┘       │
//! │                         │ unit cost   │               compositeItems    │
//! │                         └─────────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names follow the stored documents (`unitDivisor`, `anchoTelaCm`,
//! `gananciaUnit`, ...) so existing records load without a migration.
//! Keys this crate does not model are kept in `extra` and written back
//! untouched.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::lenient;
use crate::text;

// =============================================================================
// Constants
// =============================================================================

/// Category name that marks a component as fabric.
pub const FABRIC_CATEGORY: &str = "telas";

/// Category every composite product is filed under.
pub const COMPOSITE_CATEGORY: &str = "Set / Conjuntos";

/// Label for products or components without a category.
pub const UNCATEGORIZED: &str = "Sin categoría";

/// Payment method a new sale starts with.
pub const DEFAULT_PAYMENT_METHOD: &str = "Efectivo";

/// Substring (after accent folding) that marks a component as tailoring labor.
pub const CONFECCION_MARKER: &str = "confeccion";

fn default_unit_divisor() -> u32 {
    1
}

// =============================================================================
// Component
// =============================================================================

/// A purchasable material or labor unit.
///
/// ## Effective Unit Price
/// ```text
/// box of 100 buttons, price 100, unitDivisor 100 → 1 per button
/// roll priced per metre,          unitDivisor 1   → price
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,

    /// Purchase price.
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(type = "number")]
    pub price: Decimal,

    /// How many usable units one purchase yields. Always ≥ 1.
    #[serde(
        default = "default_unit_divisor",
        deserialize_with = "lenient::unit_divisor"
    )]
    pub unit_divisor: u32,

    /// Quantity on hand.
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(type = "number")]
    pub available: Decimal,

    /// Vendor product page, used by the bulk price refresh.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub link: Option<String>,

    #[serde(default, deserialize_with = "lenient::boolean")]
    pub featured: bool,

    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl Component {
    /// `price / max(unitDivisor, 1)`, unrounded.
    pub fn effective_unit_price(&self) -> Decimal {
        self.price / Decimal::from(self.unit_divisor.max(1))
    }

    /// True for the fabric category (case-insensitive).
    pub fn is_fabric(&self) -> bool {
        text::same_name(&self.category, FABRIC_CATEGORY)
    }

    /// True when the name marks this component as tailoring labor.
    pub fn is_confeccion(&self) -> bool {
        is_confeccion_name(&self.name)
    }

    /// Vendor link, if any non-blank one is set.
    pub fn vendor_link(&self) -> Option<&str> {
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }

    /// True when the component has no category.
    pub fn is_uncategorized(&self) -> bool {
        self.category.trim().is_empty()
    }
}

/// Accent- and case-insensitive check for the tailoring marker.
pub fn is_confeccion_name(name: &str) -> bool {
    text::contains_folded(name, CONFECCION_MARKER)
}

// =============================================================================
// Material Rows
// =============================================================================

/// A cut piece of fabric (`tela`) and its derived cost.
///
/// Inputs: `componentId`, `anchoTelaCm`, `anchoCm`, `largoCm`,
/// `porcentajeDesperdicio`. Everything else is derived by
/// [`FabricRow::recompute`](crate::fabric).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FabricRow {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub component_id: Option<String>,

    /// Roll width in cm.
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub ancho_tela_cm: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub precio_por_metro: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub valor_cm2: Option<Decimal>,

    /// Cut piece width in cm.
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub ancho_cm: Option<Decimal>,

    /// Cut piece length in cm.
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub largo_cm: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub material_puro_cm2: Option<Decimal>,

    /// Waste percentage; 10 means +10%.
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub porcentaje_desperdicio: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub total_material_cm2: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub costo_material: Option<Decimal>,
}

/// A non-fabric line (`otro`): hardware, thread, or a labor line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRow {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub component_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub unidades: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    #[ts(type = "number | null")]
    pub precio_unitario: Option<Decimal>,

    /// Derived from the component name. Never user-edited.
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub tag_confeccion: bool,
}

/// Row lists of a simple product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Componentes {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub telas: Vec<FabricRow>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub otros: Vec<MaterialRow>,
}

impl Componentes {
    /// True when neither list has a row.
    pub fn is_empty(&self) -> bool {
        self.telas.is_empty() && self.otros.is_empty()
    }
}

/// Reference from a composite product to one of its parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompositeItem {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub product_id: Option<String>,

    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl CompositeItem {
    pub fn new(product_id: impl Into<String>) -> Self {
        CompositeItem {
            product_id: Some(product_id.into()),
            extra: Map::new(),
        }
    }
}

/// A named percentage markup, e.g. `{ "name": "En dos veces", "percent": 15 }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceAdjustment {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(type = "number")]
    pub percent: Decimal,
}

impl PriceAdjustment {
    pub fn new(name: impl Into<String>, percent: Decimal) -> Self {
        PriceAdjustment {
            name: name.into(),
            percent,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
///
/// `unitPrice` and `gananciaUnit` are snapshots of the product's material
/// cost and labor estimate at the time of sale; later price changes do not
/// rewrite history. See [`crate::payments`] for how the money fields are
/// reconciled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::id")]
    pub product_id: String,

    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(type = "number")]
    pub quantity: Decimal,

    #[serde(
        default,
        deserialize_with = "lenient::date",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub customer_name: Option<String>,

    /// Material cost per unit at sale time.
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(type = "number")]
    pub unit_price: Decimal,

    /// Labor gain per unit at sale time.
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(type = "number")]
    pub ganancia_unit: Decimal,

    /// Naive `quantity × (unitPrice + gananciaUnit)` kept for old readers.
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(type = "number")]
    pub total: Decimal,

    /// Negotiated price actually charged, when it differs from the computed one.
    #[serde(
        default,
        deserialize_with = "lenient::opt_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "number | null")]
    pub real_sale_value: Option<Decimal>,

    #[serde(
        default,
        deserialize_with = "lenient::present_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "number | null")]
    pub payment_received: Option<Decimal>,

    #[serde(
        default,
        deserialize_with = "lenient::present_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "number | null")]
    pub payment_pending: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub payment_method: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_notes: Option<String>,

    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

/// Payment state of a sale, stored and displayed with the shop's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentStatus {
    /// Fully paid.
    #[serde(rename = "Pagado")]
    Paid,

    /// Nothing received yet.
    #[serde(rename = "Pendiente de Pago")]
    Pending,

    /// Some but not all received.
    #[serde(rename = "Pago parcial")]
    Partial,
}

impl PaymentStatus {
    /// The label shown to users and stored in documents.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Pagado",
            PaymentStatus::Pending => "Pendiente de Pago",
            PaymentStatus::Partial => "Pago parcial",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_effective_unit_price() {
        let component: Component = serde_json::from_value(json!({
            "id": 7,
            "name": "Botones",
            "category": "Mercería",
            "price": "100",
            "unitDivisor": 100
        }))
        .unwrap();
        assert_eq!(component.id, "7");
        assert_eq!(component.effective_unit_price(), Decimal::ONE);
        assert!(!component.is_fabric());
    }

    #[test]
    fn test_component_unit_divisor_defaults_to_one() {
        let component: Component = serde_json::from_value(json!({
            "id": "c1",
            "name": "Lino",
            "category": "Telas",
            "price": 1000,
            "unitDivisor": 0
        }))
        .unwrap();
        assert_eq!(component.unit_divisor, 1);
        assert!(component.is_fabric());
        assert_eq!(component.effective_unit_price(), Decimal::from(1000));
    }

    #[test]
    fn test_component_keeps_unknown_keys() {
        let raw = json!({ "id": "c1", "name": "Hilo", "price": 5, "supplier": "Casa Nacho" });
        let component: Component = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&component).unwrap();
        assert_eq!(back["supplier"], "Casa Nacho");
        assert_eq!(back["unitDivisor"], 1);
    }

    #[test]
    fn test_confeccion_detection() {
        assert!(is_confeccion_name("Confección de bolso"));
        assert!(is_confeccion_name("MANO DE OBRA CONFECCION"));
        assert!(!is_confeccion_name("Confitería"));
    }

    #[test]
    fn test_payment_status_labels() {
        assert_eq!(
            serde_json::to_value(PaymentStatus::Partial).unwrap(),
            json!("Pago parcial")
        );
        let parsed: PaymentStatus = serde_json::from_value(json!("Pendiente de Pago")).unwrap();
        assert_eq!(parsed, PaymentStatus::Pending);
        assert_eq!(PaymentStatus::Paid.to_string(), "Pagado");
    }

    #[test]
    fn test_sale_blank_payments_are_absent() {
        let sale: Sale = serde_json::from_value(json!({
            "id": "s1",
            "productId": 3,
            "quantity": "2",
            "date": "2024-05-01",
            "paymentReceived": "",
            "paymentPending": null,
            "realSaleValue": ""
        }))
        .unwrap();
        assert_eq!(sale.product_id, "3");
        assert_eq!(sale.quantity, Decimal::from(2));
        assert_eq!(sale.payment_received, None);
        assert_eq!(sale.payment_pending, None);
        assert_eq!(sale.real_sale_value, None);
        assert_eq!(sale.date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }
}
