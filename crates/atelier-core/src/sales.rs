//! # Sales
//!
//! Building a sale from a product, and filtering the sales list.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewSale { productId, quantity, ... }                                   │
//! │       │                                                                 │
//! │       ├── cost summary of the product (fresh snapshot)                 │
//! │       │      unitPrice    = costMaterials                               │
//! │       │      gananciaUnit = estimatedGain                               │
//! │       ├── validate productId, quantity > 0, unitPrice > 0              │
//! │       ├── total = max(quantity × (unitPrice + gananciaUnit), 0)        │
//! │       └── reconcile payments                                           │
//! │                                                                         │
//! │  The caller persists the sale and takes the quantity out of stock.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::catalog::ProductIndex;
use crate::costing;
use crate::error::CoreResult;
use crate::lenient;
use crate::money::{clamp_non_negative, mul_or_zero, saturating_sum};
use crate::payments::compute_sale_financials;
use crate::product::Product;
use crate::types::{Sale, DEFAULT_PAYMENT_METHOD};
use crate::validation::{normalize_customer_name, validate_new_sale};

// =============================================================================
// New Sale
// =============================================================================

/// Input for recording a sale.
///
/// `unitPrice` and `gananciaUnit` default to the product's current cost
/// summary when left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    #[serde(default, deserialize_with = "lenient::id")]
    pub product_id: String,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub quantity: Decimal,

    #[serde(default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub customer_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub unit_price: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub ganancia_unit: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub real_sale_value: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::present_decimal")]
    pub payment_received: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub payment_method: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub payment_notes: Option<String>,
}

/// Builds a validated, reconciled sale for `product`.
///
/// `id` is the record id to use; `today` fills in a missing date.
pub fn build_sale(
    input: NewSale,
    product: &Product,
    products: &ProductIndex,
    id: String,
    today: NaiveDate,
) -> CoreResult<Sale> {
    let summary = costing::summarize(product, products);
    let unit_price = input.unit_price.unwrap_or(summary.cost_materials);
    let ganancia_unit = input.ganancia_unit.unwrap_or(summary.estimated_gain);

    validate_new_sale(&input.product_id, input.quantity, unit_price)?;

    let mut sale = Sale {
        id,
        product_id: input.product_id,
        quantity: input.quantity,
        date: Some(input.date.unwrap_or(today)),
        customer_name: normalize_customer_name(input.customer_name.as_deref()),
        unit_price,
        ganancia_unit,
        total: clamp_non_negative(mul_or_zero(
            input.quantity,
            unit_price.saturating_add(ganancia_unit),
        )),
        real_sale_value: input.real_sale_value,
        payment_received: input.payment_received,
        payment_pending: None,
        payment_method: Some(
            input
                .payment_method
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
        ),
        payment_notes: input.payment_notes,
        extra: Map::new(),
    };
    sale.reconcile();
    Ok(sale)
}

// =============================================================================
// Listing
// =============================================================================

/// Filters for the sales list. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    /// Case-insensitive substring of the product name or customer.
    pub search: Option<String>,
    /// Exact payment method.
    pub method: Option<String>,
    /// Inclusive lower bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub to: Option<NaiveDate>,
}

impl SaleFilter {
    /// True when `sale` passes every set criterion. `product_name` is the
    /// name of the sold product, if it still exists.
    pub fn matches(&self, sale: &Sale, product_name: Option<&str>) -> bool {
        let term = self
            .search
            .as_deref()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());
        if let Some(term) = term {
            let in_name = product_name.is_some_and(|name| name.to_lowercase().contains(&term));
            let in_customer = sale
                .customer_name
                .as_deref()
                .is_some_and(|customer| customer.to_lowercase().contains(&term));
            if !in_name && !in_customer {
                return false;
            }
        }

        if let Some(method) = self.method.as_deref().filter(|m| !m.is_empty()) {
            if sale.payment_method.as_deref() != Some(method) {
                return false;
            }
        }

        if self.from.is_some() || self.to.is_some() {
            let Some(date) = sale.date else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }

        true
    }

    /// Applies the filter, keeping input order.
    pub fn apply<'a>(&self, sales: &'a [Sale], products: &ProductIndex) -> Vec<&'a Sale> {
        sales
            .iter()
            .filter(|sale| {
                let name = products.get(&sale.product_id).map(|p| p.name.as_str());
                self.matches(sale, name)
            })
            .collect()
    }
}

/// Amount shown for a sale in the list: the computed total, or the legacy
/// stored total when nothing can be computed.
pub fn listing_total(sale: &Sale) -> Decimal {
    let financials = compute_sale_financials(sale);
    if financials.computed_total > Decimal::ZERO {
        financials.computed_total
    } else {
        financials.fallback_total
    }
}

/// Sum of [`listing_total`] over `sales`.
pub fn listing_sum<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Decimal {
    saturating_sum(sales.into_iter().map(listing_total))
}

// =============================================================================
// Unit Tests
// =============================================================================
