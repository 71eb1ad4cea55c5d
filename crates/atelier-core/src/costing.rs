//! # Product Cost Aggregator
//!
//! Turns a product's rows (or its parts, for a set) into a material cost and
//! a labor/gain estimate.
//!
//! ## Composite Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Set "Mochila + Cartuchera"          visited = {set}                    │
//! │    ├── Mochila      (simple) ──► 20 / 3   visited = {set, mochila}      │
//! │    ├── Cartuchera   (simple) ──► 10 / 2   visited = {set, cartuchera}   │
//! │    ├── ghost-id     (missing) ─► skipped                                │
//! │    └── Set          (cycle)  ──► skipped                                │
//! │                                  ─────────                              │
//! │                                  30 / 5                                 │
//! │                                                                         │
//! │  The product map is the arena; `visited` travels down each branch as   │
//! │  its own copy, so siblings never see each other's ids.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Missing and cyclic references contribute zero instead of failing: a set
//! is often saved half-built while its parts are still being entered.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::adjustments;
use crate::catalog::ProductIndex;
use crate::money::{mul_or_zero, round_money, saturating_sum};
use crate::product::{Product, ProductKind, ProductType};
use crate::types::Componentes;

// =============================================================================
// Output Types
// =============================================================================

/// Cost of one part of a composite product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdownItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[ts(type = "number")]
    pub cost_materials: Decimal,
    #[ts(type = "number")]
    pub estimated_gain: Decimal,
}

/// Aggregated cost of a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    /// Material cost, excluding confección rows.
    #[ts(type = "number")]
    pub cost_materials: Decimal,
    /// Labor/gain estimate.
    #[ts(type = "number")]
    pub estimated_gain: Decimal,
    pub is_composite: bool,
    /// One entry per resolved part; empty for simple products.
    pub breakdown: Vec<CostBreakdownItem>,
}

impl CostSummary {
    /// Material cost plus labor, before any adjustment.
    pub fn base_total(&self) -> Decimal {
        round_money(self.cost_materials.saturating_add(self.estimated_gain))
    }
}

// =============================================================================
// Row Totals
// =============================================================================

/// Unrounded sums over the rows of a simple product.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialTotals {
    /// Σ `costoMaterial` over fabric rows.
    pub telas: Decimal,
    /// Σ `unidades × precioUnitario` over untagged rows.
    pub otros_no_confeccion: Decimal,
    /// Σ `unidades × precioUnitario` over confección rows.
    pub otros_confeccion: Decimal,
    pub has_confeccion_rows: bool,
}

impl MaterialTotals {
    pub fn of(componentes: &Componentes) -> Self {
        let mut totals = MaterialTotals {
            telas: saturating_sum(componentes.telas.iter().map(|row| row.cost())),
            ..MaterialTotals::default()
        };
        for row in &componentes.otros {
            if row.tag_confeccion {
                totals.otros_confeccion = totals.otros_confeccion.saturating_add(row.total());
                totals.has_confeccion_rows = true;
            } else {
                totals.otros_no_confeccion = totals.otros_no_confeccion.saturating_add(row.total());
            }
        }
        totals
    }

    /// Material cost in cents.
    pub fn cost_materials(&self) -> Decimal {
        round_money(self.telas.saturating_add(self.otros_no_confeccion))
    }

    /// Labor: the confección sum when any such row exists, else `manual`.
    pub fn effective_labor(&self, manual: Decimal) -> Decimal {
        if self.has_confeccion_rows {
            round_money(self.otros_confeccion)
        } else {
            round_money(manual)
        }
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Cost summary of `product`, resolving composite parts through `products`.
///
/// `visited` holds the ids already on the current resolution path; a
/// product found in it yields an empty summary.
pub fn compute_product_cost_summary(
    product: &Product,
    products: &ProductIndex,
    visited: &HashSet<String>,
) -> CostSummary {
    if visited.contains(&product.id) {
        return CostSummary {
            is_composite: product.is_composite(),
            ..CostSummary::default()
        };
    }

    match &product.kind {
        ProductKind::Composite { items } => {
            let mut path = visited.clone();
            path.insert(product.id.clone());

            let mut cost_materials = Decimal::ZERO;
            let mut estimated_gain = Decimal::ZERO;
            let mut breakdown = Vec::new();

            for item in items {
                let Some(child) = item
                    .product_id
                    .as_deref()
                    .filter(|id| !path.contains(*id))
                    .and_then(|id| products.get(id))
                else {
                    continue;
                };
                let summary = compute_product_cost_summary(child, products, &path);
                cost_materials = cost_materials.saturating_add(summary.cost_materials);
                estimated_gain = estimated_gain.saturating_add(summary.estimated_gain);
                breakdown.push(CostBreakdownItem {
                    id: child.id.clone(),
                    name: child.name.clone(),
                    product_type: child.product_type(),
                    cost_materials: summary.cost_materials,
                    estimated_gain: summary.estimated_gain,
                });
            }

            CostSummary {
                cost_materials: round_money(cost_materials),
                estimated_gain: round_money(estimated_gain),
                is_composite: true,
                breakdown,
            }
        }
        ProductKind::Simple {
            componentes,
            costo_confeccion,
        } => {
            if componentes.is_empty() {
                return CostSummary {
                    cost_materials: round_money(product.price),
                    estimated_gain: round_money(*costo_confeccion),
                    is_composite: false,
                    breakdown: Vec::new(),
                };
            }
            let totals = MaterialTotals::of(componentes);
            CostSummary {
                cost_materials: totals.cost_materials(),
                estimated_gain: totals.effective_labor(*costo_confeccion),
                is_composite: false,
                breakdown: Vec::new(),
            }
        }
    }
}

/// [`compute_product_cost_summary`] from the top of a resolution path.
pub fn summarize(product: &Product, products: &ProductIndex) -> CostSummary {
    compute_product_cost_summary(product, products, &HashSet::new())
}

/// Price shown in product listings: material cost plus labor, marked up by
/// the product's inflation adjustment.
pub fn listing_price(product: &Product, products: &ProductIndex) -> Decimal {
    let summary = summarize(product, products);
    adjustments::price_with_inflation(
        summary.cost_materials,
        summary.estimated_gain,
        &product.price_adjustments,
    )
}

// =============================================================================
// Quick Estimate
// =============================================================================

/// A priced line for [`quick_estimate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteLine {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Back-of-the-envelope quote: `(Σ price × qty + labor) × (1 + margin)`,
/// where `margin` is a fraction (`0.4` for 40%).
pub fn quick_estimate(lines: &[QuoteLine], labor: Decimal, margin: Decimal) -> Decimal {
    let materials = saturating_sum(lines.iter().map(|line| mul_or_zero(line.price, line.quantity)));
    let markup = Decimal::ONE.saturating_add(margin);
    round_money(mul_or_zero(materials.saturating_add(labor), markup))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FabricRow, MaterialRow, PriceAdjustment};

    fn d(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    fn flat(id: &str, price: i64, labor: i64) -> Product {
        let mut product = Product::simple(id, id.to_uppercase());
        product.price = d(price, 0);
        if let ProductKind::Simple {
            costo_confeccion, ..
        } = &mut product.kind
        {
            *costo_confeccion = d(labor, 0);
        }
        product
    }

    fn otro(id: &str, units: i64, price: i64, confeccion: bool) -> MaterialRow {
        MaterialRow {
            component_id: Some(id.to_string()),
            unidades: Some(d(units, 0)),
            precio_unitario: Some(d(price, 0)),
            tag_confeccion: confeccion,
        }
    }

    fn tela(id: &str, cost: Decimal) -> FabricRow {
        FabricRow {
            component_id: Some(id.to_string()),
            costo_material: Some(cost),
            ..FabricRow::default()
        }
    }

    #[test]
    fn test_manual_price_product() {
        let product = flat("bolso", 500, 50);
        let summary = summarize(&product, &ProductIndex::default());
        assert_eq!(summary.cost_materials, d(500, 0));
        assert_eq!(summary.estimated_gain, d(50, 0));
        assert!(!summary.is_composite);
        assert!(summary.breakdown.is_empty());
    }

    #[test]
    fn test_rows_split_material_and_labor() {
        let mut product = flat("mochila", 9999, 777);
        let componentes = product.componentes_mut().unwrap();
        componentes.telas = vec![tela("lino", d(1474, 2)), FabricRow::default()];
        componentes.otros = vec![
            otro("cierre", 2, 150, false),
            otro("conf", 1, 4000, true),
            otro("conf2", 1, 500, true),
        ];

        let summary = summarize(&product, &ProductIndex::default());
        assert_eq!(summary.cost_materials, d(31474, 2));
        assert_eq!(summary.estimated_gain, d(4500, 0));
    }

    #[test]
    fn test_manual_labor_used_without_confeccion_rows() {
        let mut product = flat("cartuchera", 9999, 120);
        product.componentes_mut().unwrap().otros = vec![otro("cierre", 1, 100, false)];

        let summary = summarize(&product, &ProductIndex::default());
        assert_eq!(summary.cost_materials, d(100, 0));
        assert_eq!(summary.estimated_gain, d(120, 0));
    }

    #[test]
    fn test_composite_sums_parts() {
        let a = flat("a", 10, 2);
        let b = flat("b", 20, 3);
        let set = Product::composite("set", "Set", ["a", "b"]);
        let products = ProductIndex::new([a, b, set.clone()]);

        let summary = summarize(&set, &products);
        assert_eq!(summary.cost_materials, d(30, 0));
        assert_eq!(summary.estimated_gain, d(5, 0));
        assert!(summary.is_composite);
        assert_eq!(summary.breakdown.len(), 2);
        assert_eq!(summary.breakdown[0].id, "a");
        assert_eq!(summary.breakdown[1].product_type, ProductType::Simple);
    }

    #[test]
    fn test_missing_parts_are_skipped() {
        let a = flat("a", 10, 2);
        let mut set = Product::composite("set", "Set", ["a", "ghost"]);
        if let ProductKind::Composite { items } = &mut set.kind {
            items.push(Default::default());
        }
        let products = ProductIndex::new([a, set.clone()]);

        let summary = summarize(&set, &products);
        assert_eq!(summary.cost_materials, d(10, 0));
        assert_eq!(summary.breakdown.len(), 1);
    }

    #[test]
    fn test_self_reference_contributes_zero() {
        let a = flat("a", 10, 2);
        let set = Product::composite("set", "Set", ["set", "a"]);
        let products = ProductIndex::new([a, set.clone()]);

        let summary = summarize(&set, &products);
        assert_eq!(summary.cost_materials, d(10, 0));
        assert_eq!(summary.estimated_gain, d(2, 0));
        assert_eq!(summary.breakdown.len(), 1);
    }

    #[test]
    fn test_indirect_cycle_terminates() {
        let a = flat("a", 7, 1);
        let x = Product::composite("x", "X", ["y", "a"]);
        let y = Product::composite("y", "Y", ["x"]);
        let products = ProductIndex::new([a, x.clone(), y]);

        let summary = summarize(&x, &products);
        assert_eq!(summary.cost_materials, d(7, 0));
        assert_eq!(summary.breakdown.len(), 2);
        assert_eq!(summary.breakdown[0].id, "y");
        assert_eq!(summary.breakdown[0].cost_materials, Decimal::ZERO);
    }

    #[test]
    fn test_nested_sets() {
        let a = flat("a", 10, 2);
        let inner = Product::composite("inner", "Inner", ["a"]);
        let outer = Product::composite("outer", "Outer", ["inner", "a"]);
        let products = ProductIndex::new([a, inner, outer.clone()]);

        let summary = summarize(&outer, &products);
        assert_eq!(summary.cost_materials, d(20, 0));
        assert_eq!(summary.breakdown[0].product_type, ProductType::Composite);
    }

    #[test]
    fn test_listing_price_applies_inflation() {
        let mut product = flat("bolso", 1000, 200);
        product.price_adjustments = vec![
            PriceAdjustment::new("Con transferencia", d(15, 0)),
            PriceAdjustment::new("Inflación", d(2, 0)),
        ];
        let price = listing_price(&product, &ProductIndex::default());
        assert_eq!(price, d(1224, 0));
    }

    #[test]
    fn test_quick_estimate() {
        let lines = [
            QuoteLine { price: d(100, 0), quantity: d(2, 0) },
            QuoteLine { price: d(50, 0), quantity: d(1, 0) },
        ];
        assert_eq!(quick_estimate(&lines, d(150, 0), d(4, 1)), d(560, 0));
    }
}
