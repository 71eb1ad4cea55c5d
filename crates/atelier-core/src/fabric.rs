//! # Fabric Row Calculator
//!
//! Derives the material cost of a cut piece of fabric.
//!
//! ## Derivation Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  component.price / unitDivisor ───────────► precioPorMetro              │
//! │                                                  │                      │
//! │  anchoTelaCm ────────────────────────────────────┴──► valorCm2          │
//! │                                                          │              │
//! │  anchoCm × largoCm / 100 ──► materialPuroCm2             │              │
//! │                                   │                      │              │
//! │  porcentajeDesperdicio ───────────┴──► totalMaterialCm2  │              │
//! │                                              │           │              │
//! │                                              └─────┬─────┘              │
//! │                                                    ▼                    │
//! │                                              costoMaterial              │
//! │                                                                         │
//! │  Each arrow runs only when all of its inputs are set; otherwise the     │
//! │  derived field is cleared. Every step rounds to cents.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use atelier_core::catalog::ComponentIndex;
//! use atelier_core::fabric::FabricEdit;
//! use atelier_core::types::{Component, FabricRow};
//! use rust_decimal::Decimal;
//!
//! let lino: Component = serde_json::from_value(serde_json::json!({
//!     "id": "lino", "name": "Lino", "category": "telas", "price": 1000, "unitDivisor": 10
//! })).unwrap();
//! let components = ComponentIndex::new([lino]);
//!
//! let mut row = FabricRow::default();
//! row.apply(FabricEdit::Component(Some("lino".into())), &components);
//! row.apply(FabricEdit::AnchoTelaCm(Some(Decimal::from(150))), &components);
//! row.apply(FabricEdit::AnchoCm(Some(Decimal::from(50))), &components);
//! row.apply(FabricEdit::LargoCm(Some(Decimal::from(40))), &components);
//! row.apply(FabricEdit::PorcentajeDesperdicio(Some(Decimal::from(10))), &components);
//!
//! assert_eq!(row.cost(), Decimal::new(1474, 2));
//! ```

use rust_decimal::Decimal;

use crate::catalog::ComponentIndex;
use crate::money::{div_or_zero, mul_or_zero, round_money};
use crate::types::FabricRow;

/// A single user edit on a fabric row.
#[derive(Debug, Clone, PartialEq)]
pub enum FabricEdit {
    /// Select (or clear) the fabric component.
    Component(Option<String>),
    AnchoTelaCm(Option<Decimal>),
    AnchoCm(Option<Decimal>),
    LargoCm(Option<Decimal>),
    PorcentajeDesperdicio(Option<Decimal>),
}

impl FabricRow {
    /// Applies an edit and recomputes every derived field.
    ///
    /// Numeric inputs are rounded to cents before they are stored. Picking a
    /// component reloads `precioPorMetro` from its effective unit price; an
    /// unknown component leaves it empty.
    pub fn apply(&mut self, edit: FabricEdit, components: &ComponentIndex) {
        match edit {
            FabricEdit::Component(id) => {
                self.component_id = id.filter(|id| !id.trim().is_empty());
                self.precio_por_metro = components
                    .get(self.component_id.as_deref())
                    .map(|component| round_money(component.effective_unit_price()));
            }
            FabricEdit::AnchoTelaCm(value) => self.ancho_tela_cm = value.map(round_money),
            FabricEdit::AnchoCm(value) => self.ancho_cm = value.map(round_money),
            FabricEdit::LargoCm(value) => self.largo_cm = value.map(round_money),
            FabricEdit::PorcentajeDesperdicio(value) => {
                self.porcentaje_desperdicio = value.map(round_money)
            }
        }
        self.recompute();
    }

    /// Re-derives `valorCm2`, `materialPuroCm2`, `totalMaterialCm2` and
    /// `costoMaterial` from the current inputs.
    pub fn recompute(&mut self) {
        self.valor_cm2 = match (self.precio_por_metro, self.ancho_tela_cm) {
            (Some(price), Some(width)) if !width.is_zero() => {
                Some(round_money(div_or_zero(price, width)))
            }
            _ => None,
        };

        self.material_puro_cm2 = match (self.ancho_cm, self.largo_cm) {
            (Some(width), Some(length)) => {
                Some(round_money(mul_or_zero(width, length) / Decimal::ONE_HUNDRED))
            }
            _ => None,
        };

        self.total_material_cm2 = match (self.material_puro_cm2, self.porcentaje_desperdicio) {
            (Some(area), Some(waste)) => Some(round_money(mul_or_zero(
                area,
                Decimal::ONE + waste / Decimal::ONE_HUNDRED,
            ))),
            _ => None,
        };

        self.costo_material = match (self.total_material_cm2, self.valor_cm2) {
            (Some(area), Some(value)) => Some(round_money(mul_or_zero(area, value))),
            _ => None,
        };
    }

    /// True while no fabric has been selected.
    pub fn is_pending(&self) -> bool {
        self.component_id.is_none()
    }

    /// Contribution to the product's material cost. Pending rows count 0.
    pub fn cost(&self) -> Decimal {
        if self.is_pending() {
            return Decimal::ZERO;
        }
        self.costo_material.unwrap_or_default()
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

    fn components() -> ComponentIndex {
        let lino: Component = serde_json::from_value(json!({
            "id": "lino",
            "name": "Lino natural",
            "category": "telas",
            "price": 1000,
            "unitDivisor": 10
        }))
        .unwrap();
        let gabardina: Component = serde_json::from_value(json!({
            "id": "gab",
            "name": "Gabardina",
            "category": "telas",
            "price": 2400
        }))
        .unwrap();
        ComponentIndex::new([lino, gabardina])
    }

    fn filled_row(components: &ComponentIndex) -> FabricRow {
        let mut row = FabricRow::default();
        row.apply(FabricEdit::Component(Some("lino".into())), components);
        row.apply(FabricEdit::AnchoTelaCm(Some(d(150, 0))), components);
        row.apply(FabricEdit::AnchoCm(Some(d(50, 0))), components);
        row.apply(FabricEdit::LargoCm(Some(d(40, 0))), components);
        row.apply(FabricEdit::PorcentajeDesperdicio(Some(d(10, 0))), components);
        row
    }

    #[test]
    fn test_full_derivation() {
        let components = components();
        let row = filled_row(&components);

        assert_eq!(row.precio_por_metro, Some(d(100, 0)));
        assert_eq!(row.valor_cm2, Some(d(67, 2)));
        assert_eq!(row.material_puro_cm2, Some(d(20, 0)));
        assert_eq!(row.total_material_cm2, Some(d(22, 0)));
        assert_eq!(row.costo_material, Some(d(1474, 2)));
        assert_eq!(row.cost(), d(1474, 2));
    }

    #[test]
    fn test_inputs_rounded_on_entry() {
        let components = components();
        let mut row = FabricRow::default();
        row.apply(FabricEdit::AnchoCm(Some(d(33333, 3))), &components);
        assert_eq!(row.ancho_cm, Some(d(3333, 2)));
    }

    #[test]
    fn test_changing_component_reprices_row() {
        let components = components();
        let mut row = filled_row(&components);
        row.apply(FabricEdit::Component(Some("gab".into())), &components);

        assert_eq!(row.precio_por_metro, Some(d(2400, 0)));
        assert_eq!(row.valor_cm2, Some(d(16, 0)));
        assert_eq!(row.costo_material, Some(d(352, 0)));
    }

    #[test]
    fn test_zero_roll_width_leaves_value_unset() {
        let components = components();
        let mut row = filled_row(&components);
        row.apply(FabricEdit::AnchoTelaCm(Some(Decimal::ZERO)), &components);

        assert_eq!(row.valor_cm2, None);
        assert_eq!(row.costo_material, None);
        assert_eq!(row.total_material_cm2, Some(d(22, 0)));
    }

    #[test]
    fn test_clearing_input_clears_dependents() {
        let components = components();
        let mut row = filled_row(&components);
        row.apply(FabricEdit::LargoCm(None), &components);

        assert_eq!(row.material_puro_cm2, None);
        assert_eq!(row.total_material_cm2, None);
        assert_eq!(row.costo_material, None);
        assert_eq!(row.cost(), Decimal::ZERO);
    }

    #[test]
    fn test_pending_row_costs_nothing() {
        let components = components();
        let mut row = filled_row(&components);
        row.apply(FabricEdit::Component(None), &components);

        assert!(row.is_pending());
        assert_eq!(row.precio_por_metro, None);
        assert_eq!(row.cost(), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_component_has_no_price() {
        let components = components();
        let mut row = FabricRow::default();
        row.apply(FabricEdit::Component(Some("missing".into())), &components);

        assert!(!row.is_pending());
        assert_eq!(row.precio_por_metro, None);
        assert_eq!(row.cost(), Decimal::ZERO);
    }
}
