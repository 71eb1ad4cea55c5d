//! # Other-Material Row Calculator
//!
//! Rows for everything that is not fabric: hardware, thread, and labor
//! lines. A row whose component name contains "confección" is tailoring
//! labor; it is excluded from material cost and counted as gain instead.
//!
//! ```text
//! ┌──────────────────────────┬──────────┬──────────┬──────────────────────┐
//! │ component                │ unidades │ precio   │ counted as           │
//! ├──────────────────────────┼──────────┼──────────┼──────────────────────┤
//! │ Cierre 20cm              │ 1        │ 350      │ material cost        │
//! │ Hilo poliéster           │ 0.5      │ 900      │ material cost        │
//! │ Confección mochila       │ 1        │ 4000     │ labor / gain         │
//! └──────────────────────────┴──────────┴──────────┴──────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::catalog::ComponentIndex;
use crate::money::{mul_or_zero, round_money};
use crate::types::MaterialRow;

/// A single user edit on an other-material row.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialEdit {
    /// Select (or clear) the component. Reloads the unit price.
    Component(Option<String>),
    Unidades(Option<Decimal>),
    /// Manual price override, rounded to cents.
    PrecioUnitario(Option<Decimal>),
}

impl MaterialRow {
    /// Applies an edit.
    ///
    /// Selecting a component sets `precioUnitario` to its effective unit
    /// price, defaults `unidades` to 1 and re-derives the confección tag.
    pub fn apply(&mut self, edit: MaterialEdit, components: &ComponentIndex) {
        match edit {
            MaterialEdit::Component(id) => {
                self.component_id = id.filter(|id| !id.trim().is_empty());
                let component = components.get(self.component_id.as_deref());
                self.precio_unitario =
                    component.map(|component| round_money(component.effective_unit_price()));
                if self.unidades.is_none() && component.is_some() {
                    self.unidades = Some(Decimal::ONE);
                }
                self.tag_confeccion = component.is_some_and(|component| component.is_confeccion());
            }
            MaterialEdit::Unidades(value) => self.unidades = value,
            MaterialEdit::PrecioUnitario(value) => self.precio_unitario = value.map(round_money),
        }
    }

    /// Re-derives the confección tag from the current registry.
    ///
    /// Stored tags may predate a component rename, so they are recomputed
    /// before saving rather than trusted.
    pub fn refresh_tag(&mut self, components: &ComponentIndex) {
        self.tag_confeccion = components
            .get(self.component_id.as_deref())
            .is_some_and(|component| component.is_confeccion());
    }

    /// True while no component has been selected.
    pub fn is_pending(&self) -> bool {
        self.component_id.is_none()
    }

    /// `unidades × precioUnitario`; pending rows count 0.
    pub fn total(&self) -> Decimal {
        if self.is_pending() {
            return Decimal::ZERO;
        }
        mul_or_zero(
            self.unidades.unwrap_or_default(),
            self.precio_unitario.unwrap_or_default(),
        )
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

    fn components() -> ComponentIndex {
        let parse = |value| serde_json::from_value::<Component>(value).unwrap();
        ComponentIndex::new([
            parse(json!({ "id": "cierre", "name": "Cierre 20cm", "category": "Mercería", "price": 3500, "unitDivisor": 10 })),
            parse(json!({ "id": "conf", "name": "Confección mochila", "category": "Mano de obra", "price": 4000 })),
            parse(json!({ "id": "hilo", "name": "Hilo", "category": "Mercería", "price": 1000, "unitDivisor": 3 })),
        ])
    }

    #[test]
    fn test_select_component_sets_price_and_default_units() {
        let components = components();
        let mut row = MaterialRow::default();
        row.apply(MaterialEdit::Component(Some("cierre".into())), &components);

        assert_eq!(row.precio_unitario, Some(Decimal::from(350)));
        assert_eq!(row.unidades, Some(Decimal::ONE));
        assert!(!row.tag_confeccion);
        assert_eq!(row.total(), Decimal::from(350));
    }

    #[test]
    fn test_effective_price_is_rounded() {
        let components = components();
        let mut row = MaterialRow::default();
        row.apply(MaterialEdit::Component(Some("hilo".into())), &components);
        assert_eq!(row.precio_unitario, Some(Decimal::new(33333, 2)));
    }

    #[test]
    fn test_existing_units_are_kept() {
        let components = components();
        let mut row = MaterialRow {
            unidades: Some(Decimal::from(3)),
            ..MaterialRow::default()
        };
        row.apply(MaterialEdit::Component(Some("cierre".into())), &components);
        assert_eq!(row.total(), Decimal::from(1050));
    }

    #[test]
    fn test_confeccion_tag_follows_component() {
        let components = components();
        let mut row = MaterialRow::default();
        row.apply(MaterialEdit::Component(Some("conf".into())), &components);
        assert!(row.tag_confeccion);

        row.apply(MaterialEdit::Component(Some("cierre".into())), &components);
        assert!(!row.tag_confeccion);
    }

    #[test]
    fn test_refresh_tag_ignores_stale_value() {
        let components = components();
        let mut row = MaterialRow {
            component_id: Some("cierre".into()),
            unidades: Some(Decimal::ONE),
            precio_unitario: Some(Decimal::from(350)),
            tag_confeccion: true,
        };
        row.refresh_tag(&components);
        assert!(!row.tag_confeccion);
    }

    #[test]
    fn test_manual_price_rounded() {
        let components = components();
        let mut row = MaterialRow::default();
        row.apply(MaterialEdit::Component(Some("cierre".into())), &components);
        row.apply(MaterialEdit::PrecioUnitario(Some(Decimal::new(12345, 3))), &components);
        row.apply(MaterialEdit::Unidades(Some(Decimal::from(2))), &components);

        assert_eq!(row.precio_unitario, Some(Decimal::new(1235, 2)));
        assert_eq!(row.total(), Decimal::new(2470, 2));
    }
}
