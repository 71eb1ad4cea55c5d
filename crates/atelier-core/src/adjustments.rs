//! # Price Adjustment Engine
//!
//! Named percentage markups applied to a product's base price.
//!
//! ## Independent, Not Compounded
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base 1000                                                              │
//! │    ├── Inflación          +2%   ──► 1020                                │
//! │    ├── Con cuenta DNI     +2%   ──► 1020                                │
//! │    ├── En dos veces      +15%   ──► 1150                                │
//! │    └── Con transferencia +15%   ──► 1150                                │
//! │                                                                         │
//! │  Each adjustment is applied to the same base, never on top of another.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage Shapes
//! Adjustments are edited as an ordered list (`priceAdjustments`). Older
//! records stored a `modificadores` map of name → fraction (`0.15`), either
//! at the root or under `pricing`. On load both are merged (list wins, names
//! compared case-insensitively); on save the map is derived from the list.
//!
//! ## Default Migration
//! Products created before the default adjustments existed get them added
//! once. Legacy names are renamed through [`ALIASES`], obsolete ones in
//! [`REMOVED`] are dropped, and `defaultsMigrated` is set so the migration
//! never runs twice on the same product.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::lenient;
use crate::money::{mul_or_zero, round_money, round_to};
use crate::product::Product;
use crate::text;
use crate::types::PriceAdjustment;

// =============================================================================
// Defaults, Aliases, Removals
// =============================================================================

/// Adjustments every product carries after migration, in display order.
pub const DEFAULT_ADJUSTMENTS: &[(&str, i64)] = &[
    ("Inflación", 2),
    ("Con cuenta DNI", 2),
    ("En dos veces", 15),
    ("Con transferencia", 15),
];

/// Folded legacy name → current name.
pub const ALIASES: &[(&str, &str)] = &[
    ("inflacion mensual", "Inflación"),
    ("cuenta dni", "Con cuenta DNI"),
    ("dni", "Con cuenta DNI"),
    ("con dni", "Con cuenta DNI"),
    ("dos veces", "En dos veces"),
    ("2 veces", "En dos veces"),
    ("en 2 veces", "En dos veces"),
    ("dos cuotas", "En dos veces"),
    ("2 cuotas", "En dos veces"),
    ("transferencia", "Con transferencia"),
    ("transferencia bancaria", "Con transferencia"),
];

/// Folded names dropped during normalization.
pub const REMOVED: &[&str] = &["efectivo", "con efectivo", "pago en efectivo"];

/// Folded name of the adjustment used for the list display price.
pub const INFLATION_NAME: &str = "inflacion";

/// The default adjustments as list entries.
pub fn default_adjustments() -> Vec<PriceAdjustment> {
    DEFAULT_ADJUSTMENTS
        .iter()
        .map(|(name, percent)| PriceAdjustment::new(*name, Decimal::from(*percent)))
        .collect()
}

// =============================================================================
// Applying Adjustments
// =============================================================================

/// One adjustment applied to a base price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedPrice {
    pub name: String,
    #[ts(type = "number")]
    pub percent: Decimal,
    #[ts(type = "number")]
    pub corrected: Decimal,
}

/// `round(base × (1 + percent/100))`.
pub fn corrected_price(base: Decimal, percent: Decimal) -> Decimal {
    round_money(mul_or_zero(base, Decimal::ONE + percent / Decimal::ONE_HUNDRED))
}

/// Applies every adjustment to the same `base`, preserving list order.
///
/// ## Example
/// ```rust
/// use atelier_core::adjustments::{apply_adjustments, default_adjustments};
/// use rust_decimal::Decimal;
///
/// let prices = apply_adjustments(Decimal::from(1000), &default_adjustments());
/// assert_eq!(prices[0].corrected, Decimal::from(1020));
/// assert_eq!(prices[2].corrected, Decimal::from(1150));
/// ```
pub fn apply_adjustments(base: Decimal, adjustments: &[PriceAdjustment]) -> Vec<AdjustedPrice> {
    adjustments
        .iter()
        .map(|adjustment| AdjustedPrice {
            name: adjustment.name.clone(),
            percent: adjustment.percent,
            corrected: corrected_price(base, adjustment.percent),
        })
        .collect()
}

/// Percent of the inflation adjustment, or 0 when the product has none.
pub fn inflation_percent(adjustments: &[PriceAdjustment]) -> Decimal {
    adjustments
        .iter()
        .find(|adjustment| text::fold(&adjustment.name) == INFLATION_NAME)
        .map(|adjustment| adjustment.percent)
        .unwrap_or_default()
}

/// List display price: material cost plus labor, marked up by inflation.
pub fn price_with_inflation(
    cost_materials: Decimal,
    labor: Decimal,
    adjustments: &[PriceAdjustment],
) -> Decimal {
    let base = round_money(cost_materials.saturating_add(labor));
    corrected_price(base, inflation_percent(adjustments))
}

// =============================================================================
// List ↔ Map
// =============================================================================

/// Derives the legacy `modificadores` map: trimmed non-blank name →
/// `percent / 100` rounded to 4 places. Later duplicates overwrite earlier.
pub fn modifiers_from_adjustments(adjustments: &[PriceAdjustment]) -> BTreeMap<String, Decimal> {
    adjustments
        .iter()
        .filter(|adjustment| !adjustment.name.trim().is_empty())
        .map(|adjustment| {
            (
                adjustment.name.trim().to_string(),
                round_to(adjustment.percent / Decimal::ONE_HUNDRED, 4),
            )
        })
        .collect()
}

/// Reads a `modificadores` map back into list entries
/// (`fraction × 100`, rounded to 2 places; unreadable → 0).
pub fn adjustments_from_modifiers(modifiers: &Map<String, Value>) -> Vec<PriceAdjustment> {
    modifiers
        .iter()
        .map(|(name, fraction)| {
            let percent = lenient::decimal_from_value(fraction)
                .map(|fraction| round_to(mul_or_zero(fraction, Decimal::ONE_HUNDRED), 2))
                .unwrap_or_default();
            PriceAdjustment::new(name.clone(), percent)
        })
        .collect()
}

/// Merges the stored list with a legacy map. List entries come first and
/// win on a case-insensitive name collision.
pub fn merge_adjustments(
    list: &[PriceAdjustment],
    modifiers: Option<&Map<String, Value>>,
) -> Vec<PriceAdjustment> {
    let mut merged: Vec<PriceAdjustment> = Vec::with_capacity(list.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for adjustment in list {
        let key = adjustment.name.to_lowercase();
        match positions.get(&key) {
            Some(&at) => merged[at] = adjustment.clone(),
            None => {
                positions.insert(key, merged.len());
                merged.push(adjustment.clone());
            }
        }
    }

    if let Some(modifiers) = modifiers {
        for adjustment in adjustments_from_modifiers(modifiers) {
            let key = adjustment.name.to_lowercase();
            if !positions.contains_key(&key) {
                positions.insert(key, merged.len());
                merged.push(adjustment);
            }
        }
    }

    merged
}

// =============================================================================
// Default Migration
// =============================================================================

/// Renames aliased entries, drops removed ones and de-duplicates by folded
/// name (first occurrence wins).
pub fn normalize_adjustments(adjustments: &[PriceAdjustment]) -> Vec<PriceAdjustment> {
    let mut seen = std::collections::HashSet::new();
    adjustments
        .iter()
        .filter_map(|adjustment| {
            let folded = text::fold(&adjustment.name);
            if REMOVED.contains(&folded.as_str()) {
                return None;
            }
            let name = ALIASES
                .iter()
                .find(|(alias, _)| *alias == folded)
                .map(|(_, current)| current.to_string())
                .unwrap_or_else(|| adjustment.name.clone());
            seen.insert(text::fold(&name))
                .then(|| PriceAdjustment::new(name, adjustment.percent))
        })
        .collect()
}

/// Normalizes the list and appends any missing default.
pub fn with_default_adjustments(adjustments: &[PriceAdjustment]) -> Vec<PriceAdjustment> {
    let mut result = normalize_adjustments(adjustments);
    for default in default_adjustments() {
        let folded = text::fold(&default.name);
        if !result.iter().any(|existing| text::fold(&existing.name) == folded) {
            result.push(default);
        }
    }
    result
}

/// Runs the default migration on a product that has never been migrated.
///
/// Returns `true` when the product changed and should be saved.
pub fn ensure_default_adjustments(product: &mut Product) -> bool {
    if product.defaults_migrated {
        return false;
    }
    product.price_adjustments = with_default_adjustments(&product.price_adjustments);
    product.defaults_migrated = true;
    true
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    fn adj(name: &str, percent: i64) -> PriceAdjustment {
        PriceAdjustment::new(name, Decimal::from(percent))
    }

    #[test]
    fn test_adjustments_are_independent() {
        let list = vec![adj("Tarjeta", 10), adj("Cuotas", 20)];
        let prices = apply_adjustments(d(19999, 2), &list);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].corrected, d(21999, 2));
        assert_eq!(prices[1].corrected, d(23999, 2));
    }

    #[test]
    fn test_negative_percent_is_a_discount() {
        assert_eq!(corrected_price(d(100, 0), d(-10, 0)), d(90, 0));
    }

    #[test]
    fn test_modifiers_map_derivation() {
        let list = vec![adj(" Inflación ", 2), adj("", 50), PriceAdjustment::new("Raro", d(33333, 3))];
        let map = modifiers_from_adjustments(&list);
        assert_eq!(map.len(), 2);
        assert_eq!(map["Inflación"], d(2, 2));
        assert_eq!(map["Raro"], d(3333, 4));
    }

    #[test]
    fn test_merge_list_wins_case_insensitive() {
        let list = vec![adj("En dos veces", 18)];
        let modifiers = json!({ "en DOS veces": 0.15, "Inflación": 0.025 });
        let merged = merge_adjustments(&list, modifiers.as_object());

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], adj("En dos veces", 18));
        assert_eq!(merged[1].name, "Inflación");
        assert_eq!(merged[1].percent, d(25, 1));
    }

    #[test]
    fn test_merge_duplicate_list_entries_keep_first_position() {
        let list = vec![adj("A", 1), adj("B", 2), adj("a", 3)];
        let merged = merge_adjustments(&list, None);
        assert_eq!(merged, vec![adj("a", 3), adj("B", 2)]);
    }

    #[test]
    fn test_unreadable_modifier_is_zero() {
        let modifiers = json!({ "Roto": "n/a" });
        let merged = merge_adjustments(&[], modifiers.as_object());
        assert_eq!(merged, vec![adj("Roto", 0)]);
    }

    #[test]
    fn test_normalize_renames_and_drops() {
        let list = vec![
            adj("Efectivo", -10),
            adj("transferencia", 12),
            adj("Con transferencia", 15),
            adj("Mayorista", -20),
        ];
        let normalized = normalize_adjustments(&list);
        assert_eq!(
            normalized,
            vec![adj("Con transferencia", 12), adj("Mayorista", -20)]
        );
    }

    #[test]
    fn test_with_defaults_appends_missing() {
        let result = with_default_adjustments(&[adj("dos cuotas", 20)]);
        let names: Vec<&str> = result.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["En dos veces", "Inflación", "Con cuenta DNI", "Con transferencia"]
        );
        assert_eq!(result[0].percent, d(20, 0));
    }

    #[test]
    fn test_inflation_lookup() {
        let list = vec![adj("Tarjeta", 10), adj("INFLACION", 5)];
        assert_eq!(inflation_percent(&list), d(5, 0));
        assert_eq!(inflation_percent(&[]), Decimal::ZERO);
        assert_eq!(price_with_inflation(d(100, 0), d(50, 0), &list), d(1575, 1));
    }
}
