//! Ordering helpers for the row lists of a product.

use std::cmp::Ordering;

use crate::catalog::ComponentIndex;
use crate::text;
use crate::types::{FabricRow, MaterialRow};

/// A row that points at a component.
pub trait ComponentRow {
    fn component_id(&self) -> Option<&str>;
}

impl ComponentRow for FabricRow {
    fn component_id(&self) -> Option<&str> {
        self.component_id.as_deref()
    }
}

impl ComponentRow for MaterialRow {
    fn component_id(&self) -> Option<&str> {
        self.component_id.as_deref()
    }
}

/// Moves the row at `from` so it lands before the row currently at `to`.
///
/// `to == rows.len()` drops it at the end. Out-of-range or no-op moves
/// leave the list untouched and return `false`.
pub fn move_row<T>(rows: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= rows.len() || to > rows.len() {
        return false;
    }
    let moved = rows.remove(from);
    let insert_at = if from < to { to - 1 } else { to };
    rows.insert(insert_at, moved);
    true
}

/// Sorts rows by accent-folded component name. Rows without a component go
/// last; the sort is stable otherwise.
pub fn sort_by_component_name<T: ComponentRow>(rows: &mut [T], components: &ComponentIndex) {
    let key = |row: &T| {
        row.component_id().map(|id| {
            components
                .get(Some(id))
                .map(|component| text::fold(&component.name))
                .unwrap_or_default()
        })
    };
    rows.sort_by(|a, b| match (key(a), key(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
