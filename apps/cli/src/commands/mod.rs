//! # Subcommands
//!
//! Each submodule handles one noun of the command line. Handlers take a
//! [`Context`] and print either aligned text or JSON.
//!
//! ```text
//! commands/
//! ├── mod.rs         ◄─── Context, output helpers
//! ├── components.rs  ◄─── list, set-price
//! ├── products.rs    ◄─── list, cost, migrate-adjustments
//! ├── sales.rs       ◄─── list, show, new, edit, pay, delete, reconcile
//! ├── pricing.rs     ◄─── refresh-prices
//! └── stats.rs       ◄─── paid-sales report
//! ```

pub mod components;
pub mod pricing;
pub mod products;
pub mod sales;
pub mod stats;

use atelier_db::Database;
use atelier_pricing::PricingConfig;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CliResult;

/// What every handler gets.
pub struct Context {
    pub db: Database,
    pub config: PricingConfig,
    pub json: bool,
}

impl Context {
    /// Prints `value` as pretty JSON when `--json` is set, otherwise runs
    /// `text`.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> CliResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

/// Money for display: two decimals.
pub fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Optional text for a table cell.
pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_format() {
        assert_eq!(money(Decimal::from(1500)), "1500.00");
        assert_eq!(money(Decimal::new(1474, 2)), "14.74");
        assert_eq!(money(Decimal::new(5, 1)), "0.50");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("Efectivo")), "Efectivo");
    }
}
