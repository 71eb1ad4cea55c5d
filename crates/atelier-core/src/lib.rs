//! # atelier-core: Costing and Sales Logic for a Sewing Workshop
//!
//! Pure, synchronous business rules for an inventory, costing and sales
//! ledger of sewn goods. Nothing in this crate touches the database or the
//! network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Atelier Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    atelier CLI (apps/cli)                       │   │
//! │  │   components, product cost, sales, stats, refresh-prices        │   │
//! │  └───────────────┬───────────────────────────────┬─────────────────┘   │
//! │                  │                               │                      │
//! │  ┌───────────────▼───────────────┐  ┌────────────▼────────────────┐    │
//! │  │  atelier-db                   │  │  atelier-pricing            │    │
//! │  │  data_store, repositories     │  │  lookup client, refresh run │    │
//! │  └───────────────┬───────────────┘  └────────────┬────────────────┘    │
//! │                  │                               │                      │
//! │  ┌───────────────▼───────────────────────────────▼─────────────────┐   │
//! │  │              ★ atelier-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │  fabric  │  │materials │  │ costing  │  │ adjustments  │   │   │
//! │  │   │ cm² rows │  │unit rows │  │composite │  │ + migration  │   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │ payments │  │  sales   │  │  stats   │  │  validation  │   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Half-up rounding to cents, tolerance comparisons
//! - [`types`] - Component, row, adjustment and sale records
//! - [`product`] - Simple and composite products, document conversion
//! - [`fabric`] / [`materials`] - Row calculators
//! - [`costing`] - Cycle-safe cost aggregation
//! - [`adjustments`] - Price adjustments, default migration, modifiers map
//! - [`payments`] - Sale financials and payment reconciliation
//! - [`sales`] / [`stats`] - Recording, listing and reporting sales
//!
//! ## Money
//!
//! Amounts are `rust_decimal::Decimal`, rounded half-up to two places at
//! every derived step. Stored documents may carry numbers as strings; the
//! [`lenient`] adapters accept both.
//!
//! ## Example Usage
//!
//! ```rust
//! use atelier_core::types::{PaymentStatus, Sale};
//! use rust_decimal::Decimal;
//!
//! // Two units at 100 of material plus 50 of labor, 100 paid up front.
//! let mut sale = Sale {
//!     quantity: Decimal::from(2),
//!     unit_price: Decimal::from(100),
//!     ganancia_unit: Decimal::from(50),
//!     payment_received: Some(Decimal::from(100)),
//!     ..Sale::default()
//! };
//!
//! let financials = sale.reconcile();
//! assert_eq!(financials.effective_sale_value, Decimal::from(300));
//! assert_eq!(sale.payment_pending, Some(Decimal::from(200)));
//! assert_eq!(financials.payment_status, PaymentStatus::Partial);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adjustments;
pub mod catalog;
pub mod costing;
pub mod error;
pub mod fabric;
pub mod lenient;
pub mod materials;
pub mod money;
pub mod payments;
pub mod product;
pub mod rows;
pub mod sales;
pub mod stats;
pub mod text;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{ComponentIndex, ProductIndex};
pub use costing::{compute_product_cost_summary, CostSummary};
pub use error::{CoreError, CoreResult, ValidationError};
pub use payments::{compute_sale_financials, SaleEdit, SaleFinancials};
pub use product::{Product, ProductKind, ProductType};
pub use types::*;
