//! # atelier-pricing: Vendor Price Refresh for Atelier Ledger
//!
//! Keeps component purchase prices in step with the vendors' shops. Each
//! component may carry a link to its vendor page; an external lookup
//! service turns that link into a current price.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Price Refresh Flow                               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                     PriceRefresh (refresh.rs)                    │  │
//! │  │                                                                  │  │
//! │  │  select_queue(components, category)                             │  │
//! │  │  for each item, strictly in order:                              │  │
//! │  │    cancelled? ── yes ──► stop, rest stay Pending                │  │
//! │  │    fetch (timeout) ──► store price ──► Success | Error          │  │
//! │  └──────────┬───────────────────────────────────┬──────────────────┘  │
//! │             ▼                                   ▼                      │
//! │  ┌────────────────────────┐        ┌──────────────────────────────┐   │
//! │  │ PriceSource            │        │ ComponentPriceStore          │   │
//! │  │  HttpPriceSource       │        │  atelier_db::Database        │   │
//! │  │  GET endpoint?url=...  │        │  components().update_price   │   │
//! │  └────────────────────────┘        └──────────────────────────────┘   │
//! │                                                                         │
//! │  PricingConfig: pricing.toml + ATELIER_* environment overrides         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Lookup endpoint, timeout and database path
//! - [`error`] - Pricing error types
//! - [`source`] - Price source trait and HTTP client
//! - [`refresh`] - Queue selection and the sequential refresh runner
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use atelier_pricing::{HttpPriceSource, PriceRefresh, PricingConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = PricingConfig::load_or_default(None);
//! let source = Arc::new(HttpPriceSource::new(&config.lookup)?);
//! let refresh = PriceRefresh::new(source, Arc::new(db), config.timeout());
//!
//! let queue = refresh.queue(Some("telas")).await?;
//! let report = refresh.run(queue, CancellationToken::new()).await?;
//! println!("{} updated, {} failed", report.succeeded(), report.failed());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod refresh;
pub mod source;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{DatabaseSettings, LookupSettings, PricingConfig};
pub use error::{PricingError, PricingResult};
pub use refresh::{
    select_queue, ComponentPriceStore, ItemStatus, PriceRefresh, RefreshEvent, RefreshItem,
    RefreshReport, RunState,
};
pub use source::{HttpPriceSource, PriceSource};
