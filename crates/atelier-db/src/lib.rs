//! # atelier-db: Record Store for Atelier Ledger
//!
//! SQLite persistence for components, products and sales. Every entity is
//! a JSON document in a single `data_store` table, so documents written by
//! older versions of the application load without a schema migration.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atelier Data Flow                                │
//! │                                                                         │
//! │  atelier CLI / atelier-pricing refresh / atelier-seed                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   atelier-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ RecordStore   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ComponentRepo │    │ 001_data_    │  │   │
//! │  │   │ WAL           │    │ ProductRepo   │    │    store.sql │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite: data_store(collection, external_id, data, ...)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Record store and typed repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atelier_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("atelier.db")).await?;
//! let (product, summary) = db.products().cost_summary("7").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::component::ComponentRepository;
pub use repository::product::{MigrationReport, ProductRepository};
pub use repository::records::{resolve_collection, RecordStore, WriteOp};
pub use repository::sale::SaleRepository;
