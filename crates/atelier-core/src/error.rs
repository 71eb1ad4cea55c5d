//! # Error Types
//!
//! Domain-specific error types for atelier-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atelier-core errors (this file)                                       │
//! │  ├── CoreError        - Document shape and domain errors               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  atelier-db errors (separate crate)                                    │
//! │  └── DbError          - Record store failures                          │
//! │                                                                         │
//! │  atelier-pricing errors (separate crate)                               │
//! │  └── PricingError     - Lookup, config and refresh failures            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → CliError → stderr       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Costing never returns an error: a dangling component or product reference
//! contributes zero. Errors here are raised at the boundary, when a document
//! is read or a user edit is submitted.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Component cannot be found.
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// The `type` discriminator of a product document is neither
    /// `simple` nor `composite`.
    #[error("Unknown product type '{0}', expected 'simple' or 'composite'")]
    UnknownProductType(String),

    /// A composite product document carries its own material rows.
    ///
    /// ## When This Occurs
    /// - A simple product was switched to composite without clearing rows
    /// - A hand-edited export mixes both shapes
    #[error("Composite product {0} must not contain material rows")]
    CompositeWithMaterials(String),

    /// A stored document cannot be read as the expected entity.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::InvalidDocument(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any financial computation so an invalid edit is never
/// persisted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. non-numeric quantity, malformed URL).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
