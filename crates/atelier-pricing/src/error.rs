//! # Pricing Error Types
//!
//! Error types for price lookups and the bulk refresh.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pricing Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Lookup      │  │     Storage             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  RequestFailed  │  │  Database               │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │                         │ │
//! │  │  ConfigLoad/Save│  │  Service        │  │                         │ │
//! │  │                 │  │  InvalidPrice   │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for pricing operations.
pub type PricingResult<T> = Result<T, PricingError>;

/// Pricing error type.
#[derive(Debug, Error)]
pub enum PricingError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid pricing configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// No lookup endpoint configured.
    #[error("Price lookup endpoint not configured")]
    MissingEndpoint,

    /// Transport-level failure talking to the lookup service.
    #[error("Lookup request failed: {0}")]
    RequestFailed(String),

    /// Lookup did not answer in time.
    #[error("Lookup timeout after {0} seconds")]
    Timeout(u64),

    /// The service answered with an error status or an `error` body.
    #[error("Lookup service error: {0}")]
    Service(String),

    /// The service answered without a usable price.
    #[error("Invalid price in lookup response: {0}")]
    InvalidPrice(String),

    // =========================================================================
    // Refresh Errors
    // =========================================================================
    /// A refresh is already in progress on this runner.
    #[error("A price refresh is already running")]
    AlreadyRunning,

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<atelier_db::DbError> for PricingError {
    fn from(err: atelier_db::DbError) -> Self {
        PricingError::Database(err.to_string())
    }
}

impl From<url::ParseError> for PricingError {
    fn from(err: url::ParseError) -> Self {
        PricingError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for PricingError {
    fn from(err: std::io::Error) -> Self {
        PricingError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for PricingError {
    fn from(err: toml::de::Error) -> Self {
        PricingError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for PricingError {
    fn from(err: toml::ser::Error) -> Self {
        PricingError::ConfigSaveFailed(err.to_string())
    }
}

impl From<reqwest::Error> for PricingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PricingError::Timeout(0)
        } else if err.is_decode() {
            PricingError::InvalidPrice(err.to_string())
        } else {
            PricingError::RequestFailed(err.to_string())
        }
    }
}

impl PricingError {
    /// True when a later attempt could succeed without a config change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PricingError::RequestFailed(_) | PricingError::Timeout(_)
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PricingError::InvalidConfig(_)
                | PricingError::InvalidUrl(_)
                | PricingError::MissingEndpoint
                | PricingError::ConfigLoadFailed(_)
                | PricingError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PricingError::Timeout(15).is_retryable());
        assert!(PricingError::RequestFailed("reset".into()).is_retryable());
        assert!(!PricingError::Service("not found".into()).is_retryable());
        assert!(!PricingError::InvalidPrice("abc".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(PricingError::MissingEndpoint.is_config_error());
        assert!(PricingError::InvalidUrl("x".into()).is_config_error());
        assert!(!PricingError::Database("locked".into()).is_config_error());
    }

    #[test]
    fn test_db_error_conversion() {
        let err: PricingError = atelier_db::DbError::not_found("Component", "c1").into();
        assert!(matches!(err, PricingError::Database(_)));
        assert!(err.to_string().contains("c1"));
    }
}
