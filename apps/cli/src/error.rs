//! # CLI Error Type
//!
//! Unified error type for every subcommand.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the CLI                                │
//! │                                                                         │
//! │  Subcommand ── Result<(), CliError>                                     │
//! │       │                                                                 │
//! │       ├── DbError ─────────┐                                            │
//! │       ├── CoreError ───────┼──► CliError { code, message }              │
//! │       └── PricingError ────┘          │                                 │
//! │                                       ▼                                 │
//! │                     stderr: "error[NOT_FOUND]: Sale not found: 42"      │
//! │                     exit code from ErrorCode::exit_code()               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use atelier_core::CoreError;
use atelier_db::DbError;
use atelier_pricing::PricingError;
use serde::Serialize;

pub type CliResult<T> = Result<T, CliError>;

/// Error printed when a command fails.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    DatabaseError,
    /// Stored data cannot be read.
    InvalidData,
    ConfigError,
    /// The price lookup service failed.
    LookupError,
    Internal,
}

impl ErrorCode {
    /// Process exit code. Usage errors and data errors are kept apart so
    /// scripts can tell them apart.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorCode::NotFound | ErrorCode::ValidationError => 2,
            ErrorCode::ConfigError => 3,
            ErrorCode::LookupError => 4,
            ErrorCode::DatabaseError | ErrorCode::InvalidData | ErrorCode::Internal => 1,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to CLI errors.
impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => CliError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::InvalidDocument { entity, id, reason } => CliError::new(
                ErrorCode::InvalidData,
                format!("{} {} cannot be read: {}", entity, id, reason),
            ),
            DbError::Core(err) => CliError::from(err),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                CliError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to CLI errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => CliError::not_found("Product", &id),
            CoreError::ComponentNotFound(id) => CliError::not_found("Component", &id),
            CoreError::SaleNotFound(id) => CliError::not_found("Sale", &id),
            CoreError::Validation(e) => CliError::validation(e.to_string()),
            err @ (CoreError::UnknownProductType(_)
            | CoreError::CompositeWithMaterials(_)
            | CoreError::InvalidDocument(_)) => {
                CliError::new(ErrorCode::InvalidData, err.to_string())
            }
        }
    }
}

/// Converts pricing errors to CLI errors.
impl From<PricingError> for CliError {
    fn from(err: PricingError) -> Self {
        if err.is_config_error() {
            return CliError::new(ErrorCode::ConfigError, err.to_string());
        }
        match err {
            PricingError::Database(e) => CliError::new(ErrorCode::DatabaseError, e),
            PricingError::AlreadyRunning => CliError::internal(err.to_string()),
            other => CliError::new(ErrorCode::LookupError, other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(format!("Failed to encode output: {}", err))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::ValidationError;

    #[test]
    fn test_db_not_found() {
        let err = CliError::from(DbError::not_found("Sale", "42"));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Sale not found: 42");
        assert_eq!(err.code.exit_code(), 2);
    }

    #[test]
    fn test_core_errors_pass_through_db() {
        let err = CliError::from(DbError::Core(CoreError::Validation(
            ValidationError::MustBePositive {
                field: "quantity".into(),
            },
        )));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "quantity must be positive");

        let err = CliError::from(CoreError::UnknownProductType("bundle".into()));
        assert_eq!(err.code, ErrorCode::InvalidData);
    }

    #[test]
    fn test_pricing_errors() {
        assert_eq!(CliError::from(PricingError::MissingEndpoint).code, ErrorCode::ConfigError);
        assert_eq!(CliError::from(PricingError::Timeout(15)).code, ErrorCode::LookupError);
        assert_eq!(
            CliError::from(PricingError::Database("locked".into())).code,
            ErrorCode::DatabaseError
        );
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(CliError::validation("bad")).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "bad");
    }
}
