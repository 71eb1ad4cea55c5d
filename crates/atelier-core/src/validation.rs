//! # Validation Module
//!
//! Input validation for edits before they reach the calculators or the
//! record store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Document decoding (lenient.rs, product.rs)                   │
//! │  ├── Numbers in strings, blank → absent                                │
//! │  └── Product type discriminator, composite without rows                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required names and ids                                            │
//! │  └── Positive quantities and prices on new sales                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Record store                                                 │
//! │  └── (collection, external_id) primary key                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atelier_core::validation::{normalize_customer_name, validate_quantity};
//! use rust_decimal::Decimal;
//!
//! assert!(validate_quantity(Decimal::from(2)).is_ok());
//! assert!(validate_quantity(Decimal::ZERO).is_err());
//! assert_eq!(normalize_customer_name(Some("  ana  ")), Some("Ana".to_string()));
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::product::Product;
use crate::types::Component;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted entity name.
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted search text.
pub const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name.
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an id reference.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed, lowercased query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_lowercase())
}

/// Trims a customer name, capitalizes its first letter, and maps blank to
/// `None`.
pub fn normalize_customer_name(name: Option<&str>) -> Option<String> {
    let name = name?.trim();
    let mut chars = name.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Checks that a vendor link is an absolute http(s) URL.
pub fn validate_link(link: &str) -> ValidationResult<()> {
    let link = link.trim();
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "link".to_string(),
            reason: "must be an http(s) URL".to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity: strictly positive.
pub fn validate_quantity(quantity: Decimal) -> ValidationResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price on a new sale: strictly positive.
pub fn validate_unit_price(price: Decimal) -> ValidationResult<()> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "unitPrice".to_string(),
        });
    }
    Ok(())
}

/// Validates an amount that may be zero but not negative.
pub fn validate_non_negative(field: &str, amount: Decimal) -> ValidationResult<()> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a component before it is saved.
pub fn validate_component(component: &Component) -> ValidationResult<()> {
    validate_name("name", &component.name)?;
    validate_non_negative("price", component.price)?;
    if let Some(link) = component.vendor_link() {
        validate_link(link)?;
    }
    Ok(())
}

/// Validates a product before it is saved.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_non_negative("price", product.price)?;
    validate_non_negative("costoConfeccion", product.costo_confeccion())?;
    for adjustment in &product.price_adjustments {
        if adjustment.name.trim().is_empty() && !adjustment.percent.is_zero() {
            return Err(ValidationError::Required {
                field: "priceAdjustments.name".to_string(),
            });
        }
    }
    Ok(())
}

/// Validates the required fields of a new sale.
pub fn validate_new_sale(
    product_id: &str,
    quantity: Decimal,
    unit_price: Decimal,
) -> ValidationResult<()> {
    validate_id("productId", product_id)?;
    validate_quantity(quantity)?;
    validate_unit_price(unit_price)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceAdjustment;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Mochila").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_normalize_customer_name() {
        assert_eq!(normalize_customer_name(None), None);
        assert_eq!(normalize_customer_name(Some("   ")), None);
        assert_eq!(
            normalize_customer_name(Some(" élida gómez")),
            Some("Élida gómez".to_string())
        );
    }

    #[test]
    fn test_validate_link() {
        assert!(validate_link("https://www.casanacho.com.ar/p/123").is_ok());
        assert!(validate_link("http://shop.local").is_ok());
        assert!(validate_link("ftp://x").is_err());
        assert!(validate_link("https://").is_err());
    }

    #[test]
    fn test_validate_new_sale() {
        assert!(validate_new_sale("p1", Decimal::ONE, Decimal::from(10)).is_ok());
        assert!(matches!(
            validate_new_sale("", Decimal::ONE, Decimal::from(10)),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_new_sale("p1", Decimal::ZERO, Decimal::from(10)),
            Err(ValidationError::MustBePositive { field }) if field == "quantity"
        ));
        assert!(matches!(
            validate_new_sale("p1", Decimal::ONE, Decimal::ZERO),
            Err(ValidationError::MustBePositive { field }) if field == "unitPrice"
        ));
    }

    #[test]
    fn test_validate_product_adjustment_names() {
        let mut product = Product::simple("p", "Bolso");
        product.price_adjustments = vec![PriceAdjustment::new("", Decimal::ZERO)];
        assert!(validate_product(&product).is_ok());

        product.price_adjustments = vec![PriceAdjustment::new(" ", Decimal::from(5))];
        assert!(validate_product(&product).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  Mochila ").unwrap(), "mochila");
        assert!(validate_search_query(&"a".repeat(101)).is_err());
    }
}
