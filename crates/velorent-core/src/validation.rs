//! # Validation Module
//!
//! Input validation utilities for VeloRent.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Engine service (Rust)                                        │
//! │  ├── Type validation (enums make bad granularities unrepresentable)    │
//! │  └── THIS MODULE: business rule validation, before any mutation        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── CHECK (end_time > start_time)                                     │
//! │  ├── UNIQUE constraints on references                                  │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: the interval invariant is enforced here AND in SQL  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::MAX_RENTAL_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a catalog or rental reference.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use velorent_core::validation::validate_reference;
///
/// assert!(validate_reference("RENT-00042").is_ok());
/// assert!(validate_reference("").is_err());
/// assert!(validate_reference("has space").is_err());
/// ```
pub fn validate_reference(reference: &str) -> ValidationResult<()> {
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(ValidationError::Required {
            field: "reference".to_string(),
        });
    }

    if reference.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "reference".to_string(),
            max: 50,
        });
    }

    if !reference
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "reference".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use velorent_core::validation::validate_uuid;
///
/// assert!(validate_uuid("customer_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("customer_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Interval Validator
// =============================================================================

/// Validates a rental interval.
///
/// ## Rules
/// Half-open `[start, end)` semantics: `end` must be strictly after
/// `start`. Zero-length and inverted intervals are rejected here, before
/// they can ever reach the overlap check.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use velorent_core::validation::validate_interval;
///
/// let start = Utc::now();
/// assert!(validate_interval(start, start + Duration::hours(2)).is_ok());
/// assert!(validate_interval(start, start).is_err());
/// assert!(validate_interval(start, start - Duration::hours(1)).is_err());
/// ```
pub fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> ValidationResult<()> {
    if end <= start {
        return Err(ValidationError::InvalidInterval { start, end });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a rental quantity (in granularity units).
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_RENTAL_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_RENTAL_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_RENTAL_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (a free loaner bike is legitimate)
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_reference() {
        assert!(validate_reference("RENT-00042").is_ok());
        assert!(validate_reference("BIKE_CITY_01").is_ok());

        assert!(validate_reference("").is_err());
        assert!(validate_reference("   ").is_err());
        assert!(validate_reference("has space").is_err());
        assert!(validate_reference(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_interval() {
        let start = Utc::now();
        assert!(validate_interval(start, start + Duration::hours(1)).is_ok());
        // Zero-length: rejected
        assert!(validate_interval(start, start).is_err());
        // Inverted: rejected
        assert!(validate_interval(start, start - Duration::hours(1)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents("unit_price", 0).is_ok());
        assert!(validate_price_cents("unit_price", 1999).is_ok());
        assert!(validate_price_cents("unit_price", -1).is_err());
    }
}
