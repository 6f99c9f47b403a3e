//! # Error Types
//!
//! Domain-specific error types for velorent-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  velorent-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  velorent-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  velorent-engine errors (separate crate)                               │
//! │  └── EngineError      - Wraps all of the above + collaborator faults   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, state, action)
//! 3. Errors are enum variants, never String
//! 4. A rejected operation leaves the contract exactly as it was

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{RentalAction, RentalState};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. Every variant carries enough
/// context for the caller to act: retry with a different interval, fix the
/// input, or give up.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested interval is not available for the item.
    ///
    /// ## When This Occurs
    /// - Item has no spare quantity AND another draft/ongoing rental
    ///   overlaps the candidate interval
    ///
    /// ## Recovery
    /// The caller may retry with a different interval; the conflicting item
    /// identity is carried for the message.
    #[error("Item {item_id} is not available for {start} to {end}")]
    AvailabilityConflict {
        item_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Action not legal from the contract's current state.
    ///
    /// ## When This Occurs
    /// - Starting a rental that is not a draft
    /// - Returning a rental that is not ongoing
    /// - Cancelling an already-returned rental
    /// - Resetting anything but a cancelled rental
    /// - Editing dates or pricing outside draft
    #[error("Cannot {action} a {current} rental")]
    InvalidTransition {
        current: RentalState,
        action: RentalAction,
    },

    /// An invoice already exists for the contract.
    ///
    /// The first invoice reference is preserved unchanged; building a
    /// second one is always a caller mistake.
    #[error("Rental {reference} already has invoice {invoice_id}")]
    DuplicateInvoice {
        reference: String,
        invoice_id: String,
    },

    /// Item cannot be rented (catalog says so).
    ///
    /// Accessories and parts keep `rentable = false`; they attach to
    /// contracts as extras instead.
    #[error("Item {item_id} ({name}) is not rentable")]
    ItemNotRentable { item_id: String, name: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. Raised before
/// any mutation; fully recoverable by correcting the input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// The rental interval is empty or inverted.
    ///
    /// Half-open `[start, end)` semantics require `end > start`; a
    /// zero-length rental is rejected here, upstream of any overlap math.
    #[error("end time {end} must be after start time {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Invalid format (e.g. invalid UUID).
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
