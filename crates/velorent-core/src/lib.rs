//! # velorent-core: Pure Business Logic for VeloRent
//!
//! This crate is the **heart** of the VeloRent rental engine. It contains all
//! rental business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       VeloRent Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 velorent-engine (Service Layer)                 │   │
//! │  │   quote ──► create ──► start ──► return ──► invoice             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ velorent-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌────────────┐ ┌─────────┐ ┌──────────┐          │   │
//! │  │  │ pricing  │ │availability│ │ charges │ │lifecycle │          │   │
//! │  │  │ tiers,   │ │ overlap    │ │ duration│ │ state    │          │   │
//! │  │  │ end time │ │ detection  │ │ late fee│ │ machine  │          │   │
//! │  │  └──────────┘ └────────────┘ └─────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │  NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  velorent-db (Database Layer)                   │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RentalContract, CatalogItem, enums)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`pricing`] - Tier price resolution and end-time computation
//! - [`availability`] - Interval overlap and booking availability
//! - [`charges`] - Duration, base price, extras and late-fee math
//! - [`lifecycle`] - The rental state machine
//! - [`invoice`] - Invoice line assembly for the billing collaborator
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, clock access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use velorent_core::pricing::compute_end_time;
//! use velorent_core::types::PricingGranularity;
//!
//! let start = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
//! let end = compute_end_time(start, PricingGranularity::Daily, 3).unwrap();
//!
//! assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 4, 10, 0, 0).unwrap());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod charges;
pub mod error;
pub mod invoice;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use velorent_core::Money` instead of
// `use velorent_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Late-return surcharge multiplier in basis points (15000 = 150%).
///
/// ## Business Reason
/// A bike returned late blocks the next booking, so late days bill at one
/// and a half times the daily rate. Applied only to daily-priced rentals;
/// see [`charges::compute_late_charge`] for the documented gap on other
/// granularities.
pub const LATE_SURCHARGE_BPS: i64 = 15_000;

/// Days per month used by end-time computation.
///
/// Fixed 30-day month: deliberately NOT calendar-aware. A "one month"
/// rental is exactly 720 hours regardless of the starting date.
pub const DAYS_PER_MONTH: i64 = 30;

/// Maximum quantity (in granularity units) accepted for a single rental.
///
/// ## Business Reason
/// Prevents accidental over-booking (e.g. typing 120 months instead of 12).
pub const MAX_RENTAL_QUANTITY: i64 = 999;
