//! # Availability Checker
//!
//! Decides whether a candidate interval can be booked for an item.
//!
//! ## The Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  is_available(item qty, [start, end), active rentals, exclude)          │
//! │                                                                         │
//! │  available_quantity >= 1 ?                                              │
//! │       │                                                                 │
//! │       ├── YES ──► AVAILABLE (interchangeable fleet: any spare unit      │
//! │       │           can serve the booking; we don't track which one)      │
//! │       │                                                                 │
//! │       └── NO ───► scan draft/ongoing rentals of the same item           │
//! │                   (skipping the contract under evaluation)              │
//! │                        │                                                │
//! │                        ├── any [s,e) overlap ──► UNAVAILABLE            │
//! │                        └── none ───────────────► AVAILABLE              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Half-Open Semantics
//! All intervals are `[start, end)`. Two intervals overlap iff
//! `s1 < e2 AND s2 < e1`. Equal boundary touching (`e1 == s2`) is NOT an
//! overlap, so back-to-back bookings are permitted: the 10:00 return and
//! the 10:00 pickup are the same handover.
//!
//! Zero-length and inverted intervals never reach this module; they are
//! rejected by [`crate::validation::validate_interval`] upstream.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::ActiveRental;

/// Half-open interval overlap test.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use velorent_core::availability::intervals_overlap;
///
/// let jan = |d, h| Utc.with_ymd_and_hms(2026, 1, d, h, 0, 0).unwrap();
///
/// // [1st 10:00, 3rd 10:00) vs [2nd 00:00, 2nd 12:00): overlap
/// assert!(intervals_overlap(jan(1, 10), jan(3, 10), jan(2, 0), jan(2, 12)));
///
/// // Back-to-back: [1st, 3rd 10:00) vs [3rd 10:00, 4th): no overlap
/// assert!(!intervals_overlap(jan(1, 10), jan(3, 10), jan(3, 10), jan(4, 10)));
/// ```
#[inline]
pub fn intervals_overlap(
    s1: DateTime<Utc>,
    e1: DateTime<Utc>,
    s2: DateTime<Utc>,
    e2: DateTime<Utc>,
) -> bool {
    s1 < e2 && s2 < e1
}

/// Decides whether `[start, end)` can be booked for an item.
///
/// ## Arguments
/// * `available_quantity` - spare units of the item (sales-flow owned)
/// * `start`, `end` - candidate interval, already validated non-empty
/// * `active` - draft/ongoing rentals of the same item
/// * `exclude_id` - contract under evaluation, skipped so a contract can
///   re-check itself after a date edit
///
/// ## Quantity Short-Circuit
/// A fleet with a spare unit is available unconditionally: units are
/// interchangeable and the engine does not track which specific bike is
/// loaned. Overlap only matters once every unit is spoken for.
pub fn is_available(
    available_quantity: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    active: &[ActiveRental],
    exclude_id: Option<&str>,
) -> bool {
    if available_quantity >= 1 {
        return true;
    }

    !active
        .iter()
        .filter(|rental| Some(rental.id.as_str()) != exclude_id)
        .filter(|rental| rental.state.holds_item())
        .any(|rental| intervals_overlap(rental.start_time, rental.end_time, start, end))
}

/// Like [`is_available`] but yields the conflict as a typed error.
pub fn ensure_available(
    item_id: &str,
    available_quantity: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    active: &[ActiveRental],
    exclude_id: Option<&str>,
) -> CoreResult<()> {
    if is_available(available_quantity, start, end, active, exclude_id) {
        Ok(())
    } else {
        Err(CoreError::AvailabilityConflict {
            item_id: item_id.to_string(),
            start,
            end,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
