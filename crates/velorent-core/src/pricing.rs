//! # Pricing Tier Resolver
//!
//! Maps a pricing granularity to a catalog tier price, and a quantity to an
//! end timestamp.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Quote Flow                                                             │
//! │                                                                         │
//! │  Clerk picks item + granularity + quantity                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve_unit_price(item, granularity) ──► tier price snapshot         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_end_time(start, granularity, quantity) ──► scheduled end      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Availability check, then draft contract                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CatalogItem, PricingGranularity};

/// Resolves the unit price for renting an item at the given granularity.
///
/// The granularity enum is total, so there is no undefined tier to default
/// silently; the only rejection is an item the catalog marks non-rentable.
///
/// ## Example
/// ```rust,ignore
/// let price = resolve_unit_price(&item, PricingGranularity::Daily)?;
/// ```
pub fn resolve_unit_price(
    item: &CatalogItem,
    granularity: PricingGranularity,
) -> CoreResult<Money> {
    if !item.rentable {
        return Err(CoreError::ItemNotRentable {
            item_id: item.id.clone(),
            name: item.name.clone(),
        });
    }

    Ok(item.tier_price(granularity))
}

/// Computes the scheduled end time for a quantity of granularity units.
///
/// ## Semantics
/// - hourly: start + quantity hours
/// - daily: start + quantity days
/// - weekly: start + quantity × 7 days
/// - monthly: start + quantity × 30 days (fixed month, not calendar-aware)
///
/// Returns `None` for `quantity <= 0`: no end time is computable and the
/// caller must supply one explicitly.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use velorent_core::pricing::compute_end_time;
/// use velorent_core::types::PricingGranularity;
///
/// let start = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
/// let end = compute_end_time(start, PricingGranularity::Weekly, 2).unwrap();
/// assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
///
/// assert!(compute_end_time(start, PricingGranularity::Daily, 0).is_none());
/// ```
pub fn compute_end_time(
    start: DateTime<Utc>,
    granularity: PricingGranularity,
    quantity: i64,
) -> Option<DateTime<Utc>> {
    if quantity <= 0 {
        return None;
    }

    Some(start + Duration::hours(granularity.hours_per_unit() * quantity))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charges::compute_duration;
    use chrono::TimeZone;

    fn item(rentable: bool) -> CatalogItem {
        CatalogItem {
            id: "i1".to_string(),
            reference: "BIKE-01".to_string(),
            name: "Trail Bike".to_string(),
            rentable,
            hourly_price_cents: 500,
            daily_price_cents: 2500,
            weekly_price_cents: 12000,
            monthly_price_cents: 36000,
            sale_price_cents: 80000,
            available_quantity: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_unit_price() {
        let item = item(true);
        let price = resolve_unit_price(&item, PricingGranularity::Daily).unwrap();
        assert_eq!(price.cents(), 2500);
    }

    #[test]
    fn test_resolve_rejects_non_rentable() {
        let item = item(false);
        let err = resolve_unit_price(&item, PricingGranularity::Daily).unwrap_err();
        assert!(matches!(err, CoreError::ItemNotRentable { .. }));
    }

    #[test]
    fn test_compute_end_time_all_granularities() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();

        assert_eq!(
            compute_end_time(start, PricingGranularity::Hourly, 5).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap()
        );
        assert_eq!(
            compute_end_time(start, PricingGranularity::Daily, 3).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap()
        );
        assert_eq!(
            compute_end_time(start, PricingGranularity::Weekly, 1).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 8, 9, 0, 0).unwrap()
        );
        // Fixed 30-day month: March "1 month" ends on the 31st
        assert_eq!(
            compute_end_time(start, PricingGranularity::Monthly, 1).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 31, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_compute_end_time_rejects_non_positive_quantity() {
        let start = Utc::now();
        assert!(compute_end_time(start, PricingGranularity::Daily, 0).is_none());
        assert!(compute_end_time(start, PricingGranularity::Daily, -2).is_none());
    }

    /// Round-trip: computeDuration(start, computeEndTime(start, g, q), g) ≈ q
    #[test]
    fn test_end_time_duration_round_trip() {
        let start = Utc.with_ymd_and_hms(2026, 5, 10, 8, 30, 0).unwrap();
        let cases = [
            (PricingGranularity::Hourly, 7),
            (PricingGranularity::Daily, 4),
            (PricingGranularity::Weekly, 2),
            (PricingGranularity::Monthly, 1),
        ];

        for (granularity, qty) in cases {
            let end = compute_end_time(start, granularity, qty).unwrap();
            let duration = compute_duration(Some(start), Some(end), granularity);
            assert!(
                (duration - qty as f64).abs() < 1e-9,
                "{granularity} x{qty} round-tripped to {duration}"
            );
        }
    }
}
