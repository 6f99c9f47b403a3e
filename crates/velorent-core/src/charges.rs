//! # Duration & Charge Calculator
//!
//! Elapsed-duration math and every amount a rental can accrue: base price,
//! extras total, late-return surcharge, grand total.
//!
//! ## Charge Assembly
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Total Amount                                     │
//! │                                                                         │
//! │  base price     = quantity × unit price   (floored at 0)               │
//! │  + deposit      = returned to customer later, shown in the total       │
//! │  + late charge  = accrued by the return transition only                │
//! │  + extras total = Σ attached accessory prices (one unit each)          │
//! │  + manual extra = free-form operator surcharge                         │
//! │  ─────────────────────────────────────────────────────────             │
//! │  = total amount (always reconstructible, never stored)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{PricingGranularity, RentalExtra};
use crate::LATE_SURCHARGE_BPS;

/// Computes elapsed duration in granularity units.
///
/// Elapsed wall-clock hours divided by {1, 24, 168, 720} for
/// {hourly, daily, weekly, monthly}. Returns 0 when either timestamp is
/// missing or `end <= start`.
///
/// ## Informational Only
/// Duration is audit data. Billing is driven by the stored *quantity*
/// (see [`compute_base_price`]); the two normally coincide but may diverge
/// if an operator edits dates after the quantity is fixed.
pub fn compute_duration(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    granularity: PricingGranularity,
) -> f64 {
    let (Some(start), Some(end)) = (start, end) else {
        return 0.0;
    };

    if end <= start {
        return 0.0;
    }

    let total_hours = (end - start).num_seconds() as f64 / 3600.0;
    total_hours / granularity.hours_per_unit() as f64
}

/// Base rental price: requested quantity × unit price, floored at zero.
///
/// ## Policy Note
/// The quantity selector is authoritative for billing; the computed
/// duration is not a billing input. If dates and quantity disagree, the
/// quantity wins - a product decision, not an oversight.
#[inline]
pub fn compute_base_price(quantity: i64, unit_price: Money) -> Money {
    unit_price.multiply_quantity(quantity).clamp_non_negative()
}

/// Late-return surcharge.
///
/// Zero when `actual_return <= scheduled_end`, for any granularity.
///
/// Otherwise, defined only for daily granularity:
/// `late_days = hours_late / 24`, `charge = late_days × unit_price × 1.5`,
/// rounded to cents.
///
/// ## Known Gap
/// Hourly, weekly and monthly rentals returned late accrue NO surcharge.
/// No formula has been agreed for those tiers, so they stay at zero
/// rather than getting an invented rate.
pub fn compute_late_charge(
    actual_return: DateTime<Utc>,
    scheduled_end: DateTime<Utc>,
    granularity: PricingGranularity,
    unit_price: Money,
) -> Money {
    if actual_return <= scheduled_end {
        return Money::zero();
    }

    match granularity {
        PricingGranularity::Daily => {
            let hours_late = (actual_return - scheduled_end).num_seconds() as f64 / 3600.0;
            let late_days = hours_late / 24.0;
            unit_price.scale(late_days * (LATE_SURCHARGE_BPS as f64 / 10_000.0))
        }
        _ => Money::zero(),
    }
}

/// Sum of the attached extras' frozen prices, one unit each.
pub fn compute_extras_total(extras: &[RentalExtra]) -> Money {
    extras
        .iter()
        .fold(Money::zero(), |total, extra| total + extra.price())
}

/// Grand total: base + deposit + additional charges + extras + manual extra.
///
/// The deposit is part of the displayed total but is not revenue; callers
/// keep it in its own field for return-to-customer accounting.
#[inline]
pub fn compute_total_amount(
    base: Money,
    deposit: Money,
    additional_charges: Money,
    extras_total: Money,
    manual_extra: Money,
) -> Money {
    base + deposit + additional_charges + extras_total + manual_extra
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn jan(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    fn extra(price_cents: i64) -> RentalExtra {
        RentalExtra {
            id: "e1".to_string(),
            rental_id: "r1".to_string(),
            item_id: "i1".to_string(),
            name_snapshot: "Helmet".to_string(),
            price_cents,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_duration_by_granularity() {
        let start = jan(1, 0);
        let end = jan(2, 12); // 36 hours

        let d = |g| compute_duration(Some(start), Some(end), g);
        assert!((d(PricingGranularity::Hourly) - 36.0).abs() < 1e-9);
        assert!((d(PricingGranularity::Daily) - 1.5).abs() < 1e-9);
        assert!((d(PricingGranularity::Weekly) - 36.0 / 168.0).abs() < 1e-9);
        assert!((d(PricingGranularity::Monthly) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_duration_degenerate_inputs() {
        let start = jan(1, 0);
        assert_eq!(
            compute_duration(None, Some(start), PricingGranularity::Daily),
            0.0
        );
        assert_eq!(
            compute_duration(Some(start), None, PricingGranularity::Daily),
            0.0
        );
        // end == start and end < start both collapse to 0
        assert_eq!(
            compute_duration(Some(start), Some(start), PricingGranularity::Daily),
            0.0
        );
        assert_eq!(
            compute_duration(Some(start), Some(start - Duration::hours(5)), PricingGranularity::Daily),
            0.0
        );
    }

    #[test]
    fn test_base_price_quantity_driven() {
        assert_eq!(compute_base_price(3, Money::from_cents(1500)).cents(), 4500);
        // Floored at zero
        assert_eq!(compute_base_price(-3, Money::from_cents(1500)).cents(), 0);
        assert_eq!(compute_base_price(3, Money::from_cents(0)).cents(), 0);
    }

    /// 24h late on a $10.00/day rental = 1 × 10 × 1.5 = $15.00.
    #[test]
    fn test_late_charge_one_day_daily() {
        let scheduled = jan(3, 10);
        let actual = scheduled + Duration::hours(24);
        let charge =
            compute_late_charge(actual, scheduled, PricingGranularity::Daily, Money::from_cents(1000));
        assert_eq!(charge.cents(), 1500);
    }

    #[test]
    fn test_late_charge_fractional_day() {
        let scheduled = jan(3, 10);
        let actual = scheduled + Duration::hours(12); // half a day late
        let charge =
            compute_late_charge(actual, scheduled, PricingGranularity::Daily, Money::from_cents(1000));
        // 0.5 × 1000 × 1.5 = 750
        assert_eq!(charge.cents(), 750);
    }

    #[test]
    fn test_late_charge_zero_when_on_time() {
        let scheduled = jan(3, 10);
        for granularity in [
            PricingGranularity::Hourly,
            PricingGranularity::Daily,
            PricingGranularity::Weekly,
            PricingGranularity::Monthly,
        ] {
            // Exactly on time
            assert!(compute_late_charge(scheduled, scheduled, granularity, Money::from_cents(1000))
                .is_zero());
            // Early
            assert!(compute_late_charge(
                scheduled - Duration::hours(2),
                scheduled,
                granularity,
                Money::from_cents(1000)
            )
            .is_zero());
        }
    }

    /// The documented gap: non-daily granularities accrue no late fee.
    #[test]
    fn test_late_charge_gap_on_non_daily() {
        let scheduled = jan(3, 10);
        let actual = scheduled + Duration::hours(48);
        for granularity in [
            PricingGranularity::Hourly,
            PricingGranularity::Weekly,
            PricingGranularity::Monthly,
        ] {
            assert!(
                compute_late_charge(actual, scheduled, granularity, Money::from_cents(1000))
                    .is_zero()
            );
        }
    }

    #[test]
    fn test_extras_total() {
        assert!(compute_extras_total(&[]).is_zero());
        let extras = vec![extra(500), extra(0), extra(1250)];
        assert_eq!(compute_extras_total(&extras).cents(), 1750);
    }

    /// Every component rolls up: 100 + 50 + 15 + 20 + 5 = 190.
    #[test]
    fn test_total_amount() {
        let total = compute_total_amount(
            Money::from_cents(10000),
            Money::from_cents(5000),
            Money::from_cents(1500),
            Money::from_cents(2000),
            Money::from_cents(500),
        );
        assert_eq!(total.cents(), 19000);
    }
}
