//! # Invoice Line Builder
//!
//! Assembles the billable line items for a rental contract. The engine
//! never posts to a billing system itself; these lines are handed to an
//! external billing collaborator along with the customer reference.
//!
//! ## Line Order
//! ```text
//! 1. Base rental        "Rental: Trail Bike (2026-01-01 to 2026-01-03)"
//! 2. One line per extra with a non-zero price
//! 3. Manual extra       if > 0
//! 4. Late/damage charge if > 0
//! ```
//!
//! The deposit is NOT an invoice line: it is not revenue and goes back to
//! the customer.

use crate::error::{CoreError, CoreResult};
use crate::types::{InvoiceLine, RentalContract, RentalExtra};

/// Builds the ordered invoice lines for a contract.
///
/// Rejects a contract that already carries an invoice reference
/// ([`CoreError::DuplicateInvoice`]); the first invoice stays authoritative.
///
/// `item_name` is the rented item's display name - the contract stores only
/// the item id, so the caller resolves the name.
pub fn build_invoice_lines(
    contract: &RentalContract,
    item_name: &str,
    extras: &[RentalExtra],
) -> CoreResult<Vec<InvoiceLine>> {
    if let Some(existing) = &contract.invoice_id {
        return Err(CoreError::DuplicateInvoice {
            reference: contract.reference.clone(),
            invoice_id: existing.clone(),
        });
    }

    let mut lines = Vec::with_capacity(extras.len() + 3);

    lines.push(InvoiceLine::new(
        format!(
            "Rental: {} ({} to {})",
            item_name,
            contract.start_time.format("%Y-%m-%d"),
            contract.end_time.format("%Y-%m-%d"),
        ),
        contract.base_price(),
    ));

    for extra in extras {
        if extra.price().is_positive() {
            lines.push(InvoiceLine::new(
                format!("Extra: {}", extra.name_snapshot),
                extra.price(),
            ));
        }
    }

    if contract.manual_extra().is_positive() {
        lines.push(InvoiceLine::new(
            "Additional charges",
            contract.manual_extra(),
        ));
    }

    if contract.late_charge().is_positive() {
        lines.push(InvoiceLine::new(
            "Late return charge",
            contract.late_charge(),
        ));
    }

    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PricingGranularity, RentalState};
    use chrono::{TimeZone, Utc};

    fn contract() -> RentalContract {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 3, 10, 0, 0).unwrap();
        RentalContract {
            id: "r1".to_string(),
            reference: "RENT-00001".to_string(),
            customer_id: "c1".to_string(),
            item_id: "i1".to_string(),
            start_time: start,
            end_time: end,
            actual_return_time: None,
            granularity: PricingGranularity::Daily,
            quantity: 2,
            unit_price_cents: 1500,
            deposit_cents: 5000,
            manual_extra_cents: 0,
            late_charge_cents: 0,
            state: RentalState::Returned,
            deposit_returned: false,
            invoice_id: None,
            notes: None,
            condition_on_pickup: None,
            condition_on_return: None,
            created_at: start,
            updated_at: end,
        }
    }

    fn extra(name: &str, price_cents: i64) -> RentalExtra {
        RentalExtra {
            id: format!("e-{name}"),
            rental_id: "r1".to_string(),
            item_id: "i9".to_string(),
            name_snapshot: name.to_string(),
            price_cents,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_base_line_only() {
        let lines = build_invoice_lines(&contract(), "City Bike", &[]).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].description,
            "Rental: City Bike (2026-01-01 to 2026-01-03)"
        );
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[0].unit_price_cents, 3000);
    }

    #[test]
    fn test_all_line_kinds_in_order() {
        let mut rental = contract();
        rental.manual_extra_cents = 500;
        rental.late_charge_cents = 1500;
        let extras = vec![extra("Helmet", 700), extra("Free sticker", 0)];

        let lines = build_invoice_lines(&rental, "City Bike", &extras).unwrap();

        // Zero-price extra is skipped; deposit never appears
        assert_eq!(lines.len(), 4);
        assert!(lines[0].description.starts_with("Rental:"));
        assert_eq!(lines[1].description, "Extra: Helmet");
        assert_eq!(lines[1].unit_price_cents, 700);
        assert_eq!(lines[2].description, "Additional charges");
        assert_eq!(lines[2].unit_price_cents, 500);
        assert_eq!(lines[3].description, "Late return charge");
        assert_eq!(lines[3].unit_price_cents, 1500);
    }

    #[test]
    fn test_second_invoice_rejected() {
        let mut rental = contract();
        rental.invoice_id = Some("INV-7".to_string());

        let err = build_invoice_lines(&rental, "City Bike", &[]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DuplicateInvoice { ref invoice_id, .. } if invoice_id == "INV-7"
        ));
    }
}
