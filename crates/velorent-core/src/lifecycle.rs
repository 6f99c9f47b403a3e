//! # Rental State Machine
//!
//! Governs the legal transitions of a rental contract and the field changes
//! each transition carries.
//!
//! ## Transition Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              start                 return                               │
//! │   ┌───────┐ ──────► ┌─────────┐ ──────────► ┌──────────┐               │
//! │   │ draft │         │ ongoing │             │ returned │  (terminal)   │
//! │   └───────┘ ◄──┐    └─────────┘             └──────────┘               │
//! │       │        │         │                                              │
//! │       │ cancel │ reset   │ cancel                                       │
//! │       ▼        │         ▼                                              │
//! │   ┌────────────┴──────────┐                                             │
//! │   │       cancelled       │                                             │
//! │   └───────────────────────┘                                             │
//! │                                                                         │
//! │   Edits (dates, pricing) are legal in draft only.                       │
//! │   returned has NO outgoing transition - a closed contract stays closed. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Every transition computes everything it needs BEFORE assigning a single
//! field. A guard failure returns early with the contract untouched; there
//! is no partial transition to roll back.
//!
//! Availability is NOT checked here - it needs the contract store, and this
//! crate does no I/O. The engine re-checks availability under the per-item
//! lock immediately before committing `start`.

use chrono::{DateTime, Utc};

use crate::charges::compute_late_charge;
use crate::error::{CoreError, CoreResult};
use crate::types::{PricingGranularity, RentalAction, RentalContract, RentalState};
use crate::validation::{validate_interval, validate_price_cents, validate_quantity};

impl RentalState {
    /// The transition table: is `action` legal from this state?
    pub const fn permits(&self, action: RentalAction) -> bool {
        matches!(
            (self, action),
            (RentalState::Draft, RentalAction::Start)
                | (RentalState::Draft, RentalAction::Cancel)
                | (RentalState::Draft, RentalAction::Edit)
                | (RentalState::Ongoing, RentalAction::Return)
                | (RentalState::Ongoing, RentalAction::Cancel)
                | (RentalState::Cancelled, RentalAction::Reset)
        )
    }
}

impl RentalContract {
    /// Guard helper: error out unless the current state permits `action`.
    fn ensure_permits(&self, action: RentalAction) -> CoreResult<()> {
        if self.state.permits(action) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                current: self.state,
                action,
            })
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// draft → ongoing. The bike goes out the door NOW, so the scheduled
    /// start is restamped to `now`.
    ///
    /// The caller is responsible for checking availability first, under the
    /// item lock. Restamping must keep `end > start`; starting a draft whose
    /// scheduled end has already passed is rejected as invalid input.
    pub fn start(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_permits(RentalAction::Start)?;
        validate_interval(now, self.end_time)?;

        self.state = RentalState::Ongoing;
        self.start_time = now;
        self.updated_at = now;
        Ok(())
    }

    /// ongoing → returned. Stamps the actual return time and accrues the
    /// late-return surcharge against `now`.
    ///
    /// The charge is computed before any field is assigned; state, stamp
    /// and charge then change together.
    pub fn mark_returned(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_permits(RentalAction::Return)?;

        let late_charge =
            compute_late_charge(now, self.end_time, self.granularity, self.unit_price());

        self.state = RentalState::Returned;
        self.actual_return_time = Some(now);
        self.late_charge_cents = late_charge.cents();
        self.updated_at = now;
        Ok(())
    }

    /// draft|ongoing → cancelled. A returned rental can never be cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_permits(RentalAction::Cancel)?;

        self.state = RentalState::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// cancelled → draft. Clears whatever the abandoned run accrued so the
    /// revived draft starts clean.
    pub fn reset_to_draft(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_permits(RentalAction::Reset)?;

        self.state = RentalState::Draft;
        self.actual_return_time = None;
        self.late_charge_cents = 0;
        self.updated_at = now;
        Ok(())
    }

    // =========================================================================
    // Draft-Only Edits
    // =========================================================================

    /// Replaces the rental period. Draft only; terminal states freeze the
    /// interval. The caller re-runs the availability check (excluding this
    /// contract) before persisting.
    pub fn set_period(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.ensure_permits(RentalAction::Edit)?;
        validate_interval(start, end)?;

        self.start_time = start;
        self.end_time = end;
        self.updated_at = now;
        Ok(())
    }

    /// Replaces granularity, quantity and unit price together. Draft only.
    pub fn set_pricing(
        &mut self,
        granularity: PricingGranularity,
        quantity: i64,
        unit_price_cents: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.ensure_permits(RentalAction::Edit)?;
        validate_quantity(quantity)?;
        validate_price_cents("unit_price", unit_price_cents)?;

        self.granularity = granularity;
        self.quantity = quantity;
        self.unit_price_cents = unit_price_cents;
        self.updated_at = now;
        Ok(())
    }

    /// Sets the deposit. Draft only.
    pub fn set_deposit(&mut self, deposit_cents: i64, now: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_permits(RentalAction::Edit)?;
        validate_price_cents("deposit", deposit_cents)?;

        self.deposit_cents = deposit_cents;
        self.updated_at = now;
        Ok(())
    }

    /// Sets the free-form surcharge. Legal while draft OR ongoing - damage
    /// is usually discovered while the bike is out - but terminal states
    /// freeze it with everything else.
    pub fn set_manual_extra(&mut self, manual_extra_cents: i64, now: DateTime<Utc>) -> CoreResult<()> {
        if self.state.is_terminal() {
            return Err(CoreError::InvalidTransition {
                current: self.state,
                action: RentalAction::Edit,
            });
        }
        validate_price_cents("manual_extra", manual_extra_cents)?;

        self.manual_extra_cents = manual_extra_cents;
        self.updated_at = now;
        Ok(())
    }

    // =========================================================================
    // Invoice Link
    // =========================================================================

    /// Records the externally created invoice. At most one per contract;
    /// a second attach is rejected and the first reference stays intact.
    pub fn attach_invoice(&mut self, invoice_id: &str, now: DateTime<Utc>) -> CoreResult<()> {
        if let Some(existing) = &self.invoice_id {
            return Err(CoreError::DuplicateInvoice {
                reference: self.reference.clone(),
                invoice_id: existing.clone(),
            });
        }

        self.invoice_id = Some(invoice_id.to_string());
        self.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
