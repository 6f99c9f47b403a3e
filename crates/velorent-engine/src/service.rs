//! # Rental Service
//!
//! The orchestration layer: loads state from the database, runs the pure
//! core logic, and persists the outcome. This is the ONLY place where
//! availability checks and contract writes meet.
//!
//! ## Per-Item Serialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Why Every Check+Write Holds the Item Lock                    │
//! │                                                                         │
//! │  Clerk A: create BIKE-01, Jan 1-3        Clerk B: create BIKE-01, Jan 2 │
//! │       │                                       │                         │
//! │       ▼                                       ▼                         │
//! │  ┌──────────────── item lock "BIKE-01" ─────────────────┐               │
//! │  │  A acquires ──► scan: no overlap ──► insert ──► drop │               │
//! │  │  B acquires ──► scan: SEES A's draft ──► conflict    │               │
//! │  └──────────────────────────────────────────────────────┘               │
//! │                                                                         │
//! │  Without the lock both scans run before either insert, and both        │
//! │  drafts land on the same bike. Locks are per item id, so rentals of    │
//! │  different bikes never wait on each other.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::billing::BillingGateway;
use crate::clock::{Clock, SystemClock};
use crate::error::{EngineError, EngineResult};
use velorent_core::{
    availability, charges, invoice, pricing, validation, CatalogItem, CoreError,
    PricingGranularity, RentalAction, RentalContract, RentalExtra, RentalState, ValidationError,
};
use velorent_db::Database;

// =============================================================================
// Service DTOs
// =============================================================================

/// Input for creating a rental draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRentalRequest {
    pub customer_id: String,
    pub item_id: String,
    pub granularity: PricingGranularity,
    /// Billing quantity in granularity units.
    pub quantity: i64,
    pub deposit_cents: i64,
    /// Scheduled pickup; defaults to "now" when omitted.
    pub start_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// A price quote - no contract is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalQuote {
    pub item_id: String,
    pub item_name: String,
    pub granularity: PricingGranularity,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub base_price_cents: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// The full money picture of a contract, recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalTotals {
    pub reference: String,
    pub state: RentalState,
    /// Scheduled duration in granularity units. Informational: billing is
    /// driven by the booked quantity, not by this.
    pub duration_units: f64,
    pub base_price_cents: i64,
    pub extras_total_cents: i64,
    pub manual_extra_cents: i64,
    pub late_charge_cents: i64,
    pub deposit_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Rental Service
// =============================================================================

/// Orchestrates the rental lifecycle over the database.
///
/// Cheap to clone is NOT a goal here; share it behind an `Arc` so all
/// callers see the same lock map.
pub struct RentalService {
    db: Database,
    clock: Arc<dyn Clock>,
    /// One async mutex per item id, created lazily. The outer std mutex
    /// only guards the map itself and is never held across an await.
    item_locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl RentalService {
    /// Creates a service on the system clock.
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    /// Creates a service with an injected clock (tests).
    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        RentalService {
            db,
            clock,
            item_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn item_lock(&self, item_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.item_locks.lock().unwrap();
        // An entry referenced only by the map belongs to a finished
        // operation; prune those so the map tracks items in flight, not
        // every item ever touched.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(item_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn fetch_item(&self, item_id: &str) -> EngineResult<CatalogItem> {
        self.db
            .catalog()
            .get_by_id(item_id)
            .await?
            .ok_or_else(|| EngineError::not_found("CatalogItem", item_id))
    }

    async fn fetch_rental(&self, rental_id: &str) -> EngineResult<RentalContract> {
        self.db
            .rentals()
            .get_by_id(rental_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Rental", rental_id))
    }

    /// Acquires the item lock for a rental, then re-reads the contract so
    /// the caller works on post-acquisition state.
    async fn lock_rental(
        &self,
        rental_id: &str,
    ) -> EngineResult<(tokio::sync::OwnedMutexGuard<()>, RentalContract)> {
        let probe = self.fetch_rental(rental_id).await?;
        let guard = self.item_lock(&probe.item_id).lock_owned().await;
        let rental = self.fetch_rental(rental_id).await?;
        Ok((guard, rental))
    }

    /// Runs the availability check for an interval against the live store.
    async fn ensure_available(
        &self,
        item_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> EngineResult<()> {
        let quantity = self.db.catalog().get_available_quantity(item_id).await?;
        let active = self
            .db
            .rentals()
            .list_active_for_item(item_id, exclude_id)
            .await?;

        availability::ensure_available(item_id, quantity, start, end, &active, exclude_id)?;
        Ok(())
    }

    // =========================================================================
    // Quoting and Creation
    // =========================================================================

    /// Prices a prospective rental without creating anything.
    pub async fn quote(
        &self,
        item_id: &str,
        granularity: PricingGranularity,
        quantity: i64,
        start_time: Option<DateTime<Utc>>,
    ) -> EngineResult<RentalQuote> {
        validation::validate_uuid("item_id", item_id).map_err(CoreError::from)?;
        validation::validate_quantity(quantity).map_err(CoreError::from)?;

        let item = self.fetch_item(item_id).await?;
        let unit_price = pricing::resolve_unit_price(&item, granularity)?;

        let start = start_time.unwrap_or_else(|| self.clock.now());
        let end = pricing::compute_end_time(start, granularity, quantity)
            .ok_or_else(|| quantity_error())?;

        let base = charges::compute_base_price(quantity, unit_price);

        Ok(RentalQuote {
            item_id: item.id,
            item_name: item.name,
            granularity,
            quantity,
            unit_price_cents: unit_price.cents(),
            base_price_cents: base.cents(),
            start_time: start,
            end_time: end,
        })
    }

    /// Creates a rental draft: resolves the tier price, computes the end
    /// time, and books the interval under the item lock.
    pub async fn create_rental(&self, req: NewRentalRequest) -> EngineResult<RentalContract> {
        debug!(item_id = %req.item_id, customer_id = %req.customer_id, "create_rental");

        validation::validate_uuid("item_id", &req.item_id).map_err(CoreError::from)?;
        validation::validate_quantity(req.quantity).map_err(CoreError::from)?;
        validation::validate_price_cents("deposit", req.deposit_cents).map_err(CoreError::from)?;
        if req.customer_id.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "customer_id".to_string(),
            })
            .into());
        }

        let item = self.fetch_item(&req.item_id).await?;
        let unit_price = pricing::resolve_unit_price(&item, req.granularity)?;

        let now = self.clock.now();
        let start = req.start_time.unwrap_or(now);
        let end = pricing::compute_end_time(start, req.granularity, req.quantity)
            .ok_or_else(|| quantity_error())?;

        // Check-and-insert must be atomic per item
        let lock = self.item_lock(&item.id);
        let _guard = lock.lock().await;

        self.ensure_available(&item.id, start, end, None).await?;

        let reference = self.db.rentals().next_reference().await?;
        let contract = RentalContract {
            id: Uuid::new_v4().to_string(),
            reference: reference.clone(),
            customer_id: req.customer_id,
            item_id: item.id,
            start_time: start,
            end_time: end,
            actual_return_time: None,
            granularity: req.granularity,
            quantity: req.quantity,
            unit_price_cents: unit_price.cents(),
            deposit_cents: req.deposit_cents,
            manual_extra_cents: 0,
            late_charge_cents: 0,
            state: RentalState::Draft,
            deposit_returned: false,
            invoice_id: None,
            notes: req.notes,
            condition_on_pickup: None,
            condition_on_return: None,
            created_at: now,
            updated_at: now,
        };

        self.db.rentals().insert(&contract).await?;

        info!(
            reference = %reference,
            item_id = %contract.item_id,
            base_cents = contract.base_price().cents(),
            "Rental created"
        );
        Ok(contract)
    }

    // =========================================================================
    // Draft Edits
    // =========================================================================

    /// Replaces the rental period of a draft, re-checking availability for
    /// the new interval (excluding the contract itself).
    pub async fn update_period(
        &self,
        rental_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<RentalContract> {
        let (_guard, mut rental) = self.lock_rental(rental_id).await?;

        rental.set_period(start, end, self.clock.now())?;
        self.ensure_available(&rental.item_id, start, end, Some(rental_id))
            .await?;

        self.db.rentals().save(&rental).await?;
        Ok(rental)
    }

    /// Re-prices a draft: resolves the tier for the new granularity, resets
    /// quantity, and recomputes the end time from the unchanged start.
    pub async fn update_pricing(
        &self,
        rental_id: &str,
        granularity: PricingGranularity,
        quantity: i64,
    ) -> EngineResult<RentalContract> {
        let (_guard, mut rental) = self.lock_rental(rental_id).await?;

        let item = self.fetch_item(&rental.item_id).await?;
        let unit_price = pricing::resolve_unit_price(&item, granularity)?;

        let now = self.clock.now();
        rental.set_pricing(granularity, quantity, unit_price.cents(), now)?;

        let end = pricing::compute_end_time(rental.start_time, granularity, quantity)
            .ok_or_else(|| quantity_error())?;
        rental.set_period(rental.start_time, end, now)?;

        self.ensure_available(&rental.item_id, rental.start_time, end, Some(rental_id))
            .await?;

        self.db.rentals().save(&rental).await?;
        Ok(rental)
    }

    /// Sets the deposit on a draft.
    pub async fn set_deposit(&self, rental_id: &str, deposit_cents: i64) -> EngineResult<RentalContract> {
        let mut rental = self.fetch_rental(rental_id).await?;
        rental.set_deposit(deposit_cents, self.clock.now())?;
        self.db.rentals().save(&rental).await?;
        Ok(rental)
    }

    /// Sets the free-form surcharge (damage, cleaning). Legal while draft
    /// or ongoing.
    pub async fn set_manual_extra(
        &self,
        rental_id: &str,
        manual_extra_cents: i64,
    ) -> EngineResult<RentalContract> {
        let mut rental = self.fetch_rental(rental_id).await?;
        rental.set_manual_extra(manual_extra_cents, self.clock.now())?;
        self.db.rentals().save(&rental).await?;
        Ok(rental)
    }

    // =========================================================================
    // Lifecycle Transitions
    // =========================================================================

    /// draft → ongoing. The pickup restamps the start to now, so the
    /// restamped interval is re-checked under the item lock before the
    /// transition commits.
    pub async fn start_rental(
        &self,
        rental_id: &str,
        condition_on_pickup: Option<String>,
    ) -> EngineResult<RentalContract> {
        let (_guard, mut rental) = self.lock_rental(rental_id).await?;

        let now = self.clock.now();
        rental.start(now)?;
        self.ensure_available(&rental.item_id, rental.start_time, rental.end_time, Some(rental_id))
            .await?;

        rental.condition_on_pickup = condition_on_pickup;
        self.db.rentals().save(&rental).await?;

        info!(reference = %rental.reference, "Rental started");
        Ok(rental)
    }

    /// ongoing → returned. Stamps the actual return time and accrues the
    /// late surcharge in the same write.
    pub async fn return_rental(
        &self,
        rental_id: &str,
        condition_on_return: Option<String>,
    ) -> EngineResult<RentalContract> {
        let mut rental = self.fetch_rental(rental_id).await?;

        rental.mark_returned(self.clock.now())?;
        rental.condition_on_return = condition_on_return;
        self.db.rentals().save(&rental).await?;

        info!(
            reference = %rental.reference,
            late_charge_cents = rental.late_charge_cents,
            "Rental returned"
        );
        Ok(rental)
    }

    /// draft|ongoing → cancelled.
    pub async fn cancel_rental(&self, rental_id: &str) -> EngineResult<RentalContract> {
        let mut rental = self.fetch_rental(rental_id).await?;

        rental.cancel(self.clock.now())?;
        self.db.rentals().save(&rental).await?;

        info!(reference = %rental.reference, "Rental cancelled");
        Ok(rental)
    }

    /// cancelled → draft. A revived draft holds its interval again, so the
    /// reset re-checks availability under the item lock - another booking
    /// may have taken the slot while this one was cancelled.
    pub async fn reset_rental(&self, rental_id: &str) -> EngineResult<RentalContract> {
        let (_guard, mut rental) = self.lock_rental(rental_id).await?;

        rental.reset_to_draft(self.clock.now())?;
        self.ensure_available(&rental.item_id, rental.start_time, rental.end_time, Some(rental_id))
            .await?;

        self.db.rentals().save(&rental).await?;

        info!(reference = %rental.reference, "Rental reset to draft");
        Ok(rental)
    }

    /// Marks the deposit as handed back. Only a returned rental has a
    /// deposit to give back; the call is idempotent.
    pub async fn mark_deposit_returned(&self, rental_id: &str) -> EngineResult<RentalContract> {
        let mut rental = self.fetch_rental(rental_id).await?;

        if rental.state != RentalState::Returned {
            return Err(CoreError::InvalidTransition {
                current: rental.state,
                action: RentalAction::Edit,
            }
            .into());
        }
        if rental.deposit_returned {
            return Ok(rental);
        }

        rental.deposit_returned = true;
        rental.updated_at = self.clock.now();
        self.db.rentals().save(&rental).await?;
        Ok(rental)
    }

    // =========================================================================
    // Extras
    // =========================================================================

    /// Attaches a catalog item as a one-off extra, snapshotting its name and
    /// sale price. Legal while the contract is draft or ongoing.
    pub async fn add_extra(&self, rental_id: &str, item_id: &str) -> EngineResult<RentalExtra> {
        validation::validate_uuid("item_id", item_id).map_err(CoreError::from)?;
        let rental = self.fetch_rental(rental_id).await?;
        if rental.state.is_terminal() {
            return Err(CoreError::InvalidTransition {
                current: rental.state,
                action: RentalAction::Edit,
            }
            .into());
        }

        let item = self.fetch_item(item_id).await?;

        let extra = RentalExtra {
            id: Uuid::new_v4().to_string(),
            rental_id: rental.id.clone(),
            item_id: item.id,
            name_snapshot: item.name,
            price_cents: item.sale_price_cents,
            created_at: self.clock.now(),
        };
        self.db.rentals().add_extra(&extra).await?;

        debug!(reference = %rental.reference, extra = %extra.name_snapshot, "Extra added");
        Ok(extra)
    }

    /// Detaches an extra. Legal while the contract is draft or ongoing.
    pub async fn remove_extra(&self, rental_id: &str, extra_id: &str) -> EngineResult<()> {
        let rental = self.fetch_rental(rental_id).await?;
        if rental.state.is_terminal() {
            return Err(CoreError::InvalidTransition {
                current: rental.state,
                action: RentalAction::Edit,
            }
            .into());
        }

        let extras = self.db.rentals().get_extras(rental_id).await?;
        if !extras.iter().any(|e| e.id == extra_id) {
            return Err(EngineError::not_found("RentalExtra", extra_id));
        }

        self.db.rentals().remove_extra(extra_id).await?;
        Ok(())
    }

    /// Lists the extras attached to a rental.
    pub async fn list_extras(&self, rental_id: &str) -> EngineResult<Vec<RentalExtra>> {
        self.fetch_rental(rental_id).await?;
        Ok(self.db.rentals().get_extras(rental_id).await?)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a contract by id.
    pub async fn get_rental(&self, rental_id: &str) -> EngineResult<RentalContract> {
        self.fetch_rental(rental_id).await
    }

    /// Fetches a contract by business reference.
    pub async fn get_rental_by_reference(&self, reference: &str) -> EngineResult<RentalContract> {
        validation::validate_reference(reference).map_err(CoreError::from)?;
        self.db
            .rentals()
            .get_by_reference(reference)
            .await?
            .ok_or_else(|| EngineError::not_found("Rental", reference))
    }

    /// Recomputes the full money picture of a contract.
    pub async fn totals(&self, rental_id: &str) -> EngineResult<RentalTotals> {
        let rental = self.fetch_rental(rental_id).await?;
        let extras = self.db.rentals().get_extras(rental_id).await?;
        let extras_total = charges::compute_extras_total(&extras);

        Ok(RentalTotals {
            reference: rental.reference.clone(),
            state: rental.state,
            duration_units: rental.duration_units(),
            base_price_cents: rental.base_price().cents(),
            extras_total_cents: extras_total.cents(),
            manual_extra_cents: rental.manual_extra_cents,
            late_charge_cents: rental.late_charge_cents,
            deposit_cents: rental.deposit_cents,
            total_cents: rental.total_amount(extras_total).cents(),
        })
    }

    // =========================================================================
    // Invoicing
    // =========================================================================

    /// Builds the invoice lines, posts them through the billing gateway, and
    /// attaches the returned invoice id - exactly once.
    ///
    /// The whole check-post-attach sequence holds the item lock, so two
    /// racing callers cannot both reach the gateway: the loser re-reads the
    /// contract after the winner's attach and fails the duplicate check
    /// before posting anything. A gateway failure attaches nothing, so a
    /// retry starts clean.
    pub async fn create_invoice(
        &self,
        rental_id: &str,
        gateway: &dyn BillingGateway,
    ) -> EngineResult<String> {
        let (_guard, rental) = self.lock_rental(rental_id).await?;
        let item = self.fetch_item(&rental.item_id).await?;
        let extras = self.db.rentals().get_extras(rental_id).await?;

        let lines = invoice::build_invoice_lines(&rental, &item.name, &extras)?;

        let invoice_id = gateway
            .post_invoice(&rental.reference, &rental.customer_id, &lines)
            .await
            .map_err(|e| EngineError::DependencyUnavailable {
                dependency: "billing".to_string(),
                reason: e.to_string(),
            })?;

        self.db.rentals().set_invoice(&rental.id, &invoice_id).await?;

        info!(
            reference = %rental.reference,
            invoice_id = %invoice_id,
            lines = lines.len(),
            "Invoice created"
        );
        Ok(invoice_id)
    }
}

fn quantity_error() -> EngineError {
    CoreError::from(ValidationError::MustBePositive {
        field: "quantity".to_string(),
    })
    .into()
}

// =============================================================================
// Integration-Style Tests (in-memory database)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::RecordingGateway;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use velorent_db::{DbConfig, DbError};

    fn jan(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    /// One bike with NO spare units (availability is booking-driven) plus
    /// one accessory, and a clock frozen at Jan 1 10:00.
    async fn setup() -> (Arc<RentalService>, Arc<FixedClock>, CatalogItem, CatalogItem) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let now = jan(1, 0);
        let bike = CatalogItem {
            id: Uuid::new_v4().to_string(),
            reference: "BIKE-01".to_string(),
            name: "Trail Bike".to_string(),
            rentable: true,
            hourly_price_cents: 500,
            daily_price_cents: 1500,
            weekly_price_cents: 7000,
            monthly_price_cents: 20000,
            sale_price_cents: 90000,
            available_quantity: 0,
            created_at: now,
            updated_at: now,
        };
        let helmet = CatalogItem {
            id: Uuid::new_v4().to_string(),
            reference: "ACC-HELMET".to_string(),
            name: "Helmet".to_string(),
            rentable: false,
            hourly_price_cents: 0,
            daily_price_cents: 0,
            weekly_price_cents: 0,
            monthly_price_cents: 0,
            sale_price_cents: 500,
            available_quantity: 0,
            created_at: now,
            updated_at: now,
        };
        db.catalog().insert(&bike).await.unwrap();
        db.catalog().insert(&helmet).await.unwrap();

        let clock = Arc::new(FixedClock::new(jan(1, 10)));
        let service = Arc::new(RentalService::with_clock(db, clock.clone()));
        (service, clock, bike, helmet)
    }

    fn request(item_id: &str, quantity: i64) -> NewRentalRequest {
        NewRentalRequest {
            customer_id: "cust-1".to_string(),
            item_id: item_id.to_string(),
            granularity: PricingGranularity::Daily,
            quantity,
            deposit_cents: 5000,
            start_time: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_quote_math() {
        let (service, _, bike, _) = setup().await;

        let quote = service
            .quote(&bike.id, PricingGranularity::Daily, 3, Some(jan(2, 9)))
            .await
            .unwrap();

        assert_eq!(quote.unit_price_cents, 1500);
        assert_eq!(quote.base_price_cents, 4500);
        assert_eq!(quote.end_time, jan(5, 9));
    }

    #[tokio::test]
    async fn test_quote_rejects_accessory() {
        let (service, _, _, helmet) = setup().await;

        let err = service
            .quote(&helmet.id, PricingGranularity::Daily, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::ItemNotRentable { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_defaults_start_to_now_and_computes_end() {
        let (service, _, bike, _) = setup().await;

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();

        assert_eq!(rental.reference, "RENT-00001");
        assert_eq!(rental.state, RentalState::Draft);
        assert_eq!(rental.start_time, jan(1, 10));
        assert_eq!(rental.end_time, jan(3, 10));
        assert_eq!(rental.unit_price_cents, 1500);
    }

    #[tokio::test]
    async fn test_overlapping_booking_conflicts_back_to_back_fits() {
        let (service, _, bike, _) = setup().await;

        // Jan 1 10:00 - Jan 3 10:00
        service.create_rental(request(&bike.id, 2)).await.unwrap();

        // Overlap: starts Jan 2
        let mut overlapping = request(&bike.id, 1);
        overlapping.start_time = Some(jan(2, 0));
        let err = service.create_rental(overlapping).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::AvailabilityConflict { .. })
        ));

        // Half-open: starting exactly at the previous end is legal
        let mut back_to_back = request(&bike.id, 1);
        back_to_back.start_time = Some(jan(3, 10));
        let rental = service.create_rental(back_to_back).await.unwrap();
        assert_eq!(rental.reference, "RENT-00002");
    }

    #[tokio::test]
    async fn test_spare_quantity_short_circuits_overlap() {
        let (service, _, bike, _) = setup().await;

        service
            .db
            .catalog()
            .set_available_quantity(&bike.id, 2)
            .await
            .unwrap();

        service.create_rental(request(&bike.id, 2)).await.unwrap();
        // Identical interval, but spare units exist
        service.create_rental(request(&bike.id, 2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_creates_exactly_one_wins() {
        let (service, _, bike, _) = setup().await;

        let a = {
            let service = service.clone();
            let req = request(&bike.id, 2);
            tokio::spawn(async move { service.create_rental(req).await })
        };
        let b = {
            let service = service.clone();
            let req = request(&bike.id, 2);
            tokio::spawn(async move { service.create_rental(req).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "exactly one of two identical bookings must win");

        let loss = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loss.as_ref().unwrap_err(),
            EngineError::Core(CoreError::AvailabilityConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_restamps_and_late_return_charges() {
        let (service, clock, bike, _) = setup().await;

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();

        clock.advance_hours(2); // pickup at Jan 1 12:00
        let started = service
            .start_rental(&rental.id, Some("good".to_string()))
            .await
            .unwrap();
        assert_eq!(started.state, RentalState::Ongoing);
        assert_eq!(started.start_time, jan(1, 12));
        assert_eq!(started.end_time, jan(3, 10)); // scheduled end untouched

        // Return 24h past the scheduled end: 1 late day × 1500 × 1.5 = 2250
        clock.set(jan(4, 10));
        let returned = service
            .return_rental(&rental.id, Some("scratched".to_string()))
            .await
            .unwrap();
        assert_eq!(returned.state, RentalState::Returned);
        assert_eq!(returned.actual_return_time, Some(jan(4, 10)));
        assert_eq!(returned.late_charge_cents, 2250);
        assert_eq!(returned.condition_on_return.as_deref(), Some("scratched"));
    }

    #[tokio::test]
    async fn test_update_period_rechecks_availability() {
        let (service, _, bike, _) = setup().await;

        let first = service.create_rental(request(&bike.id, 2)).await.unwrap();

        let mut second = request(&bike.id, 1);
        second.start_time = Some(jan(5, 0));
        let second = service.create_rental(second).await.unwrap();

        // Moving the second onto the first must conflict
        let err = service
            .update_period(&second.id, jan(2, 0), jan(2, 12))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::AvailabilityConflict { .. })
        ));

        // Moving the FIRST within its own slot is fine (self excluded)
        let moved = service
            .update_period(&first.id, jan(1, 12), jan(3, 12))
            .await
            .unwrap();
        assert_eq!(moved.start_time, jan(1, 12));
    }

    #[tokio::test]
    async fn test_update_pricing_resolves_tier_and_recomputes_end() {
        let (service, _, bike, _) = setup().await;

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();

        let repriced = service
            .update_pricing(&rental.id, PricingGranularity::Weekly, 1)
            .await
            .unwrap();

        assert_eq!(repriced.unit_price_cents, 7000);
        assert_eq!(repriced.quantity, 1);
        assert_eq!(repriced.end_time, jan(8, 10));
    }

    #[tokio::test]
    async fn test_reset_rechecks_availability() {
        let (service, _, bike, _) = setup().await;

        let first = service.create_rental(request(&bike.id, 2)).await.unwrap();
        service.cancel_rental(&first.id).await.unwrap();

        // While cancelled, its slot is free and gets taken
        let usurper = service.create_rental(request(&bike.id, 2)).await.unwrap();
        assert_eq!(usurper.state, RentalState::Draft);

        // Reviving the cancelled draft must now fail
        let err = service.reset_rental(&first.id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::AvailabilityConflict { .. })
        ));
        // And the failed reset left it cancelled
        let still = service.get_rental(&first.id).await.unwrap();
        assert_eq!(still.state, RentalState::Cancelled);
    }

    #[tokio::test]
    async fn test_totals_roll_up_every_component() {
        let (service, clock, bike, helmet) = setup().await;

        let rental = service.create_rental(request(&bike.id, 3)).await.unwrap();
        service.add_extra(&rental.id, &helmet.id).await.unwrap();
        service.set_manual_extra(&rental.id, 250).await.unwrap();

        service.start_rental(&rental.id, None).await.unwrap();
        clock.set(jan(4, 10));
        service.return_rental(&rental.id, None).await.unwrap();

        let totals = service.totals(&rental.id).await.unwrap();
        assert_eq!(totals.base_price_cents, 4500); // 3 × 1500
        assert_eq!(totals.extras_total_cents, 500);
        assert_eq!(totals.manual_extra_cents, 250);
        assert_eq!(totals.late_charge_cents, 0); // back on schedule
        assert_eq!(totals.deposit_cents, 5000);
        assert_eq!(totals.total_cents, 4500 + 500 + 250 + 5000);
    }

    #[tokio::test]
    async fn test_extras_frozen_against_terminal_states() {
        let (service, clock, bike, helmet) = setup().await;

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();
        service.start_rental(&rental.id, None).await.unwrap();
        clock.set(jan(3, 10));
        service.return_rental(&rental.id, None).await.unwrap();

        let err = service.add_extra(&rental.id, &helmet.id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_deposit_return_only_after_return() {
        let (service, clock, bike, _) = setup().await;

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();
        assert!(service.mark_deposit_returned(&rental.id).await.is_err());

        service.start_rental(&rental.id, None).await.unwrap();
        clock.set(jan(3, 10));
        service.return_rental(&rental.id, None).await.unwrap();

        let marked = service.mark_deposit_returned(&rental.id).await.unwrap();
        assert!(marked.deposit_returned);

        // Idempotent
        let again = service.mark_deposit_returned(&rental.id).await.unwrap();
        assert!(again.deposit_returned);
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_item_id() {
        let (service, _, _, _) = setup().await;

        let err = service
            .create_rental(request("not-a-uuid", 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }

    #[tokio::test]
    async fn test_lookup_rejects_malformed_reference() {
        let (service, _, _, _) = setup().await;

        let err = service
            .get_rental_by_reference("has space")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }

    #[tokio::test]
    async fn test_item_lock_map_prunes_idle_entries() {
        let (service, _, bike, _) = setup().await;

        // Held entries must survive pruning
        let held = service.item_lock(&bike.id);
        let _guard = held.lock().await;

        for _ in 0..8 {
            let _ = service.item_lock(&Uuid::new_v4().to_string());
        }

        let locks = service.item_locks.lock().unwrap();
        assert!(locks.contains_key(&bike.id));
        // Only the held entry and the most recent acquisition remain
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_invoice_flow_posts_lines_and_attaches_once() {
        let (service, clock, bike, helmet) = setup().await;
        let gateway = RecordingGateway::new();

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();
        service.add_extra(&rental.id, &helmet.id).await.unwrap();
        service.start_rental(&rental.id, None).await.unwrap();
        clock.set(jan(4, 10)); // one day late
        service.return_rental(&rental.id, None).await.unwrap();

        let invoice_id = service.create_invoice(&rental.id, &gateway).await.unwrap();
        assert_eq!(invoice_id, "INV-1");

        let posted = gateway.posted();
        assert_eq!(posted.len(), 1);
        let lines = &posted[0].lines;
        // Base, helmet extra, late charge - deposit is never a line
        assert_eq!(lines.len(), 3);
        assert!(lines[0].description.starts_with("Rental: Trail Bike"));
        assert_eq!(lines[0].unit_price_cents, 3000);
        assert_eq!(lines[1].description, "Extra: Helmet");
        assert_eq!(lines[2].description, "Late return charge");
        assert_eq!(lines[2].unit_price_cents, 2250);

        // Second invoice is rejected; the first id survives
        let err = service.create_invoice(&rental.id, &gateway).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::DuplicateInvoice { .. })
        ));
        let after = service.get_rental(&rental.id).await.unwrap();
        assert_eq!(after.invoice_id.as_deref(), Some("INV-1"));
    }

    #[tokio::test]
    async fn test_gateway_failure_attaches_nothing() {
        let (service, clock, bike, _) = setup().await;
        let gateway = RecordingGateway::new();

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();
        service.start_rental(&rental.id, None).await.unwrap();
        clock.set(jan(3, 10));
        service.return_rental(&rental.id, None).await.unwrap();

        gateway.fail_next("connection refused");
        let err = service.create_invoice(&rental.id, &gateway).await.unwrap_err();
        assert!(matches!(err, EngineError::DependencyUnavailable { .. }));

        // Nothing attached - the retry goes through
        let intact = service.get_rental(&rental.id).await.unwrap();
        assert!(intact.invoice_id.is_none());
        let invoice_id = service.create_invoice(&rental.id, &gateway).await.unwrap();
        assert_eq!(invoice_id, "INV-1");
    }

    #[tokio::test]
    async fn test_concurrent_invoices_reach_the_gateway_once() {
        let (service, clock, bike, _) = setup().await;
        let gateway = Arc::new(RecordingGateway::new());

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();
        service.start_rental(&rental.id, None).await.unwrap();
        clock.set(jan(3, 10));
        service.return_rental(&rental.id, None).await.unwrap();

        let a = {
            let service = service.clone();
            let gateway = gateway.clone();
            let id = rental.id.clone();
            tokio::spawn(async move { service.create_invoice(&id, gateway.as_ref()).await })
        };
        let b = {
            let service = service.clone();
            let gateway = gateway.clone();
            let id = rental.id.clone();
            tokio::spawn(async move { service.create_invoice(&id, gateway.as_ref()).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "exactly one of two racing invoices may post");

        // The loser never reached the external system
        assert_eq!(gateway.posted().len(), 1);
        let loss = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loss.as_ref().unwrap_err(),
            EngineError::Core(CoreError::DuplicateInvoice { .. })
        ));

        let after = service.get_rental(&rental.id).await.unwrap();
        assert_eq!(after.invoice_id.as_deref(), Some("INV-1"));
    }

    #[tokio::test]
    async fn test_db_guard_backs_up_domain_invoice_check() {
        // Belt-and-braces: even writing straight through the repository,
        // the guarded column rejects a second attach.
        let (service, clock, bike, _) = setup().await;

        let rental = service.create_rental(request(&bike.id, 2)).await.unwrap();
        service.start_rental(&rental.id, None).await.unwrap();
        clock.set(jan(3, 10));
        service.return_rental(&rental.id, None).await.unwrap();

        service.db.rentals().set_invoice(&rental.id, "INV-A").await.unwrap();
        let err = service
            .db
            .rentals()
            .set_invoice(&rental.id, "INV-B")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
