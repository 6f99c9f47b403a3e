//! # Rental Repository
//!
//! Database operations for rental contracts, their extras, and the
//! reference sequence.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes What                                      │
//! │                                                                         │
//! │  insert()        one-time, at contract creation                         │
//! │  save()          everything mutable EXCEPT invoice_id                   │
//! │  set_invoice()   invoice_id only, guarded `WHERE invoice_id IS NULL`    │
//! │                                                                         │
//! │  Keeping invoice_id out of save() means a stale in-memory contract      │
//! │  can never blank out or overwrite an attached invoice - the column      │
//! │  is written exactly once, through the guarded statement.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use velorent_core::{ActiveRental, RentalContract, RentalExtra};

/// All persisted contract columns, in schema order. Shared by every SELECT
/// so a new column only needs adding in one place.
const CONTRACT_COLUMNS: &str = r#"
    id, reference, customer_id, item_id,
    start_time, end_time, actual_return_time,
    granularity, quantity, unit_price_cents,
    deposit_cents, manual_extra_cents, late_charge_cents,
    state, deposit_returned, invoice_id,
    notes, condition_on_pickup, condition_on_return,
    created_at, updated_at
"#;

/// Repository for rental contract database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = RentalRepository::new(pool);
///
/// let reference = repo.next_reference().await?;
/// repo.insert(&contract).await?;
/// let active = repo.list_active_for_item(&item_id, None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

impl RentalRepository {
    /// Creates a new RentalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    // =========================================================================
    // Reference Sequence
    // =========================================================================

    /// Allocates the next rental reference (e.g. "RENT-00042").
    ///
    /// ## How It Works
    /// A single UPDATE..RETURNING bumps the one-row counter and hands back
    /// the pre-bump value atomically, so two concurrent creations can never
    /// see the same number. References are never reused, even for rentals
    /// that end up cancelled.
    pub async fn next_reference(&self) -> DbResult<String> {
        let value: i64 = sqlx::query_scalar(
            r#"
            UPDATE rental_sequence
            SET next_value = next_value + 1
            WHERE id = 1
            RETURNING next_value - 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(format!("RENT-{value:05}"))
    }

    // =========================================================================
    // Contracts
    // =========================================================================

    /// Inserts a new rental contract.
    pub async fn insert(&self, rental: &RentalContract) -> DbResult<()> {
        debug!(reference = %rental.reference, item_id = %rental.item_id, "Inserting rental");

        sqlx::query(
            r#"
            INSERT INTO rentals (
                id, reference, customer_id, item_id,
                start_time, end_time, actual_return_time,
                granularity, quantity, unit_price_cents,
                deposit_cents, manual_extra_cents, late_charge_cents,
                state, deposit_returned, invoice_id,
                notes, condition_on_pickup, condition_on_return,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15, ?16,
                ?17, ?18, ?19,
                ?20, ?21
            )
            "#,
        )
        .bind(&rental.id)
        .bind(&rental.reference)
        .bind(&rental.customer_id)
        .bind(&rental.item_id)
        .bind(rental.start_time)
        .bind(rental.end_time)
        .bind(rental.actual_return_time)
        .bind(rental.granularity)
        .bind(rental.quantity)
        .bind(rental.unit_price_cents)
        .bind(rental.deposit_cents)
        .bind(rental.manual_extra_cents)
        .bind(rental.late_charge_cents)
        .bind(rental.state)
        .bind(rental.deposit_returned)
        .bind(&rental.invoice_id)
        .bind(&rental.notes)
        .bind(&rental.condition_on_pickup)
        .bind(&rental.condition_on_return)
        .bind(rental.created_at)
        .bind(rental.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a rental contract by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RentalContract>> {
        let sql = format!("SELECT {CONTRACT_COLUMNS} FROM rentals WHERE id = ?1");

        let rental = sqlx::query_as::<_, RentalContract>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rental)
    }

    /// Gets a rental contract by its business reference.
    pub async fn get_by_reference(&self, reference: &str) -> DbResult<Option<RentalContract>> {
        let sql = format!("SELECT {CONTRACT_COLUMNS} FROM rentals WHERE reference = ?1");

        let rental = sqlx::query_as::<_, RentalContract>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rental)
    }

    /// Lists rentals for a customer, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<RentalContract>> {
        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} FROM rentals WHERE customer_id = ?1 ORDER BY created_at DESC"
        );

        let rentals = sqlx::query_as::<_, RentalContract>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rentals)
    }

    /// Lists the active (draft or ongoing) rentals of an item, optionally
    /// excluding one rental.
    ///
    /// ## Usage
    /// This is the input to the availability overlap scan. The exclusion is
    /// for edits: a rental's own interval must not conflict with itself.
    /// Returned and cancelled rentals never hold the item.
    pub async fn list_active_for_item(
        &self,
        item_id: &str,
        exclude_id: Option<&str>,
    ) -> DbResult<Vec<ActiveRental>> {
        let rentals = sqlx::query_as::<_, ActiveRental>(
            r#"
            SELECT id, start_time, end_time, state
            FROM rentals
            WHERE item_id = ?1
              AND state IN ('draft', 'ongoing')
              AND (?2 IS NULL OR id != ?2)
            "#,
        )
        .bind(item_id)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            item_id = %item_id,
            count = rentals.len(),
            "Listed active rentals for item"
        );
        Ok(rentals)
    }

    /// Persists the mutable contract fields.
    ///
    /// Deliberately does NOT touch `invoice_id` - that column is written
    /// once, through [`set_invoice`](Self::set_invoice).
    ///
    /// ## Returns
    /// * `Ok(())` - Saved
    /// * `Err(DbError::NotFound)` - Contract doesn't exist
    pub async fn save(&self, rental: &RentalContract) -> DbResult<()> {
        debug!(id = %rental.id, state = %rental.state, "Saving rental");

        let result = sqlx::query(
            r#"
            UPDATE rentals SET
                customer_id = ?2,
                start_time = ?3,
                end_time = ?4,
                actual_return_time = ?5,
                granularity = ?6,
                quantity = ?7,
                unit_price_cents = ?8,
                deposit_cents = ?9,
                manual_extra_cents = ?10,
                late_charge_cents = ?11,
                state = ?12,
                deposit_returned = ?13,
                notes = ?14,
                condition_on_pickup = ?15,
                condition_on_return = ?16,
                updated_at = ?17
            WHERE id = ?1
            "#,
        )
        .bind(&rental.id)
        .bind(&rental.customer_id)
        .bind(rental.start_time)
        .bind(rental.end_time)
        .bind(rental.actual_return_time)
        .bind(rental.granularity)
        .bind(rental.quantity)
        .bind(rental.unit_price_cents)
        .bind(rental.deposit_cents)
        .bind(rental.manual_extra_cents)
        .bind(rental.late_charge_cents)
        .bind(rental.state)
        .bind(rental.deposit_returned)
        .bind(&rental.notes)
        .bind(&rental.condition_on_pickup)
        .bind(&rental.condition_on_return)
        .bind(rental.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Rental", &rental.id));
        }

        Ok(())
    }

    /// Attaches an invoice reference, exactly once.
    ///
    /// ## Idempotence Guard
    /// The `WHERE invoice_id IS NULL` clause makes a repeat attach a no-op
    /// at the SQL level. When no row updates, we re-read to tell "already
    /// invoiced" apart from "no such rental".
    pub async fn set_invoice(&self, id: &str, invoice_id: &str) -> DbResult<()> {
        debug!(id = %id, invoice_id = %invoice_id, "Attaching invoice");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE rentals
            SET invoice_id = ?2, updated_at = ?3
            WHERE id = ?1 AND invoice_id IS NULL
            "#,
        )
        .bind(id)
        .bind(invoice_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let existing: Option<Option<String>> =
                sqlx::query_scalar("SELECT invoice_id FROM rentals WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;

            return match existing {
                Some(Some(attached)) => Err(DbError::duplicate("rentals.invoice_id", attached)),
                _ => Err(DbError::not_found("Rental", id)),
            };
        }

        Ok(())
    }

    // =========================================================================
    // Extras
    // =========================================================================

    /// Attaches an extra (accessory line) to a rental.
    pub async fn add_extra(&self, extra: &RentalExtra) -> DbResult<()> {
        debug!(
            rental_id = %extra.rental_id,
            name = %extra.name_snapshot,
            "Adding rental extra"
        );

        sqlx::query(
            r#"
            INSERT INTO rental_extras (
                id, rental_id, item_id, name_snapshot, price_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&extra.id)
        .bind(&extra.rental_id)
        .bind(&extra.item_id)
        .bind(&extra.name_snapshot)
        .bind(extra.price_cents)
        .bind(extra.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists the extras attached to a rental, in attach order.
    pub async fn get_extras(&self, rental_id: &str) -> DbResult<Vec<RentalExtra>> {
        let extras = sqlx::query_as::<_, RentalExtra>(
            r#"
            SELECT id, rental_id, item_id, name_snapshot, price_cents, created_at
            FROM rental_extras
            WHERE rental_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(rental_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(extras)
    }

    /// Removes an extra from a rental.
    pub async fn remove_extra(&self, extra_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM rental_extras WHERE id = ?1")
            .bind(extra_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RentalExtra", extra_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
