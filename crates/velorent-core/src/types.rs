//! # Domain Types
//!
//! Core domain types used throughout VeloRent.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │   CatalogItem    │   │  RentalContract  │   │   RentalExtra    │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  id (UUID)       │   │  id (UUID)       │   │  id (UUID)       │    │
//! │  │  reference       │   │  reference       │   │  rental_id (FK)  │    │
//! │  │  rentable        │   │  state           │   │  name_snapshot   │    │
//! │  │  4 tier prices   │   │  start/end time  │   │  price_cents     │    │
//! │  │  available_qty   │   │  unit_price      │   └──────────────────┘    │
//! │  └──────────────────┘   └──────────────────┘                           │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │PricingGranularity│   │   RentalState    │   │   RentalAction   │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  Hourly   (1h)   │   │  Draft           │   │  Start           │    │
//! │  │  Daily   (24h)   │   │  Ongoing         │   │  Return          │    │
//! │  │  Weekly (168h)   │   │  Returned        │   │  Cancel          │    │
//! │  │  Monthly(720h)   │   │  Cancelled       │   │  Reset / Edit    │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (`reference`) - human-readable, assigned once, never reused

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::charges;
use crate::money::Money;
use crate::DAYS_PER_MONTH;

// =============================================================================
// Pricing Granularity
// =============================================================================

/// The time unit a rental is priced and measured in.
///
/// Each granularity maps to a fixed number of wall-clock hours. The monthly
/// unit is a fixed 30-day month - deliberately not calendar-aware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PricingGranularity {
    /// Priced per hour.
    Hourly,
    /// Priced per 24-hour day.
    Daily,
    /// Priced per 7-day week.
    Weekly,
    /// Priced per fixed 30-day month.
    Monthly,
}

impl PricingGranularity {
    /// Wall-clock hours in one unit of this granularity.
    ///
    /// {1, 24, 168, 720} - the divisors for duration computation and the
    /// multipliers for end-time computation, so the two always agree.
    #[inline]
    pub const fn hours_per_unit(&self) -> i64 {
        match self {
            PricingGranularity::Hourly => 1,
            PricingGranularity::Daily => 24,
            PricingGranularity::Weekly => 24 * 7,
            PricingGranularity::Monthly => 24 * DAYS_PER_MONTH,
        }
    }

    /// Lowercase name, matching the database representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PricingGranularity::Hourly => "hourly",
            PricingGranularity::Daily => "daily",
            PricingGranularity::Weekly => "weekly",
            PricingGranularity::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PricingGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rental State
// =============================================================================

/// The status of a rental contract.
///
/// See [`crate::lifecycle`] for the transition table. `Returned` is the one
/// true terminal state; `Cancelled` can be reset back to `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum RentalState {
    /// Contract is being drafted (dates and pricing still editable).
    Draft,
    /// Bike is out with the customer.
    Ongoing,
    /// Bike came back; contract is frozen forever.
    Returned,
    /// Contract was called off; may be reset to draft.
    Cancelled,
}

impl RentalState {
    /// True for states that permanently or temporarily end the rental.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, RentalState::Returned | RentalState::Cancelled)
    }

    /// True for states that reserve the item against other bookings.
    ///
    /// Draft counts: a draft holds its slot so that two clerks can't draft
    /// the same scarce bike for the same weekend.
    #[inline]
    pub const fn holds_item(&self) -> bool {
        matches!(self, RentalState::Draft | RentalState::Ongoing)
    }

    /// Lowercase name, matching the database representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RentalState::Draft => "draft",
            RentalState::Ongoing => "ongoing",
            RentalState::Returned => "returned",
            RentalState::Cancelled => "cancelled",
        }
    }
}

impl Default for RentalState {
    fn default() -> Self {
        RentalState::Draft
    }
}

impl fmt::Display for RentalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rental Action
// =============================================================================

/// An action the state machine arbitrates.
///
/// `Edit` is not a transition: it names the draft-only mutation of dates and
/// pricing fields, so a rejected edit reports the same way a rejected
/// transition does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalAction {
    Start,
    Return,
    Cancel,
    Reset,
    Edit,
}

impl fmt::Display for RentalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RentalAction::Start => "start",
            RentalAction::Return => "return",
            RentalAction::Cancel => "cancel",
            RentalAction::Reset => "reset",
            RentalAction::Edit => "edit",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// A catalog item as the rental engine sees it: read-only.
///
/// The catalog collaborator owns these rows. The engine reads the four tier
/// prices and the spare quantity; it never mutates stock (that belongs to
/// the sales flow).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CatalogItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Internal reference - business identifier, unique.
    pub reference: String,

    /// Display name shown on contracts and invoices.
    pub name: String,

    /// Whether this item may be rented at all.
    /// Accessories used as rental extras keep this false.
    pub rentable: bool,

    /// Hourly tier price in cents.
    pub hourly_price_cents: i64,

    /// Daily tier price in cents.
    pub daily_price_cents: i64,

    /// Weekly tier price in cents.
    pub weekly_price_cents: i64,

    /// Monthly tier price in cents.
    pub monthly_price_cents: i64,

    /// Sale price in cents - what an extra bills at when attached.
    pub sale_price_cents: i64,

    /// Units not tied up by active rentals. Owned by the sales flow;
    /// read-only from this engine's perspective.
    pub available_quantity: i64,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CatalogItem {
    /// Returns the rental price for the given granularity.
    ///
    /// Total over the enum, so there is no "undefined granularity" arm to
    /// silently default - the type system rejects it at compile time.
    #[inline]
    pub fn tier_price(&self, granularity: PricingGranularity) -> Money {
        let cents = match granularity {
            PricingGranularity::Hourly => self.hourly_price_cents,
            PricingGranularity::Daily => self.daily_price_cents,
            PricingGranularity::Weekly => self.weekly_price_cents,
            PricingGranularity::Monthly => self.monthly_price_cents,
        };
        Money::from_cents(cents)
    }

    /// Returns the sale price as Money (extras bill at this).
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }
}

// =============================================================================
// Rental Contract
// =============================================================================

/// A rental contract - the central entity of the engine.
///
/// ## Derived Amounts Are Methods
/// `base_price`, `duration_units` and `total_amount` are recomputed from the
/// stored inputs on every call; no derived total is persisted as
/// authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RentalContract {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Rental reference (e.g. "RENT-00042"). Assigned once at creation from
    /// the sequence collaborator; immutable and never reused.
    pub reference: String,

    /// Customer identifier - references an external entity, never embedded.
    pub customer_id: String,

    /// Rented catalog item identifier.
    pub item_id: String,

    /// Scheduled start of the rental period (inclusive).
    pub start_time: DateTime<Utc>,

    /// Scheduled end of the rental period (exclusive).
    /// Invariant: `end_time > start_time`.
    pub end_time: DateTime<Utc>,

    /// When the bike actually came back. Stamped by the return transition.
    pub actual_return_time: Option<DateTime<Utc>>,

    /// The pricing granularity the rental is billed in.
    pub granularity: PricingGranularity,

    /// Requested quantity in granularity units. Positive.
    ///
    /// This - not the computed duration - drives billing. See
    /// [`charges::compute_base_price`] for the policy note.
    pub quantity: i64,

    /// Unit price in cents, a snapshot of the tier price at booking time.
    pub unit_price_cents: i64,

    /// Deposit in cents. Shown in the total, tracked separately because it
    /// goes back to the customer (it is not revenue).
    pub deposit_cents: i64,

    /// Free-form operator surcharge in cents.
    pub manual_extra_cents: i64,

    /// Late-return surcharge in cents. Accrued only by the return transition.
    pub late_charge_cents: i64,

    /// Lifecycle state.
    pub state: RentalState,

    /// Whether the deposit has been handed back after return.
    pub deposit_returned: bool,

    /// Reference to the externally created invoice, at most one.
    pub invoice_id: Option<String>,

    /// Free-form notes.
    pub notes: Option<String>,

    /// Condition of the bike when picked up.
    pub condition_on_pickup: Option<String>,

    /// Condition of the bike when returned.
    pub condition_on_return: Option<String>,

    /// When the contract was created.
    pub created_at: DateTime<Utc>,

    /// When the contract was last updated.
    pub updated_at: DateTime<Utc>,
}

impl RentalContract {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the deposit as Money.
    #[inline]
    pub fn deposit(&self) -> Money {
        Money::from_cents(self.deposit_cents)
    }

    /// Returns the manual extra amount as Money.
    #[inline]
    pub fn manual_extra(&self) -> Money {
        Money::from_cents(self.manual_extra_cents)
    }

    /// Returns the accrued late charge as Money.
    #[inline]
    pub fn late_charge(&self) -> Money {
        Money::from_cents(self.late_charge_cents)
    }

    /// Base rental price: quantity × unit price, floored at zero.
    #[inline]
    pub fn base_price(&self) -> Money {
        charges::compute_base_price(self.quantity, self.unit_price())
    }

    /// Scheduled duration in granularity units (informational, not billed).
    #[inline]
    pub fn duration_units(&self) -> f64 {
        charges::compute_duration(Some(self.start_time), Some(self.end_time), self.granularity)
    }

    /// Grand total: base + deposit + late charge + extras + manual extra.
    ///
    /// Extras live in their own table, so the caller supplies their sum.
    pub fn total_amount(&self, extras_total: Money) -> Money {
        charges::compute_total_amount(
            self.base_price(),
            self.deposit(),
            self.late_charge(),
            extras_total,
            self.manual_extra(),
        )
    }
}

// =============================================================================
// Rental Extra
// =============================================================================

/// An accessory attached to a rental contract, billed once.
///
/// Uses the snapshot pattern: name and price are frozen at attach time so
/// that later catalog edits never rewrite an existing bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RentalExtra {
    pub id: String,
    pub rental_id: String,
    pub item_id: String,
    /// Item name at attach time (frozen).
    pub name_snapshot: String,
    /// Price in cents at attach time (frozen). One unit, no multiplier.
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl RentalExtra {
    /// Returns the frozen price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Active Rental
// =============================================================================

/// The narrow record the availability scan reads: one row per draft or
/// ongoing rental of an item. Everything else about the contract is
/// irrelevant to overlap detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ActiveRental {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub state: RentalState,
}

// =============================================================================
// Invoice Line
// =============================================================================

/// A billable line item handed to the external billing collaborator.
///
/// The engine never talks to a billing system directly; it assembles these
/// and lets the caller post them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Human-readable description.
    pub description: String,
    /// Always 1 - rentals bill whole lines, not per-unit quantities.
    pub quantity: i64,
    /// Line amount in cents.
    pub unit_price_cents: i64,
}

impl InvoiceLine {
    /// Creates a single-quantity line.
    pub fn new(description: impl Into<String>, unit_price: Money) -> Self {
        InvoiceLine {
            description: description.into(),
            quantity: 1,
            unit_price_cents: unit_price.cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
