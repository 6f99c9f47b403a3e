//! # velorent-engine: Rental Lifecycle Service
//!
//! The orchestration layer of VeloRent. It wires the pure logic of
//! `velorent-core` to the storage of `velorent-db`, and is the only place
//! where availability checks and contract writes meet.
//!
//! ## Operation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       RentalService                                     │
//! │                                                                         │
//! │  quote ────────────► price a prospective rental, create nothing         │
//! │  create_rental ────► tier snapshot + end time + booked interval         │
//! │  update_period ────► draft-only, re-checks availability                 │
//! │  update_pricing ───► draft-only, re-resolves the tier                   │
//! │  start_rental ─────► draft → ongoing, restamps start                    │
//! │  return_rental ────► ongoing → returned, accrues late charge            │
//! │  cancel / reset ───► cancelled round-trip, reset re-checks the slot     │
//! │  add/remove_extra ─► snapshot-priced accessory lines                    │
//! │  totals ───────────► recomputed money picture                           │
//! │  create_invoice ───► lines → billing gateway → id attached once         │
//! │                                                                         │
//! │  Every check+write pair runs under a per-item async lock.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`service`] - The [`RentalService`] itself and its DTOs
//! - [`clock`] - Injectable time source
//! - [`billing`] - The external billing gateway seam
//! - [`error`] - The caller-facing error surface

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod clock;
pub mod error;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use billing::{BillingError, BillingGateway};
pub use clock::{Clock, SystemClock};
pub use error::{EngineError, EngineResult};
pub use service::{NewRentalRequest, RentalQuote, RentalService, RentalTotals};
