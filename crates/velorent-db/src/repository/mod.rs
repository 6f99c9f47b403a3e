//! # Repository Module
//!
//! Database repository implementations for VeloRent.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.   │
//! │                                                                         │
//! │  RentalService operation                                                │
//! │       │                                                                 │
//! │       │  db.rentals().list_active_for_item(&item_id, None)             │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  RentalRepository                                                       │
//! │  ├── insert(&self, rental)                                              │
//! │  ├── get_by_id(&self, id)                                               │
//! │  ├── save(&self, rental)                                                │
//! │  └── list_active_for_item(&self, item_id, exclude)                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                         │
//! │  • Easy to test (in-memory database)                                    │
//! │  • SQL is isolated in one place                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Catalog item lookups and seeding
//! - [`rental::RentalRepository`] - Rental contracts, extras, reference sequence

pub mod catalog;
pub mod rental;
