//! # Engine Error Types
//!
//! The error surface callers of [`crate::service::RentalService`] see.
//! Domain rejections and storage failures stay distinguishable so a caller
//! can tell "you can't do that" apart from "the database is down".

use thiserror::Error;
use velorent_core::CoreError;
use velorent_db::DbError;

/// Errors surfaced by rental service operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A domain rule rejected the operation (bad transition, conflict,
    /// validation failure, duplicate invoice).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The storage layer failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An external collaborator (billing) refused or is unreachable.
    #[error("{dependency} unavailable: {reason}")]
    DependencyUnavailable { dependency: String, reason: String },
}

impl EngineError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
