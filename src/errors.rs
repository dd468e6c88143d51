//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError so that callers see one
//! taxonomy: workflow errors are recoverable and surface as "needs attention"
//! outcomes, never as process crashes.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Input
    // ---------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ---------------------------
    // Workflow
    // ---------------------------
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Worker {worker_id} already has an open attendance record today (record {record_id})")]
    DuplicateOpenRecord { worker_id: i64, record_id: i64 },

    #[error("An appeal already exists for {0}")]
    DuplicateAppeal(String),

    #[error("Not eligible for appeal: {0}")]
    NotEligibleForAppeal(String),

    #[error("Attendance record {0} is not open")]
    RecordNotOpen(i64),

    #[error("Appeal {0} has already been resolved")]
    AlreadyResolved(i64),

    #[error("Concurrent modification of {0}; reload and retry")]
    ConcurrentModification(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Only optimistic-concurrency failures are worth retrying with fresh state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ConcurrentModification(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
