// Error taxonomy for the roster
//
// Validation rejects before anything changes. Persistence failures happen
// after the in-memory change was applied. Lookup misses fail closed.

use crate::entities::{ClassEntryId, StudentId};
use thiserror::Error;

/// Why a new student draft was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("student name is required")]
    MissingName,
    #[error("start date is required")]
    MissingStartDate,
    #[error("start date {0:?} is not a YYYY-MM-DD date")]
    InvalidStartDate(String),
}

/// Failure reading or writing the durable key-value slot
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error in roster storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error in roster storage: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode or decode roster snapshot: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported roster schema version {0}")]
    UnsupportedVersion(u32),
    #[error("corrupt roster snapshot: {0}")]
    Corrupt(String),
    #[error("roster storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("due date {months} months after {start} is outside the calendar range")]
    OutOfRange { start: chrono::NaiveDate, months: u32 },
}

/// Everything a roster operation can report
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("rejected: {0}")]
    Validation(#[from] ValidationError),

    /// The change is applied in memory; the roster stays dirty until a save succeeds.
    #[error("change kept in memory but not saved: {0}")]
    Persistence(#[from] StoreError),

    #[error("student {0} is not in the roster")]
    StudentNotFound(StudentId),

    #[error("class {index} does not exist (log has {len} entries)")]
    ClassIndexOutOfRange { index: usize, len: usize },

    #[error("class entry {0} is not in the log")]
    ClassEntryNotFound(ClassEntryId),

    #[error("payment {index} does not exist (schedule has {len} slots)")]
    PaymentIndexOutOfRange { index: usize, len: usize },

    #[error("billing mode cannot change: {paid} payment(s) already recorded")]
    PaymentsRecorded { paid: usize },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl RosterError {
    /// True for failures where the in-memory roster is still ahead of storage
    pub fn is_unsaved_change(&self) -> bool {
        matches!(self, RosterError::Persistence(_))
    }
}
