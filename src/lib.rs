// Tutor Roster - Core Library
// Exposes all modules for use in the CLI, the terminal UI, and tests

pub mod class_log;  // Per-student class log editing
pub mod config;     // figment layering: defaults -> JSON file -> ROSTER_* env
pub mod db;         // SQLite key-value slot
pub mod entities;   // Student, ClassEntry, PaymentRecord
pub mod error;
pub mod legacy;     // Unversioned snapshot migration
pub mod payments;   // Payment statuses zipped with the schedule
pub mod roster;     // Repository + persistence on every mutation
pub mod schedule;   // Due-date derivation
pub mod snapshot;   // Versioned snapshot codec
pub mod store;      // Persistence port + memory/JSON stores

// Re-export commonly used types
pub use class_log::ClassLogEditor;
pub use config::{Backend, Config};
pub use db::SqliteStore;
pub use entities::{
    ActiveStatus, Attendance, BillingMode, ClassEdit, ClassEntry, ClassEntryId, HomeworkDone,
    PaymentRecord, PaymentStatus, Student, StudentDraft, StudentId, StudentPatch,
};
pub use error::{RosterError, ScheduleError, StoreError, ValidationError};
pub use payments::{payment_rows, PaymentRow, PaymentTracker};
pub use roster::{Confirm, Removal, Roster, RosterOptions};
pub use schedule::{derive, derive_display, derive_with, format_date, MonthRollover, DISPLAY_FORMAT};
pub use snapshot::SCHEMA_VERSION;
pub use store::{JsonFileStore, MemoryStore, SnapshotStore, ROSTER_KEY};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
