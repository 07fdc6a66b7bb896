// Entity Models
//
// Each entity has a stable identity (UUID) that never changes; everything
// else about it is a value that the roster edits in place.

pub mod class_entry;
pub mod payment;
pub mod student;

pub use class_entry::{Attendance, ClassEdit, ClassEntry, ClassEntryId, HomeworkDone};
pub use payment::{PaymentRecord, PaymentStatus};
pub use student::{
    parse_date, ActiveStatus, BillingMode, Student, StudentDraft, StudentId, StudentPatch,
};
