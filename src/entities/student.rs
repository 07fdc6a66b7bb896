// Student Entity - stable identity + mutable details
//
// "Name is a VALUE (can change), StudentId is IDENTITY (never changes)"
//
// Problem solved:
// - Two students called "Ana" no longer collide on lookups
// - Renaming a student keeps their class log and payments attached

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::class_entry::{Attendance, ClassEntry, ClassEntryId, HomeworkDone};
use super::payment::PaymentRecord;
use crate::error::ValidationError;

// ============================================================================
// IDENTITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(Uuid);

impl StudentId {
    pub fn new() -> Self {
        StudentId(Uuid::new_v4())
    }

    /// Well-known id of the built-in seed student
    pub const fn seed() -> Self {
        StudentId(Uuid::nil())
    }

    pub fn is_seed(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for StudentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for StudentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(StudentId)
    }
}

// ============================================================================
// BILLING MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingMode {
    /// Four monthly payments
    Monthly,

    /// Two payments, two months apart
    Bimonthly,

    /// One payment up front
    PaidInFull,
}

impl BillingMode {
    /// Number of due dates (and payment slots) this mode produces
    pub fn installments(&self) -> usize {
        match self {
            BillingMode::Monthly => 4,
            BillingMode::Bimonthly => 2,
            BillingMode::PaidInFull => 1,
        }
    }

    /// Months between consecutive due dates
    pub fn step_months(&self) -> u32 {
        match self {
            BillingMode::Monthly => 1,
            BillingMode::Bimonthly => 2,
            BillingMode::PaidInFull => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::Monthly => "Monthly",
            BillingMode::Bimonthly => "Bimonthly",
            BillingMode::PaidInFull => "Paid in full",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            BillingMode::Monthly => BillingMode::Bimonthly,
            BillingMode::Bimonthly => BillingMode::PaidInFull,
            BillingMode::PaidInFull => BillingMode::Monthly,
        }
    }
}

impl fmt::Display for BillingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "monthly" => Ok(BillingMode::Monthly),
            "bimonthly" => Ok(BillingMode::Bimonthly),
            "paidinfull" | "full" => Ok(BillingMode::PaidInFull),
            _ => Err(format!(
                "unknown billing mode {s:?} (expected monthly, bimonthly or paid-in-full)"
            )),
        }
    }
}

// ============================================================================
// ACTIVE STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveStatus {
    Active,
    Inactive,
}

impl ActiveStatus {
    pub fn toggled(&self) -> Self {
        match self {
            ActiveStatus::Active => ActiveStatus::Inactive,
            ActiveStatus::Inactive => ActiveStatus::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveStatus::Active => "Active",
            ActiveStatus::Inactive => "Inactive",
        }
    }
}

// ============================================================================
// STUDENT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Stable identity - NEVER changes
    pub id: StudentId,

    pub name: String,
    pub email: String,
    pub phone: String,
    pub billing_mode: BillingMode,
    pub start_date: NaiveDate,
    pub status: ActiveStatus,

    /// Lessons in the order they were logged
    pub class_log: Vec<ClassEntry>,

    pub payment: PaymentRecord,
}

impl Student {
    /// Build a validated, Active student with an empty log and all-Pending payments
    pub fn from_draft(draft: &StudentDraft) -> Result<Self, ValidationError> {
        let start_date = draft.validate()?;

        Ok(Student {
            id: StudentId::new(),
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            billing_mode: draft.billing_mode,
            start_date,
            status: ActiveStatus::Active,
            class_log: Vec::new(),
            payment: PaymentRecord::seeded(draft.billing_mode),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == ActiveStatus::Active
    }

    /// Built-in student shown on first run and when the roster is empty
    pub fn seed() -> Self {
        let class = |date: NaiveDate, taken: bool, assignment: &str, notes: &str| ClassEntry {
            id: ClassEntryId::new(),
            date,
            attendance: if taken {
                Attendance::Taken
            } else {
                Attendance::NotTaken
            },
            homework_done: if taken {
                HomeworkDone::Yes
            } else {
                HomeworkDone::No
            },
            next_assignment: assignment.to_string(),
            notes: notes.to_string(),
        };

        Student {
            id: StudentId::seed(),
            name: "Elena González".to_string(),
            email: "elena.gonzalez@example.com".to_string(),
            phone: "987-654-3210".to_string(),
            billing_mode: BillingMode::Monthly,
            start_date: seed_date(1),
            status: ActiveStatus::Active,
            class_log: vec![
                class(seed_date(1), true, "C major scale", "Well done"),
                class(seed_date(8), true, "Arpeggios", "Bring staff paper"),
                class(seed_date(15), false, "Sight reading", ""),
            ],
            payment: PaymentRecord::seeded(BillingMode::Monthly),
        }
    }
}

fn seed_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, day).unwrap_or_default()
}

// ============================================================================
// FORMS
// ============================================================================

/// Unvalidated "new student" form input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub billing_mode: BillingMode,
    /// Raw `YYYY-MM-DD` text, as typed
    pub start_date: String,
}

impl Default for StudentDraft {
    fn default() -> Self {
        StudentDraft {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            billing_mode: BillingMode::Monthly,
            start_date: String::new(),
        }
    }
}

impl StudentDraft {
    pub fn new(name: impl Into<String>, billing_mode: BillingMode, start_date: impl Into<String>) -> Self {
        StudentDraft {
            name: name.into(),
            billing_mode,
            start_date: start_date.into(),
            ..StudentDraft::default()
        }
    }

    pub fn with_contact(mut self, email: impl Into<String>, phone: impl Into<String>) -> Self {
        self.email = email.into();
        self.phone = phone.into();
        self
    }

    /// Check required fields and parse the start date
    pub fn validate(&self) -> Result<NaiveDate, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }

        let raw = self.start_date.trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingStartDate);
        }

        parse_date(raw).ok_or_else(|| ValidationError::InvalidStartDate(raw.to_string()))
    }
}

/// Partial edit of an existing student; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub billing_mode: Option<BillingMode>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self == &StudentPatch::default()
    }
}

/// Parse the `YYYY-MM-DD` form of a date input
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PaymentStatus;

    #[test]
    fn test_draft_requires_name() {
        let draft = StudentDraft::new("   ", BillingMode::Monthly, "2024-01-10");
        assert_eq!(draft.validate(), Err(ValidationError::MissingName));
    }

    #[test]
    fn test_draft_requires_start_date() {
        let draft = StudentDraft::new("Ana", BillingMode::Monthly, "");
        assert_eq!(draft.validate(), Err(ValidationError::MissingStartDate));
    }

    #[test]
    fn test_draft_rejects_unparseable_date() {
        let draft = StudentDraft::new("Ana", BillingMode::Monthly, "10/01/2024");
        assert_eq!(
            draft.validate(),
            Err(ValidationError::InvalidStartDate("10/01/2024".to_string()))
        );
    }

    #[test]
    fn test_from_draft_seeds_payments() {
        let draft = StudentDraft::new("Ana", BillingMode::Bimonthly, "2024-01-10")
            .with_contact("ana@example.com", "555-0100");
        let student = Student::from_draft(&draft).unwrap();

        assert_eq!(student.name, "Ana");
        assert_eq!(student.email, "ana@example.com");
        assert!(student.is_active());
        assert!(student.class_log.is_empty());
        assert_eq!(student.payment.billing_mode, BillingMode::Bimonthly);
        assert_eq!(
            student.payment.statuses,
            vec![PaymentStatus::Pending, PaymentStatus::Pending]
        );
        assert!(!student.id.is_seed());
    }

    #[test]
    fn test_billing_mode_parse() {
        assert_eq!("monthly".parse::<BillingMode>(), Ok(BillingMode::Monthly));
        assert_eq!("Bimonthly".parse::<BillingMode>(), Ok(BillingMode::Bimonthly));
        assert_eq!("paid-in-full".parse::<BillingMode>(), Ok(BillingMode::PaidInFull));
        assert!("weekly".parse::<BillingMode>().is_err());
    }

    #[test]
    fn test_seed_student() {
        let seed = Student::seed();
        assert!(seed.id.is_seed());
        assert_eq!(seed.class_log.len(), 3);
        assert_eq!(seed.payment.statuses.len(), 4);
        assert_eq!(seed.start_date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(ActiveStatus::Active.toggled(), ActiveStatus::Inactive);
        assert_eq!(ActiveStatus::Inactive.toggled(), ActiveStatus::Active);
    }
}
