// Payment tracking for the selected student
//
// Statuses are positional: slot i belongs to the i-th derived due date.

use chrono::NaiveDate;
use log::debug;

use crate::entities::{PaymentStatus, Student};
use crate::error::{RosterError, ScheduleError};
use crate::roster::Roster;
use crate::schedule::{self, MonthRollover};
use crate::store::SnapshotStore;

/// One line of the payments table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentRow {
    pub index: usize,
    pub due: NaiveDate,
    pub status: PaymentStatus,
}

/// Live schedule of `student` zipped with its stored statuses.
///
/// The schedule follows the payment record's billing mode. It sets the
/// length: a missing status reads as Pending and surplus statuses are not shown.
pub fn payment_rows(student: &Student, rollover: MonthRollover) -> Result<Vec<PaymentRow>, ScheduleError> {
    let dates = schedule::derive_with(student.start_date, student.payment.billing_mode, rollover)?;
    Ok(dates
        .into_iter()
        .enumerate()
        .map(|(index, due)| PaymentRow {
            index,
            due,
            status: student.payment.status_at(index),
        })
        .collect())
}

pub struct PaymentTracker<'a, S: SnapshotStore> {
    roster: &'a mut Roster<S>,
}

impl<'a, S: SnapshotStore> PaymentTracker<'a, S> {
    pub(crate) fn new(roster: &'a mut Roster<S>) -> Self {
        PaymentTracker { roster }
    }

    pub fn rows(&self) -> Result<Vec<PaymentRow>, RosterError> {
        let student = self.roster.selected_live()?;
        Ok(payment_rows(student, self.roster.rollover())?)
    }

    /// Pending -> Paid for slot `index`; returns false if it was already Paid
    pub fn mark_paid(&mut self, index: usize) -> Result<bool, RosterError> {
        self.roster.mutate_selected(|student| {
            let len = student.payment.billing_mode.installments();
            let changed = student
                .payment
                .mark_paid(index)
                .ok_or(RosterError::PaymentIndexOutOfRange { index, len })?;
            if changed {
                debug!("Payment {} of {} marked paid", index, student.name);
            }
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BillingMode, PaymentRecord, StudentDraft};
    use crate::roster::RosterOptions;
    use crate::store::MemoryStore;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn roster() -> Roster<MemoryStore> {
        let options = RosterOptions {
            seed_on_first_run: false,
            ..RosterOptions::default()
        };
        Roster::open(MemoryStore::new(), options).unwrap()
    }

    #[test]
    fn test_ana_bimonthly_scenario() {
        let mut roster = roster();
        roster
            .add(&StudentDraft::new("Ana", BillingMode::Bimonthly, "2024-01-10"))
            .unwrap();

        let dues: Vec<_> = roster.payments().rows().unwrap().iter().map(|r| r.due).collect();
        assert_eq!(dues, vec![ymd(2024, 1, 10), ymd(2024, 3, 10)]);

        assert!(roster.payments().mark_paid(0).unwrap());
        assert_eq!(
            roster.selected().payment.statuses,
            vec![PaymentStatus::Paid, PaymentStatus::Pending]
        );
    }

    #[test]
    fn test_mark_paid_twice_never_reverts() {
        let mut roster = roster();
        roster
            .add(&StudentDraft::new("Ben", BillingMode::Monthly, "2024-04-01"))
            .unwrap();

        assert!(roster.payments().mark_paid(3).unwrap());
        let once = roster.selected().payment.clone();
        assert!(!roster.payments().mark_paid(3).unwrap());

        assert_eq!(roster.selected().payment, once);
        assert_eq!(once.statuses[3], PaymentStatus::Paid);
    }

    #[test]
    fn test_mark_paid_out_of_range_is_reported() {
        let mut roster = roster();
        roster
            .add(&StudentDraft::new("Cleo", BillingMode::PaidInFull, "2024-04-01"))
            .unwrap();

        let err = roster.payments().mark_paid(1).unwrap_err();
        assert!(matches!(err, RosterError::PaymentIndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(roster.store().writes(), 1);
    }

    #[test]
    fn test_rows_follow_schedule_length() {
        let mut student = Student::seed();
        student.payment = PaymentRecord {
            billing_mode: BillingMode::Bimonthly,
            statuses: vec![PaymentStatus::Paid, PaymentStatus::Pending, PaymentStatus::Paid],
        };
        student.billing_mode = BillingMode::Bimonthly;

        let rows = payment_rows(&student, MonthRollover::Overflow).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, PaymentStatus::Paid);
        assert_eq!(rows[1].due, ymd(2024, 9, 1));

        student.billing_mode = BillingMode::Monthly;
        student.payment.billing_mode = BillingMode::Monthly;
        student.payment.statuses.truncate(1);
        let rows = payment_rows(&student, MonthRollover::Overflow).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].status, PaymentStatus::Pending);
    }

    #[test]
    fn test_rows_use_payment_record_mode() {
        let mut student = Student::seed();
        student.billing_mode = BillingMode::Monthly;
        student.payment = PaymentRecord::seeded(BillingMode::Bimonthly);

        let dues: Vec<_> = payment_rows(&student, MonthRollover::Overflow)
            .unwrap()
            .iter()
            .map(|r| r.due)
            .collect();
        assert_eq!(dues, vec![ymd(2024, 7, 1), ymd(2024, 9, 1)]);
    }

    #[test]
    fn test_pending_fill_row_can_be_paid() {
        let mut short = Student::seed();
        short.payment.statuses = vec![PaymentStatus::Pending];
        let options = RosterOptions::default();
        let mut roster = Roster::with_students(MemoryStore::new(), vec![short], options);

        let rows = roster.payments().rows().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].status, PaymentStatus::Pending);

        assert!(roster.payments().mark_paid(3).unwrap());
        let rows = roster.payments().rows().unwrap();
        assert_eq!(rows[3].status, PaymentStatus::Paid);
        assert_eq!(roster.selected().payment.statuses.len(), 4);
        assert_eq!(roster.store().writes(), 1);

        let err = roster.payments().mark_paid(4).unwrap_err();
        assert!(matches!(err, RosterError::PaymentIndexOutOfRange { index: 4, len: 4 }));
    }
}
