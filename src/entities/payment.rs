// Payment Record - statuses aligned by position with the derived schedule

use serde::{Deserialize, Serialize};

use super::student::BillingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub billing_mode: BillingMode,
    pub statuses: Vec<PaymentStatus>,
}

impl PaymentRecord {
    /// All-Pending record with one slot per due date of `billing_mode`
    pub fn seeded(billing_mode: BillingMode) -> Self {
        PaymentRecord {
            billing_mode,
            statuses: vec![PaymentStatus::Pending; billing_mode.installments()],
        }
    }

    /// Pending -> Paid for schedule slot `index`. Returns `None` when the
    /// billing mode has no such slot, `Some(false)` when it was already paid.
    ///
    /// A short record is padded with Pending up to `index` first.
    pub fn mark_paid(&mut self, index: usize) -> Option<bool> {
        if index >= self.billing_mode.installments() {
            return None;
        }
        if self.statuses.len() <= index {
            self.statuses.resize(index + 1, PaymentStatus::Pending);
        }
        let slot = self.statuses.get_mut(index)?;
        if *slot == PaymentStatus::Paid {
            return Some(false);
        }
        *slot = PaymentStatus::Paid;
        Some(true)
    }

    pub fn paid_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == PaymentStatus::Paid)
            .count()
    }

    pub fn has_payments(&self) -> bool {
        self.paid_count() > 0
    }

    /// Slot count matches what the billing mode schedules
    pub fn is_aligned(&self) -> bool {
        self.statuses.len() == self.billing_mode.installments()
    }

    /// Status for schedule slot `index`; slots with no stored status read as Pending
    pub fn status_at(&self, index: usize) -> PaymentStatus {
        self.statuses
            .get(index)
            .copied()
            .unwrap_or(PaymentStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_lengths() {
        assert_eq!(PaymentRecord::seeded(BillingMode::Monthly).statuses.len(), 4);
        assert_eq!(PaymentRecord::seeded(BillingMode::Bimonthly).statuses.len(), 2);
        assert_eq!(PaymentRecord::seeded(BillingMode::PaidInFull).statuses.len(), 1);
    }

    #[test]
    fn test_mark_paid_is_idempotent() {
        let mut record = PaymentRecord::seeded(BillingMode::Monthly);

        assert_eq!(record.mark_paid(2), Some(true));
        let once = record.clone();
        assert_eq!(record.mark_paid(2), Some(false));

        assert_eq!(record, once);
        assert_eq!(record.statuses[2], PaymentStatus::Paid);
        assert_eq!(record.paid_count(), 1);
    }

    #[test]
    fn test_mark_paid_out_of_range() {
        let mut record = PaymentRecord::seeded(BillingMode::PaidInFull);
        assert_eq!(record.mark_paid(1), None);
        assert!(!record.has_payments());
    }

    #[test]
    fn test_mark_paid_pads_short_record() {
        let mut record = PaymentRecord {
            billing_mode: BillingMode::Monthly,
            statuses: vec![PaymentStatus::Pending],
        };

        assert_eq!(record.mark_paid(3), Some(true));
        assert_eq!(
            record.statuses,
            vec![
                PaymentStatus::Pending,
                PaymentStatus::Pending,
                PaymentStatus::Pending,
                PaymentStatus::Paid
            ]
        );
        assert!(record.is_aligned());
        assert_eq!(record.mark_paid(4), None);
    }

    #[test]
    fn test_mark_paid_ignores_surplus_slots() {
        let mut record = PaymentRecord {
            billing_mode: BillingMode::PaidInFull,
            statuses: vec![PaymentStatus::Pending, PaymentStatus::Pending],
        };
        assert_eq!(record.mark_paid(1), None);
        assert!(!record.has_payments());
    }

    #[test]
    fn test_status_at_fills_missing_slots() {
        let record = PaymentRecord {
            billing_mode: BillingMode::Monthly,
            statuses: vec![PaymentStatus::Paid],
        };
        assert!(!record.is_aligned());
        assert_eq!(record.status_at(0), PaymentStatus::Paid);
        assert_eq!(record.status_at(3), PaymentStatus::Pending);
    }
}
