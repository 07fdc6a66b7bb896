// 📅 Payment Schedule - due dates derived from (start date, billing mode)
//
// Never stored: re-derived on every read, so editing the start date moves
// the whole schedule at once.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entities::BillingMode;
use crate::error::ScheduleError;

/// Day/month/year with two-digit day and month
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

// ============================================================================
// MONTH ROLLOVER
// ============================================================================

/// What happens when the start day does not exist in the target month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthRollover {
    /// Surplus days spill into the next month (Jan 31 + 1 month = Mar 2 or 3)
    #[default]
    Overflow,

    /// Stop at the last day of the target month (Jan 31 + 1 month = Feb 28 or 29)
    Clamp,
}

/// `date` advanced by `months` calendar months
pub fn add_months(
    date: NaiveDate,
    months: u32,
    rollover: MonthRollover,
) -> Result<NaiveDate, ScheduleError> {
    let out_of_range = || ScheduleError::OutOfRange {
        start: date,
        months,
    };

    match rollover {
        MonthRollover::Clamp => date
            .checked_add_months(Months::new(months))
            .ok_or_else(out_of_range),
        MonthRollover::Overflow => {
            // Day 1 exists in every month, so shifting it never clamps
            let first = date.with_day(1).ok_or_else(out_of_range)?;
            let shifted = first
                .checked_add_months(Months::new(months))
                .ok_or_else(out_of_range)?;
            shifted
                .checked_add_signed(Duration::days(i64::from(date.day()) - 1))
                .ok_or_else(out_of_range)
        }
    }
}

// ============================================================================
// DERIVATION
// ============================================================================

/// Ordered due dates for `billing_mode` starting at `start`
pub fn derive(start: NaiveDate, billing_mode: BillingMode) -> Result<Vec<NaiveDate>, ScheduleError> {
    derive_with(start, billing_mode, MonthRollover::default())
}

pub fn derive_with(
    start: NaiveDate,
    billing_mode: BillingMode,
    rollover: MonthRollover,
) -> Result<Vec<NaiveDate>, ScheduleError> {
    let step = billing_mode.step_months();

    (0..billing_mode.installments() as u32)
        .map(|i| add_months(start, i * step, rollover))
        .collect()
}

/// Due dates rendered with a strftime-style `format`
pub fn derive_display(
    start: NaiveDate,
    billing_mode: BillingMode,
    rollover: MonthRollover,
    format: &str,
) -> Result<Vec<String>, ScheduleError> {
    Ok(derive_with(start, billing_mode, rollover)?
        .into_iter()
        .map(|date| format_date(date, format))
        .collect())
}

pub fn format_date(date: NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}

// ============================================================================
// TESTS
// ============================================================================
