//! Monthly aggregation: one classified day per calendar day plus summary counts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::policy::resolve;
use crate::{DateSets, DayStatus, MonthSummary, ValidationError, WeekendPolicy, MAX_YEAR, MIN_YEAR};

/// A fully classified employee-month
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAttendance {
    pub year: i32,
    pub month: u32,
    pub policy: WeekendPolicy,
    /// Ascending by date, one entry per calendar day
    pub days: Vec<DayStatus>,
    pub summary: MonthSummary,
}

impl MonthlyAttendance {
    /// Status of a given day of the month (1-based)
    pub fn day(&self, day: u32) -> Option<&DayStatus> {
        self.days.get(day.checked_sub(1)? as usize)
    }
}

/// Reject years and months outside the supported range
pub fn validate_period(year: i32, month: u32) -> Result<(), ValidationError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::YearOutOfRange(year));
    }
    if !(1..=12).contains(&month) {
        return Err(ValidationError::MonthOutOfRange(month));
    }
    Ok(())
}

/// First day of the month
pub fn first_day(year: i32, month: u32) -> Result<NaiveDate, ValidationError> {
    validate_period(year, month)?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(ValidationError::MonthOutOfRange(month))
}

/// Number of days in the month (28..=31)
pub fn days_in_month(year: i32, month: u32) -> Result<u32, ValidationError> {
    let first = first_day(year, month)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(ValidationError::YearOutOfRange(year))?;
    Ok(next.signed_duration_since(first).num_days() as u32)
}

/// All dates of the month, ascending
pub fn month_dates(year: i32, month: u32) -> Result<Vec<NaiveDate>, ValidationError> {
    let first = first_day(year, month)?;
    let len = days_in_month(year, month)?;
    Ok(first.iter_days().take(len as usize).collect())
}

/// Classify every day of the month.
///
/// Stops at the first conflicting date; nothing partial is returned.
pub fn aggregate(
    year: i32,
    month: u32,
    policy: WeekendPolicy,
    sets: &DateSets,
) -> Result<MonthlyAttendance, ValidationError> {
    let dates = month_dates(year, month)?;
    let mut days = Vec::with_capacity(dates.len());
    let mut summary = MonthSummary::default();

    for date in dates {
        let status = resolve(date, policy, sets)?;
        summary.record(status.kind);
        days.push(status);
    }

    debug_assert_eq!(summary.total() as usize, days.len());
    debug_assert!(days.iter().all(|d| d.date.month() == month));

    Ok(MonthlyAttendance {
        year,
        month,
        policy,
        days,
        summary,
    })
}
