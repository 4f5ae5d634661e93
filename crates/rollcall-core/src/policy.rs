//! Day classification.
//!
//! Every calendar date maps to exactly one [`DayKind`]. Priority, highest first:
//!
//! 1. public holiday
//! 2. leave
//! 3. Sunday (worked if listed in the week-off-worked set)
//! 4. policy off-Saturday (same override)
//! 5. compensatory off
//! 6. present

use chrono::{Datelike, NaiveDate, Weekday};

use crate::{DateSetKind, DateSets, DayKind, DayStatus, ValidationError, WeekendPolicy};

/// Which Saturday of its month a date is (1-based), `None` for other weekdays.
///
/// The ordinal is `ceil(day / 7)`, so the 29th..31st are a 5th Saturday.
pub fn saturday_ordinal(date: NaiveDate) -> Option<u32> {
    (date.weekday() == Weekday::Sat).then(|| (date.day() - 1) / 7 + 1)
}

impl WeekendPolicy {
    /// Whether the policy makes this date a Saturday off
    pub fn is_off_saturday(self, date: NaiveDate) -> bool {
        match (self, saturday_ordinal(date)) {
            (_, None) => false,
            (WeekendPolicy::FirstThird, Some(n)) => n == 1 || n == 3,
            (WeekendPolicy::SecondFourth, Some(n)) => n == 2 || n == 4,
            (WeekendPolicy::AllOff, Some(_)) => true,
            (WeekendPolicy::None, Some(_)) => false,
        }
    }

    /// Sundays plus the Saturdays selected by the policy
    pub fn is_off_day(self, date: NaiveDate) -> bool {
        date.weekday() == Weekday::Sun || self.is_off_saturday(date)
    }
}

/// Classify a single date. Pure; does not check conflicts.
pub fn classify(date: NaiveDate, policy: WeekendPolicy, sets: &DateSets) -> DayStatus {
    let worked_override = sets.contains(DateSetKind::WeekOffWorked, date);
    let off_kind = if worked_override {
        DayKind::WeekOffWorked
    } else {
        DayKind::WeekOff
    };

    let kind = if sets.contains(DateSetKind::PublicHoliday, date) {
        DayKind::PublicHoliday
    } else if sets.contains(DateSetKind::Leave, date) {
        DayKind::Leave
    } else if policy.is_off_day(date) {
        off_kind
    } else if sets.contains(DateSetKind::CompOff, date) {
        DayKind::CompOff
    } else {
        DayKind::Present
    };

    DayStatus::new(date, kind)
}

/// Reject a policy off-Saturday that is also marked holiday, leave or comp-off.
///
/// The week-off-worked set is the only way to put something on such a day.
pub fn check_conflict(
    date: NaiveDate,
    policy: WeekendPolicy,
    sets: &DateSets,
) -> Result<(), ValidationError> {
    if !policy.is_off_saturday(date) {
        return Ok(());
    }

    for conflict in [
        DateSetKind::PublicHoliday,
        DateSetKind::Leave,
        DateSetKind::CompOff,
    ] {
        if sets.contains(conflict, date) {
            return Err(ValidationError::OffDayConflict { date, conflict });
        }
    }
    Ok(())
}

/// [`check_conflict`] followed by [`classify`]
pub fn resolve(
    date: NaiveDate,
    policy: WeekendPolicy,
    sets: &DateSets,
) -> Result<DayStatus, ValidationError> {
    check_conflict(date, policy, sets)?;
    Ok(classify(date, policy, sets))
}
