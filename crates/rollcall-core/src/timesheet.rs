//! Timesheet day plan.
//!
//! Built on the same classification as attendance. Worked days get a fixed
//! shift (08:00-17:00, Saturdays 08:00-13:00) and their hours are summed
//! exactly with [`Decimal`].

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::{DateSets, DayKind, ValidationError, WeekendPolicy};

/// Remark per holiday date
pub type HolidayRemarks = BTreeMap<NaiveDate, String>;

/// Wall-clock time of day, minute precision
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Start and end of a worked day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl Shift {
    pub const WEEKDAY: Shift = Shift {
        start: ClockTime::new(8, 0),
        end: ClockTime::new(17, 0),
    };

    pub const SATURDAY: Shift = Shift {
        start: ClockTime::new(8, 0),
        end: ClockTime::new(13, 0),
    };

    /// Shift worked on the given weekday
    pub fn for_weekday(weekday: Weekday) -> Self {
        if weekday == Weekday::Sat {
            Self::SATURDAY
        } else {
            Self::WEEKDAY
        }
    }

    /// Duration in hours, two decimal places
    pub fn hours(self) -> Decimal {
        let minutes = self.end.minutes().saturating_sub(self.start.minutes());
        let mut hours = (Decimal::from(minutes) / Decimal::from(60)).round_dp(2);
        hours.rescale(2);
        hours
    }
}

/// Activity column of a timesheet row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activity {
    RegularWork,
    Leave,
    Holiday,
    WeekOff,
}

impl Activity {
    pub fn label(self) -> &'static str {
        match self {
            Activity::RegularWork => "Regular Work",
            Activity::Leave => "Leave",
            Activity::Holiday => "Holiday",
            Activity::WeekOff => "WeekOff",
        }
    }

    /// Rows that get the non-working shading
    pub fn is_non_working(self) -> bool {
        !matches!(self, Activity::RegularWork)
    }

    /// Comp-off and worked week-offs are ordinary work days on a timesheet
    pub fn from_kind(kind: DayKind) -> Self {
        match kind {
            DayKind::Present | DayKind::CompOff | DayKind::WeekOffWorked => Activity::RegularWork,
            DayKind::Leave => Activity::Leave,
            DayKind::PublicHoliday => Activity::Holiday,
            DayKind::WeekOff => Activity::WeekOff,
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the timesheet table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub activity: Activity,
    /// `None` on non-working days
    pub shift: Option<Shift>,
    pub manager_approval: String,
    pub remark: String,
}

impl TimesheetDay {
    /// "Mon", "Tue", ...
    pub fn day_name(&self) -> String {
        self.weekday.to_string()
    }

    /// Two-digit day of month
    pub fn date_label(&self) -> String {
        format!("{:02}", self.date.day())
    }

    pub fn hours(&self) -> Option<Decimal> {
        self.shift.map(Shift::hours)
    }
}

/// Timesheet for one employee-month
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetPlan {
    pub year: i32,
    pub month: u32,
    pub days: Vec<TimesheetDay>,
    pub regular_work_days: u32,
    pub leave_days: u32,
    pub total_hours: Decimal,
}

/// Lay out one month of timesheet rows.
///
/// Conflicts abort exactly as they do for attendance.
pub fn plan_timesheet(
    year: i32,
    month: u32,
    policy: WeekendPolicy,
    sets: &DateSets,
    remarks: &HolidayRemarks,
    manager_approval: &str,
) -> Result<TimesheetPlan, ValidationError> {
    let attendance = aggregate(year, month, policy, sets)?;

    let mut regular_work_days = 0;
    let mut leave_days = 0;
    let mut total_hours = Decimal::new(0, 2);

    let days = attendance
        .days
        .iter()
        .map(|status| {
            let activity = Activity::from_kind(status.kind);
            let shift = match activity {
                Activity::RegularWork => Some(Shift::for_weekday(status.weekday)),
                _ => None,
            };

            match activity {
                Activity::RegularWork => regular_work_days += 1,
                Activity::Leave => leave_days += 1,
                Activity::Holiday | Activity::WeekOff => {}
            }
            if let Some(shift) = shift {
                total_hours += shift.hours();
            }

            let remark = match activity {
                Activity::Holiday => remarks.get(&status.date).cloned().unwrap_or_default(),
                _ => String::new(),
            };

            TimesheetDay {
                date: status.date,
                weekday: status.weekday,
                activity,
                shift,
                manager_approval: manager_approval.to_string(),
                remark,
            }
        })
        .collect();

    Ok(TimesheetPlan {
        year,
        month,
        days,
        regular_work_days,
        leave_days,
        total_hours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn shift_hours() {
        assert_eq!(Shift::WEEKDAY.hours(), dec!(9.00));
        assert_eq!(Shift::SATURDAY.hours(), dec!(5.00));
        assert_eq!(Shift::WEEKDAY.hours().to_string(), "9.00");
        assert_eq!(Shift::WEEKDAY.start.to_string(), "08:00");
        assert_eq!(Shift::SATURDAY.end.to_string(), "13:00");
    }

    #[test]
    fn february_second_fourth() {
        let holiday = date(2025, 2, 26);
        let sets = DateSets::new()
            .public_holidays([holiday])
            .leave([date(2025, 2, 10)]);
        let remarks: HolidayRemarks = [(holiday, "Maha Shivaratri".to_string())].into();

        let plan = plan_timesheet(
            2025,
            2,
            WeekendPolicy::SecondFourth,
            &sets,
            &remarks,
            "Approved",
        )
        .unwrap();

        // Saturdays 1 and 15 worked (5h each), 8 and 22 off, 4 Sundays off
        assert_eq!(plan.days.len(), 28);
        assert_eq!(plan.leave_days, 1);
        assert_eq!(plan.regular_work_days, 20);
        assert_eq!(plan.total_hours, dec!(172.00));

        let first = &plan.days[0];
        assert_eq!(first.day_name(), "Sat");
        assert_eq!(first.date_label(), "01");
        assert_eq!(first.activity, Activity::RegularWork);
        assert_eq!(first.shift, Some(Shift::SATURDAY));

        assert_eq!(plan.days[7].activity, Activity::WeekOff);
        assert_eq!(plan.days[9].activity, Activity::Leave);
        assert_eq!(plan.days[9].hours(), None);

        let holiday_row = &plan.days[25];
        assert_eq!(holiday_row.activity, Activity::Holiday);
        assert_eq!(holiday_row.remark, "Maha Shivaratri");
        assert!(plan.days.iter().all(|d| d.manager_approval == "Approved"));
        assert!(plan.days[24].remark.is_empty());
    }

    #[test]
    fn conflict_is_rejected() {
        let sets = DateSets::new().leave([date(2025, 2, 1)]);
        let err = plan_timesheet(
            2025,
            2,
            WeekendPolicy::FirstThird,
            &sets,
            &HolidayRemarks::new(),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::OffDayConflict { .. }));
    }

    #[test]
    fn non_working_activities() {
        assert!(!Activity::RegularWork.is_non_working());
        assert!(Activity::Leave.is_non_working());
        assert!(Activity::Holiday.is_non_working());
        assert!(Activity::WeekOff.is_non_working());
    }
}
