//! Request objects and their validation.
//!
//! Field names are camelCase on the wire (`employeeId`, `leaveDates`, ...).
//! Dates are ISO-8601 strings; every one must fall inside the requested month.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::validate_period;
use crate::timesheet::HolidayRemarks;
use crate::{DateSetKind, DateSets, ValidationError, WeekendPolicy};

/// Attendance block for one employee-month
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceRequest {
    pub employee_id: String,
    pub year: i32,
    pub month: u32,
    pub leave_dates: Vec<String>,
    /// Policy off-days that were worked
    pub week_off_dates: Vec<String>,
    pub comp_off: Vec<String>,
    pub public_holidays: Vec<String>,
    pub remarks: Option<String>,
    pub saturday_weekoff: WeekendPolicy,
}

impl AttendanceRequest {
    pub fn new(employee_id: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            employee_id: employee_id.into(),
            year,
            month,
            ..Self::default()
        }
    }

    pub fn policy(mut self, policy: WeekendPolicy) -> Self {
        self.saturday_weekoff = policy;
        self
    }

    pub fn leave(mut self, dates: &[&str]) -> Self {
        self.leave_dates.extend(dates.iter().map(|d| d.to_string()));
        self
    }

    pub fn holidays(mut self, dates: &[&str]) -> Self {
        self.public_holidays.extend(dates.iter().map(|d| d.to_string()));
        self
    }

    pub fn comp_off(mut self, dates: &[&str]) -> Self {
        self.comp_off.extend(dates.iter().map(|d| d.to_string()));
        self
    }

    pub fn week_off_worked(mut self, dates: &[&str]) -> Self {
        self.week_off_dates.extend(dates.iter().map(|d| d.to_string()));
        self
    }

    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remarks = Some(remark.into());
        self
    }

    /// Validate the period and parse all four date lists
    pub fn date_sets(&self) -> Result<DateSets, ValidationError> {
        validate_period(self.year, self.month)?;

        let mut sets = DateSets::new();
        for (kind, values) in [
            (DateSetKind::Leave, &self.leave_dates),
            (DateSetKind::WeekOffWorked, &self.week_off_dates),
            (DateSetKind::CompOff, &self.comp_off),
            (DateSetKind::PublicHoliday, &self.public_holidays),
        ] {
            *sets.get_mut(kind) = parse_dates(kind.field(), values, self.year, self.month)?;
        }
        Ok(sets)
    }

    /// Remark text, blank when absent
    pub fn remark_text(&self) -> &str {
        self.remarks.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Timesheet for one employee-month
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimesheetRequest {
    pub employee_id: String,
    pub year: i32,
    pub month: u32,
    pub manager_approval: String,
    pub holidays: Vec<String>,
    pub leave_dates: Vec<String>,
    /// One remark per holiday, matched by position
    pub remarks: Vec<String>,
    pub saturday_weekoff: WeekendPolicy,
}

impl TimesheetRequest {
    pub fn new(employee_id: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            employee_id: employee_id.into(),
            year,
            month,
            ..Self::default()
        }
    }

    pub fn policy(mut self, policy: WeekendPolicy) -> Self {
        self.saturday_weekoff = policy;
        self
    }

    pub fn approval(mut self, text: impl Into<String>) -> Self {
        self.manager_approval = text.into();
        self
    }

    pub fn leave(mut self, dates: &[&str]) -> Self {
        self.leave_dates.extend(dates.iter().map(|d| d.to_string()));
        self
    }

    /// Add a holiday together with its remark
    pub fn holiday(mut self, date: &str, remark: impl Into<String>) -> Self {
        self.holidays.push(date.to_string());
        self.remarks.push(remark.into());
        self
    }

    /// Validate the period and parse holidays and leave
    pub fn date_sets(&self) -> Result<DateSets, ValidationError> {
        validate_period(self.year, self.month)?;
        Ok(DateSets {
            leave: parse_dates(
                DateSetKind::Leave.field(),
                &self.leave_dates,
                self.year,
                self.month,
            )?,
            public_holiday: parse_dates("holidays", &self.holidays, self.year, self.month)?,
            ..DateSets::default()
        })
    }

    /// Pair each holiday with the remark at the same list position.
    ///
    /// An empty remark list means no remarks; otherwise the counts must match.
    pub fn holiday_remarks(&self) -> Result<HolidayRemarks, ValidationError> {
        if !self.remarks.is_empty() && self.remarks.len() != self.holidays.len() {
            return Err(ValidationError::RemarkCountMismatch {
                holidays: self.holidays.len(),
                remarks: self.remarks.len(),
            });
        }

        let mut remarks = HolidayRemarks::new();
        for (i, raw) in self.holidays.iter().enumerate() {
            let date = parse_date("holidays", raw, self.year, self.month)?;
            let text = self.remarks.get(i).map(|r| r.trim().to_string());
            remarks.insert(date, text.unwrap_or_default());
        }
        Ok(remarks)
    }
}

fn parse_date(
    field: &'static str,
    raw: &str,
    year: i32,
    month: u32,
) -> Result<NaiveDate, ValidationError> {
    let value = raw.trim();
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })?;

    if date.year() != year || date.month() != month {
        return Err(ValidationError::DateOutsideMonth {
            field,
            value: value.to_string(),
            year,
            month,
        });
    }
    Ok(date)
}

/// Parse a list of ISO dates, skipping blank entries
fn parse_dates(
    field: &'static str,
    values: &[String],
    year: i32,
    month: u32,
) -> Result<BTreeSet<NaiveDate>, ValidationError> {
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date(field, v, year, month))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn attendance_request_from_json() {
        let json = r#"{
            "employeeId": "13536906",
            "year": 2025,
            "month": 2,
            "leaveDates": ["2025-02-10"],
            "publicHolidays": ["2025-02-26"],
            "saturdayWeekoff": "ALL_OFF"
        }"#;
        let req: AttendanceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.saturday_weekoff, WeekendPolicy::AllOff);
        assert!(req.comp_off.is_empty());

        let sets = req.date_sets().unwrap();
        assert_eq!(sets.leave, BTreeSet::from([date(2025, 2, 10)]));
        assert_eq!(sets.public_holiday, BTreeSet::from([date(2025, 2, 26)]));
        assert!(sets.week_off_worked.is_empty());
    }

    #[test]
    fn legacy_numeric_policy() {
        let json = r#"{"employeeId":"x","year":2025,"month":3,"saturdayWeekoff":1}"#;
        let req: TimesheetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.saturday_weekoff, WeekendPolicy::FirstThird);
    }

    #[test]
    fn invalid_date_names_field() {
        let req = AttendanceRequest::new("x", 2025, 2).comp_off(&["2025-02-31"]);
        assert_eq!(
            req.date_sets().unwrap_err(),
            ValidationError::InvalidDate {
                field: "compOff",
                value: "2025-02-31".to_string(),
            }
        );
    }

    #[test]
    fn date_outside_month() {
        let req = AttendanceRequest::new("x", 2025, 2).leave(&["2025-03-01"]);
        let err = req.date_sets().unwrap_err();
        assert_eq!(err.field(), Some("leaveDates"));
        assert!(matches!(err, ValidationError::DateOutsideMonth { .. }));
    }

    #[test]
    fn period_checked_first() {
        let req = AttendanceRequest::new("x", 2025, 0).leave(&["garbage"]);
        assert_eq!(req.date_sets().unwrap_err(), ValidationError::MonthOutOfRange(0));
    }

    #[test]
    fn blank_entries_skipped() {
        let req = AttendanceRequest::new("x", 2025, 2).leave(&["", "  ", "2025-02-03"]);
        assert_eq!(req.date_sets().unwrap().leave.len(), 1);
    }

    #[test]
    fn holiday_remarks_by_position() {
        let req = TimesheetRequest::new("x", 2025, 3)
            .holiday("2025-03-14", "Holi")
            .holiday("2025-03-31", "Id-ul-Fitr");
        let remarks = req.holiday_remarks().unwrap();
        assert_eq!(remarks[&date(2025, 3, 14)], "Holi");
        assert_eq!(remarks[&date(2025, 3, 31)], "Id-ul-Fitr");
    }

    #[test]
    fn remark_count_mismatch() {
        let mut req = TimesheetRequest::new("x", 2025, 3).holiday("2025-03-14", "Holi");
        req.holidays.push("2025-03-31".to_string());

        assert_eq!(
            req.holiday_remarks().unwrap_err(),
            ValidationError::RemarkCountMismatch {
                holidays: 2,
                remarks: 1,
            }
        );
    }

    #[test]
    fn holidays_without_remarks() {
        let mut req = TimesheetRequest::new("x", 2025, 3);
        req.holidays.push("2025-03-14".to_string());
        let remarks = req.holiday_remarks().unwrap();
        assert_eq!(remarks[&date(2025, 3, 14)], "");
    }

    #[test]
    fn timesheet_sets_only_leave_and_holidays() {
        let req = TimesheetRequest::new("x", 2025, 3)
            .leave(&["2025-03-04"])
            .holiday("2025-03-14", "Holi");
        let sets = req.date_sets().unwrap();
        assert_eq!(sets.leave.len(), 1);
        assert_eq!(sets.public_holiday.len(), 1);
        assert!(sets.comp_off.is_empty());
        assert!(sets.week_off_worked.is_empty());
    }
}
