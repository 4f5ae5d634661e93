//! # rollcall-core
//!
//! Core domain model for the rollcall attendance and timesheet engine.
//!
//! This crate provides:
//! - Domain types: `Employee`, `WeekendPolicy`, `DateSets`, `DayStatus`, `MonthSummary`
//! - Day classification (`policy::classify`) and conflict validation
//! - Monthly aggregation (`aggregate::aggregate`) and timesheet planning
//! - Request parsing with field-identifying validation errors
//! - The `EmployeeDirectory` lookup seam
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rollcall_core::{aggregate, DateSets, WeekendPolicy};
//!
//! let sets = DateSets::new()
//!     .public_holidays([NaiveDate::from_ymd_opt(2025, 2, 26).unwrap()])
//!     .leave([NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()]);
//!
//! let month = aggregate(2025, 2, WeekendPolicy::AllOff, &sets).unwrap();
//! assert_eq!(month.days.len(), 28);
//! assert_eq!(month.summary.total_working_days(), 19);
//! ```

pub mod aggregate;
pub mod policy;
pub mod request;
pub mod timesheet;

pub use aggregate::{aggregate, days_in_month, MonthlyAttendance};
pub use policy::{check_conflict, classify, resolve, saturday_ordinal};
pub use request::{AttendanceRequest, TimesheetRequest};
pub use timesheet::{plan_timesheet, Activity, TimesheetDay, TimesheetPlan};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Opaque employee identifier (e.g. "13536906", "TRE-604")
pub type EmployeeId = String;

/// Earliest year a request may target
pub const MIN_YEAR: i32 = 1900;

/// Latest year a request may target
pub const MAX_YEAR: i32 = 2100;

// ============================================================================
// Employee
// ============================================================================

/// An employee record from the directory.
///
/// Read-only for this crate: looked up by id, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Opaque identifier
    pub employee_id: EmployeeId,
    /// Display name ("Sudhir Kumar")
    pub employee_name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// Joining date as recorded by HR (free-form, e.g. "21-Feb-2022")
    #[serde(default)]
    pub joining_date: String,
}

impl Employee {
    /// Create a new employee with the given id and display name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            employee_id: id.into(),
            employee_name: name.into(),
            email: String::new(),
            joining_date: String::new(),
        }
    }

    /// Set the email
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Set the joining date
    pub fn joining_date(mut self, date: impl Into<String>) -> Self {
        self.joining_date = date.into();
        self
    }

    /// First word of the display name, or "Employee" when the name is blank
    pub fn first_name(&self) -> &str {
        self.employee_name
            .split_whitespace()
            .next()
            .unwrap_or("Employee")
    }
}

/// Read-only employee lookup
pub trait EmployeeDirectory: Send + Sync {
    /// Find an employee by identifier
    fn find(&self, id: &str) -> Option<Employee>;

    /// All employees, ordered by identifier
    fn all(&self) -> Vec<Employee>;
}

/// Directory backed by an in-memory map (seed data, tests)
#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    employees: BTreeMap<EmployeeId, Employee>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an employee
    pub fn insert(&mut self, employee: Employee) {
        self.employees
            .insert(employee.employee_id.clone(), employee);
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}

impl FromIterator<Employee> for InMemoryDirectory {
    fn from_iter<I: IntoIterator<Item = Employee>>(iter: I) -> Self {
        let mut directory = Self::new();
        for employee in iter {
            directory.insert(employee);
        }
        directory
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn find(&self, id: &str) -> Option<Employee> {
        self.employees.get(id).cloned()
    }

    fn all(&self) -> Vec<Employee> {
        self.employees.values().cloned().collect()
    }
}

// ============================================================================
// Weekend Policy
// ============================================================================

/// Which Saturdays of a month are days off. Sundays are always off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PolicyRepr", into = "&'static str")]
pub enum WeekendPolicy {
    /// 1st and 3rd Saturdays off
    FirstThird,
    /// 2nd and 4th Saturdays off
    SecondFourth,
    /// Every Saturday off
    AllOff,
    /// Every Saturday is a normal work day
    #[default]
    None,
}

impl WeekendPolicy {
    pub const ALL: [WeekendPolicy; 4] = [
        WeekendPolicy::FirstThird,
        WeekendPolicy::SecondFourth,
        WeekendPolicy::AllOff,
        WeekendPolicy::None,
    ];

    /// Wire code of the policy
    pub fn code(self) -> &'static str {
        match self {
            WeekendPolicy::FirstThird => "FIRST_THIRD",
            WeekendPolicy::SecondFourth => "SECOND_FOURTH",
            WeekendPolicy::AllOff => "ALL_OFF",
            WeekendPolicy::None => "NONE",
        }
    }

    /// Numeric codes used by the legacy request format (`saturdayWeekoff`).
    /// `0` is what an omitted field used to deserialize to.
    pub fn from_legacy_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(WeekendPolicy::FirstThird),
            2 => Some(WeekendPolicy::SecondFourth),
            3 => Some(WeekendPolicy::AllOff),
            0 | 4 => Some(WeekendPolicy::None),
            _ => None,
        }
    }
}

impl std::fmt::Display for WeekendPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for WeekendPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_legacy_code(code)
                .ok_or_else(|| ValidationError::UnknownPolicy(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownPolicy(s.to_string()))
    }
}

impl From<WeekendPolicy> for &'static str {
    fn from(policy: WeekendPolicy) -> Self {
        policy.code()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyRepr {
    Code(String),
    Legacy(u8),
}

impl TryFrom<PolicyRepr> for WeekendPolicy {
    type Error = ValidationError;

    fn try_from(repr: PolicyRepr) -> Result<Self, Self::Error> {
        match repr {
            PolicyRepr::Code(code) => code.parse(),
            PolicyRepr::Legacy(n) => Self::from_legacy_code(n)
                .ok_or_else(|| ValidationError::UnknownPolicy(n.to_string())),
        }
    }
}

// ============================================================================
// Date Sets
// ============================================================================

/// The four caller-supplied date sets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateSetKind {
    Leave,
    PublicHoliday,
    CompOff,
    WeekOffWorked,
}

impl DateSetKind {
    /// Request field carrying this set
    pub fn field(self) -> &'static str {
        match self {
            DateSetKind::Leave => "leaveDates",
            DateSetKind::PublicHoliday => "publicHolidays",
            DateSetKind::CompOff => "compOff",
            DateSetKind::WeekOffWorked => "weekOffDates",
        }
    }
}

impl std::fmt::Display for DateSetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateSetKind::Leave => write!(f, "leave"),
            DateSetKind::PublicHoliday => write!(f, "public holiday"),
            DateSetKind::CompOff => write!(f, "comp off"),
            DateSetKind::WeekOffWorked => write!(f, "week-off worked"),
        }
    }
}

/// Calendar facts for one employee-month
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSets {
    pub leave: BTreeSet<NaiveDate>,
    pub public_holiday: BTreeSet<NaiveDate>,
    pub comp_off: BTreeSet<NaiveDate>,
    /// Policy off-days the employee worked anyway
    pub week_off_worked: BTreeSet<NaiveDate>,
}

impl DateSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add leave dates
    pub fn leave(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.leave.extend(dates);
        self
    }

    /// Add public holidays
    pub fn public_holidays(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.public_holiday.extend(dates);
        self
    }

    /// Add compensatory-off dates
    pub fn comp_off(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.comp_off.extend(dates);
        self
    }

    /// Add explicit week-off-worked overrides
    pub fn week_off_worked(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.week_off_worked.extend(dates);
        self
    }

    /// The set of the given kind
    pub fn get(&self, kind: DateSetKind) -> &BTreeSet<NaiveDate> {
        match kind {
            DateSetKind::Leave => &self.leave,
            DateSetKind::PublicHoliday => &self.public_holiday,
            DateSetKind::CompOff => &self.comp_off,
            DateSetKind::WeekOffWorked => &self.week_off_worked,
        }
    }

    pub fn get_mut(&mut self, kind: DateSetKind) -> &mut BTreeSet<NaiveDate> {
        match kind {
            DateSetKind::Leave => &mut self.leave,
            DateSetKind::PublicHoliday => &mut self.public_holiday,
            DateSetKind::CompOff => &mut self.comp_off,
            DateSetKind::WeekOffWorked => &mut self.week_off_worked,
        }
    }

    pub fn contains(&self, kind: DateSetKind, date: NaiveDate) -> bool {
        self.get(kind).contains(&date)
    }
}

// ============================================================================
// Day Status
// ============================================================================

/// Classification of a single calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayKind {
    Present,
    Leave,
    PublicHoliday,
    WeekOff,
    /// A policy off-day that was worked
    WeekOffWorked,
    CompOff,
}

impl DayKind {
    pub const ALL: [DayKind; 6] = [
        DayKind::Present,
        DayKind::Leave,
        DayKind::PublicHoliday,
        DayKind::WeekOff,
        DayKind::WeekOffWorked,
        DayKind::CompOff,
    ];

    /// Short code written into the daily rows of the attendance block
    pub fn code(self) -> &'static str {
        match self {
            DayKind::Present => "P",
            DayKind::Leave => "L",
            DayKind::PublicHoliday => "PH",
            DayKind::WeekOff => "WO",
            DayKind::WeekOffWorked => "WOW",
            DayKind::CompOff => "CO",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// Whether the employee worked on this day
    pub fn is_worked(self) -> bool {
        matches!(self, DayKind::Present | DayKind::WeekOffWorked)
    }
}

impl std::fmt::Display for DayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayKind::Present => write!(f, "Present"),
            DayKind::Leave => write!(f, "Leave"),
            DayKind::PublicHoliday => write!(f, "Public Holiday"),
            DayKind::WeekOff => write!(f, "Week Off"),
            DayKind::WeekOffWorked => write!(f, "Week Off Worked"),
            DayKind::CompOff => write!(f, "Comp Off"),
        }
    }
}

/// Classified calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub kind: DayKind,
    pub weekday: Weekday,
}

impl DayStatus {
    pub fn new(date: NaiveDate, kind: DayKind) -> Self {
        Self {
            date,
            kind,
            weekday: date.weekday(),
        }
    }
}

// ============================================================================
// Month Summary
// ============================================================================

/// Per-classification counts for one month
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub present: u32,
    pub leave: u32,
    pub public_holiday: u32,
    pub week_off: u32,
    pub week_off_worked: u32,
    pub comp_off: u32,
}

impl MonthSummary {
    /// Count one more day of the given kind
    pub fn record(&mut self, kind: DayKind) {
        *self.slot(kind) += 1;
    }

    pub fn count(&self, kind: DayKind) -> u32 {
        match kind {
            DayKind::Present => self.present,
            DayKind::Leave => self.leave,
            DayKind::PublicHoliday => self.public_holiday,
            DayKind::WeekOff => self.week_off,
            DayKind::WeekOffWorked => self.week_off_worked,
            DayKind::CompOff => self.comp_off,
        }
    }

    fn slot(&mut self, kind: DayKind) -> &mut u32 {
        match kind {
            DayKind::Present => &mut self.present,
            DayKind::Leave => &mut self.leave,
            DayKind::PublicHoliday => &mut self.public_holiday,
            DayKind::WeekOff => &mut self.week_off,
            DayKind::WeekOffWorked => &mut self.week_off_worked,
            DayKind::CompOff => &mut self.comp_off,
        }
    }

    /// Sum over all classifications; equals the number of days in the month
    pub fn total(&self) -> u32 {
        DayKind::ALL.into_iter().map(|k| self.count(k)).sum()
    }

    /// Days actually worked, including worked week-offs ("Days Worked")
    pub fn worked(&self) -> u32 {
        self.present + self.week_off_worked
    }

    /// `worked + leave + compOff - weekOffWorked`.
    ///
    /// Worked week-offs are taken back out of the working-day total; this is
    /// the payroll convention the reports have always used.
    pub fn total_working_days(&self) -> u32 {
        (self.worked() + self.leave + self.comp_off) - self.week_off_worked
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Client-fault errors. Raised before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} contains invalid date format: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("{field} contains date not matching the request year/month {year}-{month:02}: {value}")]
    DateOutsideMonth {
        field: &'static str,
        value: String,
        year: i32,
        month: u32,
    },

    #[error("year: {0} is outside {MIN_YEAR}..={MAX_YEAR}")]
    YearOutOfRange(i32),

    #[error("month: {0} must be between 1 and 12")]
    MonthOutOfRange(u32),

    #[error("holidays and remarks must have same count (holidays: {holidays}, remarks: {remarks})")]
    RemarkCountMismatch { holidays: usize, remarks: usize },

    #[error("unknown weekend policy: {0}")]
    UnknownPolicy(String),

    #[error("Saturday {date} is a week-off under the weekend policy and cannot be marked as {conflict}")]
    OffDayConflict { date: NaiveDate, conflict: DateSetKind },
}

impl ValidationError {
    /// Request field the error refers to, when there is one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::InvalidDate { field, .. }
            | ValidationError::DateOutsideMonth { field, .. } => Some(*field),
            ValidationError::YearOutOfRange(_) => Some("year"),
            ValidationError::MonthOutOfRange(_) => Some("month"),
            ValidationError::RemarkCountMismatch { .. } => Some("remarks"),
            ValidationError::UnknownPolicy(_) => Some("saturdayWeekoff"),
            ValidationError::OffDayConflict { conflict, .. } => Some(conflict.field()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn employee_builder() {
        let emp = Employee::new("13536906", "Sudhir Kumar")
            .email("sudhir.y.kumar@example.com")
            .joining_date("21-Feb-2022");

        assert_eq!(emp.employee_id, "13536906");
        assert_eq!(emp.first_name(), "Sudhir");
        assert_eq!(emp.joining_date, "21-Feb-2022");
    }

    #[test]
    fn employee_first_name_blank() {
        let emp = Employee::new("x", "   ");
        assert_eq!(emp.first_name(), "Employee");
    }

    #[test]
    fn in_memory_directory_lookup() {
        let dir: InMemoryDirectory = [
            Employee::new("TRE-604", "Niraj Kumar Thakur"),
            Employee::new("IKT7152", "Ashish Kumar"),
        ]
        .into_iter()
        .collect();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.find("TRE-604").unwrap().employee_name, "Niraj Kumar Thakur");
        assert!(dir.find("nobody").is_none());
        // Ordered by id
        assert_eq!(dir.all()[0].employee_id, "IKT7152");
    }

    #[test]
    fn employee_json_uses_camel_case() {
        let json = r#"{"employeeId":"15590","employeeName":"Sourav Saha","email":"s@x.com","joiningDate":"02-May-2022"}"#;
        let emp: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(emp.employee_id, "15590");
        assert_eq!(emp.joining_date, "02-May-2022");
    }

    #[test]
    fn policy_parses_codes_and_legacy_numbers() {
        assert_eq!("FIRST_THIRD".parse::<WeekendPolicy>().unwrap(), WeekendPolicy::FirstThird);
        assert_eq!("all_off".parse::<WeekendPolicy>().unwrap(), WeekendPolicy::AllOff);
        assert_eq!("2".parse::<WeekendPolicy>().unwrap(), WeekendPolicy::SecondFourth);
        assert_eq!("4".parse::<WeekendPolicy>().unwrap(), WeekendPolicy::None);
        assert!(matches!(
            "9".parse::<WeekendPolicy>(),
            Err(ValidationError::UnknownPolicy(_))
        ));
        assert!("SOMETIMES".parse::<WeekendPolicy>().is_err());
    }

    #[test]
    fn policy_serde_accepts_both_forms() {
        let p: WeekendPolicy = serde_json::from_str("\"SECOND_FOURTH\"").unwrap();
        assert_eq!(p, WeekendPolicy::SecondFourth);
        let p: WeekendPolicy = serde_json::from_str("3").unwrap();
        assert_eq!(p, WeekendPolicy::AllOff);
        assert_eq!(serde_json::to_string(&WeekendPolicy::None).unwrap(), "\"NONE\"");
    }

    #[test]
    fn day_kind_codes_round_trip() {
        for kind in DayKind::ALL {
            assert_eq!(DayKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(DayKind::from_code("X"), None);
    }

    #[test]
    fn summary_total_working_days_formula() {
        let mut summary = MonthSummary::default();
        for _ in 0..18 {
            summary.record(DayKind::Present);
        }
        summary.record(DayKind::Leave);
        summary.record(DayKind::WeekOffWorked);
        summary.record(DayKind::WeekOffWorked);
        summary.record(DayKind::CompOff);

        assert_eq!(summary.worked(), 20);
        // 20 + 1 + 1 - 2
        assert_eq!(summary.total_working_days(), 20);
        assert_eq!(summary.total(), 22);
    }

    #[test]
    fn date_sets_builder() {
        let sets = DateSets::new()
            .leave([date(2025, 2, 10)])
            .comp_off([date(2025, 2, 11)]);
        assert!(sets.contains(DateSetKind::Leave, date(2025, 2, 10)));
        assert!(sets.contains(DateSetKind::CompOff, date(2025, 2, 11)));
        assert!(!sets.contains(DateSetKind::PublicHoliday, date(2025, 2, 10)));
    }

    #[test]
    fn validation_error_names_field() {
        let err = ValidationError::OffDayConflict {
            date: date(2025, 2, 1),
            conflict: DateSetKind::PublicHoliday,
        };
        assert_eq!(err.field(), Some("publicHolidays"));
        assert!(err.to_string().contains("2025-02-01"));
    }
}
