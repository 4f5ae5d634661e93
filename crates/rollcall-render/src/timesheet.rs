//! Timesheet sheet layout.
//!
//! One sheet per employee-month, rebuilt from scratch on every request.
//! Columns B..I (1..=8) hold everything; column A stays empty.

use chrono::Month;
use rollcall_core::{Employee, TimesheetPlan};
use tracing::debug;

use crate::style::{BorderLine, Edge, Rgb, Role, StyleTable};
use crate::workbook::{CellValue, Image, ImageAnchor, Rect, Sheet, Workbook};
use crate::excel::check_image;
use crate::{sanitize_sheet_name, RenderError};

pub const FIRST_COL: u16 = 1;
pub const LAST_COL: u16 = 8;
pub const TITLE_ROW: u32 = 1;
pub const INFO_START_ROW: u32 = 5;
pub const STATS_START_ROW: u32 = 10;
pub const PERIOD_HEADER_ROW: u32 = 16;
pub const PERIOD_VALUE_ROW: u32 = 17;
pub const CLIENT_ROW: u32 = 18;
pub const TABLE_HEADER_ROW: u32 = 19;
pub const FIRST_DAY_ROW: u32 = 20;

const YEAR_COL: u16 = 5;
const MONTH_COL: u16 = 6;

pub const TITLE: &str = "TIMESHEET CALCULATOR";
pub const LUNCH_NOTE: &str = "Note: For Regular workday, Inclusive of 30 minutes of lunch break.";
pub const TABLE_HEADERS: [&str; 8] = [
    "Day",
    "Date",
    "In Time",
    "Out Time",
    "Duration  (Hrs)",
    "Activity",
    "Manager Approval",
    "Remarks",
];

const COLUMN_WIDTHS: [(u16, f64); 9] = [
    (0, 4.0),
    (1, 14.0),
    (2, 10.0),
    (3, 10.0),
    (4, 10.0),
    (5, 15.0),
    (6, 16.0),
    (7, 18.0),
    (8, 26.0),
];

/// Grey band behind the employee and stats rows
pub fn info_band() -> Rect {
    Rect::new(4, FIRST_COL, 13, LAST_COL)
}

/// "Sudhir, Feb 2025"
pub fn timesheet_sheet_name(employee: &Employee, year: i32, month: u32) -> String {
    let short = month_name(month).get(..3).unwrap_or("");
    sanitize_sheet_name(&format!("{}, {short} {year}", employee.first_name()))
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}

/// Timesheet layout options
#[derive(Clone, Debug, Default)]
pub struct TimesheetLayout {
    /// PNG/JPEG shown next to the title
    pub logo: Option<Vec<u8>>,
    /// Text of the shaded label cell under the period box
    pub client_label: Option<String>,
}

impl TimesheetLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the logo image bytes
    pub fn logo(mut self, bytes: Vec<u8>) -> Self {
        self.logo = Some(bytes);
        self
    }

    /// Set the client label
    pub fn client_label(mut self, label: impl Into<String>) -> Self {
        self.client_label = Some(label.into());
        self
    }

    /// Check the layout's own inputs (the logo) before any sheet is built
    pub fn validate(&self) -> Result<(), RenderError> {
        match &self.logo {
            Some(bytes) => check_image(bytes),
            None => Ok(()),
        }
    }

    /// Build the employee's sheet for the month and put it in the workbook,
    /// replacing the previous sheet for the same employee and month.
    /// Returns the sheet name.
    pub fn write(
        &self,
        workbook: &mut Workbook,
        employee: &Employee,
        plan: &TimesheetPlan,
    ) -> Result<String, RenderError> {
        let sheet = self.build(&mut workbook.styles, employee, plan)?;
        let name = workbook.replace_month_sheet(sheet).name.clone();
        debug!(sheet = %name, days = plan.days.len(), "wrote timesheet");
        Ok(name)
    }

    /// Build a detached sheet; styles are interned into `styles`
    pub fn build(
        &self,
        styles: &mut StyleTable,
        employee: &Employee,
        plan: &TimesheetPlan,
    ) -> Result<Sheet, RenderError> {
        let mut sheet = Sheet::new(timesheet_sheet_name(employee, plan.year, plan.month))
            .owned_by(&employee.employee_id)
            .for_month(plan.month);

        for (col, width) in COLUMN_WIDTHS {
            sheet.set_column_width(col, width);
        }

        self.write_title(&mut sheet, styles)?;
        write_info(&mut sheet, styles, employee, plan)?;
        self.write_period(&mut sheet, styles, plan);
        let last_day_row = write_table(&mut sheet, styles, plan);
        write_footer(&mut sheet, styles, last_day_row + 1)?;

        Ok(sheet)
    }

    fn write_title(&self, sheet: &mut Sheet, styles: &mut StyleTable) -> Result<(), RenderError> {
        let title = styles.role(Role::Title);
        let span = Rect::new(TITLE_ROW, FIRST_COL, TITLE_ROW, LAST_COL);
        sheet.merge(span)?;
        sheet.fill_blank(span, title);
        sheet.write(TITLE_ROW, FIRST_COL, TITLE, Some(title));
        sheet.set_row_height(TITLE_ROW, 30.0);

        if let Some(bytes) = &self.logo {
            sheet.add_image(Image {
                bytes: bytes.clone(),
                anchor: ImageAnchor {
                    row: TITLE_ROW,
                    col: 3,
                    x_offset: 0,
                    y_offset: 2,
                    width: 64.0,
                    height: 36.0,
                },
            });
        }
        Ok(())
    }

    fn write_period(&self, sheet: &mut Sheet, styles: &mut StyleTable, plan: &TimesheetPlan) {
        let header = styles.role(Role::PeriodHeader);
        let value = styles.role(Role::PeriodValue);

        sheet.write(PERIOD_HEADER_ROW, YEAR_COL, "YEAR", Some(header));
        sheet.write(PERIOD_HEADER_ROW, MONTH_COL, "MONTH", Some(header));
        sheet.write(PERIOD_VALUE_ROW, YEAR_COL, f64::from(plan.year), Some(value));
        sheet.write(PERIOD_VALUE_ROW, MONTH_COL, month_name(plan.month), Some(value));

        if let Some(label) = &self.client_label {
            let style = styles.role(Role::ClientLabel);
            sheet.write(CLIENT_ROW, MONTH_COL, label.as_str(), Some(style));
        }
    }
}

/// Label merged over B..C, value merged over D..I
fn labeled_row(
    sheet: &mut Sheet,
    styles: &mut StyleTable,
    row: u32,
    label: &str,
    value: CellValue,
) -> Result<(), RenderError> {
    let label_style = styles.role(Role::InfoLabel);
    let value_style = styles.role(Role::InfoValue);

    sheet.merge(Rect::new(row, FIRST_COL, row, FIRST_COL + 1))?;
    sheet.merge(Rect::new(row, FIRST_COL + 2, row, LAST_COL))?;
    sheet.write(row, FIRST_COL, label, Some(label_style));
    sheet.write(row, FIRST_COL + 2, value, Some(value_style));
    Ok(())
}

fn write_info(
    sheet: &mut Sheet,
    styles: &mut StyleTable,
    employee: &Employee,
    plan: &TimesheetPlan,
) -> Result<(), RenderError> {
    let info: [(&str, &str); 4] = [
        ("Employee Name:", &employee.employee_name),
        ("Employee ID:", &employee.employee_id),
        ("Email id:", &employee.email),
        ("Joining Date:", &employee.joining_date),
    ];
    for (row, (label, value)) in (INFO_START_ROW..).zip(info) {
        labeled_row(sheet, styles, row, label, value.into())?;
    }

    let stats = [
        ("Regular Work", plan.regular_work_days.to_string()),
        ("Total Hours", format!("{:.2}", plan.total_hours)),
        ("Leave", plan.leave_days.to_string()),
    ];
    for (row, (label, value)) in (STATS_START_ROW..).zip(stats) {
        labeled_row(sheet, styles, row, label, value.into())?;
    }

    let band = info_band();
    sheet.shade(styles, band, Rgb::GREY_25);
    sheet.outline(styles, band, Edge::new(BorderLine::Double));
    Ok(())
}

/// Header plus one row per day. Returns the last day row.
fn write_table(sheet: &mut Sheet, styles: &mut StyleTable, plan: &TimesheetPlan) -> u32 {
    let header = styles.role(Role::TableHeader);
    for (col, text) in (FIRST_COL..).zip(TABLE_HEADERS) {
        sheet.write(TABLE_HEADER_ROW, col, text, Some(header));
    }
    let double = Edge::new(BorderLine::Double);
    sheet.outline(
        styles,
        Rect::new(TABLE_HEADER_ROW, FIRST_COL, TABLE_HEADER_ROW, LAST_COL),
        double,
    );

    let work = styles.role(Role::WorkRow);
    let off = styles.role(Role::OffRow);
    let mut row = FIRST_DAY_ROW;
    for day in &plan.days {
        let style = if day.activity.is_non_working() { off } else { work };
        let (in_time, out_time, hours) = match day.shift {
            Some(shift) => (
                shift.start.to_string(),
                shift.end.to_string(),
                format!("{:.2}", shift.hours()),
            ),
            None => (String::new(), String::new(), String::new()),
        };

        let cells = [
            day.day_name(),
            day.date_label(),
            in_time,
            out_time,
            hours,
            day.activity.label().to_string(),
            day.manager_approval.clone(),
            day.remark.clone(),
        ];
        for (col, text) in (FIRST_COL..).zip(cells) {
            sheet.write(row, col, text, Some(style));
        }
        row += 1;
    }

    let last = row.saturating_sub(1).max(FIRST_DAY_ROW);
    sheet.outline(
        styles,
        Rect::new(FIRST_DAY_ROW, FIRST_COL, last, LAST_COL),
        double.color(Rgb::BLACK),
    );
    last
}

/// Lunch note, then the signature and stamp boxes
fn write_footer(sheet: &mut Sheet, styles: &mut StyleTable, note_row: u32) -> Result<(), RenderError> {
    let plain = styles.role(Role::Plain);
    sheet.merge(Rect::new(note_row, FIRST_COL, note_row, LAST_COL))?;
    sheet.write(note_row, FIRST_COL, LUNCH_NOTE, Some(plain));

    let signature = note_row + 5;
    let stamp = signature + 5;
    let left = FIRST_COL;
    let right = 6;

    sheet.write(signature, left, "Customer Signature", Some(plain));
    sheet.write(signature, right, "Employee Signature", Some(plain));
    sheet.write(signature + 1, left, "Date", Some(plain));
    sheet.write(signature + 1, right, "Date", Some(plain));
    sheet.write(stamp, left, "Customer Stamp", Some(plain));
    sheet.write(stamp, right, "Checked by Onsite Project Manager", Some(plain));
    sheet.write(stamp + 1, right, "Date", Some(plain));

    // Two grey boxes (B..E and G..I) with a gap column; the right box skips
    // the spacer row under the signature dates
    for row in (signature - 2)..=(stamp + 1) {
        for col in FIRST_COL..=LAST_COL {
            let in_gap = col == 5;
            let in_spacer = row == signature + 2 && col >= right;
            if !in_gap && !in_spacer {
                sheet.shade(styles, Rect::cell(row, col), Rgb::GREY_25);
            }
        }
    }
    for row in signature..=(stamp + 1) {
        sheet.merge(Rect::new(row, left, row, 4))?;
        sheet.merge(Rect::new(row, right, row, LAST_COL))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rollcall_core::{plan_timesheet, DateSets, WeekendPolicy};
    use std::collections::BTreeMap;

    fn employee() -> Employee {
        Employee::new("13536906", "Sudhir Kumar")
            .email("sudhir.y.kumar@example.com")
            .joining_date("21-Feb-2022")
    }

    fn plan(month: u32) -> TimesheetPlan {
        let holiday = NaiveDate::from_ymd_opt(2025, 2, 26).unwrap();
        let (sets, remarks) = if month == 2 {
            (
                DateSets::new().public_holidays([holiday]),
                BTreeMap::from([(holiday, "Maha Shivaratri".to_string())]),
            )
        } else {
            (DateSets::new(), BTreeMap::new())
        };
        plan_timesheet(2025, month, WeekendPolicy::SecondFourth, &sets, &remarks, "Yes").unwrap()
    }

    #[test]
    fn sheet_name_format() {
        assert_eq!(timesheet_sheet_name(&employee(), 2025, 2), "Sudhir, Feb 2025");
        assert_eq!(timesheet_sheet_name(&employee(), 2025, 9), "Sudhir, Sep 2025");
    }

    #[test]
    fn layout_positions() {
        let mut styles = StyleTable::new();
        let sheet = TimesheetLayout::new()
            .client_label("GRSE")
            .build(&mut styles, &employee(), &plan(2))
            .unwrap();

        assert_eq!(sheet.owner.as_deref(), Some("13536906"));
        assert_eq!(sheet.month, Some(2));
        assert_eq!(sheet.text(TITLE_ROW, 1), Some(TITLE));
        assert_eq!(sheet.text(INFO_START_ROW, 1), Some("Employee Name:"));
        assert_eq!(sheet.text(INFO_START_ROW, 3), Some("Sudhir Kumar"));
        assert_eq!(sheet.text(INFO_START_ROW + 3, 3), Some("21-Feb-2022"));
        assert_eq!(sheet.text(STATS_START_ROW + 1, 1), Some("Total Hours"));
        assert_eq!(sheet.text(STATS_START_ROW + 1, 3), Some("181.00"));
        assert_eq!(sheet.text(PERIOD_VALUE_ROW, MONTH_COL), Some("February"));
        assert_eq!(sheet.value(PERIOD_VALUE_ROW, YEAR_COL), Some(&CellValue::Number(2025.0)));
        assert_eq!(sheet.text(CLIENT_ROW, MONTH_COL), Some("GRSE"));
        assert_eq!(sheet.text(TABLE_HEADER_ROW, 5), Some("Duration  (Hrs)"));

        // Feb 1 is a worked Saturday, Feb 26 a holiday with its remark
        assert_eq!(sheet.text(FIRST_DAY_ROW, 1), Some("Sat"));
        assert_eq!(sheet.text(FIRST_DAY_ROW, 4), Some("13:00"));
        assert_eq!(sheet.text(FIRST_DAY_ROW, 5), Some("5.00"));
        assert_eq!(sheet.text(FIRST_DAY_ROW + 25, 6), Some("Holiday"));
        assert_eq!(sheet.text(FIRST_DAY_ROW + 25, 8), Some("Maha Shivaratri"));
        assert_eq!(sheet.text(FIRST_DAY_ROW + 25, 3), Some(""));

        let note_row = FIRST_DAY_ROW + 28;
        assert_eq!(sheet.text(note_row, 1), Some(LUNCH_NOTE));
        assert_eq!(sheet.text(note_row + 5, 1), Some("Customer Signature"));
        assert_eq!(sheet.text(note_row + 10, 6), Some("Checked by Onsite Project Manager"));
        assert!(sheet.images.is_empty());
    }

    #[test]
    fn non_working_rows_are_shaded() {
        let mut styles = StyleTable::new();
        let sheet = TimesheetLayout::new()
            .build(&mut styles, &employee(), &plan(2))
            .unwrap();

        // Feb 2 (Sunday) vs Feb 3 (Monday), middle column
        let sunday = styles.get(sheet.style_at(FIRST_DAY_ROW + 1, 4).unwrap()).unwrap();
        let monday = styles.get(sheet.style_at(FIRST_DAY_ROW + 2, 4).unwrap()).unwrap();
        assert_eq!(sunday.fill, Some(Rgb::GREY_25));
        assert_eq!(monday.fill, None);
        assert_eq!(monday.borders.left.line, BorderLine::Dashed);
    }

    #[test]
    fn logo_is_anchored_next_to_title() {
        let mut styles = StyleTable::new();
        let sheet = TimesheetLayout::new()
            .logo(vec![1, 2, 3])
            .build(&mut styles, &employee(), &plan(3))
            .unwrap();
        assert_eq!(sheet.images.len(), 1);
        assert_eq!(sheet.images[0].anchor.row, TITLE_ROW);
        assert_eq!(sheet.images[0].anchor.col, 3);
    }

    #[test]
    fn logo_must_be_an_image() {
        assert!(TimesheetLayout::new().validate().is_ok());
        let err = TimesheetLayout::new()
            .logo(b"not an image".to_vec())
            .validate()
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidData(_)));
    }

    #[test]
    fn rewrite_replaces_same_month_only() {
        let mut wb = Workbook::new();
        let layout = TimesheetLayout::new();
        layout.write(&mut wb, &employee(), &plan(2)).unwrap();
        layout.write(&mut wb, &employee(), &plan(3)).unwrap();
        let before = wb.clone();

        let name = layout.write(&mut wb, &employee(), &plan(2)).unwrap();
        assert_eq!(name, "Sudhir, Feb 2025");
        assert_eq!(wb.len(), 2);
        assert_eq!(wb, before);
    }
}
