//! Attendance month blocks.
//!
//! Each employee has one sheet per year; month *m* occupies three columns
//! starting at `3(m-1)+1`, rows 1..=41:
//!
//! ```text
//! row 1      | February-25 (merged over 3 cols) |
//! row 2      | EID (merged 2)         | 13536906 |
//! row 3      | Employee Name          | Sudhir   |
//! rows 4-9   | Days Worked ... PH     | counts   |
//! row 10     | Remarks                | text     |
//! rows 11-41 | 01-Feb     | Sat       | WO       |
//! ```
//!
//! Replacing a block clears exactly its rectangle (merges included) before
//! writing, so other months and other sheets are never touched.

use chrono::Month;
use rollcall_core::{DayKind, Employee, MonthlyAttendance};
use tracing::debug;

use crate::style::{BorderLine, Edge, Rgb, Role, StyleTable};
use crate::workbook::{CellValue, Rect, Sheet, Workbook};
use crate::RenderError;

pub const HEADER_ROW: u32 = 1;
pub const EID_ROW: u32 = 2;
pub const NAME_ROW: u32 = 3;
pub const SUMMARY_START_ROW: u32 = 4;
pub const REMARKS_ROW: u32 = 10;
pub const DAILY_START_ROW: u32 = 11;
/// Row of day 31; every block spans up to here regardless of month length
pub const LAST_ROW: u32 = DAILY_START_ROW + 30;
pub const COLS_PER_MONTH: u16 = 3;

pub const SUMMARY_LABELS: [&str; 6] = [
    "Days Worked",
    "Total Working Days",
    "Leaves",
    "WO Worked",
    "Comp Off",
    "PH",
];

/// First column of a month's block. `month` must be 1..=12.
pub fn start_col(month: u32) -> u16 {
    debug_assert!((1..=12).contains(&month), "month {month} out of range");
    (month.saturating_sub(1) as u16) * COLS_PER_MONTH + 1
}

/// Rectangle owned by a month's block
pub fn block_region(month: u32) -> Rect {
    let start = start_col(month);
    Rect::new(HEADER_ROW, start, LAST_ROW, start + COLS_PER_MONTH - 1)
}

/// "February-25"
pub fn month_header(year: i32, month: u32) -> String {
    let name = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Month");
    format!("{name}-{:02}", year.rem_euclid(100))
}

/// One daily row of a block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayLine {
    /// "01-Feb"
    pub label: String,
    /// "Sat"
    pub weekday: String,
    /// Status code ("P", "WO", ...)
    pub code: String,
}

/// Content of one month block, ready to be written
#[derive(Clone, Debug, PartialEq)]
pub struct MonthBlock {
    pub month: u32,
    pub header: String,
    pub employee_id: String,
    pub employee_name: String,
    pub summary: [(&'static str, u32); 6],
    pub remark: String,
    pub days: Vec<DayLine>,
}

impl MonthBlock {
    pub fn new(employee: &Employee, attendance: &MonthlyAttendance, remark: &str) -> Self {
        let s = &attendance.summary;
        let values = [
            s.worked(),
            s.total_working_days(),
            s.leave,
            s.week_off_worked,
            s.comp_off,
            s.public_holiday,
        ];

        let mut summary = [("", 0); 6];
        for (slot, (label, value)) in summary
            .iter_mut()
            .zip(SUMMARY_LABELS.into_iter().zip(values))
        {
            *slot = (label, value);
        }

        let days = attendance
            .days
            .iter()
            .map(|d| DayLine {
                label: d.date.format("%d-%b").to_string(),
                weekday: d.weekday.to_string(),
                code: d.kind.code().to_string(),
            })
            .collect();

        Self {
            month: attendance.month,
            header: month_header(attendance.year, attendance.month),
            employee_id: employee.employee_id.clone(),
            employee_name: employee.employee_name.clone(),
            summary,
            remark: remark.to_string(),
            days,
        }
    }

    pub fn region(&self) -> Rect {
        block_region(self.month)
    }
}

/// Clear a block's rectangle and write `block` into it. Returns the region.
pub fn replace_block(
    sheet: &mut Sheet,
    styles: &mut StyleTable,
    block: &MonthBlock,
) -> Result<Rect, RenderError> {
    let region = block.region();
    let removed = sheet.clear_region(region);
    debug!(
        sheet = %sheet.name,
        region = %region,
        merges_removed = removed.len(),
        "cleared month block"
    );

    let start = region.first_col;
    let value_col = region.last_col;

    let header = styles.role(Role::MonthHeader);
    sheet.merge(Rect::new(HEADER_ROW, start, HEADER_ROW, value_col))?;
    sheet.fill_blank(Rect::new(HEADER_ROW, start, HEADER_ROW, value_col), header);
    sheet.write(HEADER_ROW, start, block.header.as_str(), Some(header));

    write_label_value(sheet, styles, EID_ROW, start, "EID", block.employee_id.as_str().into())?;
    write_label_value(
        sheet,
        styles,
        NAME_ROW,
        start,
        "Employee Name",
        block.employee_name.as_str().into(),
    )?;
    for (offset, (label, value)) in (0..).zip(block.summary) {
        write_label_value(sheet, styles, SUMMARY_START_ROW + offset, start, label, value.into())?;
    }
    write_label_value(sheet, styles, REMARKS_ROW, start, "Remarks", block.remark.as_str().into())?;

    let day_label = styles.role(Role::DayLabel);
    let day_status = styles.role(Role::DayStatus);
    for i in 0..=(LAST_ROW - DAILY_START_ROW) {
        let row = DAILY_START_ROW + i;
        match block.days.get(i as usize) {
            Some(day) => {
                sheet.write(row, start, day.label.as_str(), Some(day_label));
                sheet.write(row, start + 1, day.weekday.as_str(), Some(day_label));
                sheet.write(row, value_col, day.code.as_str(), Some(day_status));
            }
            None => {
                sheet.write(row, start, CellValue::Blank, Some(day_label));
                sheet.write(row, start + 1, CellValue::Blank, Some(day_label));
                sheet.write(row, value_col, CellValue::Blank, Some(day_status));
            }
        }
    }

    let bottom = DAILY_START_ROW + block.days.len().max(1) as u32 - 1;
    sheet.outline(
        styles,
        Rect::new(HEADER_ROW, start, bottom, value_col),
        Edge::new(BorderLine::Thick).color(Rgb::BLACK),
    );

    Ok(region)
}

fn write_label_value(
    sheet: &mut Sheet,
    styles: &mut StyleTable,
    row: u32,
    start: u16,
    label: &str,
    value: CellValue,
) -> Result<(), RenderError> {
    let label_style = styles.role(Role::BlockLabel);
    let value_style = styles.role(Role::BlockValue);

    sheet.merge(Rect::new(row, start, row, start + 1))?;
    sheet.write(row, start, label, Some(label_style));
    sheet.write(row, start + 1, CellValue::Blank, Some(label_style));
    sheet.write(row, start + 2, value, Some(value_style));
    Ok(())
}

/// Write (or rewrite) an employee's month into the workbook
pub fn write_month(
    workbook: &mut Workbook,
    employee: &Employee,
    attendance: &MonthlyAttendance,
    remark: &str,
) -> Result<Rect, RenderError> {
    let block = MonthBlock::new(employee, attendance, remark);
    workbook.with_employee_sheet(employee, |sheet, styles| {
        replace_block(sheet, styles, &block)
    })
}

/// Status codes of a block's daily rows, in order, stopping at the first blank row
pub fn read_status_codes(sheet: &Sheet, month: u32) -> Vec<DayKind> {
    let col = block_region(month).last_col;
    (DAILY_START_ROW..=LAST_ROW)
        .map_while(|row| sheet.text(row, col).and_then(DayKind::from_code))
        .collect()
}
