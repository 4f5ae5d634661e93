//! # rollcall-render
//!
//! Workbook model and report layouts for rollcall.
//!
//! This crate provides:
//! - An in-memory workbook model (typed cells, interned styles, merge index,
//!   images, comments, hyperlinks, owner metadata per sheet)
//! - The attendance month-block layout and its region replacement
//! - The timesheet sheet layout
//! - XLSX serialization via `rust_xlsxwriter`
//!
//! ## Example
//!
//! ```rust,ignore
//! use rollcall_core::{aggregate, DateSets, Employee, WeekendPolicy};
//! use rollcall_render::{attendance, ExcelRenderer, Workbook};
//!
//! let employee = Employee::new("13536906", "Sudhir Kumar");
//! let month = aggregate(2025, 2, WeekendPolicy::AllOff, &DateSets::new())?;
//!
//! let mut workbook = Workbook::new();
//! attendance::write_month(&mut workbook, &employee, &month, "")?;
//!
//! let xlsx_bytes = ExcelRenderer::new().render(&workbook)?;
//! std::fs::write("attendance-2025.xlsx", xlsx_bytes)?;
//! ```

pub mod attendance;
pub mod excel;
pub mod style;
pub mod timesheet;
pub mod workbook;

pub use attendance::{block_region, replace_block, MonthBlock};
pub use excel::ExcelRenderer;
pub use style::{CellStyle, Role, StyleId, StyleTable};
pub use timesheet::{timesheet_sheet_name, TimesheetLayout};
pub use workbook::{
    sanitize_sheet_name, Cell, CellValue, Comment, Hyperlink, Image, ImageAnchor, MergeIndex,
    Rect, Sheet, Workbook,
};

use thiserror::Error;

/// MIME type of the produced documents
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Spreadsheet column letters for a zero-based column index
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col);
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn col_to_letter_works() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(8), "I");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(36), "AK");
        assert_eq!(col_to_letter(52), "BA");
    }
}
