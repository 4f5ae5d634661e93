//! Request flows: validate, merge into the year container, hand back the
//! employee's sheets.
//!
//! Everything a request needs lives on the stack of `generate`; services
//! only borrow the store and the directory, so one service can serve
//! concurrent requests.

use rollcall_core::{
    aggregate, plan_timesheet, AttendanceRequest, Employee, EmployeeDirectory, TimesheetRequest,
};
use rollcall_render::{attendance, ExcelRenderer, TimesheetLayout, XLSX_MIME};
use tracing::info;

use crate::extract::extract;
use crate::store::{ReportKind, WorkbookStore};
use crate::StoreError;

/// A finished XLSX document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub year: i32,
    pub bytes: Vec<u8>,
}

impl Report {
    pub const MIME: &'static str = XLSX_MIME;

    /// "attendance-2025.xlsx"
    pub fn file_name(&self) -> String {
        self.kind.file_name(self.year)
    }

    pub fn mime(&self) -> &'static str {
        Self::MIME
    }
}

fn find_employee(directory: &dyn EmployeeDirectory, id: &str) -> Result<Employee, StoreError> {
    directory
        .find(id)
        .ok_or_else(|| StoreError::EmployeeNotFound(id.to_string()))
}

/// Writes attendance month blocks
pub struct AttendanceService<'a> {
    store: &'a WorkbookStore,
    directory: &'a dyn EmployeeDirectory,
}

impl<'a> AttendanceService<'a> {
    pub fn new(store: &'a WorkbookStore, directory: &'a dyn EmployeeDirectory) -> Self {
        Self { store, directory }
    }

    /// Merge the requested month into the employee's sheet and return all
    /// of that employee's attendance for the year.
    ///
    /// Lookup, parsing and classification all happen before the container
    /// is touched; any failure there leaves storage as it was.
    pub fn generate(&self, request: &AttendanceRequest) -> Result<Report, StoreError> {
        let employee = find_employee(self.directory, &request.employee_id)?;
        let sets = request.date_sets()?;
        let month = aggregate(
            request.year,
            request.month,
            request.saturday_weekoff,
            &sets,
        )?;

        // Rendered before the commit: a sheet that cannot be written out is never stored
        let bytes = self
            .store
            .update(ReportKind::Attendance, request.year, |container| {
                attendance::write_month(
                    &mut container.workbook,
                    &employee,
                    &month,
                    request.remark_text(),
                )?;
                let extracted = extract(&container.workbook, &employee.employee_id);
                Ok(ExcelRenderer::new().render(&extracted)?)
            })?;

        info!(
            employee = %employee.employee_id,
            year = request.year,
            month = request.month,
            worked = month.summary.worked(),
            "attendance updated"
        );
        Ok(Report {
            kind: ReportKind::Attendance,
            year: request.year,
            bytes,
        })
    }
}

/// Writes timesheet sheets
pub struct TimesheetService<'a> {
    store: &'a WorkbookStore,
    directory: &'a dyn EmployeeDirectory,
    layout: TimesheetLayout,
}

impl<'a> TimesheetService<'a> {
    pub fn new(store: &'a WorkbookStore, directory: &'a dyn EmployeeDirectory) -> Self {
        Self {
            store,
            directory,
            layout: TimesheetLayout::new(),
        }
    }

    /// Use a custom sheet layout (logo, client label)
    pub fn layout(mut self, layout: TimesheetLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the employee's sheet for the month and return every
    /// timesheet of that employee for the year
    pub fn generate(&self, request: &TimesheetRequest) -> Result<Report, StoreError> {
        let employee = find_employee(self.directory, &request.employee_id)?;
        let sets = request.date_sets()?;
        let remarks = request.holiday_remarks()?;
        let plan = plan_timesheet(
            request.year,
            request.month,
            request.saturday_weekoff,
            &sets,
            &remarks,
            &request.manager_approval,
        )?;

        self.layout.validate()?;

        let (sheet, bytes) =
            self.store
                .update(ReportKind::Timesheet, request.year, |container| {
                    let sheet = self.layout.write(&mut container.workbook, &employee, &plan)?;
                    let extracted = extract(&container.workbook, &employee.employee_id);
                    Ok((sheet, ExcelRenderer::new().render(&extracted)?))
                })?;

        info!(
            employee = %employee.employee_id,
            sheet = %sheet,
            hours = %plan.total_hours,
            "timesheet updated"
        );
        Ok(Report {
            kind: ReportKind::Timesheet,
            year: request.year,
            bytes,
        })
    }
}

/// Render a whole stored container
pub fn export(store: &WorkbookStore, kind: ReportKind, year: i32) -> Result<Report, StoreError> {
    let container = store.open(kind, year)?;
    Ok(Report {
        kind,
        year,
        bytes: ExcelRenderer::new().render(&container.workbook)?,
    })
}

/// Render one employee's sheets from a stored container
pub fn export_employee(
    store: &WorkbookStore,
    directory: &dyn EmployeeDirectory,
    kind: ReportKind,
    year: i32,
    employee_id: &str,
) -> Result<Report, StoreError> {
    let employee = find_employee(directory, employee_id)?;
    let container = store.open(kind, year)?;
    Ok(Report {
        kind,
        year,
        bytes: crate::extract_bytes(&container.workbook, &employee.employee_id)?,
    })
}
