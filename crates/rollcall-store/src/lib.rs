//! # rollcall-store
//!
//! Durable report containers and the request flows built on them.
//!
//! A container holds one report kind for one year (`attendance-2025`,
//! `timesheet-2025`). Requests merge a single employee-month into it,
//! region by region, and get back the employee's sheets as XLSX.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rollcall_core::{AttendanceRequest, InMemoryDirectory, Employee, WeekendPolicy};
//! use rollcall_store::{AttendanceService, WorkbookStore};
//!
//! let directory: InMemoryDirectory = [Employee::new("13536906", "Sudhir Kumar")]
//!     .into_iter()
//!     .collect();
//! let store = WorkbookStore::new("./data");
//! let service = AttendanceService::new(&store, &directory);
//!
//! let request = AttendanceRequest::new("13536906", 2025, 2)
//!     .policy(WeekendPolicy::AllOff)
//!     .holidays(&["2025-02-26"]);
//! let report = service.generate(&request)?;
//! std::fs::write(report.file_name(), &report.bytes)?;
//! ```

pub mod extract;
pub mod service;
pub mod store;

pub use extract::{extract, extract_bytes};
pub use service::{export, export_employee, AttendanceService, Report, TimesheetService};
pub use store::{Container, ReportKind, WorkbookStore};

use std::path::PathBuf;
use std::time::Duration;

use rollcall_core::ValidationError;
use rollcall_render::RenderError;
use thiserror::Error;

/// Errors from container storage and report generation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt container {}: {reason}", path.display())]
    CorruptContainer { path: PathBuf, reason: String },

    #[error("Timed out after {after:?} on {}", path.display())]
    Timeout { path: PathBuf, after: Duration },

    #[error("Container {} changed underneath us (opened at revision {expected}, found {found})", path.display())]
    StaleRevision {
        path: PathBuf,
        expected: u64,
        found: u64,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl StoreError {
    /// True when the request itself is at fault (bad input, unknown employee)
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::EmployeeNotFound(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_faults() {
        let invalid = StoreError::from(ValidationError::MonthOutOfRange(13));
        assert!(invalid.is_client_fault());
        assert!(StoreError::EmployeeNotFound("42".into()).is_client_fault());

        let io = StoreError::io(
            "data/attendance-2025.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!io.is_client_fault());
        assert!(io.to_string().contains("attendance-2025.json"));
    }

    #[test]
    fn validation_message_passes_through() {
        let err = StoreError::from(ValidationError::YearOutOfRange(1800));
        assert_eq!(
            err.to_string(),
            ValidationError::YearOutOfRange(1800).to_string()
        );
    }
}
