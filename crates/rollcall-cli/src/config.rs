//! `rollcall.toml` and the employee seed file.
//!
//! ```toml
//! data_dir = "data"
//! employees = "employees.json"
//! io_timeout_secs = 10
//!
//! [timesheet]
//! logo = "logo.png"
//! client_label = "Acme Corp"
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rollcall_core::{Employee, InMemoryDirectory};
use serde::Deserialize;

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "rollcall.toml";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: PathBuf,
    pub employees: Option<PathBuf>,
    pub io_timeout_secs: u64,
    pub timesheet: TimesheetConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimesheetConfig {
    pub logo: Option<PathBuf>,
    pub client_label: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            employees: None,
            io_timeout_secs: 10,
            timesheet: TimesheetConfig::default(),
        }
    }
}

impl Config {
    /// Load `path`, or `rollcall.toml` from the working directory when it
    /// exists, or the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.data_dir = resolve(self.data_dir);
        self.employees = self.employees.map(resolve);
        self.timesheet.logo = self.timesheet.logo.map(resolve);
        self
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    /// Logo bytes, when a logo is configured
    pub fn logo_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.timesheet
            .logo
            .as_deref()
            .map(|path| {
                fs::read(path).with_context(|| format!("Failed to read logo {}", path.display()))
            })
            .transpose()
    }
}

#[derive(Deserialize)]
struct EmployeeTable {
    #[serde(default, rename = "employee")]
    employees: Vec<Employee>,
}

/// Read employees from a JSON array or a TOML file of `[[employee]]` tables.
/// No file means an empty directory.
pub fn load_directory(path: Option<&Path>) -> Result<InMemoryDirectory> {
    let Some(path) = path else {
        return Ok(InMemoryDirectory::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read employees {}", path.display()))?;

    let employees: Vec<Employee> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("Invalid employee list {}", path.display()))?,
        Some("toml") => {
            toml::from_str::<EmployeeTable>(&text)
                .with_context(|| format!("Invalid employee list {}", path.display()))?
                .employees
        }
        _ => bail!(
            "Unsupported employee file {} (expected .json or .toml)",
            path.display()
        ),
    };
    Ok(employees.into_iter().collect())
}
