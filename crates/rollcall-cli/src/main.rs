//! rollcall CLI - Attendance & Timesheet Workbooks
//!
//! Command-line driver for merging employee-months into the yearly
//! containers and exporting XLSX reports.

mod config;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rollcall_core::{
    AttendanceRequest, EmployeeDirectory, InMemoryDirectory, TimesheetRequest, WeekendPolicy,
};
use rollcall_render::TimesheetLayout;
use rollcall_store::{
    export, export_employee, AttendanceService, Report, ReportKind, TimesheetService,
    WorkbookStore,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{load_directory, Config};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(author, version, about = "Attendance and timesheet workbooks", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ./rollcall.toml when present)
    #[arg(short, long, value_name = "FILE", env = "ROLLCALL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the yearly containers
    #[arg(long, value_name = "DIR", env = "ROLLCALL_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Employee seed file (.json or .toml)
    #[arg(long, value_name = "FILE", env = "ROLLCALL_EMPLOYEES", global = true)]
    employees: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one employee-month into the attendance workbook
    Attendance(AttendanceArgs),

    /// Write one employee-month timesheet
    Timesheet(TimesheetArgs),

    /// Export a stored workbook, whole or for one employee
    Extract {
        /// Report kind (attendance, timesheet)
        #[arg(short, long)]
        kind: ReportKind,

        #[arg(short, long)]
        year: i32,

        /// Only this employee's sheets
        #[arg(short, long)]
        employee: Option<String>,

        /// Output file (default: <kind>-<year>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List known employees
    Employees,
}

#[derive(Args)]
struct PeriodArgs {
    /// Employee id
    #[arg(short, long, required_unless_present = "request")]
    employee: Option<String>,

    #[arg(short, long, required_unless_present = "request")]
    year: Option<i32>,

    /// Month number (1-12)
    #[arg(short, long, required_unless_present = "request")]
    month: Option<u32>,

    /// Saturday policy: FIRST_THIRD, SECOND_FOURTH, ALL_OFF, NONE (or 1-4)
    #[arg(short, long, default_value = "NONE")]
    policy: WeekendPolicy,

    /// Leave dates (YYYY-MM-DD, comma separated or repeated)
    #[arg(long, value_delimiter = ',')]
    leave: Vec<String>,

    /// Output file (default: <kind>-<year>.xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct AttendanceArgs {
    /// Read the request as JSON from FILE ("-" for stdin) instead of flags
    #[arg(long, value_name = "FILE", conflicts_with_all = ["employee", "year", "month"])]
    request: Option<PathBuf>,

    #[command(flatten)]
    period: PeriodArgs,

    /// Public holidays
    #[arg(long, value_delimiter = ',')]
    holiday: Vec<String>,

    /// Compensatory off days
    #[arg(long, value_delimiter = ',')]
    comp_off: Vec<String>,

    /// Policy off-days that were worked
    #[arg(long, value_delimiter = ',')]
    week_off_worked: Vec<String>,

    /// Remark for the month
    #[arg(long)]
    remark: Option<String>,
}

#[derive(Args)]
struct TimesheetArgs {
    /// Read the request as JSON from FILE ("-" for stdin) instead of flags
    #[arg(long, value_name = "FILE", conflicts_with_all = ["employee", "year", "month"])]
    request: Option<PathBuf>,

    #[command(flatten)]
    period: PeriodArgs,

    /// Holiday as DATE or DATE=REMARK (repeatable)
    #[arg(long)]
    holiday: Vec<String>,

    /// Manager approval text
    #[arg(long, default_value = "")]
    approval: String,
}

impl AttendanceArgs {
    fn into_request(self) -> Result<AttendanceRequest> {
        if let Some(path) = &self.request {
            return read_request(path);
        }
        let p = self.period;
        Ok(AttendanceRequest {
            employee_id: p.employee.unwrap_or_default(),
            year: p.year.unwrap_or_default(),
            month: p.month.unwrap_or_default(),
            leave_dates: p.leave,
            week_off_dates: self.week_off_worked,
            comp_off: self.comp_off,
            public_holidays: self.holiday,
            remarks: self.remark,
            saturday_weekoff: p.policy,
        })
    }
}

impl TimesheetArgs {
    fn into_request(self) -> Result<TimesheetRequest> {
        if let Some(path) = &self.request {
            return read_request(path);
        }
        let p = self.period;
        let (holidays, remarks): (Vec<String>, Vec<String>) = self
            .holiday
            .iter()
            .map(|raw| match raw.split_once('=') {
                Some((date, remark)) => (date.trim().to_string(), remark.trim().to_string()),
                None => (raw.trim().to_string(), String::new()),
            })
            .unzip();
        Ok(TimesheetRequest {
            employee_id: p.employee.unwrap_or_default(),
            year: p.year.unwrap_or_default(),
            month: p.month.unwrap_or_default(),
            manager_approval: self.approval,
            holidays,
            leave_dates: p.leave,
            remarks,
            saturday_weekoff: p.policy,
        })
    }
}

fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("Invalid request {}", path.display()))
}

fn save(report: &Report, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(report.file_name()));
    fs::write(&path, &report.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = report.bytes.len(), "wrote report");
    println!("{}", path.display());
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(file) = cli.employees {
        config.employees = Some(file);
    }
    debug!(?config, "loaded configuration");

    let directory: InMemoryDirectory = load_directory(config.employees.as_deref())?;
    let store = WorkbookStore::new(&config.data_dir).timeout(config.io_timeout());

    match cli.command {
        Commands::Attendance(args) => {
            let output = args.period.output.clone();
            let request = args.into_request()?;
            let report = AttendanceService::new(&store, &directory).generate(&request)?;
            save(&report, output)?;
        }
        Commands::Timesheet(args) => {
            let output = args.period.output.clone();
            let request = args.into_request()?;

            let mut layout = TimesheetLayout::new();
            if let Some(logo) = config.logo_bytes()? {
                layout = layout.logo(logo);
            }
            if let Some(label) = &config.timesheet.client_label {
                layout = layout.client_label(label.as_str());
            }

            let report = TimesheetService::new(&store, &directory)
                .layout(layout)
                .generate(&request)?;
            save(&report, output)?;
        }
        Commands::Extract {
            kind,
            year,
            employee,
            output,
        } => {
            let report = match employee {
                Some(id) => export_employee(&store, &directory, kind, year, &id)?,
                None => export(&store, kind, year)?,
            };
            save(&report, output)?;
        }
        Commands::Employees => {
            for employee in directory.all() {
                println!(
                    "{}\t{}\t{}",
                    employee.employee_id, employee.employee_name, employee.email
                );
            }
        }
    }

    Ok(())
}
