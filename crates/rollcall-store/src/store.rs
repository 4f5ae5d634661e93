//! Year-scoped report containers on disk.
//!
//! Each container is a JSON snapshot of a [`Workbook`] at
//! `<data_dir>/<kind>-<year>.json`. Writers for the same (kind, year) are
//! serialized by an in-process lock held from open to commit; every snapshot
//! also carries a revision so a commit over a file that another process
//! rewrote in the meantime is rejected instead of clobbering it.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use rollcall_render::Workbook;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::StoreError;

/// Tag written into every snapshot
pub const FORMAT_TAG: &str = "rollcall-workbook";

/// Snapshot layout version
pub const FORMAT_VERSION: u32 = 1;

/// Default bound on a single durable read or write
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// The two report families, each with its own containers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Attendance,
    Timesheet,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attendance => "attendance",
            Self::Timesheet => "timesheet",
        }
    }

    /// "attendance-2025.xlsx"
    pub fn file_name(self, year: i32) -> String {
        format!("{}-{year}.xlsx", self.as_str())
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attendance" => Ok(Self::Attendance),
            "timesheet" => Ok(Self::Timesheet),
            other => Err(format!("unknown report kind: {other}")),
        }
    }
}

/// On-disk form of a container
#[derive(Deserialize)]
struct Snapshot {
    format: String,
    version: u32,
    kind: ReportKind,
    year: i32,
    revision: u64,
    workbook: Workbook,
}

/// Header fields only, for the revision check before a commit
#[derive(Deserialize)]
struct SnapshotHeader {
    revision: u64,
}

/// An opened container
#[derive(Clone, Debug)]
pub struct Container {
    kind: ReportKind,
    year: i32,
    revision: u64,
    path: PathBuf,
    pub workbook: Workbook,
}

impl Container {
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Revision the container was opened (or last committed) at; 0 if never stored
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Durable container storage rooted at a data directory
#[derive(Debug)]
pub struct WorkbookStore {
    data_dir: PathBuf,
    timeout: Duration,
    locks: Mutex<HashMap<(ReportKind, i32), Arc<Mutex<()>>>>,
    /// Delay before each I/O job starts
    #[cfg(test)]
    stall: Duration,
}

impl WorkbookStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            timeout: DEFAULT_IO_TIMEOUT,
            locks: Mutex::new(HashMap::new()),
            #[cfg(test)]
            stall: Duration::ZERO,
        }
    }

    /// Set the I/O timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn io_timeout(&self) -> Duration {
        self.timeout
    }

    /// Snapshot path for a container
    pub fn path_for(&self, kind: ReportKind, year: i32) -> PathBuf {
        self.data_dir.join(format!("{}-{year}.json", kind.as_str()))
    }

    /// Open, modify and commit a container while holding its writer lock.
    ///
    /// Nothing is committed when `f` fails.
    pub fn update<R>(
        &self,
        kind: ReportKind,
        year: i32,
        f: impl FnOnce(&mut Container) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let lock = self.lock_for(kind, year);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(%kind, year, "acquired container lock");

        let mut container = self.open(kind, year)?;
        let out = f(&mut container)?;
        self.commit(&mut container)?;
        Ok(out)
    }

    /// Load a container, or an empty one when nothing is stored yet
    pub fn open(&self, kind: ReportKind, year: i32) -> Result<Container, StoreError> {
        let path = self.path_for(kind, year);

        let job_path = path.clone();
        let bytes = self.run_io(&path, move || match fs::read(&job_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&job_path, e)),
        })?;

        let Some(bytes) = bytes else {
            debug!(path = %path.display(), "no stored container, starting empty");
            return Ok(Container {
                kind,
                year,
                revision: 0,
                path,
                workbook: Workbook::new(),
            });
        };

        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptContainer {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let mismatch = if snapshot.format != FORMAT_TAG {
            Some(format!("unexpected format tag {:?}", snapshot.format))
        } else if snapshot.version != FORMAT_VERSION {
            Some(format!("unsupported version {}", snapshot.version))
        } else if snapshot.kind != kind || snapshot.year != year {
            Some(format!(
                "holds {}-{} instead of {kind}-{year}",
                snapshot.kind, snapshot.year
            ))
        } else {
            None
        };
        if let Some(reason) = mismatch {
            return Err(StoreError::CorruptContainer { path, reason });
        }

        debug!(
            path = %path.display(),
            revision = snapshot.revision,
            sheets = snapshot.workbook.len(),
            "opened container"
        );
        Ok(Container {
            kind,
            year,
            revision: snapshot.revision,
            path,
            workbook: snapshot.workbook,
        })
    }

    /// Write the container back, replacing the stored file in full.
    ///
    /// Fails with [`StoreError::StaleRevision`] when the stored revision is
    /// no longer the one the container was opened at. The snapshot is staged
    /// in a temp file on the I/O worker and only renamed into place here,
    /// once the worker has reported back in time; after a
    /// [`StoreError::Timeout`] the stored file is left as it was.
    pub fn commit(&self, container: &mut Container) -> Result<(), StoreError> {
        let path = container.path.clone();
        let expected = container.revision;
        let next = expected + 1;

        let bytes = serde_json::to_vec(&SnapshotRef {
            format: FORMAT_TAG,
            version: FORMAT_VERSION,
            kind: container.kind,
            year: container.year,
            revision: next,
            workbook: &container.workbook,
        })
        .map_err(|e| StoreError::CorruptContainer {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let dir = self.data_dir.clone();
        let job_path = path.clone();
        let staged = self
            .run_io(&path, move || {
                let found = stored_revision(&job_path)?;
                if found != expected {
                    return Err(StoreError::StaleRevision {
                        path: job_path,
                        expected,
                        found,
                    });
                }
                stage(&dir, &bytes)
            })
            .map_err(|e| {
                if let StoreError::StaleRevision { found, .. } = &e {
                    warn!(path = %path.display(), expected, found, "stale container revision");
                }
                e
            })?;
        staged
            .persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;

        container.revision = next;
        info!(
            path = %path.display(),
            revision = next,
            sheets = container.workbook.len(),
            "committed container"
        );
        Ok(())
    }

    fn lock_for(&self, kind: ReportKind, year: i32) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry((kind, year)).or_default())
    }

    /// Run a blocking job on a worker thread, giving up after the timeout.
    /// A job that outlives the timeout still runs to completion, and its
    /// result is dropped on the worker.
    fn run_io<T: Send + 'static>(
        &self,
        path: &Path,
        job: impl FnOnce() -> Result<T, StoreError> + Send + 'static,
    ) -> Result<T, StoreError> {
        let (tx, rx) = mpsc::channel();
        #[cfg(test)]
        let stall = self.stall;
        thread::Builder::new()
            .name("rollcall-io".into())
            .spawn(move || {
                #[cfg(test)]
                thread::sleep(stall);
                let _ = tx.send(job());
            })
            .map_err(|e| StoreError::io(path, e))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(path = %path.display(), after = ?self.timeout, "container I/O timed out");
                Err(StoreError::Timeout {
                    path: path.to_path_buf(),
                    after: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(StoreError::io(
                path,
                io::Error::new(io::ErrorKind::Other, "I/O worker exited"),
            )),
        }
    }
}

/// Borrowed form of [`Snapshot`] for serializing without a clone
#[derive(Serialize)]
struct SnapshotRef<'a> {
    format: &'static str,
    version: u32,
    kind: ReportKind,
    year: i32,
    revision: u64,
    workbook: &'a Workbook,
}

/// Revision of the stored snapshot, 0 when there is none
fn stored_revision(path: &Path) -> Result<u64, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_slice::<SnapshotHeader>(&bytes)
        .map(|h| h.revision)
        .map_err(|e| StoreError::CorruptContainer {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Synced temp file in `dir`, ready to be renamed over the snapshot.
/// Dropping it unpersisted deletes it.
fn stage(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile, StoreError> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rollcall_render::Sheet;

    fn store() -> (tempfile::TempDir, WorkbookStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkbookStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn paths_are_keyed_by_kind_and_year() {
        let store = WorkbookStore::new("/srv/rollcall");
        assert_eq!(
            store.path_for(ReportKind::Attendance, 2025),
            PathBuf::from("/srv/rollcall/attendance-2025.json")
        );
        assert_eq!(
            store.path_for(ReportKind::Timesheet, 2024),
            PathBuf::from("/srv/rollcall/timesheet-2024.json")
        );
        assert_eq!(ReportKind::Timesheet.file_name(2025), "timesheet-2025.xlsx");
    }

    #[test]
    fn report_kind_parses() {
        assert_eq!("Attendance".parse::<ReportKind>(), Ok(ReportKind::Attendance));
        assert_eq!(" timesheet ".parse::<ReportKind>(), Ok(ReportKind::Timesheet));
        assert!("payroll".parse::<ReportKind>().is_err());
    }

    #[test]
    fn open_missing_is_empty() {
        let (_dir, store) = store();
        let container = store.open(ReportKind::Attendance, 2025).unwrap();
        assert_eq!(container.revision(), 0);
        assert!(container.workbook.is_empty());
    }

    #[test]
    fn commit_then_open_round_trips() {
        let (_dir, store) = store();
        let mut container = store.open(ReportKind::Attendance, 2025).unwrap();
        container
            .workbook
            .push_sheet(Sheet::new("Sudhir").owned_by("1"))
            .write(1, 1, "February-25", None);
        store.commit(&mut container).unwrap();
        assert_eq!(container.revision(), 1);

        let reopened = store.open(ReportKind::Attendance, 2025).unwrap();
        assert_eq!(reopened.revision(), 1);
        assert_eq!(reopened.workbook, container.workbook);
    }

    #[test]
    fn stale_commit_is_rejected() {
        let (_dir, store) = store();
        let mut first = store.open(ReportKind::Timesheet, 2025).unwrap();
        let mut second = store.open(ReportKind::Timesheet, 2025).unwrap();

        store.commit(&mut first).unwrap();
        let err = store.commit(&mut second).unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleRevision {
                expected: 0,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn garbage_is_corrupt() {
        let (dir, store) = store();
        fs::write(dir.path().join("attendance-2025.json"), b"not json").unwrap();
        assert!(matches!(
            store.open(ReportKind::Attendance, 2025),
            Err(StoreError::CorruptContainer { .. })
        ));
    }

    #[test]
    fn snapshot_for_another_year_is_corrupt() {
        let (dir, store) = store();
        let mut container = store.open(ReportKind::Attendance, 2024).unwrap();
        store.commit(&mut container).unwrap();
        fs::copy(
            dir.path().join("attendance-2024.json"),
            dir.path().join("attendance-2025.json"),
        )
        .unwrap();

        let err = store.open(ReportKind::Attendance, 2025).unwrap_err();
        match err {
            StoreError::CorruptContainer { reason, .. } => {
                assert!(reason.contains("attendance-2024"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_update_commits_nothing() {
        let (dir, store) = store();
        let result: Result<(), _> = store.update(ReportKind::Attendance, 2025, |c| {
            c.workbook.push_sheet(Sheet::new("Sudhir"));
            Err(StoreError::EmployeeNotFound("1".into()))
        });
        assert!(result.is_err());
        assert!(!dir.path().join("attendance-2025.json").exists());
    }

    fn stalled(store: WorkbookStore) -> WorkbookStore {
        let mut store = store.timeout(Duration::from_millis(20));
        store.stall = Duration::from_millis(300);
        store
    }

    #[test]
    fn slow_open_times_out() {
        let (_dir, store) = store();
        let store = stalled(store);
        let err = store.open(ReportKind::Attendance, 2025).unwrap_err();
        assert!(matches!(err, StoreError::Timeout { after, .. } if after == Duration::from_millis(20)));
    }

    #[test]
    fn timed_out_commit_leaves_nothing_behind() {
        let (dir, store) = store();
        let mut container = store.open(ReportKind::Attendance, 2025).unwrap();
        container.workbook.push_sheet(Sheet::new("Sudhir").owned_by("1"));

        let store = stalled(store);
        let err = store.commit(&mut container).unwrap_err();
        assert!(matches!(err, StoreError::Timeout { .. }));
        assert_eq!(container.revision(), 0);

        // Let the worker finish staging and drop its temp file
        thread::sleep(Duration::from_millis(600));
        let left: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(left.is_empty(), "{left:?}");
    }

    #[test]
    fn timed_out_commit_keeps_previous_snapshot() {
        let (dir, store) = store();
        let mut first = store.open(ReportKind::Timesheet, 2025).unwrap();
        store.commit(&mut first).unwrap();
        let path = dir.path().join("timesheet-2025.json");
        let before = fs::read(&path).unwrap();

        let mut second = store.open(ReportKind::Timesheet, 2025).unwrap();
        second.workbook.push_sheet(Sheet::new("Ann").owned_by("2"));
        let store = stalled(store);
        assert!(store.commit(&mut second).is_err());

        thread::sleep(Duration::from_millis(600));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
