//! Logging setup: human-readable console output plus a JSON log file per day.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Result;

const LOG_FILE_STEM: &str = "iotvas-discover";

/// Log file for `date` inside `log_dir`.
pub fn log_file_path(log_dir: &Path, date: NaiveDate) -> PathBuf {
    log_dir.join(format!("{LOG_FILE_STEM}.{}.log", date.format("%Y-%m-%d")))
}

fn open_log_file(log_dir: &Path, date: NaiveDate) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(log_dir, date))
}

/// Appends to the file of the day each record is written on, switching
/// files when the local date changes mid-run.
pub struct DailyLogFile {
    dir: PathBuf,
    current: Mutex<Option<(NaiveDate, File)>>,
}

impl DailyLogFile {
    /// Create `log_dir` if needed and open today's file.
    pub fn open(log_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let today = Local::now().date_naive();
        let file = open_log_file(log_dir, today)?;
        Ok(Self {
            dir: log_dir.to_path_buf(),
            current: Mutex::new(Some((today, file))),
        })
    }

    /// File currently written to.
    pub fn current_path(&self) -> Option<PathBuf> {
        let current = self.current.lock().ok()?;
        current.as_ref().map(|(date, _)| log_file_path(&self.dir, *date))
    }

    fn write_dated(&self, date: NaiveDate, buf: &[u8]) -> io::Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        if current.as_ref().map(|(d, _)| *d) != Some(date) {
            *current = Some((date, open_log_file(&self.dir, date)?));
        }
        match current.as_mut() {
            Some((_, file)) => file.write_all(buf),
            None => Ok(()),
        }
    }
}

/// Writer handed out per event by [`DailyLogFile`].
pub struct DailyLogWriter<'a> {
    target: &'a DailyLogFile,
}

impl Write for DailyLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.target.write_dated(Local::now().date_naive(), buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DailyLogFile {
    type Writer = DailyLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        DailyLogWriter { target: self }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// level for both outputs. Returns the log file in use at startup.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    let file = DailyLogFile::open(log_dir)?;
    let path = file
        .current_path()
        .unwrap_or_else(|| log_file_path(log_dir, Local::now().date_naive()));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().json().with_ansi(false).with_writer(file))
        .init();

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            log_file_path(Path::new("/var/log/iotvas"), date),
            PathBuf::from("/var/log/iotvas/iotvas-discover.2024-03-07.log")
        );
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");

        let file = DailyLogFile::open(&log_dir).unwrap();
        let path = file.current_path().unwrap();
        assert!(path.starts_with(&log_dir));
        assert!(path.exists());
    }

    #[test]
    fn test_records_after_midnight_go_to_the_new_day() {
        let dir = tempfile::tempdir().unwrap();
        let file = DailyLogFile::open(dir.path()).unwrap();
        let before = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();

        file.write_dated(before, b"late\n").unwrap();
        file.write_dated(after, b"early\n").unwrap();
        file.write_dated(after, b"later\n").unwrap();

        assert_eq!(
            fs::read_to_string(log_file_path(dir.path(), before)).unwrap(),
            "late\n"
        );
        assert_eq!(
            fs::read_to_string(log_file_path(dir.path(), after)).unwrap(),
            "early\nlater\n"
        );
        assert_eq!(file.current_path(), Some(log_file_path(dir.path(), after)));
    }
}
