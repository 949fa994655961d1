//! Failure reporting: the `FailureSink` seam and the JSON error log (made by FontLab https://www.fontlab.com/)

use std::env;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Keep at most this many entries on disk.
pub const MAX_ENTRIES: usize = 100;

pub const LOG_PATH_ENV: &str = "GFDL_LOG_PATH";

/// A caught failure on its way to a [`FailureSink`].
#[derive(Clone, Copy)]
pub struct Failure<'a> {
    pub message: &'a str,
    /// Rust type of `cause`, stored as `exceptionType`.
    pub exception_type: &'a str,
    pub cause: &'a (dyn StdError + 'a),
}

impl<'a> Failure<'a> {
    /// Capture `cause` together with its type name.
    pub fn new<E: StdError + 'a>(message: &'a str, cause: &'a E) -> Self {
        Self {
            message,
            exception_type: std::any::type_name::<E>(),
            cause,
        }
    }

    /// For causes only known as trait objects.
    pub fn of_type(
        message: &'a str,
        exception_type: &'a str,
        cause: &'a (dyn StdError + 'a),
    ) -> Self {
        Self {
            message,
            exception_type,
            cause,
        }
    }
}

/// Anything that wants to hear about caught failures.
pub trait FailureSink {
    fn record_failure(&self, failure: Failure<'_>);
}

/// Sink that only forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FailureSink for LogSink {
    fn record_failure(&self, failure: Failure<'_>) {
        error!(
            "{} ({}): {}",
            failure.message,
            failure.exception_type,
            render_chain(failure.cause).join(": ")
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub exception_message: String,
    #[serde(default)]
    pub exception_type: String,
    /// Messages of the underlying causes, outermost first.
    #[serde(default)]
    pub causes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub msg: String,
    pub data: ErrorData,
    pub epoch_ms: i64,
    pub level: String,
    pub id: String,
}

impl ErrorRecord {
    pub fn from_failure(failure: &Failure<'_>) -> Self {
        let mut chain = render_chain(failure.cause);
        let exception_message = chain.remove(0);
        Self {
            msg: failure.message.to_string(),
            data: ErrorData {
                exception_message,
                exception_type: failure.exception_type.to_string(),
                causes: chain,
            },
            epoch_ms: Utc::now().timestamp_millis(),
            level: "ERROR".to_string(),
            id: Uuid::new_v4().to_string(),
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.epoch_ms).single()
    }
}

fn render_chain(cause: &dyn StdError) -> Vec<String> {
    let mut chain = vec![cause.to_string()];
    let mut next = cause.source();
    while let Some(err) = next {
        chain.push(err.to_string());
        next = err.source();
    }
    chain
}

/// Append-only JSON array of [`ErrorRecord`]s capped at [`MAX_ENTRIES`].
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `GFDL_LOG_PATH`, else `<local data dir>/gfdl/log.json`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(raw) = env::var_os(LOG_PATH_ENV) {
            if !raw.is_empty() {
                return Some(PathBuf::from(raw));
            }
        }
        dirs::data_local_dir().map(|dir| dir.join("gfdl").join("log.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: ErrorRecord) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("discarding unreadable error log {}: {err}", self.path.display());
                Vec::new()
            }
        };
        entries.push(record);
        entries.sort_by_key(|e| e.epoch_ms);
        if entries.len() > MAX_ENTRIES {
            let excess = entries.len() - MAX_ENTRIES;
            entries.drain(..excess);
        }

        self.write_all(&entries)
    }

    /// Newest first.
    pub fn recent(&self, count: usize) -> Result<Vec<ErrorRecord>> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let entries = self.read_all()?;
        Ok(entries.into_iter().rev().take(count).collect())
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        if self.path.exists() {
            self.write_all(&[])?;
        }
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<ErrorRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(format!("reading {}", self.path.display()), e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, entries: &[ErrorRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::io(format!("creating {}", parent.display()), e))?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
            .map_err(|e| Error::io(format!("writing {}", self.path.display()), e))
    }
}

impl FailureSink for ErrorLog {
    fn record_failure(&self, failure: Failure<'_>) {
        LogSink.record_failure(failure);
        if let Err(err) = self.append(ErrorRecord::from_failure(&failure)) {
            warn!("could not write error log {}: {err}", self.path.display());
        }
    }
}
