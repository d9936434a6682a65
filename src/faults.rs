//! Append-only fault sink shared by all workers
//!
//! Workers never let a single bad item abort the run; they record what went
//! wrong here and move on. The accumulated log is flushed to durable storage
//! on interrupt, and at the end of a run that collected any faults.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// One recorded failure
#[derive(Debug, Clone)]
pub struct Fault {
    /// Pipeline stage that hit the failure
    pub stage: &'static str,
    /// Work item the failure belongs to, when one exists
    pub item: Option<String>,
    pub message: String,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.item {
            Some(item) => write!(f, "[{}] {}: {}", self.stage, item, self.message),
            None => write!(f, "[{}] {}", self.stage, self.message),
        }
    }
}

/// Concurrency-safe append-only fault log
#[derive(Debug, Default)]
pub struct FaultLog {
    entries: Mutex<Vec<Fault>>,
}

impl FaultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fault and emits it as a warning
    pub fn record(&self, stage: &'static str, item: Option<&str>, message: impl Into<String>) {
        let fault = Fault {
            stage,
            item: item.map(str::to_string),
            message: message.into(),
        };
        tracing::warn!("{}", fault);
        self.entries.lock().unwrap().push(fault);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes every recorded fault to the given path, one line each
    pub fn flush_to(&self, path: &Path) -> std::io::Result<()> {
        let entries = self.entries.lock().unwrap();
        let mut file = std::fs::File::create(path)?;
        for fault in entries.iter() {
            writeln!(file, "{}", fault)?;
        }
        file.flush()
    }

    /// Snapshot of the recorded faults (for tests and summaries)
    pub fn entries(&self) -> Vec<Fault> {
        self.entries.lock().unwrap().clone()
    }
}
