// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The structured trace sink collaborators may pass to a solve (§6). This
//! is distinct from the crate's ordinary `log` output: `log` is for
//! developers debugging the solver itself, the trace sink is a
//! machine-readable record of solver actions a caller asks for explicitly.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Where in the algorithm a traced action happened.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TraceLocation {
    TopLevel,
    UnitPropagation,
    DecisionMaking,
    ConflictResolution,
}

/// What kind of action is being traced.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TraceKind {
    Incompatibility,
    Decision,
    Derivation,
}

/// A single traced solver action.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// A general-purpose action: an incompatibility learned, a decision
    /// made, or a term derived.
    General {
        value: String,
        kind: TraceKind,
        location: TraceLocation,
        cause: Option<String>,
        decision_level: u32,
    },
    /// A step of conflict resolution.
    ConflictResolution {
        incompatibility: String,
        term: String,
        satisfier: String,
    },
}

/// Accepts traced solver actions by value, leaving formatting and
/// persistence entirely to the implementer.
pub trait TraceSink: Send + Sync {
    fn trace(&self, event: TraceEvent);
}

/// A sink that discards every event; the default when no trace file is
/// configured.
#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn trace(&self, _event: TraceEvent) {}
}

/// Writes each event as a newline-terminated textual record, flushed
/// immediately, to a file opened lazily on first use and held for the
/// lifetime of the sink.
pub struct FileTraceSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileTraceSink {
    /// Record the path to open on the first traced event. The file itself
    /// is not touched until then, so a configured-but-unused trace sink
    /// never creates or truncates anything on disk.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }
}

impl TraceSink for FileTraceSink {
    fn trace(&self, event: TraceEvent) {
        let line = match &event {
            TraceEvent::General {
                value,
                kind,
                location,
                cause,
                decision_level,
            } => format!(
                "[{location:?}] {kind:?} at level {decision_level}: {value}{}",
                cause
                    .as_ref()
                    .map(|c| format!(" (cause: {c})"))
                    .unwrap_or_default()
            ),
            TraceEvent::ConflictResolution {
                incompatibility,
                term,
                satisfier,
            } => format!(
                "[ConflictResolution] incompatibility={incompatibility} term={term} satisfier={satisfier}"
            ),
        };
        let mut guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let file = match guard.as_mut() {
            Some(file) => file,
            None => {
                let opened = match OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&self.path)
                {
                    Ok(file) => file,
                    Err(_) => return,
                };
                guard.get_or_insert(opened)
            }
        };
        if writeln!(file, "{line}").is_ok() {
            let _ = file.flush();
        }
    }
}
