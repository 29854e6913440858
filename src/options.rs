// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Construction options for a solve (§6).

use std::path::PathBuf;

/// Options controlling how a solve fetches containers and whether it
/// traces its own execution.
#[derive(Debug, Clone, Default)]
pub struct Options {
    prefetching_enabled: bool,
    skip_update: bool,
    trace_file: Option<PathBuf>,
}

impl Options {
    /// Start from the defaults: prefetching off, updates allowed, no trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the container gateway's fire-and-forget prefetching of
    /// packages known to be needed before they're actually requested.
    pub fn with_prefetching(mut self, enabled: bool) -> Self {
        self.prefetching_enabled = enabled;
        self
    }

    /// Run in "incomplete mode": the container gateway refuses to fetch
    /// containers it does not already have cached.
    pub fn with_skip_update(mut self, skip_update: bool) -> Self {
        self.skip_update = skip_update;
        self
    }

    /// Write a newline-terminated textual record of every solver action to
    /// this path, flushed after each write.
    pub fn with_trace_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_file = Some(path.into());
        self
    }

    pub fn prefetching_enabled(&self) -> bool {
        self.prefetching_enabled
    }

    pub fn skip_update(&self) -> bool {
        self.skip_update
    }

    pub fn trace_file(&self) -> Option<&std::path::Path> {
        self.trace_file.as_deref()
    }
}
