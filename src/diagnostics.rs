//! Injected diagnostics sink.
//!
//! Every pipeline component takes a `&dyn Diagnostics` so that callers decide
//! where messages go and which severities are kept.

use log::{Level, LevelFilter};
use std::cell::RefCell;

pub trait Diagnostics {
    /// Severity threshold; messages above it are dropped.
    fn threshold(&self) -> LevelFilter;

    /// Handle a message that already passed the threshold.
    fn emit(&self, level: Level, message: &str);

    fn record(&self, level: Level, message: &str) {
        if level <= self.threshold() {
            self.emit(level, message);
        }
    }

    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn debug(&self, message: &str) {
        self.record(Level::Debug, message);
    }
}

/// Forwards to the `log` facade (env_logger in the binary).
#[derive(Debug, Clone, Copy)]
pub struct LogDiagnostics {
    threshold: LevelFilter,
}

impl LogDiagnostics {
    pub fn new(threshold: LevelFilter) -> Self {
        Self { threshold }
    }
}

impl Default for LogDiagnostics {
    fn default() -> Self {
        Self::new(LevelFilter::Info)
    }
}

impl Diagnostics for LogDiagnostics {
    fn threshold(&self) -> LevelFilter {
        self.threshold
    }

    fn emit(&self, level: Level, message: &str) {
        log::log!(target: "cea_results_processor", level, "{}", message);
    }
}

/// Keeps every accepted message in memory.
#[derive(Debug)]
pub struct CollectedDiagnostics {
    threshold: LevelFilter,
    entries: RefCell<Vec<(Level, String)>>,
}

impl CollectedDiagnostics {
    pub fn new(threshold: LevelFilter) -> Self {
        Self {
            threshold,
            entries: RefCell::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn has_warning_containing(&self, needle: &str) -> bool {
        self.warnings().iter().any(|w| w.contains(needle))
    }
}

impl Default for CollectedDiagnostics {
    fn default() -> Self {
        Self::new(LevelFilter::Trace)
    }
}

impl Diagnostics for CollectedDiagnostics {
    fn threshold(&self) -> LevelFilter {
        self.threshold
    }

    fn emit(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}
