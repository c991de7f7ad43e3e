//! In-memory sink, used for dry runs and tests.

use crate::core::report::Report;
use crate::core::traits::ReportSink;
use std::sync::{Mutex, MutexGuard};

/// Sink that keeps every captured report.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Report>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clones the reports captured so far.
    pub fn snapshot(&self) -> Vec<Report> {
        self.lock().clone()
    }

    /// Drains the captured reports.
    pub fn take(&self) -> Vec<Report> {
        std::mem::take(&mut *self.lock())
    }

    // A panicking capturer cannot leave the Vec half-written, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Vec<Report>> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReportSink for MemorySink {
    fn capture(&self, report: Report) {
        self.lock().push(report);
    }
}
