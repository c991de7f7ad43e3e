use crate::core::event::RawEvent;
use crate::core::report::Report;

/// Accepts finished reports for delivery.
///
/// Capture is fire and forget: delivery outcome belongs to the sink.
pub trait ReportSink: Send + Sync {
    fn capture(&self, report: Report);
}

impl<S: ReportSink + ?Sized> ReportSink for std::sync::Arc<S> {
    fn capture(&self, report: Report) {
        (**self).capture(report);
    }
}

/// Produces raw events one at a time for the replay loop.
pub trait EventSource {
    /// Returns the next event, or `None` when the source is exhausted.
    fn next_event(&mut self) -> Option<RawEvent>;
}

/// Writes reports to durable storage (files, streams, etc.).
pub trait ReportWriter {
    /// Writes a single report and returns the number of bytes written.
    fn write_report(&mut self, report: &Report) -> std::io::Result<u64>;
    /// Flushes buffered data without closing the writer.
    fn flush(&mut self) -> std::io::Result<()>;
    /// Closes the writer, flushing any remaining data.
    fn close(&mut self) -> std::io::Result<()>;
}
