//! Sink that hands reports to a dedicated writer thread.

use crate::core::report::Report;
use crate::core::traits::{ReportSink, ReportWriter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

enum WriterCommand {
    Report(Report),
    Flush,
    Close,
}

/// Running totals kept by the writer thread.
#[derive(Debug, Default)]
pub struct WriterCounters {
    pub reports: AtomicU64,
    pub bytes: AtomicU64,
    pub failures: AtomicU64,
}

/// Cloneable handle that enqueues reports for the writer thread.
#[derive(Clone)]
pub struct QueueSink {
    tx: SyncSender<WriterCommand>,
    counters: Arc<WriterCounters>,
}

/// Owns the writer thread; join it with [`WriterHandle::close`].
pub struct WriterHandle {
    tx: SyncSender<WriterCommand>,
    handle: thread::JoinHandle<std::io::Result<()>>,
}

/// Starts a writer thread fed by a bounded queue.
///
/// The writer is flushed every `flush_interval` and closed when the handle
/// is closed.
pub fn spawn_writer(
    mut writer: Box<dyn ReportWriter + Send>,
    queue_depth: usize,
    flush_interval: Duration,
) -> (QueueSink, WriterHandle) {
    let (tx, rx) = sync_channel(queue_depth.max(1));
    let counters = Arc::new(WriterCounters::default());
    let thread_counters = Arc::clone(&counters);

    let handle = thread::spawn(move || -> std::io::Result<()> {
        let mut next_flush = Instant::now() + flush_interval;
        loop {
            let timeout = next_flush.saturating_duration_since(Instant::now());
            let command = match rx.recv_timeout(timeout) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(WriterCommand::Close),
            };
            match command {
                None => {}
                Some(WriterCommand::Report(report)) => match writer.write_report(&report) {
                    Ok(bytes) => {
                        thread_counters.reports.fetch_add(1, Ordering::Relaxed);
                        thread_counters.bytes.fetch_add(bytes, Ordering::Relaxed);
                    }
                    Err(err) => {
                        thread_counters.failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %err, "failed to write report");
                    }
                },
                Some(WriterCommand::Flush) => {
                    if let Err(err) = writer.flush() {
                        tracing::warn!(error = %err, "failed to flush reports");
                    }
                }
                Some(WriterCommand::Close) => return writer.close(),
            }
            if Instant::now() >= next_flush {
                if let Err(err) = writer.flush() {
                    tracing::warn!(error = %err, "failed to flush reports");
                }
                next_flush = Instant::now() + flush_interval;
            }
        }
    });

    (
        QueueSink {
            tx: tx.clone(),
            counters,
        },
        WriterHandle { tx, handle },
    )
}

impl QueueSink {
    pub fn counters(&self) -> &WriterCounters {
        &self.counters
    }
}

impl ReportSink for QueueSink {
    fn capture(&self, report: Report) {
        if self.tx.send(WriterCommand::Report(report)).is_err() {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("report dropped: writer thread has stopped");
        }
    }
}

impl WriterHandle {
    /// Asks the writer to flush outstanding reports.
    pub fn flush(&self) {
        if self.tx.send(WriterCommand::Flush).is_err() {
            tracing::warn!("flush skipped: writer thread has stopped");
        }
    }

    /// Closes the writer once queued reports are written and joins the thread.
    pub fn close(self) -> std::io::Result<()> {
        let _ = self.tx.send(WriterCommand::Close);
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::other("writer thread panicked")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::Level;
    use serde_json::Map;
    use std::collections::BTreeMap;
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorded {
        messages: Vec<String>,
        flushes: usize,
        closed: bool,
    }

    struct RecordingWriter {
        state: Arc<Mutex<Recorded>>,
        fail: bool,
    }

    struct PanickingWriter;

    impl ReportWriter for PanickingWriter {
        fn write_report(&mut self, _report: &Report) -> io::Result<u64> {
            panic!("writer crashed");
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl ReportWriter for RecordingWriter {
        fn write_report(&mut self, report: &Report) -> io::Result<u64> {
            if self.fail {
                return Err(io::Error::other("disk full"));
            }
            let message = report.message.clone().unwrap_or_default();
            let len = message.len() as u64;
            self.state.lock().expect("lock").messages.push(message);
            Ok(len)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.state.lock().expect("lock").flushes += 1;
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            self.state.lock().expect("lock").closed = true;
            Ok(())
        }
    }

    fn report(message: &str) -> Report {
        Report {
            message: Some(message.to_string()),
            level: Level::Info,
            user: None,
            extras: Map::new(),
            tags: BTreeMap::new(),
            timestamp: None,
        }
    }

    #[test]
    fn reports_written_in_order_before_close() {
        let state = Arc::new(Mutex::new(Recorded::default()));
        let writer = RecordingWriter {
            state: Arc::clone(&state),
            fail: false,
        };
        let (sink, handle) = spawn_writer(Box::new(writer), 4, Duration::from_secs(60));
        for message in ["LOGIN", "LOGOUT", "CODE_TO_TOKEN"] {
            sink.capture(report(message));
        }
        handle.flush();
        handle.close().expect("close");

        let state = state.lock().expect("lock");
        assert_eq!(state.messages, vec!["LOGIN", "LOGOUT", "CODE_TO_TOKEN"]);
        assert!(state.flushes >= 1);
        assert!(state.closed);
        assert_eq!(sink.counters().reports.load(Ordering::Relaxed), 3);
        assert_eq!(sink.counters().bytes.load(Ordering::Relaxed), 24);
    }

    #[test]
    fn write_failures_stay_inside_the_sink() {
        let state = Arc::new(Mutex::new(Recorded::default()));
        let writer = RecordingWriter {
            state: Arc::clone(&state),
            fail: true,
        };
        let (sink, handle) = spawn_writer(Box::new(writer), 4, Duration::from_secs(60));
        sink.capture(report("LOGIN"));
        handle.close().expect("close");

        assert_eq!(sink.counters().failures.load(Ordering::Relaxed), 1);
        assert_eq!(sink.counters().reports.load(Ordering::Relaxed), 0);

        sink.capture(report("LOGIN"));
        assert_eq!(sink.counters().failures.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn stopped_writer_thread_is_reported_on_close() {
        let (sink, handle) = spawn_writer(Box::new(PanickingWriter), 4, Duration::from_secs(60));
        sink.capture(report("LOGIN"));
        while !handle.handle.is_finished() {
            thread::sleep(Duration::from_millis(5));
        }

        handle.flush();
        sink.capture(report("LOGOUT"));
        assert_eq!(sink.counters().failures.load(Ordering::Relaxed), 1);
        let err = handle.close().expect_err("panicked writer");
        assert_eq!(err.to_string(), "writer thread panicked");
    }
}
