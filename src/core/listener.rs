//! Host-facing listener that normalizes events and captures reports.

use crate::core::event::{AdminEvent, RawEvent, UserEvent};
use crate::core::normalize::{normalize_admin_event, normalize_user_event, NormalizerConfig};
use crate::core::traits::ReportSink;

/// Callback surface the identity server drives for every event it raises.
pub trait EventListener {
    fn on_event(&self, event: &UserEvent);

    fn on_admin_event(&self, event: &AdminEvent, include_representation: bool);

    /// Releases listener resources. Nothing to release by default.
    fn close(&self) {}
}

/// Listener that hands each normalized report to a sink.
pub struct ReportingListener<S> {
    sink: S,
    config: NormalizerConfig,
}

impl<S: ReportSink> ReportingListener<S> {
    pub fn new(sink: S, config: NormalizerConfig) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Routes a raw event to the matching callback.
    pub fn dispatch(&self, event: &RawEvent) {
        match event {
            RawEvent::User(event) => self.on_event(event),
            RawEvent::Admin {
                event,
                include_representation,
            } => self.on_admin_event(event, *include_representation),
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: ReportSink> EventListener for ReportingListener<S> {
    fn on_event(&self, event: &UserEvent) {
        match normalize_user_event(event, &self.config) {
            Some(report) => {
                tracing::debug!(
                    event_type = %event.event_type,
                    realm = %event.realm_id,
                    level = ?report.level,
                    "capturing user event"
                );
                self.sink.capture(report);
            }
            None => {
                tracing::trace!(event_type = %event.event_type, "skipped informational user event");
            }
        }
    }

    fn on_admin_event(&self, event: &AdminEvent, include_representation: bool) {
        let report = normalize_admin_event(event, include_representation, &self.config);
        tracing::debug!(
            operation = %event.operation_type,
            realm = %event.realm_id,
            level = ?report.level,
            "capturing admin event"
        );
        self.sink.capture(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{AuthDetails, OperationType};
    use crate::core::report::Level;
    use crate::formats::memory::MemorySink;
    use std::sync::Arc;
    use std::thread;

    fn user_event(error: Option<&str>) -> UserEvent {
        UserEvent {
            event_type: "LOGIN".to_string(),
            error: error.map(str::to_string),
            user_id: Some("u1".to_string()),
            realm_id: "r1".to_string(),
            ..UserEvent::default()
        }
    }

    fn admin_event() -> AdminEvent {
        AdminEvent {
            time: None,
            operation_type: OperationType::Create,
            error: None,
            auth_details: AuthDetails::default(),
            realm_id: "r1".to_string(),
            resource_path: Some("clients/c1".to_string()),
            resource_type: Some("CLIENT".to_string()),
            representation: None,
        }
    }

    #[test]
    fn skipped_event_never_reaches_sink() {
        let listener =
            ReportingListener::new(MemorySink::new(), NormalizerConfig { errors_only: true });
        listener.on_event(&user_event(None));
        assert!(listener.sink().is_empty());

        listener.on_event(&user_event(Some("user_not_found")));
        let reports = listener.into_sink().take();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].level, Level::Error);
    }

    #[test]
    fn admin_events_captured_under_errors_only() {
        let listener =
            ReportingListener::new(MemorySink::new(), NormalizerConfig { errors_only: true });
        listener.dispatch(&RawEvent::Admin {
            event: admin_event(),
            include_representation: true,
        });
        listener.close();

        let reports = listener.sink().snapshot();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].source(), Some("ADMIN"));
        assert!(reports[0].extras.contains_key("representation"));
    }

    #[test]
    fn concurrent_callers_share_one_sink() {
        let sink = Arc::new(MemorySink::new());
        let listener = Arc::new(ReportingListener::new(
            Arc::clone(&sink),
            NormalizerConfig::default(),
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let listener = Arc::clone(&listener);
                thread::spawn(move || {
                    for _ in 0..25 {
                        listener.dispatch(&RawEvent::User(user_event(None)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker");
        }

        assert_eq!(sink.len(), 100);
    }
}
