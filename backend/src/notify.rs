//! User-facing notification and cache-invalidation seams.
//!
//! The save coordinator reports outcomes through these traits instead of a
//! global toast/query singleton, so callers decide how feedback surfaces.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Fire-and-forget user feedback channel (toast-style)
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, title: &str, detail: &str);
}

/// Invalidate cached query results for a resource after a successful write
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, resource_key: &str);
}

/// Notifier that writes to the tracing log. The HTTP surface carries
/// outcomes in responses, so server-side feedback only needs to be visible
/// in logs.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, title: &str, detail: &str) {
        match severity {
            Severity::Error => tracing::error!(title, detail, "notification"),
            Severity::Warning => tracing::warn!(title, detail, "notification"),
            _ => tracing::info!(title, detail, "notification"),
        }
    }
}

/// Invalidator used when no query cache sits in front of the store
pub struct NoopInvalidator;

#[async_trait]
impl CacheInvalidator for NoopInvalidator {
    async fn invalidate(&self, resource_key: &str) {
        tracing::debug!(resource_key, "cache invalidation requested");
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification for assertions
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub notices: Mutex<Vec<(Severity, String, String)>>,
    }

    impl RecordingNotifier {
        pub fn errors(&self) -> Vec<String> {
            self.notices
                .lock()
                .unwrap()
                .iter()
                .filter(|(s, _, _)| *s == Severity::Error)
                .map(|(_, t, _)| t.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, severity: Severity, title: &str, detail: &str) {
            self.notices
                .lock()
                .unwrap()
                .push((severity, title.to_string(), detail.to_string()));
        }
    }

    /// Records invalidated resource keys
    #[derive(Default)]
    pub struct RecordingInvalidator {
        pub keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CacheInvalidator for RecordingInvalidator {
        async fn invalidate(&self, resource_key: &str) {
            self.keys.lock().unwrap().push(resource_key.to_string());
        }
    }
}
