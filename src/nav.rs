use std::sync::Mutex;

use tracing::debug;

/// Client-side navigation seam provided by the host view layer.
/// Navigations are fire-and-forget: never awaited, never retried.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// Navigator that drops every navigation, for hosts that render gate
/// decisions directly instead of routing.
#[derive(Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate_to(&self, _path: &str) {}
}

/// Records issued navigations in order. Used in tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().expect("paths poisoned").clone()
    }

    pub fn last(&self) -> Option<String> {
        self.paths.lock().expect("paths poisoned").last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, path: &str) {
        debug!(path, "navigate");
        self.paths.lock().expect("paths poisoned").push(path.to_string());
    }
}
