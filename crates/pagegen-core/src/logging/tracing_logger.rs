//! Logger backed by the `tracing` crate

use super::traits::Logger;

/// Forwards every message as a `tracing` event tagged with a component name
///
/// The host decides where events end up by installing a subscriber
/// (the server binary uses `tracing-subscriber` with an env filter).
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    /// Create a logger with the default component name
    pub fn new() -> Self {
        Self {
            component: "pagegen".to_string(),
        }
    }

    /// Create a logger with a custom component name
    pub fn with_component(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(component = %self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(component = %self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(component = %self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(component = %self.component, "{}", message);
    }
}
