use std::sync::Arc;

/// Sink for library log lines, injected by the host
///
/// Messages carry a `[Component]` prefix. Implementations: `NoOpLogger`,
/// and `TracingLogger` which forwards to `tracing`.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

pub type SharedLogger = Arc<dyn Logger>;
