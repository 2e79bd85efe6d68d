use super::Logger;

/// [`Logger`] forwarding to the `tracing` macros under target `typebus`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!(target: "typebus", "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!(target: "typebus", "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "typebus", "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "typebus", "{msg}");
    }
}
