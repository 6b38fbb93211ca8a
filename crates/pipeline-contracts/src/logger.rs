//! Logger contract (spec §6): "Level-tagged log methods: Debug, Info,
//! Warn, Error; each takes a message and an even-numbered variadic of
//! key/value attributes."

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
// (tracing, used by TracingLogger below)

// Layer 3: Internal module imports
// (none)

/// A single structured log attribute.
///
/// Rust has no variadic parameters, so the "even-numbered variadic of
/// key/value attributes" from spec §6 becomes a slice of `Attr` pairs —
/// the same shape, ergonomically adapted.
#[derive(Debug, Clone)]
pub struct Attr {
    /// Attribute key.
    pub key: &'static str,
    /// Attribute value, pre-rendered to a string (loggers are free to
    /// re-parse it; `tracing`'s `TracingLogger` passes it through as a
    /// field value).
    pub value: String,
}

impl Attr {
    /// Builds an attribute from any `Display`-able value.
    pub fn new(key: &'static str, value: impl fmt::Display) -> Self {
        Self {
            key,
            value: value.to_string(),
        }
    }
}

/// Level-tagged structured logging, the one ambient concern every other
/// contract in this crate is allowed to assume is available.
pub trait Logger: Send + Sync {
    /// Logs at debug level.
    fn debug(&self, message: &str, attrs: &[Attr]);
    /// Logs at info level.
    fn info(&self, message: &str, attrs: &[Attr]);
    /// Logs at warn level.
    fn warn(&self, message: &str, attrs: &[Attr]);
    /// Logs at error level.
    fn error(&self, message: &str, attrs: &[Attr]);
}

/// The default [`Logger`] implementation, adapting onto `tracing`'s level
/// macros. This is the logger the rest of the workspace wires up by
/// default; `Logger` exists as a trait purely so integrators can swap it
/// for their own sink (spec §6 treats it as an external collaborator).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str, attrs: &[Attr]) {
        tracing::debug!(attrs = ?render(attrs), "{message}");
    }

    fn info(&self, message: &str, attrs: &[Attr]) {
        tracing::info!(attrs = ?render(attrs), "{message}");
    }

    fn warn(&self, message: &str, attrs: &[Attr]) {
        tracing::warn!(attrs = ?render(attrs), "{message}");
    }

    fn error(&self, message: &str, attrs: &[Attr]) {
        tracing::error!(attrs = ?render(attrs), "{message}");
    }
}

fn render(attrs: &[Attr]) -> Vec<(&'static str, String)> {
    attrs.iter().map(|a| (a.key, a.value.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_renders_display_value() {
        let attr = Attr::new("count", 42);
        assert_eq!(attr.key, "count");
        assert_eq!(attr.value, "42");
    }

    #[test]
    fn tracing_logger_does_not_panic_without_a_subscriber() {
        let logger = TracingLogger;
        logger.info("hello", &[Attr::new("k", "v")]);
        logger.error("boom", &[]);
    }
}
