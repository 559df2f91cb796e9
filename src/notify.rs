//! Operator Notifications
//!
//! Terminal success/failure and display warnings are pushed through an
//! injected sink rather than printed directly by the core.

use std::io::Write;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Success => write!(f, "OK"),
        }
    }
}

/// Receives human-readable notifications. Implementations must not panic.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Writes coloured notifications to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink {
    /// Emit ANSI colour codes
    pub color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn render(&self, severity: Severity, message: &str) -> String {
        if !self.color {
            return format!("{}: {}", severity, message);
        }
        match severity {
            Severity::Error => format!("\x1b[1;31m✗ ERROR:\x1b[0m {}", message),
            Severity::Warning => format!("\x1b[1;33m⚠ WARNING:\x1b[0m {}", message),
            Severity::Success => format!("\x1b[1;32m✓\x1b[0m {}", message),
        }
    }
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, severity: Severity, message: &str) {
        tracing::debug!("Notification ({}): {}", severity, message);

        // Must not panic on a closed stderr
        let _ = writeln!(std::io::stderr(), "{}", self.render(severity, message));
    }
}
