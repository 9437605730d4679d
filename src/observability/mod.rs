//! Observability subsystem
//!
//! - Structured logging (JSON lines through `tracing`)
//! - Counters per versioned model
//! - Begin/complete scopes around protocol operations
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use docver::observability::{log_event, Event, ObservationScope};
//!
//! log_event(Event::VersionPromoted, &[("version_id", "v1")]);
//!
//! let scope = ObservationScope::new("ACTIVATE_VERSION");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, VersionMetrics};
pub use scope::{ObservationScope, Timer};

/// Log a protocol event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::ModelBound, &[]);
        log_event(Event::CompensationFailed, &[("version_id", "v1")]);
    }
}
