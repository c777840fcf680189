//! Observability for the document subsystem
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Begin/complete scopes around ingestion and batch pairing
//!
//! Observability is read-only: a failed log write never fails the
//! operation being observed.
//!
//! ```ignore
//! use aerodoc::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::FileRenamed, &[("from", "a/x.jpg"), ("to", "a/y.jpg")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

use crate::errors::DocumentError;

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

/// Log an error under the given event, at the error's own severity
pub fn log_error(event: Event, err: &DocumentError, fields: &[(&str, &str)]) {
    let message = err.to_string();
    let mut all: Vec<(&str, &str)> = fields.to_vec();
    all.push(("code", err.code()));
    all.push(("reason", message.as_str()));
    Logger::log(err.severity(), event.as_str(), &all);
}
