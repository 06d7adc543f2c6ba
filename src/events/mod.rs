//! Outbound events
//!
//! Session lifecycle events are handed to an [`EventPublisher`]; the default
//! publisher writes them to the tracing log.

pub mod publisher;

// Re-export commonly used types
pub use publisher::{EventPublisher, NoopEventPublisher, TracingEventPublisher};
