//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Monotonic counters
//! - Typed lifecycle events
//!
//! # Principles
//!
//! 1. Observability is read-only and never changes a result
//! 2. No async or background threads
//! 3. Deterministic output

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{HistoryMetrics, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};
