//! Observable events
//!
//! Events are explicit and typed. Each carries the severity it is logged at.

use std::fmt;

use super::logger::{Logger, Severity};

/// Observable events of the history core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,

    // Resolution
    /// The node-to-revisions index drives the resolution
    HistoryIndexedPath,
    /// No index entry, the previous-revision chain is walked
    HistoryFallbackPath,
    /// One revision probed for the node
    HistoryProbe,
    /// A listed revision does not contain the node
    HistoryIndexSkew,
    /// The previous-revision chain does not lead backwards
    HistoryBrokenChain,

    // Resource
    /// In-memory resource created
    ResourceCreated,
    /// Index trees sealed for a new revision
    IndexCommit,
    /// Write transaction committed
    ResourceCommit,
    /// Write transaction rolled back
    ResourceRollback,
    /// Working revision restarted from an older revision
    ResourceRevert,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::HistoryIndexedPath => "HISTORY_INDEXED_PATH",
            Event::HistoryFallbackPath => "HISTORY_FALLBACK_PATH",
            Event::HistoryProbe => "HISTORY_PROBE",
            Event::HistoryIndexSkew => "HISTORY_INDEX_SKEW",
            Event::HistoryBrokenChain => "HISTORY_BROKEN_CHAIN",

            Event::ResourceCreated => "RESOURCE_CREATED",
            Event::IndexCommit => "INDEX_COMMIT",
            Event::ResourceCommit => "RESOURCE_COMMIT",
            Event::ResourceRollback => "RESOURCE_ROLLBACK",
            Event::ResourceRevert => "RESOURCE_REVERT",
        }
    }

    /// Returns the severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::HistoryProbe | Event::IndexCommit => Severity::Trace,
            Event::HistoryIndexSkew => Severity::Warn,
            Event::HistoryBrokenChain => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    /// Writes the event with the given fields
    pub fn log(&self, fields: &[(&str, &str)]) {
        Logger::log(self.severity(), self.as_str(), fields);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 11] = [
        Event::ConfigLoaded,
        Event::HistoryIndexedPath,
        Event::HistoryFallbackPath,
        Event::HistoryProbe,
        Event::HistoryIndexSkew,
        Event::HistoryBrokenChain,
        Event::ResourceCreated,
        Event::IndexCommit,
        Event::ResourceCommit,
        Event::ResourceRollback,
        Event::ResourceRevert,
    ];

    #[test]
    fn test_all_events_have_string_representation() {
        for event in ALL {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severities() {
        assert_eq!(Event::HistoryIndexSkew.severity(), Severity::Warn);
        assert_eq!(Event::HistoryProbe.severity(), Severity::Trace);
        assert_eq!(Event::HistoryBrokenChain.severity(), Severity::Fatal);
        assert_eq!(Event::ResourceCommit.severity(), Severity::Info);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::HistoryIndexSkew), "HISTORY_INDEX_SKEW");
    }
}
