//! Metrics declarations for the RAK LoRaWAN module driver.
//!
//! Every counter, gauge and histogram the driver emits is declared here as a structured
//! [`Metric`] constant so names are not repeated as string literals. The
//! `metrics` facade is re-exported; the host application installs whichever
//! recorder it wants, and without one all updates are no-ops.
//!
//! # Example
//!
//! ```rust,ignore
//! use rakdev_metrics::{describe_metrics, metric_defs};
//!
//! // Register descriptions once at startup
//! describe_metrics();
//!
//! metrics::counter!(metric_defs::COMMANDS_ISSUED.name, "command" => "BAND").increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use rakdev_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FRAMES: Metric = Metric::counter("rakdev.example.frames")
///     .with_description("Frames seen")
///     .with_unit(Unit::Count)
///     .with_labels(&["port"]);
///
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "rakdev.commander.commands_issued").
    pub name: &'static str,
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Metric {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        let unit = self.unit.unwrap_or(Unit::Count);
        match self.kind {
            MetricKind::Counter => describe_counter!(self.name, unit, self.description),
            MetricKind::Gauge => describe_gauge!(self.name, unit, self.description),
            MetricKind::Histogram => describe_histogram!(self.name, unit, self.description),
        }
    }
}

/// All metric definitions for the driver.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Commander
    // ========================================================================

    /// Requests written to the module.
    ///
    /// Labels: command
    pub const COMMANDS_ISSUED: Metric = Metric::counter("rakdev.commander.commands_issued")
        .with_description("AT requests issued")
        .with_unit(Unit::Count)
        .with_labels(&["command"]);

    /// Exchanges that ended in an error (validation, timeout, busy, bad response).
    ///
    /// Labels: command
    pub const COMMANDS_FAILED: Metric = Metric::counter("rakdev.commander.commands_failed")
        .with_description("AT requests that did not succeed")
        .with_unit(Unit::Count)
        .with_labels(&["command"]);

    /// Re-sends caused by `AT_BUSY_ERROR`.
    ///
    /// Labels: command
    pub const BUSY_RETRIES: Metric = Metric::counter("rakdev.commander.busy_retries")
        .with_description("Requests re-sent after a busy response")
        .with_unit(Unit::Count)
        .with_labels(&["command"]);

    /// Wall time of one request/response exchange, busy retries included.
    ///
    /// Labels: command
    pub const EXCHANGE_DURATION: Metric = Metric::histogram("rakdev.commander.exchange_duration")
        .with_description("Time from request to final response")
        .with_unit(Unit::Seconds)
        .with_labels(&["command"]);

    /// Unsolicited lines classified as events.
    ///
    /// Labels: event
    pub const UNSOLICITED_EVENTS: Metric = Metric::counter("rakdev.commander.unsolicited_events")
        .with_description("Unsolicited events received from the module")
        .with_unit(Unit::Count)
        .with_labels(&["event"]);

    /// Unsolicited lines that matched nothing.
    pub const UNRECOGNIZED_LINES: Metric = Metric::counter("rakdev.commander.unrecognized_lines")
        .with_description("Lines from the module that could not be classified")
        .with_unit(Unit::Count);

    // ========================================================================
    // Session
    // ========================================================================

    pub const JOIN_ATTEMPTS: Metric = Metric::counter("rakdev.session.join_attempts")
        .with_description("Join requests issued")
        .with_unit(Unit::Count);

    pub const JOIN_SUCCESSES: Metric = Metric::counter("rakdev.session.join_successes")
        .with_description("Joins confirmed by the network")
        .with_unit(Unit::Count);

    pub const JOIN_FAILURES: Metric = Metric::counter("rakdev.session.join_failures")
        .with_description("Join attempts that failed")
        .with_unit(Unit::Count);

    pub const TRANSMITS: Metric = Metric::counter("rakdev.session.transmits")
        .with_description("Uplinks handed to the module")
        .with_unit(Unit::Count);

    pub const TRANSMIT_SUCCESSES: Metric = Metric::counter("rakdev.session.transmit_successes")
        .with_description("Uplinks reported as delivered")
        .with_unit(Unit::Count);

    pub const TRANSMIT_FAILURES: Metric = Metric::counter("rakdev.session.transmit_failures")
        .with_description("Uplinks reported as not delivered")
        .with_unit(Unit::Count);

    /// Labels: class
    pub const RECEIVES: Metric = Metric::counter("rakdev.session.receives")
        .with_description("Downlinks received")
        .with_unit(Unit::Count)
        .with_labels(&["class"]);

    pub const RECEIVED_BYTES: Metric = Metric::counter("rakdev.session.received_bytes")
        .with_description("Downlink payload bytes received")
        .with_unit(Unit::Bytes);

    // ========================================================================
    // Messenger
    // ========================================================================

    pub const RETRANSMITS: Metric = Metric::counter("rakdev.messenger.retransmits")
        .with_description("Queued messages sent again after a failure")
        .with_unit(Unit::Count);

    pub const TRANSMIT_QUEUE_DEPTH: Metric = Metric::gauge("rakdev.messenger.transmit_queue_depth")
        .with_description("Messages waiting to be transmitted")
        .with_unit(Unit::Count);

    pub const RECEIVE_QUEUE_DEPTH: Metric = Metric::gauge("rakdev.messenger.receive_queue_depth")
        .with_description("Received messages not yet consumed")
        .with_unit(Unit::Count);

    /// Every metric declared above.
    pub const ALL: &[Metric] = &[
        COMMANDS_ISSUED,
        COMMANDS_FAILED,
        BUSY_RETRIES,
        EXCHANGE_DURATION,
        UNSOLICITED_EVENTS,
        UNRECOGNIZED_LINES,
        JOIN_ATTEMPTS,
        JOIN_SUCCESSES,
        JOIN_FAILURES,
        TRANSMITS,
        TRANSMIT_SUCCESSES,
        TRANSMIT_FAILURES,
        RECEIVES,
        RECEIVED_BYTES,
        RETRANSMITS,
        TRANSMIT_QUEUE_DEPTH,
        RECEIVE_QUEUE_DEPTH,
    ];
}

/// Registers descriptions for all metrics with the installed recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_builder() {
        const TEST_COUNTER: Metric = Metric::counter("test.counter")
            .with_description("A test counter")
            .with_unit(Unit::Count)
            .with_labels(&["command"]);

        assert_eq!(TEST_COUNTER.name, "test.counter");
        assert_eq!(TEST_COUNTER.kind, MetricKind::Counter);
        assert_eq!(TEST_COUNTER.description, "A test counter");
        assert_eq!(TEST_COUNTER.unit, Some(Unit::Count));
        assert_eq!(TEST_COUNTER.labels, &["command"]);
    }

    #[test]
    fn test_metric_minimal() {
        const MINIMAL: Metric = Metric::gauge("minimal");

        assert_eq!(MINIMAL.kind, MetricKind::Gauge);
        assert_eq!(MINIMAL.description, "");
        assert_eq!(MINIMAL.unit, None);
        assert_eq!(MINIMAL.labels, &[] as &[&str]);
    }

    #[test]
    fn test_exchange_duration_is_histogram() {
        assert_eq!(metric_defs::EXCHANGE_DURATION.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::EXCHANGE_DURATION.unit, Some(Unit::Seconds));
        assert_eq!(MetricKind::Histogram.to_string(), "histogram");
    }

    #[test]
    fn test_definitions_are_unique_and_described() {
        let mut names = HashSet::new();
        for metric in metric_defs::ALL {
            assert!(names.insert(metric.name), "duplicate metric {}", metric.name);
            assert!(metric.name.starts_with("rakdev."));
            assert!(!metric.description.is_empty());
        }
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
