//! Classification of unsolicited lines.
//!
//! Anything the module prints that is not the response to the request in
//! flight is passed through [`classify`], which turns it into an [`Event`],
//! marks it as known noise, or reports it as unrecognised.

use tracing::trace;

/// Acknowledgement of a set or action request.
pub const OK_INDICATOR: &str = "OK";
/// The module cannot accept a request right now.
pub const BUSY_INDICATOR: &str = "AT_BUSY_ERROR";

const EVENT_PREFIX: &str = "+EVT:";
const BEACON_PREFIX: &str = "+BC:";
const PING_SLOT_PREFIX: &str = "+PS:";
const RESTRICTED_PREFIX: &str = "Restricted_Wait_";
const RESTRICTED_SUFFIX: &str = "_ms";
const WORK_MODE_PREFIX: &str = "Current Work Mode: ";

/// Banner lines printed on reset and after a work mode change.
const IGNORED_LINES: &[&str] = &[
    "------------------------------------------------------",
    "RAKwireless RAK3272-SiP Example",
];

/// Event type for `+BC:` beacon notices.
pub const EVENT_BEACON: &str = "BC";
/// Event type for `+PS:` ping slot notices.
pub const EVENT_PING_SLOT: &str = "PS";
/// Event type for duty cycle restriction notices; the argument is the wait in ms.
pub const EVENT_RESTRICTED_WAIT: &str = "RestrictedWait";
/// Event type for work mode banners; the argument is the mode name.
pub const EVENT_CURRENT_WORK_MODE: &str = "CurrentWorkMode";

/// An asynchronous notification from the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: String,
    args: String,
}

impl Event {
    /// Create an event from its type tag and argument text.
    pub fn new(kind: impl Into<String>, args: impl Into<String>) -> Self {
        Event {
            kind: kind.into(),
            args: args.into(),
        }
    }

    /// Split `body` at the first `separator` into type and arguments.
    fn split(body: &str, separator: char) -> Self {
        match body.split_once(separator) {
            Some((kind, args)) => Event::new(kind, args),
            None => Event::new(body, ""),
        }
    }

    /// The event type tag, e.g. `JOINED` or `RX_1`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Everything after the type tag.
    pub fn args(&self) -> &str {
        &self.args
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}:{}", self.kind, self.args)
        }
    }
}

/// What an unsolicited line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsolicited {
    /// A recognised notification.
    Event(Event),
    /// Known output that carries no information.
    Ignored,
    /// Anything else.
    Unrecognized,
}

/// Classify a line that was not the response to an in-flight request.
pub fn classify(line: &str) -> Unsolicited {
    let classified = if let Some(body) = line.strip_prefix(EVENT_PREFIX) {
        Unsolicited::Event(Event::split(body, ':'))
    } else if let Some(args) = line.strip_prefix(BEACON_PREFIX) {
        Unsolicited::Event(Event::new(EVENT_BEACON, args.trim_start()))
    } else if let Some(args) = line.strip_prefix(PING_SLOT_PREFIX) {
        Unsolicited::Event(Event::new(EVENT_PING_SLOT, args.trim_start()))
    } else if let Some(rest) = line.strip_prefix(RESTRICTED_PREFIX) {
        let wait = rest.strip_suffix(RESTRICTED_SUFFIX).unwrap_or(rest);
        Unsolicited::Event(Event::new(EVENT_RESTRICTED_WAIT, wait))
    } else if let Some(rest) = line.strip_prefix(WORK_MODE_PREFIX) {
        let mode = rest.strip_suffix('.').unwrap_or(rest);
        Unsolicited::Event(Event::new(EVENT_CURRENT_WORK_MODE, mode))
    } else if IGNORED_LINES.contains(&line) {
        Unsolicited::Ignored
    } else {
        Unsolicited::Unrecognized
    };
    trace!("classify: '{}' -> {:?}", line, classified);
    classified
}
