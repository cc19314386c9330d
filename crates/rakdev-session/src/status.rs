//! Observed device state.

use std::time::Duration;

use chrono::NaiveDateTime;
use rakdev_at_protocol::{ChannelRssi, LinkStatus, ReceiveStatus};

/// A value together with whether its last refresh succeeded and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked<T> {
    value: Option<T>,
    valid: bool,
    updated_at: Option<Duration>,
}

impl<T> Default for Tracked<T> {
    fn default() -> Self {
        Tracked {
            value: None,
            valid: false,
            updated_at: None,
        }
    }
}

impl<T> Tracked<T> {
    /// Store a freshly read value.
    pub fn update(&mut self, value: T, now: Duration) {
        self.value = Some(value);
        self.valid = true;
        self.updated_at = Some(now);
    }

    /// Record a failed refresh. The last known value is kept.
    pub fn invalidate(&mut self, now: Duration) {
        self.valid = false;
        self.updated_at = Some(now);
    }

    /// The value, if the last refresh succeeded.
    pub fn get(&self) -> Option<&T> {
        if self.valid {
            self.value.as_ref()
        } else {
            None
        }
    }

    /// The most recent value ever stored, valid or not.
    pub fn last_known(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// When the value was last updated or invalidated.
    pub fn updated_at(&self) -> Option<Duration> {
        self.updated_at
    }
}

/// An activation count with the time of the latest activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    count: u64,
    last_at: Option<Duration>,
}

impl Counter {
    pub fn bump(&mut self, now: Duration) {
        self.count += 1;
        self.last_at = Some(now);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn last_at(&self) -> Option<Duration> {
        self.last_at
    }
}

/// Identity strings read during bring-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub version: String,
    pub hardware_model: String,
    pub hardware_id: String,
    pub serial_number: String,
    pub api_version: String,
}

/// Snapshot of everything the session has learned about the module.
#[derive(Debug, Clone, Default)]
pub struct Status {
    pub identity: Identity,
    /// Device address assigned at join.
    pub dev_addr: Option<String>,
    pub network_time: Tracked<NaiveDateTime>,
    /// Whether the most recent uplink was acknowledged.
    pub transmit_confirmation: Tracked<bool>,
    /// Signal quality of the last downlink.
    pub receive: Tracked<ReceiveStatus>,
    pub link: Tracked<LinkStatus>,
    pub channels: Tracked<Vec<ChannelRssi>>,
    pub transmits: Counter,
    pub transmit_successes: Counter,
    pub transmit_failures: Counter,
    pub receives: Counter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_lifecycle() {
        let mut tracked: Tracked<i32> = Tracked::default();
        assert!(tracked.get().is_none());
        assert!(!tracked.is_valid());
        assert!(tracked.updated_at().is_none());

        tracked.update(-80, Duration::from_secs(5));
        assert_eq!(tracked.get(), Some(&-80));
        assert_eq!(tracked.updated_at(), Some(Duration::from_secs(5)));

        tracked.invalidate(Duration::from_secs(9));
        assert!(tracked.get().is_none());
        assert_eq!(tracked.last_known(), Some(&-80));
        assert_eq!(tracked.updated_at(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn test_counter() {
        let mut counter = Counter::default();
        counter.bump(Duration::from_secs(1));
        counter.bump(Duration::from_secs(3));
        assert_eq!(counter.count(), 2);
        assert_eq!(counter.last_at(), Some(Duration::from_secs(3)));
    }
}
