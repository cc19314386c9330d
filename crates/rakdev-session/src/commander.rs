//! Request/response exchanges with busy retry and unsolicited line routing.
//!
//! The module can print unsolicited lines at any moment, including between a
//! request and its response. The commander therefore treats every line that
//! does not parse as the in-flight response as a candidate unsolicited line,
//! classifies it, and queues any resulting [`Event`] for the owner to dispatch
//! with [`Commander::next_event`].

use std::collections::VecDeque;
use std::time::Duration;

use metrics::{counter, histogram};
use rakdev_at_protocol::{
    classify, Command, CommandError, CommandResult, Event, Unsolicited, BUSY_INDICATOR,
    OK_INDICATOR,
};
use rakdev_metrics::metric_defs;
use tracing::{debug, trace, warn};

use crate::{Clock, LineTransport};

/// Re-sends allowed after the first attempt is answered busy.
pub const BUSY_RETRY_LIMIT: u32 = 3;

/// Pause before re-sending a request the module answered busy.
pub const BUSY_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Issues commands over a [`LineTransport`].
pub struct Commander<T, C> {
    transport: T,
    clock: C,
    events: VecDeque<Event>,
}

impl<T: LineTransport, C: Clock> Commander<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        Commander {
            transport,
            clock,
            events: VecDeque::new(),
        }
    }

    /// Issue one command and wait for its response.
    ///
    /// Pending input is drained first. The request is validated, sent, and
    /// the next line is offered to the command. A busy answer is retried up
    /// to [`BUSY_RETRY_LIMIT`] times; any other line that fails to parse is
    /// classified as unsolicited and the exchange fails.
    pub fn issue(&mut self, command: &mut dyn Command) -> CommandResult {
        self.process();

        let name = command.name();
        let started = self.clock.now();
        let result = self.exchange(command);
        histogram!(metric_defs::EXCHANGE_DURATION.name, "command" => name)
            .record(self.clock.now().saturating_sub(started).as_secs_f64());
        match &result {
            Ok(()) => trace!("Commander: {} ok", name),
            Err(e) => {
                counter!(metric_defs::COMMANDS_FAILED.name, "command" => name).increment(1);
                debug!("Commander: {} failed: {}", name, e);
            }
        }
        result
    }

    fn exchange(&mut self, command: &mut dyn Command) -> CommandResult {
        command.validate_request()?;

        let name = command.name();
        let request = command.build_request();
        counter!(metric_defs::COMMANDS_ISSUED.name, "command" => name).increment(1);

        let mut attempts = 0;
        loop {
            attempts += 1;
            self.transport.send_line(&request)?;

            let response = self
                .transport
                .read_line(true)?
                .ok_or(CommandError::Timeout { command: name })?;

            match command.parse_response(&response) {
                Ok(()) => return Ok(()),
                Err(_) if response == BUSY_INDICATOR => {
                    if attempts > BUSY_RETRY_LIMIT {
                        warn!("Commander: {} still busy after {} attempts", name, attempts);
                        return Err(CommandError::Busy {
                            command: name,
                            attempts,
                        });
                    }
                    counter!(metric_defs::BUSY_RETRIES.name, "command" => name).increment(1);
                    trace!("Commander: {} busy, retrying (attempt {})", name, attempts);
                    self.clock.sleep(BUSY_RETRY_DELAY);
                }
                Err(e) => {
                    if !self.handle_unsolicited(&response) {
                        debug!("Commander: {} unexpected response '{}'", name, response);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Drain all buffered input without blocking.
    ///
    /// Stray `OK` and busy lines are dropped; everything else is classified.
    pub fn process(&mut self) {
        loop {
            match self.transport.read_line(false) {
                Ok(Some(line)) => {
                    if line == OK_INDICATOR || line == BUSY_INDICATOR {
                        trace!("Commander: dropping stray '{}'", line);
                        continue;
                    }
                    if !self.handle_unsolicited(&line) {
                        debug!("Commander: unprocessable line '{}'", line);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Commander: read failed while draining: {}", e);
                    break;
                }
            }
        }
    }

    /// Classify a line. Returns `false` if it was not recognised.
    fn handle_unsolicited(&mut self, line: &str) -> bool {
        match classify(line) {
            Unsolicited::Event(event) => {
                counter!(metric_defs::UNSOLICITED_EVENTS.name, "event" => event.kind().to_string())
                    .increment(1);
                debug!("Commander: event {}", event);
                self.events.push_back(event);
                true
            }
            Unsolicited::Ignored => true,
            Unsolicited::Unrecognized => {
                counter!(metric_defs::UNRECOGNIZED_LINES.name).increment(1);
                false
            }
        }
    }

    /// Take the oldest queued event.
    pub fn next_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Send an empty line to wake the module.
    pub fn poke(&mut self) -> CommandResult {
        self.transport.poke()?;
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
