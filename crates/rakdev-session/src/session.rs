//! LoRaWAN session state machine.
//!
//! A [`Session`] owns the [`Commander`] and drives the module through
//! bring-up, joining and steady-state operation. The host calls
//! [`Session::process`] periodically; everything the module reports
//! asynchronously is routed from there (or from inside any exchange) to the
//! state machine and then to registered listeners.
//!
//! # States
//!
//! ```text
//! Uninitialized --setup--> Initialised --join accepted--> JoinPending
//! JoinPending  --JOINED / NJS=1--> JoinSuccess
//! JoinPending  --JOIN_FAILED_* / request error--> JoinFailure
//! JoinFailure  --rejoin interval--> JoinPending
//! active       --suspend--> Suspended --resume--> previous state
//! any          --teardown--> Uninitialized
//! ```

use std::fmt;
use std::time::Duration;

use metrics::counter;
use rakdev_at_protocol::{
    catalog, iso8601, Action, ApiVersionQuery, BooleanCommand, ChannelRssiQuery, ClassCommand,
    Command, CommandResult, DeviceClass, Event, HardwareIdQuery, HardwareModelQuery, HexCommand,
    IntegerCommand, JoinCommand, JoinMode, JoinOutcome, JoinStatusQuery, LinkCheckCommand,
    LinkCheckMode, LocalTimeQuery, Mode, Port, ReceiveQuery, ReceiveStatus, RssiQuery,
    SendCommand, SendStatusQuery, SerialNumberQuery, SnrQuery, TimeRequestCommand, VersionQuery,
    EVENT_BEACON, EVENT_CURRENT_WORK_MODE, EVENT_PING_SLOT, EVENT_RESTRICTED_WAIT,
};
use rakdev_metrics::metric_defs;
use tracing::{debug, info, warn};

use crate::{
    Clock, Commander, Identity, IntervalTimer, LineTransport, SessionConfig, SessionError,
    SessionResult, Status,
};

/// Wait after a transmit before looking for its confirmation.
pub const TRANSMIT_CONFIRMATION_DELAY: Duration = Duration::from_millis(100);

/// Wait after waking the module before talking to it.
pub const RESUME_DELAY: Duration = Duration::from_millis(100);

/// Wait after a network mode change for the module to restart its stack.
pub const MODE_SWITCH_DELAY: Duration = Duration::from_millis(250);

const EVENT_TX_DONE: &str = "TX_DONE";

// ============================================================================
// State and events
// ============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// Configured, about to join.
    Initialised,
    Suspended,
    JoinPending,
    JoinSuccess,
    JoinFailure,
}

impl SessionState {
    /// States in which periodic processing runs.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::JoinPending | SessionState::JoinSuccess | SessionState::JoinFailure
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "Uninitialized",
            SessionState::Initialised => "Initialised",
            SessionState::Suspended => "Suspended",
            SessionState::JoinPending => "JoinPending",
            SessionState::JoinSuccess => "JoinSuccess",
            SessionState::JoinFailure => "JoinFailure",
        };
        f.write_str(name)
    }
}

/// Notification delivered to session listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    JoinPending,
    JoinSuccess { dev_addr: Option<String> },
    JoinFailure { reason: String },
    DataReceived { port: Port, payload: Vec<u8> },
    TransmitSuccess,
    TransmitFailure,
}

/// What [`Session::transmit`] learned about delivery before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Not awaited; the outcome will arrive as a listener event.
    Pending,
    Confirmed,
    /// The network reported the uplink as not delivered.
    Rejected,
    /// No outcome yet; it may still arrive as a listener event.
    Unknown,
}

/// Handle returned by [`Session::add_event_listener`].
pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&SessionEvent) + Send>;

struct Timers {
    rejoin: IntervalTimer,
    status: IntervalTimer,
    link_check: IntervalTimer,
    network_time: IntervalTimer,
    /// Duty cycle restriction announced by the module; inactive when zero.
    restriction: IntervalTimer,
}

// ============================================================================
// Session
// ============================================================================

/// Drives one module through its LoRaWAN lifecycle.
pub struct Session<T, C> {
    config: SessionConfig,
    commander: Commander<T, C>,
    clock: C,
    state: SessionState,
    resume_state: Option<SessionState>,
    status: Status,
    timers: Timers,
    transmit_pending: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: ListenerId,
}

impl<T: LineTransport, C: Clock> Session<T, C> {
    pub fn new(config: SessionConfig, transport: T, clock: C) -> Self {
        let intervals = config.intervals;
        Session {
            commander: Commander::new(transport, clock.clone()),
            clock,
            state: SessionState::Uninitialized,
            resume_state: None,
            status: Status::default(),
            timers: Timers {
                rejoin: IntervalTimer::new(intervals.rejoin()),
                status: IntervalTimer::new(intervals.status()),
                link_check: IntervalTimer::new(intervals.link_check()),
                network_time: IntervalTimer::new(intervals.network_time()),
                restriction: IntervalTimer::inactive(),
            },
            transmit_pending: false,
            listeners: Vec::new(),
            next_listener_id: 0,
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Whether the device has joined and can transmit.
    pub fn is_available(&self) -> bool {
        self.state == SessionState::JoinSuccess
    }

    /// Register a listener for session events.
    pub fn add_event_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Configure the module and start joining.
    ///
    /// Steps run in a fixed order and the first failure aborts the rest.
    /// On success the session is `JoinPending`, or `JoinFailure` if the join
    /// request itself was refused.
    pub fn setup(&mut self) -> SessionResult {
        if self.state != SessionState::Uninitialized {
            return Err(SessionError::InvalidState {
                operation: "setup",
                state: self.state,
            });
        }
        self.abandon_transmit();
        let operation = self.config.operation;
        info!(
            "Session: setup (mode={}, band={}, class={}, join={})",
            operation.mode, operation.band, operation.class, operation.join
        );

        self.read_identity()?;
        self.configure_network()?;
        self.configure_identifiers()?;
        self.configure_radio()?;

        self.set_state(SessionState::Initialised);
        self.join_commence();
        Ok(())
    }

    /// Put the module to sleep and forget the session.
    pub fn teardown(&mut self) {
        if self.state == SessionState::Uninitialized {
            return;
        }
        if self.state.is_active() {
            if let Err(e) = self.suspend() {
                warn!("Session: teardown could not suspend: {}", e);
            }
        }
        self.resume_state = None;
        self.abandon_transmit();
        self.set_state(SessionState::Uninitialized);
    }

    /// Put the module to sleep, remembering the current state.
    ///
    /// Only an active session can be suspended.
    pub fn suspend(&mut self) -> SessionResult {
        if !self.state.is_active() {
            return Err(SessionError::InvalidState {
                operation: "suspend",
                state: self.state,
            });
        }
        self.issue(&mut Action::sleep())?;
        self.resume_state = Some(self.state);
        self.set_state(SessionState::Suspended);
        Ok(())
    }

    /// Wake the module and return to the state held before suspending.
    pub fn resume(&mut self) -> SessionResult {
        if self.state != SessionState::Suspended {
            return Err(SessionError::InvalidState {
                operation: "resume",
                state: self.state,
            });
        }
        self.commander.poke()?;
        self.clock.sleep(RESUME_DELAY);
        let state = self.resume_state.take().unwrap_or(SessionState::Uninitialized);
        self.set_state(state);
        self.refresh_status();
        Ok(())
    }

    /// Periodic tick: drain input, then run whatever recurring work is due.
    pub fn process(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.pump_events();
        self.update_restriction();

        let now = self.clock.now();
        match self.state {
            SessionState::JoinPending => {
                if self.timers.rejoin.is_due(now) {
                    self.poll_join_status();
                }
            }
            SessionState::JoinFailure => {
                if self.timers.rejoin.is_due(now) {
                    info!("Session: retrying join");
                    self.join_commence();
                }
            }
            SessionState::JoinSuccess => {
                if self.timers.status.is_due(now) {
                    self.refresh_status();
                    self.refresh_network_time();
                }
                if self.state == SessionState::JoinSuccess
                    && self.timers.link_check.is_due(self.clock.now())
                {
                    self.request_link_check();
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// Send an uplink.
    ///
    /// Refused without wire traffic unless joined. With
    /// `await_confirmation`, waits briefly, dispatches any events that
    /// arrived, and polls the send status if the outcome is still open.
    pub fn transmit(
        &mut self,
        port: Port,
        payload: &[u8],
        await_confirmation: bool,
    ) -> SessionResult<Confirmation> {
        if self.state != SessionState::JoinSuccess {
            return Err(SessionError::NotJoined { state: self.state });
        }

        // Outcomes already queued belong to earlier uplinks.
        self.pump_events();

        let mut send = SendCommand::from_bytes(port, payload);
        debug!("Session: transmit port={}, {}", port, describe_payload(payload));
        self.transmit_pending = true;
        if let Err(e) = self.issue(&mut send) {
            self.transmit_pending = false;
            return Err(e.into());
        }
        self.status.transmits.bump(self.clock.now());
        counter!(metric_defs::TRANSMITS.name).increment(1);

        if !await_confirmation {
            return Ok(Confirmation::Pending);
        }

        self.clock.sleep(TRANSMIT_CONFIRMATION_DELAY);
        self.pump_events();
        if !self.transmit_pending {
            return Ok(match self.status.transmit_confirmation.get() {
                Some(true) => Confirmation::Confirmed,
                Some(false) => Confirmation::Rejected,
                None => Confirmation::Unknown,
            });
        }

        let mut send_status = SendStatusQuery::new();
        match self.issue(&mut send_status) {
            Ok(()) if send_status.output() == Some(&true) => {
                self.resolve_transmit(true);
                Ok(Confirmation::Confirmed)
            }
            Ok(()) => {
                self.status.transmit_confirmation.invalidate(self.clock.now());
                Ok(Confirmation::Unknown)
            }
            Err(e) => {
                debug!("Session: send status unavailable: {}", e);
                self.status.transmit_confirmation.invalidate(self.clock.now());
                Ok(Confirmation::Unknown)
            }
        }
    }

    /// Poll the module for held downlink data (`AT+RECV`).
    pub fn poll_downlink(&mut self) -> SessionResult<Option<(Port, Vec<u8>)>> {
        let mut receive = ReceiveQuery::new();
        self.issue(&mut receive)?;
        let Some(Some(downlink)) = receive.into_output() else {
            return Ok(None);
        };
        let payload = hex::decode(&downlink.payload_hex).unwrap_or_default();
        Ok(Some((downlink.port, payload)))
    }

    // ========================================================================
    // Bring-up steps
    // ========================================================================

    fn step(&mut self, step: &'static str, command: &mut dyn Command) -> SessionResult {
        self.issue(command).map_err(|source| {
            warn!("Session: setup step '{}' failed: {}", step, source);
            SessionError::Setup { step, source }
        })
    }

    fn read_identity(&mut self) -> SessionResult {
        let mut version = VersionQuery::new();
        let mut model = HardwareModelQuery::new();
        let mut hardware_id = HardwareIdQuery::new();
        let mut serial = SerialNumberQuery::new();
        let mut api = ApiVersionQuery::new();
        self.step("firmware version", &mut version)?;
        self.step("hardware model", &mut model)?;
        self.step("hardware id", &mut hardware_id)?;
        self.step("serial number", &mut serial)?;
        self.step("api version", &mut api)?;

        self.status.identity = Identity {
            version: version.into_output().unwrap_or_default(),
            hardware_model: model.into_output().unwrap_or_default(),
            hardware_id: hardware_id.into_output().unwrap_or_default(),
            serial_number: serial.into_output().unwrap_or_default(),
            api_version: api.into_output().unwrap_or_default(),
        };
        info!(
            "Session: module {} ({}), firmware {}, serial {}",
            self.status.identity.hardware_model,
            self.status.identity.hardware_id,
            self.status.identity.version,
            self.status.identity.serial_number
        );
        Ok(())
    }

    fn configure_network(&mut self) -> SessionResult {
        let operation = self.config.operation;
        self.step(
            "network mode",
            &mut IntegerCommand::set(&catalog::NETWORK_MODE, operation.mode.code()),
        )?;

        // A mode change restarts the stack, which prints a banner.
        self.clock.sleep(MODE_SWITCH_DELAY);
        self.commander
            .poke()
            .map_err(|source| SessionError::Setup { step: "wake", source })?;
        self.pump_events();

        self.step(
            "join mode",
            &mut IntegerCommand::set(&catalog::JOIN_MODE, operation.join.code()),
        )?;
        self.step("class", &mut ClassCommand::set(operation.class))?;
        self.step(
            "band",
            &mut IntegerCommand::set(&catalog::BAND, operation.band.code()),
        )
    }

    fn configure_identifiers(&mut self) -> SessionResult {
        let identifiers = self.config.identifiers.clone();
        self.step(
            "device EUI",
            &mut HexCommand::set(&catalog::DEV_EUI, identifiers.dev_eui),
        )?;
        self.step(
            "application EUI",
            &mut HexCommand::set(&catalog::APP_EUI, identifiers.app_eui),
        )?;
        self.step(
            "application key",
            &mut HexCommand::set(&catalog::APP_KEY, identifiers.app_key),
        )?;
        if self.config.operation.join == JoinMode::Abp {
            if let Some(dev_addr) = identifiers.dev_addr {
                self.step(
                    "device address",
                    &mut HexCommand::set(&catalog::DEV_ADDR, dev_addr),
                )?;
            }
        }
        Ok(())
    }

    fn configure_radio(&mut self) -> SessionResult {
        let parameters = self.config.parameters;
        self.step(
            "confirm mode",
            &mut BooleanCommand::set(&catalog::CONFIRM_MODE, parameters.confirm_mode),
        )?;
        self.step(
            "duty cycle",
            &mut BooleanCommand::set(&catalog::DUTY_CYCLE, parameters.duty_cycle),
        )?;
        self.step(
            "data rate",
            &mut IntegerCommand::set(&catalog::DATA_RATE, parameters.data_rate.code()),
        )?;
        self.step(
            "tx power",
            &mut IntegerCommand::set(&catalog::TX_POWER, parameters.tx_power.code()),
        )?;
        self.step(
            "adaptive data rate",
            &mut BooleanCommand::set(&catalog::ADAPTIVE_DATA_RATE, parameters.adaptive_data_rate),
        )?;
        self.step(
            "public network",
            &mut BooleanCommand::set(&catalog::PUBLIC_NETWORK, parameters.public_network),
        )?;
        self.step(
            "rx1 delay",
            &mut IntegerCommand::set(&catalog::RX1_DELAY, parameters.rx1_delay_secs),
        )?;
        self.step(
            "rx2 delay",
            &mut IntegerCommand::set(&catalog::RX2_DELAY, parameters.rx2_delay_secs),
        )?;
        self.step(
            "rx2 data rate",
            &mut IntegerCommand::set(&catalog::RX2_DATA_RATE, parameters.rx2_data_rate.code()),
        )
    }

    // ========================================================================
    // Join handling
    // ========================================================================

    fn join_commence(&mut self) {
        let parameters = self.config.parameters;
        let mut join = JoinCommand::join(
            parameters.auto_join,
            parameters.join_reattempt_delay_secs,
            parameters.join_attempts,
        );
        counter!(metric_defs::JOIN_ATTEMPTS.name).increment(1);

        // Outcomes seen during the exchange are dispatched after the
        // transition so a fast JOINED is not overwritten by JoinPending.
        self.pump_events();
        match self.commander.issue(&mut join) {
            Ok(()) => self.join_pending(),
            Err(e) => self.join_failure(format!("join request failed: {}", e)),
        }
        self.dispatch_events();
    }

    fn join_pending(&mut self) {
        self.timers.rejoin.reset(self.clock.now());
        self.set_state(SessionState::JoinPending);
        self.emit(SessionEvent::JoinPending);
    }

    fn join_failure(&mut self, reason: String) {
        warn!("Session: join failed: {}", reason);
        counter!(metric_defs::JOIN_FAILURES.name).increment(1);
        self.timers.rejoin.reset(self.clock.now());
        self.set_state(SessionState::JoinFailure);
        self.emit(SessionEvent::JoinFailure { reason });
    }

    fn join_success(&mut self) {
        let mut dev_addr = HexCommand::query(&catalog::DEV_ADDR);
        match self.issue(&mut dev_addr) {
            Ok(()) => self.status.dev_addr = Some(dev_addr.value().to_string()),
            Err(e) => debug!("Session: device address unavailable: {}", e),
        }
        self.refresh_status();

        let now = self.clock.now();
        self.timers.status.reset(now);
        self.timers.link_check.reset(now);
        counter!(metric_defs::JOIN_SUCCESSES.name).increment(1);
        info!(
            "Session: joined, dev_addr={}",
            self.status.dev_addr.as_deref().unwrap_or("unknown")
        );
        self.set_state(SessionState::JoinSuccess);
        self.emit(SessionEvent::JoinSuccess {
            dev_addr: self.status.dev_addr.clone(),
        });
    }

    fn poll_join_status(&mut self) {
        let mut join_status = JoinStatusQuery::new();
        match self.issue(&mut join_status) {
            Ok(()) if join_status.output() == Some(&true) => {
                if self.state == SessionState::JoinPending {
                    self.join_success();
                }
            }
            Ok(()) => {
                if self.state == SessionState::JoinPending {
                    info!("Session: still not joined, recommencing join");
                    self.join_commence();
                }
            }
            Err(e) => warn!("Session: join status poll failed: {}", e),
        }
    }

    fn on_join_outcome(&mut self, join: JoinCommand) {
        if matches!(
            self.state,
            SessionState::Uninitialized | SessionState::Suspended
        ) {
            debug!("Session: ignoring join outcome while {}", self.state);
            return;
        }
        match join.outcome() {
            Some(JoinOutcome::Joined) => self.join_success(),
            Some(JoinOutcome::Failed(reason)) => self.join_failure(reason.clone()),
            None => {}
        }
    }

    // ========================================================================
    // Periodic status
    // ========================================================================

    fn refresh_status(&mut self) {
        let mut rssi = RssiQuery::new();
        let mut snr = SnrQuery::new();
        let signal = self
            .issue(&mut rssi)
            .and_then(|()| self.issue(&mut snr));
        let now = self.clock.now();
        match (signal, rssi.output(), snr.output()) {
            (Ok(()), Some(&rssi), Some(&snr)) => {
                self.status.receive.update(ReceiveStatus { rssi, snr }, now);
            }
            (result, _, _) => {
                if let Err(e) = result {
                    debug!("Session: signal quality unavailable: {}", e);
                }
                self.status.receive.invalidate(now);
            }
        }

        let mut channels = ChannelRssiQuery::new();
        let result = self.issue(&mut channels);
        let now = self.clock.now();
        match (result, channels.into_output()) {
            (Ok(()), Some(readings)) => self.status.channels.update(readings, now),
            (result, _) => {
                if let Err(e) = result {
                    debug!("Session: channel RSSI unavailable: {}", e);
                }
                self.status.channels.invalidate(now);
            }
        }
    }

    fn refresh_network_time(&mut self) {
        if self.status.network_time.is_valid()
            && !self.timers.network_time.is_due(self.clock.now())
        {
            return;
        }
        if let Err(e) = self.issue(&mut TimeRequestCommand::new()) {
            warn!("Session: network time request failed: {}", e);
            self.status.network_time.invalidate(self.clock.now());
        }
    }

    fn on_time_request(&mut self, succeeded: bool) {
        if !succeeded {
            debug!("Session: network time request failed");
            self.status.network_time.invalidate(self.clock.now());
            return;
        }
        let mut local_time = LocalTimeQuery::new();
        let result = self.issue(&mut local_time);
        let now = self.clock.now();
        match (result, local_time.into_output()) {
            (Ok(()), Some(time)) => {
                info!("Session: network time {}", iso8601(&time));
                self.status.network_time.update(time, now);
                self.timers.network_time.reset(now);
            }
            (result, _) => {
                if let Err(e) = result {
                    warn!("Session: network time unavailable: {}", e);
                }
                self.status.network_time.invalidate(now);
            }
        }
    }

    fn request_link_check(&mut self) {
        if let Err(e) = self.issue(&mut LinkCheckCommand::new(LinkCheckMode::Once)) {
            warn!("Session: link check request failed: {}", e);
        }
    }

    fn on_link_check(&mut self, link_check: &LinkCheckCommand) {
        let now = self.clock.now();
        match link_check.status() {
            Some(status) => {
                debug!("Session: link check {}", status);
                self.status.link.update(*status, now);
            }
            None => {
                debug!("Session: link check failed");
                self.status.link.invalidate(now);
            }
        }
    }

    fn update_restriction(&mut self) {
        if !self.timers.restriction.is_active() {
            return;
        }
        let now = self.clock.now();
        if self.timers.restriction.is_due(now) {
            info!("Session: duty cycle restriction lifted");
            self.timers.restriction = IntervalTimer::inactive();
        } else {
            debug!(
                "Session: duty cycle restriction, {} s remaining",
                self.timers.restriction.remaining(now).as_secs()
            );
        }
    }

    // ========================================================================
    // Event routing
    // ========================================================================

    /// Drain the transport and dispatch everything it produced.
    fn pump_events(&mut self) {
        self.commander.process();
        self.dispatch_events();
    }

    fn dispatch_events(&mut self) {
        while let Some(event) = self.commander.next_event() {
            self.route_event(&event);
        }
    }

    /// One exchange with events dispatched before and after it.
    fn issue(&mut self, command: &mut dyn Command) -> CommandResult {
        self.pump_events();
        let result = self.commander.issue(command);
        self.dispatch_events();
        result
    }

    fn route_event(&mut self, event: &Event) {
        match event.kind() {
            kind if kind.starts_with("JOIN") => match JoinCommand::from_event(event) {
                Some(join) => self.on_join_outcome(join),
                None => debug!("Session: unhandled join event {}", event),
            },
            kind if kind.starts_with("SEND") => {
                match SendCommand::from_event(event).and_then(|send| send.confirmed()) {
                    Some(delivered) => self.resolve_transmit(delivered),
                    None => debug!("Session: unhandled send event {}", event),
                }
            }
            EVENT_TX_DONE => self.on_transmit_done(),
            kind if kind.starts_with("LINKCHECK") => {
                self.on_link_check(&LinkCheckCommand::from_event(event))
            }
            kind if kind.starts_with("TIMEREQ") => {
                match TimeRequestCommand::from_event(event).and_then(|time| time.succeeded()) {
                    Some(succeeded) => self.on_time_request(succeeded),
                    None => debug!("Session: unhandled time event {}", event),
                }
            }
            "RX_1" | "RX_2" => self.on_receive(event.args(), DeviceClass::A),
            "RX_B" => {
                let class = if event.args().contains("UNICAST") {
                    DeviceClass::B
                } else {
                    DeviceClass::C
                };
                self.on_receive(event.args(), class)
            }
            EVENT_RESTRICTED_WAIT => self.on_restricted_wait(event.args()),
            EVENT_CURRENT_WORK_MODE => match Mode::from_banner_name(event.args()) {
                Some(mode) => info!("Session: module work mode {}", mode),
                None => debug!("Session: unknown work mode '{}'", event.args()),
            },
            EVENT_BEACON | EVENT_PING_SLOT => debug!("Session: {}", event),
            _ => debug!("Session: unhandled event {}", event),
        }
    }

    fn resolve_transmit(&mut self, delivered: bool) {
        let now = self.clock.now();
        self.status.transmit_confirmation.update(delivered, now);
        if delivered {
            self.status.transmit_successes.bump(now);
            counter!(metric_defs::TRANSMIT_SUCCESSES.name).increment(1);
        } else {
            self.status.transmit_failures.bump(now);
            counter!(metric_defs::TRANSMIT_FAILURES.name).increment(1);
        }
        if !self.transmit_pending {
            debug!("Session: transmit outcome with nothing in flight");
            return;
        }
        self.transmit_pending = false;
        if delivered {
            debug!("Session: transmit confirmed");
            self.emit(SessionEvent::TransmitSuccess);
        } else {
            debug!("Session: transmit not confirmed");
            self.emit(SessionEvent::TransmitFailure);
        }
    }

    /// Tell listeners an uplink still in flight will get no outcome.
    fn abandon_transmit(&mut self) {
        if self.transmit_pending {
            self.transmit_pending = false;
            info!("Session: abandoning in-flight transmit");
            self.emit(SessionEvent::TransmitFailure);
        }
    }

    /// Unconfirmed uplinks get no confirmation event; `TX_DONE` completes them.
    fn on_transmit_done(&mut self) {
        if !self.config.parameters.confirm_mode && self.transmit_pending {
            self.resolve_transmit(true);
        } else {
            debug!("Session: transmit done");
        }
    }

    fn on_receive(&mut self, args: &str, class: DeviceClass) {
        let Some(frame) = parse_receive(args) else {
            warn!("Session: malformed receive event '{}'", args);
            return;
        };
        let now = self.clock.now();
        self.status.receive.update(
            ReceiveStatus {
                rssi: frame.rssi,
                snr: frame.snr,
            },
            now,
        );
        self.status.receives.bump(now);
        counter!(metric_defs::RECEIVES.name, "class" => class.to_string()).increment(1);
        counter!(metric_defs::RECEIVED_BYTES.name).increment(frame.payload.len() as u64);
        info!(
            "Session: received class={}, port={}, rssi={}, snr={}, {}",
            class,
            frame.port,
            frame.rssi,
            frame.snr,
            describe_payload(&frame.payload)
        );
        self.emit(SessionEvent::DataReceived {
            port: frame.port,
            payload: frame.payload,
        });
    }

    fn on_restricted_wait(&mut self, args: &str) {
        match args.trim().parse::<u64>() {
            Ok(millis) => {
                let wait = Duration::from_millis(millis);
                info!("Session: duty cycle restricted for {} min", wait.as_secs() / 60);
                self.timers.restriction.reset_with(wait, self.clock.now());
            }
            Err(_) => debug!("Session: unreadable restriction '{}'", args),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("Session: {} -> {}", self.state, state);
            self.state = state;
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

/// Fields of an `RX_*` event: `rssi:snr:mode:port:hex`.
struct ReceivedFrame {
    rssi: i32,
    snr: i32,
    port: Port,
    payload: Vec<u8>,
}

fn parse_receive(args: &str) -> Option<ReceivedFrame> {
    let mut fields = args.splitn(5, ':');
    let rssi = fields.next()?.trim().parse().ok()?;
    let snr = fields.next()?.trim().parse().ok()?;
    let _mode = fields.next()?;
    let port = fields.next()?.trim().parse().ok()?;
    let payload = hex::decode(fields.next().unwrap_or("").trim()).ok()?;
    Some(ReceivedFrame {
        rssi,
        snr,
        port,
        payload,
    })
}

/// `size=N, data=HEX`, plus the text when every byte is printable.
fn describe_payload(payload: &[u8]) -> String {
    let mut description = format!("size={}, data={}", payload.len(), hex::encode_upper(payload));
    if !payload.is_empty() && payload.iter().all(|byte| (0x20..0x7f).contains(byte)) {
        description.push_str(", printable=<<");
        description.push_str(&String::from_utf8_lossy(payload));
        description.push_str(">>");
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_receive() {
        let frame = parse_receive("-70:8:UNICAST:2:48656C6C6F").unwrap();
        assert_eq!(frame.rssi, -70);
        assert_eq!(frame.snr, 8);
        assert_eq!(frame.port, 2);
        assert_eq!(frame.payload, b"Hello");

        let empty = parse_receive("-100:-5:UNICAST:0:").unwrap();
        assert!(empty.payload.is_empty());

        assert!(parse_receive("-70:8:UNICAST").is_none());
        assert!(parse_receive("-70:x:UNICAST:1:AA").is_none());
        assert!(parse_receive("-70:8:UNICAST:1:ABC").is_none());
    }

    #[test]
    fn test_describe_payload() {
        assert_eq!(
            describe_payload(b"hi"),
            "size=2, data=6869, printable=<<hi>>"
        );
        assert_eq!(describe_payload(&[0x00, 0xFF]), "size=2, data=00FF");
        assert_eq!(describe_payload(&[]), "size=0, data=");
    }

    #[test]
    fn test_state_activity() {
        assert!(SessionState::JoinPending.is_active());
        assert!(SessionState::JoinSuccess.is_active());
        assert!(SessionState::JoinFailure.is_active());
        assert!(!SessionState::Suspended.is_active());
        assert!(!SessionState::Uninitialized.is_active());
        assert_eq!(SessionState::JoinSuccess.to_string(), "JoinSuccess");
    }
}
