//! Queued uplinks with retry, and buffered downlinks.
//!
//! The [`Messenger`] sits on top of a [`Session`] and hands it one queued
//! message at a time. The outcome arrives later as a session event: success
//! pops the message, failure pushes its schedule back by [`RETRY_DELAY`].
//! Downlinks are buffered for the consumer to drain with
//! [`Messenger::receive`].
//!
//! Queues are guarded by their own locks so producers on other threads can
//! enqueue through a [`MessengerHandle`] while the owner ticks. Locks are
//! never held across a transmit; the in-flight flag keeps it one at a time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use parking_lot::Mutex;
use rakdev_at_protocol::Port;
use rakdev_metrics::metric_defs;
use tracing::{debug, info, warn};

use crate::{Clock, LineTransport, ListenerId, Session, SessionEvent};

/// Delay before a failed message is offered to the session again.
pub const RETRY_DELAY: Duration = Duration::from_secs(30);

/// A queued uplink or a buffered downlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub port: Port,
    pub payload: Vec<u8>,
    /// Informational. The module confirms uplinks according to the
    /// session-wide `confirm_mode`, not per message.
    pub confirmed: bool,
    /// Earliest send time for uplinks, arrival time for downlinks.
    pub scheduled_at: Duration,
    /// Times this message was handed to the session.
    pub attempts: u32,
    id: u64,
}

impl Message {
    /// An uplink, due immediately.
    pub fn new(port: Port, payload: impl Into<Vec<u8>>, confirmed: bool) -> Self {
        Message {
            port,
            payload: payload.into(),
            confirmed,
            scheduled_at: Duration::ZERO,
            attempts: 0,
            id: 0,
        }
    }
}

/// Transmit counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessengerStats {
    pub transmits_attempted: u64,
    pub transmits_succeeded: u64,
    pub transmits_failed: u64,
    pub retransmits_attempted: u64,
}

/// State shared between the messenger, its handles and the session listener.
struct Shared {
    transmit_queue: Mutex<VecDeque<Message>>,
    receive_queue: Mutex<VecDeque<Message>>,
    in_flight: AtomicBool,
    stats: Mutex<MessengerStats>,
    next_id: AtomicU64,
}

impl Shared {
    fn enqueue(&self, mut message: Message) -> usize {
        message.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut queue = self.transmit_queue.lock();
        queue.push_back(message);
        gauge!(metric_defs::TRANSMIT_QUEUE_DEPTH.name).set(queue.len() as f64);
        queue.len()
    }

    fn receive(&self) -> Option<Message> {
        let mut queue = self.receive_queue.lock();
        let message = queue.pop_front();
        gauge!(metric_defs::RECEIVE_QUEUE_DEPTH.name).set(queue.len() as f64);
        message
    }

    fn on_session_event(&self, event: &SessionEvent, now: Duration) {
        match event {
            SessionEvent::TransmitSuccess => {
                if !self.in_flight.swap(false, Ordering::SeqCst) {
                    return;
                }
                let mut queue = self.transmit_queue.lock();
                if let Some(message) = queue.pop_front() {
                    debug!(
                        "Messenger: delivered port={} after {} attempt(s)",
                        message.port, message.attempts
                    );
                }
                gauge!(metric_defs::TRANSMIT_QUEUE_DEPTH.name).set(queue.len() as f64);
                self.stats.lock().transmits_succeeded += 1;
            }
            SessionEvent::TransmitFailure => {
                if !self.in_flight.swap(false, Ordering::SeqCst) {
                    return;
                }
                if let Some(message) = self.transmit_queue.lock().front_mut() {
                    message.scheduled_at = now + RETRY_DELAY;
                    info!(
                        "Messenger: port={} not delivered, retrying in {} s",
                        message.port,
                        RETRY_DELAY.as_secs()
                    );
                }
                self.stats.lock().transmits_failed += 1;
            }
            SessionEvent::DataReceived { port, payload } => {
                let mut queue = self.receive_queue.lock();
                queue.push_back(Message {
                    port: *port,
                    payload: payload.clone(),
                    confirmed: false,
                    scheduled_at: now,
                    attempts: 0,
                    id: 0,
                });
                gauge!(metric_defs::RECEIVE_QUEUE_DEPTH.name).set(queue.len() as f64);
            }
            _ => {}
        }
    }
}

/// Cloneable producer/consumer access to a messenger's queues.
#[derive(Clone)]
pub struct MessengerHandle {
    shared: Arc<Shared>,
}

impl MessengerHandle {
    /// Queue an uplink; it is sent on the owner's next tick.
    pub fn enqueue(&self, message: Message) -> usize {
        self.shared.enqueue(message)
    }

    pub fn receive(&self) -> Option<Message> {
        self.shared.receive()
    }

    pub fn transmit_queue_size(&self) -> usize {
        self.shared.transmit_queue.lock().len()
    }

    pub fn receive_queue_size(&self) -> usize {
        self.shared.receive_queue.lock().len()
    }

    pub fn stats(&self) -> MessengerStats {
        *self.shared.stats.lock()
    }
}

/// Serialises uplinks through a [`Session`], one in flight at a time.
pub struct Messenger<T, C> {
    session: Session<T, C>,
    shared: Arc<Shared>,
    listener: ListenerId,
}

impl<T: LineTransport, C: Clock> Messenger<T, C> {
    pub fn new(mut session: Session<T, C>) -> Self {
        let shared = Arc::new(Shared {
            transmit_queue: Mutex::new(VecDeque::new()),
            receive_queue: Mutex::new(VecDeque::new()),
            in_flight: AtomicBool::new(false),
            stats: Mutex::new(MessengerStats::default()),
            next_id: AtomicU64::new(1),
        });
        let listener_shared = Arc::clone(&shared);
        let clock = session.clock().clone();
        let listener = session.add_event_listener(move |event| {
            listener_shared.on_session_event(event, clock.now());
        });
        Messenger {
            session,
            shared,
            listener,
        }
    }

    /// Queue an uplink and try to send it straight away.
    pub fn transmit(&mut self, mut message: Message) {
        message.scheduled_at = message.scheduled_at.max(self.session.clock().now());
        let depth = self.shared.enqueue(message);
        debug!("Messenger: queued, {} pending", depth);
        self.advance();
    }

    /// Take the oldest buffered downlink.
    pub fn receive(&mut self) -> Option<Message> {
        self.shared.receive()
    }

    /// Tick the session, then offer the next due message.
    pub fn process(&mut self) {
        self.session.process();
        self.advance();
    }

    pub fn transmit_queue_size(&self) -> usize {
        self.shared.transmit_queue.lock().len()
    }

    pub fn receive_queue_size(&self) -> usize {
        self.shared.receive_queue.lock().len()
    }

    /// Copy of the transmit queue, front first.
    pub fn transmit_queue_snapshot(&self) -> Vec<Message> {
        self.shared.transmit_queue.lock().iter().cloned().collect()
    }

    pub fn is_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> MessengerStats {
        *self.shared.stats.lock()
    }

    pub fn handle(&self) -> MessengerHandle {
        MessengerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn session(&self) -> &Session<T, C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T, C> {
        &mut self.session
    }

    /// Detach from the session and give it back.
    pub fn into_session(mut self) -> Session<T, C> {
        self.session.remove_event_listener(self.listener);
        self.session
    }

    fn advance(&mut self) {
        if self.shared.in_flight.load(Ordering::SeqCst) || !self.session.is_available() {
            return;
        }
        let now = self.session.clock().now();
        let due = self
            .shared
            .transmit_queue
            .lock()
            .front()
            .filter(|message| message.scheduled_at <= now)
            .cloned();
        let Some(message) = due else {
            return;
        };

        // Set before the hand-off: the outcome can arrive inside the exchange.
        self.shared.in_flight.store(true, Ordering::SeqCst);
        match self
            .session
            .transmit(message.port, &message.payload, false)
        {
            Ok(_) => {
                if let Some(front) = self
                    .shared
                    .transmit_queue
                    .lock()
                    .iter_mut()
                    .find(|queued| queued.id == message.id)
                {
                    front.attempts += 1;
                }
                let mut stats = self.shared.stats.lock();
                stats.transmits_attempted += 1;
                if message.attempts > 0 {
                    stats.retransmits_attempted += 1;
                    counter!(metric_defs::RETRANSMITS.name).increment(1);
                    debug!(
                        "Messenger: retransmit port={}, attempt {}",
                        message.port,
                        message.attempts + 1
                    );
                }
            }
            Err(e) => {
                self.shared.in_flight.store(false, Ordering::SeqCst);
                warn!("Messenger: transmit not accepted: {}", e);
            }
        }
    }
}
