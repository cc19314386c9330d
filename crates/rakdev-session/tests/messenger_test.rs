//! Messenger queueing and retry tests.

mod common;

use std::thread;
use std::time::Duration;

use common::{joined_session, new_session, test_config};
use rakdev_session::{Clock, Message, Messenger, MessengerStats, SessionState, RETRY_DELAY};

const FIRST: &str = "AT+SEND=1:6F6E65";
const SECOND: &str = "AT+SEND=2:74776F";

#[test]
fn test_failure_reschedules_front_and_retries_after_delay() {
    let (session, module, clock) = joined_session();
    let mut messenger = Messenger::new(session);

    messenger.transmit(Message::new(1, b"one".to_vec(), true));
    let queued_at = clock.now();
    messenger.transmit(Message::new(2, b"two".to_vec(), true));
    assert_eq!(module.sent(), vec![FIRST]);
    assert!(messenger.is_in_flight());
    assert_eq!(messenger.transmit_queue_size(), 2);

    module.push_line("+EVT:SEND_CONFIRMED_FAILED");
    let failed_at = clock.now();
    messenger.process();

    let queue = messenger.transmit_queue_snapshot();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].port, 1);
    assert_eq!(queue[0].attempts, 1);
    assert_eq!(queue[0].scheduled_at, failed_at + RETRY_DELAY);
    assert_eq!(queue[1].port, 2);
    assert_eq!(queue[1].attempts, 0);
    assert_eq!(queue[1].scheduled_at, queued_at);
    assert!(!messenger.is_in_flight());
    assert_eq!(module.sent_count(SECOND), 0);

    // Not before the retry delay.
    clock.advance(RETRY_DELAY - Duration::from_secs(1));
    messenger.process();
    assert_eq!(module.sent_count(FIRST), 1);
    assert_eq!(module.sent_count(SECOND), 0);

    clock.advance(Duration::from_secs(2));
    messenger.process();
    assert_eq!(module.sent_count(FIRST), 2);
    assert_eq!(module.sent_count(SECOND), 0);
    assert_eq!(messenger.transmit_queue_snapshot()[0].attempts, 2);

    assert_eq!(
        messenger.stats(),
        MessengerStats {
            transmits_attempted: 2,
            transmits_succeeded: 0,
            transmits_failed: 1,
            retransmits_attempted: 1,
        }
    );
}

#[test]
fn test_success_pops_front_and_sends_next() {
    let (session, module, _clock) = joined_session();
    let mut messenger = Messenger::new(session);

    messenger.transmit(Message::new(1, b"one".to_vec(), true));
    messenger.transmit(Message::new(2, b"two".to_vec(), true));

    module.push_line("+EVT:SEND_CONFIRMED_OK");
    messenger.process();

    let queue = messenger.transmit_queue_snapshot();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].port, 2);
    assert_eq!(module.sent_count(SECOND), 1);
    assert!(messenger.is_in_flight());

    module.push_line("+EVT:SEND_CONFIRMED_OK");
    messenger.process();
    assert_eq!(messenger.transmit_queue_size(), 0);
    assert!(!messenger.is_in_flight());
    assert_eq!(messenger.stats().transmits_succeeded, 2);
    assert_eq!(messenger.stats().retransmits_attempted, 0);
}

#[test]
fn test_received_data_is_buffered() {
    let (session, module, _clock) = joined_session();
    let mut messenger = Messenger::new(session);
    assert!(messenger.receive().is_none());

    module.push_line("+EVT:RX_1:-70:8:UNICAST:2:48656C6C6F");
    module.push_line("+EVT:RX_2:-75:6:UNICAST:3:01");
    messenger.process();

    assert_eq!(messenger.receive_queue_size(), 2);
    let first = messenger.receive().unwrap();
    assert_eq!(first.port, 2);
    assert_eq!(first.payload, b"Hello");
    assert_eq!(messenger.receive().unwrap().port, 3);
    assert!(messenger.receive().is_none());
}

#[test]
fn test_held_until_joined() {
    let (mut session, module, _clock) = new_session(test_config());
    session.setup().unwrap();
    let mut messenger = Messenger::new(session);
    module.clear_sent();

    messenger.transmit(Message::new(1, b"one".to_vec(), true));
    assert!(module.sent().is_empty());
    assert!(!messenger.is_in_flight());
    assert_eq!(messenger.stats(), MessengerStats::default());

    module.push_line("+EVT:JOINED");
    messenger.process();
    assert_eq!(messenger.session().state(), SessionState::JoinSuccess);
    assert_eq!(module.sent_count(FIRST), 1);
    assert!(messenger.is_in_flight());
}

#[test]
fn test_refused_hand_off_leaves_message_queued() {
    let (session, module, _clock) = joined_session();
    let mut messenger = Messenger::new(session);
    for _ in 0..4 {
        module.script("SEND", &["AT_BUSY_ERROR"]);
    }

    messenger.transmit(Message::new(1, b"one".to_vec(), true));

    assert_eq!(messenger.transmit_queue_size(), 1);
    assert_eq!(messenger.transmit_queue_snapshot()[0].attempts, 0);
    assert!(!messenger.is_in_flight());
    assert_eq!(messenger.stats(), MessengerStats::default());
}

#[test]
fn test_handle_enqueues_from_another_thread() {
    let (session, module, _clock) = joined_session();
    let mut messenger = Messenger::new(session);
    let handle = messenger.handle();

    let producer = thread::spawn(move || {
        handle.enqueue(Message::new(2, b"two".to_vec(), false));
        handle.transmit_queue_size()
    });
    assert_eq!(producer.join().unwrap(), 1);

    messenger.process();
    assert_eq!(module.sent_count(SECOND), 1);
}

#[test]
fn test_into_session_detaches() {
    let (session, module, _clock) = joined_session();
    let messenger = Messenger::new(session);
    let handle = messenger.handle();
    let mut session = messenger.into_session();

    module.push_line("+EVT:RX_1:-70:8:UNICAST:2:01");
    session.process();
    assert_eq!(handle.receive_queue_size(), 0);
}

#[test]
fn test_teardown_releases_in_flight_message() {
    let (session, module, clock) = joined_session();
    let mut messenger = Messenger::new(session);

    messenger.transmit(Message::new(1, b"one".to_vec(), true));
    assert!(messenger.is_in_flight());

    messenger.session_mut().teardown();
    assert!(!messenger.is_in_flight());
    assert_eq!(messenger.transmit_queue_size(), 1);
    assert_eq!(messenger.stats().transmits_failed, 1);

    messenger.session_mut().setup().unwrap();
    module.push_line("+EVT:JOINED");
    messenger.process();
    assert_eq!(messenger.session().state(), SessionState::JoinSuccess);

    // A confirmation for the abandoned uplink changes nothing.
    module.push_line("+EVT:SEND_CONFIRMED_OK");
    messenger.process();
    assert_eq!(messenger.transmit_queue_size(), 1);
    module.clear_sent();

    clock.advance(RETRY_DELAY + Duration::from_secs(1));
    messenger.process();
    assert_eq!(module.sent_count(FIRST), 1);
    assert!(messenger.is_in_flight());
    assert_eq!(messenger.transmit_queue_snapshot()[0].attempts, 2);
}
