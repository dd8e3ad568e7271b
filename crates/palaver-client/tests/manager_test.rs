//! Scenario tests for the connection manager state machine.
//!
//! # Oracle Pattern
//!
//! Each test drives the manager with events and asserts on the produced
//! actions: what was transmitted, delivered, notified, and scheduled.

use std::time::Duration;

use palaver_client::{
    ConnectionId, ConnectionManager, Environment, ManagerAction, ManagerEvent, RECONNECT_DELAY,
    SessionState, UserId,
};
use palaver_proto::{ChatMessage, PONG_WIRE, Recipients, WireMessage};

#[derive(Clone)]
struct FixedEnv;

impl Environment for FixedEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn unix_time(&self) -> u64 {
        1_700_000_123
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(7);
    }
}

fn user(byte: u8) -> UserId {
    UserId::from_random_bytes([byte; 16])
}

/// Manager for identity `A`, driven to the Open state on session 1.
fn open_manager() -> ConnectionManager<FixedEnv> {
    let mut manager = ConnectionManager::new(FixedEnv, user(0xA), "alice");
    manager.start();
    manager.handle(ManagerEvent::Opened { conn: ConnectionId(1) });
    assert_eq!(manager.state(), SessionState::Open);
    manager
}

fn transmitted(actions: &[ManagerAction]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match a {
            ManagerAction::Transmit { payload, .. } => Some(payload.clone()),
            _ => None,
        })
        .collect()
}

fn delivered(actions: &[ManagerAction]) -> Vec<ChatMessage> {
    actions
        .iter()
        .filter_map(|a| match a {
            ManagerAction::Deliver { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

fn notices(actions: &[ManagerAction]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match a {
            ManagerAction::Notify { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn connects(actions: &[ManagerAction]) -> Vec<ConnectionId> {
    actions
        .iter()
        .filter_map(|a| match a {
            ManagerAction::Connect { conn } => Some(*conn),
            _ => None,
        })
        .collect()
}

fn reconnects(actions: &[ManagerAction]) -> Vec<(ConnectionId, Duration)> {
    actions
        .iter()
        .filter_map(|a| match a {
            ManagerAction::ScheduleReconnect { conn, delay } => Some((*conn, *delay)),
            _ => None,
        })
        .collect()
}

fn frame(manager: &mut ConnectionManager<FixedEnv>, payload: &str) -> Vec<ManagerAction> {
    manager.handle(ManagerEvent::Frame {
        conn: manager.current_connection(),
        payload: payload.to_string(),
    })
}

#[test]
fn start_then_open_notifies_connected() {
    let mut manager = ConnectionManager::new(FixedEnv, user(0xA), "alice");

    let actions = manager.start();
    assert_eq!(connects(&actions), vec![ConnectionId(1)]);
    assert_eq!(manager.state(), SessionState::Connecting);

    let actions = manager.handle(ManagerEvent::Opened { conn: ConnectionId(1) });
    assert_eq!(notices(&actions), vec!["Connected to the server.".to_string()]);
    assert_eq!(manager.state(), SessionState::Open);
}

#[test]
fn ping_produces_exactly_one_pong_and_no_delivery() {
    let mut manager = open_manager();
    let actions = frame(&mut manager, r#"{"type":"ping"}"#);

    assert_eq!(transmitted(&actions), vec![PONG_WIRE.to_string()]);
    assert!(delivered(&actions).is_empty());
    assert!(notices(&actions).is_empty());
}

#[test]
fn inbound_pong_is_ignored() {
    let mut manager = open_manager();
    let actions = frame(&mut manager, PONG_WIRE);

    assert!(transmitted(&actions).is_empty());
    assert!(delivered(&actions).is_empty());
}

#[test]
fn malformed_payload_is_dropped_not_fatal() {
    let mut manager = open_manager();

    let actions = frame(&mut manager, "}{ definitely not json");
    assert!(delivered(&actions).is_empty());
    assert!(transmitted(&actions).is_empty());
    assert_eq!(manager.state(), SessionState::Open);

    // The session keeps working afterwards.
    let actions = frame(&mut manager, r#"{"type":"ping"}"#);
    assert_eq!(transmitted(&actions), vec![PONG_WIRE.to_string()]);
}

#[test]
fn broadcast_is_delivered_including_sender_echo() {
    let mut manager = open_manager();
    let echo = WireMessage::Text(ChatMessage {
        from: user(0xA),
        to: Some(Recipients::broadcast()),
        name: "alice".into(),
        data: "hi".into(),
        id: 3,
        timestamp: 1_700_000_124,
    })
    .encode()
    .unwrap();

    let actions = frame(&mut manager, &echo);
    let messages = delivered(&actions);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].data, "hi");
    assert_eq!(messages[0].from, user(0xA));
}

#[test]
fn targeted_message_for_others_is_not_delivered() {
    // B whispers to C; we are A and must not see it.
    let mut manager = open_manager();
    let payload = WireMessage::Text(ChatMessage {
        from: user(0xB),
        to: Some(Recipients::users(vec![user(0xC)])),
        name: "bob".into(),
        data: "psst".into(),
        id: 4,
        timestamp: 1_700_000_124,
    })
    .encode()
    .unwrap();

    let actions = frame(&mut manager, &payload);
    assert!(delivered(&actions).is_empty());
}

#[test]
fn targeted_message_listing_us_is_delivered() {
    let mut manager = open_manager();
    let payload = WireMessage::Text(ChatMessage {
        from: user(0xB),
        to: Some(Recipients::users(vec![user(0xA)])),
        name: "bob".into(),
        data: "for you".into(),
        id: 5,
        timestamp: 1_700_000_124,
    })
    .encode()
    .unwrap();

    let actions = frame(&mut manager, &payload);
    assert_eq!(delivered(&actions).len(), 1);
}

#[test]
fn submit_while_open_transmits_expected_wire() {
    let mut manager = open_manager();
    let actions = manager.handle(ManagerEvent::Submit { text: "hi".into() });

    let sent = transmitted(&actions);
    assert_eq!(sent.len(), 1);
    let expected = format!(
        "{{\"type\":\"text\",\"from\":\"{}\",\"to\":{{\"all\":true,\"users\":[]}},\
         \"name\":\"alice\",\"data\":\"hi\",\"id\":0,\"timestamp\":1700000123}}",
        user(0xA)
    );
    assert_eq!(sent[0], expected);
}

#[test]
fn submit_while_not_open_transmits_nothing() {
    let mut manager = ConnectionManager::new(FixedEnv, user(0xA), "alice");

    // Before start (Closed).
    let actions = manager.handle(ManagerEvent::Submit { text: "hi".into() });
    assert!(transmitted(&actions).is_empty());

    // While Connecting.
    manager.start();
    let actions = manager.handle(ManagerEvent::Submit { text: "hi".into() });
    assert!(transmitted(&actions).is_empty());
}

#[test]
fn empty_submit_is_dropped_silently() {
    let mut manager = open_manager();
    let actions = manager.handle(ManagerEvent::Submit { text: String::new() });
    assert!(actions.is_empty());
}

#[test]
fn closure_schedules_exactly_one_reconnect_after_fixed_delay() {
    let mut manager = open_manager();
    let actions = manager
        .handle(ManagerEvent::Closed { conn: ConnectionId(1), reason: "code 1006".into() });

    assert_eq!(manager.state(), SessionState::Closed);
    assert_eq!(reconnects(&actions), vec![(ConnectionId(1), RECONNECT_DELAY)]);
    assert_eq!(RECONNECT_DELAY, Duration::from_secs(3));
    let texts = notices(&actions);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Disconnected"), "{texts:?}");
}

#[test]
fn reconnect_timer_opens_a_freshly_tagged_session() {
    let mut manager = open_manager();
    manager.handle(ManagerEvent::Closed { conn: ConnectionId(1), reason: "gone".into() });

    let actions = manager.handle(ManagerEvent::ReconnectDue { conn: ConnectionId(1) });
    assert_eq!(connects(&actions), vec![ConnectionId(2)]);
    assert_eq!(manager.state(), SessionState::Connecting);
}

#[test]
fn events_from_superseded_session_are_ignored() {
    let mut manager = open_manager();
    manager.handle(ManagerEvent::Closed { conn: ConnectionId(1), reason: "gone".into() });
    manager.handle(ManagerEvent::ReconnectDue { conn: ConnectionId(1) });

    // Late events from the dead session must not touch the new one.
    let actions = manager.handle(ManagerEvent::Opened { conn: ConnectionId(1) });
    assert!(notices(&actions).is_empty());
    assert_eq!(manager.state(), SessionState::Connecting);

    let actions = manager
        .handle(ManagerEvent::Closed { conn: ConnectionId(1), reason: "late".into() });
    assert!(reconnects(&actions).is_empty());

    // A stale timer cannot spawn a second connection either.
    let actions = manager.handle(ManagerEvent::ReconnectDue { conn: ConnectionId(1) });
    assert!(connects(&actions).is_empty());
}

#[test]
fn reconnect_timer_while_open_is_ignored() {
    let mut manager = open_manager();
    let actions = manager.handle(ManagerEvent::ReconnectDue { conn: ConnectionId(1) });
    assert!(connects(&actions).is_empty());
    assert_eq!(manager.state(), SessionState::Open);
}

#[test]
fn shutdown_suppresses_reconnect() {
    let mut manager = open_manager();
    manager.handle(ManagerEvent::Shutdown);

    let actions = manager
        .handle(ManagerEvent::Closed { conn: ConnectionId(1), reason: "bye".into() });
    assert!(reconnects(&actions).is_empty());
    assert!(notices(&actions).is_empty());
}
