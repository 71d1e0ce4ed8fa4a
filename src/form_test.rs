use super::*;
use crate::config::SessionConfig;
use crate::events::OutboundEvent;
use crate::outbox;
use crate::session::MembershipState;

#[test]
fn create_new_room_fills_uuid() {
    let mut form = JoinForm::default();
    let id = form.create_new_room().to_owned();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(form.room_id, id);
    assert_ne!(form.create_new_room(), id);
}

#[test]
fn enter_submits_and_joins() {
    let (outbox, mut rx) = outbox::channel();
    let mut session = Session::new(SessionConfig::default(), outbox);
    let form = JoinForm { room_id: "r1".into(), username: "ada".into() };

    assert_eq!(form.on_key("Enter", &mut session), Some(Ok(())));
    assert_eq!(session.state(), MembershipState::Joined);
    assert_eq!(rx.try_recv().ok(), Some(OutboundEvent::Join { room_id: "r1".into(), username: "ada".into() }));
}

#[test]
fn other_keys_do_nothing() {
    let (outbox, mut rx) = outbox::channel();
    let mut session = Session::new(SessionConfig::default(), outbox);
    let form = JoinForm { room_id: "r1".into(), username: "ada".into() };

    assert_eq!(form.on_key("a", &mut session), None);
    assert_eq!(form.on_key("Tab", &mut session), None);
    assert_eq!(session.state(), MembershipState::NotJoined);
    assert!(rx.try_recv().is_err());
}

#[test]
fn submit_surfaces_validation_message() {
    let (outbox, _rx) = outbox::channel();
    let mut session = Session::new(SessionConfig::default(), outbox);
    let form = JoinForm { room_id: String::new(), username: String::new() };

    let err = form.submit(&mut session).unwrap_err();
    assert_eq!(err.to_string(), "Enter both RoomID & Username");
}

#[test]
fn new_room_then_name_joins() {
    let (outbox, _rx) = outbox::channel();
    let mut session = Session::new(SessionConfig::default(), outbox);
    let mut form = JoinForm::default();
    form.create_new_room();
    assert_eq!(form.submit(&mut session), Err(SessionError::MissingUsername));

    form.username = "grace".into();
    form.submit(&mut session).unwrap();
    assert_eq!(session.room_id(), form.room_id);
}
