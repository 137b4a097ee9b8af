// Syslog codec and queue tests

use auditlog_harness::syslog::{
    decode, encode_rfc5424, DecodeError, EmitMessage, EventQueue, SyslogEvent, SyslogEventQueue,
};
use bytes::Bytes;
use std::time::Duration;

#[test]
fn test_audit_datagram_exposes_message_without_envelope() {
    let raw = "<12>1 2014-05-12T10:11:12.000Z host auditlog-harness - - - 2014-05-12 10:11:12 - {\"type\":\"core\"}";
    let event = decode(Bytes::from(raw)).unwrap();

    assert_eq!(event.facility, 1);
    assert_eq!(event.severity, 4);
    assert_eq!(event.version, Some(1));
    assert_eq!(event.app_name.as_deref(), Some("auditlog-harness"));
    assert_eq!(
        event.message.as_deref(),
        Some("2014-05-12 10:11:12 - {\"type\":\"core\"}")
    );
}

#[test]
fn test_encoded_message_keeps_json_body_intact() {
    let body = "2014-05-12 10:11:12 - {\"remote-address\":\"127.0.0.1/127.0.0.1\",\"ops\":[]}";
    let mut msg = EmitMessage::new(body);
    msg.hostname = Some("build host");
    msg.app_name = Some("harness");

    let event = decode(encode_rfc5424(&msg)).unwrap();
    assert_eq!(event.hostname.as_deref(), Some("build_host"));
    assert_eq!(event.message.as_deref(), Some(body));
}

#[test]
fn test_garbage_datagram_is_rejected() {
    assert!(matches!(decode(Bytes::new()), Err(DecodeError::Empty)));
    assert!(decode(Bytes::from_static(b"<999>1 - - - - -")).is_err());
}

#[tokio::test]
async fn test_queue_delivers_in_arrival_order() {
    let (sender, mut queue) = SyslogEventQueue::channel(4);
    for i in 0..3 {
        sender
            .send(SyslogEvent {
                message: Some(format!("m{}", i)),
                ..SyslogEvent::default()
            })
            .await
            .unwrap();
    }

    for i in 0..3 {
        let event = queue.poll(Duration::from_millis(100)).await.unwrap();
        assert_eq!(event.message, Some(format!("m{}", i)));
    }
    assert!(queue.poll(Duration::from_millis(10)).await.is_none());
}

#[tokio::test]
async fn test_full_queue_rejects_extra_events() {
    let (sender, mut queue) = SyslogEventQueue::channel(1);
    sender.try_send(SyslogEvent::default()).unwrap();
    assert!(sender.try_send(SyslogEvent::default()).is_err());

    assert_eq!(queue.clear(), 1);
    assert!(sender.try_send(SyslogEvent::default()).is_ok());
}
