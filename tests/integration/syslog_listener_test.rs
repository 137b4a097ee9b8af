use auditlog_harness::audit::DatagramSinkReader;
use auditlog_harness::error::HarnessError;
use auditlog_harness::syslog::{encode_rfc5424, EmitMessage, EventQueue, SyslogServer};
use std::time::Duration;
use tokio::net::UdpSocket;

async fn send(to: std::net::SocketAddr, message: &str) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let datagram = encode_rfc5424(&EmitMessage::new(message));
    socket.send_to(&datagram, to).await.unwrap();
}

#[tokio::test]
async fn test_listener_delivers_record_to_reader() {
    let (server, mut queue) = SyslogServer::bind("127.0.0.1:0".parse().unwrap(), 4)
        .await
        .unwrap();

    send(server.local_addr(), "2014-05-12 10:11:12 - {\"type\":\"core\",\"ops\":[{}]}").await;

    let record = DatagramSinkReader::new(&mut queue)
        .await_one(Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(record.get("type").as_string(), "core");
}

// Test: a datagram arriving after the timeout fails the wait
#[tokio::test]
async fn test_late_datagram_fails_with_timeout() {
    let (server, mut queue) = SyslogServer::bind("127.0.0.1:0".parse().unwrap(), 4)
        .await
        .unwrap();
    let addr = server.local_addr();

    let late = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        send(addr, "2014-05-12 10:11:12 - {}").await;
    });

    let err = DatagramSinkReader::new(&mut queue)
        .await_one(Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Timeout));
    assert_eq!(err.to_string(), "Event wasn't logged into the syslog");

    late.await.unwrap();
    assert!(queue.poll(Duration::from_secs(2)).await.is_some());
}

#[tokio::test]
async fn test_separate_listeners_do_not_share_events() {
    let (first, mut first_queue) = SyslogServer::bind("127.0.0.1:0".parse().unwrap(), 4)
        .await
        .unwrap();
    let (_second, mut second_queue) = SyslogServer::bind("127.0.0.1:0".parse().unwrap(), 4)
        .await
        .unwrap();

    send(first.local_addr(), "{}").await;

    assert!(first_queue.poll(Duration::from_secs(2)).await.is_some());
    assert!(second_queue.poll(Duration::from_millis(100)).await.is_none());
}
