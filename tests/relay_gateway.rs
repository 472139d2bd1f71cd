//! End-to-end tests: UDP source → relay → TCP → gateway → UDP destination.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, UdpSocket};
use tokio::time::timeout;
use xxhash_rust::xxh64::{xxh64, Xxh64};

use udpmux::config::{GatewayConfig, RouteConfig};
use udpmux::frame::{encode_into, read_frame, Frame, MAX_PAYLOAD, OVERHEAD};
use udpmux::gateway::Acceptor;
use udpmux::relay::{RemoteWriter, Subscriber, Worker};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn route_to(dest: SocketAddr, tag: u16) -> RouteConfig {
    RouteConfig {
        ip: dest.to_string(),
        id: tag,
        interface: None,
    }
}

/// Bind and run a gateway on an ephemeral port, returning its address.
async fn start_gateway(routes: Vec<RouteConfig>) -> SocketAddr {
    let config = GatewayConfig {
        local: "127.0.0.1:0".to_string(),
        clients: 0,
        certificate: None,
        routes,
    };
    let acceptor = Acceptor::bind(&config).await.unwrap();
    let addr = acceptor.local_addr();
    tokio::spawn(acceptor.run());
    addr
}

/// Start one relay worker on an ephemeral local port, returning the
/// address datagrams should be sent to.
async fn start_worker(tag: u16, writer: &RemoteWriter) -> SocketAddr {
    let subscriber = Subscriber::bind("127.0.0.1:0", None).await.unwrap();
    let group = subscriber.local_addr().unwrap();
    tokio::spawn(Worker::new(tag, subscriber, writer.clone(), None).run());
    group
}

async fn recv_payload(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0u8; MAX_PAYLOAD];
    let (len, _) = timeout(RECV_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for a datagram")
        .unwrap();
    buf.truncate(len);
    buf
}

#[tokio::test]
async fn hello_travels_end_to_end() {
    let destination = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let gateway = start_gateway(vec![route_to(destination.local_addr().unwrap(), 100)]).await;

    let writer = RemoteWriter::connect(&gateway.to_string(), None)
        .await
        .unwrap();
    let group = start_worker(100, &writer).await;

    let source = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    source.send_to(b"HELLO", group).await.unwrap();

    assert_eq!(recv_payload(&destination).await, b"HELLO");
}

#[test]
fn hello_wire_frame_is_bit_exact() {
    let mut wire = Vec::new();
    encode_into(100, b"HELLO", &mut wire).unwrap();

    let mut expected = vec![0x00, 0x05, 0x00, 0x64];
    expected.extend_from_slice(b"HELLO");
    expected.extend_from_slice(&xxh64(b"HELLO", 0).to_be_bytes());
    assert_eq!(wire, expected);
}

#[tokio::test]
async fn two_routes_multiplex_over_one_connection() {
    let dest1 = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let dest2 = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let gateway = start_gateway(vec![
        route_to(dest1.local_addr().unwrap(), 1),
        route_to(dest2.local_addr().unwrap(), 2),
    ])
    .await;

    let writer = RemoteWriter::connect(&gateway.to_string(), None)
        .await
        .unwrap();
    let group1 = start_worker(1, &writer).await;
    let group2 = start_worker(2, &writer).await;

    let source = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    source.send_to(b"A", group1).await.unwrap();
    source.send_to(b"BB", group2).await.unwrap();
    source.send_to(b"C", group1).await.unwrap();

    // Destination 1 sees its two payloads in send order.
    assert_eq!(recv_payload(&dest1).await, b"A");
    assert_eq!(recv_payload(&dest1).await, b"C");
    assert_eq!(recv_payload(&dest2).await, b"BB");
}

#[tokio::test]
async fn max_size_datagram_survives() {
    let destination = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let gateway = start_gateway(vec![route_to(destination.local_addr().unwrap(), 9)]).await;

    let writer = RemoteWriter::connect(&gateway.to_string(), None)
        .await
        .unwrap();
    let group = start_worker(9, &writer).await;

    let payload: Vec<u8> = (0..MAX_PAYLOAD).map(|i| (i % 251) as u8).collect();

    // A max-size payload occupies exactly 32 KiB on the wire.
    let mut wire = Vec::new();
    encode_into(9, &payload, &mut wire).unwrap();
    assert_eq!(wire.len(), 32 * 1024);
    assert_eq!(wire.len(), OVERHEAD + MAX_PAYLOAD);

    let source = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    source.send_to(&payload, group).await.unwrap();

    assert_eq!(recv_payload(&destination).await, payload);
}

#[tokio::test]
async fn reconnect_drops_outage_frames_only() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let writer = RemoteWriter::connect(&addr.to_string(), None).await.unwrap();
    let (mut first_session, _) = listener.accept().await.unwrap();

    let mut frame_a = Vec::new();
    encode_into(1, b"A", &mut frame_a).unwrap();
    writer.write(&frame_a).await;

    let mut buf = vec![0u8; MAX_PAYLOAD];
    let mut hasher = Xxh64::new(0);
    let first = read_frame(&mut first_session, &mut buf, &mut hasher)
        .await
        .unwrap();
    assert_eq!(
        first,
        Frame::Valid {
            tag: 1,
            payload: &b"A"[..]
        }
    );

    // The gateway goes away; B, C, D are written into the outage and must
    // be discarded without blocking the writer.
    drop(first_session);
    drop(listener);
    for payload in [&b"B"[..], b"C", b"D"] {
        let mut frame = Vec::new();
        encode_into(1, payload, &mut frame).unwrap();
        writer.write(&frame).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // The gateway comes back on the same port. Keep offering E until the
    // restored connection carries a frame: the first frame the second
    // session sees must be E, with no trace of B, C, or D.
    let listener = TcpListener::bind(addr).await.unwrap();
    let (mut second_session, _) = timeout(RECV_TIMEOUT, listener.accept())
        .await
        .expect("writer never reconnected")
        .unwrap();

    let mut frame_e = Vec::new();
    encode_into(1, b"E", &mut frame_e).unwrap();
    let received = loop {
        writer.write(&frame_e).await;
        let mut head = [0u8; 1];
        match timeout(Duration::from_millis(100), second_session.peek(&mut head)).await {
            Ok(peeked) => {
                peeked.unwrap();
                break read_frame(&mut second_session, &mut buf, &mut hasher)
                    .await
                    .unwrap();
            },
            Err(_) => continue,
        }
    };
    assert_eq!(
        received,
        Frame::Valid {
            tag: 1,
            payload: &b"E"[..]
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_workers_never_interleave_frames() {
    const WRITERS: u16 = 8;
    const FRAMES_EACH: usize = 50;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let writer = RemoteWriter::connect(&addr.to_string(), None).await.unwrap();
    let (mut server, _) = listener.accept().await.unwrap();

    // Decode concurrently with the writers so socket buffers never become
    // the bottleneck.
    let decoder = tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_PAYLOAD];
        let mut hasher = Xxh64::new(0);
        for _ in 0..usize::from(WRITERS) * FRAMES_EACH {
            match read_frame(&mut server, &mut buf, &mut hasher)
                .await
                .expect("stream desynchronised")
            {
                Frame::Valid { tag, payload } => {
                    assert_eq!(payload.len(), 100 + usize::from(tag) * 13);
                    assert!(payload.iter().all(|b| *b == tag as u8));
                },
                Frame::Corrupt { .. } => panic!("interleaved write corrupted a frame"),
            }
        }
    });

    let mut tasks = Vec::new();
    for tag in 0..WRITERS {
        let writer = writer.clone();
        tasks.push(tokio::spawn(async move {
            // Distinct payload length and fill per writer, so a spliced
            // frame cannot pass both the length and content checks.
            let payload = vec![tag as u8; 100 + usize::from(tag) * 13];
            let mut frame = Vec::new();
            encode_into(tag, &payload, &mut frame).unwrap();
            for _ in 0..FRAMES_EACH {
                writer.write(&frame).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    timeout(RECV_TIMEOUT, decoder)
        .await
        .expect("decoder stalled")
        .unwrap();
}

#[tokio::test]
async fn gateway_session_cap_is_enforced() {
    let destination = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let config = GatewayConfig {
        local: "127.0.0.1:0".to_string(),
        clients: 2,
        certificate: None,
        routes: vec![route_to(destination.local_addr().unwrap(), 1)],
    };
    let acceptor = Acceptor::bind(&config).await.unwrap();
    let gateway = acceptor.local_addr();
    tokio::spawn(acceptor.run());

    // Two sessions fill the cap; the third connects at the TCP level but
    // is not served until a slot frees up.
    let first = tokio::net::TcpStream::connect(gateway).await.unwrap();
    let _second = tokio::net::TcpStream::connect(gateway).await.unwrap();
    let mut third = tokio::net::TcpStream::connect(gateway).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut wire = Vec::new();
    encode_into(1, b"queued", &mut wire).unwrap();
    third.write_all(&wire).await.unwrap();

    // Not forwarded yet: the third session has no permit.
    let mut buf = [0u8; 64];
    assert!(
        timeout(Duration::from_millis(300), destination.recv_from(&mut buf))
            .await
            .is_err()
    );

    // Closing one served session admits the queued connection.
    drop(first);
    let payload = recv_payload(&destination).await;
    assert_eq!(payload, b"queued");
}
