//! End-to-end tests against a real server on a loopback port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use chat_server::{serve, ChatServer, Limits};

const RECV_TIMEOUT: Duration = Duration::from_secs(3);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

struct TestServer {
    addr: SocketAddr,
    server: Arc<ChatServer>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start(limits: Limits) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(ChatServer::new(limits));
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(serve(listener, Arc::clone(&server), shutdown.clone()));
        Self {
            addr,
            server,
            shutdown,
            task,
        }
    }

    /// Connect and wait until the registry has grown to `members`
    async fn join(&self, name: &str, members: usize) -> Peer {
        let peer = Peer::connect(self.addr, name).await;
        self.wait_for_members(members).await;
        peer
    }

    async fn wait_for_members(&self, members: usize) {
        timeout(RECV_TIMEOUT, async {
            while self.server.registry().len().await != members {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("registry never reached expected size");
    }
}

struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Peer {
    async fn connect(addr: SocketAddr, first_line: &str) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut peer = Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        };
        peer.send(first_line).await;
        peer
    }

    async fn send(&mut self, line: &str) {
        self.send_raw(format!("{}\n", line).as_bytes()).await;
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn recv(&mut self) -> String {
        timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("connection closed")
    }

    async fn assert_quiet(&mut self) {
        if let Ok(line) = timeout(QUIET_PERIOD, self.lines.next_line()).await {
            panic!("unexpected input: {:?}", line);
        }
    }

    async fn assert_closed(&mut self) {
        let next = timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for close");
        assert!(matches!(next, Ok(None) | Err(_)), "got {:?}", next);
    }
}

#[tokio::test]
async fn test_join_broadcast_and_leave() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;
    let mut b = server.join("B", 2).await;

    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    a.send("hello everyone").await;
    assert_eq!(b.recv().await, "A: hello everyone");
    a.assert_quiet().await;

    drop(b);
    server.wait_for_members(1).await;
    assert!(a.recv().await.starts_with("Server: B left"));
}

#[tokio::test]
#[allow(deprecated)]
async fn test_connection_reset_announces_error_leave() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;

    let mut b = TcpStream::connect(server.addr).await.unwrap();
    b.write_all(b"B\n").await.unwrap();
    server.wait_for_members(2).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    // Zero linger makes the close send RST instead of FIN
    b.set_linger(Some(Duration::ZERO)).unwrap();
    drop(b);

    server.wait_for_members(1).await;
    assert_eq!(a.recv().await, "Server: B left due to an error.");
    a.assert_quiet().await;
}

#[tokio::test]
async fn test_long_name_is_truncated_and_trimmed() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join(&format!("{} bob", "a".repeat(30)), 1).await;
    let mut b = server.join("B", 2).await;

    let name = "a".repeat(30);
    assert_eq!(server.server.registry().names().await, vec![name.clone(), "B".to_string()]);
    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    b.send(&format!("/pm {} hi", name)).await;
    assert_eq!(a.recv().await, "(PM from B): hi");
    b.assert_quiet().await;
}

#[tokio::test]
async fn test_private_messages() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;
    let mut b = server.join("B", 2).await;
    let mut c = server.join("C", 3).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");
    assert_eq!(a.recv().await, "Server: C joined the chat room.");
    assert_eq!(b.recv().await, "Server: C joined the chat room.");

    a.send("/pm B hello").await;
    assert_eq!(b.recv().await, "(PM from A): hello");

    a.send("/pm A hi").await;
    assert_eq!(a.recv().await, "Server: You cannot send a PM to yourself.");

    a.send("/pm Ghost hi").await;
    assert_eq!(a.recv().await, "Server: User 'Ghost' not found or is offline.");

    a.send("/whisper B hi").await;
    assert_eq!(a.recv().await, "Server: Unknown command.");

    b.assert_quiet().await;
    c.assert_quiet().await;
}

#[tokio::test]
async fn test_list_members() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;
    let _b = server.join("B", 2).await;
    let _c = server.join("C", 3).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");
    assert_eq!(a.recv().await, "Server: C joined the chat room.");

    a.send("/list").await;
    assert_eq!(a.recv().await, "Server: Connected users:");
    assert_eq!(a.recv().await, "- A");
    assert_eq!(a.recv().await, "- B");
    assert_eq!(a.recv().await, "- C");
    a.assert_quiet().await;
}

#[tokio::test]
async fn test_delayed_message() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;
    let mut b = server.join("B", 2).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    a.send("/delay 0 B hi").await;
    assert_eq!(
        a.recv().await,
        "Server: Invalid time (must be positive integer seconds, max 86400)."
    );
    a.send("/delay 99999 B hi").await;
    assert_eq!(
        a.recv().await,
        "Server: Invalid time (must be positive integer seconds, max 86400)."
    );

    a.send("/delay 1 B see you soon").await;
    assert_eq!(a.recv().await, "Server: Message to B scheduled in 1 seconds.");
    b.assert_quiet().await;
    assert_eq!(b.recv().await, "(PM from A): see you soon");
}

#[tokio::test]
async fn test_delayed_message_outlives_sender() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;
    let mut b = server.join("B", 2).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    a.send("/delay 1 B from the past").await;
    assert_eq!(a.recv().await, "Server: Message to B scheduled in 1 seconds.");
    drop(a);

    assert!(b.recv().await.starts_with("Server: A left"));
    assert_eq!(b.recv().await, "(PM from A): from the past");
}

#[tokio::test]
async fn test_delayed_message_to_departed_recipient() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;
    let b = server.join("B", 2).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    a.send("/delay 1 B too late").await;
    assert_eq!(a.recv().await, "Server: Message to B scheduled in 1 seconds.");
    drop(b);
    assert!(a.recv().await.starts_with("Server: B left"));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    a.assert_quiet().await;

    // Server still serves A normally
    a.send("/list").await;
    assert_eq!(a.recv().await, "Server: Connected users:");
    assert_eq!(a.recv().await, "- A");
}

#[tokio::test]
async fn test_lines_split_and_batched() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;
    let mut b = server.join("B", 2).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    a.send_raw(b"hel").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    a.send_raw(b"lo wor").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    a.send_raw(b"ld\n   \n  second  \r\nthird\n").await;

    assert_eq!(b.recv().await, "A: hello world");
    assert_eq!(b.recv().await, "A: second");
    assert_eq!(b.recv().await, "A: third");
    b.assert_quiet().await;
}

#[tokio::test]
async fn test_oversized_line_is_discarded() {
    let limits = Limits {
        max_line_length: 64,
        ..Limits::default()
    };
    let server = TestServer::start(limits).await;
    let mut a = server.join("A", 1).await;
    let mut b = server.join("B", 2).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    a.send(&"x".repeat(500)).await;
    a.send("short").await;

    assert_eq!(b.recv().await, "A: short");
    b.assert_quiet().await;
}

#[tokio::test]
async fn test_server_full_rejects_connection() {
    let limits = Limits {
        max_clients: 2,
        ..Limits::default()
    };
    let server = TestServer::start(limits).await;
    let mut a = server.join("A", 1).await;
    let _b = server.join("B", 2).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");

    let mut c = Peer::connect(server.addr, "C").await;
    assert_eq!(c.recv().await, "Server: Server is full, try again later.");
    c.assert_closed().await;

    assert_eq!(server.server.registry().len().await, 2);
    a.assert_quiet().await;
}

#[tokio::test]
async fn test_empty_name_is_rejected() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;

    let mut blank = Peer::connect(server.addr, "   ").await;
    blank.assert_closed().await;

    assert_eq!(server.server.registry().len().await, 1);
    a.assert_quiet().await;
}

#[tokio::test]
async fn test_duplicate_names_first_registered_wins() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;
    let mut first = server.join("B", 2).await;
    let mut second = server.join("B", 3).await;
    assert_eq!(a.recv().await, "Server: B joined the chat room.");
    assert_eq!(a.recv().await, "Server: B joined the chat room.");
    assert_eq!(first.recv().await, "Server: B joined the chat room.");

    a.send("/pm B which one").await;
    assert_eq!(first.recv().await, "(PM from A): which one");
    second.assert_quiet().await;
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let server = TestServer::start(Limits::default()).await;
    let mut a = server.join("A", 1).await;

    server.shutdown.cancel();
    timeout(RECV_TIMEOUT, server.task)
        .await
        .expect("serve did not stop")
        .unwrap();

    a.assert_closed().await;
}
