//! End-to-end scenarios driven over real loopback TCP sockets: a master
//! (and, for the replication scenario, a replica) started in-process via
//! `redis_rust_server::server::start`, exercised the way a real client or
//! a real replica would, byte-exact.

use std::time::Duration;

use redis_rust_server::cli::StartupOptions;
use redis_rust_server::protocol::{Value, ValueReader, ValueWriter};
use redis_rust_server::server;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::time::sleep;

/// Connects to `port` on loopback, retrying briefly since the listener
/// task is spawned concurrently and may not have bound yet.
async fn connect(port: u16) -> TcpStream {
    for _ in 0..50 {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
            return stream;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("could not connect to 127.0.0.1:{}", port);
}

fn start_master(port: u16) {
    let _handle = tokio::spawn(server::start(StartupOptions {
        port,
        replica_of: None,
    }));
}

fn start_replica(port: u16, master_port: u16) {
    let _handle = tokio::spawn(server::start(StartupOptions {
        port,
        replica_of: Some(("127.0.0.1".to_string(), master_port)),
    }));
}

struct Client {
    reader: ValueReader<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: ValueWriter<tokio::net::tcp::OwnedWriteHalf>,
}

impl Client {
    async fn connect(port: u16) -> Self {
        let stream = connect(port).await;
        let (reader, writer) = stream.into_split();
        Self {
            reader: ValueReader::new(BufReader::new(reader)),
            writer: ValueWriter::new(writer),
        }
    }

    async fn command(&mut self, verb: &str, args: &[&str]) -> Value {
        self.writer.write(&Value::command_str(verb, args)).await.unwrap();
        self.reader.read().await.unwrap().0
    }
}

#[tokio::test]
async fn ping_replies_pong() {
    start_master(16379);
    let mut client = Client::connect(16379).await;
    assert_eq!(client.command("PING", &[]).await, Value::simple_string("PONG"));
}

#[tokio::test]
async fn echo_replies_argument() {
    start_master(16380);
    let mut client = Client::connect(16380).await;
    assert_eq!(
        client.command("ECHO", &["hey"]).await,
        Value::bulk_string("hey")
    );
}

#[tokio::test]
async fn set_then_get_round_trips() {
    start_master(16381);
    let mut client = Client::connect(16381).await;
    assert_eq!(
        client.command("SET", &["foo", "bar"]).await,
        Value::ok()
    );
    assert_eq!(
        client.command("GET", &["foo"]).await,
        Value::bulk_string("bar")
    );
}

#[tokio::test]
async fn set_with_px_expires_the_key() {
    start_master(16382);
    let mut client = Client::connect(16382).await;
    assert_eq!(client.command("SET", &["k", "v", "PX", "50"]).await, Value::ok());
    sleep(Duration::from_millis(120)).await;
    assert_eq!(client.command("GET", &["k"]).await, Value::NullBulkString);
}

#[tokio::test]
async fn set_is_a_no_op_on_an_existing_key() {
    start_master(16383);
    let mut client = Client::connect(16383).await;
    assert_eq!(client.command("SET", &["k", "first"]).await, Value::ok());

    // A no-op SET gets no reply at all; pipeline a PING behind it and
    // confirm the very next value off the wire is PONG, not a stray OK.
    client
        .writer
        .write(&Value::command_str("SET", &["k", "second"]))
        .await
        .unwrap();
    client.writer.write(&Value::command_str("PING", &[])).await.unwrap();
    let next = client.reader.read().await.unwrap().0;
    assert_eq!(next, Value::simple_string("PONG"));
    assert_eq!(client.command("GET", &["k"]).await, Value::bulk_string("first"));
}

#[tokio::test]
async fn del_removes_keys_and_counts_them() {
    start_master(16384);
    let mut client = Client::connect(16384).await;
    client.command("SET", &["a", "1"]).await;
    client.command("SET", &["b", "2"]).await;

    assert_eq!(
        client.command("DEL", &["a", "missing", "b"]).await,
        Value::Integer(2)
    );
    assert_eq!(client.command("GET", &["a"]).await, Value::NullBulkString);
}

#[tokio::test]
async fn info_replication_reports_master_role() {
    start_master(16385);
    let mut client = Client::connect(16385).await;
    match client.command("INFO", &["replication"]).await {
        Value::BulkString(bytes) => {
            let text = String::from_utf8(bytes).unwrap();
            assert!(text.starts_with("role:master"));
            assert!(text.contains("master_replid:"));
            assert!(text.contains("master_repl_offset:0"));
        }
        other => panic!("expected bulk string, got {:?}", other),
    }
}

#[tokio::test]
async fn pipelined_commands_are_answered_in_order_with_no_extra_bytes() {
    start_master(16386);
    let stream = connect(16386).await;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = ValueReader::new(BufReader::new(read_half));

    let mut combined = Value::command_str("PING", &[]).to_bytes();
    combined.extend(Value::command_str("ECHO", &["hi"]).to_bytes());
    tokio::io::AsyncWriteExt::write_all(&mut write_half, &combined)
        .await
        .unwrap();

    let (first, _) = reader.read().await.unwrap();
    let (second, _) = reader.read().await.unwrap();
    assert_eq!(first, Value::simple_string("PONG"));
    assert_eq!(second, Value::bulk_string("hi"));
}

#[tokio::test]
async fn replica_completes_handshake_and_applies_propagated_writes() {
    start_master(16390);
    start_replica(16391, 16390);

    // Give the replica a moment to complete the four-step handshake
    // against the master before any write is dispatched.
    sleep(Duration::from_millis(300)).await;

    let mut master_client = Client::connect(16390).await;
    assert_eq!(
        master_client.command("SET", &["x", "1"]).await,
        Value::ok()
    );

    // The propagated SET lands on the replica's connection loop and is
    // applied to the same process-wide keyspace the replica's own
    // client-facing dispatcher reads from.
    sleep(Duration::from_millis(200)).await;

    let mut replica_client = Client::connect(16391).await;
    assert_eq!(
        replica_client.command("GET", &["x"]).await,
        Value::bulk_string("1")
    );

    match replica_client.command("INFO", &["replication"]).await {
        Value::BulkString(bytes) => {
            let text = String::from_utf8(bytes).unwrap();
            assert!(text.starts_with("role:slave"));
        }
        other => panic!("expected bulk string, got {:?}", other),
    }
}
