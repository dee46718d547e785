use std::net::SocketAddr;

use tokio::io::{AsyncWrite, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedSender};

use super::dispatcher::DispatchRequest;
use crate::protocol::{Command, CommandReadError, CommandReader, Value, ValueWriter};

/// Drives one accepted client connection: a reader half that decodes and
/// dispatches commands, and a writer half that drains the dispatcher's
/// replies. The two run as separate tasks connected by an unbounded
/// channel, so a slow client write never blocks command processing for
/// anyone else — the same split the teacher's listener uses.
pub async fn run_client_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: UnboundedSender<DispatchRequest>,
) {
    let (reader, writer) = stream.into_split();
    let reply_tx = spawn_writer(writer);

    let mut reader = CommandReader::new(BufReader::new(reader));

    loop {
        match reader.read().await {
            Ok((command, _consumed)) => {
                let request = DispatchRequest::Client {
                    peer,
                    command,
                    reply_tx: reply_tx.clone(),
                };
                if dispatcher.send(request).is_err() {
                    println!("dispatcher gone; closing connection from {}", peer);
                    break;
                }
            }
            Err(CommandReadError::Closed) => break,
            Err(CommandReadError::Invalid(err)) => {
                // Unknown or malformed command: no reply, keep reading —
                // per the dispatcher's "unknown commands are ignored" rule.
                println!("ignoring invalid command from {}: {}", peer, err);
            }
            Err(err) => {
                println!("closing connection from {} after read error: {}", peer, err);
                break;
            }
        }
    }
}

/// Drives the replica-inbound stream once the handshake has completed:
/// every command from the master is applied to the keyspace and never
/// replied to, except `REPLCONF GETACK`, which always gets an immediate
/// `REPLCONF ACK <offset>` using the offset *before* this frame is counted.
pub async fn run_replica_inbound_connection<R, W>(
    reader: R,
    writer: W,
    dispatcher: UnboundedSender<DispatchRequest>,
) where
    R: tokio::io::AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = CommandReader::new(reader);
    let mut writer = ValueWriter::new(writer);
    let mut offset: i64 = 0;

    loop {
        match reader.read().await {
            Ok((command, consumed)) => {
                if command.is_getack() {
                    let ack = Value::command_str("REPLCONF", &["ACK", &offset.to_string()]);
                    if writer.write(&ack).await.is_err() {
                        println!("failed to write REPLCONF ACK; closing replica connection");
                        break;
                    }
                } else if matches!(command, Command::Set { .. } | Command::Del { .. }) {
                    if dispatcher
                        .send(DispatchRequest::ApplyReplicated(command))
                        .is_err()
                    {
                        println!("dispatcher gone; closing replica connection");
                        break;
                    }
                }

                offset += consumed as i64;
            }
            Err(CommandReadError::Closed) => break,
            Err(CommandReadError::Invalid(err)) => {
                println!("ignoring invalid replicated command: {}", err);
            }
            Err(err) => {
                println!("closing replica connection after read error: {}", err);
                break;
            }
        }
    }
}

fn spawn_writer<W>(writer: W) -> UnboundedSender<Value>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut writer = ValueWriter::new(BufWriter::new(writer));
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

    tokio::spawn(async move {
        while let Some(value) = rx.recv().await {
            if writer.write(&value).await.is_err() {
                println!("error writing reply; closing connection");
                break;
            }
        }
    });

    tx
}
