use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;

use super::connection::run_replica_inbound_connection;
use super::dispatcher::DispatchRequest;
use crate::protocol::{RedisError, Value, ValueReader, ValueWriter};

const HANDSHAKE_STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs once at startup when this server was given `--replicaof`. Performs
/// the fixed PING / REPLCONF listening-port / REPLCONF capa / PSYNC
/// handshake against the master, then hands the connection off to the
/// replica-inbound connection loop. A timeout or a reply mismatch at any
/// step is a fatal handshake error — the process should not pretend to be
/// a working replica after that.
pub async fn run(
    master_host: &str,
    master_port: u16,
    own_port: u16,
    dispatcher: UnboundedSender<DispatchRequest>,
) -> Result<(), RedisError> {
    let master_addr = format!("{}:{}", master_host, master_port);
    println!("connecting to master at {}", master_addr);

    let stream = TcpStream::connect(&master_addr)
        .await
        .context(format!("failed to connect to master {}", master_addr))?;

    let (reader, writer) = stream.into_split();
    let mut reader = ValueReader::new(BufReader::new(reader));
    let mut writer = ValueWriter::new(BufWriter::new(writer));

    step(&mut writer, &mut reader, Value::command_str("PING", &[]), "PONG").await?;

    step(
        &mut writer,
        &mut reader,
        Value::command_str("REPLCONF", &["listening-port", &own_port.to_string()]),
        "OK",
    )
    .await?;

    step(
        &mut writer,
        &mut reader,
        Value::command_str("REPLCONF", &["capa", "npsync2"]),
        "OK",
    )
    .await?;

    bounded(
        writer.write(&Value::command_str("PSYNC", &["?", "-1"])),
        "failed to send PSYNC",
    )
    .await?;

    let fullresync = bounded(reader.read(), "failed to read FULLRESYNC reply").await?;
    match fullresync.0 {
        Value::SimpleString(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            if !text.starts_with("FULLRESYNC") {
                return Err(RedisError::handshake(format!(
                    "expected FULLRESYNC, got: {}",
                    text
                )));
            }
        }
        other => {
            return Err(RedisError::handshake(format!(
                "expected FULLRESYNC simple string, got: {:?}",
                other
            )))
        }
    }

    // The RDB payload is framed as `$<len>\r\n<raw bytes>`, deliberately
    // with no trailing CRLF — read the bulk length and consume exactly
    // that many bytes rather than discarding one arbitrary read.
    bounded(read_rdb_payload(reader.inner_mut()), "failed to read RDB payload").await?;
    println!("received RDB payload; entering replica-inbound mode");

    let reader = reader.into_inner();
    let writer = writer.into_inner();
    run_replica_inbound_connection(reader, writer, dispatcher).await;

    Ok(())
}

async fn step(
    writer: &mut ValueWriter<impl tokio::io::AsyncWrite + Unpin>,
    reader: &mut ValueReader<impl tokio::io::AsyncBufRead + Unpin>,
    command: Value,
    expect: &str,
) -> Result<(), RedisError> {
    bounded(writer.write(&command), "failed to send handshake step").await?;
    let (reply, _consumed) = bounded(reader.read(), "failed to read handshake reply").await?;

    match reply {
        Value::SimpleString(bytes) if bytes == expect.as_bytes() => Ok(()),
        other => Err(RedisError::handshake(format!(
            "expected +{}, got: {:?}",
            expect, other
        ))),
    }
}

async fn bounded<F, T, E>(future: F, context: &str) -> anyhow::Result<T>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    match timeout(HANDSHAKE_STEP_TIMEOUT, future).await {
        Ok(result) => result.context(context.to_string()),
        Err(_) => Err(anyhow::anyhow!("{}: timed out", context)),
    }
}

async fn read_rdb_payload<R>(reader: &mut R) -> std::io::Result<Vec<u8>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut header = Vec::new();
    reader.read_until(b'\n', &mut header).await?;

    let header = String::from_utf8_lossy(&header);
    let header = header.trim_end();
    let length: usize = header
        .strip_prefix('$')
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("malformed RDB bulk length: {:?}", header),
            )
        })?;

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}
