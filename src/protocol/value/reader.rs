use super::Value;
use crate::protocol::error::ValueReadError;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Reads RESP values directly off an async, buffered byte stream.
///
/// Each `read` call suspends on the underlying socket read until a full
/// value is available; there is no separate "incomplete frame, try again"
/// path to hand-roll, because `AsyncBufRead` already does that for us (this
/// is the concrete form of the cooperative-scheduling model: the only
/// suspension points are socket reads).
pub struct ValueReader<R> {
    reader: R,
}

impl<R> ValueReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Exposes the underlying stream directly, for the one case (the RDB
    /// payload after `FULLRESYNC`) that isn't a normal RESP value.
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads one RESP value and returns it along with the exact number of
    /// bytes consumed from the stream to produce it.
    pub async fn read(&mut self) -> Result<(Value, usize), ValueReadError> {
        let prefix = self.read_prefix().await?;

        let (value, body_len) = match prefix {
            b'+' => self.read_simple_string().await?,
            b'-' => self.read_simple_error().await?,
            b':' => self.read_integer().await?,
            b'$' => self.read_bulk_string().await?,
            b'*' => self.read_array().await?,
            other => {
                return Err(ValueReadError::protocol(format!(
                    "unexpected character '{}'",
                    other as char
                )))
            }
        };

        Ok((value, 1 + body_len))
    }

    async fn read_prefix(&mut self) -> Result<u8, ValueReadError> {
        self.reader.read_u8().await.map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => ValueReadError::EndOfInput,
            _ => ValueReadError::Io(err),
        })
    }

    async fn read_simple_string(&mut self) -> Result<(Value, usize), ValueReadError> {
        let (bytes, len) = self.read_line().await?;
        Ok((Value::SimpleString(bytes), len))
    }

    async fn read_simple_error(&mut self) -> Result<(Value, usize), ValueReadError> {
        let (bytes, len) = self.read_line().await?;
        Ok((Value::SimpleError(bytes), len))
    }

    async fn read_integer(&mut self) -> Result<(Value, usize), ValueReadError> {
        let (bytes, len) = self.read_line().await?;
        let text = to_utf8(bytes, "invalid integer value")?;
        let value: i64 = text
            .parse()
            .map_err(|_| ValueReadError::protocol(format!("invalid integer value: {}", text)))?;

        Ok((Value::Integer(value), len))
    }

    async fn read_bulk_string(&mut self) -> Result<(Value, usize), ValueReadError> {
        let (length, length_len) = self.read_length().await?;

        if length < 0 {
            return Ok((Value::NullBulkString, length_len));
        }

        let length = length as usize;
        let mut data = vec![0u8; length + 2];
        self.reader.read_exact(&mut data).await?;

        if data[length..] != [b'\r', b'\n'] {
            return Err(ValueReadError::protocol(
                "bulk string not terminated by \\r\\n",
            ));
        }

        data.truncate(length);
        Ok((Value::BulkString(data), length_len + length + 2))
    }

    async fn read_array(&mut self) -> Result<(Value, usize), ValueReadError> {
        let (length, mut consumed) = self.read_length().await?;

        if length < 0 {
            return Ok((Value::NullArray, consumed));
        }

        let length = length as usize;
        let mut values = Vec::with_capacity(length);

        for _ in 0..length {
            // `Box::pin` adds the indirection needed for this recursive async call.
            let (value, value_len) = Box::pin(self.read()).await?;
            consumed += value_len;
            values.push(value);
        }

        Ok((Value::Array(values), consumed))
    }

    /// Reads a CRLF-terminated line (not including the CRLF), returning the
    /// content bytes and the total number of bytes consumed, CRLF included.
    /// Handles a CR/LF split across two reads.
    async fn read_line(&mut self) -> Result<(Vec<u8>, usize), ValueReadError> {
        let mut line = Vec::new();
        let mut cr_found = false;

        loop {
            let chunk = self.reader.fill_buf().await?;

            if chunk.is_empty() {
                return Err(ValueReadError::EndOfInput);
            }

            if cr_found && chunk[0] == b'\n' {
                self.reader.consume(1);
                return Ok((line.clone(), line.len() + 2));
            }

            if let Some(pos) = find_crlf(chunk) {
                line.extend_from_slice(&chunk[..pos]);
                let total = line.len() + 2;
                self.reader.consume(pos + 2);
                return Ok((line, total));
            }

            cr_found = chunk.last() == Some(&b'\r');
            let consumed = chunk.len();
            line.extend_from_slice(chunk);
            self.reader.consume(consumed);
        }
    }

    /// Reads a `<digits>\r\n` length prefix (the `$`/`*` length, without the
    /// sigil, which the caller has already consumed).
    async fn read_length(&mut self) -> Result<(i64, usize), ValueReadError> {
        let (bytes, len) = self.read_line().await?;
        let text = to_utf8(bytes, "invalid length")?;
        let value: i64 = text
            .parse()
            .map_err(|_| ValueReadError::protocol(format!("invalid length: {}", text)))?;

        Ok((value, len))
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    if buf.len() < 2 {
        return None;
    }

    (0..buf.len() - 1).find(|&i| buf[i] == b'\r' && buf[i + 1] == b'\n')
}

fn to_utf8(bytes: Vec<u8>, context: &str) -> Result<String, ValueReadError> {
    String::from_utf8(bytes).map_err(|_| ValueReadError::protocol(format!("{}: not UTF-8", context)))
}
