use std::io;

use super::{Command, FromValueError};
use crate::protocol::error::ValueReadError;
use crate::protocol::value::ValueReader;
use tokio::io::AsyncBufRead;

/// Reads one pipelined command at a time from a connection.
pub struct CommandReader<R> {
    reader: ValueReader<R>,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandReadError {
    /// EOF: the peer closed the connection. Not a failure — the caller
    /// should simply stop reading.
    #[error("connection closed")]
    Closed,

    /// The RESP bytes themselves don't conform to the protocol. Per the
    /// design, this is connection-fatal.
    #[error("malformed RESP frame: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    /// The frame decoded fine as RESP, but isn't a recognized command (or
    /// has the wrong shape of arguments). Per the design this is *not*
    /// fatal and gets no reply — the caller should just move on to the
    /// next command.
    #[error("invalid command: {0}")]
    Invalid(#[from] FromValueError),
}

impl From<ValueReadError> for CommandReadError {
    fn from(err: ValueReadError) -> Self {
        match err {
            ValueReadError::EndOfInput => CommandReadError::Closed,
            ValueReadError::Protocol(message) => CommandReadError::Malformed(message),
            ValueReadError::Io(err) => CommandReadError::Io(err),
        }
    }
}

impl<R> CommandReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: ValueReader::new(reader),
        }
    }

    /// Reads and parses the next command, along with the exact number of
    /// RESP bytes it was decoded from.
    pub async fn read(&mut self) -> Result<(Command, usize), CommandReadError> {
        let (value, consumed) = self.reader.read().await?;
        let command = Command::from_value(value, consumed)?;
        Ok((command, consumed))
    }
}
