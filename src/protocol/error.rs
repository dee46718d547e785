use std::io;

/// A possible error reading or decoding a RESP value.
#[derive(Debug, thiserror::Error)]
pub enum ValueReadError {
    /// EOF reached when _starting_ to read a value; the connection should close.
    #[error("EOF reached; no value to read")]
    EndOfInput,

    /// The bytes read so far can't be interpreted as a RESP value.
    #[error("{0}")]
    Protocol(String),

    /// An unexpected I/O error occurred while reading data.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ValueReadError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// Top-level error type for the crate; threaded through the connection
/// loop and the handshake driver.
#[derive(Debug, thiserror::Error)]
pub enum RedisError {
    #[error("{0}")]
    Protocol(String),

    #[error("handshake with master failed: {0}")]
    Handshake(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl RedisError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake(message.into())
    }
}

impl From<ValueReadError> for RedisError {
    fn from(err: ValueReadError) -> Self {
        match err {
            ValueReadError::EndOfInput => RedisError::protocol("unexpected end of input"),
            ValueReadError::Protocol(message) => RedisError::Protocol(message),
            ValueReadError::Io(err) => RedisError::Unexpected(anyhow::Error::new(err)),
        }
    }
}
