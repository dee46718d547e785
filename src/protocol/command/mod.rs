mod format;
mod parse;
mod reader;

use crate::protocol::Value;

pub use parse::FromValueError;
pub use reader::{CommandReadError, CommandReader};

/// A fully parsed command, tagged with the exact number of RESP bytes it
/// was decoded from. That byte count is what a replica-inbound connection
/// adds to its replication offset, and what a replica's own handshake code
/// uses nowhere — it only matters on the decode side.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Ping {
        consumed: usize,
        message: Option<Vec<u8>>,
    },

    Echo {
        consumed: usize,
        message: Vec<u8>,
    },

    Get {
        consumed: usize,
        key: Vec<u8>,
    },

    Set {
        consumed: usize,
        key: Vec<u8>,
        value: Vec<u8>,
        expiry_ms: Option<u64>,
    },

    Del {
        consumed: usize,
        keys: Vec<Vec<u8>>,
    },

    Info {
        consumed: usize,
        sections: Vec<Vec<u8>>,
    },

    /// `key`/`value` are lowercased for the `listening-port`/`capa`/`getack`
    /// sub-verb matching the dispatcher does; this loses nothing since
    /// REPLCONF arguments are never echoed back verbatim to a peer.
    Replconf {
        consumed: usize,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    Psync {
        consumed: usize,
        replid: Option<Vec<u8>>,
        offset: Option<i64>,
    },
}

impl Command {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Set { .. } | Self::Del { .. })
    }

    pub fn consumed(&self) -> usize {
        match self {
            Command::Ping { consumed, .. }
            | Command::Echo { consumed, .. }
            | Command::Get { consumed, .. }
            | Command::Set { consumed, .. }
            | Command::Del { consumed, .. }
            | Command::Info { consumed, .. }
            | Command::Replconf { consumed, .. }
            | Command::Psync { consumed, .. } => *consumed,
        }
    }

    /// True for a REPLCONF GETACK *, the one replica-inbound command that
    /// always gets a reply even while responses are otherwise suppressed.
    pub fn is_getack(&self) -> bool {
        matches!(self, Self::Replconf { key, .. } if key == b"getack")
    }

    pub fn to_value(&self) -> Value {
        format::to_value(self)
    }

    /// Parses a decoded RESP array into a `Command`, stamping it with the
    /// number of bytes the array was decoded from.
    pub fn from_value(value: Value, consumed: usize) -> Result<Self, FromValueError> {
        parse::from_value(value, consumed)
    }
}
