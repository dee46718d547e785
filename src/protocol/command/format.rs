use super::Command;
use crate::protocol::Value;

/// Renders a command back into a RESP array, preserving argument bytes
/// case-exactly. Used both for propagating writes to attached replicas and
/// for sending the handshake's fixed command sequence.
pub fn to_value(command: &Command) -> Value {
    match command {
        Command::Ping { message, .. } => match message {
            Some(message) => Value::command("PING", &[message]),
            None => Value::command("PING", &[]),
        },

        Command::Echo { message, .. } => Value::command("ECHO", &[message]),

        Command::Get { key, .. } => Value::command("GET", &[key]),

        Command::Set {
            key,
            value,
            expiry_ms: None,
            ..
        } => Value::command("SET", &[key, value]),

        Command::Set {
            key,
            value,
            expiry_ms: Some(ttl),
            ..
        } => {
            let ttl = ttl.to_string().into_bytes();
            Value::command("SET", &[key, value, b"PX", &ttl])
        }

        Command::Del { keys, .. } => {
            let args: Vec<&[u8]> = keys.iter().map(|key| key.as_slice()).collect();
            Value::command("DEL", &args)
        }

        Command::Info { sections, .. } => {
            let args: Vec<&[u8]> = sections.iter().map(|s| s.as_slice()).collect();
            Value::command("INFO", &args)
        }

        Command::Replconf { key, value, .. } => Value::command("REPLCONF", &[key, value]),

        Command::Psync { replid, offset, .. } => {
            let empty = b"?".to_vec();
            let replid = replid.as_ref().unwrap_or(&empty);
            let offset = offset.map(|o| o.to_string()).unwrap_or_else(|| "-1".to_string());
            Value::command("PSYNC", &[replid, offset.as_bytes()])
        }
    }
}
