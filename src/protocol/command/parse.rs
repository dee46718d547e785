use super::Command;
use crate::protocol::Value;
use std::{collections::VecDeque, fmt::Display, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FromValueError(String);

impl From<&str> for FromValueError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

fn wrong_number_of_arguments(command: &str) -> FromValueError {
    FromValueError(format!(
        "wrong number of arguments for '{}' command",
        command
    ))
}

pub fn from_value(value: Value, consumed: usize) -> Result<Command, FromValueError> {
    match value {
        Value::Array(values) => from_values(consumed, values),
        _ => Err("value must be a RESP array".into()),
    }
}

fn from_values(consumed: usize, values: Vec<Value>) -> Result<Command, FromValueError> {
    if values.is_empty() {
        return Err("RESP array must not be empty".into());
    }

    let mut parts = VecDeque::with_capacity(values.len());

    for (idx, value) in values.into_iter().enumerate() {
        match value {
            Value::BulkString(bytes) => parts.push_back(bytes),
            other => {
                return Err(FromValueError(format!(
                    "RESP array element at index {} must be a bulk string, got {:?}",
                    idx, other
                )))
            }
        }
    }

    from_parts(consumed, parts)
}

fn from_parts(consumed: usize, mut args: VecDeque<Vec<u8>>) -> Result<Command, FromValueError> {
    let verb = args.pop_front().unwrap();
    let verb = to_utf8(verb)?;

    match verb.to_lowercase().as_str() {
        "ping" => parse_ping(consumed, args),
        "echo" => parse_echo(consumed, args),
        "get" => parse_get(consumed, args),
        "set" => parse_set(consumed, args),
        "del" => parse_del(consumed, args),
        "info" => parse_info(consumed, args),
        "replconf" => parse_replconf(consumed, args),
        "psync" => parse_psync(consumed, args),
        other => Err(FromValueError(format!("invalid command: {}", other))),
    }
}

fn parse_ping(consumed: usize, mut args: VecDeque<Vec<u8>>) -> Result<Command, FromValueError> {
    Ok(Command::Ping {
        consumed,
        message: args.pop_front(),
    })
}

fn parse_echo(consumed: usize, mut args: VecDeque<Vec<u8>>) -> Result<Command, FromValueError> {
    let message = args
        .pop_front()
        .ok_or_else(|| wrong_number_of_arguments("echo"))?;
    Ok(Command::Echo { consumed, message })
}

fn parse_get(consumed: usize, mut args: VecDeque<Vec<u8>>) -> Result<Command, FromValueError> {
    let key = args
        .pop_front()
        .ok_or_else(|| wrong_number_of_arguments("get"))?;
    Ok(Command::Get { consumed, key })
}

fn parse_set(consumed: usize, mut args: VecDeque<Vec<u8>>) -> Result<Command, FromValueError> {
    if args.len() < 2 {
        return Err(wrong_number_of_arguments("set"));
    }

    let key = args.pop_front().unwrap();
    let value = args.pop_front().unwrap();
    let expiry_ms = parse_set_options(args)?;

    Ok(Command::Set {
        consumed,
        key,
        value,
        expiry_ms,
    })
}

fn parse_set_options(mut args: VecDeque<Vec<u8>>) -> Result<Option<u64>, FromValueError> {
    match args.pop_front() {
        None => Ok(None),
        Some(option) => {
            let option = to_utf8(option)?.to_lowercase();

            match option.as_str() {
                "px" => {
                    let ttl = args
                        .pop_front()
                        .ok_or_else(|| wrong_number_of_arguments("set"))?;
                    parse_number(ttl, "PX value").map(Some)
                }
                other => Err(FromValueError(format!("unhandled SET option: {}", other))),
            }
        }
    }
}

fn parse_del(consumed: usize, args: VecDeque<Vec<u8>>) -> Result<Command, FromValueError> {
    if args.is_empty() {
        return Err(wrong_number_of_arguments("del"));
    }

    Ok(Command::Del {
        consumed,
        keys: args.into(),
    })
}

fn parse_info(consumed: usize, args: VecDeque<Vec<u8>>) -> Result<Command, FromValueError> {
    Ok(Command::Info {
        consumed,
        sections: args.into(),
    })
}

fn parse_replconf(
    consumed: usize,
    mut args: VecDeque<Vec<u8>>,
) -> Result<Command, FromValueError> {
    if args.len() < 2 {
        return Err(wrong_number_of_arguments("replconf"));
    }

    let key = to_utf8(args.pop_front().unwrap())?.to_lowercase().into_bytes();
    let value = args.pop_front().unwrap();

    Ok(Command::Replconf {
        consumed,
        key,
        value,
    })
}

fn parse_psync(consumed: usize, mut args: VecDeque<Vec<u8>>) -> Result<Command, FromValueError> {
    if args.len() < 2 {
        return Err(wrong_number_of_arguments("psync"));
    }

    let replid_bytes = args.pop_front().unwrap();
    let replid = if replid_bytes == b"?" {
        None
    } else {
        Some(replid_bytes)
    };

    let offset_bytes = args.pop_front().unwrap();
    let raw_offset: i64 = parse_number(offset_bytes, "PSYNC offset")?;
    let offset = if raw_offset < 0 { None } else { Some(raw_offset) };

    Ok(Command::Psync {
        consumed,
        replid,
        offset,
    })
}

fn to_utf8(bytes: Vec<u8>) -> Result<String, FromValueError> {
    String::from_utf8(bytes).map_err(|_| "invalid UTF-8".into())
}

fn parse_number<T>(bytes: Vec<u8>, desc: &str) -> Result<T, FromValueError>
where
    T: FromStr,
    T::Err: Display,
{
    let text = to_utf8(bytes)?;
    text.parse()
        .map_err(|_| FromValueError(format!("invalid {}: {}", desc, text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parts: &[&str]) -> Result<Command, FromValueError> {
        let value = Value::command_str(parts[0], &parts[1..]);
        from_value(value, 0)
    }

    #[test]
    fn rejects_non_array() {
        match from_value(Value::NullBulkString, 0) {
            Err(FromValueError(message)) => assert_eq!(message, "value must be a RESP array"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_array() {
        match from_value(Value::Array(vec![]), 0) {
            Err(FromValueError(message)) => assert_eq!(message, "RESP array must not be empty"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_non_bulk_string_elements() {
        let value = Value::Array(vec![Value::Integer(1)]);
        match from_value(value, 0) {
            Err(FromValueError(message)) => assert!(message.contains("must be a bulk string")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn parses_ping_without_message() {
        match parse(&["PING"]) {
            Ok(Command::Ping { message: None, .. }) => {}
            other => panic!("expected PING, got {:?}", other),
        }
    }

    #[test]
    fn parses_ping_with_message() {
        match parse(&["PING", "hello"]) {
            Ok(Command::Ping {
                message: Some(bytes),
                ..
            }) => assert_eq!(bytes, b"hello"),
            other => panic!("expected PING hello, got {:?}", other),
        }
    }

    #[test]
    fn parses_echo() {
        match parse(&["ECHO", "hey"]) {
            Ok(Command::Echo { message, .. }) => assert_eq!(message, b"hey"),
            other => panic!("expected ECHO, got {:?}", other),
        }
    }

    #[test]
    fn echo_requires_argument() {
        assert!(parse(&["ECHO"]).is_err());
    }

    #[test]
    fn parses_get() {
        match parse(&["GET", "key"]) {
            Ok(Command::Get { key, .. }) => assert_eq!(key, b"key"),
            other => panic!("expected GET, got {:?}", other),
        }
    }

    #[test]
    fn parses_set_without_expiry() {
        match parse(&["SET", "key", "value"]) {
            Ok(Command::Set {
                key,
                value,
                expiry_ms: None,
                ..
            }) => {
                assert_eq!(key, b"key");
                assert_eq!(value, b"value");
            }
            other => panic!("expected SET key value, got {:?}", other),
        }
    }

    #[test]
    fn parses_set_px_case_insensitively() {
        match parse(&["SET", "key", "value", "px", "1000"]) {
            Ok(Command::Set {
                expiry_ms: Some(1000),
                ..
            }) => {}
            other => panic!("expected SET ... PX 1000, got {:?}", other),
        }

        match parse(&["SET", "key", "value", "PX", "1000"]) {
            Ok(Command::Set {
                expiry_ms: Some(1000),
                ..
            }) => {}
            other => panic!("expected SET ... PX 1000, got {:?}", other),
        }
    }

    #[test]
    fn set_rejects_unknown_option() {
        match parse(&["SET", "key", "value", "EX", "1"]) {
            Err(FromValueError(message)) => assert!(message.starts_with("unhandled SET option")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn set_px_requires_value() {
        assert!(parse(&["SET", "key", "value", "PX"]).is_err());
    }

    #[test]
    fn set_requires_key_and_value() {
        assert!(parse(&["SET", "key"]).is_err());
    }

    #[test]
    fn parses_del_single_key() {
        match parse(&["DEL", "key"]) {
            Ok(Command::Del { keys, .. }) => assert_eq!(keys, vec![b"key".to_vec()]),
            other => panic!("expected DEL key, got {:?}", other),
        }
    }

    #[test]
    fn parses_del_multiple_keys() {
        match parse(&["DEL", "one", "two"]) {
            Ok(Command::Del { keys, .. }) => {
                assert_eq!(keys, vec![b"one".to_vec(), b"two".to_vec()])
            }
            other => panic!("expected DEL one two, got {:?}", other),
        }
    }

    #[test]
    fn del_requires_at_least_one_key() {
        assert!(parse(&["DEL"]).is_err());
    }

    #[test]
    fn parses_info_sections() {
        match parse(&["INFO", "replication"]) {
            Ok(Command::Info { sections, .. }) => {
                assert_eq!(sections, vec![b"replication".to_vec()])
            }
            other => panic!("expected INFO replication, got {:?}", other),
        }
    }

    #[test]
    fn parses_replconf_listening_port() {
        match parse(&["REPLCONF", "listening-port", "6380"]) {
            Ok(Command::Replconf { key, value, .. }) => {
                assert_eq!(key, b"listening-port");
                assert_eq!(value, b"6380");
            }
            other => panic!("expected REPLCONF, got {:?}", other),
        }
    }

    #[test]
    fn normalizes_replconf_key_case() {
        match parse(&["REPLCONF", "GETACK", "*"]) {
            Ok(Command::Replconf { key, .. }) => assert_eq!(key, b"getack"),
            other => panic!("expected REPLCONF GETACK, got {:?}", other),
        }
    }

    #[test]
    fn parses_psync_initial() {
        match parse(&["PSYNC", "?", "-1"]) {
            Ok(Command::Psync {
                replid: None,
                offset: None,
                ..
            }) => {}
            other => panic!("expected PSYNC ? -1, got {:?}", other),
        }
    }

    #[test]
    fn parses_psync_with_known_offset() {
        match parse(&["PSYNC", "abc123", "0"]) {
            Ok(Command::Psync {
                replid: Some(replid),
                offset: Some(0),
                ..
            }) => assert_eq!(replid, b"abc123"),
            other => panic!("expected PSYNC abc123 0, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_command() {
        match parse(&["FLUBBER"]) {
            Err(FromValueError(message)) => assert!(message.starts_with("invalid command")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn tracks_consumed_bytes_from_caller() {
        let value = Value::command_str("PING", &[]);
        match from_value(value, 42) {
            Ok(command) => assert_eq!(command.consumed(), 42),
            other => panic!("expected PING, got {:?}", other),
        }
    }
}
