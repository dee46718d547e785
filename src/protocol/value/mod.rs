mod reader;
mod writer;

pub use reader::ValueReader;
pub use writer::ValueWriter;

/// A single RESP value, as read off (or written to) the wire.
///
/// Bulk-ish variants carry raw bytes rather than `String` so that values
/// passing through unchanged (e.g. replicated command arguments) stay
/// binary-safe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    SimpleString(Vec<u8>),
    SimpleError(Vec<u8>),
    Integer(i64),
    BulkString(Vec<u8>),
    Array(Vec<Value>),
    NullBulkString,
    NullArray,

    /// The RDB snapshot frame sent after `FULLRESYNC`: a `$<len>\r\n` header
    /// followed by the raw payload with no trailing `\r\n`. Not a "real"
    /// bulk string — Redis's wire format special-cases this one frame.
    RdbPayload(Vec<u8>),
}

/// The fixed "empty database" RDB payload emitted after `FULLRESYNC`.
/// Redis does not terminate this particular bulk frame with `\r\n`.
pub const EMPTY_RDB: &[u8] = &[
    0x52, 0x45, 0x44, 0x49, 0x53, 0x30, 0x30, 0x31, 0x31, 0xfa, 0x09, 0x72, 0x65, 0x64, 0x69, 0x73,
    0x2d, 0x76, 0x65, 0x72, 0x05, 0x37, 0x2e, 0x32, 0x2e, 0x30, 0xfa, 0x0a, 0x72, 0x65, 0x64, 0x69,
    0x73, 0x2d, 0x62, 0x69, 0x74, 0x73, 0xc0, 0x40, 0xfa, 0x05, 0x63, 0x74, 0x69, 0x6d, 0x65, 0xc2,
    0x6d, 0x08, 0xbc, 0x65, 0xfa, 0x08, 0x75, 0x73, 0x65, 0x64, 0x2d, 0x6d, 0x65, 0x6d, 0xc2, 0xb0,
    0xc4, 0x10, 0x00, 0xfa, 0x08, 0x61, 0x6f, 0x66, 0x2d, 0x62, 0x61, 0x73, 0x65, 0xc0, 0x00, 0xff,
    0xf0, 0x6e, 0x3b, 0xfe, 0xc0, 0xff, 0x5a, 0xa2,
];

impl Value {
    pub fn simple_string(value: &str) -> Self {
        Self::SimpleString(value.as_bytes().to_vec())
    }

    pub fn simple_error(value: &str) -> Self {
        Self::SimpleError(value.as_bytes().to_vec())
    }

    pub fn ok() -> Self {
        Self::simple_string("OK")
    }

    pub fn bulk_string(value: &str) -> Self {
        Self::BulkString(value.as_bytes().to_vec())
    }

    pub fn bulk_bytes(value: Vec<u8>) -> Self {
        Self::BulkString(value)
    }

    /// Builds a RESP array command (bulk-string verb + bulk-string args)
    /// from raw byte arguments.
    pub fn command(verb: &str, args: &[&[u8]]) -> Self {
        let mut array = Vec::with_capacity(args.len() + 1);
        array.push(Self::bulk_string(verb));
        array.extend(args.iter().map(|arg| Self::BulkString(arg.to_vec())));
        Self::Array(array)
    }

    /// Convenience for building a command out of `&str` arguments.
    pub fn command_str(verb: &str, args: &[&str]) -> Self {
        let byte_args: Vec<&[u8]> = args.iter().map(|arg| arg.as_bytes()).collect();
        Self::command(verb, &byte_args)
    }

    /// Encodes this value as RESP bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.write_into(&mut buffer);
        buffer
    }

    fn write_into(&self, buffer: &mut Vec<u8>) {
        use std::io::Write;

        match self {
            Value::SimpleString(bytes) => {
                buffer.push(b'+');
                buffer.extend_from_slice(bytes);
                buffer.extend_from_slice(b"\r\n");
            }
            Value::SimpleError(bytes) => {
                buffer.push(b'-');
                buffer.extend_from_slice(bytes);
                buffer.extend_from_slice(b"\r\n");
            }
            Value::Integer(value) => {
                write!(buffer, ":{}\r\n", value).unwrap();
            }
            Value::BulkString(bytes) => {
                write!(buffer, "${}\r\n", bytes.len()).unwrap();
                buffer.extend_from_slice(bytes);
                buffer.extend_from_slice(b"\r\n");
            }
            Value::Array(values) => {
                write!(buffer, "*{}\r\n", values.len()).unwrap();
                for value in values {
                    value.write_into(buffer);
                }
            }
            Value::NullBulkString => buffer.extend_from_slice(b"$-1\r\n"),
            Value::NullArray => buffer.extend_from_slice(b"*-1\r\n"),
            Value::RdbPayload(bytes) => {
                write!(buffer, "${}\r\n", bytes.len()).unwrap();
                buffer.extend_from_slice(bytes);
            }
        }
    }
}
