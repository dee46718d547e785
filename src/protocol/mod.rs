mod command;
mod error;
mod value;

pub use command::{Command, CommandReadError, CommandReader, FromValueError};
pub use error::{RedisError, ValueReadError};
pub use value::{Value, ValueReader, ValueWriter, EMPTY_RDB};
