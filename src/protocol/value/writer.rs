use super::Value;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encodes and writes RESP values to an async byte stream, flushing after
/// every value so a reply is visible to the peer as soon as it's produced.
pub struct ValueWriter<W> {
    writer: W,
}

impl<W> ValueWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write(&mut self, value: &Value) -> io::Result<()> {
        self.writer.write_all(&value.to_bytes()).await?;
        self.writer.flush().await
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
