//! Chunked body writer with continuation checks and progress reporting

use super::traits::StreamWriteListener;
use crate::error::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default chunk size used when a transport has no configured buffer size
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Writes body bytes to a transport sink, one chunk at a time
///
/// Before each chunk the listener is asked whether to keep writing; after
/// each chunk it is told how many bytes went out. A `false` answer stops the
/// writer without an error.
pub struct BodyWriter<'a> {
    sink: &'a mut (dyn AsyncWrite + Send + Unpin),
    listener: &'a dyn StreamWriteListener,
    buffer_size: usize,
    bytes_written: u64,
}

impl<'a> BodyWriter<'a> {
    /// Create a writer over `sink`, reporting to `listener`
    pub fn new(
        sink: &'a mut (dyn AsyncWrite + Send + Unpin),
        listener: &'a dyn StreamWriteListener,
        buffer_size: usize,
    ) -> Self {
        Self {
            sink,
            listener,
            buffer_size: buffer_size.max(1),
            bytes_written: 0,
        }
    }

    /// Whether the listener still wants bytes
    pub fn should_continue(&self) -> bool {
        self.listener.should_continue_writing()
    }

    /// Total bytes written through this writer
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Copy a stream to the sink until it ends or writing is cancelled
    ///
    /// Returns `true` when the stream was written completely and `false`
    /// when the listener stopped the copy. The stream is borrowed; closing it
    /// stays with the caller that opened it.
    pub async fn write_stream<R>(&mut self, stream: &mut R) -> Result<bool>
    where
        R: AsyncRead + Send + Unpin + ?Sized,
    {
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            if !self.listener.should_continue_writing() {
                return Ok(false);
            }
            let read = stream.read(&mut buffer).await?;
            if read == 0 {
                return Ok(true);
            }
            self.write_chunk(&buffer[..read]).await?;
        }
    }

    /// Write in-memory bytes, in chunks of the buffer size
    ///
    /// Returns `false` when the listener stopped the write part-way.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<bool> {
        for chunk in bytes.chunks(self.buffer_size) {
            if !self.listener.should_continue_writing() {
                return Ok(false);
            }
            self.write_chunk(chunk).await?;
        }
        Ok(true)
    }

    /// Flush the underlying sink
    pub async fn flush(&mut self) -> Result<()> {
        self.sink.flush().await?;
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.sink.write_all(chunk).await?;
        self.sink.flush().await?;
        self.bytes_written += chunk.len() as u64;
        self.listener.on_bytes_written(chunk.len());
        Ok(())
    }
}
