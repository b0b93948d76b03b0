//! Destinations frames are written onto.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failure while writing onto an open response.
#[derive(Debug, Error)]
pub enum StreamWriteError {
    /// The receiving side is gone (client disconnected, body dropped).
    #[error("response stream closed by peer")]
    Closed,
}

/// An ordered byte sink for one response body.
///
/// Each `write` completes before the next one starts.
#[async_trait]
pub trait FrameSink: Send {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamWriteError>;
}

#[async_trait]
impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamWriteError> {
        (**self).write(chunk).await
    }
}

#[async_trait]
impl FrameSink for Vec<u8> {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamWriteError> {
        self.extend_from_slice(&chunk);
        Ok(())
    }
}

/// Sink feeding a bounded channel; the receiver backs a streaming body.
///
/// A full channel suspends the writer, so transport backpressure reaches
/// the emitter.
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamWriteError> {
        self.tx.send(chunk).await.map_err(|_| StreamWriteError::Closed)
    }
}
