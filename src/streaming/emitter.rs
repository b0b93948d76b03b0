//! Sequential frame emission.
//!
//! # Responsibilities
//! - Write each frame's head and payload in order onto one sink
//! - Stop at the first failed write; nothing is retried
//! - Bind an emission task to a streaming response body
//!
//! # Design Decisions
//! - The frame sequence is fully decided before the first byte is written
//! - No closing delimiter after the last payload
//! - Client disconnect drops the body receiver, which fails the next write

use std::convert::Infallible;

use axum::body::Body;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::observability::metrics;
use crate::streaming::{ChannelSink, FrameSequence, FrameSink, StreamWriteError};

/// Chunks buffered between the emitter and the transport.
const CHANNEL_DEPTH: usize = 2;

/// What an emission wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    pub frames: usize,
    pub bytes: usize,
}

/// Write every frame of the sequence onto the sink, in order.
pub async fn emit<S: FrameSink>(frames: FrameSequence, mut sink: S) -> Result<EmitReport, StreamWriteError> {
    let mut report = EmitReport::default();

    for frame in frames {
        let head = frame.head();
        let written = head.len() + frame.len();

        sink.write(head).await?;
        sink.write(frame.payload().clone()).await?;

        report.frames += 1;
        report.bytes += written;

        tracing::trace!(
            content_type = frame.content_type(),
            length = frame.len(),
            "Frame written"
        );
    }

    Ok(report)
}

/// Start emitting `frames` in the background and return the body they stream into.
pub fn progressive_body(frames: FrameSequence) -> Body {
    let (tx, rx) = mpsc::channel::<Bytes>(CHANNEL_DEPTH);
    let expected = frames.len();

    tokio::spawn(async move {
        match emit(frames, ChannelSink::new(tx)).await {
            Ok(report) => {
                metrics::record_frames(report.frames);
                tracing::debug!(frames = report.frames, bytes = report.bytes, "Progressive stream complete");
            }
            Err(e) => {
                metrics::record_truncated_stream();
                tracing::warn!(error = %e, expected_frames = expected, "Progressive stream truncated");
            }
        }
    });

    let chunks = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<Bytes, Infallible>(chunk), rx))
    });
    Body::from_stream(chunks)
}
