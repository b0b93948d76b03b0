//! Streaming multipart emission.
//!
//! # Data Flow
//! ```text
//! variant? + original
//!     → sequence.rs (FrameSequence: variant first, then original)
//!     → frame.rs (--frame / Content-Type / Content-Length / payload)
//!     → emitter.rs (sequential writes, abort on first failure)
//!     → sink.rs (channel feeding the response body)
//! ```
//!
//! Top-level header: `Content-Type: multipart/x-mixed-replace; boundary=frame`.

pub mod emitter;
pub mod frame;
pub mod sequence;
pub mod sink;

pub use emitter::{emit, progressive_body, EmitReport};
pub use frame::{Frame, BOUNDARY, MULTIPART_CONTENT_TYPE};
pub use sequence::{EmitState, FrameSequence};
pub use sink::{ChannelSink, FrameSink, StreamWriteError};
