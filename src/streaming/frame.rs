//! Frames and their wire encoding.

use bytes::{BufMut, Bytes, BytesMut};

use crate::origin::ImageResource;

macro_rules! boundary {
    () => {
        "frame"
    };
}

/// Boundary token shared by the top-level header and every part delimiter.
pub const BOUNDARY: &str = boundary!();

/// Top-level content type of a progressive response.
pub const MULTIPART_CONTENT_TYPE: &str = concat!("multipart/x-mixed-replace; boundary=", boundary!());

/// One part of a multipart body.
///
/// The declared length is always computed from the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    content_type: String,
    payload: Bytes,
}

impl Frame {
    pub fn new(content_type: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            payload: payload.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Delimiter and part headers, up to and including the blank line.
    ///
    /// ```text
    /// --frame\n
    /// Content-Type: <type>\n
    /// Content-Length: <len>\n
    /// \n
    /// ```
    pub fn head(&self) -> Bytes {
        let length = self.len().to_string();
        let mut head = BytesMut::with_capacity(
            BOUNDARY.len() + self.content_type.len() + length.len() + 36,
        );
        head.put_slice(b"--");
        head.put_slice(BOUNDARY.as_bytes());
        head.put_slice(b"\nContent-Type: ");
        head.put_slice(self.content_type.as_bytes());
        head.put_slice(b"\nContent-Length: ");
        head.put_slice(length.as_bytes());
        head.put_slice(b"\n\n");
        head.freeze()
    }
}

impl From<&ImageResource> for Frame {
    fn from(resource: &ImageResource) -> Self {
        Frame::new(resource.content_type(), resource.bytes().clone())
    }
}
