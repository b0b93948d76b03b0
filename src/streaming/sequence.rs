//! Frame ordering state machine.
//!
//! ```text
//! Start ──variant?──▶ VariantFrame ──▶ OriginalFrame ──▶ Done
//!   └──────────────no variant──────────────▲
//! ```
//!
//! Single pass: every state is visited at most once and `Done` is terminal.

use crate::streaming::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitState {
    Start,
    VariantFrame,
    OriginalFrame,
    Done,
}

/// The ordered frames of one progressive response.
///
/// Yields the variant (if any) and then the original, each exactly once.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    state: EmitState,
    variant: Option<Frame>,
    original: Option<Frame>,
}

impl FrameSequence {
    pub fn new(variant: Option<Frame>, original: Frame) -> Self {
        Self {
            state: EmitState::Start,
            variant,
            original: Some(original),
        }
    }

    pub fn state(&self) -> EmitState {
        self.state
    }

    /// Frames not yet yielded.
    pub fn remaining(&self) -> usize {
        usize::from(self.variant.is_some()) + usize::from(self.original.is_some())
    }
}

impl Iterator for FrameSequence {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        loop {
            match self.state {
                EmitState::Start => {
                    self.state = if self.variant.is_some() {
                        EmitState::VariantFrame
                    } else {
                        EmitState::OriginalFrame
                    };
                }
                EmitState::VariantFrame => {
                    self.state = EmitState::OriginalFrame;
                    if let Some(frame) = self.variant.take() {
                        return Some(frame);
                    }
                }
                EmitState::OriginalFrame => {
                    self.state = EmitState::Done;
                    return self.original.take();
                }
                EmitState::Done => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for FrameSequence {}
