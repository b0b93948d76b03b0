//! Variant derivation boundary.
//!
//! The core never looks inside a transform. It hands original bytes plus a
//! [`VariantSpec`] to a [`VariantDeriver`] and gets back derived bytes, an
//! explicit decline, or an error.
//!
//! ```text
//! original bytes + VariantSpec
//!     → derive_variant (blocking pool)
//!     → VariantDeriver::derive
//!     → Derived(bytes) | Declined | DeriveError
//! ```

pub mod raster;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use raster::RasterDeriver;

/// Output format tag understood by derivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantFormat {
    WebP,
    Jpeg,
    Png,
}

impl VariantFormat {
    /// MIME type announced for frames of this format.
    pub fn content_type(self) -> &'static str {
        match self {
            VariantFormat::WebP => "image/webp",
            VariantFormat::Jpeg => "image/jpeg",
            VariantFormat::Png => "image/png",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            VariantFormat::WebP => "webp",
            VariantFormat::Jpeg => "jpeg",
            VariantFormat::Png => "png",
        }
    }
}

impl fmt::Display for VariantFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Quality scalar constrained to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    /// Returns `None` when the value is outside `[0, 1]` or NaN.
    pub fn new(value: f32) -> Option<Self> {
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    /// Clamp into `[0, 1]`; NaN becomes 0.
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Quality on the 1..=100 scale most encoders take.
    pub fn percent(self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, 100)
    }
}

/// Parameters for one derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantSpec {
    pub width: u32,
    pub format: VariantFormat,
    pub quality: Quality,
}

impl Default for VariantSpec {
    fn default() -> Self {
        Self {
            width: 150,
            format: VariantFormat::WebP,
            quality: Quality(0.5),
        }
    }
}

/// Outcome of a derivation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// Derived bytes in the requested format.
    Derived(Bytes),
    /// The deriver has no result for this input.
    Declined,
}

/// Hard derivation failures.
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("failed to encode {format} variant: {reason}")]
    Encode { format: VariantFormat, reason: String },

    #[error("variant derivation aborted: {0}")]
    Aborted(String),
}

/// A pluggable image transform.
///
/// Implementations are CPU-bound and called from the blocking pool.
pub trait VariantDeriver: Send + Sync + 'static {
    fn derive(&self, original: &[u8], spec: &VariantSpec) -> Result<Derivation, DeriveError>;
}

impl<F> VariantDeriver for F
where
    F: Fn(&[u8], &VariantSpec) -> Result<Derivation, DeriveError> + Send + Sync + 'static,
{
    fn derive(&self, original: &[u8], spec: &VariantSpec) -> Result<Derivation, DeriveError> {
        self(original, spec)
    }
}

/// Run a deriver on the blocking pool and wait for it.
pub async fn derive_variant(
    deriver: Arc<dyn VariantDeriver>,
    original: Bytes,
    spec: VariantSpec,
) -> Result<Derivation, DeriveError> {
    tokio::task::spawn_blocking(move || deriver.derive(&original, &spec))
        .await
        .map_err(|e| DeriveError::Aborted(e.to_string()))?
}
