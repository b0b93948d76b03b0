//! Request orchestration: fetch, derive, decide.
//!
//! # Data Flow
//! ```text
//! identifier
//!     → cache (optional)
//!     → OriginFetcher::fetch            (suspends on network)
//!     → derive_variant                  (suspends on blocking pool)
//!     → Delivery::Progressive | Delivery::Single
//! ```
//!
//! # Design Decisions
//! - Derivation completes before a response is chosen, so a multipart
//!   stream is never started for a request that ends up single-part
//! - Upstream failures are returned untouched for the caller to relay
//! - A declined derivation is not an error
//! - A variant larger than its original is still streamed first, but logged

pub mod cache;

use std::sync::Arc;

use thiserror::Error;

use crate::config::ServiceConfig;
use crate::observability::metrics;
use crate::origin::{ImageResource, OriginError, OriginFetcher, UpstreamReply};
use crate::streaming::{Frame, FrameSequence};
use crate::variant::{derive_variant, Derivation, DeriveError, VariantDeriver, VariantSpec};

pub use cache::Cache;

/// How one image request is answered.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Variant frame followed by the original frame.
    Progressive(FrameSequence),
    /// Derivation declined; the original as a plain response.
    Single(ImageResource),
}

/// Failures before any response byte is produced.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Origin(#[from] OriginError),

    #[error(transparent)]
    Derivation(#[from] DeriveError),
}

/// Fetches originals and prepares progressive deliveries.
pub struct ImageDelivery {
    fetcher: OriginFetcher,
    deriver: Arc<dyn VariantDeriver>,
    spec: VariantSpec,
    images: Option<Cache<Delivery>>,
    replies: Option<Cache<UpstreamReply>>,
}

impl ImageDelivery {
    pub fn new(fetcher: OriginFetcher, deriver: Arc<dyn VariantDeriver>, spec: VariantSpec) -> Self {
        Self {
            fetcher,
            deriver,
            spec,
            images: None,
            replies: None,
        }
    }

    /// Build from configuration, with caches when enabled.
    pub fn from_config(config: &ServiceConfig, deriver: Arc<dyn VariantDeriver>) -> Result<Self, OriginError> {
        let fetcher = OriginFetcher::new(&config.origin)?;
        let mut delivery = Self::new(fetcher, deriver, config.variant.to_spec());
        delivery.images = Cache::from_config("images", &config.cache);
        delivery.replies = Cache::from_config("passthrough", &config.cache);
        Ok(delivery)
    }

    /// Decide how to answer a request for `identifier`.
    pub async fn deliver(&self, identifier: &str) -> Result<Delivery, DeliveryError> {
        if let Some(hit) = self.images.as_ref().and_then(|c| c.get(identifier)) {
            tracing::debug!(identifier, "Serving prepared delivery from cache");
            return Ok(hit);
        }

        let original = self.fetcher.fetch(identifier).await?;

        let outcome = derive_variant(self.deriver.clone(), original.bytes().clone(), self.spec).await;
        let delivery = match outcome {
            Ok(Derivation::Derived(bytes)) => {
                metrics::record_derivation("derived");
                tracing::debug!(
                    identifier,
                    original_bytes = original.len(),
                    variant_bytes = bytes.len(),
                    "Variant derived"
                );
                if bytes.len() >= original.len() {
                    metrics::record_oversized_variant();
                    tracing::warn!(
                        identifier,
                        original_bytes = original.len(),
                        variant_bytes = bytes.len(),
                        format = %self.spec.format,
                        "Variant is not smaller than its original"
                    );
                }
                let variant = Frame::new(self.spec.format.content_type(), bytes);
                Delivery::Progressive(FrameSequence::new(Some(variant), Frame::from(&original)))
            }
            Ok(Derivation::Declined) => {
                metrics::record_derivation("declined");
                tracing::info!(
                    identifier,
                    content_type = original.content_type(),
                    "Variant declined, serving original"
                );
                Delivery::Single(original)
            }
            Err(e) => {
                metrics::record_derivation("failed");
                return Err(e.into());
            }
        };

        if let Some(cache) = &self.images {
            cache.insert(identifier, delivery.clone());
        }
        Ok(delivery)
    }

    /// Fetch a fixed resource to relay unmodified.
    pub async fn passthrough(&self, identifier: &str) -> Result<UpstreamReply, DeliveryError> {
        if let Some(hit) = self.replies.as_ref().and_then(|c| c.get(identifier)) {
            return Ok(hit);
        }

        let reply = self.fetcher.fetch_reply(identifier).await?;
        if reply.status.is_success() {
            if let Some(cache) = &self.replies {
                cache.insert(identifier, reply.clone());
            }
        }
        Ok(reply)
    }
}
