//! Shared token-bucket rate limiter for byte streams.
//!
//! One limiter is shared by every worker that moves bytes in the same
//! direction, so the configured rate is a process-wide ceiling rather than a
//! per-transfer one. Token accounting is serialised inside `governor`.

use std::num::NonZeroU32;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as Governor};

use crate::transfer::ByteStream;

/// Byte-rate limiter with a one-second burst.
pub struct RateLimiter {
    limiter: DefaultDirectRateLimiter,
    burst: NonZeroU32,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("bytes_per_second", &self.burst)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Create a limiter with a steady-state rate in bytes per second.
    pub fn per_second(bytes_per_second: NonZeroU32) -> Self {
        Self {
            limiter: Governor::direct(Quota::per_second(bytes_per_second)),
            burst: bytes_per_second,
        }
    }

    /// Create a shared limiter, or `None` for an unlimited rate.
    pub fn shared(bytes_per_second: Option<u32>) -> Option<Arc<Self>> {
        bytes_per_second
            .and_then(NonZeroU32::new)
            .map(|rate| Arc::new(Self::per_second(rate)))
    }

    /// Configured rate in bytes per second.
    pub const fn rate(&self) -> NonZeroU32 {
        self.burst
    }

    /// Wait until `bytes` tokens have been taken from the bucket.
    ///
    /// Requests larger than the burst are split so they can never be rejected
    /// outright.
    pub async fn consume(&self, bytes: usize) {
        let burst = self.burst.get() as usize;
        let mut remaining = bytes;
        while remaining > 0 {
            let take = remaining.min(burst);
            let Some(n) = u32::try_from(take).ok().and_then(NonZeroU32::new) else {
                break;
            };
            if self.limiter.until_n_ready(n).await.is_err() {
                break;
            }
            remaining -= take;
        }
    }

    /// Pace `stream` through this limiter.
    pub fn throttle(self: &Arc<Self>, stream: ByteStream) -> ByteStream {
        let limiter = Arc::clone(self);
        Box::pin(stream.then(move |chunk| {
            let limiter = Arc::clone(&limiter);
            async move {
                let len = chunk.as_ref().map_or(0, Bytes::len);
                limiter.consume(len).await;
                chunk
            }
        }))
    }
}

/// Pace `stream` through `limiter` if one is configured.
pub fn maybe_throttle(limiter: Option<&Arc<RateLimiter>>, stream: ByteStream) -> ByteStream {
    match limiter {
        Some(limiter) => limiter.throttle(stream),
        None => stream,
    }
}
