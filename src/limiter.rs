//! A fixed-window rate limiter.
//!
//! [`RateLimiter`] allows at most `limit` acquisitions per window of length `period`.
//! Windows are fixed and non-overlapping: once a window is exhausted, callers wait for its
//! deadline, the window is reset, and up to `limit` permits become available at once.
//! There is no smoothing within a window.
//!
//! ```no_run
//! use std::{num::NonZeroU32, time::Duration};
//!
//! use requester::RateLimiter;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> requester::Result<()> {
//!     let limiter = RateLimiter::new(NonZeroU32::new(10).unwrap(), Duration::from_secs(1));
//!     let cancel = CancellationToken::new();
//!     for _ in 0..100 {
//!         limiter.acquire(&cancel).await?;
//!         // at most 10 of these per second
//!     }
//!     Ok(())
//! }
//! ```
use std::num::NonZeroU32;

use parking_lot::Mutex;
use tokio::{
    select,
    time::{self, Duration, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// A rate limiter enforcing a fixed quota per fixed time window.
///
/// The limiter is safe to share between tasks. The window is reset exactly once after it
/// has been exhausted and its deadline has passed, no matter how many callers are waiting.
#[derive(Debug)]
pub struct RateLimiter {
    limit: NonZeroU32,
    period: Duration,
    window: Mutex<Option<Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: Instant,
    remaining: u32,
    epoch: u64,
}

impl Window {
    fn deadline(&self, period: Duration) -> Instant {
        self.start + period
    }
}

/// What a caller has to do after touching the window.
enum Step {
    Granted,
    /// The caller exhausted the window and must wait it out, then reset it.
    Reset { deadline: Instant, epoch: u64 },
    /// The window was already exhausted when the caller arrived.
    Wait { deadline: Instant, epoch: u64 },
}

impl RateLimiter {
    /// Create a new limiter allowing `limit` permits per `period`.
    ///
    /// The first window starts at the first call to [`acquire`](Self::acquire).
    pub fn new(limit: NonZeroU32, period: Duration) -> Self {
        Self { limit, period, window: Mutex::new(None) }
    }

    /// Wait until a permit is available and consume it.
    ///
    /// Returns [`Error::Cancelled`] without consuming a permit if `cancel` is already
    /// cancelled, or if it fires while waiting for the current window to end.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        loop {
            match self.take() {
                Step::Granted => return Ok(()),
                Step::Reset { deadline, epoch } => {
                    Self::wait_until(cancel, deadline).await?;
                    self.reset(epoch);
                    return Ok(());
                }
                Step::Wait { deadline, epoch } => {
                    Self::wait_until(cancel, deadline).await?;
                    // The resetter may have been cancelled; reset on its behalf.
                    self.reset(epoch);
                }
            }
        }
    }

    fn take(&self) -> Step {
        let mut guard = self.window.lock();
        let window = guard.get_or_insert_with(|| Window {
            start: Instant::now(),
            remaining: self.limit.get(),
            epoch: 0,
        });

        let deadline = window.deadline(self.period);
        if window.remaining == 0 {
            return Step::Wait { deadline, epoch: window.epoch };
        }

        window.remaining -= 1;
        if window.remaining > 0 {
            Step::Granted
        } else {
            Step::Reset { deadline, epoch: window.epoch }
        }
    }

    /// Start a new window, unless another caller already did so for `epoch`.
    fn reset(&self, epoch: u64) {
        let mut guard = self.window.lock();
        if let Some(window) = guard.as_mut()
            && window.epoch == epoch
        {
            *window = Window {
                start: Instant::now(),
                remaining: self.limit.get(),
                epoch: epoch.wrapping_add(1),
            };
        }
    }

    async fn wait_until(cancel: &CancellationToken, deadline: Instant) -> Result<()> {
        select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = time::sleep_until(deadline) => Ok(()),
        }
    }
}
