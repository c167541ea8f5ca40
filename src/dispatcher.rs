//! This module drives a rate-limited run of concurrent requests.
use std::{num::NonZeroU32, sync::Arc};

use serde::Serialize;
use tokio::{
    task::{JoinError, JoinSet},
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    error::{Error, Result},
    limiter::RateLimiter,
    poster::Poster,
    request::RequestSpec,
};

/// Body of every request: the zero-based issuance index.
#[derive(Debug, Serialize)]
struct Payload {
    iteration: u64,
}

/// Issues the requests of a [`RequestSpec`] through a [`Poster`].
///
/// Requests are issued one at a time in index order, each gated by one permit of a
/// [`RateLimiter`] allowing `per_second` permits per second. Every request runs in its own
/// task, so a slow poster does not slow down issuance.
#[derive(Debug)]
pub struct Dispatcher<P> {
    poster: Arc<P>,
}

impl<P> Clone for Dispatcher<P> {
    fn clone(&self) -> Self {
        Self { poster: self.poster.clone() }
    }
}

impl<P> Dispatcher<P>
where
    P: Poster + 'static,
{
    /// Create a new dispatcher posting through the given poster.
    pub fn new(poster: P) -> Self {
        Self::from_arc(Arc::new(poster))
    }

    /// Create a new dispatcher sharing an existing poster.
    pub fn from_arc(poster: Arc<P>) -> Self {
        Self { poster }
    }

    /// Run the requests described by `spec`.
    ///
    /// Returns [`Error::InvalidUrl`] before anything is sent if the URL has no scheme or
    /// no host. A zero `amount` or `per_second` is a successful no-op.
    ///
    /// If `cancel` fires while waiting for a permit, no further requests are issued and
    /// [`Error::Cancelled`] is returned. Requests already issued are always awaited
    /// before this returns.
    pub async fn run(&self, cancel: &CancellationToken, spec: &RequestSpec) -> Result<()> {
        validate_url(&spec.url)?;

        let Some(per_second) = NonZeroU32::new(spec.per_second).filter(|_| spec.amount > 0) else {
            #[cfg(feature = "tracing")]
            log::info!(
                "Nothing to do: amount={}, per_second={}",
                spec.amount,
                spec.per_second
            );
            return Ok(());
        };

        #[cfg(feature = "tracing")]
        log::info!(
            "Sending {} requests to {} at {} requests per second",
            spec.amount,
            spec.url,
            per_second
        );

        let limiter = RateLimiter::new(per_second, Duration::from_secs(1));
        let url: Arc<str> = spec.url.as_str().into();

        let mut tasks = InFlight::default();
        let issued = self.issue(cancel, &limiter, &url, spec.amount, &mut tasks).await;

        let joined = tasks.join_all().await;

        #[cfg(feature = "tracing")]
        match &issued {
            Ok(n) => log::info!("All {} requests completed", n),
            Err(_) => log::info!("Drained all in-flight requests"),
        }

        issued.and(joined)
    }

    /// Acquire a permit and spawn a request for every index, returning the issued count.
    async fn issue(
        &self,
        cancel: &CancellationToken,
        limiter: &RateLimiter,
        url: &Arc<str>,
        amount: u64,
        tasks: &mut InFlight,
    ) -> Result<u64> {
        for i in 0..amount {
            if let Err(e) = limiter.acquire(cancel).await {
                #[cfg(feature = "tracing")]
                log::warn!("Stopped issuing after {} of {} requests: {}", i, amount, e);
                return Err(e);
            }

            let body = serde_json::to_string(&Payload { iteration: i })?;

            #[cfg(feature = "tracing")]
            log::debug!("Issuing request {}", i);

            let poster = self.poster.clone();
            let cancel = cancel.clone();
            let url = url.clone();
            tasks.spawn(async move { poster.post(&cancel, &url, body).await });
            tasks.reap();
        }
        Ok(amount)
    }
}

/// Request tasks of a run, keeping only the ones still running.
#[derive(Default)]
struct InFlight {
    set: JoinSet<()>,
    failure: Option<JoinError>,
}

impl InFlight {
    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.set.spawn(task);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.set.len()
    }

    /// Collect tasks that already finished, without waiting.
    fn reap(&mut self) {
        while let Some(res) = self.set.try_join_next() {
            self.record(res);
        }
    }

    /// Wait for every remaining task, reporting the first failure.
    async fn join_all(mut self) -> Result<()> {
        while let Some(res) = self.set.join_next().await {
            self.record(res);
        }
        self.failure.map_or(Ok(()), |e| Err(Error::Task(e)))
    }

    fn record(&mut self, res: Result<(), JoinError>) {
        if let Err(e) = res {
            #[cfg(feature = "tracing")]
            log::error!("Request task failed: {:?}", e);
            self.failure.get_or_insert(e);
        }
    }
}

fn validate_url(link: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidUrl { url: link.to_string(), reason: reason.to_string() };

    let url = Url::parse(link).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme().is_empty() {
        return Err(invalid("empty scheme"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("empty host"));
    }
    Ok(())
}
