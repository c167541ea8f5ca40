//! The capability that performs the actual network call.
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Sends one request body to a URL.
///
/// Implementations are shared between all request tasks of a run. The dispatcher never
/// observes the outcome of a post: failures are the implementation's own concern, and so
/// is whether `cancel` aborts a request already in flight.
#[async_trait]
pub trait Poster: Send + Sync {
    /// Post `body` to `url`.
    async fn post(&self, cancel: &CancellationToken, url: &str, body: String);
}

#[cfg(feature = "http")]
pub use self::http::HttpPoster;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::{Client, header::CONTENT_TYPE};
    use tokio::select;
    use tokio_util::sync::CancellationToken;

    use super::Poster;
    use crate::error::Result;

    /// A [`Poster`] sending JSON bodies over HTTP with [`reqwest`].
    #[derive(Debug, Clone)]
    pub struct HttpPoster {
        client: Client,
    }

    impl HttpPoster {
        /// Create a new HTTP poster. Requests are aborted after `timeout` when set.
        pub fn new(timeout: Option<Duration>) -> Result<Self> {
            let mut builder = Client::builder();
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            Ok(Self { client: builder.build()? })
        }

        /// Create a poster from an existing client.
        pub fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Poster for HttpPoster {
        async fn post(&self, cancel: &CancellationToken, url: &str, body: String) {
            let req = self.client.post(url).header(CONTENT_TYPE, "application/json").body(body);

            select! {
                biased;
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(url, "request cancelled");
                }
                res = req.send() => match res {
                    Ok(resp) => {
                        #[cfg(feature = "tracing")]
                        match resp.status() {
                            s if s.is_client_error() || s.is_server_error() => {
                                tracing::warn!(url, status = s.as_u16(), "request failed")
                            }
                            s => tracing::debug!(url, status = s.as_u16(), "request done"),
                        }
                        #[cfg(not(feature = "tracing"))]
                        let _ = resp;
                    }
                    Err(_e) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(url, error = %_e, "request error");
                    }
                },
            }
        }
    }
}
