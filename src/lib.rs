//! A rate-limited HTTP POST load generator.
//!
//! This crate fires a fixed number of POST requests at a target URL while keeping the
//! issuance rate under a cap of requests per second, then waits for every request to
//! complete.
//!
//! ## Components
//!
//! - [`RateLimiter`]: a fixed-window limiter allowing a quota of permits per period.
//! - [`Dispatcher`]: issues one task per request, each gated by one permit, and joins
//!   every task it started before returning.
//! - [`Poster`]: the capability performing the network call. [`HttpPoster`] is the
//!   default implementation, built on `reqwest`.
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use requester::{Dispatcher, Poster, RequestSpec};
//! use tokio_util::sync::CancellationToken;
//!
//! struct PrintPoster;
//!
//! #[async_trait]
//! impl Poster for PrintPoster {
//!     async fn post(&self, _: &CancellationToken, url: &str, body: String) {
//!         println!("POST {url} {body}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> requester::Result<()> {
//!     let spec = RequestSpec::new("http://localhost:8080/ingest", 10, 2);
//!     Dispatcher::new(PrintPoster).run(&CancellationToken::new(), &spec).await
//! }
//! ```
#![deny(missing_docs)]

mod dispatcher;
mod error;
mod limiter;
mod poster;
mod request;

pub mod cli;

#[cfg(feature = "http")]
pub use crate::poster::HttpPoster;
pub use crate::{
    dispatcher::Dispatcher,
    error::{Error, Result},
    limiter::RateLimiter,
    poster::Poster,
    request::RequestSpec,
};
