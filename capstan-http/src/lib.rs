//! Outbound HTTP for Capstan
//!
//! Hosts the remote script-source fetcher and the cached token source used
//! by token-protected upstream calls. Transient upstream failures (503)
//! retry with linear backoff; everything else fails on the first attempt.

pub mod errors;
pub mod fetch;
pub mod token;

pub use errors::HttpError;
pub use fetch::{FetchOptions, HttpFetcher};
pub use token::{IssuedToken, TokenCache, TokenSource};
