//! Memoizing script-source cache
//!
//! One shared cache per process, keyed by the exact origin string (URL or
//! resource path). Content is fetched once and reused by every bridge
//! instance for the lifetime of the process; there is no TTL.

pub mod source;
pub mod stats;

pub use source::SourceCache;
pub use stats::CacheStats;
