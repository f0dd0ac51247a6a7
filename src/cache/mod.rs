//! # Result Cache
//!
//! Bounded, in-process store of computation results keyed by
//! `(type tag, input fingerprint)`.
//!
//! ## Architecture
//!
//! ```text
//! ResultCache
//!   ├── CacheKey          <- type tag + SHA-256 input fingerprint
//!   ├── EvictionStrategy  <- LRU | LFU | FIFO victim selection
//!   └── CacheEntry        <- owned copy of the result + access bookkeeping
//! ```
//!
//! Entries are copied in on `set` and copied out on `get`; callers never hold a
//! reference into the store. Expired entries are removed lazily when touched, or
//! eagerly through [`ResultCache::purge_expired`].

pub mod eviction;
pub mod key;
pub mod result_cache;

pub use eviction::EvictionStrategy;
pub use key::{fingerprint, CacheKey};
pub use result_cache::{CacheMetrics, CacheStats, ResultCache};
