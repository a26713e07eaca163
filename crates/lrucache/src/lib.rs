//! # lrucache
//!
//! Fixed-capacity least-recently-used cache.
//!
//! ## Architecture
//! - **Index**: AHash map from key to list slot (O(1) lookup)
//! - **Recency list**: arena-backed doubly-linked list, most recent at the
//!   head (O(1) promote and eviction)
//! - **SharedCache**: one `parking_lot` lock around the whole cache, with
//!   hit/miss statistics
//!
//! ## Behaviour
//! - `put` on a key that is already present is a no-op and returns `false`
//! - `get` is the only operation that refreshes recency
//! - a full cache evicts exactly one entry, the least recently used, per new key
//!
//! ```
//! use lrucache::LruCache;
//!
//! let mut cache = LruCache::new(2)?;
//! cache.put(1, "A");
//! cache.put(2, "B");
//! cache.get(&1);
//! cache.put(3, "C"); // evicts 2
//!
//! assert_eq!(cache.dump(), vec![&"C", &"A"]);
//! assert_eq!(cache.get(&2), None);
//! # Ok::<(), lrucache::Error>(())
//! ```

#![warn(missing_docs)]

mod cache;
mod error;
mod list;
mod lru;
mod stats;

pub use cache::SharedCache;
pub use error::{Error, Result};
pub use list::Iter;
pub use lru::{Insertion, LruCache};
pub use stats::{CacheStats, StatsSnapshot};
