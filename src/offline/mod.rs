//! Offline support: the cache store, the network seam and the fetch router.

mod cache;
mod network;
mod router;

pub use cache::{CacheStorage, MemoryCacheStorage};
#[cfg(not(target_arch = "wasm32"))]
pub use network::HttpNetwork;
pub use network::Network;
pub use router::{CacheRouter, FetchOutcome, Route, Routed};
