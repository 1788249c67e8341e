// In-memory TTL cache
// One entry per key, replaced wholesale once it goes stale

pub mod cache;

pub use cache::{CacheEntry, TtlCache};
