//! In-memory response cache for read endpoints
//!
//! This module provides a single-flight TTL cache: successful responses are
//! kept for a short time window, and concurrent requests for the same key share
//! a single underlying call. Failures are never cached. Entries expire lazily on
//! lookup; an optional sweeper task purges them in the background.

mod keys;
mod single_flight;
mod sweeper;

pub use keys::{CacheKey, CacheKeyBuilder};
pub use single_flight::SingleFlightCache;
pub use sweeper::SweeperHandle;
