//! In-memory TTL cache with an injectable clock.
//!
//! The catalog keeps one raw upstream listing per sort mode in a
//! [`TtlCache`]. Nothing is persisted: a restart starts cold.

mod clock;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::TtlCache;
