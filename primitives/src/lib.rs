//! Lock-free building blocks shared by every hot-path crate: SPSC rings,
//! an ABA-safe object pool, cache-line alignment, a monotonic timestamp
//! source, and a non-blocking log sink.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]

mod cache_aligned;
mod log_sink;
mod pool;
mod ring;
mod timestamp;

pub use cache_aligned::{CacheAligned, CACHE_LINE_SIZE};
pub use log_sink::{LogLevel, LogRecord, LogSink};
pub use pool::{ObjectPool, PoolRef};
pub use ring::SpscRing;
pub use timestamp::TimestampSource;
