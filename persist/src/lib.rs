//! Fire-and-forget binary persistence of ticks and book snapshots to
//! rotating, length-prefixed segment files.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod record;
mod segment;
mod sink;

pub use record::{PersistRecord, RecordError, RecordHeader, RecordType, HEADER_LEN};
pub use segment::{Segment, SegmentError, SegmentReader};
pub use sink::PersistSink;
