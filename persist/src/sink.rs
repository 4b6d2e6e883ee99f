//! Fire-and-forget persistence: the engine thread calls
//! [`PersistSink::record`] and moves on; a dedicated writer thread drains a
//! bounded channel and appends to rotating segment files under `data_dir`.
//! Replay from the resulting segments is a consumer concern, not this
//! crate's.

use crate::record::PersistRecord;
use crate::segment::Segment;
use crossbeam::channel::{self, Sender, TrySendError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

const CHANNEL_CAPACITY: usize = 8192;

/// Handle producers use to enqueue records; cheap to clone and share across
/// the threads that produce persisted data.
#[derive(Clone)]
pub struct PersistSink {
    tx: Sender<PersistRecord>,
    dropped: Arc<AtomicU64>,
}

impl PersistSink {
    /// Spawn the writer thread rooted at `data_dir`, rotating segments once
    /// they reach `max_segment_bytes`.
    ///
    /// # Errors
    /// Propagates failure to create `data_dir`.
    pub fn spawn(data_dir: impl Into<PathBuf>, max_segment_bytes: u64) -> io::Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        let (tx, rx) = channel::bounded(CHANNEL_CAPACITY);
        let dropped = Arc::new(AtomicU64::new(0));

        std::thread::Builder::new()
            .name("persist-writer".to_owned())
            .spawn(move || writer_loop(&data_dir, max_segment_bytes, &rx))
            .expect("failed to spawn persist writer thread");

        Ok(Self { tx, dropped })
    }

    /// Enqueue a record without blocking. Dropped (and counted) if the
    /// writer thread can't keep up.
    pub fn record(&self, record: PersistRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Count of records dropped because the writer thread fell behind.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn writer_loop(data_dir: &Path, max_segment_bytes: u64, rx: &channel::Receiver<PersistRecord>) {
    let mut counter = next_segment_counter(data_dir);
    let mut segment = match open_segment(data_dir, counter, max_segment_bytes) {
        Ok(segment) => segment,
        Err(err) => {
            error!("persist writer could not create initial segment: {err}");
            return;
        }
    };

    for record in rx.iter() {
        let bytes = record.to_bytes();
        if segment.is_full(bytes.len()) {
            if let Err(err) = segment.flush() {
                warn!("persist segment flush failed before rotation: {err}");
            }
            counter += 1;
            segment = match open_segment(data_dir, counter, max_segment_bytes) {
                Ok(segment) => segment,
                Err(err) => {
                    error!("persist writer could not rotate segment: {err}");
                    return;
                }
            };
        }
        if let Err(err) = segment.append(&bytes) {
            warn!("persist segment append failed: {err}");
        }
    }
    let _ = segment.flush();
}

fn open_segment(data_dir: &Path, counter: u64, max_segment_bytes: u64) -> Result<Segment, crate::segment::SegmentError> {
    let path = data_dir.join(format!("{counter:010}.seg"));
    Segment::create(&path, max_segment_bytes)
}

fn next_segment_counter(data_dir: &Path) -> u64 {
    fs::read_dir(data_dir)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter_map(|entry| entry.path().file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse::<u64>().ok()))
        .max()
        .map_or(1, |latest| latest + 1)
}
