//! Non-blocking log sink for the trade-engine hot path.
//!
//! The engine thread must never block on I/O or contend a lock to emit a
//! diagnostic. `LogSink::emit` pushes a pre-built record onto an SPSC ring
//! and returns; a dedicated drain thread pops records and forwards them to
//! `tracing`, where the rest of the ambient logging stack (subscriber,
//! formatting, file/stdout sink) takes over. Records are dropped, not
//! blocked on, when the ring is full — `dropped_count` surfaces how often
//! that happens so it can be alarmed on.

use crate::ring::SpscRing;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Severity of a hot-path log record, mapped onto the matching `tracing`
/// level by the drain thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Diagnostic detail, off by default in production.
    Debug,
    /// Normal operational event.
    Info,
    /// Recoverable anomaly worth operator attention.
    Warn,
    /// Condition that quarantined an entity or rejected an action.
    Error,
}

/// A single hot-path log record. `message` is allocated at the call site —
/// cheap relative to the alternative of blocking on a formatter — but the
/// ring transfer itself never blocks or allocates.
#[derive(Debug)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Rendered message text.
    pub message: String,
}

const RING_CAPACITY: usize = 4096;
const DRAIN_IDLE_SLEEP: Duration = Duration::from_micros(200);

/// Handle to the hot-path logging ring and its drain thread.
pub struct LogSink {
    ring: Arc<SpscRing<LogRecord, RING_CAPACITY>>,
    running: Arc<AtomicBool>,
    drain: Option<JoinHandle<()>>,
}

impl LogSink {
    /// Spawn the drain thread and return a sink producers can call
    /// [`LogSink::emit`] on from the engine thread.
    #[must_use]
    pub fn spawn() -> Self {
        let ring: Arc<SpscRing<LogRecord, RING_CAPACITY>> = Arc::new(SpscRing::new());
        let running = Arc::new(AtomicBool::new(true));

        let drain_ring = Arc::clone(&ring);
        let drain_running = Arc::clone(&running);
        let drain = std::thread::Builder::new()
            .name("log-drain".to_owned())
            .spawn(move || Self::drain_loop(&drain_ring, &drain_running))
            .expect("failed to spawn log drain thread");

        Self {
            ring,
            running,
            drain: Some(drain),
        }
    }

    fn drain_loop(ring: &SpscRing<LogRecord, RING_CAPACITY>, running: &AtomicBool) {
        while running.load(Ordering::Acquire) {
            match unsafe { ring.pop() } {
                Some(record) => Self::forward(&record),
                None => std::thread::sleep(DRAIN_IDLE_SLEEP),
            }
        }
        while let Some(record) = unsafe { ring.pop() } {
            Self::forward(&record);
        }
    }

    fn forward(record: &LogRecord) {
        match record.level {
            LogLevel::Debug => tracing::debug!(target: "hot_path", "{}", record.message),
            LogLevel::Info => tracing::info!(target: "hot_path", "{}", record.message),
            LogLevel::Warn => tracing::warn!(target: "hot_path", "{}", record.message),
            LogLevel::Error => tracing::error!(target: "hot_path", "{}", record.message),
        }
    }

    /// Enqueue a record without blocking. Silently dropped if the ring is
    /// full; see [`Self::dropped_count`].
    ///
    /// # Safety
    /// Must only be called from a single producer thread (the trade-engine
    /// thread), matching the SPSC contract of the underlying ring.
    pub unsafe fn emit(&self, level: LogLevel, message: String) {
        let _ = unsafe { self.ring.push(LogRecord { level, message }) };
    }

    /// Count of records dropped because the ring was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.ring.dropped_count()
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.drain.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_records_are_drained_without_blocking_the_caller() {
        let sink = LogSink::spawn();
        unsafe {
            sink.emit(LogLevel::Info, "engine started".to_owned());
            sink.emit(LogLevel::Warn, "risk gate rejected order".to_owned());
        }
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.dropped_count(), 0);
    }

    #[test]
    fn overflow_increments_drop_counter_instead_of_blocking() {
        let ring: SpscRing<LogRecord, 2> = SpscRing::new();
        unsafe {
            ring.push(LogRecord {
                level: LogLevel::Info,
                message: "a".to_owned(),
            })
            .unwrap();
        }
        let rejected = unsafe {
            ring.push(LogRecord {
                level: LogLevel::Info,
                message: "b".to_owned(),
            })
        };
        assert!(rejected.is_err());
        assert_eq!(ring.dropped_count(), 1);
    }
}
