//! Rotating segment files: each holds a run of length-prefixed,
//! CRC32-checked entries up to a configured size cap.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SEGMENT_MAGIC: u32 = 0x5351_574C;
const SEGMENT_VERSION: u32 = 1;
const SEGMENT_HEADER_LEN: u64 = 8;

/// Failure reading or writing a segment file.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Underlying filesystem error.
    #[error("segment I/O error: {0}")]
    Io(#[from] io::Error),
    /// The file header's magic number did not match.
    #[error("not a segment file (bad magic {0:#x})")]
    BadMagic(u32),
    /// The file header's version is newer than this reader understands.
    #[error("unsupported segment version {0}")]
    UnsupportedVersion(u32),
    /// An entry's CRC32 did not match its payload.
    #[error("entry CRC mismatch: expected {expected:#x}, got {actual:#x}")]
    CrcMismatch {
        /// CRC recorded in the entry.
        expected: u32,
        /// CRC recomputed from the payload.
        actual: u32,
    },
    /// `append` was called with the segment already at capacity.
    #[error("segment is full")]
    Full,
}

/// A single open-for-append segment file.
pub struct Segment {
    path: PathBuf,
    file: BufWriter<File>,
    size: u64,
    max_size: u64,
}

impl Segment {
    /// Create a new, empty segment at `path` capped at `max_size` bytes.
    ///
    /// # Errors
    /// Propagates filesystem errors creating or writing the header.
    pub fn create(path: &Path, max_size: u64) -> Result<Self, SegmentError> {
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_u32::<LittleEndian>(SEGMENT_MAGIC)?;
        writer.write_u32::<LittleEndian>(SEGMENT_VERSION)?;
        writer.flush()?;
        Ok(Self { path: path.to_path_buf(), file: writer, size: SEGMENT_HEADER_LEN, max_size })
    }

    /// Open an existing segment for reading.
    ///
    /// # Errors
    /// Returns [`SegmentError::BadMagic`] or [`SegmentError::UnsupportedVersion`]
    /// if the header doesn't match, or propagates I/O errors.
    pub fn open(path: &Path) -> Result<SegmentReader, SegmentError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != SEGMENT_MAGIC {
            return Err(SegmentError::BadMagic(magic));
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != SEGMENT_VERSION {
            return Err(SegmentError::UnsupportedVersion(version));
        }
        Ok(SegmentReader { reader })
    }

    /// Append one entry, framed as `[len: u32][crc: u32][data]`.
    ///
    /// # Errors
    /// Returns [`SegmentError::Full`] if the entry would exceed `max_size`,
    /// or propagates the underlying write failure.
    pub fn append(&mut self, data: &[u8]) -> Result<(), SegmentError> {
        if self.is_full(data.len()) {
            return Err(SegmentError::Full);
        }
        let mut hasher = Hasher::new();
        hasher.update(data);
        let crc = hasher.finalize();

        self.file.write_u32::<LittleEndian>(u32::try_from(data.len()).unwrap_or(u32::MAX))?;
        self.file.write_u32::<LittleEndian>(crc)?;
        self.file.write_all(data)?;
        self.size += 8 + data.len() as u64;
        Ok(())
    }

    /// Whether an entry of `next_entry_size` bytes would exceed `max_size`.
    #[must_use]
    pub const fn is_full(&self, next_entry_size: usize) -> bool {
        self.size.saturating_add(8).saturating_add(next_entry_size as u64) > self.max_size
    }

    /// Flush buffered writes and fsync the file.
    ///
    /// # Errors
    /// Propagates the underlying flush/sync failure.
    pub fn flush(&mut self) -> Result<(), SegmentError> {
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        Ok(())
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the segment in bytes, including its header.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

/// Sequential reader over a segment's entries.
pub struct SegmentReader {
    reader: BufReader<File>,
}

impl SegmentReader {
    /// Read the next entry, or `None` at end of file.
    ///
    /// # Errors
    /// Returns [`SegmentError::CrcMismatch`] if the entry is corrupt, or
    /// propagates the underlying read failure.
    pub fn read_next(&mut self) -> Result<Option<Vec<u8>>, SegmentError> {
        let length = match self.reader.read_u32::<LittleEndian>() {
            Ok(length) => length,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let expected_crc = self.reader.read_u32::<LittleEndian>()?;
        let mut data = vec![0u8; length as usize];
        self.reader.read_exact(&mut data)?;

        let mut hasher = Hasher::new();
        hasher.update(&data);
        let actual_crc = hasher.finalize();
        if actual_crc != expected_crc {
            return Err(SegmentError::CrcMismatch { expected: expected_crc, actual: actual_crc });
        }
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_reads_entries_back_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0000000001.seg");
        {
            let mut segment = Segment::create(&path, 1024 * 1024).unwrap();
            segment.append(b"entry1").unwrap();
            segment.append(b"entry2").unwrap();
            segment.flush().unwrap();
        }
        let mut reader = Segment::open(&path).unwrap();
        assert_eq!(reader.read_next().unwrap(), Some(b"entry1".to_vec()));
        assert_eq!(reader.read_next().unwrap(), Some(b"entry2".to_vec()));
        assert_eq!(reader.read_next().unwrap(), None);
    }

    #[test]
    fn reports_full_before_exceeding_max_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0000000001.seg");
        let mut segment = Segment::create(&path, 32).unwrap();
        assert!(segment.append(b"0123456789012345").is_ok());
        assert!(matches!(segment.append(b"0123456789012345"), Err(SegmentError::Full)));
    }

    #[test]
    fn corrupted_entry_is_detected_on_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0000000001.seg");
        {
            let mut segment = Segment::create(&path, 1024).unwrap();
            segment.append(b"clean data").unwrap();
            segment.flush().unwrap();
        }
        {
            use std::io::{Seek, SeekFrom};
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(SEGMENT_HEADER_LEN + 8)).unwrap();
            file.write_all(b"corrupted!").unwrap();
        }
        let mut reader = Segment::open(&path).unwrap();
        assert!(matches!(reader.read_next(), Err(SegmentError::CrcMismatch { .. })));
    }
}
