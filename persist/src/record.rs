//! Wire shape of one persisted record: a fixed header followed by a
//! variable-length payload, per the persisted-state layout.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use common::types::{TickerId, Ts};
use std::io::{self, Read, Write};

/// What a persisted record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// A normalized market-data tick or book-level update.
    Tick,
    /// A full order-book snapshot.
    BookSnapshot,
}

impl RecordType {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Tick => 0,
            Self::BookSnapshot => 1,
        }
    }

    const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Tick),
            1 => Some(Self::BookSnapshot),
            _ => None,
        }
    }
}

/// Header preceding every persisted record's payload:
/// `{timestamp_ns: u64, ticker_id: u32, type: u8, length: u16}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Time the record was produced.
    pub timestamp_ns: Ts,
    /// Instrument the record applies to.
    pub ticker_id: TickerId,
    /// Kind of record.
    pub record_type: RecordType,
    /// Payload length in bytes.
    pub length: u16,
}

/// Encoded length of a [`RecordHeader`] on the wire.
pub const HEADER_LEN: usize = 8 + 4 + 1 + 2;

/// Unrecognized or truncated record on decode.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Underlying I/O failure reading or writing a record.
    #[error("record I/O error: {0}")]
    Io(#[from] io::Error),
    /// The record type byte did not match a known [`RecordType`].
    #[error("unknown record type byte {0}")]
    UnknownType(u8),
    /// The ticker id field was out of the valid range.
    #[error("invalid ticker id {0}")]
    InvalidTicker(u32),
}

impl RecordHeader {
    /// Write this header to `writer` in wire order.
    ///
    /// # Errors
    /// Propagates the underlying writer's I/O errors.
    pub fn encode<W: Write>(&self, writer: &mut W) -> Result<(), RecordError> {
        writer.write_u64::<LittleEndian>(self.timestamp_ns.as_nanos())?;
        writer.write_u32::<LittleEndian>(self.ticker_id.index() as u32)?;
        writer.write_u8(self.record_type.to_u8())?;
        writer.write_u16::<LittleEndian>(self.length)?;
        Ok(())
    }

    /// Read a header from `reader` in wire order.
    ///
    /// # Errors
    /// Returns [`RecordError::UnknownType`] or [`RecordError::InvalidTicker`]
    /// for malformed fields, or propagates I/O errors.
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self, RecordError> {
        let timestamp_ns = Ts::from_nanos(reader.read_u64::<LittleEndian>()?);
        let ticker_raw = reader.read_u32::<LittleEndian>()?;
        let ticker_id = TickerId::new(ticker_raw).ok_or(RecordError::InvalidTicker(ticker_raw))?;
        let type_byte = reader.read_u8()?;
        let record_type = RecordType::from_u8(type_byte).ok_or(RecordError::UnknownType(type_byte))?;
        let length = reader.read_u16::<LittleEndian>()?;
        Ok(Self { timestamp_ns, ticker_id, record_type, length })
    }
}

/// One record ready to hand to the sink: header plus payload bytes.
#[derive(Debug, Clone)]
pub struct PersistRecord {
    /// Record header.
    pub header: RecordHeader,
    /// Payload bytes, `header.length` long.
    pub payload: Vec<u8>,
}

impl PersistRecord {
    /// Build a record, computing `length` from the payload.
    ///
    /// # Panics
    /// Panics if `payload` exceeds `u16::MAX` bytes — persisted records are
    /// single ticks or snapshots, never larger.
    #[must_use]
    pub fn new(timestamp_ns: Ts, ticker_id: TickerId, record_type: RecordType, payload: Vec<u8>) -> Self {
        let length = u16::try_from(payload.len()).expect("persisted record payload exceeds u16::MAX");
        Self { header: RecordHeader { timestamp_ns, ticker_id, record_type, length }, payload }
    }

    /// Serialize header followed by payload into one contiguous buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        self.header.encode(&mut buf).expect("writing to a Vec never fails");
        buf.extend_from_slice(&self.payload);
        buf
    }
}
