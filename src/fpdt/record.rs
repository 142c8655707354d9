use std::fmt;
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, ReadError};
use crate::walker::RecordDecoder;

/// The record type of an FPDT performance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FpdtRecordType(pub u16);

impl FpdtRecordType {
    /// Pointer to the Firmware Basic Boot Performance Table.
    pub const FBPT_POINTER: Self = Self(0);
    /// Pointer to the S3 Performance Table.
    pub const S3PT_POINTER: Self = Self(1);
    pub const MBPT_POINTER: Self = Self(2);
    pub const TIMESTAMP: Self = Self(3);
}

/// The header at the start of every performance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpdtRecordHeader {
    pub record_type: FpdtRecordType,
    pub revision: u8,
    /// The length the firmware declared for this record. Not trusted: the
    /// number of bytes a record occupies is fixed by its type.
    pub declared_length: u8,
}

impl FpdtRecordHeader {
    pub const SIZE: usize = 4; // 4 bytes

    pub fn parse<R: Read>(mut reader: R) -> Result<Self, std::io::Error> {
        let record_type = FpdtRecordType(reader.read_u16::<LittleEndian>()?);
        let revision = reader.read_u8()?;
        let declared_length = reader.read_u8()?;
        Ok(Self {
            record_type,
            revision,
            declared_length,
        })
    }
}

/// A parsed performance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceRecord {
    /// Points at the Firmware Basic Boot Performance Table.
    Fbpt { pointer: u64 },
    /// Points at the S3 Performance Table.
    S3pt { pointer: u64 },
    Mbpt { pointer: u64 },
    Timestamp,
    /// A record type this crate doesn't know. Its size can't be determined.
    Unknown(FpdtRecordType),
}

impl PerformanceRecord {
    /// The size of the pointer records: header, 4 reserved bytes, 8-byte pointer.
    pub const POINTER_RECORD_SIZE: usize = FpdtRecordHeader::SIZE + 12;
    pub const TIMESTAMP_RECORD_SIZE: usize = FpdtRecordHeader::SIZE + 28;

    /// The pointer sits after the record header and 4 reserved bytes.
    const POINTER_OFFSET: usize = FpdtRecordHeader::SIZE + 4;

    /// The number of bytes a record of this type occupies, or `None` if unknown.
    pub fn record_size(record_type: FpdtRecordType) -> Option<usize> {
        match record_type {
            FpdtRecordType::FBPT_POINTER
            | FpdtRecordType::S3PT_POINTER
            | FpdtRecordType::MBPT_POINTER => Some(Self::POINTER_RECORD_SIZE),
            FpdtRecordType::TIMESTAMP => Some(Self::TIMESTAMP_RECORD_SIZE),
            _ => None,
        }
    }

    /// Parse the record body. `data` must hold at least
    /// `record_size(record_type)` bytes, starting at the record header.
    pub fn parse(record_type: FpdtRecordType, data: &[u8]) -> Result<Self, std::io::Error> {
        let read_pointer = || -> Result<u64, std::io::Error> {
            let mut cur = data
                .get(Self::POINTER_OFFSET..)
                .ok_or(std::io::ErrorKind::UnexpectedEof)?;
            cur.read_u64::<LittleEndian>()
        };
        let record = match record_type {
            FpdtRecordType::FBPT_POINTER => Self::Fbpt {
                pointer: read_pointer()?,
            },
            FpdtRecordType::S3PT_POINTER => Self::S3pt {
                pointer: read_pointer()?,
            },
            FpdtRecordType::MBPT_POINTER => Self::Mbpt {
                pointer: read_pointer()?,
            },
            FpdtRecordType::TIMESTAMP => Self::Timestamp,
            other => Self::Unknown(other),
        };
        Ok(record)
    }

    /// The short name of the record type, e.g. `"S3PT"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fbpt { .. } => "FBPT",
            Self::S3pt { .. } => "S3PT",
            Self::Mbpt { .. } => "MBPT",
            Self::Timestamp => "Timestamp",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// The table address carried by pointer records.
    pub fn pointer(&self) -> Option<u64> {
        match *self {
            Self::Fbpt { pointer } | Self::S3pt { pointer } | Self::Mbpt { pointer } => {
                Some(pointer)
            }
            Self::Timestamp | Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for PerformanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(record_type) => write!(f, "{}", record_type.0),
            _ => match self.pointer() {
                Some(pointer) => write!(f, "{}\nPointer: {pointer:#x}", self.name()),
                None => f.write_str(self.name()),
            },
        }
    }
}

/// A decoded FPDT record along with its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpdtRecord {
    pub header: FpdtRecordHeader,
    pub record: PerformanceRecord,
}

/// The [`RecordDecoder`] for FPDT performance records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpdtRecordDecoder;

impl RecordDecoder for FpdtRecordDecoder {
    type Record = FpdtRecord;
    const DISCRIMINANT_SIZE: usize = FpdtRecordHeader::SIZE;
    const DISCRIMINANT_READ_ERROR: ReadError = ReadError::FpdtRecordHeader;

    fn decode(&mut self, data: &[u8], offset: usize) -> Result<(FpdtRecord, usize), Error> {
        let record_data = data.get(offset..).unwrap_or_default();
        let header = FpdtRecordHeader::parse(record_data).map_err(|_| Error::Truncated {
            offset,
            what: ReadError::FpdtRecordHeader,
        })?;

        let length = PerformanceRecord::record_size(header.record_type).ok_or(
            Error::UnknownRecordKind {
                offset,
                record_type: header.record_type.0,
            },
        )?;
        let record_data = record_data
            .get(..length)
            .ok_or(Error::Malformed { offset, length })?;
        let record = PerformanceRecord::parse(header.record_type, record_data)
            .map_err(|_| Error::Malformed { offset, length })?;

        log::trace!("FPDT record {} at offset {offset}", record.name());
        Ok((FpdtRecord { header, record }, length))
    }
}
