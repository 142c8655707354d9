//! Parsing code for the [Firmware Performance Data Table][fpdt] (FPDT).
//!
//! The FPDT is a table header followed by a sequence of performance records.
//! Each record starts with a 4-byte record header holding the record type,
//! a revision and a length byte. The records this crate knows about mostly
//! point at other tables in memory (the FBPT and the S3PT) which hold the
//! actual boot timings.
//!
//! The record length byte is not used. Each known record type has a fixed
//! size, and a record of an unknown type stops the parse with
//! [`Error::UnknownRecordKind`] since there's no safe way to skip it.
//!
//! [fpdt]: https://uefi.org/specs/ACPI/6.6/05_ACPI_Software_Programming_Model.html#firmware-performance-data-table-fpdt
//!
//! # Example
//!
//! ```
//! use acpi_perf_topology::fpdt;
//!
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("fpdt.dat")?;
//! for record in fpdt::records(&data)? {
//!     let record = record?;
//!     println!("{}", record.record.record);
//! }
//! # Ok(())
//! # }
//! ```

mod record;

pub use record::*;

use crate::error::Error;
use crate::header::TableHeader;
use crate::walker::{RecordWalker, WalkedRecord};

/// The FPDT table signature.
pub const FPDT_SIGNATURE: &[u8; 4] = b"FPDT";

/// A fully parsed FPDT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fpdt {
    pub header: TableHeader,
    /// The records in table order, with their offsets.
    pub records: Vec<WalkedRecord<FpdtRecord>>,
}

impl Fpdt {
    /// Parse the whole table. Any error discards all records.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let header = TableHeader::parse(data, FPDT_SIGNATURE)?;
        let records = RecordWalker::new(data, TableHeader::SIZE, FpdtRecordDecoder)
            .collect::<Result<Vec<_>, Error>>()?;
        log::debug!("Parsed {} FPDT records", records.len());
        Ok(Self { header, records })
    }
}

/// Validate the FPDT header and return a walker over its records.
pub fn records(data: &[u8]) -> Result<RecordWalker<'_, FpdtRecordDecoder>, Error> {
    TableHeader::parse(data, FPDT_SIGNATURE)?;
    Ok(RecordWalker::new(data, TableHeader::SIZE, FpdtRecordDecoder))
}
