//! A parser for two ACPI tables published by firmware: the Firmware
//! Performance Data Table (FPDT) and the Processor Properties Topology Table
//! (PPTT).
//!
//! Both tables consist of the standard 36-byte ACPI table header followed by
//! a sequence of entries. The FPDT holds performance records, each with a
//! size fixed by its type; most of them point at other tables holding boot
//! timings. The PPTT holds processor and cache nodes which carry their own
//! length and refer to each other by table offset; [`pptt::Pptt::parse`]
//! turns them into a [`pptt::TopologyGraph`].
//!
//! The table contents are treated as untrusted. Every length and offset is
//! checked before it's used, and every error aborts the parse.
//!
//! Loading the table bytes (for example from `/sys/firmware/acpi/tables`) is
//! up to the caller.
//!
//! # Example
//!
//! ```
//! use acpi_perf_topology::{parse_table, ParsedTable, TableKind};
//!
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("/sys/firmware/acpi/tables/PPTT")?;
//! let kind = TableKind::detect(&data).ok_or("not an FPDT or PPTT")?;
//! match parse_table(&data, kind)? {
//!     ParsedTable::Fpdt(fpdt) => {
//!         for record in &fpdt.records {
//!             println!("{}", record.record.record);
//!         }
//!     }
//!     ParsedTable::Pptt(pptt) => {
//!         print!("{}", pptt.graph.to_dot());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod fpdt;
mod header;
pub mod pptt;
mod walker;

pub use error::{Error, ReadError};
pub use header::TableHeader;
pub use walker::{RecordDecoder, RecordWalker, WalkState, WalkedRecord};

/// The tables this crate can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Fpdt,
    Pptt,
}

impl TableKind {
    pub fn signature(&self) -> &'static [u8; 4] {
        match self {
            Self::Fpdt => fpdt::FPDT_SIGNATURE,
            Self::Pptt => pptt::PPTT_SIGNATURE,
        }
    }

    /// Guess the table kind from the signature at the start of `data`.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data.get(..4)? {
            s if s == fpdt::FPDT_SIGNATURE => Some(Self::Fpdt),
            s if s == pptt::PPTT_SIGNATURE => Some(Self::Pptt),
            _ => None,
        }
    }
}

/// The result of [`parse_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTable {
    Fpdt(fpdt::Fpdt),
    Pptt(pptt::Pptt),
}

impl ParsedTable {
    pub fn header(&self) -> &TableHeader {
        match self {
            Self::Fpdt(fpdt) => &fpdt.header,
            Self::Pptt(pptt) => &pptt.header,
        }
    }
}

/// Parse `data` as a table of the given kind.
pub fn parse_table(data: &[u8], kind: TableKind) -> Result<ParsedTable, Error> {
    match kind {
        TableKind::Fpdt => fpdt::Fpdt::parse(data).map(ParsedTable::Fpdt),
        TableKind::Pptt => pptt::Pptt::parse(data).map(ParsedTable::Pptt),
    }
}
