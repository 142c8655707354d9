/// The error type used in this crate.
///
/// Every error is fatal to the parse call which produced it. Records or graph
/// nodes that were handed out before the error should be discarded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("The table is {len} bytes long, which is too short for the 36-byte table header")]
    TooShort { len: usize },

    #[error(
        "Expected table signature {:?}, found {:?}",
        String::from_utf8_lossy(expected),
        String::from_utf8_lossy(found)
    )]
    BadSignature { expected: [u8; 4], found: [u8; 4] },

    #[error("Truncated table at offset {offset}: {what}")]
    Truncated { offset: usize, what: ReadError },

    /// The entry at `offset` declared a length of zero, a length which would
    /// run past the end of the buffer, or a length too short for its own fields.
    #[error("Malformed entry at offset {offset} with length {length}")]
    Malformed { offset: usize, length: usize },

    #[error("Invalid PPTT node type {node_type} at offset {offset}")]
    InvalidNodeType { offset: usize, node_type: u8 },

    /// FPDT records don't have a trustworthy length field, so the walk can't
    /// skip over a record whose type it doesn't know.
    #[error("Unknown FPDT record type {record_type} at offset {offset}")]
    UnknownRecordKind { offset: usize, record_type: u16 },
}

/// This error indicates that the data slice was not large enough to
/// read the respective item.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    #[error("Could not read FpdtRecordHeader")]
    FpdtRecordHeader,

    #[error("Could not read PpttNodeType")]
    PpttNodeType,

    #[error("Could not read ProcessorNode")]
    ProcessorNode,

    #[error("Could not read CacheNode")]
    CacheNode,
}
