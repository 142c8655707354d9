use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use super::flags::{CacheAttributes, CacheFlags, ProcessorFlags};
use crate::error::{Error, ReadError};
use crate::walker::RecordDecoder;

/// The type byte at the start of every PPTT node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PpttNodeType(pub u8);

impl PpttNodeType {
    pub const PROCESSOR: Self = Self(0);
    pub const CACHE: Self = Self(1);
}

/// A processor hierarchy node (type 0).
///
/// Depending on its flags this describes a physical package, a cluster, or a
/// single processor. The node is followed by a list of offsets to its private
/// resources, usually the caches which belong to this level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorNode {
    /// The declared node length, including the private resource list.
    pub length: u8,
    pub flags: ProcessorFlags,
    /// The table offset of the parent node, or 0 for the root.
    pub parent: u32,
    /// Matches the processor UID in the DSDT. Only meaningful with
    /// [`ProcessorFlags::ACPI_PROCESSOR_ID_VALID`].
    pub acpi_processor_id: u32,
    /// Table offsets of the private resources of this node.
    pub private_resources: Vec<u32>,
}

impl ProcessorNode {
    /// The size of the node without the private resource list.
    pub const FIXED_SIZE: usize = 20; // 20 bytes

    /// Parse a processor node from the start of `data`. The private resource
    /// list is read right after the fixed fields, whatever the declared length.
    pub fn parse(data: &[u8]) -> Result<Self, std::io::Error> {
        let mut cur = data;
        let _node_type = cur.read_u8()?;
        let length = cur.read_u8()?;
        let _reserved = cur.read_u16::<LittleEndian>()?;
        let flags = ProcessorFlags::from_bits_retain(cur.read_u32::<LittleEndian>()?);
        let parent = cur.read_u32::<LittleEndian>()?;
        let acpi_processor_id = cur.read_u32::<LittleEndian>()?;
        let private_resource_count = cur.read_u32::<LittleEndian>()?;

        // Make sure the whole list fits before allocating for it.
        let list_len = usize::try_from(private_resource_count)
            .ok()
            .and_then(|count| count.checked_mul(4))
            .ok_or(std::io::ErrorKind::InvalidData)?;
        if cur.len() < list_len {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        let private_resources = (0..private_resource_count)
            .map(|_| cur.read_u32::<LittleEndian>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            length,
            flags,
            parent,
            acpi_processor_id,
            private_resources,
        })
    }
}

/// A cache type node (type 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheNode {
    pub length: u8,
    /// Which of the other fields are valid.
    pub flags: CacheFlags,
    /// The table offset of the next level of cache, or 0 if this is the last level.
    pub next_level: u32,
    /// The cache size in bytes.
    pub size: u32,
    pub number_of_sets: u32,
    pub associativity: u8,
    pub attributes: CacheAttributes,
    /// The line size in bytes.
    pub line_size: u16,
    pub cache_id: u32,
}

impl CacheNode {
    /// The size of the structure as of ACPI 6.4. Revision 2 tables have
    /// 24-byte nodes without the cache ID; for those, `cache_id` holds
    /// whatever follows the node.
    pub const FIXED_SIZE: usize = 28; // 28 bytes

    pub fn parse<R: Read>(mut reader: R) -> Result<Self, std::io::Error> {
        let _node_type = reader.read_u8()?;
        let length = reader.read_u8()?;
        let _reserved = reader.read_u16::<LittleEndian>()?;
        let flags = CacheFlags::from_bits_retain(reader.read_u32::<LittleEndian>()?);
        let next_level = reader.read_u32::<LittleEndian>()?;
        let size = reader.read_u32::<LittleEndian>()?;
        let number_of_sets = reader.read_u32::<LittleEndian>()?;
        let associativity = reader.read_u8()?;
        let attributes = CacheAttributes(reader.read_u8()?);
        let line_size = reader.read_u16::<LittleEndian>()?;
        let cache_id = reader.read_u32::<LittleEndian>()?;
        Ok(Self {
            length,
            flags,
            next_level,
            size,
            number_of_sets,
            associativity,
            attributes,
            line_size,
            cache_id,
        })
    }
}

/// A decoded PPTT node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyNode {
    Processor(ProcessorNode),
    Cache(CacheNode),
}

impl TopologyNode {
    pub fn node_type(&self) -> PpttNodeType {
        match self {
            Self::Processor(_) => PpttNodeType::PROCESSOR,
            Self::Cache(_) => PpttNodeType::CACHE,
        }
    }
}

/// The [`RecordDecoder`] for PPTT nodes.
///
/// Unlike FPDT records, PPTT nodes carry their own length, which is what the
/// decoder reports as the consumed length. An unknown node type is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PpttNodeDecoder;

impl PpttNodeDecoder {
    /// Check the declared length: nonzero and within the buffer. Older tables
    /// have nodes shorter than the structures this crate reads, so the length
    /// isn't compared against them.
    fn check_length(data: &[u8], offset: usize, length: usize) -> Result<(), Error> {
        match offset.checked_add(length) {
            Some(end) if length != 0 && end <= data.len() => Ok(()),
            _ => Err(Error::Malformed { offset, length }),
        }
    }
}

impl RecordDecoder for PpttNodeDecoder {
    type Record = TopologyNode;
    const DISCRIMINANT_SIZE: usize = 1;
    const DISCRIMINANT_READ_ERROR: ReadError = ReadError::PpttNodeType;

    fn decode(&mut self, data: &[u8], offset: usize) -> Result<(TopologyNode, usize), Error> {
        let remaining = data.get(offset..).unwrap_or_default();
        let node_type = match remaining.first() {
            Some(&node_type) => PpttNodeType(node_type),
            None => {
                return Err(Error::Truncated {
                    offset,
                    what: ReadError::PpttNodeType,
                })
            }
        };

        match node_type {
            PpttNodeType::PROCESSOR => {
                let fixed = remaining
                    .get(..ProcessorNode::FIXED_SIZE)
                    .ok_or(Error::Truncated {
                        offset,
                        what: ReadError::ProcessorNode,
                    })?;
                let length = usize::from(fixed[1]);
                Self::check_length(data, offset, length)?;
                // Fails if the private resource list runs past the end of the table.
                let node = ProcessorNode::parse(remaining)
                    .map_err(|_| Error::Malformed { offset, length })?;
                log::trace!(
                    "PPTT processor node at offset {offset}: {:?}, parent {}, {} private resources",
                    node.flags,
                    node.parent,
                    node.private_resources.len()
                );
                Ok((TopologyNode::Processor(node), length))
            }
            PpttNodeType::CACHE => {
                let fixed = remaining
                    .get(..CacheNode::FIXED_SIZE)
                    .ok_or(Error::Truncated {
                        offset,
                        what: ReadError::CacheNode,
                    })?;
                let length = usize::from(fixed[1]);
                Self::check_length(data, offset, length)?;
                let node =
                    CacheNode::parse(fixed).map_err(|_| Error::Malformed { offset, length })?;
                log::trace!(
                    "PPTT cache node at offset {offset}: {:?}, size {}",
                    node.flags,
                    node.size
                );
                Ok((TopologyNode::Cache(node), length))
            }
            PpttNodeType(node_type) => Err(Error::InvalidNodeType { offset, node_type }),
        }
    }
}
