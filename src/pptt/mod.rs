//! Parsing code for the [Processor Properties Topology Table][pptt] (PPTT).
//!
//! The PPTT describes how processors are grouped into clusters and packages,
//! and which caches belong to which level of that hierarchy. After the table
//! header comes a sequence of nodes. Every node starts with a type byte and a
//! length byte, and the length covers any variable-sized trailer, so nodes are
//! walked by their own declared length.
//!
//! Nodes refer to each other by their byte offset from the start of the table.
//! [`Pptt::parse`] turns those references into a [`TopologyGraph`] whose node
//! IDs are the same offsets.
//!
//! [pptt]: https://uefi.org/specs/ACPI/6.6/05_ACPI_Software_Programming_Model.html#processor-properties-topology-table-pptt
//!
//! # Example
//!
//! ```
//! use acpi_perf_topology::pptt::Pptt;
//!
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("PPTT.aml")?;
//! let pptt = Pptt::parse(&data)?;
//! for (offset, node) in pptt.graph.nodes() {
//!     println!("{offset}: {}", node.label.replace('\n', " "));
//! }
//! std::fs::write("pptt_topology.dot", pptt.graph.to_dot())?;
//! # Ok(())
//! # }
//! ```

mod flags;
mod graph;
mod node;

pub use flags::*;
pub use graph::*;
pub use node::*;

use crate::error::Error;
use crate::header::TableHeader;
use crate::walker::{RecordWalker, WalkedRecord};

/// The PPTT table signature.
pub const PPTT_SIGNATURE: &[u8; 4] = b"PPTT";

/// A fully parsed PPTT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pptt {
    pub header: TableHeader,
    /// The decoded nodes in table order, with their offsets.
    pub nodes: Vec<WalkedRecord<TopologyNode>>,
    pub graph: TopologyGraph,
}

impl Pptt {
    /// Parse the whole table and build its topology graph.
    ///
    /// Any error discards everything decoded so far, including the graph.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let header = TableHeader::parse(data, PPTT_SIGNATURE)?;
        let mut walker = RecordWalker::new(data, TableHeader::SIZE, PpttNodeDecoder);
        let mut builder = TopologyGraphBuilder::new();
        let mut nodes = Vec::new();
        while let Some(node) = walker.next_record()? {
            builder.add_node(node.offset, &node.record);
            nodes.push(node);
        }
        Ok(Self {
            header,
            nodes,
            graph: builder.finish(),
        })
    }
}

/// Validate the PPTT header and return a walker over its nodes.
pub fn nodes(data: &[u8]) -> Result<RecordWalker<'_, PpttNodeDecoder>, Error> {
    TableHeader::parse(data, PPTT_SIGNATURE)?;
    Ok(RecordWalker::new(data, TableHeader::SIZE, PpttNodeDecoder))
}
