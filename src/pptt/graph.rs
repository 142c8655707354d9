use std::fmt;
use std::io::Write;

use linear_map::LinearMap;

use super::flags::{CacheFlags, ProcessorFlags};
use super::node::{CacheNode, ProcessorNode, TopologyNode};

/// How a graph node should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeStyle {
    #[default]
    Plain,
    /// Used for leaf processors.
    Filled,
}

/// A labeled node of the topology graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Lines are separated by `\n`.
    pub label: String,
    pub style: NodeStyle,
}

/// What an edge of the topology graph stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// From a processor node to its parent in the hierarchy.
    Parent,
    /// From a processor node to one of its private resources.
    PrivateResource,
    /// From a cache node to the next level of cache.
    NextLevel,
}

/// A directed edge between two table offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
}

/// The processor and cache topology described by a PPTT.
///
/// Nodes are identified by their offset in the table. Edges may point at
/// offsets which have no labeled node: cache nodes with incomplete
/// information aren't labeled, and nothing checks that a reference points at
/// a real node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyGraph {
    nodes: LinearMap<usize, GraphNode>,
    edges: Vec<Edge>,
}

impl TopologyGraph {
    /// The labeled nodes, in table order.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &GraphNode)> + '_ {
        self.nodes.iter().map(|(offset, node)| (*offset, node))
    }

    pub fn node(&self, offset: usize) -> Option<&GraphNode> {
        self.nodes.get(&offset)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The edges, in the order they were found.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The edges which start at `offset`.
    pub fn edges_from(&self, offset: usize) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |edge| edge.from == offset)
    }

    /// Write the graph in Graphviz DOT syntax. Node IDs are table offsets.
    pub fn write_dot<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        write!(writer, "{self}")
    }

    /// The graph in Graphviz DOT syntax.
    pub fn to_dot(&self) -> String {
        self.to_string()
    }
}

/// Formats the graph in Graphviz DOT syntax.
impl fmt::Display for TopologyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// PPTT Topology")?;
        writeln!(f, "digraph {{")?;
        for (offset, node) in self.nodes() {
            write!(f, "\t{offset} [label=\"{}\"", escape_label(&node.label))?;
            if node.style == NodeStyle::Filled {
                f.write_str(" style=filled")?;
            }
            writeln!(f, "]")?;
        }
        for edge in &self.edges {
            writeln!(f, "\t{} -> {}", edge.from, edge.to)?;
        }
        writeln!(f, "}}")
    }
}

fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Accumulates a [`TopologyGraph`] from decoded PPTT nodes.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraphBuilder {
    graph: TopologyGraph,
}

impl TopologyGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the node found at `offset`, along with its outgoing edges.
    pub fn add_node(&mut self, offset: usize, node: &TopologyNode) {
        match node {
            TopologyNode::Processor(processor) => self.add_processor(offset, processor),
            TopologyNode::Cache(cache) => self.add_cache(offset, cache),
        }
    }

    fn add_processor(&mut self, offset: usize, processor: &ProcessorNode) {
        let (label, style) = processor_label(processor);
        self.graph.nodes.insert(offset, GraphNode { label, style });

        if processor.parent != 0 {
            self.add_edge(offset, processor.parent, EdgeKind::Parent);
        }
        for &resource in &processor.private_resources {
            self.add_edge(offset, resource, EdgeKind::PrivateResource);
        }
    }

    fn add_cache(&mut self, offset: usize, cache: &CacheNode) {
        match cache_label(cache) {
            Some(label) => {
                self.graph.nodes.insert(
                    offset,
                    GraphNode {
                        label,
                        style: NodeStyle::Plain,
                    },
                );
            }
            None => log::debug!(
                "Cache node at offset {offset} is not fully described ({:?}), leaving it unlabeled",
                cache.flags
            ),
        }

        if cache.next_level != 0 {
            self.add_edge(offset, cache.next_level, EdgeKind::NextLevel);
        }
    }

    fn add_edge(&mut self, from: usize, to: u32, kind: EdgeKind) {
        // Table offsets are 32 bits wide.
        let to = to as usize;
        self.graph.edges.push(Edge { from, to, kind });
    }

    pub fn finish(self) -> TopologyGraph {
        log::debug!(
            "Built topology graph with {} nodes and {} edges",
            self.graph.nodes.len(),
            self.graph.edges.len()
        );
        self.graph
    }
}

/// Packages come first, then processors with a valid ID. Anything else is a
/// cluster-like grouping node.
pub fn processor_label(processor: &ProcessorNode) -> (String, NodeStyle) {
    let flags = processor.flags;
    if flags.contains(ProcessorFlags::PHYSICAL_PACKAGE) {
        ("Package".to_owned(), NodeStyle::Plain)
    } else if flags.contains(ProcessorFlags::ACPI_PROCESSOR_ID_VALID) {
        let style = if flags.contains(ProcessorFlags::NODE_IS_A_LEAF) {
            NodeStyle::Filled
        } else {
            NodeStyle::Plain
        };
        (format!("cpu{}", processor.acpi_processor_id), style)
    } else {
        ("Fake Cluster".to_owned(), NodeStyle::Plain)
    }
}

/// Returns `None` unless the cache is described well enough to draw it.
pub fn cache_label(cache: &CacheNode) -> Option<String> {
    if !cache.flags.is_described() || !cache.flags.contains(CacheFlags::CACHE_TYPE_VALID) {
        return None;
    }
    let attributes = cache.attributes;
    Some(format!(
        "{}\n{}\n{}-{}",
        attributes.cache_type(),
        format_cache_size(cache.size),
        attributes.allocation_type(),
        attributes.write_policy()
    ))
}

/// Scale a byte count to B, KB or MB, rounding down.
pub fn format_cache_size(size: u32) -> String {
    const KB: u32 = 1024;
    const MB: u32 = 1024 * 1024;
    if size < KB {
        format!("{size} B")
    } else if size < MB {
        format!("{} KB", size / KB)
    } else {
        format!("{} MB", size / MB)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pptt::flags::CacheAttributes;

    fn processor(flags: u32, parent: u32, id: u32, private_resources: Vec<u32>) -> TopologyNode {
        TopologyNode::Processor(ProcessorNode {
            length: (20 + 4 * private_resources.len()) as u8,
            flags: ProcessorFlags::from_bits_retain(flags),
            parent,
            acpi_processor_id: id,
            private_resources,
        })
    }

    fn cache(flags: u32, next_level: u32, size: u32, attributes: u8) -> CacheNode {
        CacheNode {
            length: 28,
            flags: CacheFlags::from_bits_retain(flags),
            next_level,
            size,
            number_of_sets: 0,
            associativity: 0,
            attributes: CacheAttributes(attributes),
            line_size: 0,
            cache_id: 0,
        }
    }

    fn label_of(node: TopologyNode) -> (String, NodeStyle) {
        match node {
            TopologyNode::Processor(p) => processor_label(&p),
            TopologyNode::Cache(_) => unreachable!(),
        }
    }

    #[test]
    fn package_wins() {
        for flags in [0b1, 0b11, 0b1011, 0b11111] {
            assert_eq!(
                label_of(processor(flags, 0, 5, vec![])),
                ("Package".to_owned(), NodeStyle::Plain)
            );
        }
    }

    #[test]
    fn cpu_labels() {
        assert_eq!(
            label_of(processor(0b0010, 0, 5, vec![])),
            ("cpu5".to_owned(), NodeStyle::Plain)
        );
        assert_eq!(
            label_of(processor(0b1010, 0, 12, vec![])),
            ("cpu12".to_owned(), NodeStyle::Filled)
        );
        assert_eq!(
            label_of(processor(0b0110, 0, 1, vec![])),
            ("cpu1".to_owned(), NodeStyle::Plain)
        );
    }

    #[test]
    fn fake_cluster() {
        for flags in [0, 0b100, 0b1000, 0b11100] {
            assert_eq!(
                label_of(processor(flags, 0, 5, vec![])),
                ("Fake Cluster".to_owned(), NodeStyle::Plain)
            );
        }
    }

    #[test]
    fn cache_sizes() {
        assert_eq!(format_cache_size(512), "512 B");
        assert_eq!(format_cache_size(1023), "1023 B");
        assert_eq!(format_cache_size(1024), "1 KB");
        assert_eq!(format_cache_size(2048), "2 KB");
        assert_eq!(format_cache_size(1024 * 1024 - 1), "1023 KB");
        assert_eq!(format_cache_size(1048576), "1 MB");
        assert_eq!(format_cache_size(3 * 1024 * 1024 + 5), "3 MB");
    }

    #[test]
    fn cache_labels() {
        assert_eq!(
            cache_label(&cache(0b111001, 0, 32768, 0b0_00_01)).as_deref(),
            Some("DCache\n32 KB\nWA-WB")
        );
        assert_eq!(
            cache_label(&cache(0xff, 0, 65536, 0b1_01_00)).as_deref(),
            Some("ICache\n64 KB\nRA-WT")
        );
        assert_eq!(
            cache_label(&cache(0xff, 0, 2 * 1024 * 1024, 0b0_11_11)).as_deref(),
            Some("Cache\n2 MB\nRWA-WB")
        );
        assert_eq!(cache_label(&cache(0b011001, 0, 32768, 0)), None);
        assert_eq!(cache_label(&cache(0b110001, 0, 32768, 0)), None);
    }

    #[test]
    fn processor_edges() {
        let mut builder = TopologyGraphBuilder::new();
        builder.add_node(100, &processor(0b1010, 60, 0, vec![140, 168, 140]));
        let graph = builder.finish();
        let edges: Vec<_> = graph.edges_from(100).map(|e| (e.to, e.kind)).collect();
        assert_eq!(
            edges,
            vec![
                (60, EdgeKind::Parent),
                (140, EdgeKind::PrivateResource),
                (168, EdgeKind::PrivateResource),
                (140, EdgeKind::PrivateResource),
            ]
        );
    }

    #[test]
    fn unlabeled_cache_still_has_edges() {
        let mut builder = TopologyGraphBuilder::new();
        builder.add_node(36, &TopologyNode::Cache(cache(0b1, 64, 1024, 0)));
        builder.add_node(64, &TopologyNode::Cache(cache(0b111001, 0, 1024, 0)));
        let graph = builder.finish();
        assert!(graph.node(36).is_none());
        assert_eq!(graph.node(64).unwrap().label, "DCache\n1 KB\nRA-WB");
        assert_eq!(
            graph.edges(),
            &[Edge {
                from: 36,
                to: 64,
                kind: EdgeKind::NextLevel
            }]
        );
    }

    #[test]
    fn dot_output() {
        let mut builder = TopologyGraphBuilder::new();
        builder.add_node(36, &processor(0b1, 0, 0, vec![]));
        builder.add_node(56, &processor(0b1010, 36, 3, vec![76]));
        builder.add_node(76, &TopologyNode::Cache(cache(0b111001, 0, 512, 0b10)));
        let dot = builder.finish().to_dot();
        assert_eq!(
            dot,
            "// PPTT Topology\n\
             digraph {\n\
             \t36 [label=\"Package\"]\n\
             \t56 [label=\"cpu3\" style=filled]\n\
             \t76 [label=\"DCache\\n512 B\\nRWA-WB\"]\n\
             \t56 -> 36\n\
             \t56 -> 76\n\
             }\n"
        );
    }

    #[test]
    fn write_dot_matches_to_dot() {
        let mut builder = TopologyGraphBuilder::new();
        builder.add_node(36, &processor(0b1, 0, 0, vec![64]));
        builder.add_node(64, &TopologyNode::Cache(cache(0xff, 0, 3 << 20, 0b1_10_11)));
        let graph = builder.finish();
        let mut buf = Vec::new();
        graph.write_dot(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), graph.to_dot());
        assert_eq!(graph.to_dot(), graph.to_string());
        assert!(graph.to_dot().contains("\t64 [label=\"Cache\\n3 MB\\nRWA-WT\"]\n"));
    }
}
