//! Frozen node/edge arena and the global id-to-index table

use crate::{
    error::{GraphError, Result},
    ids::{EdgeIndex, NodeId, NodeIndex},
    model::{Edge, NeuronType, Node, Position},
    MAX_NODE_ID,
};

/// Maps node identifiers to their global position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdTable {
    slots: Vec<Option<NodeIndex>>,
}

impl IdTable {
    /// Create an empty table covering `[0, MAX_NODE_ID)`
    pub fn new() -> Self {
        Self {
            slots: vec![None; MAX_NODE_ID],
        }
    }

    /// Look up the global index of `id`
    ///
    /// Returns `None` for unmapped or out-of-range identifiers.
    pub fn get(&self, id: NodeId) -> Option<NodeIndex> {
        self.slots.get(id.raw() as usize).copied().flatten()
    }

    fn insert(&mut self, id: NodeId, index: NodeIndex) -> Result<()> {
        let slot = self
            .slots
            .get_mut(id.raw() as usize)
            .ok_or(GraphError::NodeIdOutOfRange {
                id: id.raw(),
                max: MAX_NODE_ID,
            })?;
        if slot.is_some() {
            return Err(GraphError::DuplicateNodeId { id: id.raw() });
        }
        *slot = Some(index);
        Ok(())
    }

    /// Number of mapped identifiers
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True if nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl Default for IdTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable neuron/nerve graph
///
/// Built once at load time and shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct BrainGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    ids: IdTable,
    neuron_count: usize,
    nerve_count: usize,
}

impl BrainGraph {
    /// All nodes in global order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in load order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Node at a global index
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.as_usize())
    }

    /// Edge at an index, `None` if stale
    pub fn edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.edges.get(index.as_usize())
    }

    /// Global index of a node identifier
    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.ids.get(id)
    }

    /// The id-to-index table
    pub fn id_table(&self) -> &IdTable {
        &self.ids
    }

    /// Total node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total edge count
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of neurons
    pub fn neuron_count(&self) -> usize {
        self.neuron_count
    }

    /// Number of nerves
    pub fn nerve_count(&self) -> usize {
        self.nerve_count
    }

    /// Iterate over `(index, node)` pairs
    pub fn indexed_nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex::new(i as u32), node))
    }
}

/// Builder for constructing graphs
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    /// Create a new graph builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully described node
    pub fn add_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a neuron at the origin
    pub fn add_neuron(self, id: u32, neuron_type: NeuronType) -> Self {
        self.add_node(Node::neuron(NodeId::new(id), neuron_type, Position::default()))
    }

    /// Add a nerve at the origin
    pub fn add_nerve(self, id: u32) -> Self {
        self.add_node(Node::nerve(NodeId::new(id), Position::default()))
    }

    /// Add a fully described edge
    pub fn add_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Add a bidirectional edge with uniform weighting
    pub fn connect(self, from: u32, to: u32, max_value: f32, weight: f32) -> Self {
        self.add_edge(Edge::uniform(NodeId::new(from), NodeId::new(to), max_value, weight))
    }

    /// Append a node in place
    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Append an edge in place
    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Number of nodes added so far
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges added so far
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Freeze the graph: build the id table and link nodes to their edges
    pub fn build(self) -> Result<BrainGraph> {
        let mut nodes = self.nodes;
        let edges = self.edges;
        let mut ids = IdTable::new();

        for (i, node) in nodes.iter().enumerate() {
            ids.insert(node.id, NodeIndex::new(i as u32))?;
        }

        for (j, edge) in edges.iter().enumerate() {
            let ends = if edge.from == edge.to {
                [Some(edge.from), None]
            } else {
                [Some(edge.from), Some(edge.to)]
            };
            for id in ends.into_iter().flatten() {
                if let Some(index) = ids.get(id) {
                    nodes[index.as_usize()].edges.push(EdgeIndex::new(j as u32));
                }
            }
        }

        let nerve_count = nodes.iter().filter(|n| n.is_nerve()).count();
        let neuron_count = nodes.len() - nerve_count;

        Ok(BrainGraph {
            nodes,
            edges,
            ids,
            neuron_count,
            nerve_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    #[test]
    fn test_graph_builder() {
        let graph = GraphBuilder::new()
            .add_neuron(10, NeuronType::Motor)
            .add_nerve(20)
            .add_neuron(30, NeuronType::Bipolar)
            .connect(10, 20, 5.0, 1.0)
            .connect(20, 30, 5.0, 1.0)
            .build()
            .unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neuron_count(), 2);
        assert_eq!(graph.nerve_count(), 1);
        assert_eq!(graph.index_of(NodeId::new(20)), Some(NodeIndex::new(1)));
        assert_eq!(graph.index_of(NodeId::new(21)), None);
    }

    #[test]
    fn test_edge_linking() {
        let graph = GraphBuilder::new()
            .add_neuron(0, NeuronType::Sensory)
            .add_neuron(1, NeuronType::Sensory)
            .add_neuron(2, NeuronType::Sensory)
            .connect(0, 1, 1.0, 1.0)
            .connect(1, 2, 1.0, 1.0)
            .connect(2, 2, 1.0, 1.0)
            .build()
            .unwrap();

        let middle = graph.node(NodeIndex::new(1)).unwrap();
        assert_eq!(middle.edges, vec![EdgeIndex::new(0), EdgeIndex::new(1)]);

        // A self loop is listed once
        let last = graph.node(NodeIndex::new(2)).unwrap();
        assert_eq!(last.edges, vec![EdgeIndex::new(1), EdgeIndex::new(2)]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = GraphBuilder::new()
            .add_nerve(5)
            .add_neuron(5, NeuronType::Motor)
            .build();
        assert!(matches!(result, Err(GraphError::DuplicateNodeId { id: 5 })));
    }

    #[test]
    fn test_out_of_range_id_rejected() {
        let result = GraphBuilder::new().add_nerve(MAX_NODE_ID as u32).build();
        assert!(matches!(result, Err(GraphError::NodeIdOutOfRange { .. })));
    }

    #[test]
    fn test_dangling_edge_kept() {
        let graph = GraphBuilder::new()
            .add_neuron(0, NeuronType::Sensory)
            .connect(0, 99, 1.0, 1.0)
            .build()
            .unwrap();
        assert_eq!(graph.node(NodeIndex::new(0)).unwrap().degree(), 1);
        assert_eq!(graph.index_of(NodeId::new(99)), None);
    }

    #[test]
    fn test_stale_edge_lookup() {
        let graph = GraphBuilder::new().add_nerve(0).build().unwrap();
        assert!(graph.edge(EdgeIndex::new(0)).is_none());
        assert_eq!(graph.node(NodeIndex::new(0)).unwrap().kind, NodeKind::Nerve);
    }

    #[test]
    fn test_id_table() {
        let table = IdTable::new();
        assert!(table.is_empty());
        assert_eq!(table.get(NodeId::new(u32::MAX)), None);
    }
}
