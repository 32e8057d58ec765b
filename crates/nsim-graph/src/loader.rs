//! Reader for the line-oriented, tag-delimited graph definition format
//!
//! ```text
//! % comment
//! <neuron>
//!     <id>1</id>
//!     <x>0.5</x>
//!     <y>1.0</y>
//!     <type>motor</type>
//! </neuron>
//! <edge>
//!     <from>1</from>
//!     <to>2</to>
//!     <direction>bidirectional</direction>
//!     <max_value>100</max_value>
//!     <weighting_0>1.0</weighting_0>
//! </edge>
//! ```
//!
//! One tag per line. Anything the reader does not recognise is skipped.

use std::path::Path;
use std::str::FromStr;

use crate::{
    error::{GraphError, Result},
    graph::{BrainGraph, GraphBuilder},
    ids::NodeId,
    model::{Direction, Edge, NeuronType, Node, NodeKind, Position},
    MAX_NODE_ID, NUM_SIGNAL_TYPES,
};

enum Block {
    None,
    Node(Node),
    Edge(Edge),
}

/// Load and freeze a graph from a file
pub fn load_graph(path: impl AsRef<Path>) -> Result<BrainGraph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let graph = parse_graph(&text)?;
    log::info!(
        "Loaded {} neurons, {} nerves, {} total nodes, {} edges from {}",
        graph.neuron_count(),
        graph.nerve_count(),
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

/// Parse and freeze a graph from its textual definition
pub fn parse_graph(text: &str) -> Result<BrainGraph> {
    let mut builder = GraphBuilder::new();
    let mut block = Block::None;

    for (i, raw_line) in text.lines().enumerate() {
        let line_no = i + 1;
        if raw_line.starts_with('%') {
            continue;
        }
        let line = raw_line.trim_start();

        if line.starts_with("<neuron>") {
            block = Block::Node(Node::neuron(NodeId::new(0), NeuronType::default(), Position::default()));
        } else if line.starts_with("<nerve>") {
            block = Block::Node(Node::nerve(NodeId::new(0), Position::default()));
        } else if line.starts_with("</neuron>") || line.starts_with("</nerve>") {
            if let Block::Node(node) = std::mem::replace(&mut block, Block::None) {
                builder.push_node(node);
            }
        } else if line.starts_with("<edge>") {
            block = Block::Edge(Edge::default());
        } else if line.starts_with("</edge>") {
            if let Block::Edge(edge) = std::mem::replace(&mut block, Block::None) {
                builder.push_edge(edge);
            }
        } else {
            match &mut block {
                Block::Node(node) => apply_node_tag(node, line, line_no)?,
                Block::Edge(edge) => apply_edge_tag(edge, line, line_no)?,
                Block::None => {}
            }
        }
    }

    if !matches!(block, Block::None) {
        return Err(GraphError::invalid_format(
            text.lines().count(),
            "unterminated block at end of input",
        ));
    }

    let graph = builder.build()?;
    if graph.node_count() == 0 {
        return Err(GraphError::EmptyGraph);
    }
    if graph.edge_count() == 0 {
        log::warn!("Graph has no edges; signals will never propagate");
    }
    Ok(graph)
}

fn apply_node_tag(node: &mut Node, line: &str, line_no: usize) -> Result<()> {
    if line.starts_with("<id>") {
        let id: u32 = parse_value(line, line_no)?;
        if id as usize >= MAX_NODE_ID {
            return Err(GraphError::NodeIdOutOfRange { id, max: MAX_NODE_ID });
        }
        node.id = NodeId::new(id);
    } else if line.starts_with("<x>") {
        node.position.x = parse_value(line, line_no)?;
    } else if line.starts_with("<y>") {
        node.position.y = parse_value(line, line_no)?;
    } else if line.starts_with("<z>") {
        node.position.z = parse_value(line, line_no)?;
    } else if line.starts_with("<type>") {
        if let NodeKind::Neuron(_) = node.kind {
            node.kind = NodeKind::Neuron(tag_value(line).parse()?);
        }
    }
    Ok(())
}

fn apply_edge_tag(edge: &mut Edge, line: &str, line_no: usize) -> Result<()> {
    if line.starts_with("<from>") {
        edge.from = NodeId::new(parse_value(line, line_no)?);
    } else if line.starts_with("<to>") {
        edge.to = NodeId::new(parse_value(line, line_no)?);
    } else if line.starts_with("<direction>") {
        edge.direction = if tag_value(line).contains("bidirectional") {
            Direction::Bidirectional
        } else {
            Direction::Unidirectional
        };
    } else if line.starts_with("<max_value>") {
        edge.max_value = parse_value(line, line_no)?;
    } else if let Some(rest) = line.strip_prefix("<weighting_") {
        let digits = rest.split('>').next().unwrap_or_default();
        match digits.trim().parse::<usize>() {
            Ok(idx) if idx < NUM_SIGNAL_TYPES => {
                edge.weighting[idx] = parse_value(line, line_no)?;
            }
            _ => log::warn!("Invalid signal weighting index '{}' at line {}", digits, line_no),
        }
    }
    Ok(())
}

/// Text between the first `>` and the next `<`
fn tag_value(line: &str) -> &str {
    let after = line.split_once('>').map(|(_, rest)| rest).unwrap_or_default();
    after.split('<').next().unwrap_or_default().trim()
}

fn parse_value<T: FromStr>(line: &str, line_no: usize) -> Result<T> {
    let value = tag_value(line);
    value
        .parse()
        .map_err(|_| GraphError::invalid_format(line_no, format!("cannot parse value '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{EdgeIndex, NodeIndex};
    use crate::model::SignalType;

    const SAMPLE: &str = "\
% two neurons and a nerve
<neuron>
    <id>1</id>
    <x>0.5</x>
    <y>1.5</y>
    <z>-2</z>
    <type>motor</type>
</neuron>
<nerve>
    <id>2</id>
    <type>ignored-for-nerves</type>
</nerve>
<neuron>
    <id>3</id>
    <type>multipolar</type>
</neuron>
<edge>
    <from>1</from>
    <to>2</to>
    <direction>bidirectional</direction>
    <max_value>100</max_value>
    <weighting_0>1.0</weighting_0>
    <weighting_9>0.25</weighting_9>
</edge>
<edge>
    <from>2</from>
    <to>3</to>
    <direction>unidirectional</direction>
    <max_value>12.5</max_value>
    <weighting_12>3.0</weighting_12>
</edge>
";

    #[test]
    fn test_parse_sample() {
        let graph = parse_graph(SAMPLE).unwrap();
        assert_eq!(graph.neuron_count(), 2);
        assert_eq!(graph.nerve_count(), 1);
        assert_eq!(graph.edge_count(), 2);

        let first = graph.node(NodeIndex::new(0)).unwrap();
        assert_eq!(first.kind, NodeKind::Neuron(NeuronType::Motor));
        assert_eq!(first.position, Position::new(0.5, 1.5, -2.0));

        let nerve = graph.node(NodeIndex::new(1)).unwrap();
        assert!(nerve.is_nerve());
        assert_eq!(nerve.edges, vec![EdgeIndex::new(0), EdgeIndex::new(1)]);

        let edge = graph.edge(EdgeIndex::new(0)).unwrap();
        assert_eq!(edge.max_value, 100.0);
        assert_eq!(edge.weight(SignalType::new(0).unwrap()), 1.0);
        assert_eq!(edge.weight(SignalType::new(9).unwrap()), 0.25);
        assert_eq!(edge.weight(SignalType::new(5).unwrap()), 0.0);

        let second = graph.edge(EdgeIndex::new(1)).unwrap();
        assert_eq!(second.direction, Direction::Unidirectional);
        assert_eq!(second.max_value, 12.5);
    }

    #[test]
    fn test_missing_type_defaults_to_sensory() {
        let graph = parse_graph("<neuron>\n<id>4</id>\n</neuron>\n").unwrap();
        assert_eq!(
            graph.node(NodeIndex::new(0)).unwrap().kind,
            NodeKind::Neuron(NeuronType::Sensory)
        );
    }

    #[test]
    fn test_unknown_neuron_type_is_fatal() {
        let err = parse_graph("<neuron>\n<id>4</id>\n<type>tripolar</type>\n</neuron>\n").unwrap_err();
        assert!(matches!(err, GraphError::UnknownNeuronType { .. }));
    }

    #[test]
    fn test_id_out_of_range_is_fatal() {
        let err = parse_graph("<nerve>\n<id>5000</id>\n</nerve>\n").unwrap_err();
        assert!(matches!(err, GraphError::NodeIdOutOfRange { id: 5000, .. }));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let err = parse_graph("<nerve>\n<id>abc</id>\n</nerve>\n").unwrap_err();
        assert!(matches!(err, GraphError::InvalidFormat { line: 2, .. }));
    }

    #[test]
    fn test_empty_graph_rejected() {
        let err = parse_graph("% nothing here\n").unwrap_err();
        assert!(matches!(err, GraphError::EmptyGraph));
    }

    #[test]
    fn test_unterminated_block() {
        assert!(parse_graph("<edge>\n<from>1</from>\n").is_err());
    }

    #[test]
    fn test_comment_only_on_first_column() {
        // A '%' after indentation is not a comment, but the line is still an unknown tag
        let graph = parse_graph("%<nerve>\n  %<nerve>\n<nerve>\n<id>1</id>\n</nerve>\n").unwrap();
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.txt");
        std::fs::write(&path, SAMPLE).unwrap();
        let graph = load_graph(&path).unwrap();
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_graph("/definitely/not/here.graph").unwrap_err();
        assert!(matches!(err, GraphError::Io { .. }));
    }
}
