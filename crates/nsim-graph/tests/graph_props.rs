use std::collections::BTreeSet;

use nsim_graph::{parse_graph, EdgeIndex, GraphBuilder, NeuronType, NodeId, MAX_NODE_ID};
use proptest::prelude::*;

fn ids_and_edges() -> impl Strategy<Value = (Vec<u32>, Vec<(usize, usize)>)> {
    prop::collection::btree_set(0u32..MAX_NODE_ID as u32, 1..40).prop_flat_map(|ids| {
        let ids: Vec<u32> = ids.into_iter().collect();
        let n = ids.len();
        let edges = prop::collection::vec((0..n, 0..n), 0..80);
        (Just(ids), edges)
    })
}

fn render(ids: &[u32], edges: &[(usize, usize)]) -> String {
    let mut text = String::from("% generated\n");
    for (i, id) in ids.iter().enumerate() {
        if i % 3 == 0 {
            text.push_str(&format!("<nerve>\n<id>{}</id>\n</nerve>\n", id));
        } else {
            text.push_str(&format!("<neuron>\n<id>{}</id>\n<type>unipolar</type>\n</neuron>\n", id));
        }
    }
    for &(a, b) in edges {
        text.push_str(&format!(
            "<edge>\n<from>{}</from>\n<to>{}</to>\n<max_value>10</max_value>\n</edge>\n",
            ids[a], ids[b]
        ));
    }
    text
}

proptest! {
    #[test]
    fn every_edge_is_incident_to_its_endpoints((ids, edges) in ids_and_edges()) {
        let mut builder = GraphBuilder::new();
        for &id in &ids {
            builder = builder.add_neuron(id, NeuronType::Motor);
        }
        for &(a, b) in &edges {
            builder = builder.connect(ids[a], ids[b], 1.0, 1.0);
        }
        let graph = builder.build().unwrap();

        for (j, edge) in graph.edges().iter().enumerate() {
            for id in [edge.from, edge.to] {
                let index = graph.index_of(id).unwrap();
                let node = graph.node(index).unwrap();
                prop_assert!(node.edges.contains(&EdgeIndex::new(j as u32)));
            }
        }
        for node in graph.nodes() {
            let unique: BTreeSet<_> = node.edges.iter().collect();
            prop_assert_eq!(unique.len(), node.edges.len());
        }
    }

    #[test]
    fn parsed_text_matches_generated_graph((ids, edges) in ids_and_edges()) {
        let graph = parse_graph(&render(&ids, &edges)).unwrap();

        prop_assert_eq!(graph.node_count(), ids.len());
        prop_assert_eq!(graph.edge_count(), edges.len());
        prop_assert_eq!(graph.nerve_count(), (ids.len() + 2) / 3);
        for (i, &id) in ids.iter().enumerate() {
            let index = graph.index_of(NodeId::new(id)).unwrap();
            prop_assert_eq!(index.as_usize(), i);
        }
    }
}
