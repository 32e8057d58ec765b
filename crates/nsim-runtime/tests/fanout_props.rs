use std::sync::Arc;

use nsim_runtime::update::SIGNAL_EPSILON;
use nsim_runtime::{
    fire, ChannelMesh, GraphBuilder, NervePolicy, NeuronType, NodeId, NodeIndex, SignalType,
    SimulationContext, WorkerId,
};
use proptest::prelude::*;

fn fan_out(magnitude: f32, max_value: f32, seed: u64) -> (nsim_runtime::Fired, u64) {
    let graph = GraphBuilder::new()
        .add_neuron(1, NeuronType::Motor)
        .add_neuron(2, NeuronType::Motor)
        .add_neuron(3, NeuronType::Sensory)
        .connect(1, 2, max_value, 1.0)
        .connect(1, 3, max_value, 1.0)
        .build()
        .unwrap();
    let mut ctx =
        SimulationContext::new(Arc::new(graph), 1, WorkerId::new(0), Some(seed), NervePolicy::default())
            .unwrap();
    let mut transport = ChannelMesh::new(1).unwrap().remove(0);

    let fired = fire(&mut ctx, &mut transport, NodeIndex::new(0), magnitude, SignalType::new(0).unwrap())
        .unwrap();
    let queued = [2, 3]
        .iter()
        .map(|&id| ctx.state_of(NodeId::new(id)).unwrap().inbox.len() as u64)
        .sum();
    (fired, queued)
}

proptest! {
    #[test]
    fn fan_out_carries_whole_magnitude(
        max_value in 0.001f32..10.0,
        factor in 0.0f32..20.0,
        seed in any::<u64>(),
    ) {
        let magnitude = max_value * factor;
        let (fired, queued) = fan_out(magnitude, max_value, seed);

        prop_assert!(!fired.aborted);
        prop_assert!((fired.carried - magnitude).abs() < 2.0 * SIGNAL_EPSILON);
        prop_assert!(fired.chunks as f32 <= factor.ceil() + 1.0);
        prop_assert_eq!(u64::from(fired.chunks), queued);
    }

    #[test]
    fn exact_chunks_leave_nothing_behind(eighths in 0u32..8_000, quarters in 1u32..4_000, seed in any::<u64>()) {
        // Dyadic values keep every subtraction exact in f32
        let magnitude = eighths as f32 / 8.0;
        let max_value = quarters as f32 / 4.0;
        let (fired, _) = fan_out(magnitude, max_value, seed);

        prop_assert!(!fired.aborted);
        prop_assert_eq!(fired.carried, magnitude);
        let per_chunk = 2 * quarters;
        prop_assert_eq!(fired.chunks, (eighths + per_chunk - 1) / per_chunk);
    }
}
