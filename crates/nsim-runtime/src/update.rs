//! Node update engine: spontaneous nerve excitation, inbox processing
//! and signal fan-out

use std::sync::Arc;

use nsim_graph::{NodeIndex, NodeKind, Signal, SignalType, NUM_SIGNAL_TYPES};
use rand::Rng;

use crate::{context::SimulationContext, error::Result, router::route, transport::Transport};

/// Remaining magnitude below which fan-out stops
pub const SIGNAL_EPSILON: f32 = 0.001;

/// Upper bound (inclusive) of spontaneous signals per nerve update
pub const MAX_EXCITATION_SIGNALS: u32 = 20;

/// Upper bound (exclusive) of a spontaneous signal's magnitude
pub const MAX_SIGNAL_VALUE: f32 = 1000.0;

/// Recent-signal count above which a neuron throttles
pub const OVERLOAD_THRESHOLD: u32 = 500;

/// Result of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fired {
    /// Chunks sent along edges
    pub chunks: u32,
    /// Sum of chunk magnitudes before edge weighting
    pub carried: f32,
    /// Stopped early on a non-conducting edge
    pub aborted: bool,
}

/// One iteration of updates on this worker
///
/// Every nerve the nerve policy assigns to this worker goes first, across
/// the whole graph; owned neurons follow in partition order. A neuron
/// therefore handles whatever the nerves sent it in the same iteration.
pub fn update_pass<T: Transport>(ctx: &mut SimulationContext, transport: &mut T) -> Result<()> {
    let graph = Arc::clone(&ctx.graph);
    let policy = ctx.nerve_policy;

    for (index, node) in graph.indexed_nodes() {
        if !node.is_nerve() {
            continue;
        }
        let owned = ctx.resolver.owns(index);
        if !policy.updates(owned) {
            continue;
        }
        if !owned {
            ctx.stats.foreign_nerve_updates += 1;
        }
        update_node(ctx, transport, index)?;
    }

    for i in ctx.resolver.local_range() {
        let index = NodeIndex::new(i as u32);
        if graph.node(index).map_or(false, |n| !n.is_nerve()) {
            update_node(ctx, transport, index)?;
        }
    }

    Ok(())
}

/// Update one node: excite it if it is a nerve, then handle every signal
/// that was queued before the update began
pub fn update_node<T: Transport>(
    ctx: &mut SimulationContext,
    transport: &mut T,
    index: NodeIndex,
) -> Result<()> {
    let graph = Arc::clone(&ctx.graph);
    let Some(node) = graph.node(index) else {
        return Ok(());
    };
    let slot = index.as_usize();
    if slot >= ctx.states.len() {
        return Ok(());
    }

    if node.is_nerve() && node.degree() > 0 {
        let count = ctx.rng.gen_range(0..=MAX_EXCITATION_SIGNALS);
        for _ in 0..count {
            let value = ctx.rng.gen_range(0.0..MAX_SIGNAL_VALUE);
            let signal_type = SignalType::wrapping(ctx.rng.gen_range(0..NUM_SIGNAL_TYPES));
            ctx.states[slot].inputs[signal_type.index()] += 1;
            fire(ctx, transport, index, value, signal_type)?;
        }
    }

    let pending = ctx.states[slot].inbox.take();
    let handled = pending.len() as u64;
    for signal in pending {
        if node.is_nerve() {
            ctx.states[slot].inputs[signal.signal_type.index()] += 1;
        }
        handle_signal(ctx, transport, index, signal)?;
        let state = &mut ctx.states[slot];
        state.signals_this_tick = state.signals_this_tick.saturating_add(1);
    }
    ctx.states[slot].total_received += handled;

    Ok(())
}

/// Handle one signal at `index`
///
/// Neurons scale the magnitude by their subtype weight and may throttle
/// when overloaded. Nerves count one output for the signal's type and pass
/// it on unchanged.
pub fn handle_signal<T: Transport>(
    ctx: &mut SimulationContext,
    transport: &mut T,
    index: NodeIndex,
    signal: Signal,
) -> Result<()> {
    let kind = match ctx.graph.node(index) {
        Some(node) => node.kind,
        None => return Ok(()),
    };

    let mut value = signal.value;
    match kind {
        NodeKind::Nerve => {
            if let Some(state) = ctx.state_mut(index) {
                state.outputs[signal.signal_type.index()] += 1;
            }
        }
        NodeKind::Neuron(neuron_type) => {
            value *= neuron_type.signal_weight();

            let recent = ctx.state(index).map_or(0, |s| s.recent_signals());
            if recent > OVERLOAD_THRESHOLD {
                if ctx.rng.gen_range(0..2) == 1 {
                    value /= 2.0;
                }
                if ctx.rng.gen_range(0..3) == 1 {
                    ctx.stats.dropped_overload += 1;
                    return Ok(());
                }
            }
        }
    }

    fire(ctx, transport, index, value, signal.signal_type)?;
    Ok(())
}

/// Split `magnitude` over randomly chosen incident edges
///
/// Each step picks an edge uniformly, carries at most its `max_value`,
/// and routes the chunk scaled by the edge's weighting to the far
/// endpoint. Stops once less than `SIGNAL_EPSILON` remains, or aborts if
/// the chosen edge cannot reduce the remainder.
pub fn fire<T: Transport>(
    ctx: &mut SimulationContext,
    transport: &mut T,
    index: NodeIndex,
    magnitude: f32,
    signal_type: SignalType,
) -> Result<Fired> {
    let graph = Arc::clone(&ctx.graph);
    let mut fired = Fired::default();
    let Some(node) = graph.node(index) else {
        return Ok(fired);
    };
    if node.edges.is_empty() {
        return Ok(fired);
    }

    let mut remaining = magnitude;
    while remaining >= SIGNAL_EPSILON {
        let pick = node.edges[ctx.rng.gen_range(0..node.edges.len())];
        let Some(edge) = graph.edge(pick) else {
            break;
        };

        let chunk = remaining.min(edge.max_value);
        let next = remaining - chunk;
        let conducting = !edge.max_value.is_nan() && edge.max_value >= SIGNAL_EPSILON;
        if !conducting || next >= remaining {
            log::warn!(
                "{}: edge {} from {} cannot carry signal (max {}), fire aborted with {} left",
                ctx.worker(),
                pick,
                node.id,
                edge.max_value,
                remaining
            );
            ctx.stats.aborted_fires += 1;
            fired.aborted = true;
            break;
        }
        remaining = next;
        fired.chunks += 1;
        fired.carried += chunk;

        if node.is_nerve() {
            if let Some(state) = ctx.states.get_mut(index.as_usize()) {
                state.outputs[signal_type.index()] += 1;
            }
        }

        let target = edge.far_endpoint(node.id);
        let weighted = Signal::new(signal_type, chunk * edge.weight(signal_type));
        route(ctx, transport, target, weighted)?;
    }

    Ok(fired)
}
