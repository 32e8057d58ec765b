//! Event dispatch onto a worker's context

use std::path::PathBuf;

use nsim_graph::{NodeIndex, Signal};

use crate::{
    context::SimulationContext,
    error::Result,
    report::{write_report, MergedCounts},
};

/// Something that happens to a worker
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Deliver a signal to a locally owned node
    Signal {
        /// Arena slot of the receiving node
        target: NodeIndex,
        /// Payload
        signal: Signal,
    },
    /// Write the summary report from this context's counters
    Report {
        /// Destination file
        output: PathBuf,
    },
    /// Stop the worker and release its state
    Terminate,
}

/// What became of a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Signal queued in the target inbox
    Queued,
    /// Signal discarded (full inbox or slot outside the arena)
    Dropped,
    /// Report written
    Reported,
    /// Context released; the caller must stop
    Terminate,
}

/// Apply an event to the context
///
/// Only a failed report write is an error; undeliverable signals are
/// dropped and counted.
pub fn dispatch(ctx: &mut SimulationContext, event: Event) -> Result<Dispatch> {
    match event {
        Event::Signal { target, signal } => {
            let worker = ctx.worker();
            let Some(state) = ctx.state_mut(target) else {
                log::warn!("{}: signal for {} outside the arena dropped", worker, target);
                ctx.stats.dropped_unknown_owner += 1;
                return Ok(Dispatch::Dropped);
            };
            if state.inbox.push(signal) {
                ctx.stats.delivered_local += 1;
                Ok(Dispatch::Queued)
            } else {
                log::warn!(
                    "{}: inbox of {} full ({} signals), signal dropped",
                    worker,
                    target,
                    state.inbox.capacity()
                );
                ctx.stats.dropped_inbox_full += 1;
                Ok(Dispatch::Dropped)
            }
        }
        Event::Report { output } => {
            let counts = MergedCounts::from_context(ctx);
            write_report(&output, &ctx.graph, &counts, ctx.elapsed_ticks)?;
            Ok(Dispatch::Reported)
        }
        Event::Terminate => {
            log::debug!("{}: releasing simulation state", ctx.worker());
            ctx.release();
            Ok(Dispatch::Terminate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::NervePolicy, partition::WorkerId};
    use nsim_graph::{GraphBuilder, NeuronType, SignalType};
    use std::sync::Arc;

    fn context() -> SimulationContext {
        let graph = GraphBuilder::new()
            .add_neuron(1, NeuronType::Sensory)
            .add_nerve(2)
            .build()
            .unwrap();
        SimulationContext::new(Arc::new(graph), 1, WorkerId::new(0), Some(1), NervePolicy::default())
            .unwrap()
    }

    fn signal_event(target: u32) -> Event {
        Event::Signal {
            target: NodeIndex::new(target),
            signal: Signal::new(SignalType::new(4).unwrap(), 12.0),
        }
    }

    #[test]
    fn test_signal_is_queued() {
        let mut ctx = context();
        assert_eq!(dispatch(&mut ctx, signal_event(0)).unwrap(), Dispatch::Queued);
        let inbox = &ctx.state(NodeIndex::new(0)).unwrap().inbox;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox.signals()[0].value, 12.0);
        assert_eq!(ctx.stats().delivered_local, 1);
    }

    #[test]
    fn test_signal_outside_arena_dropped() {
        let mut ctx = context();
        assert_eq!(dispatch(&mut ctx, signal_event(9)).unwrap(), Dispatch::Dropped);
        assert_eq!(ctx.stats().dropped_unknown_owner, 1);
    }

    #[test]
    fn test_report_event_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report");
        let mut ctx = context();
        let outcome = dispatch(&mut ctx, Event::Report { output: output.clone() }).unwrap();
        assert_eq!(outcome, Dispatch::Reported);
        let text = std::fs::read_to_string(output).unwrap();
        assert!(text.starts_with("Simulation ran with 1 neurons, 1 nerves and 0 total edges until 0 ns"));
    }

    #[test]
    fn test_terminate_releases() {
        let mut ctx = context();
        assert_eq!(dispatch(&mut ctx, Event::Terminate).unwrap(), Dispatch::Terminate);
        assert!(ctx.is_released());
        assert_eq!(dispatch(&mut ctx, signal_event(0)).unwrap(), Dispatch::Dropped);
    }
}
