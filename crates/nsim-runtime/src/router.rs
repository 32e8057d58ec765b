//! Signal routing between local inboxes and the transport

use nsim_graph::{NodeId, Signal};

use crate::{
    context::SimulationContext,
    error::Result,
    event::{dispatch, Dispatch, Event},
    partition::{Resolution, WorkerId},
    transport::Transport,
    wire::WireSignal,
};

/// Where a routed signal went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Dispatched locally with this outcome
    Local(Dispatch),
    /// Handed to the transport for this worker
    Remote(WorkerId),
    /// No worker owns the target; dropped
    Unknown,
}

/// Deliver `signal` to `target`, locally or through the transport
pub fn route<T: Transport>(
    ctx: &mut SimulationContext,
    transport: &mut T,
    target: NodeId,
    signal: Signal,
) -> Result<Delivery> {
    match ctx.resolver.resolve(target) {
        Resolution::Local(index) => {
            let outcome = dispatch(ctx, Event::Signal { target: index, signal })?;
            Ok(Delivery::Local(outcome))
        }
        Resolution::Remote(owner) => {
            transport.send_signal(owner, WireSignal::new(target, signal))?;
            ctx.stats.sent_remote += 1;
            Ok(Delivery::Remote(owner))
        }
        Resolution::Unknown => {
            log::warn!(
                "{}: no owner for node {}, signal dropped",
                ctx.worker(),
                target
            );
            ctx.stats.dropped_unknown_owner += 1;
            Ok(Delivery::Unknown)
        }
    }
}

/// Move every pending transport record into local inboxes
///
/// Returns the number of records taken off the transport. Records that
/// fail validation or name a node this worker does not own are dropped.
pub fn drain<T: Transport>(ctx: &mut SimulationContext, transport: &mut T) -> Result<usize> {
    let mut taken = 0;
    while let Some(record) = transport.try_recv_signal()? {
        taken += 1;
        ctx.stats.received_remote += 1;

        let Some((target, signal)) = record.unpack() else {
            log::warn!("{}: malformed signal record {:?} dropped", ctx.worker(), record);
            ctx.stats.rejected_records += 1;
            continue;
        };

        match ctx.resolver.resolve(target) {
            Resolution::Local(index) => {
                dispatch(ctx, Event::Signal { target: index, signal })?;
            }
            _ => {
                log::warn!(
                    "{}: received signal for {} which is not owned here, dropped",
                    ctx.worker(),
                    target
                );
                ctx.stats.rejected_records += 1;
            }
        }
    }
    Ok(taken)
}
