//! Message passing between workers
//!
//! Workers share no mutable state. Everything that crosses a worker
//! boundary goes through a [`Transport`]: point-to-point signal frames,
//! and the collectives used by the scheduler (graph broadcast, barrier,
//! final gather).
//!
//! [`ChannelMesh`] connects workers running on threads of one process.
//! Signal frames and control messages use separate channels, so draining
//! signals never consumes control traffic and vice versa.

use std::sync::{Arc, Barrier};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use nsim_graph::BrainGraph;

use crate::{
    error::{Result, RuntimeError},
    partition::WorkerId,
    report::WorkerTally,
    wire::{WireSignal, FRAME_LEN},
};

/// Worker-side view of the interconnect
pub trait Transport {
    /// This worker
    fn worker(&self) -> WorkerId;

    /// Number of workers in the run
    fn worker_count(&self) -> usize;

    /// Send a signal record to `dest`
    ///
    /// May block until the transport accepts the frame, never waits for delivery.
    fn send_signal(&mut self, dest: WorkerId, signal: WireSignal) -> Result<()>;

    /// Take one pending signal record, `None` if nothing has arrived
    fn try_recv_signal(&mut self) -> Result<Option<WireSignal>>;

    /// Barrier that also distributes the coordinator's tick decision
    ///
    /// Every worker passes its own vote; all of them return the
    /// coordinator's.
    fn barrier_sync(&mut self, advance_tick: bool) -> Result<bool>;

    /// Plain barrier
    fn barrier(&mut self) -> Result<()> {
        self.barrier_sync(false).map(|_| ())
    }

    /// Coordinator passes `Some(graph)`, everyone receives the shared copy
    fn broadcast_graph(&mut self, graph: Option<Arc<BrainGraph>>) -> Result<Arc<BrainGraph>>;

    /// Send this worker's tally to the coordinator
    ///
    /// The coordinator gets every tally back in worker order; the others get `None`.
    fn gather_tallies(&mut self, tally: WorkerTally) -> Result<Option<Vec<WorkerTally>>>;
}

enum Control {
    Graph(Arc<BrainGraph>),
    Tick(bool),
    Tally(Box<WorkerTally>),
}

impl Control {
    fn name(&self) -> &'static str {
        match self {
            Control::Graph(_) => "graph",
            Control::Tick(_) => "tick",
            Control::Tally(_) => "tally",
        }
    }
}

/// Builds a fully connected set of in-process transports
pub struct ChannelMesh;

impl ChannelMesh {
    /// One transport per worker, index `i` belongs to worker `i`
    pub fn new(worker_count: usize) -> Result<Vec<ChannelTransport>> {
        if worker_count == 0 {
            return Err(RuntimeError::invalid_parameter(
                "worker_count",
                worker_count.to_string(),
                ">= 1",
            ));
        }

        let (signal_txs, signal_rxs): (Vec<_>, Vec<_>) =
            (0..worker_count).map(|_| channel::unbounded()).unzip();
        let (control_txs, control_rxs): (Vec<_>, Vec<_>) =
            (0..worker_count).map(|_| channel::unbounded()).unzip();
        let barrier = Arc::new(Barrier::new(worker_count));

        Ok(signal_rxs
            .into_iter()
            .zip(control_rxs)
            .enumerate()
            .map(|(i, (signal_rx, control_rx))| ChannelTransport {
                me: WorkerId::new(i),
                signal_txs: signal_txs.clone(),
                signal_rx,
                control_txs: control_txs.clone(),
                control_rx,
                barrier: Arc::clone(&barrier),
            })
            .collect())
    }
}

/// Channel-backed transport endpoint for one worker
pub struct ChannelTransport {
    me: WorkerId,
    signal_txs: Vec<Sender<[u8; FRAME_LEN]>>,
    signal_rx: Receiver<[u8; FRAME_LEN]>,
    control_txs: Vec<Sender<Control>>,
    control_rx: Receiver<Control>,
    barrier: Arc<Barrier>,
}

impl ChannelTransport {
    fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        let me = self.me.raw();
        (0..self.control_txs.len()).filter(move |&w| w != me)
    }

    fn send_control(&self, dest: usize, msg: Control) -> Result<()> {
        self.control_txs[dest]
            .send(msg)
            .map_err(|e| RuntimeError::transport(self.me.raw(), format!("worker {} unreachable: {}", dest, e.0.name())))
    }

    fn recv_control(&self) -> Result<Control> {
        self.control_rx
            .recv()
            .map_err(|_| RuntimeError::transport(self.me.raw(), "control channel closed"))
    }

    fn unexpected(&self, wanted: &str, got: &Control) -> RuntimeError {
        RuntimeError::transport(
            self.me.raw(),
            format!("expected {} message, received {}", wanted, got.name()),
        )
    }
}

impl Transport for ChannelTransport {
    fn worker(&self) -> WorkerId {
        self.me
    }

    fn worker_count(&self) -> usize {
        self.signal_txs.len()
    }

    fn send_signal(&mut self, dest: WorkerId, signal: WireSignal) -> Result<()> {
        let tx = self.signal_txs.get(dest.raw()).ok_or_else(|| {
            RuntimeError::transport(self.me.raw(), format!("no such worker {}", dest))
        })?;
        tx.send(signal.encode())
            .map_err(|_| RuntimeError::transport(self.me.raw(), format!("{} hung up", dest)))
    }

    fn try_recv_signal(&mut self) -> Result<Option<WireSignal>> {
        match self.signal_rx.try_recv() {
            Ok(frame) => WireSignal::decode(&frame)
                .map(Some)
                .map_err(|e| RuntimeError::transport(self.me.raw(), e.to_string())),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(RuntimeError::transport(
                self.me.raw(),
                "signal channel closed",
            )),
        }
    }

    fn barrier_sync(&mut self, advance_tick: bool) -> Result<bool> {
        if self.me.is_coordinator() {
            // Queued before the wait, so every peer finds it once released
            for peer in self.peers() {
                self.send_control(peer, Control::Tick(advance_tick))?;
            }
            self.barrier.wait();
            Ok(advance_tick)
        } else {
            self.barrier.wait();
            match self.recv_control()? {
                Control::Tick(agreed) => Ok(agreed),
                other => Err(self.unexpected("tick", &other)),
            }
        }
    }

    fn broadcast_graph(&mut self, graph: Option<Arc<BrainGraph>>) -> Result<Arc<BrainGraph>> {
        if self.me.is_coordinator() {
            let graph = graph.ok_or_else(|| {
                RuntimeError::invalid_config("coordinator has no graph to broadcast")
            })?;
            for peer in self.peers() {
                self.send_control(peer, Control::Graph(Arc::clone(&graph)))?;
            }
            Ok(graph)
        } else {
            match self.recv_control()? {
                Control::Graph(graph) => Ok(graph),
                other => Err(self.unexpected("graph", &other)),
            }
        }
    }

    fn gather_tallies(&mut self, tally: WorkerTally) -> Result<Option<Vec<WorkerTally>>> {
        if !self.me.is_coordinator() {
            self.send_control(0, Control::Tally(Box::new(tally)))?;
            return Ok(None);
        }

        let mut tallies = Vec::with_capacity(self.worker_count());
        tallies.push(tally);
        while tallies.len() < self.worker_count() {
            match self.recv_control()? {
                Control::Tally(t) => tallies.push(*t),
                other => return Err(self.unexpected("tally", &other)),
            }
        }
        tallies.sort_by_key(|t| t.worker);
        Ok(Some(tallies))
    }
}
