//! Time-stepped scheduler
//!
//! Each worker runs the same state machine:
//! `Bootstrapping -> Running -> Draining -> Aggregating -> Terminated`.
//! During `Running` every iteration drains the transport, updates the
//! nerves (every nerve under [`NervePolicy::AllWorkers`]) and then the
//! owned neurons, drains again and meets the other workers at a barrier. Only the
//! coordinator samples the clock; its decision to advance the tick is
//! carried by that barrier, so all workers count ticks identically.

use core::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use nsim_graph::{BrainGraph, NodeId, Signal};

use crate::{
    context::{NervePolicy, SimulationContext},
    error::{Result, RuntimeError},
    event::{dispatch, Dispatch, Event},
    partition::{Resolution, WorkerId},
    report::{merge_tallies, MergedCounts, WorkerTally},
    router::drain,
    stats::WorkerStats,
    transport::{ChannelMesh, Transport},
    update::update_pass,
    TICK_LENGTH_SECS,
};

/// Default pause between the final drains
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(50);

/// Where the coordinator's notion of time comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockSource {
    /// Whole seconds of wall-clock time
    #[default]
    Wall,
    /// One simulated second every `samples_per_second` samples
    Stepped {
        /// Samples per simulated second
        samples_per_second: u64,
    },
}

/// External signal injected when the run starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stimulus {
    /// Receiving node
    pub target: NodeId,
    /// Payload
    pub signal: Signal,
}

impl Stimulus {
    /// Create a stimulus
    pub fn new(target: NodeId, signal: Signal) -> Self {
        Self { target, signal }
    }
}

/// Scheduler parameters
#[derive(Debug, Clone)]
pub struct SimulationParams {
    /// Number of ticks to run; zero skips straight to the report
    pub tick_bound: u64,
    /// Seconds per tick
    pub tick_length_secs: u64,
    /// Which workers update each nerve
    pub nerve_policy: NervePolicy,
    /// Base RNG seed (None = entropy)
    pub seed: Option<u64>,
    /// Pause between the two end-of-run drains
    pub quiescence: Duration,
    /// Clock driving tick boundaries
    pub clock: ClockSource,
    /// Signals injected on entering `Running`
    pub stimuli: Vec<Stimulus>,
    /// Where the coordinator writes the report (None = no file)
    pub report_path: Option<PathBuf>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            tick_bound: 1,
            tick_length_secs: TICK_LENGTH_SECS,
            nerve_policy: NervePolicy::default(),
            seed: None,
            quiescence: DEFAULT_QUIESCENCE,
            clock: ClockSource::Wall,
            stimuli: Vec::new(),
            report_path: None,
        }
    }
}

impl SimulationParams {
    /// Parameters for a run of `tick_bound` ticks
    pub fn new(tick_bound: u64) -> Result<Self> {
        let params = Self {
            tick_bound,
            ..Default::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Set the tick length in seconds
    pub fn with_tick_length(mut self, secs: u64) -> Self {
        self.tick_length_secs = secs;
        self
    }

    /// Set the nerve update policy
    pub fn with_nerve_policy(mut self, policy: NervePolicy) -> Self {
        self.nerve_policy = policy;
        self
    }

    /// Seed the per-worker RNGs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the end-of-run pause
    pub fn with_quiescence(mut self, pause: Duration) -> Self {
        self.quiescence = pause;
        self
    }

    /// Set the clock source
    pub fn with_clock(mut self, clock: ClockSource) -> Self {
        self.clock = clock;
        self
    }

    /// Add an injected signal
    pub fn with_stimulus(mut self, stimulus: Stimulus) -> Self {
        self.stimuli.push(stimulus);
        self
    }

    /// Write the report to `path`
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.tick_length_secs == 0 {
            return Err(RuntimeError::invalid_parameter(
                "tick_length_secs",
                self.tick_length_secs.to_string(),
                ">= 1",
            ));
        }
        if let ClockSource::Stepped { samples_per_second: 0 } = self.clock {
            return Err(RuntimeError::invalid_parameter(
                "samples_per_second",
                "0",
                ">= 1",
            ));
        }
        Ok(())
    }
}

/// Lifecycle phase of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Receiving the graph and building state
    Bootstrapping,
    /// Iterating
    Running,
    /// Flushing in-flight signals
    Draining,
    /// Collecting counters at the coordinator
    Aggregating,
    /// Done; state released
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Bootstrapping => "bootstrapping",
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Aggregating => "aggregating",
            Phase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Iterations per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateStats {
    /// Iterations over the whole run
    pub total_iterations: u64,
    /// Most iterations observed in one tick
    pub max_per_tick: u64,
    /// Fewest iterations observed in one tick
    pub min_per_tick: u64,
}

impl RateStats {
    /// Record the iterations of the tick that just ended
    ///
    /// The first call seeds both extremes.
    pub fn record_tick(&mut self, first: bool, iterations: u64) {
        if first {
            self.max_per_tick = iterations;
            self.min_per_tick = iterations;
        } else {
            self.max_per_tick = self.max_per_tick.max(iterations);
            self.min_per_tick = self.min_per_tick.min(iterations);
        }
    }
}

/// Coordinator's view of a finished run
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    /// Ticks completed
    pub ticks: u64,
    /// Iteration counts
    pub rate: RateStats,
    /// Cluster-wide counters
    pub counts: MergedCounts,
    /// Summed worker counters
    pub stats: WorkerStats,
    /// Time from bootstrap to the end of aggregation
    pub wall_time: Duration,
    /// Report file, if one was written
    pub report_path: Option<PathBuf>,
}

/// What a worker returns from [`Worker::run`]
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    /// The worker
    pub worker: WorkerId,
    /// Its own counters
    pub stats: WorkerStats,
    /// Its iteration counts
    pub rate: RateStats,
    /// Present on the coordinator only
    pub summary: Option<SimulationSummary>,
}

struct TickClock {
    source: ClockSource,
    tick_length: u64,
    start: u64,
    last: Option<u64>,
    samples: u64,
}

impl TickClock {
    fn new(source: ClockSource, tick_length: u64) -> Self {
        let start = match source {
            ClockSource::Wall => wall_seconds(),
            ClockSource::Stepped { .. } => 0,
        };
        Self {
            source,
            tick_length,
            start,
            last: None,
            samples: 0,
        }
    }

    fn now(&mut self) -> u64 {
        match self.source {
            ClockSource::Wall => wall_seconds(),
            ClockSource::Stepped { samples_per_second } => {
                let secs = self.samples / samples_per_second.max(1);
                self.samples += 1;
                secs
            }
        }
    }

    /// True when a new second lands on a tick boundary
    fn sample(&mut self) -> bool {
        let now = self.now();
        if self.last == Some(now) {
            return false;
        }
        self.last = Some(now);
        now.saturating_sub(self.start) % self.tick_length == 0
    }
}

fn wall_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One worker of a simulation run
pub struct Worker<T: Transport> {
    transport: T,
    params: SimulationParams,
    phase: Phase,
}

impl<T: Transport> Worker<T> {
    /// Create a worker over `transport`
    pub fn new(transport: T, params: SimulationParams) -> Self {
        Self {
            transport,
            params,
            phase: Phase::Bootstrapping,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        log::info!("{}: {} -> {}", self.transport.worker(), self.phase, phase);
        self.phase = phase;
    }

    /// Run to completion
    ///
    /// The coordinator passes the loaded graph; every other worker
    /// passes `None` and receives it from the coordinator.
    pub fn run(mut self, graph: Option<Arc<BrainGraph>>) -> Result<WorkerOutcome> {
        let me = self.transport.worker();
        let started = Instant::now();
        self.params.validate()?;

        // Bootstrapping
        let graph = self.transport.broadcast_graph(graph)?;
        if graph.node_count() == 0 {
            return Err(nsim_graph::GraphError::EmptyGraph.into());
        }
        let mut ctx = SimulationContext::new(
            Arc::clone(&graph),
            self.transport.worker_count(),
            me,
            self.params.seed,
            self.params.nerve_policy,
        )?;
        let local = ctx.resolver().local_range();
        log::info!(
            "{}: owns nodes {}..{} ({} of {})",
            me,
            local.start,
            local.end,
            local.len(),
            graph.node_count()
        );

        let mut clock = me
            .is_coordinator()
            .then(|| TickClock::new(self.params.clock, self.params.tick_length_secs));
        let vote = clock.as_mut().map_or(false, TickClock::sample);
        let mut advance = self.transport.barrier_sync(vote)?;

        // Running
        self.enter(Phase::Running);
        self.inject_stimuli(&mut ctx)?;

        let mut rate = RateStats::default();
        let mut this_tick = 0u64;
        let mut first_tick = true;
        while ctx.elapsed_ticks() < self.params.tick_bound {
            if advance {
                rate.record_tick(first_tick, this_tick);
                first_tick = false;
                this_tick = 0;
                ctx.advance_tick();
                log::debug!("{}: tick {} began", me, ctx.elapsed_ticks());
            }

            drain(&mut ctx, &mut self.transport)?;
            update_pass(&mut ctx, &mut self.transport)?;
            drain(&mut ctx, &mut self.transport)?;

            this_tick += 1;
            rate.total_iterations += 1;

            let vote = clock.as_mut().map_or(false, TickClock::sample);
            advance = self.transport.barrier_sync(vote)?;
        }

        // Draining
        self.enter(Phase::Draining);
        self.transport.barrier()?;
        drain(&mut ctx, &mut self.transport)?;
        thread::sleep(self.params.quiescence);
        self.transport.barrier()?;

        // Aggregating
        self.enter(Phase::Aggregating);
        let stats = ctx.stats;
        let gathered = self
            .transport
            .gather_tallies(WorkerTally::from_context(&ctx))?;
        let summary = match gathered {
            Some(tallies) => {
                let counts = merge_tallies(graph.node_count(), &tallies)?;
                ctx.absorb(&counts);
                if let Some(output) = self.params.report_path.clone() {
                    dispatch(&mut ctx, Event::Report { output })?;
                }
                log::info!(
                    "Simulation finished after {} ticks, {} iterations; {}",
                    ctx.elapsed_ticks(),
                    rate.total_iterations,
                    counts.stats
                );
                Some(SimulationSummary {
                    ticks: ctx.elapsed_ticks(),
                    rate,
                    stats: counts.stats,
                    counts,
                    wall_time: started.elapsed(),
                    report_path: self.params.report_path.clone(),
                })
            }
            None => None,
        };
        self.transport.barrier()?;

        // Terminated
        if dispatch(&mut ctx, Event::Terminate)? == Dispatch::Terminate {
            self.enter(Phase::Terminated);
        }

        Ok(WorkerOutcome {
            worker: me,
            stats,
            rate,
            summary,
        })
    }

    fn inject_stimuli(&mut self, ctx: &mut SimulationContext) -> Result<()> {
        for stimulus in &self.params.stimuli {
            match ctx.resolver().resolve(stimulus.target) {
                Resolution::Local(target) => {
                    dispatch(
                        ctx,
                        Event::Signal {
                            target,
                            signal: stimulus.signal,
                        },
                    )?;
                }
                Resolution::Remote(_) => {}
                Resolution::Unknown => {
                    if ctx.worker().is_coordinator() {
                        log::warn!("Stimulus for unknown node {} ignored", stimulus.target);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Run a simulation on `workers` threads and return the coordinator's summary
pub fn run_cluster(
    graph: BrainGraph,
    params: SimulationParams,
    workers: usize,
) -> Result<SimulationSummary> {
    params.validate()?;
    let graph = Arc::new(graph);
    let mesh = ChannelMesh::new(workers)?;

    let mut handles = Vec::with_capacity(workers);
    for transport in mesh {
        let id = transport.worker();
        let mine = id.is_coordinator().then(|| Arc::clone(&graph));
        let worker = Worker::new(transport, params.clone());
        let handle = thread::Builder::new()
            .name(format!("nsim-worker-{}", id.raw()))
            .spawn(move || worker.run(mine))?;
        handles.push((id, handle));
    }

    let mut summary = None;
    let mut failure = None;
    for (id, handle) in handles {
        match handle.join() {
            Ok(Ok(outcome)) => {
                log::debug!("{} finished: {}", id, outcome.stats);
                if outcome.summary.is_some() {
                    summary = outcome.summary;
                }
            }
            Ok(Err(e)) => {
                log::error!("{} failed: {}", id, e);
                failure.get_or_insert(e);
            }
            Err(_) => {
                log::error!("{} panicked", id);
                failure.get_or_insert(RuntimeError::WorkerPanicked { worker: id.raw() });
            }
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    summary.ok_or_else(|| RuntimeError::invalid_config("coordinator produced no summary"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_validation() {
        assert_eq!(SimulationParams::new(0).unwrap().tick_bound, 0);
        let params = SimulationParams::new(3).unwrap();
        assert_eq!(params.tick_length_secs, TICK_LENGTH_SECS);
        assert_eq!(params.quiescence, DEFAULT_QUIESCENCE);
        assert!(params.clone().with_tick_length(0).validate().is_err());
        assert!(params
            .with_clock(ClockSource::Stepped { samples_per_second: 0 })
            .validate()
            .is_err());
    }

    #[test]
    fn test_rate_stats() {
        let mut rate = RateStats::default();
        rate.record_tick(true, 0);
        rate.record_tick(false, 12);
        rate.record_tick(false, 7);
        assert_eq!(rate.max_per_tick, 12);
        assert_eq!(rate.min_per_tick, 0);
    }

    #[test]
    fn test_stepped_clock() {
        let mut clock = TickClock::new(ClockSource::Stepped { samples_per_second: 2 }, 2);
        // seconds: 0 0 1 1 2 2 3 3 4
        let votes: Vec<bool> = (0..9).map(|_| clock.sample()).collect();
        assert_eq!(
            votes,
            vec![true, false, false, false, true, false, false, false, true]
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Aggregating.to_string(), "aggregating");
    }
}
