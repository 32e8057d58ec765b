//! Nodes, edges and signals

use core::fmt;
use core::str::FromStr;

use crate::{
    error::{GraphError, Result},
    ids::{EdgeIndex, NodeId},
    NUM_SIGNAL_TYPES,
};

/// Signal-type tag, always in `[0, NUM_SIGNAL_TYPES)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalType(u8);

impl SignalType {
    /// Create a signal type, rejecting out-of-range values
    pub fn new(raw: i64) -> Option<Self> {
        if (0..NUM_SIGNAL_TYPES as i64).contains(&raw) {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    /// Signal type for an arbitrary index, reduced modulo `NUM_SIGNAL_TYPES`
    pub const fn wrapping(raw: usize) -> Self {
        Self((raw % NUM_SIGNAL_TYPES) as u8)
    }

    /// Index into per-type tables
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Iterate over every signal type in ascending order
    pub fn all() -> impl Iterator<Item = SignalType> {
        (0..NUM_SIGNAL_TYPES as u8).map(SignalType)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed, scalar-magnitude unit of stimulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    /// Signal type
    pub signal_type: SignalType,
    /// Magnitude
    pub value: f32,
}

impl Signal {
    /// Create a new signal
    pub fn new(signal_type: SignalType, value: f32) -> Self {
        Self { signal_type, value }
    }
}

/// Neuron subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NeuronType {
    /// Sensory neuron
    #[default]
    Sensory,
    /// Motor neuron
    Motor,
    /// Unipolar neuron
    Unipolar,
    /// Pseudounipolar neuron
    Pseudounipolar,
    /// Bipolar neuron
    Bipolar,
    /// Multipolar neuron
    Multipolar,
}

impl NeuronType {
    /// All subtypes, in table order
    pub const ALL: [NeuronType; 6] = [
        NeuronType::Sensory,
        NeuronType::Motor,
        NeuronType::Unipolar,
        NeuronType::Pseudounipolar,
        NeuronType::Bipolar,
        NeuronType::Multipolar,
    ];

    /// Multiplier applied to every signal a neuron of this subtype handles
    pub const fn signal_weight(&self) -> f32 {
        match self {
            NeuronType::Sensory => 0.8,
            NeuronType::Motor => 1.2,
            NeuronType::Unipolar => 1.1,
            NeuronType::Pseudounipolar => 2.6,
            NeuronType::Bipolar => 0.3,
            NeuronType::Multipolar => 1.8,
        }
    }

    /// Token used in graph definitions
    pub const fn name(&self) -> &'static str {
        match self {
            NeuronType::Sensory => "sensory",
            NeuronType::Motor => "motor",
            NeuronType::Unipolar => "unipolar",
            NeuronType::Pseudounipolar => "pseudounipolar",
            NeuronType::Bipolar => "bipolar",
            NeuronType::Multipolar => "multipolar",
        }
    }
}

impl FromStr for NeuronType {
    type Err = GraphError;

    /// Prefix match, so trailing markup after the token is tolerated
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim_start();
        NeuronType::ALL
            .iter()
            .copied()
            .find(|t| s.starts_with(t.name()))
            .ok_or_else(|| GraphError::unknown_neuron_type(s.trim()))
    }
}

impl fmt::Display for NeuronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Neuron with its subtype
    Neuron(NeuronType),
    /// Nerve (spontaneously excited input node)
    Nerve,
}

impl NodeKind {
    /// True for nerves
    pub const fn is_nerve(&self) -> bool {
        matches!(self, NodeKind::Nerve)
    }

    /// True for neurons
    pub const fn is_neuron(&self) -> bool {
        matches!(self, NodeKind::Neuron(_))
    }
}

/// Edge directionality
///
/// Parsed and carried, but fan-out traverses edges from either endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Traversable both ways
    #[default]
    Bidirectional,
    /// Declared one-way
    Unidirectional,
}

/// Spatial coordinates (informational only)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Z coordinate
    pub z: f32,
}

impl Position {
    /// Create a new position
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Static description of a neuron or nerve
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable identifier
    pub id: NodeId,
    /// Neuron (with subtype) or nerve
    pub kind: NodeKind,
    /// Spatial coordinates
    pub position: Position,
    /// Incident edges, filled in when the graph is frozen
    pub edges: Vec<EdgeIndex>,
}

impl Node {
    /// Create a neuron
    pub fn neuron(id: NodeId, neuron_type: NeuronType, position: Position) -> Self {
        Self {
            id,
            kind: NodeKind::Neuron(neuron_type),
            position,
            edges: Vec::new(),
        }
    }

    /// Create a nerve
    pub fn nerve(id: NodeId, position: Position) -> Self {
        Self {
            id,
            kind: NodeKind::Nerve,
            position,
            edges: Vec::new(),
        }
    }

    /// True for nerves
    pub fn is_nerve(&self) -> bool {
        self.kind.is_nerve()
    }

    /// Number of incident edges
    pub fn degree(&self) -> usize {
        self.edges.len()
    }
}

/// Weighted channel between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// First endpoint
    pub from: NodeId,
    /// Second endpoint
    pub to: NodeId,
    /// Declared direction
    pub direction: Direction,
    /// Largest magnitude a single traversal may carry
    pub max_value: f32,
    /// Per-signal-type multiplier
    pub weighting: [f32; NUM_SIGNAL_TYPES],
}

impl Edge {
    /// Create an edge with all weightings set to `weight`
    pub fn uniform(from: NodeId, to: NodeId, max_value: f32, weight: f32) -> Self {
        Self {
            from,
            to,
            direction: Direction::Bidirectional,
            max_value,
            weighting: [weight; NUM_SIGNAL_TYPES],
        }
    }

    /// Set the declared direction
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// The endpoint that is not `id`
    pub fn far_endpoint(&self, id: NodeId) -> NodeId {
        if self.from == id {
            self.to
        } else {
            self.from
        }
    }

    /// True if `id` is one of the endpoints
    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }

    /// Weight for a signal type
    pub fn weight(&self, signal_type: SignalType) -> f32 {
        self.weighting[signal_type.index()]
    }
}

impl Default for Edge {
    fn default() -> Self {
        Self {
            from: NodeId::new(0),
            to: NodeId::new(0),
            direction: Direction::Bidirectional,
            max_value: 0.0,
            weighting: [0.0; NUM_SIGNAL_TYPES],
        }
    }
}
