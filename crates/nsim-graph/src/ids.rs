//! ID types for the graph model

use core::fmt;

use crate::MAX_NODE_ID;

/// Stable, user-assigned identifier of a neuron or nerve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new node ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Check whether the ID fits in the id-to-index table
    pub const fn is_valid(&self) -> bool {
        (self.0 as usize) < MAX_NODE_ID
    }

    /// Convert a wire-level integer into a node ID, rejecting negatives
    pub fn from_wire(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Position of a node in global load order
///
/// This is the index into the node arena and the coordinate the
/// partitioner distributes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new node index
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Index as usize for slice access
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of an edge in global load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeIndex(pub u32);

impl EdgeIndex {
    /// Create a new edge index
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Index as usize for slice access
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::{Deserialize, Serialize};

    impl Serialize for NodeId {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            self.0.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for NodeId {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let id = u32::deserialize(deserializer)?;
            Ok(NodeId::new(id))
        }
    }

    impl Serialize for NodeIndex {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            self.0.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for NodeIndex {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let index = u32::deserialize(deserializer)?;
            Ok(NodeIndex::new(index))
        }
    }
}
