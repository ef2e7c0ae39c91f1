//! Canonical identifiers for nodes, edges and paths
//!
//! Every pair lookup goes through [`EdgeKey::new`], which orders the two ids,
//! so `(a, b)` and `(b, a)` always resolve to the same entry.

use std::fmt;
use std::str::FromStr;

use bevy::math::IVec3;
use serde::{Deserialize, Serialize};

use crate::error::RoadNetworkError;

/// Identifier of a graph node, allocated sequentially by the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order-independent key of an unordered node pair, rendered as `low+high`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    low: NodeId,
    high: NodeId,
}

impl EdgeKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> NodeId {
        self.low
    }

    pub fn high(&self) -> NodeId {
        self.high
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.low == node || self.high == node
    }

    /// Whether the two edges have an endpoint in common
    pub fn shares_endpoint(&self, other: &EdgeKey) -> bool {
        other.contains(self.low) || other.contains(self.high)
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.low, self.high)
    }
}

impl FromStr for EdgeKey {
    type Err = RoadNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RoadNetworkError::MalformedKey(s.to_string());
        let (a, b) = s.split_once('+').ok_or_else(malformed)?;
        let a = a.parse::<u64>().map_err(|_| malformed())?;
        let b = b.parse::<u64>().map_err(|_| malformed())?;
        Ok(EdgeKey::new(NodeId(a), NodeId(b)))
    }
}

/// Key of a path document.
///
/// Edge paths use the edge key. A trunk produced by merging is keyed by the
/// key of the path it continues plus the junction it starts at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey {
    edge: EdgeKey,
    junction: Option<IVec3>,
}

impl PathKey {
    pub fn for_edge(edge: EdgeKey) -> Self {
        Self {
            edge,
            junction: None,
        }
    }

    /// Key of the trunk that continues `self` from `junction`
    pub fn trunk(&self, junction: IVec3) -> Self {
        Self {
            edge: self.edge,
            junction: Some(junction),
        }
    }

    pub fn edge(&self) -> EdgeKey {
        self.edge
    }

    pub fn junction(&self) -> Option<IVec3> {
        self.junction
    }

    pub fn is_trunk(&self) -> bool {
        self.junction.is_some()
    }
}

impl From<EdgeKey> for PathKey {
    fn from(edge: EdgeKey) -> Self {
        PathKey::for_edge(edge)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.junction {
            Some(j) => write!(f, "{}@{},{},{}", self.edge, j.x, j.y, j.z),
            None => write!(f, "{}", self.edge),
        }
    }
}

impl FromStr for PathKey {
    type Err = RoadNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((edge, junction)) = s.split_once('@') else {
            return Ok(PathKey::for_edge(s.parse()?));
        };

        let malformed = || RoadNetworkError::MalformedKey(s.to_string());
        let coords = junction
            .split(',')
            .map(|c| c.parse::<i32>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;
        let [x, y, z] = coords[..] else {
            return Err(malformed());
        };

        let edge: EdgeKey = edge.parse().map_err(|_| malformed())?;
        Ok(PathKey::for_edge(edge).trunk(IVec3::new(x, y, z)))
    }
}

// Keys travel through snapshots as their canonical strings.
macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(EdgeKey);
string_serde!(PathKey);
