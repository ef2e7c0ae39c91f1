//! Tunable settings for the road network pipeline
//!
//! Settings are plain data loaded from RON. Every field has a default from
//! [`crate::constants`], so a settings file only needs the values it changes.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Result, RoadNetworkError};

/// Order in which `add_node_with_edges` tries the existing nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectOrder {
    /// Whatever order the node map yields (not reproducible)
    Storage,
    /// Ascending node id
    NodeId,
    /// Nearest node first, ties broken by node id
    #[default]
    Distance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Search radius around the origin, in chunks
    pub radius: i32,
    /// Half-size of a planning cell, in chunks
    pub cell_radius: i32,
    /// Structure selectors to search for
    pub selectors: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SCAN_RADIUS,
            cell_radius: DEFAULT_CELL_RADIUS,
            selectors: vec!["#minecraft:village".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub connection_radius: i32,
    pub connect_order: ConnectOrder,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            connection_radius: DEFAULT_CONNECTION_RADIUS,
            connect_order: ConnectOrder::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub step_budget: usize,
    pub max_climb: i32,
    pub climb_cost: f32,
    pub water_cost: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            max_climb: DEFAULT_MAX_CLIMB,
            climb_cost: DEFAULT_CLIMB_COST,
            water_cost: DEFAULT_WATER_COST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub trim_radius: i32,
    pub parallel_angle_deg: f32,
    pub parallel_tolerance: f32,
    pub tail_angle_deg: f32,
    pub tail_distance_factor: f32,
    pub score_cap: f32,
    pub max_iterations: usize,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            trim_radius: DEFAULT_TRIM_RADIUS,
            parallel_angle_deg: DEFAULT_PARALLEL_ANGLE_DEG,
            parallel_tolerance: DEFAULT_PARALLEL_TOLERANCE,
            tail_angle_deg: DEFAULT_TAIL_ANGLE_DEG,
            tail_distance_factor: DEFAULT_TAIL_DISTANCE_FACTOR,
            score_cap: DEFAULT_CONVERGENCE_SCORE_CAP,
            max_iterations: DEFAULT_MAX_MERGE_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSettings {
    pub passes: usize,
    pub median_window: usize,
    pub max_gradient: i32,
    pub spike_delta: i32,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            passes: DEFAULT_SMOOTHING_PASSES,
            median_window: DEFAULT_MEDIAN_WINDOW,
            max_gradient: DEFAULT_MAX_GRADIENT,
            spike_delta: DEFAULT_SPIKE_DELTA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    pub buoy_interval: f32,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            buoy_interval: DEFAULT_BUOY_INTERVAL,
        }
    }
}

/// All pipeline settings
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadNetworkSettings {
    pub scan: ScanSettings,
    pub graph: GraphSettings,
    pub search: SearchSettings,
    pub merge: MergeSettings,
    pub smoothing: SmoothingSettings,
    pub water: WaterSettings,
}

impl RoadNetworkSettings {
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let settings: Self = ron::from_str(source)?;
        settings.validated()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Reject impossible values and normalize the recoverable ones
    pub fn validated(mut self) -> Result<Self> {
        if self.graph.connection_radius <= 0 {
            return Err(RoadNetworkError::Settings(format!(
                "connection_radius must be positive, got {}",
                self.graph.connection_radius
            )));
        }
        if self.scan.cell_radius < 0 || self.scan.radius < 0 {
            return Err(RoadNetworkError::Settings(
                "scan radii must not be negative".to_string(),
            ));
        }
        if self.water.buoy_interval <= 0.0 {
            return Err(RoadNetworkError::Settings(format!(
                "buoy_interval must be positive, got {}",
                self.water.buoy_interval
            )));
        }
        if self.smoothing.max_gradient < 0 {
            return Err(RoadNetworkError::Settings(
                "max_gradient must not be negative".to_string(),
            ));
        }
        if self.smoothing.median_window == 0 {
            self.smoothing.median_window = 1;
        }
        if self.smoothing.median_window % 2 == 0 {
            warn!(
                "median_window {} is even, using {}",
                self.smoothing.median_window,
                self.smoothing.median_window + 1
            );
            self.smoothing.median_window += 1;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let settings = RoadNetworkSettings::from_ron_str("()").unwrap();
        assert_eq!(settings, RoadNetworkSettings::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = RoadNetworkSettings::from_ron_str(
            "(graph: (connection_radius: 15), water: (buoy_interval: 8.0))",
        )
        .unwrap();

        assert_eq!(settings.graph.connection_radius, 15);
        assert_eq!(settings.graph.connect_order, ConnectOrder::Distance);
        assert_eq!(settings.water.buoy_interval, 8.0);
        assert_eq!(settings.merge, MergeSettings::default());
    }

    #[test]
    fn even_median_window_is_widened() {
        let settings =
            RoadNetworkSettings::from_ron_str("(smoothing: (median_window: 4))").unwrap();
        assert_eq!(settings.smoothing.median_window, 5);
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let err = RoadNetworkSettings::from_ron_str("(graph: (connection_radius: 0))").unwrap_err();
        assert!(matches!(err, RoadNetworkError::Settings(_)));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = RoadNetworkSettings::from_ron_str("(graph: [").unwrap_err();
        assert!(matches!(err, RoadNetworkError::Deserialize(_)));
    }
}
