//! Roadnet - road network synthesis for procedurally generated worlds
//!
//! Structures found by the spatial index become nodes of a planar graph,
//! every new edge gets a terrain-following route, and routes that run side by
//! side are merged into shared trunks before being queued for building.
//!
//! The algorithms are plain library code; [`RoadNetworkPlugins`] wires them
//! into a Bevy app.

use bevy::app::PluginGroup;

use crate::plugin::RoadNetworkPlugin;
use crate::save::NetworkSavePlugin;

pub mod build_queue;
pub mod computer;
pub mod constants;
pub mod error;
pub mod graph;
pub mod keys;
pub mod listeners;
pub mod messages;
pub mod network;
pub mod pathfinding;
pub mod plugin;
pub mod postprocess;
pub mod save;
pub mod settings;
pub mod snapshot;
pub mod spatial;
pub mod store;
pub mod tasks;
pub mod terrain;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use error::{Result, RoadNetworkError};
pub use network::RoadNetwork;

/// Plugin group for the whole pipeline (headless-compatible)
/// Add [`plugin::WorldOracles`] once the world is available
#[derive(Default)]
pub struct RoadNetworkPlugins {
    pub network: RoadNetworkPlugin,
}

impl PluginGroup for RoadNetworkPlugins {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(self.network)
            .add(NetworkSavePlugin)
    }
}
