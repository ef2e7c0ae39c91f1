use std::path::PathBuf;

use bevy::prelude::*;

use crate::network::{LoadReport, RoadNetwork};

/// Plugin that writes the road network to disk and reads it back.
pub struct NetworkSavePlugin;

/// Default save settings (currently only the fallback save path).
#[derive(Resource, Clone)]
pub struct SaveSettings {
    /// Default filesystem path used when requests do not provide one.
    pub default_path: PathBuf,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            default_path: PathBuf::from("saves/roads.ron"),
        }
    }
}

/// Request to write the current road network to disk.
#[derive(Message, Debug, Clone, Default)]
pub struct SaveNetworkRequest {
    pub path: Option<PathBuf>,
}

/// Request to replace the road network with a saved one.
#[derive(Message, Debug, Clone, Default)]
pub struct LoadNetworkRequest {
    pub path: Option<PathBuf>,
}

/// Notification emitted after a successful save.
#[derive(Message, Debug, Clone)]
pub struct NetworkSaved {
    pub path: PathBuf,
}

/// Notification emitted after a successful load.
#[derive(Message, Debug, Clone)]
pub struct NetworkLoaded {
    pub path: PathBuf,
    pub report: LoadReport,
}

#[derive(Resource, Default)]
struct PendingSave {
    path: Option<PathBuf>,
}

#[derive(Resource, Default)]
struct PendingLoad {
    path: Option<PathBuf>,
}

impl Plugin for NetworkSavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SaveSettings>()
            .init_resource::<PendingSave>()
            .init_resource::<PendingLoad>()
            .add_message::<SaveNetworkRequest>()
            .add_message::<LoadNetworkRequest>()
            .add_message::<NetworkSaved>()
            .add_message::<NetworkLoaded>()
            .add_systems(
                Update,
                (
                    process_save_requests,
                    process_load_requests,
                    write_pending_save,
                    read_pending_load,
                )
                    .chain(),
            );
    }
}

fn process_save_requests(
    mut requests: MessageReader<SaveNetworkRequest>,
    settings: Res<SaveSettings>,
    mut pending: ResMut<PendingSave>,
) {
    for request in requests.read() {
        let path = request
            .path
            .clone()
            .unwrap_or_else(|| settings.default_path.clone());
        pending.path = Some(path);
    }
}

fn process_load_requests(
    mut requests: MessageReader<LoadNetworkRequest>,
    settings: Res<SaveSettings>,
    mut pending: ResMut<PendingLoad>,
) {
    for request in requests.read() {
        let path = request
            .path
            .clone()
            .unwrap_or_else(|| settings.default_path.clone());
        pending.path = Some(path);
    }
}

fn write_pending_save(
    network: Option<Res<RoadNetwork>>,
    mut pending: ResMut<PendingSave>,
    mut completed: MessageWriter<NetworkSaved>,
) {
    let Some(path) = pending.path.take() else {
        return;
    };
    let Some(network) = network else {
        warn!("Save to {} requested without a road network", path.display());
        return;
    };

    match network.save(&path) {
        Ok(()) => {
            info!("[{}] Saved road network to {}", network.world(), path.display());
            completed.write(NetworkSaved { path });
        }
        Err(err) => error!(
            "[{}] Failed to save road network to {}: {}",
            network.world(),
            path.display(),
            err
        ),
    }
}

/// Loading replaces the whole network; paths a crash left PROCESSING are
/// returned to PENDING by the restore.
fn read_pending_load(
    network: Option<ResMut<RoadNetwork>>,
    mut pending: ResMut<PendingLoad>,
    mut completed: MessageWriter<NetworkLoaded>,
) {
    let Some(path) = pending.path.take() else {
        return;
    };
    let Some(mut network) = network else {
        warn!("Load from {} requested without a road network", path.display());
        return;
    };

    match network.load(&path) {
        Ok(report) => {
            completed.write(NetworkLoaded { path, report });
        }
        Err(err) => error!(
            "[{}] Failed to load road network from {}: {}",
            network.world(),
            path.display(),
            err
        ),
    }
}
