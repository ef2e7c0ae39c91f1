//! Status-queryable path store
//!
//! Each path lives in its own slot whose status is an atomic byte. Moving a
//! path from PENDING to PROCESSING is a compare-and-swap on that byte, so among
//! any number of concurrent claimers exactly one wins. The map lock is only
//! held to find or insert a slot, never while a path is being worked on.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use bevy::prelude::*;
use parking_lot::RwLock;

use crate::keys::PathKey;
use crate::types::{Path, PathGeometry, PathStatus};

struct PathSlot {
    status: AtomicU8,
    geometry: RwLock<PathGeometry>,
}

impl PathSlot {
    fn new(status: PathStatus, geometry: PathGeometry) -> Self {
        Self {
            status: AtomicU8::new(status as u8),
            geometry: RwLock::new(geometry),
        }
    }

    fn status(&self) -> PathStatus {
        PathStatus::from_u8(self.status.load(Ordering::Acquire)).unwrap_or(PathStatus::Failed)
    }

    fn transition(&self, from: PathStatus, to: PathStatus) -> bool {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Natural iteration order: by edge, plain paths before their trunks
fn sort_keys(keys: &mut [PathKey]) {
    keys.sort_by_key(|k| (k.edge(), k.junction().map(|j| (j.x, j.y, j.z))));
}

#[derive(Default)]
pub struct PathStore {
    slots: RwLock<HashMap<PathKey, Arc<PathSlot>>>,
}

impl PathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the document for `key`
    pub fn insert(&self, key: PathKey, status: PathStatus, geometry: PathGeometry) {
        let mut slots = self.slots.write();
        match slots.get(&key) {
            Some(slot) => {
                *slot.geometry.write() = geometry;
                slot.status.store(status as u8, Ordering::Release);
            }
            None => {
                slots.insert(key, Arc::new(PathSlot::new(status, geometry)));
            }
        }
    }

    /// Insert a new document already held by the caller
    pub fn insert_claimed(&self, key: PathKey, geometry: PathGeometry, rollback: PathStatus) -> Claim {
        let slot = Arc::new(PathSlot::new(PathStatus::Processing, geometry));
        self.slots.write().insert(key.clone(), slot.clone());
        Claim::new(key, slot, rollback)
    }

    pub fn remove(&self, key: &PathKey) -> Option<Path> {
        let slot = self.slots.write().remove(key)?;
        let geometry = slot.geometry.read().clone();
        Some(Path {
            status: slot.status(),
            geometry,
        })
    }

    fn slot(&self, key: &PathKey) -> Option<Arc<PathSlot>> {
        self.slots.read().get(key).cloned()
    }

    pub fn contains(&self, key: &PathKey) -> bool {
        self.slots.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self, key: &PathKey) -> Option<PathStatus> {
        self.slot(key).map(|slot| slot.status())
    }

    pub fn geometry(&self, key: &PathKey) -> Option<PathGeometry> {
        self.slot(key).map(|slot| slot.geometry.read().clone())
    }

    pub fn get(&self, key: &PathKey) -> Option<Path> {
        let slot = self.slot(key)?;
        let geometry = slot.geometry.read().clone();
        Some(Path {
            status: slot.status(),
            geometry,
        })
    }

    /// Keys currently in `status`, in natural order
    pub fn keys_with_status(&self, status: PathStatus) -> Vec<PathKey> {
        let mut keys: Vec<PathKey> = self
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| slot.status() == status)
            .map(|(key, _)| key.clone())
            .collect();
        sort_keys(&mut keys);
        keys
    }

    pub fn pending_keys(&self) -> Vec<PathKey> {
        self.keys_with_status(PathStatus::Pending)
    }

    /// PENDING paths other than `except`, with their geometry
    pub fn pending_except(&self, except: &PathKey) -> Vec<(PathKey, PathGeometry)> {
        let mut pending: Vec<(PathKey, PathGeometry)> = self
            .slots
            .read()
            .iter()
            .filter(|(key, slot)| *key != except && slot.status() == PathStatus::Pending)
            .map(|(key, slot)| (key.clone(), slot.geometry.read().clone()))
            .collect();
        pending.sort_by_key(|(k, _)| (k.edge(), k.junction().map(|j| (j.x, j.y, j.z))));
        pending
    }

    /// Flip `key` from PENDING to PROCESSING; `None` if someone else got there
    /// first or the path is not pending.
    pub fn try_claim(&self, key: &PathKey, rollback: PathStatus) -> Option<Claim> {
        let slot = self.slot(key)?;
        if slot.transition(PathStatus::Pending, PathStatus::Processing) {
            Some(Claim::new(key.clone(), slot, rollback))
        } else {
            None
        }
    }

    /// Return every PROCESSING path to PENDING. Used after a restart, when no
    /// worker can still be holding a claim.
    pub fn recover_interrupted(&self) -> usize {
        let slots = self.slots.read();
        let mut recovered = 0;
        for (key, slot) in slots.iter() {
            if slot.transition(PathStatus::Processing, PathStatus::Pending) {
                debug!("Recovered interrupted path {}", key);
                recovered += 1;
            }
        }
        recovered
    }

    /// Copy of every document in natural key order
    pub fn snapshot(&self) -> Vec<(PathKey, Path)> {
        let mut keys: Vec<PathKey> = self.slots.read().keys().cloned().collect();
        sort_keys(&mut keys);
        keys.into_iter()
            .filter_map(|key| self.get(&key).map(|path| (key, path)))
            .collect()
    }

    /// Replace the whole store
    pub fn restore(&self, paths: impl IntoIterator<Item = (PathKey, Path)>) {
        let restored: HashMap<PathKey, Arc<PathSlot>> = paths
            .into_iter()
            .map(|(key, path)| (key, Arc::new(PathSlot::new(path.status, path.geometry))))
            .collect();
        *self.slots.write() = restored;
    }

    pub fn clear(&self) {
        self.slots.write().clear();
    }
}

/// Exclusive hold on a PROCESSING path.
///
/// Dropped without [`Claim::finish`] or [`Claim::release`], the path falls
/// back to the rollback status given at claim time.
pub struct Claim {
    key: PathKey,
    slot: Arc<PathSlot>,
    rollback: PathStatus,
    settled: bool,
}

impl Claim {
    fn new(key: PathKey, slot: Arc<PathSlot>, rollback: PathStatus) -> Self {
        Self {
            key,
            slot,
            rollback,
            settled: false,
        }
    }

    pub fn key(&self) -> &PathKey {
        &self.key
    }

    pub fn geometry(&self) -> PathGeometry {
        self.slot.geometry.read().clone()
    }

    /// Store the final geometry, then publish `status`
    pub fn finish(mut self, status: PathStatus, geometry: PathGeometry) {
        *self.slot.geometry.write() = geometry;
        self.slot.status.store(status as u8, Ordering::Release);
        self.settled = true;
    }

    /// Give the path back untouched
    pub fn release(mut self) {
        self.slot
            .status
            .store(PathStatus::Pending as u8, Ordering::Release);
        self.settled = true;
    }

    /// Give the path up as failed
    pub fn fail(mut self) {
        self.slot
            .status
            .store(PathStatus::Failed as u8, Ordering::Release);
        self.settled = true;
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Claim on {} dropped unfinished, now {:?}", self.key, self.rollback);
            self.slot
                .status
                .store(self.rollback as u8, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests;
