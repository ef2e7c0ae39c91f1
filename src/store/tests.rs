use std::sync::Barrier;

use bevy::math::IVec3;

use super::*;
use crate::keys::{EdgeKey, NodeId};

fn key(a: u64, b: u64) -> PathKey {
    PathKey::for_edge(EdgeKey::new(NodeId(a), NodeId(b)))
}

fn geometry(len: i32) -> PathGeometry {
    PathGeometry::from_points((0..len).map(|x| IVec3::new(x, 64, 0)).collect())
}

#[test]
fn exactly_one_concurrent_claimer_wins() {
    let store = PathStore::new();
    let contested = key(1, 2);
    store.insert(contested.clone(), PathStatus::Pending, geometry(3));

    const CLAIMERS: usize = 16;
    let barrier = Barrier::new(CLAIMERS);
    let claims: Vec<Option<Claim>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..CLAIMERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    store.try_claim(&contested, PathStatus::Pending)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(claims.iter().filter(|c| c.is_some()).count(), 1);
    assert_eq!(store.status(&contested), Some(PathStatus::Processing));
}

#[test]
fn only_pending_paths_can_be_claimed() {
    let store = PathStore::new();
    store.insert(key(1, 2), PathStatus::Ready, geometry(2));
    store.insert(key(1, 3), PathStatus::Failed, geometry(0));

    assert!(store.try_claim(&key(1, 2), PathStatus::Pending).is_none());
    assert!(store.try_claim(&key(1, 3), PathStatus::Pending).is_none());
    assert!(store.try_claim(&key(7, 8), PathStatus::Pending).is_none());
}

#[test]
fn dropped_claim_rolls_back() {
    let store = PathStore::new();
    store.insert(key(1, 2), PathStatus::Pending, geometry(2));
    store.insert(key(3, 4), PathStatus::Pending, geometry(2));

    drop(store.try_claim(&key(1, 2), PathStatus::Pending));
    drop(store.try_claim(&key(3, 4), PathStatus::Failed));

    assert_eq!(store.status(&key(1, 2)), Some(PathStatus::Pending));
    assert_eq!(store.status(&key(3, 4)), Some(PathStatus::Failed));
}

#[test]
fn claim_rolls_back_when_a_worker_panics() {
    let store = PathStore::new();
    store.insert(key(1, 2), PathStatus::Pending, geometry(2));

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _claim = store.try_claim(&key(1, 2), PathStatus::Pending).unwrap();
        panic!("merge blew up");
    }));

    assert!(result.is_err());
    assert_eq!(store.status(&key(1, 2)), Some(PathStatus::Pending));
}

#[test]
fn finish_publishes_geometry_and_status() {
    let store = PathStore::new();
    store.insert(key(1, 2), PathStatus::Pending, geometry(2));

    let claim = store.try_claim(&key(1, 2), PathStatus::Failed).unwrap();
    assert_eq!(claim.geometry(), geometry(2));
    claim.finish(PathStatus::Ready, geometry(5));

    let path = store.get(&key(1, 2)).unwrap();
    assert_eq!(path.status, PathStatus::Ready);
    assert_eq!(path.geometry.points.len(), 5);
}

#[test]
fn recover_interrupted_returns_processing_to_pending() {
    let store = PathStore::new();
    store.insert(key(1, 2), PathStatus::Processing, geometry(2));
    store.insert(key(2, 3), PathStatus::Processing, geometry(2));
    store.insert(key(3, 4), PathStatus::Ready, geometry(2));

    assert_eq!(store.recover_interrupted(), 2);
    assert_eq!(store.pending_keys(), vec![key(1, 2), key(2, 3)]);
    assert_eq!(store.status(&key(3, 4)), Some(PathStatus::Ready));
}

#[test]
fn pending_keys_follow_natural_order() {
    let store = PathStore::new();
    let trunk = key(1, 2).trunk(IVec3::new(5, 64, 5));
    store.insert(key(2, 9), PathStatus::Pending, geometry(2));
    store.insert(trunk.clone(), PathStatus::Pending, geometry(2));
    store.insert(key(1, 2), PathStatus::Pending, geometry(2));

    assert_eq!(store.pending_keys(), vec![key(1, 2), trunk, key(2, 9)]);
    assert_eq!(store.pending_except(&key(1, 2)).len(), 2);
}

#[test]
fn inserted_claim_belongs_to_the_caller() {
    let store = PathStore::new();
    let trunk = key(1, 2).trunk(IVec3::ZERO);
    let claim = store.insert_claimed(trunk.clone(), geometry(4), PathStatus::Failed);

    assert_eq!(store.status(&trunk), Some(PathStatus::Processing));
    assert!(store.try_claim(&trunk, PathStatus::Pending).is_none());
    claim.release();
    assert_eq!(store.status(&trunk), Some(PathStatus::Pending));
}

#[test]
fn snapshot_and_restore_round_trip() {
    let store = PathStore::new();
    store.insert(key(1, 2), PathStatus::Ready, geometry(3));
    store.insert(key(2, 3), PathStatus::Failed, PathGeometry::default());

    let snapshot = store.snapshot();
    let restored = PathStore::new();
    restored.restore(snapshot.clone());

    assert_eq!(restored.snapshot(), snapshot);
}
