//! Per-cell queue of buildable path segments
//!
//! The world painter drains one cell at a time, so a READY path is split into
//! contiguous index ranges, one per 16x16 cell it passes through.

use std::collections::{HashMap, VecDeque};

use bevy::math::{IVec2, IVec3};
use parking_lot::Mutex;

use crate::keys::PathKey;
use crate::types::{BuildSegment, build_cell};

/// Split `points` into maximal runs that stay inside one build cell
pub fn segments_for(key: &PathKey, points: &[IVec3]) -> Vec<(IVec2, BuildSegment)> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=points.len() {
        let boundary = i == points.len() || build_cell(points[i]) != build_cell(points[start]);
        if boundary && start < points.len() {
            out.push((
                build_cell(points[start]),
                BuildSegment {
                    path: key.clone(),
                    start,
                    end: i - 1,
                },
            ));
            start = i;
        }
    }
    out
}

#[derive(Default)]
pub struct BuildQueue {
    cells: Mutex<HashMap<IVec2, VecDeque<BuildSegment>>>,
}

impl BuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue every segment of a finished path; returns how many were queued
    pub fn enqueue_path(&self, key: &PathKey, points: &[IVec3]) -> usize {
        let segments = segments_for(key, points);
        let count = segments.len();
        let mut cells = self.cells.lock();
        for (cell, segment) in segments {
            cells.entry(cell).or_default().push_back(segment);
        }
        count
    }

    pub fn push(&self, cell: IVec2, segment: BuildSegment) {
        self.cells.lock().entry(cell).or_default().push_back(segment);
    }

    /// Remove and return the oldest segment queued under `cell`
    pub fn pop(&self, cell: IVec2) -> Option<BuildSegment> {
        let mut cells = self.cells.lock();
        let queue = cells.get_mut(&cell)?;
        let segment = queue.pop_front();
        if queue.is_empty() {
            cells.remove(&cell);
        }
        segment
    }

    /// Remove and return everything queued under `cell`
    pub fn take_cell(&self, cell: IVec2) -> Vec<BuildSegment> {
        self.cells
            .lock()
            .remove(&cell)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Drop queued segments of a path that no longer exists
    pub fn remove_path(&self, key: &PathKey) -> usize {
        let mut cells = self.cells.lock();
        let mut removed = 0;
        cells.retain(|_, queue| {
            let before = queue.len();
            queue.retain(|segment| &segment.path != key);
            removed += before - queue.len();
            !queue.is_empty()
        });
        removed
    }

    pub fn pending_cells(&self) -> Vec<IVec2> {
        let mut cells: Vec<IVec2> = self.cells.lock().keys().copied().collect();
        cells.sort_by_key(|c| (c.x, c.y));
        cells
    }

    pub fn len(&self) -> usize {
        self.cells.lock().values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every queued segment with its cell, cells in order
    pub fn snapshot(&self) -> Vec<(IVec2, BuildSegment)> {
        let cells = self.cells.lock();
        let mut keys: Vec<IVec2> = cells.keys().copied().collect();
        keys.sort_by_key(|c| (c.x, c.y));
        keys.into_iter()
            .flat_map(|cell| cells[&cell].iter().map(move |s| (cell, s.clone())))
            .collect()
    }

    pub fn restore(&self, segments: impl IntoIterator<Item = (IVec2, BuildSegment)>) {
        let mut cells = self.cells.lock();
        cells.clear();
        for (cell, segment) in segments {
            cells.entry(cell).or_default().push_back(segment);
        }
    }
}
