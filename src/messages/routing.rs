use bevy::prelude::*;

use crate::keys::PathKey;

/// Route searches finished during this frame.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutesApplied {
    pub routed: usize,
    pub failed: usize,
}

/// A path became READY and its segments were queued.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct PathFinalized {
    pub key: PathKey,
}
