//! Add-on listeners notified about network changes
//!
//! Every event goes to every listener. A listener that fails or panics is
//! recorded in the [`DispatchReport`] and logged; the others still run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use bevy::math::IVec3;
use bevy::prelude::*;
use thiserror::Error;

use crate::keys::{EdgeKey, NodeId, PathKey};
use crate::types::{EdgeStatus, StructureKind};

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    NodeAdded {
        id: NodeId,
        position: IVec3,
        kind: StructureKind,
    },
    NodeRemoved {
        id: NodeId,
        edges: Vec<EdgeKey>,
    },
    EdgeAdded(EdgeKey),
    EdgeRouted {
        edge: EdgeKey,
        status: EdgeStatus,
    },
    PathFinalized(PathKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

pub trait NetworkListener: Send + Sync {
    fn name(&self) -> &str;

    fn on_event(&self, event: &NetworkEvent) -> Result<(), ListenerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub listener: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failures: Vec<ListenerFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct ListenerDispatcher {
    listeners: Vec<Arc<dyn NetworkListener>>,
}

impl ListenerDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn NetworkListener>) {
        debug!("Registered network listener {}", listener.name());
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn dispatch(&self, world: &str, event: &NetworkEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        for listener in &self.listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            let error = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(err)) => err.to_string(),
                Err(_) => "listener panicked".to_string(),
            };
            warn!(
                "[{}] Listener {} failed on {:?}: {}",
                world,
                listener.name(),
                event,
                error
            );
            report.failures.push(ListenerFailure {
                listener: listener.name().to_string(),
                error,
            });
        }
        report
    }

    pub fn dispatch_all<'a>(
        &self,
        world: &str,
        events: impl IntoIterator<Item = &'a NetworkEvent>,
    ) -> DispatchReport {
        let mut total = DispatchReport::default();
        for event in events {
            let report = self.dispatch(world, event);
            total.delivered += report.delivered;
            total.failures.extend(report.failures);
        }
        total
    }
}
