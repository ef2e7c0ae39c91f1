pub mod discovery;
pub mod routing;

pub use discovery::{NodeDiscovered, ScanRequest};
pub use routing::{PathFinalized, RoutesApplied};

pub use crate::save::{LoadNetworkRequest, NetworkLoaded, NetworkSaved, SaveNetworkRequest};
