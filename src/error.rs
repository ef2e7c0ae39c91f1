use thiserror::Error;

use crate::keys::PathKey;

/// Errors surfaced by the road network pipeline.
///
/// None of these reach a player; callers log them with the world label and
/// carry on with the remaining work.
#[derive(Debug, Error)]
pub enum RoadNetworkError {
    #[error("malformed key `{0}`")]
    MalformedKey(String),
    #[error("no path document for `{0}`")]
    MissingPath(PathKey),
    #[error("merge of `{key}` aborted: {reason}")]
    MergeAborted { key: PathKey, reason: String },
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("failed to access snapshot file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode snapshot: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to decode snapshot: {0}")]
    Deserialize(#[from] ron::error::SpannedError),
}

pub type Result<T, E = RoadNetworkError> = std::result::Result<T, E>;
