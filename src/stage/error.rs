use thiserror::Error;

use super::registry::InstanceId;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("media instance {0} not found")]
    NotFound(InstanceId),
    #[error("media instance {0} is no longer attached to the page")]
    Detached(InstanceId),
    #[error("invalid stage settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
    #[error("platform call failed: {0}")]
    Platform(String),
}

impl StageError {
    /// True when the instance is gone and callers should just skip it.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Detached(_))
    }
}
