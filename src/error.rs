//! Error types surfaced through `open()` futures

use thiserror::Error;

/// Why a window did not reach the opened state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("no window registered under '{0}'")]
    UnknownWindow(String),

    #[error("no window registered with id {0}")]
    UnknownWindowId(u32),

    #[error("failed to load package for '{key}': {reason}")]
    LoadFailed { key: String, reason: String },

    #[error("failed to create content for '{key}': {reason}")]
    ContentFailed { key: String, reason: String },

    #[error("window '{0}' was closed before it opened")]
    Cancelled(String),
}

impl ViewError {
    /// Failures that leave the controller in the `Failed` state
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ViewError::LoadFailed { .. } | ViewError::ContentFailed { .. }
        )
    }
}
