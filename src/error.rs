//! Recoverable core faults
//!
//! Nothing in the core is fatal. Callers log these and carry on; the
//! session itself logs and swallows the ones the host can't act on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("throw target coincides with the launch point")]
    ZeroDistanceThrow,

    #[error("no sockballs left to throw")]
    NoAmmo,

    #[error("level index {index} out of range ({available} levels)")]
    InvalidLevel { index: usize, available: usize },

    #[error("NPC cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("level table config: {0}")]
    Config(#[from] serde_json::Error),
}
