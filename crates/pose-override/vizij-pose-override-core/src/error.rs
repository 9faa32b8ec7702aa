//! Error types for capture, preview and binding.

use thiserror::Error;

use crate::ids::BoneId;
use crate::session::SessionState;

/// Why an override set was rejected at bind or preview time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSetReason {
    #[error("{count} entries exceed the capacity of {max}")]
    TooManyEntries { count: usize, max: usize },
    #[error("bone {bone:?} is targeted more than once")]
    DuplicateTarget { bone: BoneId },
    #[error("{entries} entries but {weights} entry weights")]
    WeightCountMismatch { entries: usize, weights: usize },
    #[error("entry {index} targets unresolved bone {bone:?}")]
    UnresolvedBone { index: usize, bone: BoneId },
}

/// Errors surfaced by the pose override core.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OverrideError {
    /// The host could not find a skeleton root above the given bone.
    #[error("no skeleton root found above bone {bone:?}")]
    NoSkeletonRoot { bone: BoneId },

    #[error("a capture or preview session is already open")]
    SessionAlreadyActive,

    #[error("no capture or preview session is open")]
    NoActiveSession,

    #[error("session is {actual:?}, expected {expected:?}")]
    InvalidSessionState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error("invalid override set: {0}")]
    InvalidOverrideSet(#[from] InvalidSetReason),

    #[error("bone {bone:?} is not part of the hierarchy")]
    UnknownBone { bone: BoneId },

    #[error("copy source root and bone must both be set")]
    CopySourceMissing,

    #[error("overrides cannot be modified while the host is playing")]
    PlayModeActive,

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OverrideError>;

/// Rejection returned by [`crate::OverrideSet::push`]; hands the entry back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PushError {
    #[error("override set is full")]
    Full(crate::override_set::OverrideEntry),
    #[error("bone already has an entry")]
    DuplicateTarget(crate::override_set::OverrideEntry),
}

impl PushError {
    pub fn into_entry(self) -> crate::override_set::OverrideEntry {
        match self {
            PushError::Full(e) | PushError::DuplicateTarget(e) => e,
        }
    }
}
