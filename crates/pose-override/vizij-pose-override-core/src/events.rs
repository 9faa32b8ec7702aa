//! Semantic events emitted by the editor.
//!
//! Hosts drain these after each command to drive UI feedback and logs.

use serde::{Deserialize, Serialize};

use crate::ids::BoneId;
use crate::session::SessionKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EditorEvent {
    CaptureStarted {
        skeleton_root: BoneId,
        bones: usize,
    },
    PreviewStarted {
        units: usize,
        entries: usize,
    },
    CopyStarted {
        skeleton_root: BoneId,
    },
    Committed {
        units: usize,
        entries: usize,
    },
    Cancelled {
        kind: SessionKind,
    },
    /// Deviations beyond one unit's capacity were dropped.
    Truncated {
        dropped: usize,
    },
    /// Deviations exceed one unit's capacity and were spread over siblings.
    Split {
        units: usize,
    },
    OverridesCleared,
    CopiedFromSource {
        units: usize,
        entries: usize,
    },
}
