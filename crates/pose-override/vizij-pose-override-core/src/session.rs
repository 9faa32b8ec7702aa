//! Interactive capture and preview sessions.
//!
//! ```text
//! Idle ── begin ──────────► Capturing ── commit ──► Committed
//!   │                           └──────── cancel ──► Cancelled
//!   └─── preview ─────────► Previewing ── cancel ──► Cancelled
//! ```
//!
//! Every session snapshots the whole skeleton when it opens. Commit and
//! cancel both restore that snapshot, so the hierarchy leaves a session
//! exactly as it entered.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::deviation::{select_deviated, DeviationReport};
use crate::error::{OverrideError, Result};
use crate::hierarchy::{all_bones, SkeletonHierarchy};
use crate::ids::BoneId;
use crate::matcher::match_by_relative_path;
use crate::override_set::OverrideEntry;
use crate::snapshot::BaselinePose;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Capturing,
    Previewing,
    Committed,
    Cancelled,
}

impl SessionState {
    pub fn is_open(self) -> bool {
        matches!(self, SessionState::Capturing | SessionState::Previewing)
    }
}

/// Source skeleton for a copy session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopySource {
    /// Root of the source skeleton.
    pub root: BoneId,
    /// Bone whose subtree is copied; `root` copies everything.
    pub bone: BoneId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    /// Probe edits on the live skeleton and keep the deviations.
    Capture,
    /// Show stored overrides at full weight.
    Preview,
    /// Take overrides from another skeleton with the same structure.
    CopyFromSource(Option<CopySource>),
}

#[derive(Debug)]
pub struct CaptureSession {
    kind: SessionKind,
    state: SessionState,
    skeleton_root: BoneId,
    baseline: BaselinePose,
    threshold: f32,
    separator: char,
}

impl CaptureSession {
    fn open<H: SkeletonHierarchy + ?Sized>(
        h: &H,
        any_bone: BoneId,
        cfg: &Config,
        kind: SessionKind,
        state: SessionState,
    ) -> Result<Self> {
        let bones = all_bones(h, any_bone)?;
        let skeleton_root = bones[0];
        let baseline = BaselinePose::capture(h, bones);
        log::debug!(
            "session {:?} opened on {:?} with {} bones",
            kind,
            skeleton_root,
            baseline.len()
        );
        Ok(Self {
            kind,
            state,
            skeleton_root,
            baseline,
            threshold: cfg.deviation_threshold,
            separator: cfg.path_separator,
        })
    }

    /// Snapshot the skeleton containing `any_bone` and start capturing edits.
    pub fn begin<H: SkeletonHierarchy + ?Sized>(
        h: &H,
        any_bone: BoneId,
        cfg: &Config,
    ) -> Result<Self> {
        Self::open(h, any_bone, cfg, SessionKind::Capture, SessionState::Capturing)
    }

    /// Snapshot, then write every entry's override position/scale into its bone.
    ///
    /// All targets are checked before anything is written.
    pub fn preview<'a, H, I>(h: &mut H, any_bone: BoneId, cfg: &Config, entries: I) -> Result<Self>
    where
        H: SkeletonHierarchy + ?Sized,
        I: IntoIterator<Item = &'a OverrideEntry>,
    {
        let session = Self::open(&*h, any_bone, cfg, SessionKind::Preview, SessionState::Previewing)?;
        let entries: Vec<&OverrideEntry> = entries.into_iter().collect();
        if let Some(e) = entries.iter().find(|e| !h.contains(e.target)) {
            return Err(OverrideError::UnknownBone { bone: e.target });
        }
        for e in entries {
            h.set_local_position(e.target, e.position);
            h.set_local_scale(e.target, e.scale);
        }
        Ok(session)
    }

    /// Snapshot and wait for a copy source to be chosen.
    pub fn begin_copy<H: SkeletonHierarchy + ?Sized>(
        h: &H,
        any_bone: BoneId,
        cfg: &Config,
    ) -> Result<Self> {
        Self::open(
            h,
            any_bone,
            cfg,
            SessionKind::CopyFromSource(None),
            SessionState::Capturing,
        )
    }

    pub fn set_copy_source(&mut self, source: CopySource) -> Result<()> {
        match &mut self.kind {
            SessionKind::CopyFromSource(slot) if self.state == SessionState::Capturing => {
                *slot = Some(source);
                Ok(())
            }
            _ => Err(OverrideError::InvalidSessionState {
                expected: SessionState::Capturing,
                actual: self.state,
            }),
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn skeleton_root(&self) -> BoneId {
        self.skeleton_root
    }

    pub fn baseline(&self) -> &BaselinePose {
        &self.baseline
    }

    fn expect_capturing(&self) -> Result<()> {
        if self.state == SessionState::Capturing {
            Ok(())
        } else {
            Err(OverrideError::InvalidSessionState {
                expected: SessionState::Capturing,
                actual: self.state,
            })
        }
    }

    /// Which bones would be stored if the session were committed now.
    pub fn tick<H: SkeletonHierarchy + ?Sized>(&self, h: &H) -> Result<DeviationReport> {
        self.expect_capturing()?;
        let bones = match self.kind {
            SessionKind::CopyFromSource(Some(src)) => self
                .copy_entries(h, src)
                .into_iter()
                .map(|e| e.target)
                .collect(),
            SessionKind::CopyFromSource(None) => Vec::new(),
            _ => select_deviated(&self.baseline, h, self.threshold),
        };
        Ok(DeviationReport::build(h, bones))
    }

    fn capture_entries<H: SkeletonHierarchy + ?Sized>(&self, h: &H) -> Vec<OverrideEntry> {
        select_deviated(&self.baseline, h, self.threshold)
            .into_iter()
            .filter_map(|bone| {
                h.local_transform(bone)
                    .map(|now| OverrideEntry::new(bone, now.position, now.scale))
            })
            .collect()
    }

    fn copy_entries<H: SkeletonHierarchy + ?Sized>(
        &self,
        h: &H,
        src: CopySource,
    ) -> Vec<OverrideEntry> {
        let matches =
            match_by_relative_path(h, src.root, src.bone, self.skeleton_root, self.separator);
        matches
            .into_iter()
            .filter_map(|(target, source)| {
                let now = h.local_transform(target)?;
                let from = h.local_transform(source)?;
                from.differs_from(&now, self.threshold)
                    .then(|| OverrideEntry::new(target, from.position, from.scale))
            })
            .collect()
    }

    /// Turn the current deviations into entries and put the skeleton back.
    ///
    /// Entries carry each bone's current pose, not the baseline, and are
    /// ordered first-found-in-hierarchy-traversal-order.
    pub fn commit<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) -> Result<Vec<OverrideEntry>> {
        self.expect_capturing()?;
        let entries = match self.kind {
            SessionKind::Capture => self.capture_entries(&*h),
            SessionKind::CopyFromSource(Some(src)) => self.copy_entries(&*h, src),
            SessionKind::CopyFromSource(None) => return Err(OverrideError::CopySourceMissing),
            SessionKind::Preview => {
                return Err(OverrideError::InvalidSessionState {
                    expected: SessionState::Capturing,
                    actual: SessionState::Previewing,
                })
            }
        };
        self.baseline.restore(h);
        self.baseline = BaselinePose::default();
        self.state = SessionState::Committed;
        log::debug!("session committed {} entries", entries.len());
        Ok(entries)
    }

    /// Restore the snapshot and close. No-op on a closed session.
    pub fn cancel<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) {
        if !self.is_open() {
            return;
        }
        self.baseline.restore(h);
        self.baseline = BaselinePose::default();
        self.state = SessionState::Cancelled;
        log::debug!("session {:?} cancelled", self.kind);
    }
}
