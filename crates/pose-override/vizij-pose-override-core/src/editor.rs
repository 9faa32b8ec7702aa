//! Command layer over one host object's override rig.
//!
//! The editor owns the rig, opens at most one session at a time, and turns
//! committed sessions into stored units through the [`OverflowSplitter`].

use crate::binding::StreamBinder;
use crate::blend::{BlendEvaluator, BoundEvaluator};
use crate::config::Config;
use crate::deviation::DeviationReport;
use crate::error::{OverrideError, Result};
use crate::events::EditorEvent;
use crate::hierarchy::SkeletonHierarchy;
use crate::ids::BoneId;
use crate::override_set::{OverrideEntry, OverrideRig};
use crate::session::{CaptureSession, CopySource, SessionKind, SessionState};
use crate::splitter::{OverflowSplitter, SplitReport};

#[derive(Debug)]
pub struct OverrideEditor {
    anchor: BoneId,
    rig: OverrideRig,
    config: Config,
    session: Option<CaptureSession>,
    playing: bool,
    events: Vec<EditorEvent>,
}

impl OverrideEditor {
    /// `anchor` is any bone of the skeleton the rig belongs to.
    pub fn new(anchor: BoneId, config: Config) -> Self {
        Self::with_rig(anchor, config, OverrideRig::new())
    }

    pub fn with_rig(anchor: BoneId, config: Config, rig: OverrideRig) -> Self {
        Self {
            anchor,
            rig,
            config,
            session: None,
            playing: false,
            events: Vec::new(),
        }
    }

    pub fn anchor(&self) -> BoneId {
        self.anchor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rig(&self) -> &OverrideRig {
        &self.rig
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn is_session_open(&self) -> bool {
        self.session.as_ref().is_some_and(CaptureSession::is_open)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.playing {
            return Err(OverrideError::PlayModeActive);
        }
        if self.is_session_open() {
            return Err(OverrideError::SessionAlreadyActive);
        }
        Ok(())
    }

    fn open_session(&mut self) -> Result<&mut CaptureSession> {
        match self.session.as_mut() {
            Some(s) if s.is_open() => Ok(s),
            _ => Err(OverrideError::NoActiveSession),
        }
    }

    /// Replace the stored rig, e.g. after loading it from disk.
    pub fn load_rig(&mut self, rig: OverrideRig) -> Result<()> {
        self.ensure_editable()?;
        self.rig = rig;
        Ok(())
    }

    /// Switch play mode. Entering play mode closes any open session.
    pub fn set_playing<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H, playing: bool) {
        if playing && self.is_session_open() {
            log::debug!("entering play mode; cancelling open session");
            self.cancel_open(h);
        }
        self.playing = playing;
    }

    pub fn start_capture<H: SkeletonHierarchy + ?Sized>(&mut self, h: &H) -> Result<()> {
        self.ensure_editable()?;
        let session = CaptureSession::begin(h, self.anchor, &self.config)?;
        self.events.push(EditorEvent::CaptureStarted {
            skeleton_root: session.skeleton_root(),
            bones: session.baseline().len(),
        });
        self.session = Some(session);
        Ok(())
    }

    /// Show every stored unit at full weight until cancelled.
    pub fn start_preview<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) -> Result<()> {
        self.ensure_editable()?;
        let entries: Vec<&OverrideEntry> =
            self.rig.units().flat_map(|u| u.entries().iter()).collect();
        let count = entries.len();
        let session = CaptureSession::preview(h, self.anchor, &self.config, entries)?;
        self.events.push(EditorEvent::PreviewStarted {
            units: self.rig.unit_count(),
            entries: count,
        });
        self.session = Some(session);
        Ok(())
    }

    /// Open a copy session; choose the source with [`Self::set_copy_source`].
    pub fn start_copy<H: SkeletonHierarchy + ?Sized>(&mut self, h: &H) -> Result<()> {
        self.ensure_editable()?;
        let session = CaptureSession::begin_copy(h, self.anchor, &self.config)?;
        self.events.push(EditorEvent::CopyStarted {
            skeleton_root: session.skeleton_root(),
        });
        self.session = Some(session);
        Ok(())
    }

    pub fn set_copy_source(&mut self, source: CopySource) -> Result<()> {
        self.open_session()?.set_copy_source(source)
    }

    /// Open, source and commit a copy session in one step.
    pub fn copy_from_source<H: SkeletonHierarchy + ?Sized>(
        &mut self,
        h: &mut H,
        source: CopySource,
    ) -> Result<SplitReport> {
        self.start_copy(&*h)?;
        if let Err(e) = self.set_copy_source(source) {
            self.cancel_open(h);
            return Err(e);
        }
        self.commit(h)
    }

    /// Deviations the open session would store right now.
    pub fn tick<H: SkeletonHierarchy + ?Sized>(&self, h: &H) -> Result<DeviationReport> {
        match self.session.as_ref() {
            Some(s) if s.is_open() => s.tick(h),
            _ => Err(OverrideError::NoActiveSession),
        }
    }

    /// Store the open session's result in the rig and restore the skeleton.
    ///
    /// On error the session stays open.
    pub fn commit<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) -> Result<SplitReport> {
        let session = self.open_session()?;
        let kind = session.kind();
        let entries = session.commit(h)?;
        self.session = None;

        let splitter = OverflowSplitter::new(self.config.overflow);
        let report = splitter.commit(&mut self.rig, entries);
        if report.dropped > 0 {
            self.events.push(EditorEvent::Truncated {
                dropped: report.dropped,
            });
        } else if report.units > 1 {
            self.events.push(EditorEvent::Split {
                units: report.units,
            });
        }
        self.events.push(match kind {
            SessionKind::CopyFromSource(_) => EditorEvent::CopiedFromSource {
                units: report.units,
                entries: report.entries,
            },
            _ => EditorEvent::Committed {
                units: report.units,
                entries: report.entries,
            },
        });
        Ok(report)
    }

    /// Close the open session and restore the skeleton exactly.
    pub fn cancel<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) -> Result<()> {
        if !self.is_session_open() {
            return Err(OverrideError::NoActiveSession);
        }
        self.cancel_open(h);
        Ok(())
    }

    /// [`Self::cancel`] restricted to capture and copy sessions.
    pub fn cancel_capture<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) -> Result<()> {
        self.cancel_kind(h, SessionState::Capturing)
    }

    /// [`Self::cancel`] restricted to preview sessions.
    pub fn cancel_preview<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) -> Result<()> {
        self.cancel_kind(h, SessionState::Previewing)
    }

    fn cancel_kind<H: SkeletonHierarchy + ?Sized>(
        &mut self,
        h: &mut H,
        expected: SessionState,
    ) -> Result<()> {
        let actual = self.open_session()?.state();
        if actual != expected {
            return Err(OverrideError::InvalidSessionState { expected, actual });
        }
        self.cancel_open(h);
        Ok(())
    }

    fn cancel_open<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) {
        if let Some(mut session) = self.session.take() {
            if session.is_open() {
                session.cancel(h);
                self.events.push(EditorEvent::Cancelled {
                    kind: session.kind(),
                });
            }
        }
    }

    /// Empty the primary unit and remove all siblings.
    pub fn clear_overrides(&mut self) -> Result<()> {
        self.ensure_editable()?;
        self.rig.clear();
        self.events.push(EditorEvent::OverridesCleared);
        Ok(())
    }

    /// Host teardown: leave the skeleton as it was before any open session.
    pub fn shutdown<H: SkeletonHierarchy + ?Sized>(&mut self, h: &mut H) {
        self.cancel_open(h);
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Bind one evaluator per non-empty unit against `binder`.
    pub fn bind_runtime<B: StreamBinder + ?Sized>(
        &self,
        binder: &mut B,
    ) -> Result<Vec<BoundEvaluator>> {
        BlendEvaluator::from_config(&self.config).bind_rig(&self.rig, binder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Skeleton;
    use crate::value::TransformValue;
    use glam::Vec3;

    fn wide(n: usize) -> (Skeleton, BoneId, Vec<BoneId>) {
        let mut s = Skeleton::new();
        let root = s.add_root("Root");
        s.mark_skeleton_root(root);
        let bones = (0..n)
            .map(|i| s.add_child(root, &format!("b{i}"), TransformValue::IDENTITY))
            .collect();
        (s, root, bones)
    }

    #[test]
    fn one_session_at_a_time() {
        let (mut s, root, _) = wide(2);
        let mut ed = OverrideEditor::new(root, Config::default());
        ed.start_capture(&s).unwrap();
        assert!(matches!(
            ed.start_preview(&mut s),
            Err(OverrideError::SessionAlreadyActive)
        ));
        assert!(matches!(
            ed.clear_overrides(),
            Err(OverrideError::SessionAlreadyActive)
        ));
        ed.cancel(&mut s).unwrap();
        assert!(matches!(ed.cancel(&mut s), Err(OverrideError::NoActiveSession)));
    }

    #[test]
    fn commit_splits_into_siblings() {
        let (mut s, root, bones) = wide(20);
        let mut ed = OverrideEditor::new(root, Config::default());
        ed.start_capture(&s).unwrap();
        for b in &bones {
            s.set_local_position(*b, Vec3::Y);
        }
        let report = ed.commit(&mut s).unwrap();
        assert_eq!(report.units, 3);
        assert_eq!(ed.rig().unit_count(), 3);
        assert_eq!(ed.rig().entry_count(), 20);
        let events = ed.drain_events();
        assert!(events.contains(&EditorEvent::Split { units: 3 }));
        assert!(events.contains(&EditorEvent::Committed {
            units: 3,
            entries: 20
        }));
        assert!(ed.drain_events().is_empty());
    }

    #[test]
    fn play_mode_blocks_edits_and_closes_sessions() {
        let (mut s, root, bones) = wide(1);
        let mut ed = OverrideEditor::new(root, Config::default());
        ed.start_capture(&s).unwrap();
        s.set_local_position(bones[0], Vec3::ONE);
        ed.set_playing(&mut s, true);
        assert!(!ed.is_session_open());
        assert_eq!(s.local_transform(bones[0]), Some(TransformValue::IDENTITY));
        assert!(matches!(ed.start_capture(&s), Err(OverrideError::PlayModeActive)));
        ed.set_playing(&mut s, false);
        assert!(ed.start_capture(&s).is_ok());
    }

    #[test]
    fn cancel_commands_check_session_kind() {
        let (mut s, root, _) = wide(1);
        let mut ed = OverrideEditor::new(root, Config::default());
        ed.start_preview(&mut s).unwrap();
        assert!(matches!(
            ed.cancel_capture(&mut s),
            Err(OverrideError::InvalidSessionState { .. })
        ));
        ed.cancel_preview(&mut s).unwrap();
        assert!(!ed.is_session_open());
    }

    #[test]
    fn shutdown_restores() {
        let (mut s, root, bones) = wide(1);
        let mut ed = OverrideEditor::new(root, Config::default());
        ed.start_capture(&s).unwrap();
        s.set_local_scale(bones[0], Vec3::splat(3.0));
        ed.shutdown(&mut s);
        assert_eq!(s.local_transform(bones[0]), Some(TransformValue::IDENTITY));
        assert!(ed.session().is_none());
    }

    #[test]
    fn failed_commit_keeps_session_open() {
        let (mut s, root, _) = wide(1);
        let mut ed = OverrideEditor::new(root, Config::default());
        ed.start_copy(&s).unwrap();
        assert!(matches!(ed.commit(&mut s), Err(OverrideError::CopySourceMissing)));
        assert_eq!(ed.session().map(|s| s.state()), Some(SessionState::Capturing));
    }
}
