//! Runtime blend of override units onto the pose stream.
//!
//! Binding resolves every entry's bone to a stream handle and records its
//! bind-time pose as the baseline. Evaluation runs once per frame:
//!
//! - Absolute: `lerp(baseline, override, w)` for position and scale.
//! - OffsetAdditive: position rides on the incoming frame,
//!   `lerp(current, current + (override - baseline), w)`; scale as Absolute.
//!
//! with `w = entry_weight * global_weight`, both clamped to `[0, 1]`.
//!
//! Each unit of a rig reads its own channels: the primary uses `weight` and
//! `entries.<i>.weight`, sibling `u` uses `units.<u>.weight` and
//! `units.<u>.entries.<i>.weight`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::binding::{PoseStream, StreamBinder};
use crate::config::Config;
use crate::error::{InvalidSetReason, Result};
use crate::ids::{BoneId, PropertyHandle, ReadWriteHandle};
use crate::override_set::{OverrideRig, OverrideSet};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Absolute,
    OffsetAdditive,
}

// Weighted-sum form: t = 0 yields `a` and t = 1 yields `b` bit-exactly.
#[inline]
fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

/// Absolute-target blend of one channel.
#[inline]
pub fn blend_absolute(baseline: Vec3, target: Vec3, weight: f32) -> Vec3 {
    lerp(baseline, target, weight)
}

/// Offset blend: apply `target - baseline` on top of `current`.
#[inline]
pub fn blend_offset(current: Vec3, baseline: Vec3, target: Vec3, weight: f32) -> Vec3 {
    lerp(current, current + (target - baseline), weight)
}

/// Factory for bound evaluators; holds the naming and mode settings.
#[derive(Clone, Debug)]
pub struct BlendEvaluator {
    cfg: Config,
}

impl Default for BlendEvaluator {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Weight source: a live stream channel or the value stored in the set.
#[derive(Copy, Clone, Debug)]
enum WeightSource {
    Channel(PropertyHandle),
    Fixed(f32),
}

/// Evaluator bound to one override set and one stream.
///
/// Owns its per-bone tables; [`BlendEvaluator::unbind`] releases them.
#[derive(Debug)]
pub struct BoundEvaluator {
    mode: BlendMode,
    unit: usize,
    targets: Vec<BoneId>,
    handles: Vec<ReadWriteHandle>,
    default_positions: Vec<Vec3>,
    default_scales: Vec<Vec3>,
    override_positions: Vec<Vec3>,
    override_scales: Vec<Vec3>,
    entry_weights: Vec<WeightSource>,
    // Scratch filled from the stream each frame.
    weight_handles: Vec<PropertyHandle>,
    weight_buffer: Vec<f32>,
    global_weight: WeightSource,
}

impl BlendEvaluator {
    pub fn new(mode: BlendMode) -> Self {
        Self::from_config(&Config {
            blend_mode: mode,
            ..Config::default()
        })
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self { cfg: cfg.clone() }
    }

    pub fn mode(&self) -> BlendMode {
        self.cfg.blend_mode
    }

    /// Bind `set` as the primary unit.
    ///
    /// Refuses sets that fail [`OverrideSet::validate`] or that target a bone
    /// the binder cannot resolve.
    pub fn bind<B: StreamBinder + ?Sized>(
        &self,
        set: &OverrideSet,
        binder: &mut B,
    ) -> Result<BoundEvaluator> {
        self.bind_unit(set, 0, binder)
    }

    /// Resolve handles, capture the bind pose, and size working buffers for
    /// rig unit `unit`, reading that unit's weight channels.
    pub fn bind_unit<B: StreamBinder + ?Sized>(
        &self,
        set: &OverrideSet,
        unit: usize,
        binder: &mut B,
    ) -> Result<BoundEvaluator> {
        set.validate()?;
        let n = set.len();
        let mut bound = BoundEvaluator {
            mode: self.cfg.blend_mode,
            unit,
            targets: Vec::with_capacity(n),
            handles: Vec::with_capacity(n),
            default_positions: Vec::with_capacity(n),
            default_scales: Vec::with_capacity(n),
            override_positions: Vec::with_capacity(n),
            override_scales: Vec::with_capacity(n),
            entry_weights: Vec::with_capacity(n),
            weight_handles: Vec::new(),
            weight_buffer: Vec::new(),
            global_weight: WeightSource::Fixed(set.weight()),
        };

        for (index, entry) in set.entries().iter().enumerate() {
            let unresolved = InvalidSetReason::UnresolvedBone {
                index,
                bone: entry.target,
            };
            let handle = binder.bind_read_write(entry.target).ok_or(unresolved.clone())?;
            let pose = binder.bind_pose(entry.target).ok_or(unresolved)?;

            bound.targets.push(entry.target);
            bound.handles.push(handle);
            bound.default_positions.push(pose.position);
            bound.default_scales.push(pose.scale);
            bound.override_positions.push(entry.position);
            bound.override_scales.push(entry.scale);

            match binder.bind_property(&self.cfg.unit_entry_weight_property(unit, index)) {
                Some(h) => {
                    bound.weight_handles.push(h);
                    bound.entry_weights.push(WeightSource::Channel(h));
                }
                None => bound
                    .entry_weights
                    .push(WeightSource::Fixed(set.entry_weight(index))),
            }
        }
        bound.weight_buffer = vec![0.0; bound.weight_handles.len()];

        if let Some(h) = binder.bind_property(&self.cfg.unit_weight_property(unit)) {
            bound.global_weight = WeightSource::Channel(h);
        }

        log::debug!(
            "bound {} override entries in unit {} ({:?}, {} weight channels)",
            n,
            unit,
            self.cfg.blend_mode,
            bound.weight_handles.len()
        );
        Ok(bound)
    }

    /// Bind one evaluator per non-empty unit of `rig`, primary first.
    ///
    /// Unit numbers follow the rig's layout, so skipped empty units do not
    /// shift the channels of later ones.
    pub fn bind_rig<B: StreamBinder + ?Sized>(
        &self,
        rig: &OverrideRig,
        binder: &mut B,
    ) -> Result<Vec<BoundEvaluator>> {
        rig.validate()?;
        rig.units()
            .enumerate()
            .filter(|(_, u)| !u.is_empty())
            .map(|(unit, u)| self.bind_unit(u, unit, binder))
            .collect()
    }

    /// Release a bound evaluator's handle tables and buffers.
    pub fn unbind(&self, bound: BoundEvaluator) {
        log::debug!("unbound {} override entries", bound.len());
        drop(bound);
    }

    /// Unbind `bound` and bind `set` afresh in the same unit slot.
    pub fn rebind<B: StreamBinder + ?Sized>(
        &self,
        bound: BoundEvaluator,
        set: &OverrideSet,
        binder: &mut B,
    ) -> Result<BoundEvaluator> {
        let unit = bound.unit;
        self.unbind(bound);
        self.bind_unit(set, unit, binder)
    }
}

impl BoundEvaluator {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn mode(&self) -> BlendMode {
        self.mode
    }

    /// Rig unit this evaluator was bound as (0 is the primary).
    pub fn unit(&self) -> usize {
        self.unit
    }

    pub fn targets(&self) -> &[BoneId] {
        &self.targets
    }

    /// Bone list or length of `set` differs from what was bound.
    pub fn needs_rebind(&self, set: &OverrideSet) -> bool {
        set.len() != self.targets.len() || !set.targets().eq(self.targets.iter().copied())
    }

    /// Blend every entry into `stream`, in bone-list order.
    pub fn evaluate<S: PoseStream + ?Sized>(&mut self, stream: &mut S) {
        self.evaluate_scaled(stream, 1.0);
    }

    /// [`evaluate`](Self::evaluate) with the unit's global weight multiplied
    /// by `master` (clamped to `[0, 1]`).
    pub fn evaluate_scaled<S: PoseStream + ?Sized>(&mut self, stream: &mut S, master: f32) {
        stream.read_floats(&self.weight_handles, &mut self.weight_buffer);
        let global = match self.global_weight {
            WeightSource::Channel(h) => stream.read_float(h),
            WeightSource::Fixed(v) => v,
        }
        .clamp(0.0, 1.0)
            * master.clamp(0.0, 1.0);

        let mut channel = 0usize;
        for i in 0..self.handles.len() {
            let entry_weight = match self.entry_weights[i] {
                WeightSource::Channel(_) => {
                    let w = self.weight_buffer[channel];
                    channel += 1;
                    w
                }
                WeightSource::Fixed(v) => v,
            };
            let w = entry_weight.clamp(0.0, 1.0) * global;
            let handle = self.handles[i];

            let scale = blend_absolute(self.default_scales[i], self.override_scales[i], w);
            stream.write_scale(handle, scale);

            let position = match self.mode {
                BlendMode::Absolute => {
                    blend_absolute(self.default_positions[i], self.override_positions[i], w)
                }
                BlendMode::OffsetAdditive => {
                    let current = stream.read_position(handle.read_only());
                    blend_offset(
                        current,
                        self.default_positions[i],
                        self.override_positions[i],
                        w,
                    )
                }
            };
            stream.write_position(handle, position);
        }
    }

    /// Stored weight used for entry `index`; `None` when it is read from a channel.
    pub fn fixed_weight(&self, index: usize) -> Option<f32> {
        match self.entry_weights.get(index)? {
            WeightSource::Fixed(v) => Some(*v),
            WeightSource::Channel(_) => None,
        }
    }
}
