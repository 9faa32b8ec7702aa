//! Core configuration for vizij-pose-override-core.

use serde::{Deserialize, Serialize};

use crate::blend::BlendMode;

/// Default noise floor for deviation detection (local units).
pub const DEFAULT_DEVIATION_THRESHOLD: f32 = 0.1;

/// What to do with deviations beyond the capacity of one override unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Keep the first `MAX_ENTRIES` and drop the rest with a diagnostic.
    Truncate,
    /// Spill the excess into sibling units.
    #[default]
    Split,
}

/// Editor and runtime tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Position/scale distance above which a bone counts as edited.
    pub deviation_threshold: f32,
    pub overflow: OverflowPolicy,
    /// Blend semantics used by evaluators the editor binds.
    pub blend_mode: BlendMode,
    /// Stream property carrying the global weight.
    pub weight_property: String,
    /// Prefix for per-entry weight channels: `<prefix>.<index>.weight`.
    pub entry_weight_prefix: String,
    /// Namespace for sibling unit channels: `<prefix>.<unit>.<channel>`.
    pub unit_prefix: String,
    /// Separator used when building relative hierarchy paths.
    pub path_separator: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deviation_threshold: DEFAULT_DEVIATION_THRESHOLD,
            overflow: OverflowPolicy::default(),
            blend_mode: BlendMode::default(),
            weight_property: "weight".to_string(),
            entry_weight_prefix: "entries".to_string(),
            unit_prefix: "units".to_string(),
            path_separator: '/',
        }
    }
}

impl Config {
    /// Name of the stream channel holding the weight of entry `index`.
    pub fn entry_weight_property(&self, index: usize) -> String {
        format!("{}.{index}.weight", self.entry_weight_prefix)
    }

    /// Global weight channel of rig unit `unit` (0 is the primary).
    pub fn unit_weight_property(&self, unit: usize) -> String {
        match unit {
            0 => self.weight_property.clone(),
            _ => format!("{}.{unit}.{}", self.unit_prefix, self.weight_property),
        }
    }

    /// Weight channel of entry `index` within rig unit `unit`.
    pub fn unit_entry_weight_property(&self, unit: usize, index: usize) -> String {
        match unit {
            0 => self.entry_weight_property(index),
            _ => format!("{}.{unit}.{}", self.unit_prefix, self.entry_weight_property(index)),
        }
    }
}
