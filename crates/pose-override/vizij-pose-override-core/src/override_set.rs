//! Bounded override data: entries, sets and the rig that hosts them.

use glam::Vec3;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidSetReason, PushError, Result};
use crate::ids::BoneId;

/// Capacity of one override unit; fixed by the weighted-transform storage format.
pub const MAX_ENTRIES: usize = 8;

/// Where `target` should end up at full weight.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub target: BoneId,
    pub position: Vec3,
    pub scale: Vec3,
}

impl OverrideEntry {
    pub fn new(target: BoneId, position: Vec3, scale: Vec3) -> Self {
        Self {
            target,
            position,
            scale,
        }
    }
}

fn default_weight() -> f32 {
    1.0
}

/// Ordered, capacity-limited list of entries plus their weights.
///
/// `push` keeps the invariants (at most [`MAX_ENTRIES`], unique targets);
/// deserialized sets are checked by [`OverrideSet::validate`] before binding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverrideSet {
    #[serde(default = "default_weight")]
    weight: f32,
    #[serde(default)]
    entries: Vec<OverrideEntry>,
    /// One weight per entry when present; absent means every entry at 1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entry_weights: Option<Vec<f32>>,
}

impl Default for OverrideSet {
    fn default() -> Self {
        Self::new()
    }
}

impl OverrideSet {
    pub fn new() -> Self {
        Self {
            weight: 1.0,
            entries: Vec::new(),
            entry_weights: None,
        }
    }

    pub fn with_weight(weight: f32) -> Self {
        Self {
            weight: weight.clamp(0.0, 1.0),
            ..Self::new()
        }
    }

    /// First `MAX_ENTRIES` entries of `entries`; the rest are returned.
    pub fn fill<I>(entries: I) -> (Self, Vec<OverrideEntry>)
    where
        I: IntoIterator<Item = OverrideEntry>,
    {
        let mut set = Self::new();
        let mut rest = Vec::new();
        for e in entries {
            if let Err(err) = set.push(e) {
                rest.push(err.into_entry());
            }
        }
        (set, rest)
    }

    pub fn push(&mut self, entry: OverrideEntry) -> std::result::Result<(), PushError> {
        if self.contains(entry.target) {
            return Err(PushError::DuplicateTarget(entry));
        }
        if self.is_full() {
            return Err(PushError::Full(entry));
        }
        self.entries.push(entry);
        if let Some(w) = self.entry_weights.as_mut() {
            w.push(1.0);
        }
        Ok(())
    }

    /// Replace the entries, keeping the global weight. Per-entry weights reset to 1.0.
    pub fn replace_entries(&mut self, entries: Vec<OverrideEntry>) -> Vec<OverrideEntry> {
        let (fresh, rest) = Self::fill(entries);
        self.entries = fresh.entries;
        self.entry_weights = None;
        rest
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.entry_weights = None;
    }

    pub fn entries(&self) -> &[OverrideEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_ENTRIES
    }

    pub fn contains(&self, bone: BoneId) -> bool {
        self.entries.iter().any(|e| e.target == bone)
    }

    pub fn targets(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.entries.iter().map(|e| e.target)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight.clamp(0.0, 1.0);
    }

    /// Stored weight of entry `index` (1.0 when no per-entry weights are kept).
    pub fn entry_weight(&self, index: usize) -> f32 {
        match &self.entry_weights {
            Some(w) => w.get(index).copied().unwrap_or(1.0),
            None => 1.0,
        }
    }

    pub fn set_entry_weight(&mut self, index: usize, weight: f32) {
        if index >= self.entries.len() {
            return;
        }
        let len = self.entries.len();
        let w = self.entry_weights.get_or_insert_with(|| vec![1.0; len]);
        if w.len() < len {
            w.resize(len, 1.0);
        }
        w[index] = weight.clamp(0.0, 1.0);
    }

    /// Structural checks: capacity, unique targets, weight array length.
    pub fn validate(&self) -> std::result::Result<(), InvalidSetReason> {
        if self.entries.len() > MAX_ENTRIES {
            return Err(InvalidSetReason::TooManyEntries {
                count: self.entries.len(),
                max: MAX_ENTRIES,
            });
        }
        if let Some(w) = &self.entry_weights {
            if w.len() != self.entries.len() {
                return Err(InvalidSetReason::WeightCountMismatch {
                    entries: self.entries.len(),
                    weights: w.len(),
                });
            }
        }
        let mut seen = HashSet::with_capacity(self.entries.len());
        for e in &self.entries {
            if !seen.insert(e.target) {
                return Err(InvalidSetReason::DuplicateTarget { bone: e.target });
            }
        }
        Ok(())
    }
}

/// A host object's override units: the primary one and any overflow siblings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideRig {
    pub primary: OverrideSet,
    #[serde(default)]
    pub siblings: Vec<OverrideSet>,
}

impl OverrideRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary first, then siblings in order.
    pub fn units(&self) -> impl Iterator<Item = &OverrideSet> + '_ {
        std::iter::once(&self.primary).chain(self.siblings.iter())
    }

    pub fn unit_count(&self) -> usize {
        1 + self.siblings.len()
    }

    pub fn entry_count(&self) -> usize {
        self.units().map(OverrideSet::len).sum()
    }

    /// Empty the primary and drop every sibling.
    pub fn clear(&mut self) {
        self.primary.clear();
        self.siblings.clear();
    }

    /// Every unit passes [`OverrideSet::validate`] and no bone appears in
    /// more than one unit.
    pub fn validate(&self) -> std::result::Result<(), InvalidSetReason> {
        let mut seen = HashSet::with_capacity(self.entry_count());
        for unit in self.units() {
            unit.validate()?;
            for bone in unit.targets() {
                if !seen.insert(bone) {
                    return Err(InvalidSetReason::DuplicateTarget { bone });
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
