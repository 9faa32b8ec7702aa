//! Partitioning of candidate entries into capacity-bounded units.

use serde::Serialize;

use crate::config::OverflowPolicy;
use crate::override_set::{OverrideEntry, OverrideRig, OverrideSet, MAX_ENTRIES};

/// Host object that owns a primary override unit and sibling units.
///
/// [`OverrideRig`] is the in-memory implementation; engine adapters can
/// implement this over their own component storage.
pub trait OverrideUnitHost {
    fn primary_mut(&mut self) -> &mut OverrideSet;
    fn sibling_count(&self) -> usize;
    fn sibling_mut(&mut self, index: usize) -> Option<&mut OverrideSet>;
    fn add_sibling(&mut self, set: OverrideSet);
    /// Remove siblings from `len` onward.
    fn truncate_siblings(&mut self, len: usize);
}

impl OverrideUnitHost for OverrideRig {
    fn primary_mut(&mut self) -> &mut OverrideSet {
        &mut self.primary
    }

    fn sibling_count(&self) -> usize {
        self.siblings.len()
    }

    fn sibling_mut(&mut self, index: usize) -> Option<&mut OverrideSet> {
        self.siblings.get_mut(index)
    }

    fn add_sibling(&mut self, set: OverrideSet) {
        self.siblings.push(set);
    }

    fn truncate_siblings(&mut self, len: usize) {
        self.siblings.truncate(len);
    }
}

/// Outcome of writing candidates into a host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    /// Units holding data after the write (1 when empty: the cleared primary).
    pub units: usize,
    pub entries: usize,
    /// Candidates that were not stored (only under [`OverflowPolicy::Truncate`]).
    pub dropped: usize,
    pub siblings_added: usize,
    pub siblings_removed: usize,
}

impl SplitReport {
    pub fn capacity_exceeded(&self) -> bool {
        self.entries + self.dropped > MAX_ENTRIES
    }
}

/// Splits candidate entries into `ceil(n / MAX_ENTRIES)` sets in input order.
#[derive(Copy, Clone, Debug, Default)]
pub struct OverflowSplitter {
    pub policy: OverflowPolicy,
}

impl OverflowSplitter {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self { policy }
    }

    /// Pure partition: set 0 holds entries `[0, 8)`, set 1 the next eight, and so on.
    /// Empty input yields no sets. Later duplicates of a target are discarded.
    pub fn split(entries: Vec<OverrideEntry>) -> Vec<OverrideSet> {
        let mut seen = hashbrown::HashSet::with_capacity(entries.len());
        let unique: Vec<OverrideEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.target))
            .collect();
        unique
            .chunks(MAX_ENTRIES)
            .map(|chunk| OverrideSet::fill(chunk.iter().copied()).0)
            .collect()
    }

    /// Write `entries` into `host` following the policy.
    ///
    /// The first set replaces the primary's entries; later sets update existing
    /// siblings or are added as new ones (inheriting the primary's weight).
    /// Siblings past what is needed are removed.
    pub fn commit<H: OverrideUnitHost + ?Sized>(
        &self,
        host: &mut H,
        entries: Vec<OverrideEntry>,
    ) -> SplitReport {
        let mut sets = Self::split(entries);
        let candidates: usize = sets.iter().map(OverrideSet::len).sum();
        let mut report = SplitReport::default();

        if self.policy == OverflowPolicy::Truncate && sets.len() > 1 {
            let kept = sets[0].len();
            sets.truncate(1);
            report.dropped = candidates - kept;
            log::warn!(
                "{} deviated bones exceed capacity {}; only the first {} were stored",
                candidates,
                MAX_ENTRIES,
                kept
            );
        }

        let mut iter = sets.into_iter();
        let primary = host.primary_mut();
        let weight = primary.weight();
        match iter.next() {
            Some(first) => {
                report.entries += first.len();
                primary.replace_entries(first.entries().to_vec());
            }
            None => primary.clear(),
        }

        let mut used = 0usize;
        for set in iter {
            report.entries += set.len();
            match host.sibling_mut(used) {
                Some(existing) => {
                    existing.replace_entries(set.entries().to_vec());
                }
                None => {
                    let mut fresh = set;
                    fresh.set_weight(weight);
                    host.add_sibling(fresh);
                    report.siblings_added += 1;
                }
            }
            used += 1;
        }

        let before = host.sibling_count();
        host.truncate_siblings(used);
        report.siblings_removed = before.saturating_sub(used);
        report.units = 1 + used;

        log::debug!(
            "override split: {} entries in {} units (+{} / -{} siblings, {} dropped)",
            report.entries,
            report.units,
            report.siblings_added,
            report.siblings_removed,
            report.dropped
        );
        report
    }
}
