//! Ground-truth oracle.
//!
//! Maps a pair of current region labels to an edge label. The numeric
//! convention is inherited from stored models and must not be flipped:
//! `-1` = same body (merge correct), `+1` = different bodies (keep apart),
//! `0` / `None` = undecidable.

use agglo_core::Label;
use std::collections::{HashMap, HashSet};

/// Decision for a candidate edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLabel {
    /// Same true body; the merge is correct (numeric -1)
    Merge,
    /// Distinct true bodies; do not merge (numeric +1)
    Keep,
}

impl EdgeLabel {
    pub fn as_i32(self) -> i32 {
        match self {
            EdgeLabel::Merge => -1,
            EdgeLabel::Keep => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        self.as_i32() as f64
    }

    /// Map a classifier probability onto a class: above the threshold the
    /// edge reads as a true boundary (`Keep`), otherwise as `Merge`.
    pub fn from_prob(prob: f64, threshold: f64) -> Self {
        if prob > threshold {
            EdgeLabel::Keep
        } else {
            EdgeLabel::Merge
        }
    }
}

/// Dominant ground-truth body per region, with an optional mitochondrial
/// override.
#[derive(Debug, Clone, Default)]
pub struct GroundTruthOracle {
    assignment: HashMap<Label, u32>,
    mito: HashSet<Label>,
    mito_override: bool,
}

impl GroundTruthOracle {
    /// Build from a precomputed region-to-body assignment
    pub fn from_assignment(assignment: HashMap<Label, u32>) -> Self {
        Self {
            assignment,
            mito: HashSet::new(),
            mito_override: false,
        }
    }

    /// Build from overlap counts between regions and ground-truth bodies.
    ///
    /// A region is dominantly assigned to the body with the strictly
    /// largest overlap; body 0 (background) never dominates, and a tie
    /// leaves the region unassigned.
    pub fn from_overlaps(overlaps: &HashMap<Label, HashMap<u32, u64>>) -> Self {
        let mut assignment = HashMap::new();
        for (&region, counts) in overlaps {
            let mut best: Option<(u32, u64)> = None;
            let mut tied = false;
            for (&body, &count) in counts {
                if body == 0 {
                    continue;
                }
                match best {
                    None => best = Some((body, count)),
                    Some((_, best_count)) if count > best_count => {
                        best = Some((body, count));
                        tied = false;
                    }
                    Some((_, best_count)) if count == best_count => tied = true,
                    Some(_) => {}
                }
            }
            if let Some((body, _)) = best {
                if !tied {
                    assignment.insert(region, body);
                }
            }
        }
        Self::from_assignment(assignment)
    }

    /// Turn on the mitochondrial override for the given regions: any edge
    /// touching one of them reads as `Keep` regardless of body agreement,
    /// so mitochondria stay separate for downstream rules.
    pub fn enable_mito_override(&mut self, regions: HashSet<Label>) {
        self.mito = regions;
        self.mito_override = true;
    }

    pub fn is_mito(&self, region: Label) -> bool {
        self.mito.contains(&region)
    }

    /// Dominant body of a region, if any
    pub fn assignment_of(&self, region: Label) -> Option<u32> {
        self.assignment.get(&region).copied()
    }

    /// Edge label for the current labels of a candidate edge
    pub fn edge_label(&self, l1: Label, l2: Label) -> Option<EdgeLabel> {
        if self.mito_override && (self.is_mito(l1) || self.is_mito(l2)) {
            return Some(EdgeLabel::Keep);
        }
        match (self.assignment_of(l1), self.assignment_of(l2)) {
            (Some(a), Some(b)) if a == b => Some(EdgeLabel::Merge),
            (Some(_), Some(_)) => Some(EdgeLabel::Keep),
            _ => None,
        }
    }
}
