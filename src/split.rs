//! Split candidates
//!
//! Descriptors for the split chosen at a node, and the best-so-far candidate
//! merged across the sampled features. The driver routes instances left or
//! right by threshold comparison for point splits, and by edge list side
//! lookup for set splits.
use crate::grad::GradStats;
use serde::{Deserialize, Serialize};

/// Side of a split a bucket or instance is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn flip(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Numeric threshold split for a continuous feature. Instances with values
/// below `value` are routed left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPoint {
    pub feature: usize,
    pub value: f32,
    pub gain: f32,
}

/// Bucket grouping split for a categorical feature, stored as an alternating
/// side edge list rather than an explicit per-bucket membership set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSet {
    pub feature: usize,
    pub gain: f32,
    /// Split-array values recorded at each direction change; the first entry
    /// is always negative infinity.
    pub edges: Vec<f32>,
    /// Side taken by the run of buckets before the first recorded change.
    pub first_flow: Side,
    /// Side the default bucket is grouped with.
    pub default_to: Side,
}

impl SplitSet {
    /// Reconstruct the side for a category value from the alternating edge
    /// list: sides alternate starting at `first_flow`, switching at every
    /// recorded edge.
    pub fn flow_to(&self, value: f32) -> Side {
        // edges[0] is -inf, so at least one edge is always crossed.
        let crossed = self.edges.partition_point(|e| *e <= value);
        if (crossed - 1) % 2 == 0 {
            self.first_flow
        } else {
            self.first_flow.flip()
        }
    }
}

/// The split descriptor of a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitEntry {
    Point(SplitPoint),
    Set(SplitSet),
}

impl SplitEntry {
    pub fn feature(&self) -> usize {
        match self {
            SplitEntry::Point(p) => p.feature,
            SplitEntry::Set(s) => s.feature,
        }
    }

    pub fn gain(&self) -> f32 {
        match self {
            SplitEntry::Point(p) => p.gain,
            SplitEntry::Set(s) => s.gain,
        }
    }
}

/// Best-so-far split candidate for one node.
///
/// The empty value (no descriptor, gain negative infinity) means no usable
/// split was found; the driver finalizes the node as a leaf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GbtSplit {
    pub entry: Option<SplitEntry>,
    pub left_stats: Option<GradStats>,
    pub right_stats: Option<GradStats>,
}

impl GbtSplit {
    pub fn empty() -> Self {
        GbtSplit::default()
    }

    pub fn new(entry: SplitEntry, left_stats: GradStats, right_stats: GradStats) -> Self {
        GbtSplit {
            entry: Some(entry),
            left_stats: Some(left_stats),
            right_stats: Some(right_stats),
        }
    }

    /// Whether a usable split was found.
    pub fn is_valid(&self) -> bool {
        self.entry.is_some()
    }

    pub fn gain(&self) -> f32 {
        match &self.entry {
            Some(entry) => entry.gain(),
            None => f32::NEG_INFINITY,
        }
    }

    /// Pure reduction keeping the strictly better candidate. Ties keep the
    /// receiver, so folding in sampled-feature order is deterministic.
    pub fn winner(self, challenger: GbtSplit) -> GbtSplit {
        if challenger.gain() > self.gain() {
            challenger
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(feature: usize, gain: f32) -> GbtSplit {
        GbtSplit::new(
            SplitEntry::Point(SplitPoint {
                feature,
                value: 0.5,
                gain,
            }),
            GradStats::Binary { grad: 0.0, hess: 1.0 },
            GradStats::Binary { grad: 0.0, hess: 1.0 },
        )
    }

    #[test]
    fn test_empty_sentinel() {
        let empty = GbtSplit::empty();
        assert!(!empty.is_valid());
        assert_eq!(empty.gain(), f32::NEG_INFINITY);
    }

    #[test]
    fn test_winner_replaces_empty() {
        let best = GbtSplit::empty().winner(point(3, -5.0));
        // Even a negative gain replaces the sentinel.
        assert!(best.is_valid());
        assert_eq!(best.entry.as_ref().unwrap().feature(), 3);
    }

    #[test]
    fn test_winner_tie_keeps_receiver() {
        let best = point(1, 2.0).winner(point(2, 2.0));
        assert_eq!(best.entry.as_ref().unwrap().feature(), 1);
        let best = point(1, 2.0).winner(point(2, 2.5));
        assert_eq!(best.entry.as_ref().unwrap().feature(), 2);
    }

    #[test]
    fn test_flow_to_alternates_from_first_flow() {
        let set = SplitSet {
            feature: 0,
            gain: 1.0,
            edges: vec![f32::NEG_INFINITY, 3.0, 7.0],
            first_flow: Side::Left,
            default_to: Side::Left,
        };
        assert_eq!(set.flow_to(1.0), Side::Left);
        assert_eq!(set.flow_to(3.0), Side::Right);
        assert_eq!(set.flow_to(5.0), Side::Right);
        assert_eq!(set.flow_to(7.0), Side::Left);
        assert_eq!(set.flow_to(10.0), Side::Left);
    }

    #[test]
    fn test_flow_to_right_first() {
        let set = SplitSet {
            feature: 0,
            gain: 1.0,
            edges: vec![f32::NEG_INFINITY, 4.0],
            first_flow: Side::Right,
            default_to: Side::Left,
        };
        assert_eq!(set.flow_to(0.0), Side::Right);
        assert_eq!(set.flow_to(4.0), Side::Left);
    }

    #[test]
    fn test_serde_round_trip() {
        let split = point(5, 1.25);
        let json = serde_json::to_string(&split).unwrap();
        let back: GbtSplit = serde_json::from_str(&json).unwrap();
        assert_eq!(split, back);
    }
}
