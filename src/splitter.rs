//! Split finding
//!
//! Chooses the best feature split for one frontier node from its per-feature
//! histograms: a numeric threshold for continuous features, a bucket
//! grouping for categorical features. Continuous features are scanned with a
//! single left-to-right prefix pass; categorical features use a linear-time
//! greedy grouping instead of the combinatorial partition search. Each call
//! is self-contained and reads the histograms only, so independent calls may
//! run concurrently on shared histogram data.
use crate::errors::SplitError;
use crate::grad::GradStats;
use crate::histogram::{FeatureInfo, FeatureMeta, Histogram};
use crate::params::GbdtParams;
use crate::split::{GbtSplit, Side, SplitEntry, SplitPoint, SplitSet};
use log::{debug, trace};
use rayon::prelude::*;
use rayon::ThreadPool;

/// Finds the best split for a frontier node from its per-feature histograms.
pub struct SplitFinder {
    params: GbdtParams,
}

impl SplitFinder {
    /// Create a split finder, failing fast on invalid parameters.
    pub fn new(params: GbdtParams) -> Result<Self, SplitError> {
        params.validate()?;
        Ok(SplitFinder { params })
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    /// Find the best split across the sampled features of one node.
    ///
    /// `histograms` is indexed parallel to `sampled_feats`; an absent entry
    /// means the feature has no usable histogram at this node (for example a
    /// constant feature) and is skipped. Candidates merge with strict
    /// greater-than on gain, so on ties the earlier sampled feature wins.
    /// Returns the empty sentinel when no feature yields a usable split.
    pub fn find_best_split(
        &self,
        sampled_feats: &[usize],
        histograms: &[Option<Histogram>],
        feature_info: &FeatureInfo,
        sum_grad_stats: &GradStats,
        node_gain: f32,
    ) -> Result<GbtSplit, SplitError> {
        let mut best = GbtSplit::empty();
        for (fid, histogram) in sampled_feats.iter().zip(histograms.iter()) {
            let histogram = match histogram {
                Some(h) => h,
                None => {
                    trace!("feature {} has no histogram, skipping", fid);
                    continue;
                }
            };
            let meta = self.feature_meta(*fid, histogram, feature_info)?;
            let candidate = self.find_best_split_of_one_feature(*fid, meta, histogram, sum_grad_stats, node_gain);
            best = best.winner(candidate);
        }
        if let Some(entry) = &best.entry {
            debug!("best split: feature {} gain {}", entry.feature(), entry.gain());
        }
        Ok(best)
    }

    /// Parallel variant of [`SplitFinder::find_best_split`]: features are
    /// evaluated on the given pool and reduced in sampled order, so the
    /// result is identical to the sequential loop, tie-breaking included.
    pub fn find_best_split_parallel(
        &self,
        sampled_feats: &[usize],
        histograms: &[Option<Histogram>],
        feature_info: &FeatureInfo,
        sum_grad_stats: &GradStats,
        node_gain: f32,
        pool: &ThreadPool,
    ) -> Result<GbtSplit, SplitError> {
        let candidates: Vec<Result<GbtSplit, SplitError>> = pool.install(|| {
            sampled_feats
                .par_iter()
                .zip(histograms.par_iter())
                .map(|(fid, histogram)| match histogram {
                    None => Ok(GbtSplit::empty()),
                    Some(h) => {
                        let meta = self.feature_meta(*fid, h, feature_info)?;
                        Ok(self.find_best_split_of_one_feature(*fid, meta, h, sum_grad_stats, node_gain))
                    }
                })
                .collect()
        });
        let mut best = GbtSplit::empty();
        for candidate in candidates {
            best = best.winner(candidate?);
        }
        if let Some(entry) = &best.entry {
            debug!("best split: feature {} gain {}", entry.feature(), entry.gain());
        }
        Ok(best)
    }

    fn feature_meta<'a>(
        &self,
        fid: usize,
        histogram: &Histogram,
        feature_info: &'a FeatureInfo,
    ) -> Result<&'a FeatureMeta, SplitError> {
        let meta = feature_info.get(fid).ok_or(SplitError::UnknownFeature(fid))?;
        if histogram.num_bin() != meta.num_bin() {
            return Err(SplitError::HistogramShape(fid, histogram.num_bin(), meta.splits.len()));
        }
        Ok(meta)
    }

    /// Dispatch one feature to the point or set search.
    pub fn find_best_split_of_one_feature(
        &self,
        fid: usize,
        meta: &FeatureMeta,
        histogram: &Histogram,
        sum_grad_stats: &GradStats,
        node_gain: f32,
    ) -> GbtSplit {
        if meta.is_categorical {
            self.find_best_split_set(fid, &meta.splits, meta.default_bin, histogram, sum_grad_stats, node_gain)
        } else {
            self.find_best_split_point(fid, &meta.splits, histogram, sum_grad_stats, node_gain)
        }
    }

    /// Scan the cut positions of a continuous feature left to right, keeping
    /// running prefix and suffix statistics. The candidate at cut `i` sends
    /// buckets `0..=i` left with threshold `splits[i + 1]`.
    ///
    /// The best scoring cut is kept even at a non-positive score, matching
    /// the sentinel's negative-infinity starting gain; the positivity floor
    /// applies to the categorical path only.
    fn find_best_split_point(
        &self,
        fid: usize,
        splits: &[f32],
        histogram: &Histogram,
        sum_grad_stats: &GradStats,
        node_gain: f32,
    ) -> GbtSplit {
        let mut left_stats = GradStats::zero(&self.params);
        let mut right_stats = sum_grad_stats.clone();
        let mut best = GbtSplit::empty();
        for i in 0..histogram.num_bin().saturating_sub(1) {
            left_stats.accumulate(histogram.get(i));
            right_stats.remove(histogram.get(i));
            if !(left_stats.satisfy_weight(&self.params) && right_stats.satisfy_weight(&self.params)) {
                continue;
            }
            let loss_chg =
                left_stats.gain(&self.params) + right_stats.gain(&self.params) - node_gain - self.params.reg_lambda;
            if loss_chg > best.gain() {
                best = GbtSplit::new(
                    SplitEntry::Point(SplitPoint {
                        feature: fid,
                        value: splits[i + 1],
                        gain: loss_chg,
                    }),
                    left_stats.clone(),
                    right_stats.clone(),
                );
            }
        }
        best
    }

    /// Greedy linear-time grouping of categorical buckets.
    ///
    /// The default bucket seeds the left side. Every other bucket is routed
    /// by [`bin_flow_to`] against the left side accumulated so far, folding
    /// left-flowing buckets in immediately, so the rule is order sensitive.
    /// Direction changes are recorded as an alternating edge list over the
    /// split-array values. The feature is rejected when every bucket joined
    /// the default side, and a set split is only accepted at a strictly
    /// positive score.
    fn find_best_split_set(
        &self,
        fid: usize,
        splits: &[f32],
        default_bin: usize,
        histogram: &Histogram,
        sum_grad_stats: &GradStats,
        node_gain: f32,
    ) -> GbtSplit {
        let mut left_stats = histogram.get(default_bin).clone();
        let mut first_flow: Option<Side> = None;
        let mut cur_flow = Side::Left;
        let mut cur_split_id = 0;
        let mut edges = vec![f32::NEG_INFINITY];
        for i in 0..histogram.num_bin() {
            if i == default_bin {
                continue;
            }
            let bin_stats = histogram.get(i);
            let flow = bin_flow_to(sum_grad_stats, &left_stats, bin_stats);
            if flow == Side::Left {
                left_stats.accumulate(bin_stats);
            }
            match first_flow {
                None => {
                    first_flow = Some(flow);
                    cur_flow = flow;
                }
                Some(_) if flow != cur_flow => {
                    edges.push(splits[cur_split_id]);
                    cur_flow = flow;
                }
                Some(_) => {}
            }
            cur_split_id += 1;
        }
        let first_flow = match first_flow {
            // Only the default bucket is present.
            None => return GbtSplit::empty(),
            Some(flow) => flow,
        };
        // Every bucket joined the default side, nothing to split on.
        if edges.len() == 1 && cur_flow == Side::Left {
            return GbtSplit::empty();
        }
        let right_stats = sum_grad_stats.subtract(&left_stats);
        if !(left_stats.satisfy_weight(&self.params) && right_stats.satisfy_weight(&self.params)) {
            return GbtSplit::empty();
        }
        let split_gain =
            left_stats.gain(&self.params) + right_stats.gain(&self.params) - node_gain - self.params.reg_lambda;
        // A categorical regrouping must show net positive benefit.
        if split_gain <= 0.0 {
            return GbtSplit::empty();
        }
        GbtSplit::new(
            SplitEntry::Set(SplitSet {
                feature: fid,
                gain: split_gain,
                edges,
                first_flow,
                default_to: Side::Left,
            }),
            left_stats,
            right_stats,
        )
    }
}

/// Route one categorical bucket against the left side accumulated so far.
///
/// The sign test compares the bucket's gradient with
/// `2 * left_grad + bin_grad - sum_grad`, per class as a dot product for
/// multiclass statistics. A non-negative value routes left; exact zero
/// routes left. Pure and deterministic, which underlies reproducible tree
/// structure.
pub fn bin_flow_to(sum_grad_stats: &GradStats, left_stats: &GradStats, bin_stats: &GradStats) -> Side {
    let correlation = match (sum_grad_stats, left_stats, bin_stats) {
        (
            GradStats::Binary { grad: sum_grad, .. },
            GradStats::Binary { grad: left_grad, .. },
            GradStats::Binary { grad: bin_grad, .. },
        ) => bin_grad * (2.0 * left_grad + bin_grad - sum_grad),
        (
            GradStats::Multi { grad: sum_grad, .. },
            GradStats::Multi { grad: left_grad, .. },
            GradStats::Multi { grad: bin_grad, .. },
        ) => bin_grad
            .iter()
            .zip(left_grad.iter())
            .zip(sum_grad.iter())
            .map(|((b, l), s)| b * (2.0 * l + b - s))
            .sum(),
        _ => panic!("Binary and multiclass gradient statistics combined in one run."),
    };
    if correlation >= 0.0 {
        Side::Left
    } else {
        Side::Right
    }
}
