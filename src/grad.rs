//! Gradient statistics
//!
//! Accumulated first and second order loss derivatives for one histogram
//! bucket or partial sum. The variant is selected once from the configured
//! class count and never changes within a run; combining different variants
//! is a configuration error and fails fast.
use crate::params::GbdtParams;
use crate::utils::{dot, packed_index, solve_regularized};
use serde::{Deserialize, Serialize};

const VARIANT_MISMATCH: &str = "Binary and multiclass gradient statistics combined in one run.";
const HESSIAN_MISMATCH: &str = "Diagonal and full hessian statistics combined in one run.";

/// Hessian representation for multiclass statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MultiHess {
    /// One entry per class.
    Diagonal(Vec<f32>),
    /// Full symmetric matrix in lower triangular packed storage,
    /// `num_class * (num_class + 1) / 2` entries.
    Full(Vec<f32>),
}

/// Accumulated gradient and hessian statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GradStats {
    /// Scalar statistics for two-class training.
    Binary { grad: f32, hess: f32 },
    /// Per-class statistics for multiclass training.
    Multi { grad: Vec<f32>, hess: MultiHess },
}

impl GradStats {
    /// Fresh zeroed statistics matching the configured variant.
    pub fn zero(params: &GbdtParams) -> Self {
        if params.num_class == 2 {
            GradStats::Binary { grad: 0.0, hess: 0.0 }
        } else {
            let c = params.num_class;
            let hess = if params.full_hessian {
                MultiHess::Full(vec![0.0; c * (c + 1) / 2])
            } else {
                MultiHess::Diagonal(vec![0.0; c])
            };
            GradStats::Multi { grad: vec![0.0; c], hess }
        }
    }

    /// Fold `other` into the receiver, element-wise.
    pub fn accumulate(&mut self, other: &GradStats) {
        match (self, other) {
            (GradStats::Binary { grad, hess }, GradStats::Binary { grad: g, hess: h }) => {
                *grad += g;
                *hess += h;
            }
            (GradStats::Multi { grad, hess }, GradStats::Multi { grad: g, hess: h }) => {
                add_assign(grad, g);
                match (hess, h) {
                    (MultiHess::Diagonal(hess), MultiHess::Diagonal(h)) => add_assign(hess, h),
                    (MultiHess::Full(hess), MultiHess::Full(h)) => add_assign(hess, h),
                    _ => panic!("{}", HESSIAN_MISMATCH),
                }
            }
            _ => panic!("{}", VARIANT_MISMATCH),
        }
    }

    /// Remove `other` from the receiver, element-wise.
    pub fn remove(&mut self, other: &GradStats) {
        match (self, other) {
            (GradStats::Binary { grad, hess }, GradStats::Binary { grad: g, hess: h }) => {
                *grad -= g;
                *hess -= h;
            }
            (GradStats::Multi { grad, hess }, GradStats::Multi { grad: g, hess: h }) => {
                sub_assign(grad, g);
                match (hess, h) {
                    (MultiHess::Diagonal(hess), MultiHess::Diagonal(h)) => sub_assign(hess, h),
                    (MultiHess::Full(hess), MultiHess::Full(h)) => sub_assign(hess, h),
                    _ => panic!("{}", HESSIAN_MISMATCH),
                }
            }
            _ => panic!("{}", VARIANT_MISMATCH),
        }
    }

    /// New statistics holding `self - other`.
    pub fn subtract(&self, other: &GradStats) -> GradStats {
        let mut out = self.clone();
        out.remove(other);
        out
    }

    /// Regularized gain for the instances covered by these statistics.
    ///
    /// Binary and diagonal multiclass use the closed form
    /// `0.5 * g^2 / (h + lambda)` per class; the full hessian case solves the
    /// regularized Newton system for `0.5 * g^T (H + lambda I)^-1 g`.
    pub fn gain(&self, params: &GbdtParams) -> f32 {
        match self {
            GradStats::Binary { grad, hess } => 0.5 * grad * grad / (hess + params.reg_lambda),
            GradStats::Multi {
                grad,
                hess: MultiHess::Diagonal(hess),
            } => grad
                .iter()
                .zip(hess.iter())
                .map(|(g, h)| 0.5 * g * g / (h + params.reg_lambda))
                .sum(),
            GradStats::Multi {
                grad,
                hess: MultiHess::Full(hess),
            } => {
                let x = solve_regularized(hess, grad, params.reg_lambda);
                0.5 * dot(grad, &x)
            }
        }
    }

    /// Hessian sum covered by these statistics; the trace for full
    /// hessian statistics.
    pub fn hessian_sum(&self) -> f32 {
        match self {
            GradStats::Binary { hess, .. } => *hess,
            GradStats::Multi {
                hess: MultiHess::Diagonal(hess),
                ..
            } => hess.iter().sum(),
            GradStats::Multi {
                grad,
                hess: MultiHess::Full(hess),
            } => (0..grad.len()).map(|i| hess[packed_index(i, i)]).sum(),
        }
    }

    /// Whether the hessian weight clears the minimum child weight floor.
    pub fn satisfy_weight(&self, params: &GbdtParams) -> bool {
        self.hessian_sum() >= params.min_child_weight
    }
}

#[inline]
fn add_assign(x: &mut [f32], y: &[f32]) {
    debug_assert_eq!(x.len(), y.len());
    x.iter_mut().zip(y.iter()).for_each(|(x_, y_)| *x_ += y_);
}

#[inline]
fn sub_assign(x: &mut [f32], y: &[f32]) {
    debug_assert_eq!(x.len(), y.len());
    x.iter_mut().zip(y.iter()).for_each(|(x_, y_)| *x_ -= y_);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi_params(full_hessian: bool) -> GbdtParams {
        GbdtParams {
            num_class: 3,
            full_hessian,
            reg_lambda: 1.0,
            min_child_weight: 0.0,
        }
    }

    #[test]
    fn test_binary_accumulate_remove() {
        let mut stats = GradStats::zero(&GbdtParams::default());
        stats.accumulate(&GradStats::Binary { grad: 1.0, hess: 2.0 });
        stats.accumulate(&GradStats::Binary { grad: -3.0, hess: 1.0 });
        assert_eq!(stats, GradStats::Binary { grad: -2.0, hess: 3.0 });
        stats.remove(&GradStats::Binary { grad: 1.0, hess: 2.0 });
        assert_eq!(stats, GradStats::Binary { grad: -3.0, hess: 1.0 });
    }

    #[test]
    fn test_subtract_leaves_receiver_untouched() {
        let total = GradStats::Binary { grad: 2.0, hess: 3.0 };
        let left = GradStats::Binary { grad: -2.0, hess: 1.0 };
        let right = total.subtract(&left);
        assert_eq!(right, GradStats::Binary { grad: 4.0, hess: 2.0 });
        assert_eq!(total, GradStats::Binary { grad: 2.0, hess: 3.0 });
    }

    #[test]
    fn test_binary_gain() {
        let params = GbdtParams::default();
        let stats = GradStats::Binary { grad: 2.0, hess: 3.0 };
        // 0.5 * 4 / (3 + 1)
        assert!((stats.gain(&params) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_multi_diagonal_gain() {
        let params = multi_params(false);
        let stats = GradStats::Multi {
            grad: vec![1.0, 2.0, 3.0],
            hess: MultiHess::Diagonal(vec![1.0, 1.0, 1.0]),
        };
        // 0.5 * (1/2 + 4/2 + 9/2)
        assert!((stats.gain(&params) - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_full_hessian_gain_matches_diagonal_case() {
        let diag = GradStats::Multi {
            grad: vec![1.0, 2.0, 3.0],
            hess: MultiHess::Diagonal(vec![1.0, 2.0, 4.0]),
        };
        let full = GradStats::Multi {
            grad: vec![1.0, 2.0, 3.0],
            hess: MultiHess::Full(vec![1.0, 0.0, 2.0, 0.0, 0.0, 4.0]),
        };
        let g_diag = diag.gain(&multi_params(false));
        let g_full = full.gain(&multi_params(true));
        assert!((g_diag - g_full).abs() < 1e-5);
    }

    #[test]
    fn test_hessian_sum_and_weight_floor() {
        let params = GbdtParams {
            min_child_weight: 2.5,
            ..Default::default()
        };
        assert!(GradStats::Binary { grad: 0.0, hess: 3.0 }.satisfy_weight(&params));
        assert!(!GradStats::Binary { grad: 0.0, hess: 2.0 }.satisfy_weight(&params));

        let full = GradStats::Multi {
            grad: vec![0.0, 0.0, 0.0],
            hess: MultiHess::Full(vec![1.0, 9.0, 2.0, 9.0, 9.0, 4.0]),
        };
        // Trace only, off-diagonal entries do not count as weight.
        assert_eq!(full.hessian_sum(), 7.0);
    }

    #[test]
    fn test_zero_matches_configuration() {
        let full = GradStats::zero(&multi_params(true));
        match full {
            GradStats::Multi {
                grad,
                hess: MultiHess::Full(hess),
            } => {
                assert_eq!(grad.len(), 3);
                assert_eq!(hess.len(), 6);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    #[should_panic(expected = "Binary and multiclass")]
    fn test_variant_mismatch_fails_fast() {
        let mut stats = GradStats::Binary { grad: 0.0, hess: 0.0 };
        stats.accumulate(&GradStats::Multi {
            grad: vec![0.0; 3],
            hess: MultiHess::Diagonal(vec![0.0; 3]),
        });
    }

    #[test]
    fn test_serde_round_trip() {
        let stats = GradStats::Multi {
            grad: vec![0.25, -1.5, 3.0],
            hess: MultiHess::Diagonal(vec![1.0, 2.0, 3.0]),
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: GradStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, back);
    }
}
