//! Parameters
//!
//! Read-only configuration consulted by the split search. The class count is
//! fixed for a whole training run and selects the gradient statistics
//! variant once; every histogram passed into a search must use that variant.
use crate::errors::SplitError;
use serde::{Deserialize, Serialize};

/// Configuration for split finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtParams {
    /// Number of classes. A value of 2 selects the scalar gradient
    /// statistics path, larger values the per-class path.
    pub num_class: usize,
    /// Track the full hessian matrix instead of its diagonal for
    /// multiclass training.
    pub full_hessian: bool,
    /// L2 regularization applied to leaf weights.
    pub reg_lambda: f32,
    /// Minimum hessian sum required on each side of a split.
    pub min_child_weight: f32,
}

impl Default for GbdtParams {
    fn default() -> Self {
        GbdtParams {
            num_class: 2,
            full_hessian: false,
            reg_lambda: 1.0,
            min_child_weight: 0.0,
        }
    }
}

impl GbdtParams {
    /// Validate the parameter values, failing fast on configuration errors.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.num_class < 2 {
            return Err(SplitError::InvalidParameter(
                "num_class".to_string(),
                "a class count of 2 or more".to_string(),
                self.num_class.to_string(),
            ));
        }
        validate_non_negative_float_parameter(self.reg_lambda, "reg_lambda")?;
        validate_non_negative_float_parameter(self.min_child_weight, "min_child_weight")?;
        Ok(())
    }

    /// Whether the per-class statistics path is selected.
    pub fn is_multiclass(&self) -> bool {
        self.num_class > 2
    }
}

fn validate_non_negative_float_parameter(value: f32, parameter: &str) -> Result<(), SplitError> {
    if value.is_nan() || value < 0.0 {
        Err(SplitError::InvalidParameter(
            parameter.to_string(),
            "a non-negative float".to_string(),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}
