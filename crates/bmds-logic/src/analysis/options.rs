use serde::{Deserialize, Serialize};

use crate::logic::ModelFamily;

/// Benchmark response definitions for continuous endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuousBmrType {
    AbsoluteDeviation,
    StandardDeviation,
    RelativeDeviation,
    PointEstimate,
    HybridExtra,
    HybridAdded,
}

/// Benchmark response definitions for quantal endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DichotomousBmrType {
    ExtraRisk,
    AddedRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    Normal,
    NormalNonConstant,
    LogNormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LitterSpecificCovariate {
    Unused,
    OverallMean,
    ControlGroupMean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousOptions {
    pub bmr_type: ContinuousBmrType,
    pub bmr_value: f64,
    pub tail_probability: f64,
    pub confidence_level: f64,
    pub dist_type: DistributionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DichotomousOptions {
    pub bmr_type: DichotomousBmrType,
    pub bmr_value: f64,
    pub confidence_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedDichotomousOptions {
    pub bmr_type: DichotomousBmrType,
    pub bmr_value: f64,
    pub confidence_level: f64,
    pub litter_specific_covariate: LitterSpecificCovariate,
    pub bootstrap_iterations: u32,
    pub bootstrap_seed: u64,
}

/// One set of modeling options, tagged with the family it was written for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum OptionSet {
    Continuous(ContinuousOptions),
    Dichotomous(DichotomousOptions),
    NestedDichotomous(NestedDichotomousOptions),
    MultiTumor(DichotomousOptions),
}

/// Option-set validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionsError {
    #[error("{found} option set does not match {expected} analysis")]
    FamilyMismatch {
        expected: ModelFamily,
        found: ModelFamily,
    },
    #[error("{field} must be within {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },
    #[error("analysis accepts at most {max} option sets")]
    TooMany { max: usize },
    #[error("analysis requires at least one option set")]
    Empty,
}

fn open_interval(
    field: &'static str,
    value: f64,
    low: f64,
    high: f64,
    range: &'static str,
) -> Result<(), OptionsError> {
    if value > low && value < high {
        Ok(())
    } else {
        Err(OptionsError::OutOfRange { field, value, range })
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), OptionsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OptionsError::OutOfRange {
            field,
            value,
            range: "finite numbers",
        })
    }
}

fn confidence_level(value: f64) -> Result<(), OptionsError> {
    open_interval("confidence_level", value, 0.5, 1.0, "(0.5, 1)")
}

impl OptionSet {
    pub fn family(&self) -> ModelFamily {
        match self {
            Self::Continuous(_) => ModelFamily::Continuous,
            Self::Dichotomous(_) => ModelFamily::Dichotomous,
            Self::NestedDichotomous(_) => ModelFamily::NestedDichotomous,
            Self::MultiTumor(_) => ModelFamily::MultiTumor,
        }
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        match self {
            Self::Continuous(options) => {
                finite("bmr_value", options.bmr_value)?;
                open_interval(
                    "tail_probability",
                    options.tail_probability,
                    0.0,
                    1.0,
                    "(0, 1)",
                )?;
                confidence_level(options.confidence_level)
            }
            Self::Dichotomous(options) | Self::MultiTumor(options) => {
                finite("bmr_value", options.bmr_value)?;
                confidence_level(options.confidence_level)
            }
            Self::NestedDichotomous(options) => {
                finite("bmr_value", options.bmr_value)?;
                confidence_level(options.confidence_level)
            }
        }
    }

    /// Validate the set on its own and against the analysis family.
    pub fn validate_for(&self, family: ModelFamily) -> Result<(), OptionsError> {
        if self.family() != family {
            return Err(OptionsError::FamilyMismatch {
                expected: family,
                found: self.family(),
            });
        }
        self.validate()
    }
}

/// Validate a complete option list ready for execution.
pub fn validate_option_sets(
    family: ModelFamily,
    sets: &[OptionSet],
    max: usize,
) -> Result<(), OptionsError> {
    if sets.is_empty() {
        return Err(OptionsError::Empty);
    }
    if sets.len() > max {
        return Err(OptionsError::TooMany { max });
    }
    sets.iter().try_for_each(|set| set.validate_for(family))
}
