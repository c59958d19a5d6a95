use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::LogicError;

/// Closed severity scale a model is classified into.
///
/// Ordering follows severity: `Viable < Questionable < Unusable`, so `max` yields the worst bin.
/// On the wire each bin is a small integer (see [`Bin::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bin {
    Viable,
    Questionable,
    Unusable,
}

impl Bin {
    /// Worst-first listing, matching how bins are presented for selection.
    pub const fn ordered() -> [Self; 3] {
        [Self::Unusable, Self::Questionable, Self::Viable]
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Viable => 0,
            Self::Questionable => 1,
            Self::Unusable => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, LogicError> {
        match code {
            0 => Ok(Self::Viable),
            1 => Ok(Self::Questionable),
            2 => Ok(Self::Unusable),
            other => Err(LogicError::UnknownBin(other)),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Viable => "Viable",
            Self::Questionable => "Questionable",
            Self::Unusable => "Unusable",
        }
    }

    const fn severity(self) -> u8 {
        self.code()
    }
}

impl PartialOrd for Bin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Bin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Bin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Bin::from_code(code).map_err(serde::de::Error::custom)
    }
}

/// Category of dose-response model a rule may be enabled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Continuous,
    Dichotomous,
    NestedDichotomous,
    MultiTumor,
}

impl ModelFamily {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Continuous,
            Self::Dichotomous,
            Self::NestedDichotomous,
            Self::MultiTumor,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Dichotomous => "dichotomous",
            Self::NestedDichotomous => "nested_dichotomous",
            Self::MultiTumor => "multi_tumor",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Continuous => "Continuous",
            Self::Dichotomous => "Dichotomous",
            Self::NestedDichotomous => "Nested Dichotomous",
            Self::MultiTumor => "Multi-Tumor (MS Combo)",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ModelFamily {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "c" | "continuous" => Ok(Self::Continuous),
            "d" | "dichotomous" => Ok(Self::Dichotomous),
            "nd" | "nested" | "nested_dichotomous" => Ok(Self::NestedDichotomous),
            "mt" | "multi_tumor" | "multitumor" => Ok(Self::MultiTumor),
            other => Err(format!("unknown model family '{other}'")),
        }
    }
}

/// Identifier of one diagnostic check. Declaration order here is not significant;
/// display order is owned by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleClass {
    Gof,
    GofCancer,
    DofZero,
    FitConverged,
    BmdMissing,
    BmdlMissing,
    BmduMissing,
    VarianceType,
    VarianceFit,
    BmdBmdlRatioFail,
    BmdBmdlRatioWarning,
    HighBmd,
    HighBmdl,
    LowBmdWarning,
    LowBmdFail,
    LowBmdlWarning,
    LowBmdlFail,
    ResidualNearBmd,
    ResidualAtControl,
    ControlStdevFit,
}

impl RuleClass {
    pub const ALL: [Self; 20] = [
        Self::Gof,
        Self::GofCancer,
        Self::DofZero,
        Self::FitConverged,
        Self::BmdMissing,
        Self::BmdlMissing,
        Self::BmduMissing,
        Self::VarianceType,
        Self::VarianceFit,
        Self::BmdBmdlRatioFail,
        Self::BmdBmdlRatioWarning,
        Self::HighBmd,
        Self::HighBmdl,
        Self::LowBmdWarning,
        Self::LowBmdFail,
        Self::LowBmdlWarning,
        Self::LowBmdlFail,
        Self::ResidualNearBmd,
        Self::ResidualAtControl,
        Self::ControlStdevFit,
    ];

    /// Stable identifier used in persisted rule records.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Gof => "gof",
            Self::GofCancer => "gof_cancer",
            Self::DofZero => "dof_zero",
            Self::FitConverged => "fit_converged",
            Self::BmdMissing => "bmd_missing",
            Self::BmdlMissing => "bmdl_missing",
            Self::BmduMissing => "bmdu_missing",
            Self::VarianceType => "variance_type",
            Self::VarianceFit => "variance_fit",
            Self::BmdBmdlRatioFail => "bmd_bmdl_ratio_fail",
            Self::BmdBmdlRatioWarning => "bmd_bmdl_ratio_warning",
            Self::HighBmd => "high_bmd",
            Self::HighBmdl => "high_bmdl",
            Self::LowBmdWarning => "low_bmd_warning",
            Self::LowBmdFail => "low_bmd_fail",
            Self::LowBmdlWarning => "low_bmdl_warning",
            Self::LowBmdlFail => "low_bmdl_fail",
            Self::ResidualNearBmd => "residual_near_bmd",
            Self::ResidualAtControl => "residual_at_control",
            Self::ControlStdevFit => "control_stdev_fit",
        }
    }
}

impl fmt::Display for RuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RuleClass {
    type Err = LogicError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.key() == needle)
            .ok_or_else(|| LogicError::UnknownRuleClass(needle.to_string()))
    }
}

impl Serialize for RuleClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for RuleClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Direction in which a measured value fails its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Fails when `value > threshold`.
    Above,
    /// Fails when `value >= threshold`.
    AtLeast,
    /// Fails when `value < threshold`.
    Below,
    /// Fails when `value <= threshold`.
    AtMost,
}

impl Comparison {
    pub fn fails(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Above => value > threshold,
            Self::AtLeast => value >= threshold,
            Self::Below => value < threshold,
            Self::AtMost => value <= threshold,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Above => ">",
            Self::AtLeast => "≥",
            Self::Below => "<",
            Self::AtMost => "≤",
        }
    }
}
