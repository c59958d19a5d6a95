use serde::{Deserialize, Serialize};

/// Fit statistics reported by the external fitting engine for a single model.
///
/// Every field is optional: a fit that did not converge, or a model family that never reports a
/// statistic, simply leaves it out. The logic layer only reads these values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDiagnostics {
    pub converged: Option<bool>,
    pub aic: Option<f64>,
    pub log_posterior: Option<f64>,
    pub gof_p_value: Option<f64>,
    pub degrees_of_freedom: Option<f64>,
    pub bmd: Option<f64>,
    pub bmdl: Option<f64>,
    pub bmdu: Option<f64>,
    pub max_dose: Option<f64>,
    pub min_nonzero_dose: Option<f64>,
    pub residual_near_bmd: Option<f64>,
    pub residual_at_control: Option<f64>,
    pub control_stdev_modeled: Option<f64>,
    pub control_stdev_observed: Option<f64>,
    pub variance_p_value: Option<f64>,
    pub constant_variance_adequate: Option<bool>,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}

fn positive(value: Option<f64>) -> Option<f64> {
    finite(value).filter(|value| *value > 0.0)
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    Some(positive(numerator)? / positive(denominator)?)
}

impl ModelDiagnostics {
    pub fn has_bmd(&self) -> bool {
        positive(self.bmd).is_some()
    }

    pub fn has_bmdl(&self) -> bool {
        positive(self.bmdl).is_some()
    }

    pub fn has_bmdu(&self) -> bool {
        positive(self.bmdu).is_some()
    }

    pub fn gof_p_value(&self) -> Option<f64> {
        finite(self.gof_p_value)
    }

    pub fn degrees_of_freedom(&self) -> Option<f64> {
        finite(self.degrees_of_freedom)
    }

    pub fn variance_p_value(&self) -> Option<f64> {
        finite(self.variance_p_value)
    }

    pub fn bmd_bmdl_ratio(&self) -> Option<f64> {
        ratio(self.bmd, self.bmdl)
    }

    pub fn bmd_to_max_dose(&self) -> Option<f64> {
        ratio(self.bmd, self.max_dose)
    }

    pub fn bmdl_to_max_dose(&self) -> Option<f64> {
        ratio(self.bmdl, self.max_dose)
    }

    pub fn min_dose_to_bmd(&self) -> Option<f64> {
        ratio(self.min_nonzero_dose, self.bmd)
    }

    pub fn min_dose_to_bmdl(&self) -> Option<f64> {
        ratio(self.min_nonzero_dose, self.bmdl)
    }

    pub fn abs_residual_near_bmd(&self) -> Option<f64> {
        finite(self.residual_near_bmd).map(f64::abs)
    }

    pub fn abs_residual_at_control(&self) -> Option<f64> {
        finite(self.residual_at_control).map(f64::abs)
    }

    /// Fold of modeled vs observed control standard deviation, always `>= 1`.
    pub fn control_stdev_fold(&self) -> Option<f64> {
        let ratio = ratio(self.control_stdev_modeled, self.control_stdev_observed)?;
        Some(ratio.max(1.0 / ratio))
    }
}

/// Diagnostics tagged with the model they were produced for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedDiagnostics {
    pub name: String,
    #[serde(default)]
    pub diagnostics: ModelDiagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_require_positive_finite_inputs() {
        let diagnostics = ModelDiagnostics {
            bmd: Some(10.0),
            bmdl: Some(0.0),
            max_dose: Some(f64::NAN),
            min_nonzero_dose: Some(5.0),
            ..ModelDiagnostics::default()
        };

        assert_eq!(diagnostics.bmd_bmdl_ratio(), None);
        assert_eq!(diagnostics.bmd_to_max_dose(), None);
        assert_eq!(diagnostics.min_dose_to_bmd(), Some(0.5));
        assert!(diagnostics.has_bmd());
        assert!(!diagnostics.has_bmdl());
    }

    #[test]
    fn control_stdev_fold_is_symmetric() {
        let wide = ModelDiagnostics {
            control_stdev_modeled: Some(3.0),
            control_stdev_observed: Some(1.5),
            ..ModelDiagnostics::default()
        };
        let narrow = ModelDiagnostics {
            control_stdev_modeled: Some(1.5),
            control_stdev_observed: Some(3.0),
            ..ModelDiagnostics::default()
        };

        assert_eq!(wide.control_stdev_fold(), Some(2.0));
        assert_eq!(narrow.control_stdev_fold(), Some(2.0));
    }

    #[test]
    fn residuals_are_reported_as_magnitudes() {
        let diagnostics = ModelDiagnostics {
            residual_near_bmd: Some(-2.4),
            ..ModelDiagnostics::default()
        };
        assert_eq!(diagnostics.abs_residual_near_bmd(), Some(2.4));
        assert_eq!(diagnostics.abs_residual_at_control(), None);
    }
}
