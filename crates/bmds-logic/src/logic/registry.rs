use std::sync::OnceLock;

use serde::Serialize;

use super::diagnostics::ModelDiagnostics;
use super::domain::{Bin, Comparison, ModelFamily, RuleClass};
use super::notes::threshold_text;
use super::LogicError;

use ModelFamily::{Continuous, Dichotomous, MultiTumor, NestedDichotomous};

const ALL_FAMILIES: &[ModelFamily] = &[Continuous, Dichotomous, NestedDichotomous, MultiTumor];
const FITTED_FAMILIES: &[ModelFamily] = &[Continuous, Dichotomous, NestedDichotomous];
const CONTINUOUS_ONLY: &[ModelFamily] = &[Continuous];
const MULTI_TUMOR_ONLY: &[ModelFamily] = &[MultiTumor];

/// How a rule reads the diagnostics and decides whether it fails.
#[derive(Debug, Clone, Copy)]
pub enum Measure {
    /// Numeric statistic compared against the instance threshold.
    Scalar {
        read: fn(&ModelDiagnostics) -> Option<f64>,
        comparison: Comparison,
    },
    /// Boolean check; `Some(true)` means the check holds and the rule passes.
    Flag(fn(&ModelDiagnostics) -> Option<bool>),
}

/// Immutable description of a diagnostic rule.
#[derive(Debug, Clone)]
pub struct RuleDefinition {
    pub class: RuleClass,
    pub name: &'static str,
    pub families: &'static [ModelFamily],
    pub measure: Measure,
    pub default_threshold: Option<f64>,
    pub default_bin: Bin,
    notes: fn(Option<f64>) -> String,
}

impl RuleDefinition {
    pub fn has_threshold(&self) -> bool {
        matches!(self.measure, Measure::Scalar { .. })
    }

    pub fn applies_to(&self, family: ModelFamily) -> bool {
        self.families.contains(&family)
    }

    pub fn comparison(&self) -> Option<Comparison> {
        match self.measure {
            Measure::Scalar { comparison, .. } => Some(comparison),
            Measure::Flag(_) => None,
        }
    }

    /// Explanatory note; may contain inline HTML markup.
    pub fn notes(&self, threshold: Option<f64>) -> String {
        (self.notes)(threshold)
    }

    pub fn view(&self) -> RuleDefinitionView {
        RuleDefinitionView {
            rule_class: self.class,
            name: self.name,
            families: self.families.to_vec(),
            has_threshold: self.has_threshold(),
            comparison: self.comparison(),
            default_threshold: self.default_threshold,
            default_bin: self.default_bin,
            default_bin_label: self.default_bin.label(),
            notes: self.notes(self.default_threshold),
        }
    }
}

/// Serializable projection of a definition for API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct RuleDefinitionView {
    pub rule_class: RuleClass,
    pub name: &'static str,
    pub families: Vec<ModelFamily>,
    pub has_threshold: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    pub default_threshold: Option<f64>,
    pub default_bin: Bin,
    pub default_bin_label: &'static str,
    pub notes: String,
}

/// Ordered catalog of rule definitions; the declaration order is the display order.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    definitions: Vec<RuleDefinition>,
}

impl RuleRegistry {
    pub fn standard() -> Self {
        Self {
            definitions: standard_definitions(),
        }
    }

    /// Process-wide registry, built on first use and never mutated afterwards.
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<RuleRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::standard)
    }

    pub fn from_definitions(definitions: Vec<RuleDefinition>) -> Result<Self, LogicError> {
        for (index, definition) in definitions.iter().enumerate() {
            if definitions[..index]
                .iter()
                .any(|earlier| earlier.class == definition.class)
            {
                return Err(LogicError::DuplicateRule(definition.class));
            }
        }
        Ok(Self { definitions })
    }

    pub fn lookup(&self, class: RuleClass) -> Result<&RuleDefinition, LogicError> {
        self.definitions
            .iter()
            .find(|definition| definition.class == class)
            .ok_or_else(|| LogicError::UnknownRuleClass(class.key().to_string()))
    }

    pub fn position(&self, class: RuleClass) -> Option<usize> {
        self.definitions
            .iter()
            .position(|definition| definition.class == class)
    }

    pub fn definitions(&self) -> &[RuleDefinition] {
        &self.definitions
    }

    pub fn for_family(&self, family: ModelFamily) -> Vec<&RuleDefinition> {
        self.definitions
            .iter()
            .filter(|definition| definition.applies_to(family))
            .collect()
    }
}

fn scalar(read: fn(&ModelDiagnostics) -> Option<f64>, comparison: Comparison) -> Measure {
    Measure::Scalar { read, comparison }
}

fn standard_definitions() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            class: RuleClass::Gof,
            name: "Goodness of fit p-test",
            families: FITTED_FAMILIES,
            measure: scalar(ModelDiagnostics::gof_p_value, Comparison::Below),
            default_threshold: Some(0.1),
            default_bin: Bin::Unusable,
            notes: |t| format!("Goodness of fit <i>p</i>-value &lt; {}", threshold_text(t)),
        },
        RuleDefinition {
            class: RuleClass::GofCancer,
            name: "Goodness of fit p-test (cancer)",
            families: MULTI_TUMOR_ONLY,
            measure: scalar(ModelDiagnostics::gof_p_value, Comparison::Below),
            default_threshold: Some(0.05),
            default_bin: Bin::Unusable,
            notes: |t| format!("Goodness of fit <i>p</i>-value &lt; {}", threshold_text(t)),
        },
        RuleDefinition {
            class: RuleClass::DofZero,
            name: "Degrees of freedom",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::degrees_of_freedom, Comparison::AtMost),
            default_threshold: Some(0.0),
            default_bin: Bin::Questionable,
            notes: |t| format!("Degrees of freedom &le; {}", threshold_text(t)),
        },
        RuleDefinition {
            class: RuleClass::FitConverged,
            name: "Model converged",
            families: ALL_FAMILIES,
            measure: Measure::Flag(|d| d.converged),
            default_threshold: None,
            default_bin: Bin::Unusable,
            notes: |_| "Model optimization did not converge".to_string(),
        },
        RuleDefinition {
            class: RuleClass::BmdMissing,
            name: "BMD exists",
            families: ALL_FAMILIES,
            measure: Measure::Flag(|d| Some(d.has_bmd())),
            default_threshold: None,
            default_bin: Bin::Unusable,
            notes: |_| "BMD not estimated".to_string(),
        },
        RuleDefinition {
            class: RuleClass::BmdlMissing,
            name: "BMDL exists",
            families: ALL_FAMILIES,
            measure: Measure::Flag(|d| Some(d.has_bmdl())),
            default_threshold: None,
            default_bin: Bin::Unusable,
            notes: |_| "BMDL not estimated".to_string(),
        },
        RuleDefinition {
            class: RuleClass::BmduMissing,
            name: "BMDU exists",
            families: ALL_FAMILIES,
            measure: Measure::Flag(|d| Some(d.has_bmdu())),
            default_threshold: None,
            default_bin: Bin::Viable,
            notes: |_| "BMDU not estimated".to_string(),
        },
        RuleDefinition {
            class: RuleClass::VarianceType,
            name: "Variance type",
            families: CONTINUOUS_ONLY,
            measure: Measure::Flag(|d| d.constant_variance_adequate),
            default_threshold: None,
            default_bin: Bin::Unusable,
            notes: |_| {
                "Incorrect variance model (<i>p</i>-value test 2 &lt; 0.05); a non-constant \
                 variance model is recommended"
                    .to_string()
            },
        },
        RuleDefinition {
            class: RuleClass::VarianceFit,
            name: "Variance fit",
            families: CONTINUOUS_ONLY,
            measure: scalar(ModelDiagnostics::variance_p_value, Comparison::Below),
            default_threshold: Some(0.1),
            default_bin: Bin::Unusable,
            notes: |t| {
                format!(
                    "Variance model poorly fits dataset (<i>p</i>-value test 3 &lt; {})",
                    threshold_text(t)
                )
            },
        },
        RuleDefinition {
            class: RuleClass::BmdBmdlRatioFail,
            name: "Ratio of BMD/BMDL (serious)",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::bmd_bmdl_ratio, Comparison::Above),
            default_threshold: Some(20.0),
            default_bin: Bin::Questionable,
            notes: |t| format!("BMD/BMDL ratio &gt; {}", threshold_text(t)),
        },
        RuleDefinition {
            class: RuleClass::BmdBmdlRatioWarning,
            name: "Ratio of BMD/BMDL (caution)",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::bmd_bmdl_ratio, Comparison::Above),
            default_threshold: Some(5.0),
            default_bin: Bin::Viable,
            notes: |t| format!("BMD/BMDL ratio &gt; {}", threshold_text(t)),
        },
        RuleDefinition {
            class: RuleClass::HighBmd,
            name: "BMD higher than highest dose",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::bmd_to_max_dose, Comparison::Above),
            default_threshold: Some(1.0),
            default_bin: Bin::Viable,
            notes: |t| format!("BMD/high dose &gt; {}", threshold_text(t)),
        },
        RuleDefinition {
            class: RuleClass::HighBmdl,
            name: "BMDL higher than highest dose",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::bmdl_to_max_dose, Comparison::Above),
            default_threshold: Some(1.0),
            default_bin: Bin::Viable,
            notes: |t| format!("BMDL/high dose &gt; {}", threshold_text(t)),
        },
        RuleDefinition {
            class: RuleClass::LowBmdWarning,
            name: "BMD lower than lowest dose (caution)",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::min_dose_to_bmd, Comparison::Above),
            default_threshold: Some(3.0),
            default_bin: Bin::Viable,
            notes: |t| {
                format!(
                    "BMD {}x lower than lowest non-zero dose",
                    threshold_text(t)
                )
            },
        },
        RuleDefinition {
            class: RuleClass::LowBmdFail,
            name: "BMD lower than lowest dose (serious)",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::min_dose_to_bmd, Comparison::Above),
            default_threshold: Some(10.0),
            default_bin: Bin::Questionable,
            notes: |t| {
                format!(
                    "BMD {}x lower than lowest non-zero dose",
                    threshold_text(t)
                )
            },
        },
        RuleDefinition {
            class: RuleClass::LowBmdlWarning,
            name: "BMDL lower than lowest dose (caution)",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::min_dose_to_bmdl, Comparison::Above),
            default_threshold: Some(3.0),
            default_bin: Bin::Viable,
            notes: |t| {
                format!(
                    "BMDL {}x lower than lowest non-zero dose",
                    threshold_text(t)
                )
            },
        },
        RuleDefinition {
            class: RuleClass::LowBmdlFail,
            name: "BMDL lower than lowest dose (serious)",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::min_dose_to_bmdl, Comparison::Above),
            default_threshold: Some(10.0),
            default_bin: Bin::Questionable,
            notes: |t| {
                format!(
                    "BMDL {}x lower than lowest non-zero dose",
                    threshold_text(t)
                )
            },
        },
        RuleDefinition {
            class: RuleClass::ResidualNearBmd,
            name: "Abs(Residual of interest) too large",
            families: ALL_FAMILIES,
            measure: scalar(ModelDiagnostics::abs_residual_near_bmd, Comparison::AtLeast),
            default_threshold: Some(2.0),
            default_bin: Bin::Questionable,
            notes: |t| {
                format!(
                    "|Residual for dose group near BMD| &ge; {}",
                    threshold_text(t)
                )
            },
        },
        RuleDefinition {
            class: RuleClass::ResidualAtControl,
            name: "Abs(Residual at control) too large",
            families: FITTED_FAMILIES,
            measure: scalar(
                ModelDiagnostics::abs_residual_at_control,
                Comparison::AtLeast,
            ),
            default_threshold: Some(2.0),
            default_bin: Bin::Questionable,
            notes: |t| format!("|Residual at control| &ge; {}", threshold_text(t)),
        },
        RuleDefinition {
            class: RuleClass::ControlStdevFit,
            name: "Poor control dose std. dev.",
            families: CONTINUOUS_ONLY,
            measure: scalar(ModelDiagnostics::control_stdev_fold, Comparison::Above),
            default_threshold: Some(1.5),
            default_bin: Bin::Questionable,
            notes: |t| {
                format!(
                    "Modeled control response std. dev. &gt;{}x actual response std. dev.",
                    threshold_text(t)
                )
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_every_rule_class_once() {
        let registry = RuleRegistry::standard();
        assert_eq!(registry.definitions().len(), RuleClass::ALL.len());
        for class in RuleClass::ALL {
            let definition = registry.lookup(class).expect("class registered");
            assert_eq!(definition.class, class);
        }
    }

    #[test]
    fn default_thresholds_track_threshold_flag() {
        for definition in RuleRegistry::standard().definitions() {
            assert_eq!(
                definition.has_threshold(),
                definition.default_threshold.is_some(),
                "{} default threshold mismatch",
                definition.class
            );
        }
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let registry = RuleRegistry::standard();
        let mut definitions = registry.definitions().to_vec();
        definitions.push(definitions[0].clone());

        match RuleRegistry::from_definitions(definitions) {
            Err(LogicError::DuplicateRule(RuleClass::Gof)) => {}
            other => panic!("expected duplicate rule error, got {other:?}"),
        }
    }

    #[test]
    fn lookup_fails_for_unregistered_class() {
        let definitions = RuleRegistry::standard()
            .definitions()
            .iter()
            .filter(|definition| definition.class != RuleClass::VarianceFit)
            .cloned()
            .collect();
        let registry = RuleRegistry::from_definitions(definitions).expect("valid registry");

        match registry.lookup(RuleClass::VarianceFit) {
            Err(LogicError::UnknownRuleClass(key)) => assert_eq!(key, "variance_fit"),
            other => panic!("expected unknown rule class, got {other:?}"),
        }
    }

    #[test]
    fn family_filter_respects_applicability() {
        let registry = RuleRegistry::standard();
        let continuous: Vec<RuleClass> = registry
            .for_family(ModelFamily::Continuous)
            .into_iter()
            .map(|definition| definition.class)
            .collect();
        assert!(continuous.contains(&RuleClass::ControlStdevFit));
        assert!(!continuous.contains(&RuleClass::GofCancer));

        let multi_tumor = registry.for_family(ModelFamily::MultiTumor);
        assert!(multi_tumor
            .iter()
            .all(|definition| definition.class != RuleClass::Gof));
    }

    #[test]
    fn notes_render_threshold() {
        let registry = RuleRegistry::global();
        let gof = registry.lookup(RuleClass::Gof).expect("gof registered");
        assert_eq!(gof.notes(Some(0.1)), "Goodness of fit <i>p</i>-value &lt; 0.1");
        let residual = registry
            .lookup(RuleClass::ResidualNearBmd)
            .expect("residual registered");
        assert!(residual.notes(Some(2.0)).ends_with("&ge; 2"));
    }
}
