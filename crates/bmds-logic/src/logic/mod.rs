//! Rule-based fit classification.
//!
//! A static [`RuleRegistry`] describes every diagnostic check. An analysis configures those checks
//! through a [`RuleSet`]; [`evaluate`] runs one instance against a model's [`ModelDiagnostics`] and
//! [`aggregate`] folds the verdicts into a [`ModelClassification`] with a single overall [`Bin`].

mod aggregate;
mod diagnostics;
pub mod domain;
mod evaluator;
mod import;
pub mod notes;
mod recommend;
mod registry;
pub mod router;
mod rules;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate, ModelClassification};
pub use diagnostics::{ModelDiagnostics, NamedDiagnostics};
pub use domain::{Bin, Comparison, ModelFamily, RuleClass};
pub use evaluator::{evaluate, RuleVerdict, VerdictStatus};
pub use import::{DiagnosticsImportError, DiagnosticsImporter};
pub use recommend::{recommend, Recommendation, RecommendationBasis, RecommenderSettings};
pub use registry::{Measure, RuleDefinition, RuleDefinitionView, RuleRegistry};
pub use router::logic_router;
pub use rules::{RuleEdit, RuleInstance, RuleRecord, RuleSet};

use serde::Serialize;

/// Configuration-integrity failures. Any of these blocks evaluation of the analysis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LogicError {
    #[error("unknown rule class `{0}`")]
    UnknownRuleClass(String),
    #[error("rule `{0}` is enabled but carries no threshold")]
    MissingThreshold(RuleClass),
    #[error("rule `{0}` does not accept a threshold")]
    UnexpectedThreshold(RuleClass),
    #[error("threshold for rule `{0}` must be a finite number")]
    InvalidThreshold(RuleClass),
    #[error("unknown bin code {0}; expected 0 (viable), 1 (questionable) or 2 (unusable)")]
    UnknownBin(u8),
    #[error("rule `{0}` is configured more than once")]
    DuplicateRule(RuleClass),
    #[error("rule `{rule_class}` does not apply to {family} models")]
    FamilyNotApplicable {
        rule_class: RuleClass,
        family: ModelFamily,
    },
}

/// A model's diagnostics together with the classification derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedModel {
    pub name: String,
    pub diagnostics: ModelDiagnostics,
    pub classification: ModelClassification,
}

/// Run every rule in `rules` against one model and aggregate the verdicts.
pub fn classify(
    registry: &RuleRegistry,
    rules: &RuleSet,
    diagnostics: &ModelDiagnostics,
    family: ModelFamily,
) -> Result<ModelClassification, LogicError> {
    let verdicts = rules
        .iter()
        .map(|instance| evaluate(registry, instance, diagnostics, family))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(aggregate(registry, verdicts))
}

/// Applies an analysis rule set to fitted models of one family.
pub struct LogicEngine<'r> {
    registry: &'r RuleRegistry,
    rules: RuleSet,
}

impl LogicEngine<'static> {
    /// Engine over the process-wide registry.
    pub fn new(rules: RuleSet) -> Result<Self, LogicError> {
        LogicEngine::with_registry(RuleRegistry::global(), rules)
    }
}

impl<'r> LogicEngine<'r> {
    pub fn with_registry(registry: &'r RuleRegistry, rules: RuleSet) -> Result<Self, LogicError> {
        rules.validate(registry)?;
        Ok(Self { registry, rules })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn classify(
        &self,
        diagnostics: &ModelDiagnostics,
        family: ModelFamily,
    ) -> Result<ModelClassification, LogicError> {
        classify(self.registry, &self.rules, diagnostics, family)
    }

    pub fn classify_all(
        &self,
        models: &[NamedDiagnostics],
        family: ModelFamily,
    ) -> Result<Vec<ClassifiedModel>, LogicError> {
        models
            .iter()
            .map(|model| {
                let classification = self.classify(&model.diagnostics, family)?;
                tracing::debug!(
                    model = %model.name,
                    %family,
                    bin = %classification.overall_bin,
                    triggered = classification.triggered_rules.len(),
                    "classified model"
                );
                Ok(ClassifiedModel {
                    name: model.name.clone(),
                    diagnostics: model.diagnostics.clone(),
                    classification,
                })
            })
            .collect()
    }
}
