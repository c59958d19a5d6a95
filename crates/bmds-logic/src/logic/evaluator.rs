use serde::Serialize;

use super::diagnostics::ModelDiagnostics;
use super::domain::{Bin, ModelFamily, RuleClass};
use super::notes::VALUE_UNAVAILABLE;
use super::registry::{Measure, RuleRegistry};
use super::rules::RuleInstance;
use super::LogicError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    /// The rule is disabled for, or does not apply to, the model family.
    NotApplicable,
    Passed,
    Triggered,
    /// The rule applies but the statistic it reads was not reported.
    Unavailable,
}

/// Outcome of one rule instance against one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleVerdict {
    pub rule_class: RuleClass,
    pub status: VerdictStatus,
    pub bin: Option<Bin>,
    pub note: Option<String>,
}

impl RuleVerdict {
    pub fn not_applicable(rule_class: RuleClass) -> Self {
        Self {
            rule_class,
            status: VerdictStatus::NotApplicable,
            bin: None,
            note: None,
        }
    }

    pub fn applicable(&self) -> bool {
        self.status != VerdictStatus::NotApplicable
    }

    pub fn triggered(&self) -> bool {
        self.status == VerdictStatus::Triggered
    }
}

/// Evaluate one rule instance against a model's diagnostics.
///
/// Pure: the same inputs always yield the same verdict. A statistic missing from `diagnostics`
/// produces an `Unavailable` verdict, never a pass and never an error. An enabled instance that
/// breaks the threshold invariant is rejected before any comparison.
pub fn evaluate(
    registry: &RuleRegistry,
    instance: &RuleInstance,
    diagnostics: &ModelDiagnostics,
    family: ModelFamily,
) -> Result<RuleVerdict, LogicError> {
    let definition = registry.lookup(instance.rule_class)?;

    if !definition.applies_to(family) || !instance.is_enabled_for(family) {
        return Ok(RuleVerdict::not_applicable(instance.rule_class));
    }
    instance.validate(definition)?;

    let failed = match definition.measure {
        Measure::Scalar { read, comparison } => {
            let threshold = instance
                .threshold
                .ok_or(LogicError::MissingThreshold(instance.rule_class))?;
            read(diagnostics).map(|value| comparison.fails(value, threshold))
        }
        Measure::Flag(read) => read(diagnostics).map(|holds| !holds),
    };

    let verdict = match failed {
        None => RuleVerdict {
            rule_class: instance.rule_class,
            status: VerdictStatus::Unavailable,
            bin: None,
            note: Some(VALUE_UNAVAILABLE.to_string()),
        },
        Some(false) => RuleVerdict {
            rule_class: instance.rule_class,
            status: VerdictStatus::Passed,
            bin: None,
            note: None,
        },
        Some(true) => RuleVerdict {
            rule_class: instance.rule_class,
            status: VerdictStatus::Triggered,
            bin: Some(instance.failure_bin),
            note: Some(definition.notes(instance.threshold)),
        },
    };

    Ok(verdict)
}
