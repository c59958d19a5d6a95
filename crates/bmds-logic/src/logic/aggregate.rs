use serde::Serialize;

use super::domain::Bin;
use super::evaluator::{RuleVerdict, VerdictStatus};
use super::notes::plain_text;
use super::registry::RuleRegistry;

/// Reduced view of all verdicts for a single model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelClassification {
    pub overall_bin: Bin,
    /// Triggered verdicts, in registry declaration order.
    pub triggered_rules: Vec<RuleVerdict>,
    /// Applicable rules whose statistic was unavailable, in registry declaration order.
    pub indeterminate_rules: Vec<RuleVerdict>,
}

impl ModelClassification {
    pub fn viable() -> Self {
        Self {
            overall_bin: Bin::Viable,
            triggered_rules: Vec::new(),
            indeterminate_rules: Vec::new(),
        }
    }

    /// Plain-text notes for every triggered rule, prefixed by the bin they assign.
    pub fn explanations(&self) -> Vec<String> {
        self.triggered_rules
            .iter()
            .map(|verdict| {
                let note = verdict.note.as_deref().map(plain_text).unwrap_or_default();
                match verdict.bin {
                    Some(bin) => format!("[{}] {}", bin.label(), note),
                    None => note,
                }
            })
            .collect()
    }
}

/// Reduce verdicts to a single classification.
///
/// The overall bin is the most severe bin among triggered verdicts (`Viable` when none trigger).
/// Listed verdicts follow the registry order regardless of input order; verdicts for classes the
/// registry does not know sort last, keeping their relative order.
pub fn aggregate<I>(registry: &RuleRegistry, verdicts: I) -> ModelClassification
where
    I: IntoIterator<Item = RuleVerdict>,
{
    let mut classification = ModelClassification::viable();

    for verdict in verdicts {
        match verdict.status {
            VerdictStatus::Triggered => {
                if let Some(bin) = verdict.bin {
                    classification.overall_bin = classification.overall_bin.max(bin);
                }
                classification.triggered_rules.push(verdict);
            }
            VerdictStatus::Unavailable => classification.indeterminate_rules.push(verdict),
            VerdictStatus::Passed | VerdictStatus::NotApplicable => {}
        }
    }

    let order = |verdict: &RuleVerdict| registry.position(verdict.rule_class).unwrap_or(usize::MAX);
    classification.triggered_rules.sort_by_key(order);
    classification.indeterminate_rules.sort_by_key(order);

    classification
}
