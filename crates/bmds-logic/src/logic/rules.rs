use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Bin, ModelFamily, RuleClass};
use super::registry::{RuleDefinition, RuleRegistry};
use super::LogicError;

/// Persisted shape of a rule instance, as stored alongside an analysis.
///
/// `failure_bin` is the wire code of [`Bin`]. `enabled_multi_tumor` is optional and falls back to
/// `enabled_dichotomous` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub rule_class: String,
    pub enabled_continuous: bool,
    pub enabled_dichotomous: bool,
    pub enabled_nested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_multi_tumor: Option<bool>,
    #[serde(default)]
    pub threshold: Option<f64>,
    pub failure_bin: u8,
}

impl RuleRecord {
    fn enabled_for(&self, family: ModelFamily) -> bool {
        match family {
            ModelFamily::Continuous => self.enabled_continuous,
            ModelFamily::Dichotomous => self.enabled_dichotomous,
            ModelFamily::NestedDichotomous => self.enabled_nested,
            ModelFamily::MultiTumor => self.enabled_multi_tumor.unwrap_or(self.enabled_dichotomous),
        }
    }
}

/// Single user-adjustable change to a rule instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum RuleEdit {
    Enabled { family: ModelFamily, enabled: bool },
    Threshold { value: Option<f64> },
    FailureBin { bin: Bin },
}

/// Per-analysis configuration of one registry rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleInstance {
    pub rule_class: RuleClass,
    /// Holds an entry for each family the definition applies to; others are implicitly off.
    pub enabled: BTreeMap<ModelFamily, bool>,
    pub threshold: Option<f64>,
    pub failure_bin: Bin,
    /// Stored flags for families the definition does not apply to; written back, never evaluated.
    #[serde(skip)]
    retained: BTreeMap<ModelFamily, bool>,
    #[serde(skip)]
    explicit_multi_tumor: bool,
}

impl RuleInstance {
    pub fn from_definition(definition: &RuleDefinition) -> Self {
        Self {
            rule_class: definition.class,
            enabled: definition
                .families
                .iter()
                .map(|family| (*family, true))
                .collect(),
            threshold: definition.default_threshold,
            failure_bin: definition.default_bin,
            retained: BTreeMap::new(),
            explicit_multi_tumor: false,
        }
    }

    pub fn from_record(record: &RuleRecord, registry: &RuleRegistry) -> Result<Self, LogicError> {
        let rule_class: RuleClass = record.rule_class.parse()?;
        let definition = registry.lookup(rule_class)?;
        let failure_bin = Bin::from_code(record.failure_bin)?;

        let (enabled, retained): (BTreeMap<_, _>, BTreeMap<_, _>) = ModelFamily::ordered()
            .into_iter()
            .map(|family| (family, record.enabled_for(family)))
            .partition(|(family, _)| definition.applies_to(*family));

        let instance = Self {
            rule_class,
            enabled,
            threshold: record.threshold,
            failure_bin,
            retained,
            explicit_multi_tumor: record.enabled_multi_tumor.is_some(),
        };
        instance.validate(definition)?;
        Ok(instance)
    }

    pub fn record(&self) -> RuleRecord {
        let dichotomous = self.stored_flag(ModelFamily::Dichotomous);
        let multi_tumor = Some(self.stored_flag(ModelFamily::MultiTumor))
            .filter(|enabled| self.explicit_multi_tumor || *enabled != dichotomous);

        RuleRecord {
            rule_class: self.rule_class.key().to_string(),
            enabled_continuous: self.stored_flag(ModelFamily::Continuous),
            enabled_dichotomous: dichotomous,
            enabled_nested: self.stored_flag(ModelFamily::NestedDichotomous),
            enabled_multi_tumor: multi_tumor,
            threshold: self.threshold,
            failure_bin: self.failure_bin.code(),
        }
    }

    fn stored_flag(&self, family: ModelFamily) -> bool {
        self.enabled
            .get(&family)
            .or_else(|| self.retained.get(&family))
            .copied()
            .unwrap_or(false)
    }

    /// Only families the definition applies to can be enabled.
    pub fn is_enabled_for(&self, family: ModelFamily) -> bool {
        self.enabled.get(&family).copied().unwrap_or(false)
    }

    pub fn is_enabled_anywhere(&self) -> bool {
        self.enabled.values().any(|enabled| *enabled)
    }

    /// Check the threshold invariant against the rule's definition.
    pub fn validate(&self, definition: &RuleDefinition) -> Result<(), LogicError> {
        match (definition.has_threshold(), self.threshold) {
            (true, Some(value)) if !value.is_finite() => {
                Err(LogicError::InvalidThreshold(self.rule_class))
            }
            (true, None) if self.is_enabled_anywhere() => {
                Err(LogicError::MissingThreshold(self.rule_class))
            }
            (false, Some(_)) => Err(LogicError::UnexpectedThreshold(self.rule_class)),
            _ => Ok(()),
        }
    }

    pub fn apply(&mut self, edit: RuleEdit, definition: &RuleDefinition) -> Result<(), LogicError> {
        let mut updated = self.clone();
        match edit {
            RuleEdit::Enabled { family, enabled } => {
                if !definition.applies_to(family) {
                    return Err(LogicError::FamilyNotApplicable {
                        rule_class: self.rule_class,
                        family,
                    });
                }
                updated.enabled.insert(family, enabled);
            }
            RuleEdit::Threshold { value } => updated.threshold = value,
            RuleEdit::FailureBin { bin } => updated.failure_bin = bin,
        }

        updated.validate(definition)?;
        *self = updated;
        Ok(())
    }
}

/// The full set of rule instances configured for one analysis, at most one per class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<RuleInstance>,
}

impl RuleSet {
    /// One instance per registered rule, populated with the registry defaults.
    pub fn standard(registry: &RuleRegistry) -> Self {
        Self {
            rules: registry
                .definitions()
                .iter()
                .map(RuleInstance::from_definition)
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn from_records(records: &[RuleRecord], registry: &RuleRegistry) -> Result<Self, LogicError> {
        let mut rules: Vec<RuleInstance> = Vec::with_capacity(records.len());
        for record in records {
            let instance = RuleInstance::from_record(record, registry)?;
            if rules
                .iter()
                .any(|existing| existing.rule_class == instance.rule_class)
            {
                return Err(LogicError::DuplicateRule(instance.rule_class));
            }
            rules.push(instance);
        }
        Ok(Self { rules })
    }

    pub fn records(&self) -> Vec<RuleRecord> {
        self.rules.iter().map(RuleInstance::record).collect()
    }

    pub fn get(&self, class: RuleClass) -> Option<&RuleInstance> {
        self.rules.iter().find(|rule| rule.rule_class == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleInstance> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn validate(&self, registry: &RuleRegistry) -> Result<(), LogicError> {
        for rule in &self.rules {
            rule.validate(registry.lookup(rule.rule_class)?)?;
        }
        Ok(())
    }

    /// Apply an edit to the instance for `class`, adding a default instance if none exists.
    pub fn apply(
        &mut self,
        class: RuleClass,
        edit: RuleEdit,
        registry: &RuleRegistry,
    ) -> Result<(), LogicError> {
        let definition = registry.lookup(class)?;
        match self.rules.iter_mut().find(|rule| rule.rule_class == class) {
            Some(rule) => rule.apply(edit, definition),
            None => {
                let mut rule = RuleInstance::from_definition(definition);
                rule.apply(edit, definition)?;
                self.rules.push(rule);
                Ok(())
            }
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard(RuleRegistry::global())
    }
}
