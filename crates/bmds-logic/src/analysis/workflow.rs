use std::sync::Arc;

use serde::Serialize;

use super::options::{validate_option_sets, OptionSet, OptionsError};
use super::readiness::{
    AnalysisPhase, Completion, ConfigurationEvent, ExecutionTicket, GuardRejection,
    ReadinessChecklist, ReadinessMachine, ReadinessState,
};
use crate::config::AnalysisConfig;
use crate::logic::{
    ClassifiedModel, LogicEngine, LogicError, ModelFamily, NamedDiagnostics, RuleClass, RuleEdit,
    RuleRecord, RuleRegistry, RuleSet,
};

/// Everything the external fitting job needs to run one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRequest {
    pub ticket: ExecutionTicket,
    pub family: ModelFamily,
    pub datasets: Vec<String>,
    pub models: Vec<String>,
    pub option_sets: Vec<OptionSet>,
    pub rules: Vec<RuleRecord>,
}

/// Outbound hook to the external execution job.
pub trait ExecutionLauncher: Send + Sync {
    fn launch(&self, request: &ExecutionRequest) -> Result<(), LaunchError>;
    /// Best-effort abort; the job may still finish.
    fn abort(&self, ticket: &ExecutionTicket) -> Result<(), LaunchError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LaunchError {
    #[error("execution backend rejected the job: {0}")]
    Rejected(String),
    #[error("execution backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Guard(#[from] GuardRejection),
    #[error(transparent)]
    Logic(#[from] LogicError),
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl WorkflowError {
    /// Integrity failures block the analysis until its configuration is fixed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Logic(_))
    }
}

/// Owns one analysis configuration and routes every change through the readiness machine.
pub struct AnalysisWorkflow<L> {
    family: ModelFamily,
    datasets: Vec<String>,
    models: Vec<String>,
    option_sets: Vec<OptionSet>,
    rules: RuleSet,
    registry: &'static RuleRegistry,
    machine: ReadinessMachine,
    launcher: Arc<L>,
    max_option_sets: usize,
}

impl<L> AnalysisWorkflow<L>
where
    L: ExecutionLauncher + 'static,
{
    pub fn new(family: ModelFamily, launcher: Arc<L>, config: &AnalysisConfig) -> Self {
        let registry = RuleRegistry::global();
        Self {
            family,
            datasets: Vec::new(),
            models: Vec::new(),
            option_sets: Vec::new(),
            rules: RuleSet::standard(registry),
            registry,
            machine: ReadinessMachine::new(),
            launcher,
            max_option_sets: config.max_option_sets(),
        }
    }

    /// Replace the default rule set with persisted records.
    pub fn with_rule_records(mut self, records: &[RuleRecord]) -> Result<Self, WorkflowError> {
        let rules = RuleSet::from_records(records, self.registry)?;
        rules.validate(self.registry)?;
        self.rules = rules;
        Ok(self)
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    pub fn datasets(&self) -> &[String] {
        &self.datasets
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn option_sets(&self) -> &[OptionSet] {
        &self.option_sets
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn readiness(&self) -> ReadinessState {
        self.machine.snapshot()
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.machine.phase()
    }

    pub fn checklist(&self) -> ReadinessChecklist {
        self.machine.checklist()
    }

    /// Returns `false` when the dataset was already selected.
    pub fn add_dataset(&mut self, id: impl Into<String>) -> Result<bool, WorkflowError> {
        self.machine.ensure_editable()?;
        let id = id.into();
        if self.datasets.contains(&id) {
            return Ok(false);
        }
        self.machine.apply(ConfigurationEvent::DatasetAdded)?;
        self.datasets.push(id);
        Ok(true)
    }

    pub fn remove_dataset(&mut self, id: &str) -> Result<bool, WorkflowError> {
        self.machine.ensure_editable()?;
        let Some(index) = self.datasets.iter().position(|existing| existing == id) else {
            return Ok(false);
        };
        self.machine.apply(ConfigurationEvent::DatasetRemoved)?;
        self.datasets.remove(index);
        Ok(true)
    }

    /// Select a model; `Exponential` selects both of its executable variants.
    ///
    /// Returns `false` when every resulting model was already selected.
    pub fn select_model(&mut self, name: impl Into<String>) -> Result<bool, WorkflowError> {
        self.machine.ensure_editable()?;
        let mut changed = false;
        for name in executable_models(name.into()) {
            if self.models.contains(&name) {
                continue;
            }
            self.machine.apply(ConfigurationEvent::ModelSelected)?;
            self.models.push(name);
            changed = true;
        }
        Ok(changed)
    }

    pub fn deselect_model(&mut self, name: &str) -> Result<bool, WorkflowError> {
        self.machine.ensure_editable()?;
        let mut changed = false;
        for name in executable_models(name.to_string()) {
            let Some(index) = self.models.iter().position(|existing| *existing == name) else {
                continue;
            };
            self.machine.apply(ConfigurationEvent::ModelDeselected)?;
            self.models.remove(index);
            changed = true;
        }
        Ok(changed)
    }

    /// Validate and append an option set, returning its position.
    pub fn add_option_set(&mut self, options: OptionSet) -> Result<usize, WorkflowError> {
        self.machine.ensure_editable()?;
        options.validate_for(self.family)?;
        if self.option_sets.len() >= self.max_option_sets {
            return Err(OptionsError::TooMany {
                max: self.max_option_sets,
            }
            .into());
        }
        self.machine.apply(ConfigurationEvent::OptionSetAdded)?;
        self.option_sets.push(options);
        Ok(self.option_sets.len() - 1)
    }

    /// Returns `None` when there is no option set at `index`.
    pub fn remove_option_set(&mut self, index: usize) -> Result<Option<OptionSet>, WorkflowError> {
        self.machine.ensure_editable()?;
        if index >= self.option_sets.len() {
            return Ok(None);
        }
        self.machine.apply(ConfigurationEvent::OptionSetRemoved)?;
        Ok(Some(self.option_sets.remove(index)))
    }

    /// Edit one rule instance. Counts as a configuration change.
    pub fn update_rule(&mut self, class: RuleClass, edit: RuleEdit) -> Result<(), WorkflowError> {
        self.machine.ensure_editable()?;
        self.rules.apply(class, edit, self.registry)?;
        self.machine.apply(ConfigurationEvent::RulesChanged)?;
        Ok(())
    }

    /// Save after checking rule integrity and the option list.
    pub fn save(&mut self) -> Result<(), WorkflowError> {
        self.machine.ensure_editable()?;
        if !self.machine.snapshot().is_validated {
            return Err(GuardRejection::NotValidated.into());
        }
        if let Err(error) = self.rules.validate(self.registry) {
            tracing::warn!(%error, family = %self.family, "rule configuration failed integrity check");
            return Err(error.into());
        }
        validate_option_sets(self.family, &self.option_sets, self.max_option_sets)?;
        self.machine.save()?;
        Ok(())
    }

    /// Start execution. A launch failure leaves the analysis `Saved`.
    pub fn execute(&mut self) -> Result<ExecutionTicket, WorkflowError> {
        let ticket = self.machine.execute()?;
        let request = ExecutionRequest {
            ticket: ticket.clone(),
            family: self.family,
            datasets: self.datasets.clone(),
            models: self.models.clone(),
            option_sets: self.option_sets.clone(),
            rules: self.rules.records(),
        };

        if let Err(error) = self.launcher.launch(&request) {
            tracing::warn!(%error, ticket = ticket.id, "execution launch failed");
            self.machine.complete(&ticket);
            return Err(error.into());
        }
        Ok(ticket)
    }

    pub fn complete(&mut self, ticket: &ExecutionTicket) -> Completion {
        self.machine.complete(ticket)
    }

    pub fn cancel(&mut self) -> Result<ExecutionTicket, WorkflowError> {
        let ticket = self.machine.cancel()?;
        if let Err(error) = self.launcher.abort(&ticket) {
            tracing::warn!(%error, ticket = ticket.id, "abort request failed; results will be discarded");
        }
        Ok(ticket)
    }

    /// Classify fitted models with this analysis' rule set.
    pub fn classify(
        &self,
        models: &[NamedDiagnostics],
    ) -> Result<Vec<ClassifiedModel>, WorkflowError> {
        let engine = LogicEngine::with_registry(self.registry, self.rules.clone())?;
        Ok(engine.classify_all(models, self.family)?)
    }
}

pub const EXPONENTIAL: &str = "Exponential";
pub const EXPONENTIAL_M3: &str = "Exponential-M3";
pub const EXPONENTIAL_M5: &str = "Exponential-M5";

/// Models actually executed for a user-facing model name.
fn executable_models(name: String) -> Vec<String> {
    if name == EXPONENTIAL {
        vec![EXPONENTIAL_M3.to_string(), EXPONENTIAL_M5.to_string()]
    } else {
        vec![name]
    }
}
