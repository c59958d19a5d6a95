use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named lifecycle phase, derived from [`ReadinessState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    Editing,
    Validated,
    Saved,
    Executing,
}

impl AnalysisPhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Editing => "Editing",
            Self::Validated => "Validated",
            Self::Saved => "Saved",
            Self::Executing => "Executing",
        }
    }
}

/// User actions gated by the readiness machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisAction {
    Save,
    Execute,
    Cancel,
}

/// Configuration-change notifications emitted by whoever owns the analysis configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationEvent {
    DatasetAdded,
    DatasetRemoved,
    ModelSelected,
    ModelDeselected,
    OptionSetAdded,
    OptionSetRemoved,
    /// A rule instance was edited; counts are unchanged.
    RulesChanged,
}

/// Rejected user action. The machine is left untouched whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardRejection {
    #[error("analysis needs at least one dataset, model, and option set before it can be saved")]
    NotValidated,
    #[error("analysis must be validated and saved before it can execute")]
    NotReady,
    #[error("analysis is already executing")]
    AlreadyExecuting,
    #[error("analysis is not executing")]
    NotExecuting,
    #[error("analysis configuration is locked while executing")]
    Locked,
}

/// Per-analysis readiness record. Only [`ReadinessMachine`] mutates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessState {
    pub datasets_selected: usize,
    pub models_selected: usize,
    pub option_sets_selected: usize,
    pub is_saved: bool,
    pub is_validated: bool,
    pub is_executing: bool,
}

impl ReadinessState {
    pub fn has_dataset(&self) -> bool {
        self.datasets_selected > 0
    }

    pub fn has_model(&self) -> bool {
        self.models_selected > 0
    }

    pub fn has_option_set(&self) -> bool {
        self.option_sets_selected > 0
    }

    /// Guard for `Editing -> Validated`, computed from the counts alone.
    pub fn configuration_complete(&self) -> bool {
        self.has_dataset() && self.has_model() && self.has_option_set()
    }

    pub fn can_save(&self) -> bool {
        !self.is_executing && self.configuration_complete()
    }

    pub fn can_execute(&self) -> bool {
        !self.is_executing && self.is_saved && self.is_validated
    }

    pub fn can_cancel(&self) -> bool {
        self.is_executing
    }

    pub fn phase(&self) -> AnalysisPhase {
        if self.is_executing {
            AnalysisPhase::Executing
        } else if self.is_saved {
            AnalysisPhase::Saved
        } else if self.is_validated {
            AnalysisPhase::Validated
        } else {
            AnalysisPhase::Editing
        }
    }

    pub fn allowed_actions(&self) -> Vec<AnalysisAction> {
        [
            (AnalysisAction::Save, self.can_save()),
            (AnalysisAction::Execute, self.can_execute()),
            (AnalysisAction::Cancel, self.can_cancel()),
        ]
        .into_iter()
        .filter_map(|(action, allowed)| allowed.then_some(action))
        .collect()
    }

    pub fn checklist(&self) -> ReadinessChecklist {
        ReadinessChecklist {
            has_model: self.has_model(),
            has_dataset: self.has_dataset(),
            has_option_set: self.has_option_set(),
            is_saved: self.is_saved,
        }
    }
}

/// Checklist indicators read straight from the guard predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadinessChecklist {
    pub has_model: bool,
    pub has_dataset: bool,
    pub has_option_set: bool,
    pub is_saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub label: &'static str,
    pub satisfied: bool,
}

impl ReadinessChecklist {
    pub fn items(&self) -> Vec<ChecklistItem> {
        vec![
            ChecklistItem {
                label: "At least one model is selected",
                satisfied: self.has_model,
            },
            ChecklistItem {
                label: "At least one dataset is selected",
                satisfied: self.has_dataset,
            },
            ChecklistItem {
                label: "At least one option is selected",
                satisfied: self.has_option_set,
            },
            ChecklistItem {
                label: "The analysis has been saved",
                satisfied: self.is_saved,
            },
        ]
    }

    pub fn complete(&self) -> bool {
        self.has_model && self.has_dataset && self.has_option_set && self.is_saved
    }
}

/// Handle for one in-flight execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionTicket {
    pub id: u64,
    pub started_at: DateTime<Utc>,
}

/// Result of routing an execution completion through the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The ticket matched the running execution; the analysis is `Saved` again.
    Accepted,
    /// The ticket was cancelled or superseded; nothing changed.
    Discarded,
}

/// State machine gating save/execute/cancel on the analysis configuration.
#[derive(Debug, Default)]
pub struct ReadinessMachine {
    state: ReadinessState,
    running: Option<ExecutionTicket>,
    issued: u64,
}

impl ReadinessMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ReadinessState {
        self.state
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.state.phase()
    }

    pub fn checklist(&self) -> ReadinessChecklist {
        self.state.checklist()
    }

    pub fn running(&self) -> Option<&ExecutionTicket> {
        self.running.as_ref()
    }

    /// Fails with `Locked` while executing.
    pub fn ensure_editable(&self) -> Result<(), GuardRejection> {
        if self.state.is_executing {
            Err(GuardRejection::Locked)
        } else {
            Ok(())
        }
    }

    /// Record a configuration change. Any accepted change clears `is_saved`.
    ///
    /// Removing from an empty count is ignored.
    pub fn apply(&mut self, event: ConfigurationEvent) -> Result<(), GuardRejection> {
        self.ensure_editable()?;

        let mut next = self.state;
        let changed = match event {
            ConfigurationEvent::DatasetAdded => increment(&mut next.datasets_selected),
            ConfigurationEvent::DatasetRemoved => decrement(&mut next.datasets_selected),
            ConfigurationEvent::ModelSelected => increment(&mut next.models_selected),
            ConfigurationEvent::ModelDeselected => decrement(&mut next.models_selected),
            ConfigurationEvent::OptionSetAdded => increment(&mut next.option_sets_selected),
            ConfigurationEvent::OptionSetRemoved => decrement(&mut next.option_sets_selected),
            ConfigurationEvent::RulesChanged => true,
        };
        if !changed {
            tracing::debug!(?event, "ignored removal from empty selection");
            return Ok(());
        }

        if next.is_saved {
            tracing::info!(?event, "saved analysis invalidated by configuration change");
        }
        next.is_saved = false;
        next.is_validated = next.configuration_complete();
        self.state = next;

        tracing::debug!(?event, phase = self.phase().label(), "configuration changed");
        Ok(())
    }

    pub fn save(&mut self) -> Result<(), GuardRejection> {
        self.ensure_editable()?;
        if !self.state.is_validated {
            return Err(GuardRejection::NotValidated);
        }
        self.state.is_saved = true;
        tracing::info!("analysis saved");
        Ok(())
    }

    pub fn execute(&mut self) -> Result<ExecutionTicket, GuardRejection> {
        if self.state.is_executing {
            return Err(GuardRejection::AlreadyExecuting);
        }
        if !self.state.can_execute() {
            return Err(GuardRejection::NotReady);
        }

        self.issued += 1;
        let ticket = ExecutionTicket {
            id: self.issued,
            started_at: Utc::now(),
        };
        self.state.is_executing = true;
        self.running = Some(ticket.clone());

        tracing::info!(ticket = ticket.id, "analysis execution started");
        Ok(ticket)
    }

    /// Route a completion notification (success or failure) back to `Saved`.
    pub fn complete(&mut self, ticket: &ExecutionTicket) -> Completion {
        match &self.running {
            Some(running) if running.id == ticket.id => {
                self.finish();
                tracing::info!(ticket = ticket.id, "analysis execution completed");
                Completion::Accepted
            }
            _ => {
                tracing::debug!(ticket = ticket.id, "discarded stale execution completion");
                Completion::Discarded
            }
        }
    }

    /// Return to `Saved` immediately; the external job may still run to completion.
    pub fn cancel(&mut self) -> Result<ExecutionTicket, GuardRejection> {
        let ticket = self.finish().ok_or(GuardRejection::NotExecuting)?;
        tracing::info!(ticket = ticket.id, "analysis execution cancelled");
        Ok(ticket)
    }

    fn finish(&mut self) -> Option<ExecutionTicket> {
        let ticket = self.running.take()?;
        self.state.is_executing = false;
        Some(ticket)
    }
}

fn increment(count: &mut usize) -> bool {
    *count += 1;
    true
}

fn decrement(count: &mut usize) -> bool {
    match count.checked_sub(1) {
        Some(next) => {
            *count = next;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_follows_flags_in_priority_order() {
        let mut state = ReadinessState::default();
        assert_eq!(state.phase(), AnalysisPhase::Editing);

        state.is_validated = true;
        assert_eq!(state.phase(), AnalysisPhase::Validated);

        state.is_saved = true;
        assert_eq!(state.phase(), AnalysisPhase::Saved);

        state.is_executing = true;
        assert_eq!(state.phase(), AnalysisPhase::Executing);
        assert_eq!(state.allowed_actions(), vec![AnalysisAction::Cancel]);
    }

    #[test]
    fn checklist_items_mirror_guard_predicates() {
        let state = ReadinessState {
            datasets_selected: 1,
            models_selected: 0,
            option_sets_selected: 2,
            ..ReadinessState::default()
        };

        let items = state.checklist().items();
        let satisfied: Vec<_> = items.iter().map(|item| item.satisfied).collect();
        assert_eq!(satisfied, vec![false, true, true, false]);
        assert_eq!(items[0].label, "At least one model is selected");
        assert!(!state.checklist().complete());
    }

    #[test]
    fn removal_from_empty_selection_keeps_saved_flag() {
        let mut machine = ReadinessMachine::new();
        for event in [
            ConfigurationEvent::DatasetAdded,
            ConfigurationEvent::ModelSelected,
            ConfigurationEvent::OptionSetAdded,
        ] {
            machine.apply(event).expect("event accepted");
        }
        machine.save().expect("save succeeds");
        machine
            .apply(ConfigurationEvent::OptionSetRemoved)
            .expect("event accepted");
        machine
            .apply(ConfigurationEvent::OptionSetRemoved)
            .expect("empty removal is ignored");

        let state = machine.snapshot();
        assert_eq!(state.option_sets_selected, 0);
        assert!(!state.is_saved);
        assert!(!state.is_validated);
    }

    #[test]
    fn tickets_are_issued_in_sequence() {
        let mut machine = ReadinessMachine::new();
        for event in [
            ConfigurationEvent::DatasetAdded,
            ConfigurationEvent::ModelSelected,
            ConfigurationEvent::OptionSetAdded,
        ] {
            machine.apply(event).expect("event accepted");
        }
        machine.save().expect("save succeeds");

        let first = machine.execute().expect("first run");
        assert_eq!(machine.complete(&first), Completion::Accepted);
        let second = machine.execute().expect("second run");

        assert!(second.id > first.id);
        assert_eq!(machine.complete(&first), Completion::Discarded);
        assert_eq!(machine.phase(), AnalysisPhase::Executing);
    }
}
