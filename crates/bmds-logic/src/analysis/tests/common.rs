use std::sync::{Arc, Mutex};

use crate::analysis::{
    AnalysisWorkflow, ConfigurationEvent, ContinuousBmrType, ContinuousOptions, DistributionType,
    ExecutionLauncher, ExecutionRequest, ExecutionTicket, LaunchError, OptionSet,
    ReadinessMachine,
};
use crate::config::AnalysisConfig;
use crate::logic::ModelFamily;

/// Launcher that records requests and aborts instead of running anything.
#[derive(Default)]
pub(super) struct RecordingLauncher {
    launched: Mutex<Vec<ExecutionRequest>>,
    aborted: Mutex<Vec<u64>>,
}

impl RecordingLauncher {
    pub(super) fn launched(&self) -> Vec<ExecutionRequest> {
        self.launched.lock().expect("launch lock").clone()
    }

    pub(super) fn aborted(&self) -> Vec<u64> {
        self.aborted.lock().expect("abort lock").clone()
    }
}

impl ExecutionLauncher for RecordingLauncher {
    fn launch(&self, request: &ExecutionRequest) -> Result<(), LaunchError> {
        self.launched
            .lock()
            .expect("launch lock")
            .push(request.clone());
        Ok(())
    }

    fn abort(&self, ticket: &ExecutionTicket) -> Result<(), LaunchError> {
        self.aborted.lock().expect("abort lock").push(ticket.id);
        Ok(())
    }
}

/// Launcher whose backend is always down.
pub(super) struct OfflineLauncher;

impl ExecutionLauncher for OfflineLauncher {
    fn launch(&self, _request: &ExecutionRequest) -> Result<(), LaunchError> {
        Err(LaunchError::Unavailable("worker pool offline".to_string()))
    }

    fn abort(&self, _ticket: &ExecutionTicket) -> Result<(), LaunchError> {
        Err(LaunchError::Unavailable("worker pool offline".to_string()))
    }
}

pub(super) fn continuous_options() -> OptionSet {
    OptionSet::Continuous(ContinuousOptions {
        bmr_type: ContinuousBmrType::StandardDeviation,
        bmr_value: 1.0,
        tail_probability: 0.01,
        confidence_level: 0.95,
        dist_type: DistributionType::Normal,
    })
}

pub(super) fn complete_machine() -> ReadinessMachine {
    let mut machine = ReadinessMachine::new();
    for event in [
        ConfigurationEvent::DatasetAdded,
        ConfigurationEvent::ModelSelected,
        ConfigurationEvent::OptionSetAdded,
    ] {
        machine.apply(event).expect("event accepted");
    }
    machine
}

pub(super) fn saved_machine() -> ReadinessMachine {
    let mut machine = complete_machine();
    machine.save().expect("save succeeds");
    machine
}

pub(super) fn workflow<L: ExecutionLauncher + 'static>(launcher: Arc<L>) -> AnalysisWorkflow<L> {
    AnalysisWorkflow::new(
        ModelFamily::Continuous,
        launcher,
        &AnalysisConfig::default(),
    )
}

pub(super) fn saved_workflow<L: ExecutionLauncher + 'static>(
    launcher: Arc<L>,
) -> AnalysisWorkflow<L> {
    let mut workflow = workflow(launcher);
    workflow.add_dataset("dataset-1").expect("dataset added");
    workflow.select_model("Hill").expect("model selected");
    workflow
        .add_option_set(continuous_options())
        .expect("options added");
    workflow.save().expect("save succeeds");
    workflow
}
