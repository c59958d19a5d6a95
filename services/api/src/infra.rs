use bmds_logic::analysis::{ExecutionLauncher, ExecutionRequest, ExecutionTicket, LaunchError};
use bmds_logic::error::AppError;
use bmds_logic::logic::{RuleRecord, RuleRegistry, RuleSet};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Launcher standing in for the fitting backend: it records requests and never runs them.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLauncher {
    launched: Arc<Mutex<Vec<ExecutionRequest>>>,
    aborted: Arc<Mutex<Vec<u64>>>,
}

impl ExecutionLauncher for InMemoryLauncher {
    fn launch(&self, request: &ExecutionRequest) -> Result<(), LaunchError> {
        let mut guard = self
            .launched
            .lock()
            .map_err(|_| LaunchError::Unavailable("launch queue poisoned".to_string()))?;
        tracing::info!(
            ticket = request.ticket.id,
            datasets = request.datasets.len(),
            models = request.models.len(),
            option_sets = request.option_sets.len(),
            "queued analysis execution"
        );
        guard.push(request.clone());
        Ok(())
    }

    fn abort(&self, ticket: &ExecutionTicket) -> Result<(), LaunchError> {
        let mut guard = self
            .aborted
            .lock()
            .map_err(|_| LaunchError::Unavailable("abort queue poisoned".to_string()))?;
        guard.push(ticket.id);
        Ok(())
    }
}

impl InMemoryLauncher {
    pub(crate) fn launched(&self) -> Vec<ExecutionRequest> {
        self.launched
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub(crate) fn aborted(&self) -> Vec<u64> {
        self.aborted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Rule set from a JSON array of rule records, or the registry defaults.
pub(crate) fn load_rule_set(path: Option<&Path>) -> Result<RuleSet, AppError> {
    let registry = RuleRegistry::global();
    match path {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            let records: Vec<RuleRecord> = serde_json::from_reader(file)?;
            Ok(RuleSet::from_records(&records, registry)?)
        }
        None => Ok(RuleSet::standard(registry)),
    }
}
