//! Analysis configuration lifecycle: option sets, readiness gating, and execution hand-off.

mod options;
mod readiness;
mod workflow;

#[cfg(test)]
mod tests;

pub use options::{
    validate_option_sets, ContinuousBmrType, ContinuousOptions, DichotomousBmrType,
    DichotomousOptions, DistributionType, LitterSpecificCovariate, NestedDichotomousOptions,
    OptionSet, OptionsError,
};
pub use readiness::{
    AnalysisAction, AnalysisPhase, ChecklistItem, Completion, ConfigurationEvent,
    ExecutionTicket, GuardRejection, ReadinessChecklist, ReadinessMachine, ReadinessState,
};
pub use workflow::{
    AnalysisWorkflow, ExecutionLauncher, ExecutionRequest, LaunchError, WorkflowError,
    EXPONENTIAL, EXPONENTIAL_M3, EXPONENTIAL_M5,
};
