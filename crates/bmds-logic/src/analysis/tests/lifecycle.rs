use super::common::*;
use crate::analysis::{
    AnalysisAction, AnalysisPhase, Completion, ConfigurationEvent, GuardRejection,
    ReadinessMachine,
};

#[test]
fn fresh_analysis_cannot_be_saved() {
    let mut machine = ReadinessMachine::new();

    assert_eq!(machine.phase(), AnalysisPhase::Editing);
    assert_eq!(machine.save(), Err(GuardRejection::NotValidated));
    assert_eq!(machine.snapshot(), ReadinessMachine::new().snapshot());
}

#[test]
fn validation_is_derived_from_counts() {
    let mut machine = ReadinessMachine::new();
    machine
        .apply(ConfigurationEvent::DatasetAdded)
        .expect("event accepted");
    machine
        .apply(ConfigurationEvent::ModelSelected)
        .expect("event accepted");
    assert_eq!(machine.phase(), AnalysisPhase::Editing);
    assert!(!machine.snapshot().is_validated);

    machine
        .apply(ConfigurationEvent::OptionSetAdded)
        .expect("event accepted");
    assert_eq!(machine.phase(), AnalysisPhase::Validated);

    machine.save().expect("save succeeds");
    let state = machine.snapshot();
    assert!(state.is_saved);
    assert_eq!(state.phase(), AnalysisPhase::Saved);
    assert!(machine.checklist().complete());
}

#[test]
fn editing_a_saved_analysis_requires_saving_again() {
    let mut machine = saved_machine();

    machine
        .apply(ConfigurationEvent::ModelDeselected)
        .expect("event accepted");

    let state = machine.snapshot();
    assert!(!state.is_saved);
    assert!(!state.is_validated);
    assert_eq!(machine.phase(), AnalysisPhase::Editing);
    match machine.execute() {
        Err(GuardRejection::NotReady) => {}
        other => panic!("expected not ready, got {other:?}"),
    }
}

#[test]
fn additive_edit_demotes_saved_to_validated() {
    let mut machine = saved_machine();

    machine
        .apply(ConfigurationEvent::DatasetAdded)
        .expect("event accepted");

    assert_eq!(machine.phase(), AnalysisPhase::Validated);
    assert_eq!(machine.snapshot().allowed_actions(), vec![AnalysisAction::Save]);
}

#[test]
fn rule_edits_clear_saved_without_touching_counts() {
    let mut machine = saved_machine();
    let before = machine.snapshot();

    machine
        .apply(ConfigurationEvent::RulesChanged)
        .expect("event accepted");

    let after = machine.snapshot();
    assert!(!after.is_saved);
    assert_eq!(after.datasets_selected, before.datasets_selected);
    assert_eq!(after.models_selected, before.models_selected);
    assert_eq!(after.option_sets_selected, before.option_sets_selected);
    assert_eq!(machine.phase(), AnalysisPhase::Validated);
}

#[test]
fn execution_is_exclusive() {
    let mut machine = saved_machine();

    let ticket = machine.execute().expect("execution starts");
    assert_eq!(machine.phase(), AnalysisPhase::Executing);

    let before = machine.snapshot();
    match machine.execute() {
        Err(GuardRejection::AlreadyExecuting) => {}
        other => panic!("expected already executing, got {other:?}"),
    }
    assert_eq!(machine.snapshot(), before);
    assert_eq!(machine.running(), Some(&ticket));
}

#[test]
fn configuration_is_locked_while_executing() {
    let mut machine = saved_machine();
    machine.execute().expect("execution starts");
    let before = machine.snapshot();

    assert_eq!(
        machine.apply(ConfigurationEvent::DatasetRemoved),
        Err(GuardRejection::Locked)
    );
    assert_eq!(machine.save(), Err(GuardRejection::Locked));
    assert_eq!(machine.snapshot(), before);
}

#[test]
fn cancel_returns_to_saved_and_discards_late_completion() {
    let mut machine = saved_machine();
    let ticket = machine.execute().expect("execution starts");

    let cancelled = machine.cancel().expect("cancel accepted");
    assert_eq!(cancelled, ticket);
    assert_eq!(machine.phase(), AnalysisPhase::Saved);
    assert!(machine.snapshot().is_saved);

    assert_eq!(machine.complete(&ticket), Completion::Discarded);
    assert_eq!(machine.phase(), AnalysisPhase::Saved);
}

#[test]
fn completion_returns_to_saved_with_configuration_intact() {
    let mut machine = saved_machine();
    let ticket = machine.execute().expect("execution starts");

    assert_eq!(machine.complete(&ticket), Completion::Accepted);

    let state = machine.snapshot();
    assert_eq!(state.phase(), AnalysisPhase::Saved);
    assert!(state.is_saved && state.is_validated);
    assert!(machine.execute().is_ok(), "saved analysis can run again");
}

#[test]
fn cancel_outside_execution_is_rejected() {
    let mut machine = saved_machine();

    assert_eq!(machine.cancel(), Err(GuardRejection::NotExecuting));
    assert_eq!(machine.phase(), AnalysisPhase::Saved);
}

#[test]
fn guard_rejections_leave_state_untouched() {
    let mut machine = complete_machine();
    let before = machine.snapshot();

    assert_eq!(machine.execute(), Err(GuardRejection::NotReady));
    assert_eq!(machine.cancel(), Err(GuardRejection::NotExecuting));
    assert_eq!(machine.snapshot(), before);
}
