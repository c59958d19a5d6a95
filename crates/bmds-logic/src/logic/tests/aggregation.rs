use super::common::*;
use crate::logic::{
    aggregate, classify, Bin, ModelDiagnostics, ModelFamily, RuleClass, RuleSet, RuleVerdict,
    VerdictStatus,
};

#[test]
fn empty_verdicts_are_viable() {
    let classification = aggregate(registry(), Vec::new());

    assert_eq!(classification.overall_bin, Bin::Viable);
    assert!(classification.triggered_rules.is_empty());
    assert!(classification.indeterminate_rules.is_empty());
}

#[test]
fn overall_bin_is_most_severe_triggered_bin() {
    let verdicts = vec![
        triggered(RuleClass::HighBmd, Bin::Viable),
        passed(RuleClass::Gof),
        triggered(RuleClass::ResidualNearBmd, Bin::Questionable),
    ];
    assert_eq!(
        aggregate(registry(), verdicts.clone()).overall_bin,
        Bin::Questionable
    );

    let mut worse = verdicts;
    worse.push(triggered(RuleClass::BmdMissing, Bin::Unusable));
    assert_eq!(aggregate(registry(), worse).overall_bin, Bin::Unusable);
}

#[test]
fn adding_verdicts_never_improves_the_bin() {
    let mut verdicts = vec![triggered(RuleClass::LowBmdFail, Bin::Questionable)];
    let before = aggregate(registry(), verdicts.clone()).overall_bin;

    verdicts.push(passed(RuleClass::Gof));
    verdicts.push(triggered(RuleClass::BmduMissing, Bin::Viable));
    verdicts.push(RuleVerdict::not_applicable(RuleClass::GofCancer));
    let after = aggregate(registry(), verdicts).overall_bin;

    assert!(after >= before);
    assert_eq!(after, Bin::Questionable);
}

#[test]
fn viable_triggers_are_listed_without_worsening_the_bin() {
    let classification = aggregate(
        registry(),
        vec![triggered(RuleClass::BmdBmdlRatioWarning, Bin::Viable)],
    );

    assert_eq!(classification.overall_bin, Bin::Viable);
    assert_eq!(classification.triggered_rules.len(), 1);
    assert_eq!(
        classification.explanations(),
        vec!["[Viable] bmd_bmdl_ratio_warning triggered".to_string()]
    );
}

#[test]
fn listed_verdicts_follow_registry_order() {
    let forward = vec![
        triggered(RuleClass::Gof, Bin::Unusable),
        triggered(RuleClass::HighBmd, Bin::Viable),
        triggered(RuleClass::ControlStdevFit, Bin::Questionable),
    ];
    let mut reversed = forward.clone();
    reversed.reverse();

    let expected = vec![RuleClass::Gof, RuleClass::HighBmd, RuleClass::ControlStdevFit];
    for verdicts in [forward, reversed] {
        let classes: Vec<_> = aggregate(registry(), verdicts)
            .triggered_rules
            .iter()
            .map(|verdict| verdict.rule_class)
            .collect();
        assert_eq!(classes, expected);
    }
}

#[test]
fn unavailable_verdicts_are_indeterminate_not_triggered() {
    let unavailable = RuleVerdict {
        rule_class: RuleClass::VarianceFit,
        status: VerdictStatus::Unavailable,
        bin: None,
        note: Some("value unavailable".to_string()),
    };

    let classification = aggregate(registry(), vec![unavailable]);

    assert_eq!(classification.overall_bin, Bin::Viable);
    assert!(classification.triggered_rules.is_empty());
    assert_eq!(classification.indeterminate_rules.len(), 1);
}

#[test]
fn default_rules_pass_a_clean_continuous_fit() {
    let rules = RuleSet::standard(registry());
    let classification = classify(registry(), &rules, &clean_fit(), ModelFamily::Continuous)
        .expect("classification runs");

    assert_eq!(classification.overall_bin, Bin::Viable);
    assert!(classification.triggered_rules.is_empty());
    assert!(classification.indeterminate_rules.is_empty());
}

#[test]
fn default_rules_flag_a_non_converged_fit_as_unusable() {
    let rules = RuleSet::standard(registry());
    let diagnostics = ModelDiagnostics {
        converged: Some(false),
        bmdl: None,
        residual_near_bmd: Some(2.4),
        ..clean_fit()
    };

    let classification = classify(registry(), &rules, &diagnostics, ModelFamily::Continuous)
        .expect("classification runs");

    assert_eq!(classification.overall_bin, Bin::Unusable);
    let classes: Vec<_> = classification
        .triggered_rules
        .iter()
        .map(|verdict| verdict.rule_class)
        .collect();
    assert!(classes.contains(&RuleClass::FitConverged));
    assert!(classes.contains(&RuleClass::BmdlMissing));
    assert!(classes.contains(&RuleClass::ResidualNearBmd));
    assert!(classification
        .indeterminate_rules
        .iter()
        .any(|verdict| verdict.rule_class == RuleClass::HighBmdl));
}
