use crate::infra::InMemoryLauncher;
use crate::report::render_classification;
use bmds_logic::analysis::{
    AnalysisWorkflow, ContinuousBmrType, ContinuousOptions, DichotomousBmrType,
    DichotomousOptions, DistributionType, LitterSpecificCovariate, NestedDichotomousOptions,
    OptionSet, ReadinessChecklist, WorkflowError,
};
use bmds_logic::config::AnalysisConfig;
use bmds_logic::error::AppError;
use bmds_logic::logic::{
    recommend, Bin, ModelDiagnostics, ModelFamily, NamedDiagnostics, RecommenderSettings,
    RuleClass, RuleEdit,
};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Model family for the demo analysis
    #[arg(long, default_value = "continuous")]
    pub(crate) family: ModelFamily,
    /// Cancel the execution instead of letting it complete
    #[arg(long)]
    pub(crate) cancel: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { family, cancel } = args;
    let launcher = Arc::new(InMemoryLauncher::default());
    let config = AnalysisConfig::default();
    let mut workflow = AnalysisWorkflow::new(family, launcher.clone(), &config);

    println!("Analysis readiness demo ({})", family.label());
    print_checklist("New analysis", &workflow.checklist());
    report_rejection("Save before configuring", workflow.save());

    workflow.add_dataset("dataset-1")?;
    workflow.select_model("Hill")?;
    print_checklist("Dataset and model selected", &workflow.checklist());
    workflow.add_option_set(demo_option_set(family))?;
    println!("- phase: {}", workflow.phase().label());

    workflow.save()?;
    print_checklist("Saved", &workflow.checklist());

    let ticket = workflow.execute()?;
    println!(
        "- execution {} started at {} (phase {})",
        ticket.id,
        ticket.started_at.to_rfc3339(),
        workflow.phase().label()
    );
    report_rejection("Execute while running", workflow.execute().map(|_| ()));
    report_rejection("Add dataset while running", workflow.add_dataset("dataset-2").map(|_| ()));

    if cancel {
        workflow.cancel()?;
        println!(
            "- cancelled; abort requested for tickets {:?}",
            launcher.aborted()
        );
    } else {
        let outcome = workflow.complete(&ticket);
        println!("- completion {:?}", outcome);
    }
    println!("- phase: {}", workflow.phase().label());

    workflow.update_rule(
        RuleClass::ResidualNearBmd,
        RuleEdit::FailureBin {
            bin: Bin::Unusable,
        },
    )?;
    print_checklist("Rule edited after run", &workflow.checklist());
    report_rejection("Execute stale configuration", workflow.execute().map(|_| ()));
    println!(
        "- launcher received {} execution request(s)",
        launcher.launched().len()
    );

    println!();
    let classified = workflow.classify(&demo_diagnostics())?;
    let recommendation = recommend(
        &classified,
        &RecommenderSettings {
            sufficiently_close_bmdl: config.sufficiently_close_bmdl,
            ..RecommenderSettings::default()
        },
    );
    render_classification(family, &classified, &recommendation);

    Ok(())
}

fn print_checklist(title: &str, checklist: &ReadinessChecklist) {
    println!("{title}");
    for item in checklist.items() {
        let mark = if item.satisfied { "x" } else { " " };
        println!("  [{mark}] {}", item.label);
    }
}

fn report_rejection(action: &str, result: Result<(), WorkflowError>) {
    match result {
        Ok(()) => println!("- {action}: accepted"),
        Err(err) => println!("- {action}: rejected ({err})"),
    }
}

fn demo_option_set(family: ModelFamily) -> OptionSet {
    let dichotomous = DichotomousOptions {
        bmr_type: DichotomousBmrType::ExtraRisk,
        bmr_value: 0.1,
        confidence_level: 0.95,
    };

    match family {
        ModelFamily::Continuous => OptionSet::Continuous(ContinuousOptions {
            bmr_type: ContinuousBmrType::StandardDeviation,
            bmr_value: 1.0,
            tail_probability: 0.01,
            confidence_level: 0.95,
            dist_type: DistributionType::Normal,
        }),
        ModelFamily::Dichotomous => OptionSet::Dichotomous(dichotomous),
        ModelFamily::MultiTumor => OptionSet::MultiTumor(dichotomous),
        ModelFamily::NestedDichotomous => {
            OptionSet::NestedDichotomous(NestedDichotomousOptions {
                bmr_type: DichotomousBmrType::ExtraRisk,
                bmr_value: 0.1,
                confidence_level: 0.95,
                litter_specific_covariate: LitterSpecificCovariate::OverallMean,
                bootstrap_iterations: 1000,
                bootstrap_seed: 0,
            })
        }
    }
}

fn demo_diagnostics() -> Vec<NamedDiagnostics> {
    let baseline = ModelDiagnostics {
        converged: Some(true),
        aic: Some(184.2),
        gof_p_value: Some(0.41),
        degrees_of_freedom: Some(2.0),
        bmd: Some(18.0),
        bmdl: Some(11.5),
        bmdu: Some(27.0),
        max_dose: Some(100.0),
        min_nonzero_dose: Some(12.5),
        residual_near_bmd: Some(0.8),
        residual_at_control: Some(-0.4),
        control_stdev_modeled: Some(1.2),
        control_stdev_observed: Some(1.1),
        variance_p_value: Some(0.33),
        constant_variance_adequate: Some(true),
        log_posterior: None,
    };

    vec![
        NamedDiagnostics {
            name: "Linear".to_string(),
            diagnostics: ModelDiagnostics {
                aic: Some(189.9),
                bmdl: Some(13.0),
                ..baseline.clone()
            },
        },
        NamedDiagnostics {
            name: "Hill".to_string(),
            diagnostics: ModelDiagnostics {
                residual_near_bmd: Some(2.3),
                ..baseline.clone()
            },
        },
        NamedDiagnostics {
            name: "Power".to_string(),
            diagnostics: baseline.clone(),
        },
        NamedDiagnostics {
            name: "Exponential-M5".to_string(),
            diagnostics: ModelDiagnostics {
                converged: Some(false),
                bmdl: None,
                ..baseline
            },
        },
    ]
}
