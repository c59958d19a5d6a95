use crate::infra::load_rule_set;
use bmds_logic::config::AppConfig;
use bmds_logic::error::AppError;
use bmds_logic::logic::notes::{check_or_empty, plain_text, threshold_cell};
use bmds_logic::logic::{
    recommend, Bin, ClassifiedModel, DiagnosticsImporter, LogicEngine, ModelFamily, Recommendation,
    RecommenderSettings, RuleRegistry, RuleSet,
};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct RulesArgs {
    /// Only list rules that apply to this model family
    #[arg(long)]
    pub(crate) family: Option<ModelFamily>,
    /// Emit the default rule records as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// Model family of the fitted models
    #[arg(long)]
    pub(crate) family: ModelFamily,
    /// Diagnostics export (CSV with one row per model, or JSON)
    #[arg(long)]
    pub(crate) diagnostics: PathBuf,
    /// JSON array of rule records; registry defaults when omitted
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Skip the model recommendation
    #[arg(long)]
    pub(crate) no_recommend: bool,
    /// Emit classifications as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_rules(args: RulesArgs) -> Result<(), AppError> {
    let registry = RuleRegistry::global();
    let defaults = RuleSet::standard(registry);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&defaults.records())?);
        return Ok(());
    }

    println!("Rule catalog ({} rules)", registry.definitions().len());
    let legend = Bin::ordered()
        .into_iter()
        .map(|bin| format!("{}={}", bin.label(), bin.code()))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Failure bins: {}", legend);
    for definition in registry.definitions() {
        if let Some(family) = args.family {
            if !definition.applies_to(family) {
                continue;
            }
        }

        let families = ModelFamily::ordered()
            .into_iter()
            .map(|family| {
                format!(
                    "{}={}",
                    family.key(),
                    check_or_empty(definition.applies_to(family))
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "- {:<40} threshold {:<6} bin {:<12} [{}]",
            definition.name,
            threshold_cell(definition, definition.default_threshold),
            definition.default_bin.label(),
            families
        );
        println!("    {}", plain_text(&definition.notes(definition.default_threshold)));
    }

    Ok(())
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let ClassifyArgs {
        family,
        diagnostics,
        rules,
        no_recommend,
        json,
    } = args;

    let config = AppConfig::load()?;
    let models = DiagnosticsImporter::from_path(&diagnostics)?;
    let rules = load_rule_set(rules.as_deref())?;
    let engine = LogicEngine::new(rules)?;
    let classified = engine.classify_all(&models, family)?;

    let settings = RecommenderSettings {
        enabled: !no_recommend,
        sufficiently_close_bmdl: config.analysis.sufficiently_close_bmdl,
        ..RecommenderSettings::default()
    };
    let recommendation = recommend(&classified, &settings);

    if json {
        let payload = serde_json::json!({
            "family": family,
            "models": classified,
            "recommendation": recommendation,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    render_classification(family, &classified, &recommendation);
    Ok(())
}

pub(crate) fn render_classification(
    family: ModelFamily,
    classified: &[ClassifiedModel],
    recommendation: &Recommendation,
) {
    println!(
        "{} models classified as {}",
        classified.len(),
        family.label()
    );
    for model in classified {
        let classification = &model.classification;
        println!("- {}: {}", model.name, classification.overall_bin.label());
        for explanation in classification.explanations() {
            println!("    {}", explanation);
        }
        if !classification.indeterminate_rules.is_empty() {
            let rules = classification
                .indeterminate_rules
                .iter()
                .map(|verdict| verdict.rule_class.key())
                .collect::<Vec<_>>()
                .join(", ");
            println!("    value unavailable: {}", rules);
        }
    }

    match &recommendation.model_name {
        Some(name) => println!("Recommended model: {} ({})", name, recommendation.reason),
        None => println!("No recommended model: {}", recommendation.reason),
    }
}
