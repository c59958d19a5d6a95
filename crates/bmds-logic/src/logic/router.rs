use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::notes::{plain_text, verdict_label};
use super::{
    recommend, Bin, ClassifiedModel, LogicEngine, ModelFamily, NamedDiagnostics, Recommendation,
    RecommenderSettings, RuleClass, RuleDefinitionView, RuleRecord, RuleRegistry, RuleSet,
};

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub family: ModelFamily,
    /// Analysis rule records; the registry defaults apply when omitted.
    #[serde(default)]
    pub rules: Option<Vec<RuleRecord>>,
    pub models: Vec<NamedDiagnostics>,
    #[serde(default)]
    pub recommend: bool,
}

#[derive(Debug, Serialize)]
pub struct TriggeredRuleView {
    pub rule_class: RuleClass,
    pub name: &'static str,
    pub status: &'static str,
    pub bin: Option<Bin>,
    pub bin_label: Option<&'static str>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassifiedModelView {
    pub name: String,
    pub overall_bin: Bin,
    pub overall_bin_label: &'static str,
    pub triggered_rules: Vec<TriggeredRuleView>,
    pub indeterminate_rules: Vec<RuleClass>,
    pub explanations: Vec<String>,
}

impl ClassifiedModelView {
    fn from_model(model: &ClassifiedModel, registry: &RuleRegistry) -> Self {
        let classification = &model.classification;
        Self {
            name: model.name.clone(),
            overall_bin: classification.overall_bin,
            overall_bin_label: classification.overall_bin.label(),
            triggered_rules: classification
                .triggered_rules
                .iter()
                .map(|verdict| TriggeredRuleView {
                    rule_class: verdict.rule_class,
                    name: registry
                        .lookup(verdict.rule_class)
                        .map(|definition| definition.name)
                        .unwrap_or("unknown rule"),
                    status: verdict_label(verdict),
                    bin: verdict.bin,
                    bin_label: verdict.bin.map(Bin::label),
                    note: verdict.note.as_deref().map(plain_text),
                })
                .collect(),
            indeterminate_rules: classification
                .indeterminate_rules
                .iter()
                .map(|verdict| verdict.rule_class)
                .collect(),
            explanations: classification.explanations(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub family: ModelFamily,
    pub models: Vec<ClassifiedModelView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Serialize)]
pub struct RuleCatalogEntry {
    #[serde(flatten)]
    pub definition: RuleDefinitionView,
    pub default_record: RuleRecord,
}

/// Router exposing the rule catalog and stateless classification.
pub fn logic_router(settings: RecommenderSettings) -> Router {
    Router::new()
        .route("/api/v1/logic/rules", get(rules_handler))
        .route("/api/v1/logic/classify", post(classify_handler))
        .with_state(Arc::new(settings))
}

pub(crate) async fn rules_handler() -> Json<Vec<RuleCatalogEntry>> {
    let registry = RuleRegistry::global();
    let defaults = RuleSet::standard(registry);
    let entries = registry
        .definitions()
        .iter()
        .zip(defaults.records())
        .map(|(definition, default_record)| RuleCatalogEntry {
            definition: definition.view(),
            default_record,
        })
        .collect();
    Json(entries)
}

pub(crate) async fn classify_handler(
    State(settings): State<Arc<RecommenderSettings>>,
    Json(request): Json<ClassifyRequest>,
) -> Response {
    let registry = RuleRegistry::global();
    let rules = match &request.rules {
        Some(records) => RuleSet::from_records(records, registry),
        None => Ok(RuleSet::standard(registry)),
    };

    let classified = rules
        .and_then(LogicEngine::new)
        .and_then(|engine| engine.classify_all(&request.models, request.family));

    match classified {
        Ok(models) => {
            let recommendation = request
                .recommend
                .then(|| recommend(&models, settings.as_ref()));
            let response = ClassifyResponse {
                family: request.family,
                models: models
                    .iter()
                    .map(|model| ClassifiedModelView::from_model(model, registry))
                    .collect(),
                recommendation,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(error) => {
            tracing::warn!(%error, "rejected classification request");
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}
