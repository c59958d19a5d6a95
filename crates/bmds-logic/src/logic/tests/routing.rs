use super::common::*;
use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::logic::{logic_router, RecommenderSettings, RuleClass};

async fn post_classify(payload: Value) -> axum::response::Response {
    logic_router(RecommenderSettings::default())
        .oneshot(
            axum::http::Request::post("/api/v1/logic/classify")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes")
}

#[tokio::test]
async fn rules_route_lists_catalog_in_registry_order() {
    let response = logic_router(RecommenderSettings::default())
        .oneshot(
            axum::http::Request::get("/api/v1/logic/rules")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let entries = payload.as_array().expect("array payload");
    assert_eq!(entries.len(), RuleClass::ALL.len());
    assert_eq!(entries[0]["rule_class"], json!("gof"));
    assert_eq!(entries[0]["default_record"]["failure_bin"], json!(2));
}

#[tokio::test]
async fn classify_route_reports_bins_and_recommendation() {
    let models = json!([
        {"name": "Linear", "diagnostics": clean_fit()},
        {"name": "Hill", "diagnostics": {"converged": false, "bmd": 3.0, "bmdl": 1.0}},
    ]);

    let response = post_classify(json!({
        "family": "continuous",
        "models": models,
        "recommend": true,
    }))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["models"][0]["overall_bin"], json!(0));
    assert_eq!(payload["models"][1]["overall_bin"], json!(2));
    assert_eq!(payload["models"][1]["overall_bin_label"], json!("Unusable"));
    assert_eq!(payload["recommendation"]["model_name"], json!("Linear"));
}

#[tokio::test]
async fn classify_route_rejects_rules_missing_thresholds() {
    let response = post_classify(json!({
        "family": "dichotomous",
        "rules": [{
            "rule_class": "gof",
            "enabled_continuous": true,
            "enabled_dichotomous": true,
            "enabled_nested": true,
            "threshold": null,
            "failure_bin": 2,
        }],
        "models": [{"name": "Logistic", "diagnostics": clean_fit()}],
    }))
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("gof"));
}

#[tokio::test]
async fn classify_route_rejects_unknown_rule_classes() {
    let response = post_classify(json!({
        "family": "continuous",
        "rules": [{
            "rule_class": "aic_too_low",
            "enabled_continuous": true,
            "enabled_dichotomous": true,
            "enabled_nested": true,
            "failure_bin": 1,
        }],
        "models": [],
    }))
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
