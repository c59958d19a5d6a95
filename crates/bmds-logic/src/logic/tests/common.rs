use crate::logic::{
    Bin, ClassifiedModel, ModelClassification, ModelDiagnostics, ModelFamily, RuleClass,
    RuleInstance, RuleRegistry, RuleVerdict, VerdictStatus,
};

pub(super) fn registry() -> &'static RuleRegistry {
    RuleRegistry::global()
}

/// Instance enabled for every family its definition applies to.
pub(super) fn instance(class: RuleClass, threshold: Option<f64>, failure_bin: Bin) -> RuleInstance {
    let definition = registry().lookup(class).expect("class registered");
    let mut instance = RuleInstance::from_definition(definition);
    instance.threshold = threshold;
    instance.failure_bin = failure_bin;
    instance
}

pub(super) fn disabled_for(mut instance: RuleInstance, family: ModelFamily) -> RuleInstance {
    instance.enabled.insert(family, false);
    instance
}

/// Diagnostics of a well-behaved continuous fit that passes every default rule.
pub(super) fn clean_fit() -> ModelDiagnostics {
    ModelDiagnostics {
        converged: Some(true),
        aic: Some(120.4),
        log_posterior: None,
        gof_p_value: Some(0.45),
        degrees_of_freedom: Some(2.0),
        bmd: Some(12.0),
        bmdl: Some(8.0),
        bmdu: Some(18.0),
        max_dose: Some(100.0),
        min_nonzero_dose: Some(10.0),
        residual_near_bmd: Some(0.4),
        residual_at_control: Some(-0.7),
        control_stdev_modeled: Some(1.1),
        control_stdev_observed: Some(1.0),
        variance_p_value: Some(0.6),
        constant_variance_adequate: Some(true),
    }
}

pub(super) fn triggered(class: RuleClass, bin: Bin) -> RuleVerdict {
    RuleVerdict {
        rule_class: class,
        status: VerdictStatus::Triggered,
        bin: Some(bin),
        note: Some(format!("{class} triggered")),
    }
}

pub(super) fn passed(class: RuleClass) -> RuleVerdict {
    RuleVerdict {
        rule_class: class,
        status: VerdictStatus::Passed,
        bin: None,
        note: None,
    }
}

pub(super) fn classified(name: &str, bin: Bin, bmdl: Option<f64>, aic: Option<f64>) -> ClassifiedModel {
    ClassifiedModel {
        name: name.to_string(),
        diagnostics: ModelDiagnostics {
            bmdl,
            aic,
            ..clean_fit()
        },
        classification: ModelClassification {
            overall_bin: bin,
            ..ModelClassification::viable()
        },
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
