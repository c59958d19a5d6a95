use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_logic_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bmds_logic::config::AppConfig;
use bmds_logic::error::AppError;
use bmds_logic::logic::{RecommenderSettings, RuleRegistry};
use bmds_logic::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let settings = RecommenderSettings {
        sufficiently_close_bmdl: config.analysis.sufficiently_close_bmdl,
        ..RecommenderSettings::default()
    };
    let rules = RuleRegistry::global().definitions().len();

    let app = with_logic_routes(settings)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        rules,
        max_option_sets = config.analysis.max_option_sets(),
        "fit classification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
