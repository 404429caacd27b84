//! Structure Calc HTTP Server

use axum::{
    extract::Json,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

use structure_calc::loads::analysis_label;
use structure_calc::prelude::*;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    model: StructureInput,
    #[serde(default)]
    options: Option<CalcOptions>,
}

#[derive(Debug, Serialize)]
struct AnalysisResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    report: RunReport,
}

#[derive(Debug, Serialize)]
struct CombinationData {
    name: String,
    analysis_type: &'static str,
    factors: std::collections::BTreeMap<String, f64>,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn combinations() -> impl IntoResponse {
    let table = CombinationTable::standard();
    let data: Vec<CombinationData> = table
        .iter()
        .map(|c| CombinationData {
            name: c.name.clone(),
            analysis_type: analysis_label(&c.name),
            factors: c.factors.clone(),
        })
        .collect();
    Json(data)
}

async fn analyze(Json(request): Json<AnalysisRequest>) -> impl IntoResponse {
    let options = request.options.unwrap_or_default();
    let report = Pipeline::new(options).run(&request.model);

    let success = report.state == RunState::ResultsExtracted;
    let error = match (&report.solver_error, success) {
        (Some(e), _) => Some(e.clone()),
        (None, false) => report.warnings.last().cloned(),
        (None, true) => None,
    };
    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (
        status,
        Json(AnalysisResponse {
            success,
            error,
            report,
        }),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/v1/combinations", get(combinations))
        .route("/api/v1/analyze", post(analyze))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8086));
    println!("Structure Calc Server listening on http://{}", addr);
    println!("  Health check: GET  /health");
    println!("  Combinations: GET  /api/v1/combinations");
    println!("  Analysis:     POST /api/v1/analyze");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
