use crate::backend::HedgeFundBackend;
use crate::catalog::Catalog;
use crate::form::{CASH_STEP, MAX_MARGIN_REQUIREMENT, MIN_INITIAL_CASH, RunForm};
use crate::runner::{self, RunOutcome};
use anyhow::Result;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const INDEX_HTML: &str = include_str!("../web/index.html");
const APP_JS: &str = include_str!("../web/app.js");

#[derive(Clone)]
struct WebState {
    catalog: Arc<Catalog>,
    backend: Arc<dyn HedgeFundBackend>,
    run: Arc<Mutex<RunRuntimeState>>,
}

#[derive(Clone, Debug, Serialize)]
struct ApiError {
    error: String,
}

/// In-memory only; gone when the server stops.
#[derive(Clone, Debug, Serialize, Default)]
struct RunRuntimeState {
    running: bool,
    in_flight: usize,
    #[serde(skip)]
    latest_run: u64,
    started_at: Option<String>,
    finished_at: Option<String>,
    last_request: Option<RunForm>,
    last_outcome: Option<RunOutcome>,
}

#[derive(Clone, Debug, Serialize)]
struct FormLimits {
    min_initial_cash: u64,
    cash_step: u64,
    max_margin_requirement: u8,
}

#[derive(Clone, Debug, Serialize)]
struct OptionsResponse {
    analysts: Vec<String>,
    models: Vec<String>,
    defaults: RunForm,
    limits: FormLimits,
    backend: String,
}

pub async fn run_webui_server(
    port: u16,
    catalog: Catalog,
    backend: Arc<dyn HedgeFundBackend>,
) -> Result<()> {
    let app = build_router(catalog, backend);

    let addr = format!("0.0.0.0:{}", port);
    info!("WebUI listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(catalog: Catalog, backend: Arc<dyn HedgeFundBackend>) -> Router {
    let state = WebState {
        catalog: Arc::new(catalog),
        backend,
        run: Arc::new(Mutex::new(RunRuntimeState::default())),
    };

    Router::new()
        .route("/", get(index))
        .route("/app.js", get(app_js))
        .route("/api/health", get(health))
        .route("/api/options", get(options))
        .route("/api/state", get(run_state))
        .route("/api/run", post(run_simulation))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn app_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], APP_JS)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn options(State(state): State<WebState>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        analysts: state.catalog.analyst_options(),
        models: state.catalog.model_choices(),
        defaults: RunForm::with_defaults(&state.catalog),
        limits: FormLimits {
            min_initial_cash: MIN_INITIAL_CASH,
            cash_step: CASH_STEP,
            max_margin_requirement: MAX_MARGIN_REQUIREMENT,
        },
        backend: state.backend.describe(),
    })
}

async fn run_state(State(state): State<WebState>) -> Json<RunRuntimeState> {
    Json(state.run.lock().await.clone())
}

async fn run_simulation(
    State(state): State<WebState>,
    payload: Result<Json<RunForm>, JsonRejection>,
) -> Result<Json<RunOutcome>, (StatusCode, Json<ApiError>)> {
    let Json(form) = payload.map_err(|e| api_err(e.status(), &e.body_text()))?;
    let form = form.clamped();

    let run_id = {
        let mut rs = state.run.lock().await;
        if rs.in_flight > 0 {
            warn!("{} simulation(s) already running; starting another one", rs.in_flight);
        }
        rs.in_flight += 1;
        rs.running = true;
        rs.latest_run += 1;
        rs.started_at = Some(chrono::Local::now().to_rfc3339());
        rs.finished_at = None;
        rs.last_request = Some(form.clone());
        rs.last_outcome = None;
        rs.latest_run
    };

    let backend = state.backend.clone();
    let task_form = form.clone();
    let task = tokio::spawn(async move { runner::run(backend.as_ref(), &task_form).await });
    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Simulation task aborted: {}", e);
            RunOutcome::failed(e)
        }
    };

    {
        let mut rs = state.run.lock().await;
        rs.in_flight = rs.in_flight.saturating_sub(1);
        rs.running = rs.in_flight > 0;
        // Only the run that owns `last_request` may record its outcome.
        if rs.latest_run == run_id {
            rs.finished_at = Some(chrono::Local::now().to_rfc3339());
            rs.last_outcome = Some(outcome.clone());
        }
    }

    Ok(Json(outcome))
}

fn api_err(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: message.to_string(),
        }),
    )
}
