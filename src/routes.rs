use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::{json, Value};

use crate::state::AppState;
use crate::webhook::{build_response, WebhookRequest};

pub fn create_routes(state: AppState) -> Router<AppState> {
    let mut router = Router::new().route("/api/health", get(health_check));
    for path in &state.config.system.webhook_paths {
        router = router.route(path, post(webhook_endpoint).get(webhook_probe));
    }
    router
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "webhook_paths": state.config.system.webhook_paths,
    }))
}

/// n8n probes a workflow's webhook URL with GET before activating it.
async fn webhook_probe() -> &'static str {
    "OK"
}

async fn webhook_endpoint(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let request = WebhookRequest::from_value(&body);
    let reply = build_response(&request, Local::now(), &mut rand::thread_rng());
    (reply.status, Json(reply.body))
}
