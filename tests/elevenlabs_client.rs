use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use rdv_voice_backend::config::ElevenLabsConfig;
use rdv_voice_backend::elevenlabs::{AgentDefinition, ApiError, ElevenLabsClient, ToolDefinition};

/// Serve a scripted stand-in for the remote API on an ephemeral port.
async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> ElevenLabsClient {
    ElevenLabsClient::new(ElevenLabsConfig {
        api_key: "test-key".to_string(),
        base_url: format!("http://{}", addr),
        timeout_ms: 2_000,
        retries: 2,
        backoff_ms: 10,
        ..ElevenLabsConfig::default()
    })
}

#[tokio::test]
async fn two_transient_failures_then_success_takes_three_attempts() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = hits.clone();
    let router = Router::new().route(
        "/convai/agents",
        get(move |headers: HeaderMap| {
            let hits = handler_hits.clone();
            async move {
                if headers.get("xi-api-key").map(|v| v.as_bytes()) != Some(b"test-key") {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "no key" })));
                }
                let attempt = hits.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({ "error": "overloaded" })),
                    )
                } else {
                    (StatusCode::OK, Json(json!({ "agents": [] })))
                }
            }
        }),
    );
    let client = client_for(serve(router).await);

    let started = Instant::now();
    let agents = client.list_agents().await.unwrap();
    // backoff steps of 10ms and 20ms must both have elapsed
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(agents["agents"], json!([]));
}

#[tokio::test]
async fn exhausted_retry_budget_surfaces_the_final_failure() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = hits.clone();
    let router = Router::new().route(
        "/convai/agents",
        get(move || {
            let hits = handler_hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "still overloaded" })),
                )
            }
        }),
    );
    let client = client_for(serve(router).await);

    let err = client.list_agents().await.unwrap_err();
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body["error"], "still overloaded");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn permanent_failures_are_never_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = hits.clone();
    let router = Router::new().route(
        "/convai/agents/:id",
        get(move || {
            let hits = handler_hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "detail": "agent not found" })),
                )
            }
        }),
    );
    let client = client_for(serve(router).await);

    let err = client.get_agent("agent_missing").await.unwrap_err();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn transport_failures_are_retried_then_surfaced() {
    // Grab a port with no listener behind it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(addr);

    let started = Instant::now();
    let err = client.list_agents().await.unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert!(matches!(err, ApiError::Transport { .. }));
}

type SharedTools = Arc<Mutex<Vec<String>>>;

fn agent_document(ids: Vec<String>) -> Value {
    json!({
        "agent_id": "agent_1",
        "conversation_config": { "agent": { "prompt": { "tool_ids": ids } } },
    })
}

fn merge_router(tools: SharedTools) -> Router {
    async fn fetch(State(tools): State<SharedTools>) -> Json<Value> {
        Json(agent_document(tools.lock().unwrap().clone()))
    }

    async fn patch(State(tools): State<SharedTools>, Json(body): Json<Value>) -> Json<Value> {
        let ids: Vec<String> = body
            .pointer("/conversation_config/agent/prompt/tool_ids")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        *tools.lock().unwrap() = ids.clone();
        Json(agent_document(ids))
    }

    Router::new()
        .route("/convai/agents/:id", get(fetch).patch(patch))
        .with_state(tools)
}

#[tokio::test]
async fn attaching_a_tool_merges_with_existing_ones() {
    let tools: SharedTools = Arc::new(Mutex::new(vec!["tool_a".to_string()]));
    let client = client_for(serve(merge_router(tools.clone())).await);

    let updated = client.add_tool_to_agent("agent_1", "tool_b").await.unwrap();
    assert_eq!(
        updated.pointer("/conversation_config/agent/prompt/tool_ids"),
        Some(&json!(["tool_a", "tool_b"]))
    );
    assert_eq!(*tools.lock().unwrap(), vec!["tool_a", "tool_b"]);
}

#[tokio::test]
async fn attaching_the_same_tool_twice_is_idempotent() {
    let tools: SharedTools = Arc::new(Mutex::new(vec!["tool_a".to_string()]));
    let client = client_for(serve(merge_router(tools.clone())).await);

    client.add_tool_to_agent("agent_1", "tool_b").await.unwrap();
    client.add_tool_to_agent("agent_1", "tool_b").await.unwrap();
    assert_eq!(*tools.lock().unwrap(), vec!["tool_a", "tool_b"]);
}

#[tokio::test]
async fn attaching_handles_agents_with_no_tool_list() {
    let router = Router::new().route(
        "/convai/agents/:id",
        get(|| async { Json(json!({ "agent_id": "agent_1" })) }).patch(
            |Json(body): Json<Value>| async move { Json(body) },
        ),
    );
    let client = client_for(serve(router).await);

    let updated = client.add_tool_to_agent("agent_1", "tool_b").await.unwrap();
    assert_eq!(
        updated.pointer("/conversation_config/agent/prompt/tool_ids"),
        Some(&json!(["tool_b"]))
    );
}

#[tokio::test]
async fn create_tool_posts_the_webhook_binding_and_returns_the_id() {
    let captured: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let handler_captured = captured.clone();
    let router = Router::new().route(
        "/convai/tools",
        post(move |Json(body): Json<Value>| {
            let captured = handler_captured.clone();
            async move {
                *captured.lock().unwrap() = Some(body);
                Json(json!({ "id": "tool_9" }))
            }
        }),
    );
    let client = client_for(serve(router).await);

    let schema = json!({
        "type": "object",
        "properties": { "tool": { "type": "string" } },
        "required": ["tool"],
    });
    let created = client
        .create_tool(&ToolDefinition {
            name: "checkavailability".to_string(),
            description: "Vérifie les disponibilités".to_string(),
            webhook_url: "http://localhost:3000/webhook/appointment-webhook".to_string(),
            schema: Some(schema.clone()),
        })
        .await
        .unwrap();

    assert_eq!(created.tool_id, "tool_9");
    let body = captured.lock().unwrap().take().unwrap();
    assert_eq!(body["tool_config"]["type"], "webhook");
    assert_eq!(body["tool_config"]["webhook"]["method"], "POST");
    assert_eq!(
        body["tool_config"]["webhook"]["url"],
        "http://localhost:3000/webhook/appointment-webhook"
    );
    assert_eq!(body["tool_config"]["api_schema"]["request_body_schema"], schema);
}

#[tokio::test]
async fn create_agent_patches_the_shell_with_the_full_configuration() {
    let captured: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let handler_captured = captured.clone();
    let router = Router::new()
        .route(
            "/convai/agents/create",
            post(|| async { Json(json!({ "agent_id": "agent_123" })) }),
        )
        .route(
            "/convai/agents/:id",
            axum::routing::patch(move |Json(body): Json<Value>| {
                let captured = handler_captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(json!({ "agent_id": "agent_123", "status": "configured" }))
                }
            }),
        );
    let client = client_for(serve(router).await);

    let created = client
        .create_agent(&AgentDefinition {
            name: "Assistant Rendez-vous".to_string(),
            prompt: "Prends des rendez-vous.".to_string(),
            tool_ids: vec!["tool_9".to_string()],
            ..AgentDefinition::default()
        })
        .await
        .unwrap();

    assert_eq!(created.agent_id, "agent_123");
    let body = captured.lock().unwrap().take().unwrap();
    assert_eq!(
        body.pointer("/conversation_config/agent/prompt/tool_ids"),
        Some(&json!(["tool_9"]))
    );
    // client-level defaults fill the unset fields
    assert_eq!(
        body.pointer("/conversation_config/agent/language"),
        Some(&json!("fr"))
    );
    assert_eq!(
        body.pointer("/conversation_config/tts/model_id"),
        Some(&json!("eleven_turbo_v2_5"))
    );
}

#[tokio::test]
async fn a_failed_configuration_phase_fails_the_whole_creation() {
    let router = Router::new()
        .route(
            "/convai/agents/create",
            post(|| async { Json(json!({ "agent_id": "agent_123" })) }),
        )
        .route(
            "/convai/agents/:id",
            axum::routing::patch(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": "invalid voice_id" })),
                )
            }),
        );
    let client = client_for(serve(router).await);

    let err = client
        .create_agent(&AgentDefinition {
            name: "Assistant".to_string(),
            prompt: "Bonjour.".to_string(),
            ..AgentDefinition::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn delete_agent_accepts_an_empty_body() {
    let router = Router::new().route(
        "/convai/agents/:id",
        delete(|| async { StatusCode::NO_CONTENT }),
    );
    let client = client_for(serve(router).await);

    client.delete_agent("agent_1").await.unwrap();
}

#[tokio::test]
async fn get_voices_unwraps_the_voices_array() {
    let router = Router::new().route(
        "/voices",
        get(|| async {
            Json(json!({
                "voices": [
                    { "voice_id": "v1", "name": "Charlotte" },
                    { "voice_id": "v2", "name": "Antoine" },
                ]
            }))
        }),
    );
    let client = client_for(serve(router).await);

    let voices = client.get_voices().await.unwrap();
    assert_eq!(voices.len(), 2);
    assert_eq!(voices[0]["voice_id"], "v1");
}
