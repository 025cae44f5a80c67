use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::ElevenLabsConfig;

use super::error::ApiError;
use super::types::{AgentDefinition, CreatedAgent, CreatedTool, ToolDefinition};

/// Client for the ElevenLabs Conversational-AI resource API.
///
/// One instance wraps one API key and one `reqwest::Client` carrying the
/// configured timeout. All operations return `Result<_, ApiError>`; remote
/// failures and malformed bodies never panic.
#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    http: Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("failed to build HTTP client");
        Self { http, config }
    }

    pub fn config(&self) -> &ElevenLabsConfig {
        &self.config
    }

    /// Issue one authenticated call, retrying transient failures.
    ///
    /// HTTP 429, any 5xx, and transport errors are retried up to the
    /// configured budget, suspending `attempt × backoff_ms` between
    /// attempts. Any other non-success status is surfaced immediately.
    /// Success bodies parse as JSON; an empty body yields `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.execute(method.clone(), path, body).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt <= self.config.retries => {
                    let delay = Duration::from_millis(self.config.backoff_ms * attempt as u64);
                    warn!(
                        "{} {} failed (attempt {}): {}; retrying in {:?}",
                        method, path, attempt, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self
            .http
            .request(method, &url)
            .header("xi-api-key", &self.config.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if status.is_success() {
            Ok(value)
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                body: value,
            })
        }
    }

    /// Register a webhook tool. The caller's parameter schema lands under
    /// `api_schema.request_body_schema`; an empty object schema is sent when
    /// none is provided.
    pub async fn create_tool(&self, tool: &ToolDefinition) -> Result<CreatedTool, ApiError> {
        let schema = tool
            .schema
            .clone()
            .unwrap_or_else(|| json!({ "type": "object", "properties": {} }));
        let payload = json!({
            "name": tool.name,
            "tool_config": {
                "type": "webhook",
                "name": tool.name,
                "description": tool.description,
                "webhook": {
                    "url": tool.webhook_url,
                    "method": "POST",
                },
                "api_schema": {
                    "url": tool.webhook_url,
                    "method": "POST",
                    "headers": { "Content-Type": "application/json" },
                    "request_body_schema": schema,
                },
            },
        });

        let data = self
            .request(Method::POST, "/convai/tools", Some(&payload))
            .await
            .map_err(|err| {
                error!("tool creation failed for {}: {}", tool.name, err);
                err
            })?;
        let tool_id = data
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        debug!("created tool {} ({})", tool.name, tool_id);
        Ok(CreatedTool { tool_id, data })
    }

    /// Create an agent in two phases: a bare named shell first, then a PATCH
    /// with the full conversation configuration. A phase-two failure fails
    /// the whole operation; the shell id is never reported as a success.
    pub async fn create_agent(&self, agent: &AgentDefinition) -> Result<CreatedAgent, ApiError> {
        let name = if agent.name.is_empty() {
            "Assistant"
        } else {
            agent.name.as_str()
        };
        let created = self
            .request(
                Method::POST,
                "/convai/agents/create",
                Some(&json!({ "conversation_config": { "name": name } })),
            )
            .await
            .map_err(|err| {
                error!("agent creation failed for {}: {}", name, err);
                err
            })?;
        let agent_id = created
            .get("agent_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let update = json!({
            "name": name,
            "conversation_config": {
                "agent": {
                    "prompt": {
                        "prompt": agent.prompt,
                        "tool_ids": agent.tool_ids,
                    },
                    "language": agent.language.as_deref()
                        .unwrap_or(&self.config.default_language),
                },
                "tts": {
                    "model_id": agent.model.as_deref()
                        .unwrap_or(&self.config.default_model),
                    "voice_id": agent.voice_id.as_deref()
                        .or(self.config.default_voice_id.as_deref()),
                },
            },
        });
        let data = self
            .request(
                Method::PATCH,
                &format!("/convai/agents/{}", agent_id),
                Some(&update),
            )
            .await
            .map_err(|err| {
                error!("agent configuration failed for {}: {}", agent_id, err);
                err
            })?;

        debug!("created agent {} ({})", name, agent_id);
        Ok(CreatedAgent { agent_id, data })
    }

    /// Attach a tool by merging it into the agent's current tool list.
    ///
    /// Fetch-then-merge-then-write: the PATCH body is the order-preserving,
    /// deduplicated union of the existing ids and the new one, so attaching
    /// never drops previously attached tools. The two steps are not guarded
    /// against a concurrent writer on the same agent; the last write wins on
    /// the merged set.
    pub async fn add_tool_to_agent(
        &self,
        agent_id: &str,
        tool_id: &str,
    ) -> Result<Value, ApiError> {
        let current = self
            .request(Method::GET, &format!("/convai/agents/{}", agent_id), None)
            .await?;
        let existing: Vec<String> = current
            .pointer("/conversation_config/agent/prompt/tool_ids")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut merged: Vec<String> = Vec::with_capacity(existing.len() + 1);
        for id in existing.into_iter().chain([tool_id.to_string()]) {
            if !merged.contains(&id) {
                merged.push(id);
            }
        }

        let payload = json!({
            "conversation_config": {
                "agent": { "prompt": { "tool_ids": merged } }
            }
        });
        self.request(
            Method::PATCH,
            &format!("/convai/agents/{}", agent_id),
            Some(&payload),
        )
        .await
        .map_err(|err| {
            error!("tool attachment failed for agent {}: {}", agent_id, err);
            err
        })
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, &format!("/convai/agents/{}", agent_id), None)
            .await
    }

    pub async fn list_agents(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/convai/agents", None).await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("/convai/agents/{}", agent_id),
            None,
        )
        .await?;
        Ok(())
    }

    /// Voices available to the account, as raw voice documents.
    pub async fn get_voices(&self) -> Result<Vec<Value>, ApiError> {
        let data = self.request(Method::GET, "/voices", None).await?;
        Ok(data
            .get("voices")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}
