use serde_json::Value;

/// A webhook tool to register on the ConvAI platform.
///
/// Tools are create-only from this side: changing one means creating a
/// replacement and re-linking it.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Delivery target the voice platform calls when the agent uses the tool.
    pub webhook_url: String,
    /// JSON-Schema description of the parameters the agent may send. `None`
    /// falls back to an empty object schema.
    pub schema: Option<Value>,
}

/// A voice agent to create. `None` fields fall back to the client-level
/// defaults from the configuration.
#[derive(Debug, Clone, Default)]
pub struct AgentDefinition {
    pub name: String,
    pub prompt: String,
    pub language: Option<String>,
    pub voice_id: Option<String>,
    /// Text-to-speech model id.
    pub model: Option<String>,
    pub tool_ids: Vec<String>,
}

/// Remote handle plus the raw creation payload for a registered tool.
#[derive(Debug, Clone)]
pub struct CreatedTool {
    pub tool_id: String,
    pub data: Value,
}

/// Remote handle plus the configured-agent document.
#[derive(Debug, Clone)]
pub struct CreatedAgent {
    pub agent_id: String,
    pub data: Value,
}
