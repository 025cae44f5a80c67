pub mod client;
pub mod error;
pub mod types;

pub use client::ElevenLabsClient;
pub use error::ApiError;
pub use types::{AgentDefinition, CreatedAgent, CreatedTool, ToolDefinition};
