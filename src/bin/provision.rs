//! Provision the appointment-booking agent: creates the availability tool,
//! then the agent wired to it, and prints both identifiers.

use anyhow::{bail, Context, Result};
use tracing::info;

use rdv_voice_backend::config::Config;
use rdv_voice_backend::elevenlabs::ElevenLabsClient;
use rdv_voice_backend::provisioning::{AgentCreator, CreatorOptions};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("rdv_voice_backend=debug,provision=info")
        .init();

    let config = Config::resolve()?;
    if config.elevenlabs.api_key.is_empty() {
        bail!("ELEVENLABS_API_KEY is not set");
    }

    let creator = AgentCreator::new(ElevenLabsClient::new(config.elevenlabs.clone()));
    let options = CreatorOptions {
        name: std::env::var("AGENT_NAME").ok(),
        ..CreatorOptions::default()
    };

    info!("Creating appointment agent...");
    let provisioned = creator
        .create_appointment_agent(&options)
        .await
        .context("agent provisioning failed")?;

    info!("Agent created: {}", provisioned.agent.agent_id);
    for tool in &provisioned.tools {
        info!("  Tool: {}", tool.tool_id);
    }

    Ok(())
}
