use serde_json::json;
use tracing::warn;

use crate::elevenlabs::{
    AgentDefinition, ApiError, CreatedAgent, CreatedTool, ElevenLabsClient, ToolDefinition,
};

const APPOINTMENT_PROMPT: &str = "\
Assistant vocal pour prise de rendez-vous.
Demande poliment le nom, l'email et l'heure souhaitée.
Utilise le tool checkavailability pour vérifier les disponibilités.
Confirme toujours les informations avant de finaliser.
Parle en français de manière professionnelle et amicale.";

const SUPPORT_PROMPT: &str = "\
Assistant de support client professionnel.
Écoute attentivement les problèmes des clients.
Propose des solutions adaptées.
Escalade vers un humain si nécessaire.
Reste toujours courtois et empathique.";

const SALES_PROMPT: &str = "\
Assistant commercial expert et persuasif.
Présente les produits de manière attrayante.
Identifie les besoins du client.
Propose des solutions adaptées.
Guide vers l'achat de manière naturelle.";

/// Overrides for a preset agent. `None` falls back to the preset default or
/// to the client configuration.
#[derive(Debug, Clone, Default)]
pub struct CreatorOptions {
    pub name: Option<String>,
    pub language: Option<String>,
    pub voice_id: Option<String>,
    pub prompt: Option<String>,
    pub webhook_url: Option<String>,
}

/// Outcome of provisioning one preset: the agent plus every tool that was
/// actually registered.
#[derive(Debug)]
pub struct ProvisionedAgent {
    pub agent: CreatedAgent,
    pub tools: Vec<CreatedTool>,
}

/// Higher-level creators with predefined tool sets, on top of
/// [`ElevenLabsClient`].
pub struct AgentCreator {
    client: ElevenLabsClient,
}

impl AgentCreator {
    pub fn new(client: ElevenLabsClient) -> Self {
        Self { client }
    }

    /// Appointment-booking agent with a single availability/booking tool.
    /// The tool is mandatory: its failure aborts the whole provisioning.
    pub async fn create_appointment_agent(
        &self,
        options: &CreatorOptions,
    ) -> Result<ProvisionedAgent, ApiError> {
        let tool = self
            .client
            .create_tool(&ToolDefinition {
                name: "checkavailability".to_string(),
                description: "Vérifie les disponibilités et réserve un rendez-vous"
                    .to_string(),
                webhook_url: self.webhook_url(options, "/appointment"),
                schema: Some(json!({
                    "type": "object",
                    "properties": {
                        "action": {
                            "type": "string",
                            "description": "check pour vérifier, book pour réserver"
                        },
                        "name": { "type": "string", "description": "Nom du client" },
                        "email": { "type": "string", "description": "Email du client" },
                        "dateTime": {
                            "type": "string",
                            "description": "Date et heure souhaitées (format ISO)"
                        },
                    }
                })),
            })
            .await?;

        let agent = self
            .create_agent_with_tools(
                options,
                "Assistant Rendez-vous",
                APPOINTMENT_PROMPT,
                vec![tool.tool_id.clone()],
            )
            .await?;
        Ok(ProvisionedAgent {
            agent,
            tools: vec![tool],
        })
    }

    /// Customer-support agent with ticket-creation and FAQ-search tools.
    /// Tools that fail to register are skipped.
    pub async fn create_support_agent(
        &self,
        options: &CreatorOptions,
    ) -> Result<ProvisionedAgent, ApiError> {
        let base = self.webhook_url(options, "/support");
        let tools = self
            .create_tools(vec![
                ToolDefinition {
                    name: "create_ticket".to_string(),
                    description: "Créer un ticket de support".to_string(),
                    webhook_url: format!("{}/ticket", base),
                    schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "subject": { "type": "string", "description": "Sujet du problème" },
                            "description": { "type": "string", "description": "Description détaillée" },
                            "priority": { "type": "string", "description": "low, medium, high" },
                            "customerEmail": { "type": "string", "description": "Email du client" },
                        }
                    })),
                },
                ToolDefinition {
                    name: "search_faq".to_string(),
                    description: "Rechercher dans la base de connaissances".to_string(),
                    webhook_url: format!("{}/faq", base),
                    schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "query": { "type": "string", "description": "Question ou mots-clés" },
                        }
                    })),
                },
            ])
            .await;

        let tool_ids = tools.iter().map(|t| t.tool_id.clone()).collect();
        let agent = self
            .create_agent_with_tools(options, "Support Client", SUPPORT_PROMPT, tool_ids)
            .await?;
        Ok(ProvisionedAgent { agent, tools })
    }

    /// Sales agent with product-info and quote tools. Tools that fail to
    /// register are skipped.
    pub async fn create_sales_agent(
        &self,
        options: &CreatorOptions,
    ) -> Result<ProvisionedAgent, ApiError> {
        let base = self.webhook_url(options, "/sales");
        let tools = self
            .create_tools(vec![
                ToolDefinition {
                    name: "get_product_info".to_string(),
                    description: "Obtenir les détails d'un produit".to_string(),
                    webhook_url: format!("{}/product", base),
                    schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "productId": { "type": "string", "description": "ID ou nom du produit" },
                        }
                    })),
                },
                ToolDefinition {
                    name: "calculate_quote".to_string(),
                    description: "Calculer un devis personnalisé".to_string(),
                    webhook_url: format!("{}/quote", base),
                    schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "products": {
                                "type": "array",
                                "description": "Liste des produits",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id": { "type": "string" },
                                        "quantity": { "type": "number" },
                                    }
                                }
                            },
                            "customerEmail": {
                                "type": "string",
                                "description": "Email pour envoyer le devis"
                            },
                        }
                    })),
                },
            ])
            .await;

        let tool_ids = tools.iter().map(|t| t.tool_id.clone()).collect();
        let agent = self
            .create_agent_with_tools(options, "Assistant Commercial", SALES_PROMPT, tool_ids)
            .await?;
        Ok(ProvisionedAgent { agent, tools })
    }

    /// Fully custom agent: register the supplied tools (failures skipped),
    /// then create the agent with the surviving ids appended.
    pub async fn create_custom_agent(
        &self,
        mut agent: AgentDefinition,
        tools: Vec<ToolDefinition>,
    ) -> Result<ProvisionedAgent, ApiError> {
        let created_tools = self.create_tools(tools).await;
        agent
            .tool_ids
            .extend(created_tools.iter().map(|t| t.tool_id.clone()));
        let created = self.client.create_agent(&agent).await?;
        Ok(ProvisionedAgent {
            agent: created,
            tools: created_tools,
        })
    }

    async fn create_tools(&self, definitions: Vec<ToolDefinition>) -> Vec<CreatedTool> {
        let mut tools = Vec::with_capacity(definitions.len());
        for definition in definitions {
            match self.client.create_tool(&definition).await {
                Ok(tool) => tools.push(tool),
                Err(err) => warn!("skipping tool {}: {}", definition.name, err),
            }
        }
        tools
    }

    async fn create_agent_with_tools(
        &self,
        options: &CreatorOptions,
        default_name: &str,
        default_prompt: &str,
        tool_ids: Vec<String>,
    ) -> Result<CreatedAgent, ApiError> {
        self.client
            .create_agent(&AgentDefinition {
                name: options
                    .name
                    .clone()
                    .unwrap_or_else(|| default_name.to_string()),
                prompt: options
                    .prompt
                    .clone()
                    .unwrap_or_else(|| default_prompt.to_string()),
                language: options.language.clone(),
                voice_id: options.voice_id.clone(),
                model: None,
                tool_ids,
            })
            .await
    }

    fn webhook_url(&self, options: &CreatorOptions, suffix: &str) -> String {
        options.webhook_url.clone().unwrap_or_else(|| {
            let base = self
                .client
                .config()
                .webhook_base_url
                .clone()
                .unwrap_or_default();
            format!("{}{}", base, suffix)
        })
    }
}
