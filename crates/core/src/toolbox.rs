//! In-process MCP client for the teaching tools.

use crate::tools::TeachingTools;
use anyhow::{Context, Result};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolArgs, FunctionObjectArgs};
use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParam, RawContent},
    service::{RoleClient, RunningService},
};
use serde_json::{Map, Value, json};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Something that can describe and execute the tools offered to the model.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Chat-completion definitions of every available tool.
    fn definitions(&self) -> &[ChatCompletionTool];

    /// Runs a tool with the JSON `arguments` the model produced and returns the
    /// text handed back to the model.
    async fn call_tool(&self, name: &str, arguments: &str) -> Result<String>;
}

/// An MCP client connected to a [`TeachingTools`] server over an in-memory pipe.
pub struct ToolBox {
    client: RunningService<RoleClient, ()>,
    definitions: Vec<ChatCompletionTool>,
    server_handle: JoinHandle<()>,
}

impl ToolBox {
    /// Spawns the tool server and connects a client to it.
    pub async fn start(tools: TeachingTools) -> Result<Self> {
        let (server_transport, client_transport) = tokio::io::duplex(4096);

        let server_handle = tokio::spawn(async move {
            match tools.serve(server_transport).await {
                Ok(service) => {
                    let _ = service.waiting().await;
                }
                Err(e) => error!(error = ?e, "Teaching tool server failed to start"),
            }
        });
        let client = ()
            .serve(client_transport)
            .await
            .context("Failed to connect to the teaching tool server")?;

        let definitions = client
            .list_all_tools()
            .await?
            .into_iter()
            .map(|t| {
                Ok(ChatCompletionToolArgs::default()
                    .function(
                        FunctionObjectArgs::default()
                            .name(t.name)
                            .description(t.description.unwrap_or_default())
                            .parameters(serde_json::to_value(&*t.input_schema)?)
                            .build()?,
                    )
                    .build()?)
            })
            .collect::<Result<Vec<_>>>()?;
        info!(tool_count = definitions.len(), "Teaching tools ready");

        Ok(Self {
            client,
            definitions,
            server_handle,
        })
    }
}

impl Drop for ToolBox {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

#[async_trait]
impl ToolInvoker for ToolBox {
    fn definitions(&self) -> &[ChatCompletionTool] {
        &self.definitions
    }

    async fn call_tool(&self, name: &str, arguments: &str) -> Result<String> {
        let arguments: Map<String, Value> = if arguments.trim().is_empty() {
            Map::new()
        } else {
            serde_json::from_str(arguments)
                .with_context(|| format!("Tool '{}' got arguments that are not a JSON object", name))?
        };

        let result = self
            .client
            .peer()
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: Some(arguments),
            })
            .await?;

        let annotated_content = result
            .content
            .context("Tool call returned no content")?
            .pop()
            .context("Content list was empty")?;
        let text = match annotated_content.raw {
            RawContent::Text(text_content) => text_content.text,
            _ => "{\"error\": \"Unexpected content type from tool\"}".to_string(),
        };

        if result.is_error.unwrap_or(false) {
            Ok(json!({ "error": text }).to_string())
        } else {
            Ok(text)
        }
    }
}
