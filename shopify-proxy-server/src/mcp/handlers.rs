// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! MCP Request Handlers
//!
//! Handles JSON-RPC 2.0 requests for the MCP protocol. Both front-ends share one handler;
//! they differ only in whether tool queries are validated before dispatch.

use crate::mcp::protocol::*;
use crate::mcp::tools::{ToolContext, ToolRegistry};
use serde::Serialize;
use serde_json::{json, Value};
use shopify_proxy_core::{ApiSurface, ProxyContext};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const SERVER_NAME: &str = "shopify-mcp-proxy";

const STOREFRONT_SCHEMA_URI: &str = "shopify://schemas/storefront";
const ADMIN_SCHEMA_URI: &str = "shopify://schemas/admin";
const GRAPHQL_MIME: &str = "application/graphql";

/// MCP request handler
#[derive(Clone)]
pub struct McpHandler {
    proxy: ProxyContext,
    registry: Arc<ToolRegistry>,
    validate: bool,
}

impl McpHandler {
    pub fn new(proxy: ProxyContext, registry: Arc<ToolRegistry>, validate: bool) -> Self {
        Self {
            proxy,
            registry,
            validate,
        }
    }

    pub fn validates_queries(&self) -> bool {
        self.validate
    }

    /// Handle one raw message as received from a transport
    pub async fn handle_text(&self, text: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                warn!(error = %e, "Unparseable MCP message");
                Some(JsonRpcResponse::error(
                    JsonRpcId::Null,
                    JsonRpcError::parse_error("Parse error"),
                ))
            }
        }
    }

    /// Handle a decoded message that may or may not be a valid request
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<JsonRpcId>(id.clone()).ok())
            .unwrap_or(JsonRpcId::Null);

        match JsonRpcRequest::from_value(value) {
            Ok(request) => self.handle_request(request).await,
            Err(error) => Some(JsonRpcResponse::error(id, error)),
        }
    }

    /// Handle a JSON-RPC request. Notifications are processed but produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        info!(method = %request.method, "MCP request received");

        let id = request.id.clone().unwrap_or(JsonRpcId::Null);
        let is_notification = request.is_notification();
        let outcome = match request.method.as_str() {
            "ping" => Ok(json!({})),

            "initialize" => self.handle_initialize().await,
            "initialized" | "notifications/initialized" => {
                info!("MCP client initialized");
                Ok(json!({}))
            }

            "resources/list" => self.handle_resources_list(),
            "resources/read" => self.handle_resources_read(request.params).await,

            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,

            _ => {
                warn!(method = %request.method, "Unknown MCP method");
                Err(JsonRpcError::method_not_found(&request.method))
            }
        };

        if is_notification {
            return None;
        }

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    async fn handle_initialize(&self) -> Result<Value, JsonRpcError> {
        let versions = ResolvedVersions {
            storefront: self.proxy.versions().resolve_storefront().await,
            admin: self.proxy.versions().resolve_admin().await,
        };

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                resources: Some(ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                }),
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            versions,
            admin_api_enabled: self.proxy.config().admin_enabled(),
        };

        to_result(&result)
    }

    fn handle_resources_list(&self) -> Result<Value, JsonRpcError> {
        let mut resources = vec![Resource {
            uri: STOREFRONT_SCHEMA_URI.to_string(),
            name: "Storefront API schema".to_string(),
            description: Some("GraphQL schema of the Storefront API at the resolved version".to_string()),
            mime_type: Some(GRAPHQL_MIME.to_string()),
        }];
        if self.proxy.config().admin_enabled() {
            resources.push(Resource {
                uri: ADMIN_SCHEMA_URI.to_string(),
                name: "Admin API schema".to_string(),
                description: Some("GraphQL schema of the Admin API at the resolved version".to_string()),
                mime_type: Some(GRAPHQL_MIME.to_string()),
            });
        }

        to_result(&ListResourcesResult { resources })
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let read_params: ReadResourceParams = parse_params(params, "read")?;

        let text = match read_params.uri.as_str() {
            STOREFRONT_SCHEMA_URI => self
                .proxy
                .schemas()
                .get_storefront_schema()
                .await
                .map_err(|e| {
                    error!(error = %e, "Storefront schema unavailable");
                    JsonRpcError::internal_error(format!("Failed to load storefront schema: {}", e))
                })?,
            ADMIN_SCHEMA_URI if self.proxy.config().admin_enabled() => self
                .proxy
                .schemas()
                .get_admin_schema()
                .await
                .ok_or_else(|| JsonRpcError::internal_error("Admin schema is unavailable"))?,
            other => {
                return Err(JsonRpcError::invalid_params(format!("Unknown resource: {}", other)))
            }
        };

        to_result(&ReadResourceResult {
            contents: vec![ResourceContent {
                uri: read_params.uri,
                mime_type: Some(GRAPHQL_MIME.to_string()),
                text: Some(text.to_string()),
            }],
        })
    }

    fn handle_tools_list(&self) -> Result<Value, JsonRpcError> {
        let tools = self.registry.list(self.proxy.config().admin_enabled());
        to_result(&ListToolsResult { tools })
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let call: CallToolParams = parse_params(params, "tool call")?;
        let context = ToolContext {
            proxy: self.proxy.clone(),
            validate: self.validate,
        };

        if let Some(tool) = self.registry.get(&call.name) {
            if tool.surface() == ApiSurface::Admin {
                debug!(tool = %call.name, "Executing Admin tool");
            }
        }

        match self
            .registry
            .execute(&call.name, call.arguments(), &context)
            .await
        {
            Ok(result) => to_result(&result),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                Err(e.into())
            }
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: Option<Value>,
    what: &str,
) -> Result<T, JsonRpcError> {
    let params =
        params.ok_or_else(|| JsonRpcError::invalid_params(format!("Missing {} params", what)))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid {} params: {}", what, e)))
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}
