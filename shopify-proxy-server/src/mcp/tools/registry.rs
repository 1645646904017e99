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

//! MCP tool registry with JSON schema validation.

use crate::mcp::protocol::{CallToolResult, JsonRpcError, Tool, ToolAnnotations};
use async_trait::async_trait;
use dashmap::DashMap;
use jsonschema::JSONSchema;
use serde_json::{json, Value};
use shopify_proxy_core::{ApiSurface, GraphqlRequest, ProxyContext, ProxyResult, ValidationOutcome};
use std::sync::Arc;
use thiserror::Error;

/// Message used when a failed upstream call carries no error of its own
pub const TOOL_FAILED_MESSAGE: &str = "Tool execution failed";

/// Tool execution context.
#[derive(Clone)]
pub struct ToolContext {
    pub proxy: ProxyContext,
    /// Run the built query through the validator before dispatch
    pub validate: bool,
}

/// Trait for MCP tools.
///
/// A tool turns its arguments into one GraphQL request against a single surface.
#[async_trait]
pub trait McpTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> &Value;
    fn annotations(&self) -> ToolAnnotations;

    fn surface(&self) -> ApiSurface {
        ApiSurface::Storefront
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError>;

    fn render(&self, _args: &Value, result: ProxyResult) -> CallToolResult {
        CallToolResult::json_block(&result.payload)
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<CallToolResult, ToolError> {
        let request = self.build(&args)?;
        let result = context
            .proxy
            .execute(self.surface(), &request, context.validate)
            .await
            .map_err(ToolError::Validation)?;

        if !result.success {
            return Err(ToolError::Upstream(result));
        }
        Ok(self.render(&args, result))
    }
}

/// Registry for MCP tools.
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn McpTool>>,
    validators: DashMap<String, JSONSchema>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
            validators: DashMap::new(),
        }
    }

    pub fn register(&self, tool: Arc<dyn McpTool>) -> Result<(), RegistrationError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistrationError::DuplicateName(name));
        }

        let schema = tool.input_schema().clone();
        let validator = JSONSchema::options()
            .compile(&schema)
            .map_err(|e| RegistrationError::Schema(e.to_string()))?;
        self.validators.insert(name.clone(), validator);
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn McpTool>> {
        self.tools.get(name).map(|entry| entry.value().clone())
    }

    /// Tools visible to clients, sorted by name. Admin tools are hidden unless enabled.
    pub fn list(&self, admin_enabled: bool) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self
            .tools
            .iter()
            .filter(|entry| admin_enabled || entry.value().surface() != ApiSurface::Admin)
            .map(|entry| {
                let tool = entry.value();
                Tool {
                    name: tool.name().to_string(),
                    description: Some(tool.description().to_string()),
                    input_schema: tool.input_schema().clone(),
                    annotations: Some(tool.annotations()),
                }
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn validate_args(&self, name: &str, params: &Value) -> Result<(), ToolError> {
        let validator = self
            .validators
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if let Err(errors) = validator.validate(params) {
            let message: String = errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ToolError::InvalidParams(message));
        }
        Ok(())
    }

    pub async fn execute(
        &self,
        name: &str,
        params: Value,
        context: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if tool.surface() == ApiSurface::Admin && !context.proxy.config().admin_enabled() {
            return Err(ToolError::AdminDisabled(name.to_string()));
        }

        self.validate_args(name, &params)?;
        tool.execute(params, context).await
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("Tool '{0}' requires Admin API, which is disabled.")]
    AdminDisabled(String),
    #[error("Invalid tool params: {0}")]
    InvalidParams(String),
    #[error("GraphQL query validation failed")]
    Validation(ValidationOutcome),
    #[error("{}", .0.first_error_message().unwrap_or(TOOL_FAILED_MESSAGE))]
    Upstream(ProxyResult),
}

impl From<ToolError> for JsonRpcError {
    fn from(error: ToolError) -> Self {
        let message = error.to_string();
        match error {
            ToolError::NotFound(_) => JsonRpcError {
                code: crate::mcp::protocol::METHOD_NOT_FOUND,
                message,
                data: None,
            },
            ToolError::AdminDisabled(_) => JsonRpcError::internal_error(message),
            ToolError::InvalidParams(_) => JsonRpcError::invalid_params(message),
            ToolError::Validation(outcome) => {
                JsonRpcError::invalid_params(message).with_data(json!(outcome.errors))
            }
            ToolError::Upstream(result) => {
                JsonRpcError::internal_error(message).with_data(result.payload)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),
    #[error("Invalid schema: {0}")]
    Schema(String),
}
