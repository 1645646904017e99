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

//! Admin API tools. Listed and callable only when the Admin API is enabled.

use super::args::{optional, str_arg};
use super::registry::{McpTool, ToolError};
use crate::mcp::protocol::ToolAnnotations;
use async_trait::async_trait;
use serde_json::{json, Value};
use shopify_proxy_core::{ApiSurface, GraphqlRequest};
use std::sync::Arc;

pub fn tools() -> Vec<Arc<dyn McpTool>> {
    vec![
        Arc::new(GetCustomerById::new()),
        Arc::new(CreateProduct::new()),
        Arc::new(AdminQuery::new()),
    ]
}

pub struct GetCustomerById {
    schema: Value,
}

impl GetCustomerById {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "customerId": {
                        "type": "string",
                        "description": "The GID of the customer (e.g., 'gid://shopify/Customer/123')."
                    }
                },
                "required": ["customerId"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetCustomerById {
    fn name(&self) -> &str {
        "getCustomerById"
    }

    fn description(&self) -> &str {
        "Retrieves a specific customer using the Admin API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn surface(&self) -> ApiSurface {
        ApiSurface::Admin
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        Ok(GraphqlRequest::new(
            "query GetCustomer($id: ID!) { customer(id: $id) { id email firstName lastName phone } }",
        )
        .with_variables(json!({ "id": str_arg(args, "customerId")? })))
    }
}

pub struct CreateProduct {
    schema: Value,
}

impl CreateProduct {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "object",
                        "description": "ProductInput object (title, vendor, productType, ...)."
                    }
                },
                "required": ["input"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for CreateProduct {
    fn name(&self) -> &str {
        "createProduct"
    }

    fn description(&self) -> &str {
        "Creates a new product using the Admin API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::mutation(false)
    }

    fn surface(&self) -> ApiSurface {
        ApiSurface::Admin
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let input = optional(args, "input")
            .filter(|input| input.is_object())
            .ok_or_else(|| ToolError::InvalidParams("'input' must be an object".to_string()))?;

        let mutation = r#"mutation ProductCreate($input: ProductInput!) {
  productCreate(input: $input) {
    product {
      id
      title
      handle
      vendor
      status
    }
    userErrors {
      field
      message
    }
  }
}"#;
        Ok(GraphqlRequest::new(mutation).with_variables(json!({ "input": input })))
    }
}

/// Client-supplied Admin query or mutation
pub struct AdminQuery {
    schema: Value,
}

impl AdminQuery {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "GraphQL query or mutation text." },
                    "variables": { "type": "object", "description": "Variables for the operation." }
                },
                "required": ["query"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for AdminQuery {
    fn name(&self) -> &str {
        "adminQuery"
    }

    fn description(&self) -> &str {
        "Runs an arbitrary GraphQL operation against the Admin API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            read_only_hint: false,
            destructive_hint: true,
            idempotent_hint: false,
        }
    }

    fn surface(&self) -> ApiSurface {
        ApiSurface::Admin
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let variables = optional(args, "variables")
            .filter(|variables| variables.is_object())
            .cloned()
            .unwrap_or(Value::Null);
        Ok(GraphqlRequest::new(str_arg(args, "query")?).with_variables(variables))
    }
}
