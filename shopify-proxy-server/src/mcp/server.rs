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

//! MCP Server Implementation
//!
//! JSON-RPC over HTTP POST. Error responses carry an HTTP status derived from the
//! JSON-RPC error code; notifications are acknowledged with 202 and no body.

use crate::mcp::handlers::McpHandler;
use crate::mcp::protocol::*;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

/// MCP Server state
#[derive(Clone)]
pub struct McpServerState {
    pub handler: Arc<McpHandler>,
}

/// MCP Server
pub struct McpServer {
    state: McpServerState,
}

impl McpServer {
    pub fn new(handler: McpHandler) -> Self {
        Self {
            state: McpServerState {
                handler: Arc::new(handler),
            },
        }
    }

    /// Get the Axum router for the MCP server
    pub fn router(&self) -> Router {
        Router::new()
            .route("/mcp", post(handle_mcp_request))
            .with_state(self.state.clone())
    }
}

/// Handle MCP JSON-RPC request over HTTP POST
async fn handle_mcp_request(State(state): State<McpServerState>, body: Bytes) -> Response {
    let response = match std::str::from_utf8(&body) {
        Ok(text) => state.handler.handle_text(text).await,
        Err(_) => Some(JsonRpcResponse::error(
            JsonRpcId::Null,
            JsonRpcError::parse_error("Parse error"),
        )),
    };

    match response {
        Some(response) => {
            let status = StatusCode::from_u16(response.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(response)).into_response()
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}
