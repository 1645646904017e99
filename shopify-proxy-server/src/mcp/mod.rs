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

//! Model Context Protocol (MCP) Server Implementation
//!
//! Exposes the Shopify proxy as MCP tools and resources over JSON-RPC 2.0.
//!
//! ## Primitives
//!
//! - **Tools**: one per Storefront or Admin operation (`getShopInfo`, `cartCreate`, ...)
//! - **Resources**: the GraphQL schema of each enabled API surface
//!
//! ## Transports
//!
//! - HTTP: `POST /mcp`, queries validated against the schema before dispatch
//! - stdio: newline-delimited JSON-RPC, validation opt-in

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use handlers::{McpHandler, SERVER_NAME};
pub use protocol::*;
pub use server::{McpServer, McpServerState};
pub use tools::{default_registry, McpTool, RegistrationError, ToolContext, ToolError, ToolRegistry};
pub use transport::{serve, BufferTransport, McpTransport, StdioTransport, TransportError};
