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

use anyhow::Result;
use serde::{Deserialize, Serialize};
use shopify_proxy_core::ShopifyConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Shopify proxy server configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub http: HttpServerConfig,
    #[serde(default)]
    pub mcp: McpConfig,
    #[serde(default)]
    pub shopify: ShopifyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP listen address (e.g., "127.0.0.1:3000")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct McpConfig {
    /// Validate tool queries against the schema on the stdio transport.
    /// The HTTP transport always validates.
    #[serde(default)]
    pub validate_stdio_queries: bool,
}

fn default_http_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_enable_cors() -> bool {
    true
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - SHOPIFY_PROXY_HTTP_ADDR: HTTP listen address (default: 127.0.0.1:3000)
    /// - SHOPIFY_PROXY_ENABLE_CORS: Enable CORS (default: true)
    /// - SHOPIFY_PROXY_VALIDATE_STDIO: Validate queries on stdio (default: false)
    /// - the Shopify variables documented on [`ShopifyConfig`]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().merge_lookup(lookup)
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        Ok(config.merge_lookup(|name| std::env::var(name).ok()))
    }

    /// Override with every variable that is set (env takes priority)
    fn merge_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("SHOPIFY_PROXY_HTTP_ADDR") {
            self.http.listen_addr = addr;
        }
        if let Some(cors) = lookup("SHOPIFY_PROXY_ENABLE_CORS") {
            self.http.enable_cors = cors.parse().unwrap_or(true);
        }
        if let Some(validate) = lookup("SHOPIFY_PROXY_VALIDATE_STDIO") {
            self.mcp.validate_stdio_queries = validate.parse().unwrap_or(false);
        }

        self.shopify.merge_lookup(&lookup);
        self
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.http.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        self.shopify.validate()?;
        Ok(())
    }
}
