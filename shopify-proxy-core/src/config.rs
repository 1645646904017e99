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

//! Shopify connection settings.
//!
//! Resolved once at startup and shared read-only for the lifetime of the process.
//! Supported environment variables:
//! - SHOPIFY_STORE: store domain (e.g. `your-store.myshopify.com`); unset means mock shop
//! - SHOPIFY_ACCESS_TOKEN: Storefront API access token
//! - SHOPIFY_VERSION: pinned Storefront API version (e.g. `2025-01`)
//! - USE_ADMIN_API: `true` or `1` to enable the Admin API
//! - ADMIN_ACCESS_TOKEN: Admin API access token
//! - ADMIN_VERSION: pinned Admin API version
//! - SHOPIFY_SCHEMA_DIR: directory for cached schema files (default: ./schemas)
//! - SHOPIFY_MOCK_SHOP_URL: origin of the public mock shop (default: https://mock.shop)

use crate::error::ConfigError;
use crate::surface::ApiSurface;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MOCK_SHOP_URL: &str = "https://mock.shop";

/// Version list cache lifetime (5 minutes)
pub const DEFAULT_DISCOVERY_TTL_SECS: u64 = 300;

#[derive(Clone, Deserialize, Serialize)]
pub struct ShopifyConfig {
    /// Store domain, `None` selects the mock shop
    #[serde(default)]
    pub store_domain: Option<String>,

    /// Public Storefront API token, required for a real store
    #[serde(default)]
    pub storefront_access_token: Option<String>,

    /// Pinned Storefront API version, `None` means latest supported
    #[serde(default)]
    pub storefront_api_version: Option<String>,

    #[serde(default)]
    pub admin: AdminApiConfig,

    /// Directory holding `schema-<surface>-<version>.graphql` files
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    #[serde(default = "default_mock_shop_url")]
    pub mock_shop_url: String,

    #[serde(default = "default_discovery_ttl")]
    pub discovery_ttl_secs: u64,
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AdminApiConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Private Admin API token, required when enabled
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub api_version: Option<String>,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("./schemas")
}

fn default_mock_shop_url() -> String {
    DEFAULT_MOCK_SHOP_URL.to_string()
}

fn default_discovery_ttl() -> u64 {
    DEFAULT_DISCOVERY_TTL_SECS
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            store_domain: None,
            storefront_access_token: None,
            storefront_api_version: None,
            admin: AdminApiConfig::default(),
            schema_dir: default_schema_dir(),
            mock_shop_url: default_mock_shop_url(),
            discovery_ttl_secs: default_discovery_ttl(),
        }
    }
}

impl fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store_domain", &self.store_domain)
            .field("storefront_access_token", &redact(&self.storefront_access_token))
            .field("storefront_api_version", &self.storefront_api_version)
            .field("admin", &self.admin)
            .field("schema_dir", &self.schema_dir)
            .field("mock_shop_url", &self.mock_shop_url)
            .field("discovery_ttl_secs", &self.discovery_ttl_secs)
            .finish()
    }
}

impl fmt::Debug for AdminApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminApiConfig")
            .field("enabled", &self.enabled)
            .field("access_token", &redact(&self.access_token))
            .field("api_version", &self.api_version)
            .finish()
    }
}

fn redact(token: &Option<String>) -> Option<&'static str> {
    token.as_ref().map(|_| "<redacted>")
}

impl ShopifyConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self {
            store_domain: get("SHOPIFY_STORE"),
            storefront_access_token: get("SHOPIFY_ACCESS_TOKEN"),
            storefront_api_version: get("SHOPIFY_VERSION"),
            admin: AdminApiConfig {
                enabled: get("USE_ADMIN_API")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(false),
                access_token: get("ADMIN_ACCESS_TOKEN"),
                api_version: get("ADMIN_VERSION"),
            },
            ..Self::default()
        };

        if let Some(dir) = get("SHOPIFY_SCHEMA_DIR") {
            config.schema_dir = PathBuf::from(dir);
        }
        if let Some(url) = get("SHOPIFY_MOCK_SHOP_URL") {
            config.mock_shop_url = url;
        }

        config
    }

    /// Overlay every Shopify variable that is set in `lookup` onto `self`
    pub fn merge_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).is_some_and(|v| !v.trim().is_empty());
        let env = Self::from_lookup(&lookup);

        if present("SHOPIFY_STORE") {
            self.store_domain = env.store_domain;
        }
        if present("SHOPIFY_ACCESS_TOKEN") {
            self.storefront_access_token = env.storefront_access_token;
        }
        if present("SHOPIFY_VERSION") {
            self.storefront_api_version = env.storefront_api_version;
        }
        if present("USE_ADMIN_API") {
            self.admin.enabled = env.admin.enabled;
        }
        if present("ADMIN_ACCESS_TOKEN") {
            self.admin.access_token = env.admin.access_token;
        }
        if present("ADMIN_VERSION") {
            self.admin.api_version = env.admin.api_version;
        }
        if present("SHOPIFY_SCHEMA_DIR") {
            self.schema_dir = env.schema_dir;
        }
        if present("SHOPIFY_MOCK_SHOP_URL") {
            self.mock_shop_url = env.mock_shop_url;
        }
    }

    /// True when no store is configured and the public mock shop is used
    pub fn is_mock_shop(&self) -> bool {
        self.store_domain.is_none()
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin.enabled
    }

    /// Origin of the configured store (`https://<domain>` unless a scheme is given)
    pub fn store_origin(&self) -> Option<String> {
        self.store_domain.as_deref().map(origin_for)
    }

    pub fn mock_shop_origin(&self) -> String {
        origin_for(&self.mock_shop_url)
    }

    /// Pinned version for a surface, if any
    pub fn pinned_version(&self, surface: ApiSurface) -> Option<&str> {
        match surface {
            ApiSurface::Storefront => self.storefront_api_version.as_deref(),
            ApiSurface::Admin => self.admin.api_version.as_deref(),
        }
    }

    pub fn discovery_ttl(&self) -> Duration {
        Duration::from_secs(self.discovery_ttl_secs)
    }

    /// Reject combinations that can never work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.enabled && self.admin.access_token.is_none() {
            return Err(ConfigError::Invalid(
                "USE_ADMIN_API is true, but ADMIN_ACCESS_TOKEN is missing".to_string(),
            ));
        }
        if self.admin.enabled && self.store_domain.is_none() {
            return Err(ConfigError::Invalid(
                "USE_ADMIN_API is true, but SHOPIFY_STORE is not configured. Admin API requires a real store"
                    .to_string(),
            ));
        }
        if !self.is_mock_shop() && self.storefront_access_token.is_none() {
            tracing::warn!(
                "SHOPIFY_STORE is set, but SHOPIFY_ACCESS_TOKEN is missing. Storefront API calls to the real store will fail"
            );
        }
        Ok(())
    }

    /// Log the effective integration mode
    pub fn log_summary(&self) {
        match &self.store_domain {
            Some(domain) => tracing::info!(store = %domain, "Shopify integration configured for store"),
            None => tracing::info!(mock_shop = %self.mock_shop_url, "Shopify integration using mock shop"),
        }
        tracing::info!(
            enabled = self.admin.enabled,
            "Admin API {}",
            if self.admin.enabled { "enabled" } else { "disabled" }
        );
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1")
}

fn origin_for(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
