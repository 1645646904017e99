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

//! API Version Resolution
//!
//! Determines which dated API version (`YYYY-MM`) each surface targets.
//!
//! ## Resolution order
//!
//! 1. Pinned version from configuration, if the platform lists it as supported
//! 2. Latest supported version from the discovered list
//! 3. Storefront: [`FALLBACK_STOREFRONT_VERSION`]; Admin: no version
//!
//! The discovered list is cached per surface for the configured TTL (5 minutes by
//! default). A failed discovery leaves the cache untouched, so the next call retries
//! immediately. Concurrent misses may both hit the network; the last write wins.

use crate::config::ShopifyConfig;
use crate::surface::ApiSurface;
use crate::upstream::{discovery_endpoint, UpstreamClient};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const PUBLIC_API_VERSIONS_QUERY: &str =
    "query PublicApiVersions { publicApiVersions { handle displayName supported } }";

/// Last-resort Storefront version when nothing can be discovered
pub const FALLBACK_STOREFRONT_VERSION: &str = "2024-07";

/// One entry of the platform's `publicApiVersions` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVersionInfo {
    pub handle: String,
    pub display_name: String,
    pub supported: bool,
}

#[derive(Deserialize)]
struct PublicApiVersionsResponse {
    data: Option<PublicApiVersionsData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicApiVersionsData {
    public_api_versions: Option<Vec<ApiVersionInfo>>,
}

/// Discovered versions for one surface
#[derive(Debug, Clone)]
pub struct VersionCacheEntry {
    pub versions: Arc<Vec<ApiVersionInfo>>,
    pub fetched_at: DateTime<Utc>,
}

impl VersionCacheEntry {
    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        // A negative age means the wall clock moved backwards; keep the entry.
        now.signed_duration_since(self.fetched_at)
            .to_std()
            .map(|age| age < ttl)
            .unwrap_or(true)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub storefront_fetched_at: Option<DateTime<Utc>>,
    pub admin_fetched_at: Option<DateTime<Utc>>,
}

/// Per-surface version list cache with a fixed TTL
pub struct VersionCache {
    ttl: Duration,
    storefront: RwLock<Option<VersionCacheEntry>>,
    admin: RwLock<Option<VersionCacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl VersionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            storefront: RwLock::new(None),
            admin: RwLock::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn slot(&self, surface: ApiSurface) -> &RwLock<Option<VersionCacheEntry>> {
        match surface {
            ApiSurface::Storefront => &self.storefront,
            ApiSurface::Admin => &self.admin,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Versions younger than the TTL, if any
    pub fn get_fresh(&self, surface: ApiSurface) -> Option<Arc<Vec<ApiVersionInfo>>> {
        let now = Utc::now();
        let fresh = self
            .slot(surface)
            .read()
            .as_ref()
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| entry.versions.clone());

        if fresh.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        fresh
    }

    /// Replace the entry for `surface`
    pub fn store(&self, surface: ApiSurface, versions: Vec<ApiVersionInfo>) -> Arc<Vec<ApiVersionInfo>> {
        let versions = Arc::new(versions);
        *self.slot(surface).write() = Some(VersionCacheEntry {
            versions: versions.clone(),
            fetched_at: Utc::now(),
        });
        versions
    }

    /// Current entry regardless of age
    pub fn entry(&self, surface: ApiSurface) -> Option<VersionCacheEntry> {
        self.slot(surface).read().clone()
    }

    pub fn stats(&self) -> VersionCacheStats {
        VersionCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            storefront_fetched_at: self.entry(ApiSurface::Storefront).map(|e| e.fetched_at),
            admin_fetched_at: self.entry(ApiSurface::Admin).map(|e| e.fetched_at),
        }
    }
}

/// Handle of the latest supported version. Handles are `YYYY-MM`, so string order is date order.
pub fn latest_supported(versions: &[ApiVersionInfo]) -> Option<&str> {
    versions
        .iter()
        .filter(|v| v.supported)
        .map(|v| v.handle.as_str())
        .max()
}

/// Apply the pin-then-latest rule to a discovered list
pub fn select_version(pinned: Option<&str>, versions: Option<&[ApiVersionInfo]>) -> Option<String> {
    let versions = versions?;

    if let Some(pinned) = pinned {
        if versions.iter().any(|v| v.handle == pinned && v.supported) {
            return Some(pinned.to_string());
        }
    }

    latest_supported(versions).map(str::to_string)
}

/// Resolves the API version for each surface.
pub struct VersionResolver {
    config: Arc<ShopifyConfig>,
    client: UpstreamClient,
    cache: Arc<VersionCache>,
}

impl VersionResolver {
    pub fn new(config: Arc<ShopifyConfig>, client: UpstreamClient, cache: Arc<VersionCache>) -> Self {
        Self {
            config,
            client,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<VersionCache> {
        &self.cache
    }

    /// Version list for `surface`, from cache or live discovery. `None` on any failure.
    pub async fn public_api_versions(&self, surface: ApiSurface) -> Option<Arc<Vec<ApiVersionInfo>>> {
        if let Some(versions) = self.cache.get_fresh(surface) {
            debug!(%surface, "Using cached API versions");
            return Some(versions);
        }

        let versions = self.discover(surface).await?;
        info!(%surface, count = versions.len(), "Fetched and cached API versions");
        Some(self.cache.store(surface, versions))
    }

    async fn discover(&self, surface: ApiSurface) -> Option<Vec<ApiVersionInfo>> {
        let endpoint = match discovery_endpoint(&self.config, surface) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                info!(%surface, reason = %e, "Cannot fetch API versions");
                return None;
            }
        };

        info!(%surface, url = %endpoint.url, "Fetching publicApiVersions");
        let body = json!({ "query": PUBLIC_API_VERSIONS_QUERY });

        let response = match self.client.post_graphql(&endpoint, &body).await {
            Ok(response) => response,
            Err(e) => {
                error!(%surface, error = %e, "Error fetching publicApiVersions");
                return None;
            }
        };

        if !response.is_success() {
            error!(%surface, status = response.status, "publicApiVersions returned HTTP error");
            return None;
        }

        let parsed = response
            .json()
            .ok()
            .and_then(|value| serde_json::from_value::<PublicApiVersionsResponse>(value).ok())
            .and_then(|r| r.data)
            .and_then(|d| d.public_api_versions);

        if parsed.is_none() {
            error!(%surface, "publicApiVersions response has an invalid structure");
        }
        parsed
    }

    /// Resolve the version for `surface`. Storefront always yields a version.
    pub async fn resolve(&self, surface: ApiSurface) -> Option<String> {
        match surface {
            ApiSurface::Storefront => Some(self.resolve_storefront().await),
            ApiSurface::Admin => self.resolve_admin().await,
        }
    }

    pub async fn resolve_storefront(&self) -> String {
        let surface = ApiSurface::Storefront;
        let versions = self.public_api_versions(surface).await;

        match self.pick(surface, versions.as_deref().map(Vec::as_slice)) {
            Some(version) => version,
            None => {
                warn!(
                    %surface,
                    fallback = FALLBACK_STOREFRONT_VERSION,
                    "Could not determine latest stable version, using fallback"
                );
                FALLBACK_STOREFRONT_VERSION.to_string()
            }
        }
    }

    /// `None` when the Admin API is disabled or no supported version is known
    pub async fn resolve_admin(&self) -> Option<String> {
        if !self.config.admin_enabled() {
            return None;
        }

        let surface = ApiSurface::Admin;
        let versions = self.public_api_versions(surface).await;
        let version = self.pick(surface, versions.as_deref().map(Vec::as_slice));

        if version.is_none() {
            warn!(%surface, "Could not determine latest stable version; admin calls will be refused");
        }
        version
    }

    fn pick(&self, surface: ApiSurface, versions: Option<&[ApiVersionInfo]>) -> Option<String> {
        let pinned = self.config.pinned_version(surface);
        let selected = select_version(pinned, versions)?;

        match pinned {
            Some(p) if p == selected => {
                info!(%surface, version = %selected, "Using configured and supported version");
            }
            Some(p) => {
                warn!(%surface, configured = %p, "Configured version is invalid or unsupported");
                info!(%surface, version = %selected, "Using latest stable version");
            }
            None => info!(%surface, version = %selected, "Using latest stable version"),
        }
        Some(selected)
    }
}
