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

//! Schema Manager
//!
//! Provides the printed GraphQL schema for each API surface at its resolved version.
//!
//! ## Lookup order
//!
//! 1. In-memory cache (see [`SchemaCache`])
//! 2. `<schema_dir>/schema-<surface>-<version>.graphql` on disk
//! 3. Live introspection, printed and written to that file, then read back
//!
//! Storefront failures are hard errors. Admin is best effort: any failure yields `None`
//! and query validation is skipped for that call.
//!
//! The default cache holds one schema per surface and ignores the version on lookup,
//! so a cached schema can outlive a version rotation until the process restarts.
//! [`VersionKeyedCache`] is a drop-in replacement that keys by version instead.
//!
//! Cold loads are serialized per surface, so concurrent first requests trigger a
//! single introspection call.

mod introspection;

pub use introspection::{build_schema_text, introspection_to_sdl, INTROSPECTION_QUERY};

use crate::config::ShopifyConfig;
use crate::error::SchemaError;
use crate::surface::ApiSurface;
use crate::upstream::{endpoint_for, UpstreamClient};
use crate::version::VersionResolver;
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// File holding the schema for one surface and version
pub fn schema_path(dir: &Path, surface: ApiSurface, version: &str) -> PathBuf {
    dir.join(format!("schema-{}-{}.graphql", surface, version))
}

/// In-memory schema text cache.
pub trait SchemaCache: Send + Sync {
    fn get(&self, surface: ApiSurface, version: &str) -> Option<Arc<str>>;

    fn put(&self, surface: ApiSurface, version: &str, schema: Arc<str>);

    fn invalidate(&self, surface: ApiSurface, version: &str);
}

/// One slot per surface. Lookups ignore the version.
#[derive(Default)]
pub struct SingleSlotCache {
    slots: RwLock<HashMap<ApiSurface, Arc<str>>>,
}

impl SingleSlotCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaCache for SingleSlotCache {
    fn get(&self, surface: ApiSurface, _version: &str) -> Option<Arc<str>> {
        self.slots.read().get(&surface).cloned()
    }

    fn put(&self, surface: ApiSurface, _version: &str, schema: Arc<str>) {
        self.slots.write().insert(surface, schema);
    }

    fn invalidate(&self, surface: ApiSurface, _version: &str) {
        self.slots.write().remove(&surface);
    }
}

/// One entry per surface and version
#[derive(Default)]
pub struct VersionKeyedCache {
    entries: RwLock<HashMap<(ApiSurface, String), Arc<str>>>,
}

impl VersionKeyedCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaCache for VersionKeyedCache {
    fn get(&self, surface: ApiSurface, version: &str) -> Option<Arc<str>> {
        self.entries
            .read()
            .get(&(surface, version.to_string()))
            .cloned()
    }

    fn put(&self, surface: ApiSurface, version: &str, schema: Arc<str>) {
        self.entries
            .write()
            .insert((surface, version.to_string()), schema);
    }

    fn invalidate(&self, surface: ApiSurface, version: &str) {
        self.entries.write().remove(&(surface, version.to_string()));
    }
}

pub struct SchemaManager {
    config: Arc<ShopifyConfig>,
    resolver: Arc<VersionResolver>,
    client: UpstreamClient,
    cache: Arc<dyn SchemaCache>,
    storefront_lock: Mutex<()>,
    admin_lock: Mutex<()>,
    introspections: AtomicU64,
}

impl SchemaManager {
    pub fn new(
        config: Arc<ShopifyConfig>,
        resolver: Arc<VersionResolver>,
        client: UpstreamClient,
    ) -> Self {
        Self::with_cache(config, resolver, client, Arc::new(SingleSlotCache::new()))
    }

    pub fn with_cache(
        config: Arc<ShopifyConfig>,
        resolver: Arc<VersionResolver>,
        client: UpstreamClient,
        cache: Arc<dyn SchemaCache>,
    ) -> Self {
        Self {
            config,
            resolver,
            client,
            cache,
            storefront_lock: Mutex::new(()),
            admin_lock: Mutex::new(()),
            introspections: AtomicU64::new(0),
        }
    }

    /// Number of introspection requests issued so far
    pub fn introspection_count(&self) -> u64 {
        self.introspections.load(Ordering::Relaxed)
    }

    /// Schema text for `surface`.
    ///
    /// `Ok(None)` when the Admin API is disabled, has no resolvable version, or its
    /// schema cannot be produced. Storefront failures are returned as errors.
    pub async fn get_schema(&self, surface: ApiSurface) -> Result<Option<Arc<str>>, SchemaError> {
        if surface == ApiSurface::Admin && !self.config.admin_enabled() {
            debug!("Admin API disabled, no admin schema");
            return Ok(None);
        }

        let Some(version) = self.resolver.resolve(surface).await else {
            warn!(%surface, "Cannot load schema without a resolved version");
            return Ok(None);
        };

        match self.load(surface, &version).await {
            Ok(schema) => Ok(Some(schema)),
            Err(e) if surface == ApiSurface::Admin => {
                warn!(%surface, %version, error = %e, "Admin schema unavailable, validation will be skipped");
                Ok(None)
            }
            Err(e) => {
                error!(%surface, %version, error = %e, "Schema unavailable");
                Err(e)
            }
        }
    }

    pub async fn get_storefront_schema(&self) -> Result<Arc<str>, SchemaError> {
        self.get_schema(ApiSurface::Storefront)
            .await?
            .ok_or_else(|| SchemaError::IntrospectionFailed {
                surface: ApiSurface::Storefront,
                version: "unresolved".to_string(),
            })
    }

    pub async fn get_admin_schema(&self) -> Option<Arc<str>> {
        self.get_schema(ApiSurface::Admin).await.ok().flatten()
    }

    fn lock_for(&self, surface: ApiSurface) -> &Mutex<()> {
        match surface {
            ApiSurface::Storefront => &self.storefront_lock,
            ApiSurface::Admin => &self.admin_lock,
        }
    }

    async fn load(&self, surface: ApiSurface, version: &str) -> Result<Arc<str>, SchemaError> {
        if let Some(schema) = self.cache.get(surface, version) {
            return Ok(schema);
        }

        let _guard = self.lock_for(surface).lock().await;
        if let Some(schema) = self.cache.get(surface, version) {
            return Ok(schema);
        }

        let path = schema_path(&self.config.schema_dir, surface, version);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!(%surface, %version, path = %path.display(), "Schema file not found, generating via introspection");

            let text = self.introspect(surface, version).await.ok_or_else(|| {
                SchemaError::IntrospectionFailed {
                    surface,
                    version: version.to_string(),
                }
            })?;
            self.write_schema(&path, &text).await?;
            self.cache.invalidate(surface, version);
        }

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SchemaError::Read {
                surface,
                version: version.to_string(),
                path: path.display().to_string(),
                source,
            })?;

        let schema: Arc<str> = Arc::from(text);
        self.cache.put(surface, version, schema.clone());
        debug!(%surface, %version, bytes = schema.len(), "Schema loaded from file");
        Ok(schema)
    }

    async fn write_schema(&self, path: &Path, text: &str) -> Result<(), SchemaError> {
        let write_err = |source| SchemaError::Write {
            path: path.display().to_string(),
            source,
        };

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        }
        tokio::fs::write(path, text).await.map_err(write_err)?;
        info!(path = %path.display(), "Schema file written");
        Ok(())
    }

    /// Fetch and print the live schema. Every failure is logged and yields `None`.
    async fn introspect(&self, surface: ApiSurface, version: &str) -> Option<String> {
        let endpoint = match endpoint_for(&self.config, surface, version) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!(%surface, %version, error = %e, "Cannot introspect");
                return None;
            }
        };

        self.introspections.fetch_add(1, Ordering::Relaxed);
        info!(%surface, %version, url = %endpoint.url, "Running introspection query");

        let body = json!({ "query": INTROSPECTION_QUERY });
        let response = match self.client.post_graphql(&endpoint, &body).await {
            Ok(response) => response,
            Err(e) => {
                error!(%surface, %version, error = %e, "Introspection request failed");
                return None;
            }
        };

        if !response.is_success() {
            error!(%surface, %version, status = response.status, "Introspection returned HTTP error");
            return None;
        }

        let result = match response.json() {
            Ok(result) => result,
            Err(e) => {
                error!(%surface, %version, error = %e, "Introspection response is not JSON");
                return None;
            }
        };

        if result.get("errors").is_some_and(|errors| !errors.is_null()) {
            error!(%surface, %version, errors = %result["errors"], "Introspection returned GraphQL errors");
            return None;
        }

        let Some(data) = result.get("data").filter(|d| d.get("__schema").is_some()) else {
            error!(%surface, %version, "Introspection response has no __schema");
            return None;
        };

        match build_schema_text(data) {
            Ok(text) => Some(text),
            Err(e) => {
                error!(%surface, %version, error = %e, "Failed to print introspected schema");
                None
            }
        }
    }
}
