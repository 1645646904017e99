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

//! Pre-flight query validation against the surface schema.

use crate::schema::SchemaManager;
use crate::surface::ApiSurface;
use apollo_compiler::validation::{DiagnosticList, Valid};
use apollo_compiler::{ExecutableDocument, Schema};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,
}

/// `{"valid": true}` or `{"valid": false, "errors": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }

    /// Single-error failure for anything that is not a rule violation
    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::invalid(vec![ValidationError {
            message: format!("Internal error during query validation: {}", message),
            locations: Vec::new(),
        }])
    }

    fn from_diagnostics(diagnostics: &DiagnosticList) -> Self {
        let errors = diagnostics
            .iter()
            .map(|diagnostic| {
                let error = diagnostic.to_json();
                ValidationError {
                    message: error.message,
                    locations: error
                        .locations
                        .iter()
                        .map(|loc| SourceLocation {
                            line: loc.line,
                            column: loc.column,
                        })
                        .collect(),
                }
            })
            .collect();
        Self::invalid(errors)
    }
}

/// Validate `query` against SDL text. Pure; builds the schema on every call.
pub fn validate_against(schema_text: &str, query: &str) -> ValidationOutcome {
    match compile_schema(schema_text) {
        Ok(schema) => validate_document(&schema, query),
        Err(outcome) => outcome,
    }
}

fn compile_schema(schema_text: &str) -> Result<Valid<Schema>, ValidationOutcome> {
    Schema::parse_and_validate(schema_text, "schema.graphql").map_err(|invalid| {
        ValidationOutcome::internal(format!("schema is not valid: {}", invalid.errors))
    })
}

fn validate_document(schema: &Valid<Schema>, query: &str) -> ValidationOutcome {
    match ExecutableDocument::parse_and_validate(schema, query, "query.graphql") {
        Ok(_) => ValidationOutcome::valid(),
        Err(invalid) => ValidationOutcome::from_diagnostics(&invalid.errors),
    }
}

struct CompiledSchema {
    source: Arc<str>,
    schema: Arc<Valid<Schema>>,
}

/// Validates queries against the schema the [`SchemaManager`] provides.
///
/// The compiled schema is memoized per surface and rebuilt only when the manager
/// hands back different text.
pub struct QueryValidator {
    schemas: Arc<SchemaManager>,
    compiled: Mutex<HashMap<ApiSurface, CompiledSchema>>,
}

impl QueryValidator {
    pub fn new(schemas: Arc<SchemaManager>) -> Self {
        Self {
            schemas,
            compiled: Mutex::new(HashMap::new()),
        }
    }

    pub async fn validate(&self, query: &str, surface: ApiSurface) -> ValidationOutcome {
        let text = match self.schemas.get_schema(surface).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(%surface, "No schema available, skipping validation");
                return ValidationOutcome::valid();
            }
            Err(e) => {
                warn!(%surface, error = %e, "Query validation failed to obtain schema");
                return ValidationOutcome::internal(e);
            }
        };

        let schema = match self.compiled_schema(surface, text) {
            Ok(schema) => schema,
            Err(outcome) => return outcome,
        };

        let outcome = validate_document(&schema, query);
        if !outcome.valid {
            debug!(%surface, errors = outcome.errors.len(), "Query failed validation");
        }
        outcome
    }

    fn compiled_schema(
        &self,
        surface: ApiSurface,
        text: Arc<str>,
    ) -> Result<Arc<Valid<Schema>>, ValidationOutcome> {
        if let Some(entry) = self.compiled.lock().get(&surface) {
            if Arc::ptr_eq(&entry.source, &text) {
                return Ok(entry.schema.clone());
            }
        }

        let schema = Arc::new(compile_schema(&text)?);
        self.compiled.lock().insert(
            surface,
            CompiledSchema {
                source: text,
                schema: schema.clone(),
            },
        );
        Ok(schema)
    }
}
