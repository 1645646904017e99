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

//! Introspection result to SDL.
//!
//! The introspection JSON is printed as SDL, then parsed and validated with
//! `apollo-compiler`. The compiler's own rendering is the canonical text that
//! lands in the schema file, so two runs against the same API version produce
//! byte-identical files.

use crate::error::SchemaError;
use apollo_compiler::Schema;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;

/// Full-schema introspection, descriptions included
pub const INTROSPECTION_QUERY: &str = r#"query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}"#;

const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];
const BUILTIN_DIRECTIVES: [&str; 5] = ["skip", "include", "deprecated", "specifiedBy", "oneOf"];
const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

#[derive(Debug, Deserialize)]
struct IntrospectionData {
    #[serde(rename = "__schema")]
    schema: IntrospectionSchema,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionSchema {
    query_type: Option<NamedRef>,
    mutation_type: Option<NamedRef>,
    subscription_type: Option<NamedRef>,
    types: Vec<FullType>,
    #[serde(default)]
    directives: Vec<DirectiveDef>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullType {
    kind: TypeKind,
    name: String,
    description: Option<String>,
    fields: Option<Vec<FieldDef>>,
    input_fields: Option<Vec<InputValueDef>>,
    interfaces: Option<Vec<TypeRef>>,
    enum_values: Option<Vec<EnumValueDef>>,
    possible_types: Option<Vec<TypeRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    args: Vec<InputValueDef>,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputValueDef {
    name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    ty: TypeRef,
    default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnumValueDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeRef {
    kind: TypeKind,
    name: Option<String>,
    of_type: Option<Box<TypeRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectiveDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    locations: Vec<String>,
    #[serde(default)]
    args: Vec<InputValueDef>,
}

impl TypeRef {
    fn render(&self) -> Result<String, SchemaError> {
        match self.kind {
            TypeKind::NonNull => Ok(format!("{}!", self.inner()?.render()?)),
            TypeKind::List => Ok(format!("[{}]", self.inner()?.render()?)),
            _ => self
                .name
                .clone()
                .ok_or_else(|| SchemaError::Build("named type reference without a name".to_string())),
        }
    }

    fn inner(&self) -> Result<&TypeRef, SchemaError> {
        self.of_type
            .as_deref()
            .ok_or_else(|| SchemaError::Build("wrapping type reference without ofType".to_string()))
    }

    fn name(&self) -> Result<&str, SchemaError> {
        self.name
            .as_deref()
            .ok_or_else(|| SchemaError::Build("interface or member reference without a name".to_string()))
    }
}

/// Build canonical schema text from the `data` member of an introspection response
pub fn build_schema_text(data: &Value) -> Result<String, SchemaError> {
    let sdl = introspection_to_sdl(data)?;
    let schema = Schema::parse_and_validate(sdl, "introspection.graphql")
        .map_err(|invalid| SchemaError::Build(invalid.errors.to_string()))?;
    Ok(schema.to_string())
}

/// Print an introspection result as SDL, without normalization
pub fn introspection_to_sdl(data: &Value) -> Result<String, SchemaError> {
    let data = IntrospectionData::deserialize(data)
        .map_err(|e| SchemaError::Build(format!("unexpected introspection shape: {}", e)))?;
    print_schema(&data.schema)
}

fn print_schema(schema: &IntrospectionSchema) -> Result<String, SchemaError> {
    let mut out = String::new();

    let query = schema
        .query_type
        .as_ref()
        .ok_or_else(|| SchemaError::Build("introspection result has no query type".to_string()))?;
    out.push_str("schema {\n");
    push_line(&mut out, 1, &format!("query: {}", query.name));
    if let Some(mutation) = &schema.mutation_type {
        push_line(&mut out, 1, &format!("mutation: {}", mutation.name));
    }
    if let Some(subscription) = &schema.subscription_type {
        push_line(&mut out, 1, &format!("subscription: {}", subscription.name));
    }
    out.push_str("}\n");

    for directive in &schema.directives {
        if BUILTIN_DIRECTIVES.contains(&directive.name.as_str()) {
            continue;
        }
        out.push('\n');
        print_directive(&mut out, directive)?;
    }

    for ty in &schema.types {
        if ty.name.starts_with("__") || BUILTIN_SCALARS.contains(&ty.name.as_str()) {
            continue;
        }
        out.push('\n');
        print_type(&mut out, ty)?;
    }

    Ok(out)
}

fn print_directive(out: &mut String, directive: &DirectiveDef) -> Result<(), SchemaError> {
    print_description(out, 0, directive.description.as_deref());
    let _ = write!(out, "directive @{}", directive.name);
    print_arguments(out, &directive.args)?;
    let _ = writeln!(out, " on {}", directive.locations.join(" | "));
    Ok(())
}

fn print_type(out: &mut String, ty: &FullType) -> Result<(), SchemaError> {
    print_description(out, 0, ty.description.as_deref());

    match ty.kind {
        TypeKind::Scalar => {
            let _ = writeln!(out, "scalar {}", ty.name);
        }
        TypeKind::Object | TypeKind::Interface => {
            let keyword = if ty.kind == TypeKind::Object { "type" } else { "interface" };
            let _ = write!(out, "{} {}", keyword, ty.name);
            let interfaces = ty.interfaces.as_deref().unwrap_or_default();
            if !interfaces.is_empty() {
                let names = interfaces
                    .iter()
                    .map(TypeRef::name)
                    .collect::<Result<Vec<_>, _>>()?;
                let _ = write!(out, " implements {}", names.join(" & "));
            }
            out.push_str(" {\n");
            for field in ty.fields.as_deref().unwrap_or_default() {
                print_description(out, 1, field.description.as_deref());
                let mut line = field.name.clone();
                print_arguments(&mut line, &field.args)?;
                let _ = write!(line, ": {}", field.ty.render()?);
                push_deprecation(&mut line, field.is_deprecated, field.deprecation_reason.as_deref());
                push_line(out, 1, &line);
            }
            out.push_str("}\n");
        }
        TypeKind::Union => {
            let members = ty
                .possible_types
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(TypeRef::name)
                .collect::<Result<Vec<_>, _>>()?;
            let _ = writeln!(out, "union {} = {}", ty.name, members.join(" | "));
        }
        TypeKind::Enum => {
            let _ = writeln!(out, "enum {} {{", ty.name);
            for value in ty.enum_values.as_deref().unwrap_or_default() {
                print_description(out, 1, value.description.as_deref());
                let mut line = value.name.clone();
                push_deprecation(&mut line, value.is_deprecated, value.deprecation_reason.as_deref());
                push_line(out, 1, &line);
            }
            out.push_str("}\n");
        }
        TypeKind::InputObject => {
            let _ = writeln!(out, "input {} {{", ty.name);
            for field in ty.input_fields.as_deref().unwrap_or_default() {
                print_description(out, 1, field.description.as_deref());
                push_line(out, 1, &input_value(field)?);
            }
            out.push_str("}\n");
        }
        TypeKind::List | TypeKind::NonNull => {
            return Err(SchemaError::Build(format!(
                "type {} has a wrapping kind at the top level",
                ty.name
            )));
        }
    }
    Ok(())
}

fn print_arguments(out: &mut String, args: &[InputValueDef]) -> Result<(), SchemaError> {
    if args.is_empty() {
        return Ok(());
    }
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // Argument descriptions are dropped; the validator never needs them.
        out.push_str(&input_value(arg)?);
    }
    out.push(')');
    Ok(())
}

fn input_value(value: &InputValueDef) -> Result<String, SchemaError> {
    let mut text = format!("{}: {}", value.name, value.ty.render()?);
    if let Some(default) = &value.default_value {
        let _ = write!(text, " = {}", default);
    }
    Ok(text)
}

fn push_deprecation(line: &mut String, deprecated: bool, reason: Option<&str>) {
    if !deprecated {
        return;
    }
    match reason {
        Some(reason) if reason != DEFAULT_DEPRECATION_REASON => {
            // JSON string escapes are a subset of GraphQL string escapes.
            let quoted = serde_json::to_string(reason).unwrap_or_else(|_| "\"\"".to_string());
            let _ = write!(line, " @deprecated(reason: {})", quoted);
        }
        _ => line.push_str(" @deprecated"),
    }
}

fn print_description(out: &mut String, depth: usize, description: Option<&str>) {
    let Some(description) = description.filter(|d| !d.trim().is_empty()) else {
        return;
    };
    push_line(out, depth, "\"\"\"");
    for line in description.replace("\"\"\"", "\\\"\"\"").lines() {
        push_line(out, depth, line);
    }
    push_line(out, depth, "\"\"\"");
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(kind: &str, name: &str) -> Value {
        json!({ "kind": kind, "name": name, "ofType": null })
    }

    fn non_null(inner: Value) -> Value {
        json!({ "kind": "NON_NULL", "name": null, "ofType": inner })
    }

    fn list(inner: Value) -> Value {
        json!({ "kind": "LIST", "name": null, "ofType": inner })
    }

    fn sample() -> Value {
        json!({
            "__schema": {
                "queryType": { "name": "QueryRoot" },
                "mutationType": null,
                "subscriptionType": null,
                "directives": [
                    {
                        "name": "include",
                        "description": null,
                        "locations": ["FIELD"],
                        "args": [{ "name": "if", "description": null, "type": non_null(named("SCALAR", "Boolean")), "defaultValue": null }]
                    },
                    {
                        "name": "inContext",
                        "description": "Contextualizes data.",
                        "locations": ["QUERY", "MUTATION"],
                        "args": [{ "name": "country", "description": null, "type": named("ENUM", "CountryCode"), "defaultValue": null }]
                    }
                ],
                "types": [
                    {
                        "kind": "OBJECT", "name": "QueryRoot", "description": "The schema's entry-point for queries.",
                        "fields": [
                            {
                                "name": "product", "description": "Fetch a \"\"\"product\"\"\" by ID.",
                                "args": [{ "name": "id", "description": null, "type": non_null(named("SCALAR", "ID")), "defaultValue": null }],
                                "type": named("OBJECT", "Product"), "isDeprecated": false, "deprecationReason": null
                            },
                            {
                                "name": "products", "description": null,
                                "args": [{ "name": "first", "description": null, "type": named("SCALAR", "Int"), "defaultValue": "10" }],
                                "type": non_null(list(non_null(named("OBJECT", "Product")))), "isDeprecated": false, "deprecationReason": null
                            }
                        ],
                        "inputFields": null, "interfaces": [], "enumValues": null, "possibleTypes": null
                    },
                    {
                        "kind": "INTERFACE", "name": "Node", "description": null,
                        "fields": [{ "name": "id", "description": null, "args": [], "type": non_null(named("SCALAR", "ID")), "isDeprecated": false, "deprecationReason": null }],
                        "inputFields": null, "interfaces": [], "enumValues": null,
                        "possibleTypes": [named("OBJECT", "Product")]
                    },
                    {
                        "kind": "OBJECT", "name": "Product", "description": null,
                        "fields": [
                            { "name": "id", "description": null, "args": [], "type": non_null(named("SCALAR", "ID")), "isDeprecated": false, "deprecationReason": null },
                            { "name": "title", "description": null, "args": [], "type": non_null(named("SCALAR", "String")), "isDeprecated": false, "deprecationReason": null },
                            { "name": "handle", "description": null, "args": [], "type": named("SCALAR", "String"), "isDeprecated": true, "deprecationReason": "Use `title` \"instead\"." }
                        ],
                        "inputFields": null, "interfaces": [named("INTERFACE", "Node")], "enumValues": null, "possibleTypes": null
                    },
                    {
                        "kind": "ENUM", "name": "CountryCode", "description": null, "fields": null, "inputFields": null, "interfaces": null,
                        "enumValues": [
                            { "name": "CA", "description": null, "isDeprecated": false, "deprecationReason": null },
                            { "name": "US", "description": null, "isDeprecated": true, "deprecationReason": "No longer supported" }
                        ],
                        "possibleTypes": null
                    },
                    {
                        "kind": "SCALAR", "name": "String", "description": null, "fields": null, "inputFields": null,
                        "interfaces": null, "enumValues": null, "possibleTypes": null
                    },
                    {
                        "kind": "OBJECT", "name": "__Type", "description": null, "fields": [], "inputFields": null,
                        "interfaces": [], "enumValues": null, "possibleTypes": null
                    }
                ]
            }
        })
    }

    #[test]
    fn test_sdl_printing() {
        let sdl = introspection_to_sdl(&sample()).unwrap();

        assert!(sdl.contains("schema {\n  query: QueryRoot\n}"));
        assert!(sdl.contains("directive @inContext(country: CountryCode) on QUERY | MUTATION"));
        assert!(!sdl.contains("directive @include"));
        assert!(sdl.contains("type Product implements Node {"));
        assert!(sdl.contains("products(first: Int = 10): [Product!]!"));
        assert!(sdl.contains("handle: String @deprecated(reason: \"Use `title` \\\"instead\\\".\")"));
        assert!(sdl.contains("  US @deprecated\n"));
        assert!(!sdl.contains("scalar String"));
        assert!(!sdl.contains("__Type"));
    }

    #[test]
    fn test_build_schema_text_is_stable() {
        let text = build_schema_text(&sample()).unwrap();
        assert!(text.contains("type QueryRoot"));
        assert!(text.contains("interface Node"));

        let reparsed = Schema::parse_and_validate(text.clone(), "schema.graphql").unwrap();
        assert_eq!(reparsed.to_string(), text);
    }

    #[test]
    fn test_rejects_missing_schema_key() {
        assert!(matches!(
            build_schema_text(&json!({ "shop": {} })),
            Err(SchemaError::Build(_))
        ));
    }

    #[test]
    fn test_rejects_dangling_type_reference() {
        let mut data = sample();
        data["__schema"]["types"][0]["fields"][0]["type"] = named("OBJECT", "Missing");
        assert!(matches!(build_schema_text(&data), Err(SchemaError::Build(_))));
    }
}
