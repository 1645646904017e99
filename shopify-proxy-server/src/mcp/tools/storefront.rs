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

//! Storefront API tools: catalog lookups and cart mutations.

use super::args::{bool_arg, optional, str_arg, uint_arg};
use super::registry::{McpTool, ToolError};
use crate::mcp::protocol::{fenced_json, CallToolResult, ToolAnnotations, ToolContent};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use shopify_proxy_core::{GraphqlRequest, ProxyResult};
use std::sync::Arc;

const CART_FIELDS: &str = "cart { id checkoutUrl cost { totalAmount { amount currencyCode } } lines(first: 50) { edges { node { id quantity merchandise { ... on ProductVariant { id title product { title } } } } } } }
    userErrors { field message }";

const PRODUCT_SORT_KEYS: &[&str] = &[
    "RELEVANCE",
    "TITLE",
    "PRICE",
    "CREATED_AT",
    "UPDATED_AT",
    "BEST_SELLING",
    "PRODUCT_TYPE",
    "VENDOR",
];

const COLLECTION_SORT_KEYS: &[&str] = &["RELEVANCE", "TITLE", "UPDATED_AT"];

/// Every Storefront tool
pub fn tools() -> Vec<Arc<dyn McpTool>> {
    vec![
        Arc::new(GetShopInfo::new()),
        Arc::new(GetProductById::new()),
        Arc::new(FindProducts::new()),
        Arc::new(GetCollectionById::new()),
        Arc::new(FindCollections::new()),
        Arc::new(CartCreate::new()),
        Arc::new(CartLinesAdd::new()),
        Arc::new(CartLinesUpdate::new()),
        Arc::new(CartLinesRemove::new()),
        Arc::new(GetCart::new()),
    ]
}

fn attribute_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "key": { "type": "string" },
            "value": { "type": "string" }
        },
        "required": ["key", "value"]
    })
}

fn cart_line_input_schema() -> Value {
    json!({
        "type": "object",
        "description": "Input for a single cart line item.",
        "properties": {
            "merchandiseId": { "type": "string", "description": "The GID of the product variant." },
            "quantity": { "type": "integer", "minimum": 1, "description": "The quantity of the variant." },
            "attributes": { "type": "array", "items": attribute_schema() }
        },
        "required": ["merchandiseId", "quantity"]
    })
}

fn cart_line_update_schema() -> Value {
    json!({
        "type": "object",
        "description": "Input for updating a single cart line item.",
        "properties": {
            "id": { "type": "string", "description": "The GID of the cart line to update." },
            "quantity": { "type": "integer", "minimum": 0, "description": "The new quantity (0 to remove)." },
            "merchandiseId": { "type": "string", "description": "New variant GID if changing the variant." },
            "attributes": { "type": "array", "items": attribute_schema() }
        },
        "required": ["id", "quantity"]
    })
}

fn search_schema(noun: &str, sort_keys: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "The search query string." },
            "first": {
                "type": "integer",
                "minimum": 1,
                "default": 10,
                "description": format!("Number of {} per page.", noun)
            },
            "after": {
                "type": "string",
                "description": "Cursor for pagination (from previous pageInfo.endCursor)."
            },
            "sortKey": { "type": "string", "enum": sort_keys, "default": "RELEVANCE" },
            "reverse": { "type": "boolean", "default": false, "description": "Reverse the sort order." }
        }
    })
}

fn search_variables(args: &Value) -> Result<Value, ToolError> {
    let mut variables = Map::new();
    variables.insert("first".to_string(), json!(uint_arg(args, "first", 10)?));
    if let Some(after) = optional(args, "after") {
        variables.insert("after".to_string(), after.clone());
    }
    if let Some(query) = optional(args, "query") {
        variables.insert("query".to_string(), query.clone());
    }
    let sort_key = optional(args, "sortKey")
        .cloned()
        .unwrap_or_else(|| json!("RELEVANCE"));
    variables.insert("sortKey".to_string(), sort_key);
    variables.insert("reverse".to_string(), json!(bool_arg(args, "reverse", false)?));
    Ok(Value::Object(variables))
}

fn cart_id_schema(action: &str) -> Value {
    json!({ "type": "string", "description": format!("The GID of the cart to {}.", action) })
}

// =============================================================================
// Catalog
// =============================================================================

pub struct GetShopInfo {
    schema: Value,
}

impl GetShopInfo {
    pub fn new() -> Self {
        Self {
            schema: json!({ "type": "object", "properties": {} }),
        }
    }
}

#[async_trait]
impl McpTool for GetShopInfo {
    fn name(&self) -> &str {
        "getShopInfo"
    }

    fn description(&self) -> &str {
        "Fetches basic information about the configured Shopify shop."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn build(&self, _args: &Value) -> Result<GraphqlRequest, ToolError> {
        Ok(GraphqlRequest::new(
            "query ShopInfo { shop { name description paymentSettings { currencyCode } } }",
        ))
    }
}

pub struct GetProductById {
    schema: Value,
}

impl GetProductById {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "productId": {
                        "type": "string",
                        "description": "The GID of the product (e.g., 'gid://shopify/Product/123')."
                    },
                    "includeVariants": { "type": "boolean", "default": false },
                    "variantCount": { "type": "integer", "minimum": 1, "default": 5 },
                    "includeImages": {
                        "type": "boolean",
                        "default": false,
                        "description": "Return first image URL (75px)?"
                    }
                },
                "required": ["productId"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetProductById {
    fn name(&self) -> &str {
        "getProductById"
    }

    fn description(&self) -> &str {
        "Fetches product by ID. If includeImages=true, also returns the URL of the first image (resized to 75px)."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let product_id = str_arg(args, "productId")?;
        let include_variants = bool_arg(args, "includeVariants", false)?;
        let include_images = bool_arg(args, "includeImages", false)?;

        // Only declare variables the selection uses; unused ones fail validation.
        let mut declarations = vec!["$productId: ID!"];
        let mut variables = Map::new();
        variables.insert("productId".to_string(), json!(product_id));
        let mut selection = String::from("id\n    title\n    descriptionHtml\n    vendor");

        if include_variants {
            declarations.push("$variantCount: Int!");
            variables.insert(
                "variantCount".to_string(),
                json!(uint_arg(args, "variantCount", 5)?),
            );
            selection.push_str(
                "\n    variants(first: $variantCount) { edges { node { id title price { amount currencyCode } selectedOptions { name value } } } }",
            );
        }
        if include_images {
            declarations.push("$imageCount: Int!");
            variables.insert("imageCount".to_string(), json!(1));
            selection.push_str(
                "\n    images(first: $imageCount) { edges { node { id url altText width height } } }",
            );
        }

        let query = format!(
            "query GetProduct({}) {{\n  product(id: $productId) {{\n    {}\n  }}\n}}",
            declarations.join(", "),
            selection
        );
        Ok(GraphqlRequest::new(query).with_variables(Value::Object(variables)))
    }

    fn render(&self, args: &Value, result: ProxyResult) -> CallToolResult {
        if bool_arg(args, "includeImages", false).unwrap_or(false) {
            if let Some(content) = product_with_image(&result.payload) {
                return CallToolResult {
                    content,
                    is_error: None,
                };
            }
        }
        CallToolResult::json_block(&result.payload)
    }
}

/// Product JSON without its images, followed by the first image URL at 75px
fn product_with_image(payload: &Value) -> Option<Vec<ToolContent>> {
    let product = payload.pointer("/data/product")?.as_object()?;
    let url = product
        .get("images")?
        .pointer("/edges/0/node/url")?
        .as_str()?;

    let mut details = product.clone();
    details.remove("images");

    let separator = if url.contains('?') { '&' } else { '?' };
    Some(vec![
        ToolContent::Text {
            text: format!("Product Details:\n{}", fenced_json(&Value::Object(details))),
        },
        ToolContent::Text {
            text: format!("Image URL (75px): {}{}width=75", url, separator),
        },
    ])
}

pub struct FindProducts {
    schema: Value,
}

impl FindProducts {
    pub fn new() -> Self {
        Self {
            schema: search_schema("products", PRODUCT_SORT_KEYS),
        }
    }
}

#[async_trait]
impl McpTool for FindProducts {
    fn name(&self) -> &str {
        "findProducts"
    }

    fn description(&self) -> &str {
        "Searches or filters products with pagination and sorting. Uses the Storefront API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let query = r#"query FindProducts($first: Int!, $after: String, $query: String, $sortKey: ProductSortKeys, $reverse: Boolean) {
  products(first: $first, after: $after, query: $query, sortKey: $sortKey, reverse: $reverse) {
    pageInfo { hasNextPage hasPreviousPage startCursor endCursor }
    edges {
      cursor
      node {
        id
        title
        handle
        vendor
        priceRange { minVariantPrice { amount currencyCode } maxVariantPrice { amount currencyCode } }
      }
    }
  }
}"#;
        Ok(GraphqlRequest::new(query).with_variables(search_variables(args)?))
    }
}

pub struct GetCollectionById {
    schema: Value,
}

impl GetCollectionById {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "collectionId": {
                        "type": "string",
                        "description": "The GID of the collection (e.g., 'gid://shopify/Collection/123')."
                    },
                    "includeProducts": { "type": "boolean", "default": false },
                    "productCount": { "type": "integer", "minimum": 1, "default": 10 }
                },
                "required": ["collectionId"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetCollectionById {
    fn name(&self) -> &str {
        "getCollectionById"
    }

    fn description(&self) -> &str {
        "Fetches a specific collection by its ID, optionally including products. Uses the Storefront API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let collection_id = str_arg(args, "collectionId")?;
        let mut variables = Map::new();
        variables.insert("collectionId".to_string(), json!(collection_id));

        let (declarations, products) = if bool_arg(args, "includeProducts", false)? {
            variables.insert(
                "productCount".to_string(),
                json!(uint_arg(args, "productCount", 10)?),
            );
            (
                "$collectionId: ID!, $productCount: Int!",
                "\n    products(first: $productCount) { edges { node { id title handle vendor } } }",
            )
        } else {
            ("$collectionId: ID!", "")
        };

        let query = format!(
            "query GetCollection({}) {{\n  collection(id: $collectionId) {{\n    id\n    title\n    descriptionHtml\n    handle{}\n  }}\n}}",
            declarations, products
        );
        Ok(GraphqlRequest::new(query).with_variables(Value::Object(variables)))
    }
}

pub struct FindCollections {
    schema: Value,
}

impl FindCollections {
    pub fn new() -> Self {
        Self {
            schema: search_schema("collections", COLLECTION_SORT_KEYS),
        }
    }
}

#[async_trait]
impl McpTool for FindCollections {
    fn name(&self) -> &str {
        "findCollections"
    }

    fn description(&self) -> &str {
        "Searches or filters collections with pagination and sorting. Uses the Storefront API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let query = r#"query FindCollections($first: Int!, $after: String, $query: String, $sortKey: CollectionSortKeys, $reverse: Boolean) {
  collections(first: $first, after: $after, query: $query, sortKey: $sortKey, reverse: $reverse) {
    pageInfo { hasNextPage hasPreviousPage startCursor endCursor }
    edges {
      cursor
      node {
        id
        title
        handle
        description
      }
    }
  }
}"#;
        Ok(GraphqlRequest::new(query).with_variables(search_variables(args)?))
    }
}

// =============================================================================
// Cart
// =============================================================================

pub struct CartCreate {
    schema: Value,
}

impl CartCreate {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "lines": {
                        "type": "array",
                        "items": cart_line_input_schema(),
                        "description": "Initial line items to add to the cart."
                    },
                    "buyerIdentity": {
                        "type": "object",
                        "description": "Information about the buyer.",
                        "properties": {
                            "email": { "type": "string" },
                            "phone": { "type": "string" },
                            "countryCode": {
                                "type": "string",
                                "minLength": 2,
                                "maxLength": 2,
                                "description": "ISO 3166-1 alpha-2 country code."
                            }
                        }
                    },
                    "attributes": { "type": "array", "items": attribute_schema() }
                }
            }),
        }
    }
}

#[async_trait]
impl McpTool for CartCreate {
    fn name(&self) -> &str {
        "cartCreate"
    }

    fn description(&self) -> &str {
        "Creates a new shopping cart. Uses the Storefront API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::mutation(false)
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let mut input = Map::new();
        for field in ["lines", "buyerIdentity", "attributes"] {
            if let Some(value) = optional(args, field) {
                input.insert(field.to_string(), value.clone());
            }
        }

        let query = format!(
            "mutation CartCreate($input: CartInput!) {{\n  cartCreate(input: $input) {{\n    {}\n  }}\n}}",
            CART_FIELDS
        );
        Ok(GraphqlRequest::new(query).with_variables(json!({ "input": input })))
    }
}

pub struct CartLinesAdd {
    schema: Value,
}

impl CartLinesAdd {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "cartId": cart_id_schema("modify"),
                    "lines": { "type": "array", "items": cart_line_input_schema(), "minItems": 1 }
                },
                "required": ["cartId", "lines"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for CartLinesAdd {
    fn name(&self) -> &str {
        "cartLinesAdd"
    }

    fn description(&self) -> &str {
        "Adds line items to an existing shopping cart. Uses the Storefront API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::mutation(false)
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let query = format!(
            "mutation CartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {{\n  cartLinesAdd(cartId: $cartId, lines: $lines) {{\n    {}\n  }}\n}}",
            CART_FIELDS
        );
        Ok(GraphqlRequest::new(query).with_variables(json!({
            "cartId": str_arg(args, "cartId")?,
            "lines": args["lines"],
        })))
    }
}

pub struct CartLinesUpdate {
    schema: Value,
}

impl CartLinesUpdate {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "cartId": cart_id_schema("modify"),
                    "lines": { "type": "array", "items": cart_line_update_schema(), "minItems": 1 }
                },
                "required": ["cartId", "lines"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for CartLinesUpdate {
    fn name(&self) -> &str {
        "cartLinesUpdate"
    }

    fn description(&self) -> &str {
        "Updates line items (e.g., quantity) in an existing shopping cart. Uses the Storefront API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::mutation(true)
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let query = format!(
            "mutation CartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {{\n  cartLinesUpdate(cartId: $cartId, lines: $lines) {{\n    {}\n  }}\n}}",
            CART_FIELDS
        );
        Ok(GraphqlRequest::new(query).with_variables(json!({
            "cartId": str_arg(args, "cartId")?,
            "lines": args["lines"],
        })))
    }
}

pub struct CartLinesRemove {
    schema: Value,
}

impl CartLinesRemove {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "cartId": cart_id_schema("modify"),
                    "lineIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "description": "Array of cart line GIDs to remove."
                    }
                },
                "required": ["cartId", "lineIds"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for CartLinesRemove {
    fn name(&self) -> &str {
        "cartLinesRemove"
    }

    fn description(&self) -> &str {
        "Removes line items from an existing shopping cart. Uses the Storefront API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::mutation(true)
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let query = format!(
            "mutation CartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {{\n  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {{\n    {}\n  }}\n}}",
            CART_FIELDS
        );
        Ok(GraphqlRequest::new(query).with_variables(json!({
            "cartId": str_arg(args, "cartId")?,
            "lineIds": args["lineIds"],
        })))
    }
}

pub struct GetCart {
    schema: Value,
}

impl GetCart {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": { "cartId": cart_id_schema("fetch") },
                "required": ["cartId"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetCart {
    fn name(&self) -> &str {
        "getCart"
    }

    fn description(&self) -> &str {
        "Fetches the details of an existing shopping cart by its ID. Uses the Storefront API."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn build(&self, args: &Value) -> Result<GraphqlRequest, ToolError> {
        let query = r#"query GetCart($cartId: ID!) {
  cart(id: $cartId) {
    id
    createdAt
    updatedAt
    checkoutUrl
    cost { totalAmount { amount currencyCode } subtotalAmount { amount currencyCode } totalTaxAmount { amount currencyCode } totalDutyAmount { amount currencyCode } }
    lines(first: 50) {
      edges {
        node {
          id
          quantity
          cost { totalAmount { amount currencyCode } }
          merchandise {
            ... on ProductVariant {
              id
              title
              price { amount currencyCode }
              product { id title handle }
            }
          }
        }
      }
    }
    buyerIdentity { email phone countryCode customer { id } }
    attributes { key value }
  }
}"#;
        Ok(GraphqlRequest::new(query).with_variables(json!({ "cartId": str_arg(args, "cartId")? })))
    }
}
