//! OpenAPI document to Postman collection conversion.
//!
//! The pipeline only depends on the [`CollectionConverter`] trait; [`OpenApiConverter`] is
//! the built-in implementation. It understands OpenAPI 3.x and Swagger 2.0 documents
//! supplied as JSON values.

use crate::collection::{
    Body, Collection, Folder, Header, Item, QueryParam, Request, RequestItem, SavedResponse,
    Url, Variable,
};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value};

/// Operation keys of a path item, in the order they are emitted.
pub const METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Maximum `$ref` / nesting depth followed when deriving examples from schemas.
const MAX_EXAMPLE_DEPTH: usize = 5;

/// How requests are grouped into folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderStrategy {
    /// One folder per first operation tag
    #[default]
    Tags,
    /// One folder per first path segment
    Paths,
}

/// Where parameter and example values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Declared examples, falling back to values derived from the schema
    #[default]
    Example,
    /// Type placeholders such as `<long>`
    Schema,
}

/// Options passed to a [`CollectionConverter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    pub folder_strategy: FolderStrategy,
    pub parameters_resolution: Resolution,
    pub example_resolution: Resolution,
    /// Adds the bearer `Authorization` header to the requests stored in saved examples of
    /// secured operations
    pub include_auth_info: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            folder_strategy: FolderStrategy::Tags,
            parameters_resolution: Resolution::Example,
            example_resolution: Resolution::Example,
            include_auth_info: true,
        }
    }
}

/// Trait for turning an OpenAPI document into a collection.
pub trait CollectionConverter {
    /// Converts a document.
    ///
    /// # Errors
    ///
    /// Returns `ConversionFailed` when the document cannot be converted or yields no
    /// requests.
    fn convert(&self, document: &Value, options: &ConversionOptions) -> Result<Collection>;
}

/// Sets the `baseUrl` collection variable, adding it when absent.
pub fn apply_base_url(collection: &mut Collection, base_url: &str) {
    debug!("Applying base URL: {}", base_url);
    collection.upsert_variable("baseUrl", base_url);
}

/// Built-in converter producing Postman v2.1 collections.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenApiConverter;

impl CollectionConverter for OpenApiConverter {
    fn convert(&self, document: &Value, options: &ConversionOptions) -> Result<Collection> {
        debug!("Converting OpenAPI to Postman Collection...");

        let paths = document
            .get("paths")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::ConversionFailed("document has no paths object".to_string()))?;

        let title = document
            .pointer("/info/title")
            .and_then(Value::as_str)
            .unwrap_or("API");
        let mut collection = Collection::new(title);
        collection.info.description = document
            .pointer("/info/description")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(base_url) = server_url(document) {
            collection.variable.push(Variable::string("baseUrl", &base_url));
        }

        let context = Context {
            document,
            options,
            secured_globally: has_security(document.get("security")),
        };

        let mut folders: IndexMap<String, Vec<Item>> = IndexMap::new();
        let mut root = Vec::new();

        for (path, path_item) in paths {
            let Some(path_item) = path_item.as_object() else {
                continue;
            };
            let shared = path_item.get("parameters");

            for (method, operation) in path_item {
                if !METHODS.contains(&method.as_str()) {
                    continue;
                }
                let request = context.request_item(path, method, operation, shared);
                match context.folder_name(path, operation) {
                    Some(folder) => folders.entry(folder).or_default().push(Item::Request(request)),
                    None => root.push(Item::Request(request)),
                }
            }
        }

        collection.item = folders
            .into_iter()
            .map(|(name, item)| {
                Item::Folder(Folder {
                    name,
                    description: None,
                    item,
                })
            })
            .chain(root)
            .collect();

        if collection.request_count() == 0 {
            return Err(Error::ConversionFailed(
                "no requests could be generated from the document".to_string(),
            ));
        }

        debug!("Conversion successful: {}", collection.info.name);
        Ok(collection)
    }
}

/// First server URL (server variables replaced by their defaults), or the Swagger 2
/// scheme, host and base path.
fn server_url(document: &Value) -> Option<String> {
    if let Some(server) = document.pointer("/servers/0") {
        let mut url = server.get("url")?.as_str()?.to_string();
        if let Some(vars) = server.get("variables").and_then(Value::as_object) {
            for (name, var) in vars {
                if let Some(default) = var.get("default").and_then(Value::as_str) {
                    url = url.replace(&format!("{{{name}}}"), default);
                }
            }
        }
        return Some(url.trim_end_matches('/').to_string());
    }

    let host = document.get("host")?.as_str()?;
    let scheme = document
        .pointer("/schemes/0")
        .and_then(Value::as_str)
        .unwrap_or("http");
    let base_path = document
        .get("basePath")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(format!("{scheme}://{host}{}", base_path.trim_end_matches('/')))
}

fn has_security(security: Option<&Value>) -> bool {
    security
        .and_then(Value::as_array)
        .is_some_and(|reqs| reqs.iter().any(|r| r.as_object().is_some_and(|o| !o.is_empty())))
}

struct Context<'a> {
    document: &'a Value,
    options: &'a ConversionOptions,
    secured_globally: bool,
}

impl Context<'_> {
    fn folder_name(&self, path: &str, operation: &Value) -> Option<String> {
        match self.options.folder_strategy {
            FolderStrategy::Tags => operation
                .pointer("/tags/0")
                .and_then(Value::as_str)
                .map(str::to_string),
            FolderStrategy::Paths => path
                .split('/')
                .find(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    fn request_item(
        &self,
        path: &str,
        method: &str,
        operation: &Value,
        shared: Option<&Value>,
    ) -> RequestItem {
        let name = operation
            .get("summary")
            .or_else(|| operation.get("operationId"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(path)
            .to_string();

        let parameters = self.parameters(shared, operation.get("parameters"));

        let mut url = Url {
            host: vec!["{{baseUrl}}".to_string()],
            path: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(to_colon_segment)
                .collect(),
            ..Url::default()
        };
        let mut header = Vec::new();
        let mut body = None;

        for param in &parameters {
            let Some(name) = param.get("name").and_then(Value::as_str) else {
                continue;
            };
            let description = param
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);
            match param.get("in").and_then(Value::as_str) {
                Some("path") => url.variable.push(Variable {
                    key: name.to_string(),
                    value: self.parameter_value(param),
                    var_type: Some("any".to_string()),
                    description,
                }),
                Some("query") => url.query.push(QueryParam {
                    key: name.to_string(),
                    value: Some(self.parameter_value(param)),
                    description,
                    disabled: None,
                }),
                Some("header") => header.push(Header {
                    description,
                    ..Header::text(name, &self.parameter_value(param))
                }),
                Some("body") => {
                    if let Some(schema) = param.get("schema") {
                        let example = self.schema_example(schema, 0);
                        body = Some(("application/json".to_string(), example));
                    }
                }
                _ => {}
            }
        }

        if let Some(request_body) = operation.get("requestBody").map(|b| self.resolve(b)) {
            if let Some((content_type, media)) = pick_media(request_body.get("content")) {
                body = Some((content_type, self.media_example(media)));
            }
        }

        let body = body.map(|(content_type, example)| {
            header.push(Header::text("Content-Type", &content_type));
            Body::json(pretty(&example))
        });

        url.rebuild_raw();
        let request = Request {
            method: method.to_uppercase(),
            header,
            body,
            url,
            description: operation
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        let response = self.saved_responses(operation, &request);
        RequestItem {
            name,
            request,
            response,
        }
    }

    /// Path-level parameters overridden by operation-level ones with the same name and
    /// location.
    fn parameters(&self, shared: Option<&Value>, own: Option<&Value>) -> Vec<Value> {
        let mut merged: IndexMap<(String, String), Value> = IndexMap::new();
        for list in [shared, own].into_iter().flatten() {
            for param in list.as_array().into_iter().flatten() {
                let param = self.resolve(param).clone();
                let key = (
                    param.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                    param.get("in").and_then(Value::as_str).unwrap_or_default().to_string(),
                );
                merged.insert(key, param);
            }
        }
        merged.into_values().collect()
    }

    fn parameter_value(&self, param: &Value) -> String {
        let schema = param.get("schema").unwrap_or(param);
        let value = match self.options.parameters_resolution {
            Resolution::Schema => Value::String(placeholder(schema)),
            Resolution::Example => param
                .get("example")
                .cloned()
                .or_else(|| first_named_example(param.get("examples")))
                .unwrap_or_else(|| self.schema_example(schema, 0)),
        };
        match value {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    fn media_example(&self, media: &Value) -> Value {
        let schema = media.get("schema");
        match self.options.example_resolution {
            Resolution::Schema => schema
                .map(|s| Value::String(placeholder(self.resolve(s))))
                .unwrap_or(Value::Null),
            Resolution::Example => media
                .get("example")
                .cloned()
                .or_else(|| first_named_example(media.get("examples")))
                .or_else(|| schema.map(|s| self.schema_example(s, 0)))
                .unwrap_or(Value::Null),
        }
    }

    fn saved_responses(&self, operation: &Value, request: &Request) -> Vec<SavedResponse> {
        let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
            return Vec::new();
        };

        let secured = match operation.get("security") {
            Some(security) => has_security(Some(security)),
            None => self.secured_globally,
        };
        let mut original = request.clone();
        if self.options.include_auth_info && secured {
            original
                .header
                .push(Header::text("Authorization", "Bearer {{token}}"));
        }

        responses
            .iter()
            .map(|(status, response)| {
                let response = self.resolve(response);
                let code = status.parse::<u16>().unwrap_or(500);
                let name = response
                    .get("description")
                    .and_then(Value::as_str)
                    .filter(|d| !d.is_empty())
                    .unwrap_or(status);

                let example = match pick_media(response.get("content")) {
                    Some((_, media)) => Some(self.media_example(media)),
                    None => response.get("schema").map(|s| self.schema_example(s, 0)),
                };

                let mut saved = SavedResponse::json(name, code, example.as_ref());
                if example.is_none() {
                    saved.preview_language = None;
                    saved.header.clear();
                }
                saved.original_request = Some(original.clone());
                saved
            })
            .collect()
    }

    /// Follows a local `$ref`, returning the value itself when it is not a reference or the
    /// target is missing.
    fn resolve<'v>(&'v self, value: &'v Value) -> &'v Value {
        let mut current = value;
        for _ in 0..MAX_EXAMPLE_DEPTH {
            let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
                return current;
            };
            let Some(pointer) = reference.strip_prefix('#') else {
                return current;
            };
            match self.document.pointer(pointer) {
                Some(target) => current = target,
                None => return current,
            }
        }
        current
    }

    /// Example value derived from a schema.
    fn schema_example(&self, schema: &Value, depth: usize) -> Value {
        if depth > MAX_EXAMPLE_DEPTH {
            return Value::Null;
        }
        let schema = self.resolve(schema);

        if let Some(example) = schema.get("example") {
            return example.clone();
        }
        if let Some(default) = schema.get("default") {
            return default.clone();
        }
        if let Some(first) = schema.pointer("/enum/0") {
            return first.clone();
        }
        if let Some(all_of) = schema.get("allOf").and_then(Value::as_array) {
            let mut merged = Map::new();
            for part in all_of {
                if let Value::Object(fields) = self.schema_example(part, depth + 1) {
                    merged.extend(fields);
                }
            }
            return Value::Object(merged);
        }
        if let Some(first) = schema
            .pointer("/oneOf/0")
            .or_else(|| schema.pointer("/anyOf/0"))
        {
            return self.schema_example(first, depth + 1);
        }

        let schema_type = schema.get("type").and_then(Value::as_str).unwrap_or_else(|| {
            if schema.get("properties").is_some() {
                "object"
            } else {
                ""
            }
        });
        let format = schema.get("format").and_then(Value::as_str).unwrap_or_default();

        match schema_type {
            "object" => {
                let properties = schema
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| {
                        props
                            .iter()
                            .map(|(k, v)| (k.clone(), self.schema_example(v, depth + 1)))
                            .collect::<Map<String, Value>>()
                    })
                    .unwrap_or_default();
                Value::Object(properties)
            }
            "array" => match schema.get("items") {
                Some(items) => Value::Array(vec![self.schema_example(items, depth + 1)]),
                None => Value::Array(Vec::new()),
            },
            "integer" => Value::from(1),
            "number" => Value::from(1.5),
            "boolean" => Value::Bool(true),
            "string" => Value::String(
                match format {
                    "date-time" => "2024-01-01T00:00:00Z",
                    "date" => "2024-01-01",
                    "uuid" => "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                    "email" => "user@example.com",
                    "uri" | "url" => "https://example.com",
                    "byte" => "U3dhZ2dlciByb2Nrcw==",
                    _ => "string",
                }
                .to_string(),
            ),
            _ => Value::Null,
        }
    }
}

/// `{id}` becomes `:id`.
fn to_colon_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push(':');
        out.push_str(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// The JSON media type of a content map, else its first entry.
fn pick_media(content: Option<&Value>) -> Option<(String, &Value)> {
    let content = content?.as_object()?;
    content
        .iter()
        .find(|(ty, _)| ty.contains("json"))
        .or_else(|| content.iter().next())
        .map(|(ty, media)| (ty.clone(), media))
}

fn first_named_example(examples: Option<&Value>) -> Option<Value> {
    examples?
        .as_object()?
        .values()
        .next()
        .and_then(|e| e.get("value"))
        .cloned()
}

/// `<int64>`, `<string>`, ...
fn placeholder(schema: &Value) -> String {
    let label = schema
        .get("format")
        .or_else(|| schema.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("any");
    format!("<{label}>")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
