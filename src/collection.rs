//! Postman collection (v2.1) data model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema URL stamped into every generated collection.
pub const SCHEMA_V21: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// A complete collection: folder/request tree plus collection variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub info: CollectionInfo,
    #[serde(default)]
    pub item: Vec<Item>,
    #[serde(default)]
    pub variable: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    #[serde(rename = "_postman_id", default, skip_serializing_if = "Option::is_none")]
    pub postman_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: String,
}

/// A node of the tree. Folders are recognised by their `item` list, requests by their
/// `request` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    Folder(Folder),
    Request(RequestItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub item: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestItem {
    pub name: String,
    pub request: Request,
    #[serde(default)]
    pub response: Vec<SavedResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub header: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    pub url: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub header_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Header {
    /// A plain enabled text header.
    pub fn text(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            header_type: Some("text".to_string()),
            disabled: None,
            description: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = Some(true);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub mode: String,
    #[serde(default)]
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl Body {
    /// A raw body rendered as JSON.
    pub fn json(raw: String) -> Self {
        Self {
            mode: "raw".to_string(),
            raw,
            options: Some(serde_json::json!({ "raw": { "language": "json" } })),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Url {
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub host: Vec<String>,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<QueryParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable: Vec<Variable>,
}

impl Url {
    /// Rebuilds `raw` from host, path and enabled query parameters.
    pub fn rebuild_raw(&mut self) {
        let mut raw = self.host.join(".");
        if !self.path.is_empty() {
            raw.push('/');
            raw.push_str(&self.path.join("/"));
        }

        let query: Vec<String> = self
            .query
            .iter()
            .filter(|q| q.disabled != Some(true))
            .map(|q| format!("{}={}", q.key, q.value.as_deref().unwrap_or_default()))
            .collect();
        if !query.is_empty() {
            raw.push('?');
            raw.push_str(&query.join("&"));
        }

        self.raw = raw;
    }

    /// `/`-joined path, as used in saved error examples.
    pub fn path_string(&self) -> String {
        format!("/{}", self.path.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub var_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Variable {
    pub fn string(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            var_type: Some("string".to_string()),
            description: None,
        }
    }
}

/// A named example response attached to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResponse {
    pub name: String,
    #[serde(rename = "originalRequest", default, skip_serializing_if = "Option::is_none")]
    pub original_request: Option<Request>,
    pub status: String,
    pub code: u16,
    #[serde(
        rename = "_postman_previewlanguage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub preview_language: Option<String>,
    #[serde(default)]
    pub header: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl SavedResponse {
    /// A JSON example response; `body` of `None` produces an empty response.
    pub fn json(name: &str, code: u16, body: Option<&Value>) -> Self {
        let body = body.map(|b| serde_json::to_string_pretty(b).unwrap_or_else(|_| b.to_string()));
        Self {
            name: name.to_string(),
            original_request: None,
            status: status_text(code).to_string(),
            code,
            preview_language: Some("json".to_string()),
            header: vec![Header {
                key: "Content-Type".to_string(),
                value: "application/json".to_string(),
                header_type: None,
                disabled: None,
                description: None,
            }],
            body,
        }
    }
}

/// Reason phrase for the status codes the generator emits.
pub fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "",
    }
}

impl Collection {
    pub fn new(name: &str) -> Self {
        Self {
            info: CollectionInfo {
                postman_id: None,
                name: name.to_string(),
                description: None,
                schema: SCHEMA_V21.to_string(),
            },
            item: Vec::new(),
            variable: Vec::new(),
        }
    }

    pub fn variable(&self, key: &str) -> Option<&Variable> {
        self.variable.iter().find(|v| v.key == key)
    }

    /// Adds a variable unless one with the same key exists. Returns whether it was added.
    pub fn add_variable_if_missing(&mut self, key: &str, value: &str) -> bool {
        if self.variable(key).is_some() {
            return false;
        }
        self.variable.push(Variable::string(key, value));
        true
    }

    /// Sets a variable's value, adding it when absent.
    pub fn upsert_variable(&mut self, key: &str, value: &str) {
        match self.variable.iter_mut().find(|v| v.key == key) {
            Some(existing) => existing.value = value.to_string(),
            None => self.variable.push(Variable::string(key, value)),
        }
    }

    /// Number of requests anywhere in the tree.
    pub fn request_count(&self) -> usize {
        count_requests(&self.item)
    }

    /// Visits every request item, depth first, in tree order.
    pub fn for_each_request_mut(&mut self, mut f: impl FnMut(&mut RequestItem)) {
        visit_requests_mut(&mut self.item, &mut f);
    }

    /// All request items, depth first, in tree order.
    pub fn requests(&self) -> Vec<&RequestItem> {
        let mut out = Vec::new();
        collect_requests(&self.item, &mut out);
        out
    }
}

fn count_requests(items: &[Item]) -> usize {
    items
        .iter()
        .map(|item| match item {
            Item::Folder(folder) => count_requests(&folder.item),
            Item::Request(_) => 1,
        })
        .sum()
}

fn visit_requests_mut(items: &mut [Item], f: &mut impl FnMut(&mut RequestItem)) {
    for item in items {
        match item {
            Item::Folder(folder) => visit_requests_mut(&mut folder.item, f),
            Item::Request(request) => f(request),
        }
    }
}

fn collect_requests<'a>(items: &'a [Item], out: &mut Vec<&'a RequestItem>) {
    for item in items {
        match item {
            Item::Folder(folder) => collect_requests(&folder.item, out),
            Item::Request(request) => out.push(request),
        }
    }
}
