//! Intermediate representation of an extracted API.
//!
//! The IR is filled additively during one run: workers hand back [`FileExtraction`]s and the
//! coordinator merges them with [`ApiIR::merge`]. Once complete it is handed, whole, to the
//! [`OpenApiBuilder`](crate::openapi_builder::OpenApiBuilder).

use crate::extractor::{HttpMethod, ParameterLocation};
use crate::schema_generator::Schema;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_TITLE: &str = "Spring Boot API";
pub const DEFAULT_VERSION: &str = "1.0.0";

/// API metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A server the API is reachable at
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A path, query or header parameter of an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    pub schema: Schema,
    pub example: Option<Value>,
    pub description: Option<String>,
}

/// Endpoint parameters partitioned by location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    pub path: Vec<Parameter>,
    pub query: Vec<Parameter>,
    pub header: Vec<Parameter>,
}

impl ParameterSet {
    /// Appends a parameter to its location's list. Body parameters are not stored here.
    pub fn push(&mut self, location: ParameterLocation, parameter: Parameter) {
        match location {
            ParameterLocation::Path => self.path.push(parameter),
            ParameterLocation::Query => self.query.push(parameter),
            ParameterLocation::Header => self.header.push(parameter),
            ParameterLocation::Body => {
                debug!("Ignoring body parameter {} in parameter set", parameter.name)
            }
        }
    }

    /// Parameters in document order: path, then query, then header.
    pub fn ordered(&self) -> impl Iterator<Item = (ParameterLocation, &Parameter)> {
        self.path
            .iter()
            .map(|p| (ParameterLocation::Path, p))
            .chain(self.query.iter().map(|p| (ParameterLocation::Query, p)))
            .chain(self.header.iter().map(|p| (ParameterLocation::Header, p)))
    }

    pub fn has_path_parameter(&self, name: &str) -> bool {
        self.path.iter().any(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.path.len() + self.query.len() + self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Request body of an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodySpec {
    pub type_name: String,
    pub required: bool,
    pub content_type: String,
    pub schema: Schema,
    pub example: Option<Value>,
}

/// One documented response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub status: u16,
    pub description: String,
    pub content_type: String,
    pub schema: Option<Schema>,
    pub example: Option<Value>,
}

impl ResponseSpec {
    pub fn new(status: u16, description: &str) -> Self {
        Self {
            status,
            description: description.to_string(),
            content_type: "application/json".to_string(),
            schema: None,
            example: None,
        }
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }
}

/// One HTTP operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub id: String,
    pub method: HttpMethod,
    /// Always starts with `/`
    pub path: String,
    /// Display name
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: ParameterSet,
    pub request_body: Option<RequestBodySpec>,
    pub responses: Vec<ResponseSpec>,
}

impl Endpoint {
    /// Creates an endpoint; the path is given a leading `/` when it lacks one.
    pub fn new(method: HttpMethod, path: &str, name: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            id: name.to_string(),
            method,
            path,
            name: name.to_string(),
            description: None,
            tags: Vec::new(),
            parameters: ParameterSet::default(),
            request_body: None,
            responses: Vec::new(),
        }
    }
}

/// Everything one worker extracted from one controller file.
#[derive(Debug, Clone)]
pub struct FileExtraction {
    pub path: PathBuf,
    pub class_name: String,
    pub endpoints: Vec<Endpoint>,
    pub schemas: IndexMap<String, Schema>,
}

/// Per-run API aggregate.
#[derive(Debug, Clone)]
pub struct ApiIR {
    pub info: ApiInfo,
    pub servers: Vec<Server>,
    pub endpoints: Vec<Endpoint>,
    pub schemas: IndexMap<String, Schema>,
    ids: HashSet<String>,
}

impl Default for ApiIR {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DEFAULT_VERSION)
    }
}

impl ApiIR {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            info: ApiInfo {
                title: title.to_string(),
                version: version.to_string(),
                description: None,
            },
            servers: Vec::new(),
            endpoints: Vec::new(),
            schemas: IndexMap::new(),
            ids: HashSet::new(),
        }
    }

    /// Replaces the server list with a single server.
    pub fn set_server_url(&mut self, url: &str) {
        self.servers = vec![Server {
            url: url.to_string(),
            description: None,
        }];
    }

    /// Appends an endpoint, suffixing its id when another endpoint already uses it.
    pub fn add_endpoint(&mut self, mut endpoint: Endpoint) {
        if self.ids.contains(&endpoint.id) {
            let base = endpoint.id.clone();
            let mut n = 2;
            while self.ids.contains(&format!("{base}_{n}")) {
                n += 1;
            }
            endpoint.id = format!("{base}_{n}");
        }
        self.ids.insert(endpoint.id.clone());
        self.endpoints.push(endpoint);
    }

    /// Adds a component schema; the first definition of a name wins.
    pub fn add_schema(&mut self, name: &str, schema: Schema) -> bool {
        if self.schemas.contains_key(name) {
            return false;
        }
        self.schemas.insert(name.to_string(), schema);
        true
    }

    /// Folds one file's extraction result into the aggregate.
    pub fn merge(&mut self, extraction: FileExtraction) {
        for endpoint in extraction.endpoints {
            self.add_endpoint(endpoint);
        }
        for (name, schema) in extraction.schemas {
            self.add_schema(&name, schema);
        }
    }
}
