use crate::extractor::HttpMethod;
use crate::ir::{ApiIR, ApiInfo, Endpoint, Server};
use crate::schema_generator::Schema;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

/// OpenAPI version emitted by the builder.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// Description of the synthesized response of an operation that declares none.
const DEFAULT_RESPONSE: &str = "Successful response";

/// OpenAPI Path Item object
#[derive(Debug, Clone, Default, Serialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    /// Stores an operation, returning the one it replaced.
    pub fn set(&mut self, method: HttpMethod, operation: Operation) -> Option<Operation> {
        self.slot(method).replace(operation)
    }

    pub fn get_operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
        }
    }

    /// Number of operations defined on this path.
    pub fn operation_count(&self) -> usize {
        [
            &self.get,
            &self.post,
            &self.put,
            &self.delete,
            &self.patch,
            &self.options,
            &self.head,
        ]
        .iter()
        .filter(|op| op.is_some())
        .count()
    }
}

/// OpenAPI Operation object
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Keyed by status code
    pub responses: IndexMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Request Body object
#[derive(Debug, Clone, Serialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI Media Type object
#[derive(Debug, Clone, Serialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, Serialize)]
pub struct Components {
    pub schemas: IndexMap<String, Schema>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: ApiInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    pub paths: IndexMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl OpenApiDocument {
    /// Total number of operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(PathItem::operation_count).sum()
    }

    /// The document as a JSON value, the shape consumed by collection converters.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Builder for OpenAPI documents
pub struct OpenApiBuilder {
    info: ApiInfo,
    servers: Vec<Server>,
    paths: IndexMap<String, PathItem>,
    schemas: IndexMap<String, Schema>,
    /// Number of operations dropped by a later endpoint on the same path and method
    overwritten: usize,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with the given info block
    pub fn new(info: ApiInfo) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info,
            servers: Vec::new(),
            paths: IndexMap::new(),
            schemas: IndexMap::new(),
            overwritten: 0,
        }
    }

    /// Builds the document for a complete IR.
    pub fn from_ir(ir: &ApiIR) -> OpenApiDocument {
        let mut builder = Self::new(ir.info.clone()).with_servers(ir.servers.clone());
        for endpoint in &ir.endpoints {
            builder.add_endpoint(endpoint);
        }
        builder.add_schemas(&ir.schemas);
        builder.build()
    }

    pub fn with_servers(mut self, servers: Vec<Server>) -> Self {
        self.servers = servers;
        self
    }

    /// Add an endpoint to the OpenAPI document.
    ///
    /// A later endpoint on an already documented (path, method) pair replaces the earlier
    /// operation.
    pub fn add_endpoint(&mut self, endpoint: &Endpoint) {
        debug!("Adding endpoint: {} {}", endpoint.method, endpoint.path);

        let operation = Self::operation(endpoint);
        let path_item = self.paths.entry(endpoint.path.clone()).or_default();

        if let Some(previous) = path_item.set(endpoint.method, operation) {
            self.overwritten += 1;
            warn!(
                "{} {} is declared twice; operation {} replaces {}",
                endpoint.method,
                endpoint.path,
                endpoint.id,
                previous.operation_id.unwrap_or_default()
            );
        }
    }

    /// Registers component schemas; existing names are kept.
    pub fn add_schemas(&mut self, schemas: &IndexMap<String, Schema>) {
        for (name, schema) in schemas {
            self.schemas
                .entry(name.clone())
                .or_insert_with(|| schema.clone());
        }
    }

    /// Number of operations replaced so far.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }

    fn operation(endpoint: &Endpoint) -> Operation {
        let parameters: Vec<Parameter> = endpoint
            .parameters
            .ordered()
            .map(|(location, p)| Parameter {
                name: p.name.clone(),
                location: location.as_str().to_string(),
                required: p.required,
                schema: p.schema.clone(),
                example: p.example.clone(),
                description: p.description.clone(),
            })
            .collect();

        let request_body = endpoint.request_body.as_ref().map(|body| RequestBody {
            description: None,
            required: body.required,
            content: IndexMap::from([(
                body.content_type.clone(),
                MediaType {
                    schema: Some(body.schema.clone()),
                    example: body.example.clone(),
                },
            )]),
        });

        let mut responses: IndexMap<String, Response> = endpoint
            .responses
            .iter()
            .map(|r| {
                let content = (r.schema.is_some() || r.example.is_some()).then(|| {
                    IndexMap::from([(
                        r.content_type.clone(),
                        MediaType {
                            schema: r.schema.clone(),
                            example: r.example.clone(),
                        },
                    )])
                });
                (
                    r.status.to_string(),
                    Response {
                        description: r.description.clone(),
                        content,
                    },
                )
            })
            .collect();

        if responses.is_empty() {
            responses.insert(
                "200".to_string(),
                Response {
                    description: DEFAULT_RESPONSE.to_string(),
                    content: None,
                },
            );
        }

        Operation {
            summary: Some(endpoint.name.clone()),
            description: endpoint.description.clone(),
            operation_id: Some(endpoint.id.clone()),
            tags: endpoint.tags.clone(),
            parameters: (!parameters.is_empty()).then_some(parameters),
            request_body,
            responses,
        }
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        info!(
            "Built OpenAPI document: {} path(s), {} schema(s)",
            self.paths.len(),
            self.schemas.len()
        );
        if self.overwritten > 0 {
            warn!("{} operation(s) were replaced by duplicates", self.overwritten);
        }

        let components = (!self.schemas.is_empty()).then_some(Components {
            schemas: self.schemas,
        });

        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            paths: self.paths,
            components,
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new(ApiIR::default().info)
    }
}
