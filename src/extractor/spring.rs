use crate::dto_scanner::DtoCache;
use crate::extractor::annotations::{
    base_path, build_path, classify_parameter, documentation, endpoint_mapping, endpoint_name,
};
use crate::extractor::{EndpointExtractor, HttpMethod, ParameterInfo, ParameterLocation};
use crate::ir::{Endpoint, FileExtraction, Parameter, RequestBodySpec, ResponseSpec};
use crate::mock_generator::MockDataGenerator;
use crate::parser::{JavaParser, MethodInfo, ParsedFile};
use crate::schema_generator::{Schema, SchemaGenerator};
use crate::type_resolver::{JavaType, SchemaDescriptor, TypeFamily, TypeResolver};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};

static PATH_TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)(?::[^}]*)?\}").unwrap());

/// Spring Web controller extractor
pub struct SpringExtractor {
    mock: MockDataGenerator,
    schemas: SchemaGenerator,
}

impl EndpointExtractor for SpringExtractor {
    fn extract_endpoints(&mut self, parsed: &ParsedFile) -> Vec<Endpoint> {
        let base = base_path(&parsed.class.annotations);
        debug!(
            "{}: base path {}, {} method(s)",
            parsed.class.name,
            if base.is_empty() { "/" } else { base.as_str() },
            parsed.methods.len()
        );

        parsed
            .methods
            .iter()
            .filter_map(|method| self.build_endpoint(&parsed.class.name, &base, method))
            .collect()
    }
}

impl SpringExtractor {
    /// Creates an extractor whose examples are drawn from a generator seeded with `seed`.
    pub fn new(dtos: Arc<DtoCache>, seed: u64) -> Self {
        Self {
            mock: MockDataGenerator::new(seed, Arc::clone(&dtos)),
            schemas: SchemaGenerator::new(dtos),
        }
    }

    /// Sets the number of items in list-style response examples.
    pub fn with_list_size(mut self, list_size: usize) -> Self {
        self.mock = self.mock.with_list_size(list_size);
        self
    }

    /// Extracts one file completely, consuming the extractor.
    pub fn extract_file(mut self, parsed: &ParsedFile) -> FileExtraction {
        let endpoints = self.extract_endpoints(parsed);
        FileExtraction {
            path: parsed.path.clone(),
            class_name: parsed.class.name.clone(),
            endpoints,
            schemas: self.into_schemas(),
        }
    }

    /// Component schemas referenced by the endpoints extracted so far.
    pub fn into_schemas(self) -> IndexMap<String, Schema> {
        self.schemas.into_schemas()
    }

    fn build_endpoint(&mut self, class_name: &str, base: &str, method: &MethodInfo) -> Option<Endpoint> {
        let mapping = endpoint_mapping(&method.annotations)?;
        let full_path = build_path(base, &mapping.path);

        let mut endpoint = Endpoint::new(mapping.method, &full_path, &endpoint_name(&method.name));
        endpoint.id = method.name.clone();
        endpoint.tags = vec![class_name.to_string()];

        let (summary, description) = documentation(&method.annotations);
        if let Some(summary) = summary {
            endpoint.name = summary;
        }
        endpoint.description = description;

        for raw in JavaParser::parse_parameters(&method.parameters) {
            let Some(info) = classify_parameter(&raw) else {
                debug!("Skipping unbound parameter {} of {}", raw.name, method.name);
                continue;
            };

            if info.location == ParameterLocation::Body {
                endpoint.request_body = Some(self.request_body(&info));
            } else {
                let parameter = self.parameter(&info);
                endpoint.parameters.push(info.location, parameter);
            }
        }

        self.add_template_parameters(&mut endpoint);

        let return_type = method.return_type.trim();
        if !return_type.is_empty() && return_type != "void" {
            endpoint.responses = self.responses(mapping.method, return_type, &endpoint.path);
        }

        debug!("  {} {} -> {}", endpoint.method, endpoint.path, endpoint.id);
        Some(endpoint)
    }

    fn parameter(&mut self, info: &ParameterInfo) -> Parameter {
        let mut schema = self.schemas.schema_for_type(&info.type_name);
        if let Some(default) = &info.default_value {
            schema.default = Some(Value::String(default.clone()));
        }

        Parameter {
            name: info.name.clone(),
            type_name: info.type_name.clone(),
            required: info.required,
            schema,
            example: Some(self.mock.for_field(&info.name, &info.type_name)),
            description: None,
        }
    }

    fn request_body(&mut self, info: &ParameterInfo) -> RequestBodySpec {
        let descriptor = TypeResolver::resolve(&info.type_name);
        let example = match &descriptor {
            SchemaDescriptor::Reference(name) => self.mock.request_example(name),
            SchemaDescriptor::Array(inner) => match inner.as_ref() {
                SchemaDescriptor::Reference(name) => {
                    Value::Array(vec![self.mock.request_example(name)])
                }
                _ => self.mock.for_type(&info.type_name),
            },
            _ => self.mock.for_type(&info.type_name),
        };

        RequestBodySpec {
            type_name: info.type_name.clone(),
            required: info.required,
            content_type: "application/json".to_string(),
            schema: self.schemas.generate_schema(&descriptor),
            example: Some(example),
        }
    }

    /// Every `{var}` in the path without a declared path parameter becomes a required
    /// string parameter.
    fn add_template_parameters(&mut self, endpoint: &mut Endpoint) {
        let names: Vec<String> = PATH_TEMPLATE_RE
            .captures_iter(&endpoint.path)
            .map(|caps| caps[1].to_string())
            .collect();

        for name in names {
            if endpoint.parameters.has_path_parameter(&name) {
                continue;
            }
            debug!("Synthesizing path parameter {} for {}", name, endpoint.path);
            let example = self.mock.for_field(&name, "String");
            endpoint.parameters.push(
                ParameterLocation::Path,
                Parameter {
                    name,
                    type_name: "String".to_string(),
                    required: true,
                    schema: Schema::typed("string", None),
                    example: Some(example),
                    description: None,
                },
            );
        }
    }

    fn responses(&mut self, method: HttpMethod, return_type: &str, path: &str) -> Vec<ResponseSpec> {
        let descriptor = TypeResolver::resolve(return_type);
        let entity = entity_name(return_type);
        let void = returns_void(return_type);
        let not_found = format!("{entity} not found");

        let mut responses = match method {
            HttpMethod::Get if descriptor.is_array() => vec![ResponseSpec::new(
                200,
                "Successful response",
            )
            .with_example(self.success_example(&descriptor, return_type, &entity))],
            HttpMethod::Get => vec![
                ResponseSpec::new(200, "Successful response")
                    .with_example(self.success_example(&descriptor, return_type, &entity)),
                ResponseSpec::new(404, "Not found")
                    .with_example(self.mock.error_response(404, &not_found, path)),
            ],
            HttpMethod::Post => vec![
                ResponseSpec::new(201, "Created successfully")
                    .with_example(self.success_example(&descriptor, return_type, &entity)),
                ResponseSpec::new(400, "Bad request")
                    .with_example(self.mock.error_response(400, "Validation failed", path)),
            ],
            HttpMethod::Put | HttpMethod::Patch => vec![
                ResponseSpec::new(200, "Updated successfully")
                    .with_example(self.success_example(&descriptor, return_type, &entity)),
                ResponseSpec::new(404, "Not found")
                    .with_example(self.mock.error_response(404, &not_found, path)),
            ],
            HttpMethod::Delete => vec![
                ResponseSpec::new(204, "Deleted successfully"),
                ResponseSpec::new(404, "Not found")
                    .with_example(self.mock.error_response(404, &not_found, path)),
            ],
            _ => vec![ResponseSpec::new(200, "Successful response")],
        };

        if let Some(first) = responses.first_mut() {
            if void {
                first.example = None;
            } else {
                first.schema = Some(self.schemas.generate_schema(&descriptor));
            }
        }

        responses
    }

    fn success_example(&mut self, descriptor: &SchemaDescriptor, return_type: &str, entity: &str) -> Value {
        match descriptor {
            SchemaDescriptor::Reference(_) => self.mock.response_example(entity),
            SchemaDescriptor::Array(inner) if matches!(inner.as_ref(), SchemaDescriptor::Reference(_)) => {
                let count = self.mock.list_size();
                self.mock.list_examples(entity, count)
            }
            _ => self.mock.for_type(return_type),
        }
    }
}

/// Entity name behind container wrappers, `Entity` when nothing meaningful is left.
pub fn entity_name(return_type: &str) -> String {
    let mut ty = JavaType::parse(return_type);
    while ty.array_depth == 0
        && matches!(
            ty.family(),
            TypeFamily::Collection | TypeFamily::Unwrapping | TypeFamily::MultiAsync
        )
    {
        ty = ty.first_arg();
    }

    if ty.base.is_empty() || ty.base == "Object" {
        "Entity".to_string()
    } else {
        ty.base
    }
}

/// Whether the response carries no body once wrappers are removed.
fn returns_void(return_type: &str) -> bool {
    let mut ty = JavaType::parse(return_type);
    while ty.array_depth == 0 && ty.family() == TypeFamily::Unwrapping {
        ty = ty.first_arg();
    }
    ty.base == "Void" || ty.base == "void"
}
