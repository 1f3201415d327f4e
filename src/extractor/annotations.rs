//! Interpretation of Spring directives: mappings, bindings and documentation.

use crate::extractor::{HttpMethod, ParameterInfo, ParameterLocation};
use crate::parser::{Annotation, RawParameter};
use heck::ToTitleCase;
use regex::Regex;
use std::sync::LazyLock;

/// Directives that turn a method into an endpoint.
pub const MAPPING_ANNOTATIONS: &[&str] = &[
    "GetMapping",
    "PostMapping",
    "PutMapping",
    "DeleteMapping",
    "PatchMapping",
    "RequestMapping",
];

static REQUEST_METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"method\s*=\s*\{?\s*(?:RequestMethod\.)?(\w+)").unwrap());
static VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bvalue\s*=\s*"([^"]+)""#).unwrap());
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bname\s*=\s*"([^"]+)""#).unwrap());
static BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"@\w+\(\s*"([^"]+)"\s*\)"#).unwrap());
static REQUIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"required\s*=\s*(true|false)").unwrap());
static DEFAULT_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"defaultValue\s*=\s*"([^"]+)""#).unwrap());

/// Method and sub-path declared by an endpoint-defining directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMapping {
    pub method: HttpMethod,
    /// Sub-path as written, possibly empty
    pub path: String,
    /// Name of the directive that produced the mapping
    pub annotation: String,
}

/// Base path from the class-level `@RequestMapping`, or empty.
pub fn base_path(class_annotations: &[Annotation]) -> String {
    class_annotations
        .iter()
        .find(|a| a.name == "RequestMapping")
        .and_then(Annotation::value)
        .unwrap_or_default()
}

/// First endpoint-defining directive of a method, if any.
pub fn endpoint_mapping(method_annotations: &[Annotation]) -> Option<EndpointMapping> {
    let annotation = method_annotations
        .iter()
        .find(|a| MAPPING_ANNOTATIONS.contains(&a.name.as_str()))?;

    Some(EndpointMapping {
        method: http_method(annotation),
        path: annotation.value().unwrap_or_default(),
        annotation: annotation.name.clone(),
    })
}

/// HTTP method of a mapping directive. `@RequestMapping` defaults to GET unless it names
/// a `RequestMethod`.
pub fn http_method(annotation: &Annotation) -> HttpMethod {
    match annotation.name.as_str() {
        "PostMapping" => HttpMethod::Post,
        "PutMapping" => HttpMethod::Put,
        "DeleteMapping" => HttpMethod::Delete,
        "PatchMapping" => HttpMethod::Patch,
        "RequestMapping" => annotation
            .args
            .as_deref()
            .and_then(|args| REQUEST_METHOD_RE.captures(args))
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(HttpMethod::Get),
        _ => HttpMethod::Get,
    }
}

/// Classifies a parameter by its binding directive.
///
/// Returns `None` for parameters without one of the four binding directives; those are
/// framework-injected objects and never part of the HTTP contract.
pub fn classify_parameter(param: &RawParameter) -> Option<ParameterInfo> {
    param.annotations.iter().find_map(|annotation| {
        let info = |location, required, default_value| ParameterInfo {
            name: parameter_name(annotation, &param.name),
            type_name: param.type_name.clone(),
            location,
            required,
            default_value,
        };

        match annotation.name.as_str() {
            "PathVariable" => Some(info(ParameterLocation::Path, true, None)),
            "RequestParam" => Some(info(
                ParameterLocation::Query,
                is_required(annotation),
                default_value(annotation),
            )),
            "RequestBody" => Some(ParameterInfo {
                name: param.name.clone(),
                type_name: param.type_name.clone(),
                location: ParameterLocation::Body,
                required: is_required(annotation),
                default_value: None,
            }),
            "RequestHeader" => Some(info(
                ParameterLocation::Header,
                is_required(annotation),
                default_value(annotation),
            )),
            _ => None,
        }
    })
}

/// Bound name: `value = "..."`, then `name = "..."`, then a single bare string, else the
/// source identifier.
pub fn parameter_name(annotation: &Annotation, identifier: &str) -> String {
    let raw = annotation.raw.as_str();
    VALUE_RE
        .captures(raw)
        .or_else(|| NAME_RE.captures(raw))
        .or_else(|| BARE_RE.captures(raw))
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| identifier.to_string())
}

/// Explicit `required = false` overrides the default of `true`.
pub fn is_required(annotation: &Annotation) -> bool {
    REQUIRED_RE
        .captures(&annotation.raw)
        .map(|caps| &caps[1] == "true")
        .unwrap_or(true)
}

pub fn default_value(annotation: &Annotation) -> Option<String> {
    DEFAULT_VALUE_RE
        .captures(&annotation.raw)
        .map(|caps| caps[1].to_string())
}

/// Joins a class base path and a method sub-path.
///
/// The base loses a trailing `/`, a relative sub-path gains a leading `/`, and the result
/// always starts with `/`.
pub fn build_path(base: &str, sub_path: &str) -> String {
    let base = base.trim();
    let base = base.strip_suffix('/').unwrap_or(base);
    let sub_path = sub_path.trim();

    let joined = if sub_path.is_empty() || sub_path.starts_with('/') {
        format!("{base}{sub_path}")
    } else {
        format!("{base}/{sub_path}")
    };

    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

/// Display name for a handler method: `getAllUsers` becomes `Get All Users`.
pub fn endpoint_name(method_name: &str) -> String {
    method_name.to_title_case()
}

/// Summary and description from OpenAPI / Swagger documentation directives.
pub fn documentation(method_annotations: &[Annotation]) -> (Option<String>, Option<String>) {
    for annotation in method_annotations {
        match annotation.name.as_str() {
            "Operation" => {
                let summary = annotation.attribute("summary").filter(|s| !s.is_empty());
                let description = annotation
                    .attribute("description")
                    .filter(|s| !s.is_empty());
                return (summary, description);
            }
            "ApiOperation" => {
                let summary = annotation.value();
                let description = annotation.attribute("notes").filter(|s| !s.is_empty());
                return (summary, description);
            }
            _ => {}
        }
    }
    (None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_annotations, JavaParser};
    use pretty_assertions::assert_eq;

    fn annotation(text: &str) -> Annotation {
        parse_annotations(text).remove(0)
    }

    fn param(text: &str) -> RawParameter {
        JavaParser::parse_parameters(text).remove(0)
    }

    #[test]
    fn test_base_path_from_class_request_mapping() {
        let annotations = parse_annotations(r#"@RestController @RequestMapping("/api/v1/orders")"#);
        assert_eq!(base_path(&annotations), "/api/v1/orders");
        assert_eq!(base_path(&parse_annotations("@RestController")), "");
    }

    #[test]
    fn test_endpoint_mapping_for_verbs() {
        let mapping = endpoint_mapping(&[annotation(r#"@PostMapping("/items")"#)]).unwrap();
        assert_eq!(mapping.method, HttpMethod::Post);
        assert_eq!(mapping.path, "/items");

        let mapping = endpoint_mapping(&[annotation("@DeleteMapping")]).unwrap();
        assert_eq!(mapping.method, HttpMethod::Delete);
        assert_eq!(mapping.path, "");

        assert!(endpoint_mapping(&[annotation("@Transactional")]).is_none());
    }

    #[test]
    fn test_request_mapping_method_override() {
        let plain = annotation(r#"@RequestMapping("/legacy")"#);
        assert_eq!(http_method(&plain), HttpMethod::Get);

        let put = annotation(r#"@RequestMapping(value = "/legacy", method = RequestMethod.PUT)"#);
        assert_eq!(http_method(&put), HttpMethod::Put);

        let braces = annotation(r#"@RequestMapping(path = "/x", method = {RequestMethod.PATCH})"#);
        assert_eq!(http_method(&braces), HttpMethod::Patch);
    }

    #[test]
    fn test_classify_path_variable() {
        let info = classify_parameter(&param(r#"@PathVariable("userId") Long id"#)).unwrap();
        assert_eq!(info.location, ParameterLocation::Path);
        assert_eq!(info.name, "userId");
        assert!(info.required);

        let info = classify_parameter(&param("@PathVariable Long id")).unwrap();
        assert_eq!(info.name, "id");
    }

    #[test]
    fn test_classify_query_parameter() {
        let info = classify_parameter(&param(
            r#"@RequestParam(name = "size", required = false, defaultValue = "20") int size"#,
        ))
        .unwrap();

        assert_eq!(info.location, ParameterLocation::Query);
        assert_eq!(info.name, "size");
        assert!(!info.required);
        assert_eq!(info.default_value.as_deref(), Some("20"));
        assert_eq!(info.type_name, "int");
    }

    #[test]
    fn test_classify_body_and_header() {
        let body = classify_parameter(&param("@Valid @RequestBody CreateUserRequest request")).unwrap();
        assert_eq!(body.location, ParameterLocation::Body);
        assert!(body.required);

        let optional = classify_parameter(&param("@RequestBody(required = false) PatchDto patch")).unwrap();
        assert!(!optional.required);

        let header = classify_parameter(&param(r#"@RequestHeader("X-Request-Id") String requestId"#)).unwrap();
        assert_eq!(header.location, ParameterLocation::Header);
        assert_eq!(header.name, "X-Request-Id");
    }

    #[test]
    fn test_unannotated_parameters_are_ignored() {
        assert!(classify_parameter(&param("Principal principal")).is_none());
        assert!(classify_parameter(&param("@AuthenticationPrincipal User user")).is_none());
    }

    #[test]
    fn test_build_path() {
        assert_eq!(build_path("/api/users", "/{id}"), "/api/users/{id}");
        assert_eq!(build_path("/api/users/", "{id}"), "/api/users/{id}");
        assert_eq!(build_path("/api/users", ""), "/api/users");
        assert_eq!(build_path("", ""), "/");
        assert_eq!(build_path("api", "items"), "/api/items");
    }

    #[test]
    fn test_endpoint_name() {
        assert_eq!(endpoint_name("getAllUsers"), "Get All Users");
        assert_eq!(endpoint_name("create"), "Create");
    }

    #[test]
    fn test_documentation_directives() {
        let (summary, description) = documentation(&[annotation(
            r#"@Operation(summary = "Find a user", description = "Looks a user up by id")"#,
        )]);
        assert_eq!(summary.as_deref(), Some("Find a user"));
        assert_eq!(description.as_deref(), Some("Looks a user up by id"));

        let (summary, _) = documentation(&[annotation(r#"@ApiOperation("Delete a user")"#)]);
        assert_eq!(summary.as_deref(), Some("Delete a user"));

        assert_eq!(documentation(&[]), (None, None));
    }
}
