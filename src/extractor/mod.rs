//! Endpoint extraction from parsed controller sources.
//!
//! A parsed file ([`ParsedFile`]) carries raw class, method and directive text. Extractors
//! interpret that text for one web framework and fold it into IR [`Endpoint`]s.
//!
//! - **Spring Web MVC / WebFlux**: See [`spring::SpringExtractor`]
//! - Directive interpretation shared by extractors lives in [`annotations`]
//!
//! # Example
//!
//! ```no_run
//! use spring2collection::dto_scanner::DtoCache;
//! use spring2collection::extractor::{EndpointExtractor, spring::SpringExtractor};
//! use spring2collection::parser::JavaParser;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let parsed = JavaParser::parse_file(Path::new("UserController.java")).unwrap();
//! let mut extractor = SpringExtractor::new(Arc::new(DtoCache::new()), 42);
//! let endpoints = extractor.extract_endpoints(&parsed);
//! println!("Found {} endpoints", endpoints.len());
//! ```

pub mod annotations;
pub mod spring;

use crate::ir::Endpoint;
use crate::parser::ParsedFile;
use std::fmt;
use std::str::FromStr;

/// Trait for extracting endpoints from one parsed source file.
///
/// Extractors may keep per-file state (generated examples, collected component schemas),
/// hence `&mut self`. One extractor instance is never shared between workers.
pub trait EndpointExtractor {
    /// Extracts all endpoints declared in `parsed`.
    ///
    /// # Arguments
    ///
    /// * `parsed` - A parsed controller source file
    ///
    /// # Returns
    ///
    /// Returns one `Endpoint` per endpoint-defining method, in declaration order.
    fn extract_endpoints(&mut self, parsed: &ParsedFile) -> Vec<Endpoint>;
}

/// HTTP methods supported by extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP DELETE method
    Delete,
    /// HTTP PATCH method
    Patch,
    /// HTTP OPTIONS method
    Options,
    /// HTTP HEAD method
    Head,
}

impl HttpMethod {
    /// Upper-case method token.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Lower-case key used for OpenAPI path items.
    pub fn openapi_key(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "OPTIONS" => Ok(HttpMethod::Options),
            "HEAD" => Ok(HttpMethod::Head),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// The location where a parameter value is bound in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    /// Path parameter embedded in the URL (e.g., `/users/{id}`)
    Path,
    /// Query string parameter (e.g., `?page=1&size=10`)
    Query,
    /// HTTP header parameter
    Header,
    /// Request body
    Body,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Body => "body",
        }
    }
}

/// A method parameter after binding classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Bound name (directive value, else the source identifier)
    pub name: String,
    /// Declared source type
    pub type_name: String,
    /// Where the value is bound
    pub location: ParameterLocation,
    /// Whether the parameter is required
    pub required: bool,
    /// Declared default value, if any
    pub default_value: Option<String>,
}
