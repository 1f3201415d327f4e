//! Loading and validating existing OpenAPI / Swagger documents.

use crate::error::{Error, Result};
use crate::source::{extension, is_url, read_source};
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// File names checked, in order, directly under a project directory.
pub const LOCAL_CANDIDATES: &[&str] = &[
    "openapi.json",
    "openapi.yaml",
    "openapi.yml",
    "swagger.json",
    "swagger.yaml",
    "swagger.yml",
];

/// Upper bound on a remote document fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const ACCEPTED_TYPES: &str = "application/json, application/yaml, application/x-yaml";

/// How a document body should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    /// JSON first, then YAML
    Unknown,
}

impl DocumentFormat {
    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            Some("json") => DocumentFormat::Json,
            _ => DocumentFormat::Unknown,
        }
    }

    /// Format implied by a response content type. Anything that is not YAML is tried as
    /// JSON first.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.contains("yaml") || content_type.contains("yml") {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Unknown
        }
    }
}

/// Fetches OpenAPI documents from files or over HTTP.
pub struct OpenApiFetcher {
    client: reqwest::Client,
}

impl OpenApiFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::FetchFailed {
                source_name: "http client".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Loads a document from a URL or a local file.
    pub async fn fetch(&self, source: &str) -> Result<Value> {
        debug!("Fetching OpenAPI from: {}", source);
        if is_url(source) {
            self.fetch_url(source).await
        } else {
            load_file(Path::new(source))
        }
    }

    pub async fn fetch_url(&self, url: &str) -> Result<Value> {
        let failed = |message: String| Error::FetchFailed {
            source_name: url.to_string(),
            message,
        };

        debug!("Making HTTP request to: {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPTED_TYPES)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(e.to_string()))?;

        let format = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(DocumentFormat::from_content_type)
            .unwrap_or(DocumentFormat::Unknown);

        let body = response.text().await.map_err(|e| failed(e.to_string()))?;
        parse_document(&body, format).map_err(|e| failed(e.to_string()))
    }
}

/// Reads a local document. A missing file is `ProjectNotFound`; unreadable or
/// undecodable content is `FetchFailed`.
pub fn load_file(path: &Path) -> Result<Value> {
    let content = read_source(path).map_err(|e| match e {
        Error::ProjectNotFound(_) => e,
        other => Error::FetchFailed {
            source_name: path.display().to_string(),
            message: other.to_string(),
        },
    })?;

    parse_document(&content, DocumentFormat::from_path(path)).map_err(|e| Error::FetchFailed {
        source_name: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Decodes a document body.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(text)?),
        DocumentFormat::Yaml => Ok(serde_yaml::from_str(text)?),
        DocumentFormat::Unknown => match serde_json::from_str(text) {
            Ok(value) => Ok(value),
            Err(_) => Ok(serde_yaml::from_str(text)?),
        },
    }
}

/// Checks the version field and the presence of a non-empty `paths` object.
pub fn validate(document: &Value) -> Result<()> {
    let object = document
        .as_object()
        .ok_or_else(|| Error::InvalidDocument("Specification is not a valid object".to_string()))?;

    if let Some(version) = object.get("openapi") {
        let version = version.as_str().unwrap_or_default();
        if !version.starts_with("3.") {
            return Err(Error::InvalidDocument(format!(
                "Unsupported OpenAPI version: {version}"
            )));
        }
    } else if let Some(version) = object.get("swagger") {
        let version = version.as_str().unwrap_or_default();
        if version != "2.0" {
            return Err(Error::InvalidDocument(format!(
                "Unsupported Swagger version: {version}"
            )));
        }
    } else {
        return Err(Error::InvalidDocument(
            "Missing \"openapi\" or \"swagger\" version field".to_string(),
        ));
    }

    match object.get("paths").and_then(Value::as_object) {
        Some(paths) if !paths.is_empty() => {}
        _ => {
            return Err(Error::InvalidDocument(
                "Missing or invalid \"paths\" field".to_string(),
            ))
        }
    }

    debug!("Valid {} specification", version_label(document));
    Ok(())
}

/// `3.0.1`, `Swagger 2.0`, or empty.
pub fn version_label(document: &Value) -> String {
    if let Some(v) = document.get("openapi").and_then(Value::as_str) {
        v.to_string()
    } else if let Some(v) = document.get("swagger").and_then(Value::as_str) {
        format!("Swagger {v}")
    } else {
        String::new()
    }
}
