//! Run configuration consumed by the orchestrator.
//!
//! Values arrive already parsed (see [`crate::cli`]); this module only models them and
//! supplies the documented defaults.

use crate::source::is_url;
use std::path::PathBuf;

/// Default number of controller files extracted in parallel.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default seed for mock data, so two runs over the same input produce the same collection.
pub const DEFAULT_SEED: u64 = 42;

/// Where the API description comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSource {
    /// Local directory (or a local OpenAPI file)
    Path(PathBuf),
    /// Remote OpenAPI document
    Url(String),
}

impl ProjectSource {
    /// Classifies a raw `--project` value.
    pub fn parse(input: &str) -> Self {
        if is_url(input) {
            ProjectSource::Url(input.to_string())
        } else {
            ProjectSource::Path(PathBuf::from(input))
        }
    }
}

/// Which artifact is written to the output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// Enhanced Postman collection
    #[default]
    Postman,
    /// The intermediate OpenAPI document
    OpenApi,
}

/// Validated generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub project: ProjectSource,
    pub output_path: PathBuf,
    pub base_url: Option<String>,
    pub output_kind: OutputKind,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub concurrency: usize,
    pub seed: u64,
    /// Number of items synthesized for list-style response examples
    pub list_example_size: usize,
}

impl GeneratorConfig {
    pub fn new(project: ProjectSource) -> Self {
        Self {
            project,
            ..Self::default()
        }
    }

    /// Splits a comma-separated pattern list, dropping empty entries.
    pub fn split_patterns(raw: Option<&str>) -> Vec<String> {
        raw.map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
    }

    /// Worker count actually used for `file_count` files.
    pub fn worker_count(&self, file_count: usize) -> usize {
        self.concurrency.max(1).min(file_count.max(1))
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            project: ProjectSource::Path(PathBuf::from(".")),
            output_path: PathBuf::from("./postman_collection.json"),
            base_url: None,
            output_kind: OutputKind::Postman,
            include: Vec::new(),
            exclude: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            seed: DEFAULT_SEED,
            list_example_size: 2,
        }
    }
}
