//! Run coordinator: detection, bounded-concurrency extraction, conversion and enhancement.
//!
//! Extraction runs on a fixed pool of tokio workers that drain a shared FIFO queue of
//! controller paths. Workers never touch the aggregate; each sends its file's result back
//! over a channel and the coordinator folds results into the [`ApiIR`]. Per-file failures,
//! panics included, become [`FileWarning`]s and never abort the run.

use crate::collection::Collection;
use crate::config::{GeneratorConfig, OutputKind};
use crate::converter::{
    apply_base_url, CollectionConverter, ConversionOptions, OpenApiConverter, METHODS,
};
use crate::detector::{Strategy, StrategyDetector};
use crate::dto_scanner::{DtoCache, DtoScanner};
use crate::enhancer::CollectionEnhancer;
use crate::error::{Error, Result};
use crate::extractor::spring::SpringExtractor;
use crate::fetcher::OpenApiFetcher;
use crate::ir::{ApiIR, FileExtraction};
use crate::mock_generator::MockDataGenerator;
use crate::openapi_builder::OpenApiBuilder;
use crate::parser::JavaParser;
use crate::scanner::ControllerScanner;
use crate::serializer::{write_artifact, write_as, TextFormat};
use crate::source::SourceFile;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A controller file that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for FileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Outcome of the source extraction phase.
#[derive(Debug)]
pub struct SourceExtraction {
    pub ir: ApiIR,
    pub dtos: Arc<DtoCache>,
    /// Controller files handed to the worker pool
    pub controllers: usize,
    pub warnings: Vec<FileWarning>,
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Name of the strategy that was used
    pub strategy: &'static str,
    pub output_path: PathBuf,
    /// Requests in the generated collection
    pub request_count: usize,
    /// Endpoints extracted from sources, or operations in the loaded document
    pub endpoint_count: usize,
    pub controllers: usize,
    pub warnings: Vec<FileWarning>,
}

/// Drives one generation run.
pub struct Orchestrator {
    config: GeneratorConfig,
    fetcher: OpenApiFetcher,
    converter: Box<dyn CollectionConverter + Send + Sync>,
}

impl Orchestrator {
    /// Creates an orchestrator using the built-in converter.
    ///
    /// # Errors
    ///
    /// Returns `FetchFailed` if the HTTP client cannot be initialised.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        Ok(Self {
            config,
            fetcher: OpenApiFetcher::new()?,
            converter: Box::new(OpenApiConverter),
        })
    }

    /// Replaces the document-to-collection converter.
    pub fn with_converter(mut self, converter: Box<dyn CollectionConverter + Send + Sync>) -> Self {
        self.converter = converter;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Detects how the configured project should be processed.
    pub async fn detect(&self) -> Option<Strategy> {
        StrategyDetector::new(&self.fetcher)
            .detect(&self.config.project)
            .await
    }

    /// Runs detection, generation and output.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when neither an OpenAPI document nor any controller was found.
    ///
    /// # Errors
    ///
    /// Any failure other than a per-file extraction error aborts the run.
    pub async fn run(&self) -> Result<Option<RunReport>> {
        let Some(strategy) = self.detect().await else {
            return Ok(None);
        };
        info!("Using {} strategy: {}", strategy.name(), strategy);
        self.run_strategy(&strategy).await.map(Some)
    }

    /// Generates and writes the output for an already detected strategy.
    pub async fn run_strategy(&self, strategy: &Strategy) -> Result<RunReport> {
        let (document, dtos, endpoint_count, controllers, warnings) = match strategy {
            Strategy::Source { root } => {
                let extraction = self.extract_ir(root).await?;
                let document = OpenApiBuilder::from_ir(&extraction.ir);
                let endpoint_count = extraction.ir.endpoints.len();
                (
                    document.to_value()?,
                    extraction.dtos,
                    endpoint_count,
                    extraction.controllers,
                    extraction.warnings,
                )
            }
            Strategy::OpenApiRemote { document, .. } | Strategy::OpenApiLocal { document, .. } => {
                let endpoint_count = operation_count(document);
                (document.clone(), Arc::new(DtoCache::new()), endpoint_count, 0, Vec::new())
            }
        };

        let output_path = self.config.output_path.clone();
        let request_count = match self.config.output_kind {
            OutputKind::OpenApi => {
                info!("Writing OpenAPI document to {}", output_path.display());
                write_artifact(&document, &output_path)?;
                0
            }
            OutputKind::Postman => {
                info!("Converting to Postman collection...");
                let collection = self.build_collection(&document, dtos)?;
                write_as(&collection, &output_path, TextFormat::Json)?;
                collection.request_count()
            }
        };

        Ok(RunReport {
            strategy: strategy.name(),
            output_path,
            request_count,
            endpoint_count,
            controllers,
            warnings,
        })
    }

    /// Scans a Spring project and extracts every controller into one IR.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` or `NoControllersFound` from the scan. Failures of
    /// individual files are reported in [`SourceExtraction::warnings`].
    pub async fn extract_ir(&self, root: &Path) -> Result<SourceExtraction> {
        info!("Scanning DTOs...");
        let dtos = Arc::new(DtoScanner::new(root.to_path_buf()).scan());
        debug!("DTO cache holds {} class(es)", dtos.len());

        info!("Scanning controllers...");
        let scan = ControllerScanner::new(root.to_path_buf())
            .with_filters(self.config.include.clone(), self.config.exclude.clone())
            .scan()?;
        debug!(
            "Tier {} found {} file(s), {} controller(s) kept",
            scan.tier,
            scan.discovered,
            scan.controllers.len()
        );
        for warning in &scan.warnings {
            debug!("{}", warning);
        }

        let controllers = scan.controllers.len();
        let workers = self.config.worker_count(controllers);
        info!("Extracting {} controller(s) with {} worker(s)...", controllers, workers);

        let queue = Arc::new(Mutex::new(VecDeque::from(scan.controllers)));
        let (tx, mut rx) = mpsc::channel::<(PathBuf, Result<FileExtraction>)>(workers);
        let mut pool = JoinSet::new();

        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let dtos = Arc::clone(&dtos);
            let root = root.to_path_buf();
            let seed = self.config.seed;
            let list_size = self.config.list_example_size;

            pool.spawn(async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some(path) = next else {
                        break;
                    };
                    debug!("Worker {} extracting {}", worker, path.display());
                    let file_seed = file_seed(seed, &path, &root);
                    let task = extract_one(path.clone(), Arc::clone(&dtos), file_seed, list_size);
                    let result = isolate(&path, task).await;
                    if tx.send((path, result)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        // Results arrive in completion order; keyed by path so the merge is reproducible.
        let mut extracted = BTreeMap::new();
        let mut warnings = Vec::new();
        while let Some((path, result)) = rx.recv().await {
            match result {
                Ok(extraction) => {
                    debug!(
                        "{}: {} endpoint(s)",
                        extraction.class_name,
                        extraction.endpoints.len()
                    );
                    extracted.insert(path, extraction);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    warnings.push(FileWarning {
                        message: e.to_string(),
                        path,
                    });
                }
            }
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                warn!("Extraction worker stopped: {}", e);
            }
        }
        // Only non-empty when every worker stopped early
        let leftover: Vec<PathBuf> = queue.lock().await.drain(..).collect();
        for path in leftover {
            warn!("Not processed: {}", path.display());
            warnings.push(FileWarning {
                message: format!(
                    "{} was not processed: no extraction worker left",
                    path.display()
                ),
                path,
            });
        }
        warnings.sort_by(|a, b| a.path.cmp(&b.path));

        let mut ir = ApiIR::default();
        if let Some(base_url) = &self.config.base_url {
            ir.set_server_url(base_url);
        }
        for extraction in extracted.into_values() {
            ir.merge(extraction);
        }
        info!(
            "Extracted {} endpoint(s), {} schema(s), {} file(s) skipped",
            ir.endpoints.len(),
            ir.schemas.len(),
            warnings.len()
        );

        Ok(SourceExtraction {
            ir,
            dtos,
            controllers,
            warnings,
        })
    }

    /// Converts a document and runs every enhancement pass over the result.
    ///
    /// # Errors
    ///
    /// Returns `ConversionFailed` from the converter.
    pub fn build_collection(&self, document: &Value, dtos: Arc<DtoCache>) -> Result<Collection> {
        let mut collection = self
            .converter
            .convert(document, &ConversionOptions::default())?;
        if let Some(base_url) = &self.config.base_url {
            apply_base_url(&mut collection, base_url);
        }

        info!("Enhancing collection...");
        let mock = MockDataGenerator::new(self.config.seed, dtos)
            .with_list_size(self.config.list_example_size);
        let mut enhancer = CollectionEnhancer::new(mock).with_base_url(self.config.base_url.as_deref());
        enhancer.enhance(&mut collection);
        debug!(
            "Discovered {} path variable(s)",
            enhancer.discovered_variables().len()
        );

        Ok(collection)
    }
}

async fn extract_one(
    path: PathBuf,
    dtos: Arc<DtoCache>,
    seed: u64,
    list_size: usize,
) -> Result<FileExtraction> {
    let source = SourceFile::read_async(&path)
        .await
        .map_err(|e| Error::ParseError {
            file: path.clone(),
            message: e.to_string(),
        })?;
    let parsed = JavaParser::parse_source(&source);
    Ok(SpringExtractor::new(dtos, seed)
        .with_list_size(list_size)
        .extract_file(&parsed))
}

/// Runs one file's extraction on its own task so a panic is reported against that file.
async fn isolate<F>(path: &Path, task: F) -> Result<FileExtraction>
where
    F: Future<Output = Result<FileExtraction>> + Send + 'static,
{
    match tokio::spawn(task).await {
        Ok(result) => result,
        Err(e) => Err(Error::ParseError {
            file: path.to_path_buf(),
            message: format!("extraction task failed: {e}"),
        }),
    }
}

/// Per-file mock seed: the run seed mixed with an FNV-1a hash of the root-relative path.
///
/// Results do not depend on which worker picked the file up.
pub fn file_seed(seed: u64, path: &Path, root: &Path) -> u64 {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let normalized = relative.to_string_lossy().replace('\\', "/");
    let hash = normalized.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    seed ^ hash
}

fn operation_count(document: &Value) -> usize {
    document
        .get("paths")
        .and_then(Value::as_object)
        .map(|paths| {
            paths
                .values()
                .filter_map(Value::as_object)
                .map(|item| {
                    item.keys()
                        .filter(|k| METHODS.contains(&k.as_str()))
                        .count()
                })
                .sum()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectSource;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    async fn explode() -> Result<FileExtraction> {
        panic!("unbalanced braces in class body")
    }

    #[tokio::test]
    async fn test_panicking_extraction_becomes_file_error() {
        let path = PathBuf::from("src/main/java/com/example/BrokenController.java");
        let err = isolate(&path, explode()).await.unwrap_err();

        assert_eq!(err.code(), "PARSE_ERROR");
        let message = err.to_string();
        assert!(message.contains("BrokenController.java"));
        assert!(message.contains("panicked"));
    }

    #[tokio::test]
    async fn test_isolate_passes_results_through() {
        let path = PathBuf::from("Missing.java");
        let task = async {
            Err(Error::ParseError {
                file: PathBuf::from("Missing.java"),
                message: "gone".to_string(),
            })
        };
        let err = isolate(&path, task).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse Java file Missing.java: gone");
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn controller(name: &str, base: &str) -> String {
        format!(
            r#"package com.example.web;

@RestController
@RequestMapping("{base}")
public class {name} {{
    @GetMapping
    public List<String> findAll() {{ return null; }}

    @GetMapping("/{{id}}")
    public String findById(@PathVariable Long id) {{ return null; }}
}}
"#
        )
    }

    fn orchestrator(root: &Path) -> Orchestrator {
        let mut config = GeneratorConfig::new(ProjectSource::Path(root.to_path_buf()));
        config.output_path = root.join("out/postman_collection.json");
        config.concurrency = 2;
        Orchestrator::new(config).unwrap()
    }

    #[test]
    fn test_file_seed_depends_on_relative_path() {
        let a = file_seed(42, Path::new("/x/src/A.java"), Path::new("/x"));
        let b = file_seed(42, Path::new("/y/src/A.java"), Path::new("/y"));
        let c = file_seed(42, Path::new("/x/src/B.java"), Path::new("/x"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, file_seed(7, Path::new("/x/src/A.java"), Path::new("/x")));
    }

    #[test]
    fn test_operation_count() {
        let doc = serde_json::json!({
            "paths": {
                "/a": { "get": {}, "post": {}, "parameters": [] },
                "/b": { "delete": {} }
            }
        });
        assert_eq!(operation_count(&doc), 3);
        assert_eq!(operation_count(&serde_json::json!({})), 0);
    }

    #[tokio::test]
    async fn test_extract_ir_merges_all_controllers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for (name, base) in [
            ("UserController", "/users"),
            ("OrderController", "/orders"),
            ("ProductController", "/products"),
        ] {
            write(root, &format!("src/main/java/com/example/web/{name}.java"), &controller(name, base));
        }

        let extraction = orchestrator(root).extract_ir(root).await.unwrap();

        assert_eq!(extraction.controllers, 3);
        assert_eq!(extraction.ir.endpoints.len(), 6);
        assert!(extraction.warnings.is_empty());
        let paths: Vec<_> = extraction.ir.endpoints.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"/orders/{id}"));
        assert!(paths.contains(&"/users"));
    }

    #[tokio::test]
    async fn test_extract_ir_is_reproducible() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for i in 0..6 {
            let name = format!("Thing{i}Controller");
            write(root, &format!("src/main/java/com/example/web/{name}.java"), &controller(&name, &format!("/things{i}")));
        }

        let orchestrator = orchestrator(root);
        let first = orchestrator.extract_ir(root).await.unwrap();
        let second = orchestrator.extract_ir(root).await.unwrap();

        let ids = |ir: &ApiIR| ir.endpoints.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first.ir), ids(&second.ir));
    }

    #[tokio::test]
    async fn test_run_writes_collection() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "src/main/java/com/example/web/UserController.java", &controller("UserController", "/users"));

        let report = orchestrator(root).run().await.unwrap().unwrap();

        assert_eq!(report.strategy, "source");
        assert_eq!(report.request_count, 2);
        assert_eq!(report.endpoint_count, 2);
        let written: Value =
            serde_json::from_str(&fs::read_to_string(&report.output_path).unwrap()).unwrap();
        assert!(written["item"].is_array());
        assert!(written["variable"]
            .as_array()
            .unwrap()
            .iter()
            .any(|v| v["key"] == "baseUrl"));
    }

    #[tokio::test]
    async fn test_run_nothing_detected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "nothing here").unwrap();

        assert!(orchestrator(temp_dir.path()).run().await.unwrap().is_none());
    }

    struct FailingConverter;

    impl CollectionConverter for FailingConverter {
        fn convert(&self, _: &Value, _: &ConversionOptions) -> Result<Collection> {
            Err(Error::ConversionFailed("unsupported".to_string()))
        }
    }

    #[tokio::test]
    async fn test_conversion_failure_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "src/main/java/com/example/web/UserController.java", &controller("UserController", "/users"));

        let err = orchestrator(root)
            .with_converter(Box::new(FailingConverter))
            .run()
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONVERSION_FAILED");
    }
}
