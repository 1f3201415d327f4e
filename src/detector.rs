use crate::config::ProjectSource;
use crate::fetcher::{load_file, validate, OpenApiFetcher, LOCAL_CANDIDATES};
use crate::scanner::ControllerScanner;
use log::debug;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// How a project's API description will be obtained.
///
/// OpenAPI strategies carry the already loaded and validated document so it is not fetched
/// a second time.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// A remote OpenAPI / Swagger document
    OpenApiRemote { url: String, document: Value },
    /// An OpenAPI / Swagger file on disk
    OpenApiLocal { path: PathBuf, document: Value },
    /// Spring controller sources under a project root
    Source { root: PathBuf },
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::OpenApiRemote { .. } => "openapi-remote",
            Strategy::OpenApiLocal { .. } => "openapi-local",
            Strategy::Source { .. } => "source",
        }
    }

    /// The loaded document for OpenAPI strategies.
    pub fn document(&self) -> Option<&Value> {
        match self {
            Strategy::OpenApiRemote { document, .. } | Strategy::OpenApiLocal { document, .. } => {
                Some(document)
            }
            Strategy::Source { .. } => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::OpenApiRemote { url, .. } => write!(f, "OpenAPI document at {url}"),
            Strategy::OpenApiLocal { path, .. } => {
                write!(f, "OpenAPI document {}", path.display())
            }
            Strategy::Source { root } => write!(f, "Spring sources in {}", root.display()),
        }
    }
}

/// Strategy detector for a project input.
///
/// Detection order: a URL input is fetched as an OpenAPI document; a path is checked for
/// each of the conventional OpenAPI file names (or is itself such a file); finally the
/// directory is scanned for Spring controllers.
pub struct StrategyDetector<'a> {
    fetcher: &'a OpenApiFetcher,
}

impl<'a> StrategyDetector<'a> {
    pub fn new(fetcher: &'a OpenApiFetcher) -> Self {
        Self { fetcher }
    }

    /// Detects the strategy for a project.
    ///
    /// # Returns
    ///
    /// Returns `None` when neither a valid OpenAPI document nor any controller is found.
    /// Failures along the way are logged at debug level and only rule a candidate out.
    pub async fn detect(&self, project: &ProjectSource) -> Option<Strategy> {
        debug!("Detecting strategy...");

        let root = match project {
            ProjectSource::Url(url) => {
                debug!("Input is URL, trying OpenAPI strategy...");
                return match self.fetcher.fetch_url(url).await {
                    Ok(document) if Self::is_valid(&document, url) => Some(Strategy::OpenApiRemote {
                        url: url.clone(),
                        document,
                    }),
                    Ok(_) => None,
                    Err(e) => {
                        debug!("Remote document unavailable: {}", e);
                        None
                    }
                };
            }
            ProjectSource::Path(root) => root,
        };

        if root.is_file() {
            return Self::local_document(root);
        }

        for candidate in LOCAL_CANDIDATES {
            let path = root.join(candidate);
            debug!("Checking for {}...", path.display());
            if let Some(strategy) = Self::local_document(&path) {
                debug!("Found: {}", path.display());
                return Some(strategy);
            }
        }

        debug!("OpenAPI not found, trying source strategy...");
        match ControllerScanner::new(root.clone()).scan() {
            Ok(result) => {
                debug!("Found {} Spring Boot controller(s)", result.controllers.len());
                Some(Strategy::Source { root: root.clone() })
            }
            Err(e) => {
                debug!("Source strategy unavailable: {}", e);
                None
            }
        }
    }

    fn local_document(path: &Path) -> Option<Strategy> {
        if !path.is_file() {
            return None;
        }
        match load_file(path) {
            Ok(document) if Self::is_valid(&document, &path.display().to_string()) => {
                Some(Strategy::OpenApiLocal {
                    path: path.to_path_buf(),
                    document,
                })
            }
            Ok(_) => None,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                None
            }
        }
    }

    fn is_valid(document: &Value, origin: &str) -> bool {
        match validate(document) {
            Ok(()) => true,
            Err(e) => {
                debug!("Rejecting {}: {}", origin, e);
                false
            }
        }
    }
}
