use crate::config::{GeneratorConfig, OutputKind, ProjectSource, DEFAULT_CONCURRENCY, DEFAULT_SEED};
use crate::orchestrator::{Orchestrator, RunReport};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Spring2Collection - Generate enhanced Postman collections from Spring Boot projects
#[derive(Parser, Debug)]
#[command(name = "spring2collection")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Spring Boot project directory, OpenAPI file, or OpenAPI URL
    #[arg(long = "project", value_name = "PATH|URL")]
    pub project: String,

    /// Output file path
    #[arg(short = 'o', long = "out", value_name = "FILE", default_value = "./postman_collection.json")]
    pub output_path: PathBuf,

    /// Override the base URL of the generated requests
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "postman")]
    pub output_format: OutputFormat,

    /// Only scan controller files matching these comma-separated patterns
    #[arg(long = "include", value_name = "PATTERNS")]
    pub include: Option<String>,

    /// Skip controller files matching these comma-separated patterns
    #[arg(long = "exclude", value_name = "PATTERNS")]
    pub exclude: Option<String>,

    /// Number of controller files processed in parallel
    #[arg(long = "concurrency", value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Seed for generated example data
    #[arg(long = "seed", value_name = "N", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Enhanced Postman v2.1 collection
    Postman,
    /// The OpenAPI document the collection is built from
    Openapi,
}

impl From<OutputFormat> for OutputKind {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Postman => OutputKind::Postman,
            OutputFormat::Openapi => OutputKind::OpenApi,
        }
    }
}

impl CliArgs {
    /// Builds the run configuration.
    pub fn into_config(self) -> Result<GeneratorConfig> {
        if self.concurrency == 0 {
            anyhow::bail!("--concurrency must be at least 1");
        }

        let mut config = GeneratorConfig::new(ProjectSource::parse(&self.project));
        config.output_path = self.output_path;
        config.base_url = self.base_url.map(|url| url.trim_end_matches('/').to_string());
        config.output_kind = self.output_format.into();
        config.include = GeneratorConfig::split_patterns(self.include.as_deref());
        config.exclude = GeneratorConfig::split_patterns(self.exclude.as_deref());
        config.concurrency = self.concurrency;
        config.seed = self.seed;
        Ok(config)
    }
}

/// Run the main workflow
pub async fn run(args: CliArgs) -> Result<()> {
    debug!("Parsed arguments: {:?}", args);
    let config = args.into_config()?;

    info!("Step 1: Detecting project type for {}", describe(&config.project));
    let orchestrator = Orchestrator::new(config).context("Failed to initialise generator")?;
    let Some(strategy) = orchestrator.detect().await else {
        anyhow::bail!(
            "Could not detect an API description in {}.\n\
             Expected one of:\n  \
             - an OpenAPI document (openapi.json, openapi.yaml, swagger.json, ...)\n  \
             - Spring Boot controllers under src/main/java\n  \
             - a URL serving an OpenAPI document (e.g. http://localhost:8080/v3/api-docs)",
            describe(&orchestrator.config().project)
        );
    };
    info!("Detected: {}", strategy);

    info!("Step 2: Generating {:?} output...", orchestrator.config().output_kind);
    let report = orchestrator
        .run_strategy(&strategy)
        .await
        .context("Generation failed")?;

    info!("Step 3: Done");
    print_report(&report);
    Ok(())
}

fn describe(project: &ProjectSource) -> String {
    match project {
        ProjectSource::Path(path) => path.display().to_string(),
        ProjectSource::Url(url) => url.clone(),
    }
}

fn print_report(report: &RunReport) {
    for warning in &report.warnings {
        warn!("Skipped {}", warning);
    }
    info!("Strategy: {}", report.strategy);
    if report.controllers > 0 {
        info!("Controllers: {}", report.controllers);
    }
    info!("Endpoints: {}", report.endpoint_count);
    if report.request_count > 0 {
        info!("Requests: {}", report.request_count);
    }
    info!("Output written to {}", report.output_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["spring2collection", "--project", "./demo"]).unwrap();
        assert_eq!(args.output_path, PathBuf::from("./postman_collection.json"));
        assert_eq!(args.output_format, OutputFormat::Postman);
        assert_eq!(args.concurrency, 5);
        assert_eq!(args.seed, 42);
        assert!(!args.verbose);

        let config = args.into_config().unwrap();
        assert_eq!(config.project, ProjectSource::Path(PathBuf::from("./demo")));
        assert_eq!(config.output_kind, OutputKind::Postman);
        assert!(config.include.is_empty());
    }

    #[test]
    fn test_all_options() {
        let args = CliArgs::try_parse_from([
            "spring2collection",
            "--project",
            "https://api.example.com/v3/api-docs",
            "-o",
            "out/api.yaml",
            "--base-url",
            "https://staging.example.com/",
            "-f",
            "openapi",
            "--include",
            "**/api/**",
            "--exclude",
            "*Legacy*,**/internal/**",
            "--concurrency",
            "8",
            "--seed",
            "7",
            "-v",
        ])
        .unwrap();
        assert!(args.verbose);

        let config = args.into_config().unwrap();
        assert!(matches!(config.project, ProjectSource::Url(_)));
        assert_eq!(config.base_url.as_deref(), Some("https://staging.example.com"));
        assert_eq!(config.output_kind, OutputKind::OpenApi);
        assert_eq!(config.include, vec!["**/api/**".to_string()]);
        assert_eq!(config.exclude.len(), 2);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_project_is_required() {
        assert!(CliArgs::try_parse_from(["spring2collection"]).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let args =
            CliArgs::try_parse_from(["spring2collection", "--project", ".", "--concurrency", "0"])
                .unwrap();
        assert!(args.into_config().is_err());
    }

    #[tokio::test]
    async fn test_run_reports_missing_project() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let project = temp_dir.path().display().to_string();
        let args = CliArgs::try_parse_from(["spring2collection", "--project", &project]).unwrap();

        let err = run(args).await.unwrap_err();
        assert!(err.to_string().contains("Could not detect"));
    }
}
