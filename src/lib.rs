//! Spring2Collection - Enhanced Postman collections from Spring Boot projects.
//!
//! This library turns a description of an HTTP API into a Postman v2.1 collection with
//! collection variables, default headers, normalized request names and example responses.
//! The description is either an existing OpenAPI / Swagger document (local file or URL) or a
//! directory of Spring Boot controller sources, which are analysed heuristically from text.
//!
//! # Architecture
//!
//! 1. [`detector`] - Picks a strategy: remote document, local document or sources
//! 2. [`scanner`] - Finds controller files with progressively relaxed patterns
//! 3. [`dto_scanner`] - Pre-scans model classes into a read-only field cache
//! 4. [`parser`] - Extracts class, method and annotation metadata from Java text
//! 5. [`extractor`] - Turns Spring mappings into endpoints
//! 6. [`type_resolver`] / [`schema_generator`] - Map Java types to schemas
//! 7. [`mock_generator`] - Synthesizes seeded example values
//! 8. [`ir`] / [`openapi_builder`] - Aggregate endpoints and build an OpenAPI 3.0 document
//! 9. [`converter`] - Converts a document into a [`collection::Collection`]
//! 10. [`enhancer`] - Post-processes the collection
//! 11. [`orchestrator`] - Runs the whole pipeline with a bounded worker pool
//!
//! # Example Usage
//!
//! ```no_run
//! use spring2collection::config::{GeneratorConfig, ProjectSource};
//! use spring2collection::orchestrator::Orchestrator;
//! use std::path::PathBuf;
//!
//! # async fn demo() -> spring2collection::error::Result<()> {
//! let config = GeneratorConfig::new(ProjectSource::Path(PathBuf::from("./my-service")));
//! let orchestrator = Orchestrator::new(config)?;
//! if let Some(report) = orchestrator.run().await? {
//!     println!("{} requests written", report.request_count);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod collection;
pub mod config;
pub mod converter;
pub mod detector;
pub mod dto_scanner;
pub mod enhancer;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod ir;
pub mod mock_generator;
pub mod openapi_builder;
pub mod orchestrator;
pub mod parser;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod source;
pub mod type_resolver;
