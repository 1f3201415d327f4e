//! Spring2Collection - Command-line tool for generating Postman collections.
//!
//! Reads a Spring Boot project (or an existing OpenAPI document) and writes an enhanced
//! Postman v2.1 collection with variables, default headers and example responses.
//!
//! # Usage
//!
//! ```bash
//! spring2collection --project <PATH|URL> [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Generate a collection from sources:
//! ```bash
//! spring2collection --project ./my-service -o postman_collection.json
//! ```
//!
//! Convert a running service's document:
//! ```bash
//! spring2collection --project http://localhost:8080/v3/api-docs
//! ```
//!
//! Write the intermediate OpenAPI document instead:
//! ```bash
//! spring2collection --project ./my-service -f openapi -o openapi.yaml -v
//! ```

use clap::Parser;
use log::info;
use spring2collection::cli;
use spring2collection::error::Error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    let verbose = args.verbose;

    let log_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Spring2Collection starting...");

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            if let Some(code) = err.chain().find_map(|cause| cause.downcast_ref::<Error>()) {
                eprintln!("Code: {}", code.code());
            }
            if verbose {
                eprintln!("{:?}", err);
            }
            ExitCode::FAILURE
        }
    }
}
