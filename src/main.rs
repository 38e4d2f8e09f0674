//! AsyncAPI Generator - Command-line tool for generating AsyncAPI documents.
//!
//! Functions whose doc comment starts with `asyncApi` describe messages on queues; the
//! types they reference become schemas. The document is written as YAML or JSON.
//!
//! # Usage
//!
//! ```bash
//! asyncapi-from-source [-d <DIR>] [-o <FILE>]
//! ```
//!
//! # Examples
//!
//! ```bash
//! asyncapi-from-source -d ./src -o docs/asyncapi.yaml
//! RUST_LOG=debug asyncapi-from-source -d ./src -o docs/asyncapi.json
//! ```

use anyhow::Result;
use asyncapi_from_source::cli;
use env_logger::Env;
use log::info;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("AsyncAPI Generator starting...");

    let args = cli::parse_args()?;
    cli::run(args)?;

    info!("AsyncAPI document generation completed successfully");

    Ok(())
}
