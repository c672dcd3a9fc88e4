// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use nios_provider::config::ProviderConfig;
use nios_provider::diagnostics::Diagnostics;
use nios_provider::errors::ProviderError;
use nios_provider::provider::Provider;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info};

/// Manage Infoblox NIOS DNS objects from JSON documents.
///
/// Every command writes one JSON document to stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "nios-provider", version, about)]
struct Cli {
    /// Provider configuration file (YAML); NIOS_* environment variables override it
    #[arg(long, global = true, env = "NIOS_PROVIDER_CONFIG")]
    provider_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the schema of every resource and data source, or of one type
    Schema {
        #[arg(long = "type")]
        type_name: Option<String>,
    },
    /// Validate a resource configuration without calling the WAPI
    Validate {
        #[arg(long = "type")]
        type_name: String,
        /// Configuration document (`-` for stdin)
        #[arg(long)]
        config: PathBuf,
    },
    /// Create a resource from a plan and print its state
    Create {
        #[arg(long = "type")]
        type_name: String,
        #[arg(long)]
        plan: PathBuf,
    },
    /// Refresh a resource state; prints `null` if the object is gone
    Read {
        #[arg(long = "type")]
        type_name: String,
        #[arg(long)]
        state: PathBuf,
    },
    /// Update a resource from its prior state and a new plan
    Update {
        #[arg(long = "type")]
        type_name: String,
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        plan: PathBuf,
    },
    /// Delete a resource
    Delete {
        #[arg(long = "type")]
        type_name: String,
        #[arg(long)]
        state: PathBuf,
    },
    /// Import an existing object by reference
    Import {
        #[arg(long = "type")]
        type_name: String,
        #[arg(long = "ref")]
        reference: String,
    },
    /// Run a data source query
    Query {
        #[arg(long = "type")]
        type_name: String,
        /// Query document with `filters` and `extattrfilters` (`-` for stdin)
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("nios-provider")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn initialize_logging() {
    // Respects RUST_LOG, defaulting to INFO, and RUST_LOG_FORMAT=json|text.
    // Logs go to stderr so stdout carries only the JSON result.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(false)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    initialize_logging();
    debug!(command = ?cli.command, "Logging initialized");

    match run(&cli).await {
        Ok(output) => write_json(&output).await,
        Err(RunError::Provider(err)) => {
            error!(error = %err, "Operation failed");
            write_json(&json!({ "diagnostics": Diagnostics::from(&err) })).await?;
            std::process::exit(1);
        }
        Err(RunError::Invalid(diagnostics)) => {
            write_json(&json!({ "diagnostics": diagnostics })).await?;
            std::process::exit(1);
        }
        Err(RunError::Other(err)) => Err(err),
    }
}

enum RunError {
    /// Reported to the caller as diagnostics
    Provider(ProviderError),
    /// Validation findings
    Invalid(Diagnostics),
    /// Local failure (unreadable input file)
    Other(anyhow::Error),
}

impl From<ProviderError> for RunError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<anyhow::Error> for RunError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err)
    }
}

fn load_config(path: Option<&Path>) -> Result<ProviderConfig, ProviderError> {
    let config = match path {
        Some(path) => ProviderConfig::from_yaml_file(path)?,
        None => ProviderConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn configured_provider(cli: &Cli) -> Result<Provider, ProviderError> {
    let config = load_config(cli.provider_config.as_deref())?;
    debug!(config = ?config, "Loaded provider configuration");
    Provider::configure(&config)
}

async fn run(cli: &Cli) -> std::result::Result<Value, RunError> {
    match &cli.command {
        Command::Schema { type_name } => {
            let provider = Provider::unconfigured();
            let output = match type_name {
                Some(name) => match provider.resource(name) {
                    Ok(resource) => to_value(&resource.schema())?,
                    Err(_) => to_value(&provider.data_source(name)?.schema())?,
                },
                None => to_value(&provider.schemas())?,
            };
            Ok(output)
        }
        Command::Validate { type_name, config } => {
            let provider = Provider::unconfigured();
            let document = read_document(config).await?;
            let diagnostics = match provider.resource(type_name) {
                Ok(resource) => resource.validate_config(&document),
                Err(_) => provider.data_source(type_name)?.validate_config(&document),
            };
            if diagnostics.has_error() {
                return Err(RunError::Invalid(diagnostics));
            }
            Ok(json!({ "diagnostics": diagnostics }))
        }
        Command::Create { type_name, plan } => {
            let plan = read_document(plan).await?;
            let resource = configured_provider(cli)?.resource(type_name)?;
            let state = resource.create(plan).await?;
            info!(type_name = %type_name, "Create complete");
            Ok(state)
        }
        Command::Read { type_name, state } => {
            let state = read_document(state).await?;
            let resource = configured_provider(cli)?.resource(type_name)?;
            Ok(resource.read(state).await?.unwrap_or(Value::Null))
        }
        Command::Update {
            type_name,
            state,
            plan,
        } => {
            let prior = read_document(state).await?;
            let plan = read_document(plan).await?;
            let resource = configured_provider(cli)?.resource(type_name)?;
            Ok(resource.update(prior, plan).await?)
        }
        Command::Delete { type_name, state } => {
            let state = read_document(state).await?;
            let resource = configured_provider(cli)?.resource(type_name)?;
            resource.delete(state).await?;
            Ok(Value::Null)
        }
        Command::Import {
            type_name,
            reference,
        } => {
            let resource = configured_provider(cli)?.resource(type_name)?;
            Ok(resource.import(reference).await?)
        }
        Command::Query { type_name, config } => {
            let query = read_document(config).await?;
            let data_source = configured_provider(cli)?.data_source(type_name)?;
            Ok(data_source.read(query).await?)
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> std::result::Result<Value, RunError> {
    serde_json::to_value(value)
        .context("failed to serialize schema")
        .map_err(RunError::Other)
}

/// Read a JSON document from a file, or from stdin when the path is `-`.
async fn read_document(path: &Path) -> Result<Value> {
    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("failed to read stdin")?;
        buffer
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&contents).with_context(|| format!("{} is not valid JSON", path.display()))
}

async fn write_json(value: &Value) -> Result<()> {
    let mut rendered = serde_json::to_vec_pretty(value)?;
    rendered.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&rendered).await?;
    stdout.flush().await?;
    Ok(())
}
