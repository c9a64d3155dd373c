// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use errata_config::{Catalog, load_config, validate_config};
use errata_error::ErrataErrorDto;
use errata_template::Value;
use schemars::schema_for;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Repo maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate JSON Schemas for the catalog format and error snapshots.
    Schema {
        /// Output directory.
        #[arg(long, default_value = "contracts/schemas")]
        out_dir: PathBuf,
    },

    /// Validate an error catalog and print its warnings.
    Check {
        /// Catalog TOML file.
        catalog: PathBuf,
    },

    /// Render one error from a catalog.
    Render {
        /// Catalog TOML file.
        catalog: PathBuf,

        /// Error ID, e.g. svc_db_ConnFailed.
        id: String,

        /// Template argument as key=value. Values that parse as JSON are
        /// used as such; anything else is a string. Can be repeated.
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Print the full JSON snapshot instead of the descriptions.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("errata=debug")
    } else {
        EnvFilter::new("errata=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Schema { out_dir } => schema(out_dir),
        Command::Check { catalog } => check(&catalog),
        Command::Render {
            catalog,
            id,
            args,
            json,
        } => render(&catalog, &id, &args, json),
    }
}

fn schema(out_dir: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&out_dir).context("create schema output dir")?;

    let catalog = schema_for!(errata_config::CatalogConfig);
    let error = schema_for!(ErrataErrorDto);

    write_schema(&out_dir.join("catalog.schema.json"), &catalog)?;
    write_schema(&out_dir.join("error.schema.json"), &error)?;

    eprintln!("wrote schemas to {}", out_dir.display());
    Ok(())
}

fn write_schema(path: &Path, schema: &schemars::Schema) -> Result<()> {
    let s = serde_json::to_string_pretty(schema)?;
    std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let config = load_config(Some(path)).with_context(|| format!("load {}", path.display()))?;
    let warnings = validate_config(&config)?;
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    println!(
        "ok: {} kinds, {} warnings",
        config.kind_count(),
        warnings.len()
    );
    Ok(())
}

fn render(path: &Path, id: &str, args: &[String], json: bool) -> Result<()> {
    let config = load_config(Some(path)).with_context(|| format!("load {}", path.display()))?;
    let catalog = Catalog::from_config(&config)?;
    let Some(mut err) = catalog.error(id) else {
        bail!("unknown error id '{id}'");
    };
    for arg in args {
        let (key, value) = parse_arg(arg)?;
        err = err.with_argument(key, value);
    }

    if json {
        let dto = ErrataErrorDto::from(&err);
        println!("{}", serde_json::to_string_pretty(&dto)?);
    } else {
        let description = err.description();
        println!("friendly:  {}", description.friendly());
        println!("technical: {}", description.technical());
        println!("sensitivity: {}", err.sensitivity());
    }
    Ok(())
}

fn parse_arg(raw: &str) -> Result<(&str, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("argument '{raw}' is not key=value");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("argument '{raw}' has an empty key");
    }
    let value = serde_json::from_str::<serde_json::Value>(value)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(value));
    Ok((key, value))
}
