//! `namematch` command line.
//!
//! ```text
//! namematch fit   -c config.yaml [-f yaml|json] [-p]
//! namematch match [-c config.yaml] [-b bundle.mdl] QUERY...
//! namematch inspect -b bundle.mdl
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use namematch::matcher::bundle::read_manifest;
use namematch::{open_engine, ConfigFormat, MatchEngine, NameMatchConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser)]
#[command(name = "namematch")]
#[command(about = "Fuzzy matching of noisy names against a fixed catalog")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a matcher from its catalog and write the bundle
    Fit {
        /// Config file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
        /// Config syntax (defaults to the file extension, then yaml)
        #[arg(short, long)]
        format: Option<ConfigFormat>,
        /// Print the effective config as JSON before fitting
        #[arg(short, long)]
        print: bool,
    },
    /// Rank catalog names for each query and print them as JSON
    Match {
        /// Config file; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Config syntax (defaults to the file extension, then yaml)
        #[arg(short, long)]
        format: Option<ConfigFormat>,
        /// Bundle to restore instead of the configured persistence path
        #[arg(short, long)]
        bundle: Option<PathBuf>,
        /// Names to match
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Print the manifest of a bundle
    Inspect {
        #[arg(short, long)]
        bundle: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Fit {
            config,
            format,
            print,
        } => {
            let cfg = load_config(&config, format)?;
            if print {
                println!("{}", cfg.to_json_pretty()?);
            }
            let engine = MatchEngine::fit(cfg.matcher.clone()).context("fitting matcher")?;
            engine.persist().with_context(|| {
                format!(
                    "writing bundle {}",
                    cfg.matcher.persistence_path.display()
                )
            })?;
            info!(
                path = %cfg.matcher.persistence_path.display(),
                catalog_len = engine.catalog().len(),
                vocabulary_len = engine.vocabulary_len(),
                "model_dumped"
            );
        }
        Commands::Match {
            config,
            format,
            bundle,
            queries,
        } => {
            let cfg = match config {
                Some(path) => load_config(&path, format)?,
                None => NameMatchConfig::default(),
            };
            let engine = open_engine(&cfg.matcher, bundle.as_deref()).context("opening matcher")?;
            for records in engine.match_many(&queries)? {
                println!("{}", serde_json::to_string(&records)?);
            }
        }
        Commands::Inspect { bundle } => {
            let manifest = read_manifest(&bundle)?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
    }

    Ok(())
}

fn load_config(path: &Path, format: Option<ConfigFormat>) -> Result<NameMatchConfig> {
    let format = format.unwrap_or_else(|| ConfigFormat::from_path(path));
    NameMatchConfig::from_file_with(path, format)
        .with_context(|| format!("loading {format} config {}", path.display()))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
