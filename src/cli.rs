//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{self, Context};
use snowball::config::SnowballConfig;
use snowball::core::models::BuildOperation;
use snowball::output::OutputMode;

/// snowball - dbt build runner and SQL packager
#[derive(Parser, Debug)]
#[command(
    name = "snowball",
    version,
    about = "dbt build runner and SQL packager",
    long_about = "Run dbt builds with live progress, then package the compiled models.\n\n\
                  `sql` rewrites compiled models into stored procedures.\n\
                  `notebooks` assembles them into Spark SQL notebooks."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to ~/.snowball/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single dbt operation with progress
    Build {
        /// deps, seed, debug, run, compile, or run-operation:<macro>
        operation: BuildOperation,
    },

    /// Run the pre-run setup macro
    Setup,

    /// Build and rewrite compiled models into stored procedures
    Sql,

    /// Build and assemble compiled models into notebooks
    Notebooks,

    /// Rewrite already compiled models into stored procedures
    Rewrite {
        /// Compiled models root (defaults to <project>/target/compiled)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Assemble already compiled models into notebooks
    Assemble {
        /// Compiled models root (defaults to <project>/target/compiled)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Output directory (defaults to <output>/notebooks)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the connection details read from profiles.yml
    Profile,

    /// Show version
    Version,
}

/// Run the CLI
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let Some(command) = cli.command else {
        if output_mode == OutputMode::Json {
            println!(
                "{}",
                serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "hint": "Use --help for usage"
                })
            );
        } else {
            println!("snowball v{}", env!("CARGO_PKG_VERSION"));
            println!("\nRun 'snowball --help' for usage");
        }
        return Ok(());
    };

    if matches!(command, Command::Version) {
        if output_mode == OutputMode::Json {
            println!(
                "{}",
                serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION")
                })
            );
        } else {
            println!("snowball v{}", env!("CARGO_PKG_VERSION"));
        }
        return Ok(());
    }

    let config = SnowballConfig::load(cli.config.as_deref())?;
    let ctx = Context::new(config, output_mode);

    match command {
        Command::Build { operation } => commands::build(&ctx, operation).await,
        Command::Setup => commands::setup(&ctx).await,
        Command::Sql => commands::sql(&ctx).await,
        Command::Notebooks => commands::notebooks(&ctx).await,
        Command::Rewrite { root } => commands::rewrite(&ctx, root),
        Command::Assemble { root, out } => commands::assemble(&ctx, root, out),
        Command::Profile => commands::profile(&ctx),
        Command::Version => Ok(()),
    }
}
