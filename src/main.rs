//! alpr-script - run license plate recognition from the command line or rhai scripts

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rhai::{Dynamic, Engine, Scope};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use alpr_script::config::{self, AppConfig};
use alpr_script::{binding, storage, AlprFacade};

/// alpr-script - scripting front end for an ALPR engine
#[derive(Parser, Debug)]
#[command(name = "alpr-script")]
#[command(about = "Recognize license plates through an external ALPR engine")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overrides the configured level (RUST_LOG still wins)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a rhai script with the `alpr` module registered
    Run {
        /// Script file
        script: PathBuf,
    },
    /// Recognize plates in an image and print the JSON result
    Recognize {
        /// Image file, or `-` to read encoded bytes from stdin
        image: String,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print the engine version
    Version,
    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => storage::default_config_path()?,
    };
    let config = config::load_or_default(&config_path)?;

    init_logging(args.log_level.as_deref().unwrap_or(&config.logging.level))?;

    match args.command {
        Command::Run { script } => run_script(&config, &script),
        Command::Recognize { image, pretty } => recognize(&config, &image, pretty),
        Command::Version => {
            let facade = initialized_facade(&config)?;
            println!("{}", facade.version()?);
            Ok(())
        }
        Command::InitConfig { force } => init_config(&config_path, force),
    }
}

/// Initialize logging to stderr so stdout only carries results
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log filter {level:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;

    Ok(())
}

/// Build a facade, initialize it and apply the `[recognition]` knobs
fn initialized_facade(config: &AppConfig) -> Result<AlprFacade> {
    let facade = AlprFacade::from_config(config);
    facade.initialize_from_config(config)?;
    Ok(facade)
}

fn recognize(config: &AppConfig, image: &str, pretty: bool) -> Result<()> {
    let facade = initialized_facade(config)?;

    let results = if image == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read image from stdin")?;
        if bytes.is_empty() {
            bail!("No image data on stdin");
        }
        facade.recognize_bytes(&bytes)?
    } else {
        facade.recognize_file(Path::new(image))?
    };

    info!(plates = results.results.len(), "Recognition complete");

    let json = if pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        results.to_json()?
    };
    println!("{json}");

    facade.dispose();
    Ok(())
}

fn run_script(config: &AppConfig, script: &Path) -> Result<()> {
    let source = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;

    let facade = Arc::new(AlprFacade::from_config(config));
    let mut engine = Engine::new();
    binding::register(&mut engine, Arc::clone(&facade));

    let mut scope = Scope::new();
    scope.push_constant("ALPR_REGION", config.engine.region.clone());
    scope.push_constant(
        "ALPR_CONFIG_FILE",
        config.engine.config_file.to_string_lossy().into_owned(),
    );
    scope.push_constant(
        "ALPR_RUNTIME_DIR",
        config.engine.runtime_dir.to_string_lossy().into_owned(),
    );

    info!(script = %script.display(), "Running script");
    let result = engine
        .eval_with_scope::<Dynamic>(&mut scope, &source)
        .map_err(|e| match binding::error_kind(&e) {
            Some((kind, message)) => anyhow::anyhow!("{kind}: {message}"),
            None => anyhow::anyhow!("Script failed: {e}"),
        })?;

    if !result.is_unit() {
        println!("{result}");
    }

    facade.dispose();
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config::save_config(&AppConfig::default(), path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
