//! `u-allocate`: estimate Nextflow process resources from past runs.
//!
//! # Usage
//!
//! ```bash
//! # Estimate from two projects and write resources.config
//! u-allocate ./project-a ./project-b
//!
//! # Stricter bound, custom memory range, print instead of writing
//! u-allocate -c 0.99 -m 1000 64000 --dry-run ./project-a
//!
//! # Forget everything cached
//! u-allocate --clean ./project-a
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use u_allocate::config::EstimatorConfig;
use u_allocate::ingest::{
    clean_project, collect_native_usage, NativeSource, NextflowLog, PbsPro, ProjectCollector,
};
use u_allocate::models::ClampRange;
use u_allocate::policy::{render_nextflow_config, PolicyGenerator, ProcessDefaults};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Nextflow project directories to read
    #[arg(required = true)]
    directories: Vec<PathBuf>,

    /// Memory clamp range in MB
    #[arg(short, long, num_args = 2, value_names = ["MIN", "MAX"])]
    memory: Option<Vec<f64>>,

    /// Wall-time clamp range in seconds
    #[arg(short = 't', long, num_args = 2, value_names = ["MIN", "MAX"])]
    walltime: Option<Vec<f64>>,

    /// Upper-bound confidence level in (0, 1)
    #[arg(short, long)]
    confidence: Option<f64>,

    /// Safety multiplier applied to every estimate
    #[arg(long)]
    multiplier: Option<f64>,

    /// Ignore log-derived tasks that ran this many seconds or less
    #[arg(long)]
    skip_duration: Option<f64>,

    /// Output config file
    #[arg(short, long, default_value = "resources.config")]
    output: PathBuf,

    /// Print the config instead of writing it
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Delete the cached task data of each directory and exit
    #[arg(long, default_value_t = false)]
    clean: bool,

    /// TOML file with estimator settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Path to the nextflow executable
    #[arg(long, default_value = "nextflow")]
    nextflow: PathBuf,
}

impl Args {
    fn estimator_config(&self) -> Result<EstimatorConfig> {
        let mut config = match &self.config {
            Some(path) => EstimatorConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => EstimatorConfig::default(),
        };

        if let Some(confidence) = self.confidence {
            config.confidence = confidence;
        }
        if let Some(multiplier) = self.multiplier {
            config.multiplier = multiplier;
        }
        if let Some(seconds) = self.skip_duration {
            config.skip_duration_secs = seconds;
        }
        if let Some(range) = self.memory.as_deref() {
            config.clamp.memory = Some(range_arg(range)?);
        }
        if let Some(range) = self.walltime.as_deref() {
            config.clamp.wall_time = Some(range_arg(range)?);
        }

        if let Err(errors) = config.validate() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!("invalid settings: {}", messages.join("; "));
        }
        Ok(config)
    }
}

fn range_arg(values: &[f64]) -> Result<ClampRange> {
    match values {
        [min, max] => Ok(ClampRange::new(*min, *max)),
        _ => bail!("expected MIN MAX, got {} values", values.len()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    if args.clean {
        for dir in &args.directories {
            if clean_project(dir)? {
                info!(dir = %dir.display(), "removed cache");
            } else {
                debug!(dir = %dir.display(), "no cache to remove");
            }
        }
        return Ok(());
    }

    let config = args.estimator_config()?;
    debug!(?config, "settings");

    let sources: Vec<Box<dyn NativeSource>> = vec![Box::new(PbsPro::default())];
    let native = collect_native_usage(&sources);

    let collector = config.collector(ProjectCollector::new(
        NextflowLog::new().with_program(&args.nextflow),
    ));
    let mut optimizer = config.optimizer();

    for dir in &args.directories {
        ensure!(dir.is_dir(), "{} is not a directory", dir.display());
        let (measurements, _) = collector
            .collect(dir, &native)
            .with_context(|| format!("collecting {}", dir.display()))?;
        for measurement in measurements {
            optimizer.add_measurement(measurement);
        }
    }

    let report = optimizer.estimate_all(&config.clamp);
    let policies = PolicyGenerator::new(config.clamp).generate(&report);
    if policies.is_empty() {
        println!("No estimates generated");
        return Ok(());
    }

    let text = render_nextflow_config(&ProcessDefaults::default(), &policies);

    if args.dry_run {
        print!("{text}");
    } else {
        fs::write(&args.output, &text)
            .with_context(|| format!("writing {}", args.output.display()))?;
        println!(
            "Resources successfully estimated from {} tasks and written to {}",
            optimizer.count_measurements(),
            args.output.display()
        );
    }
    Ok(())
}
