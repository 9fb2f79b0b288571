//! Pathoscope command-line caller
//!
//! Thin caller over the inference engine: loads settings, installs logging,
//! builds the shared service and turns its results into JSON reports.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use inference_engine::{ArtifactLoader, InferenceError, InferenceService, ServiceStatus};
use organism_record::OrganismRecord;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::Repository;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod report;
mod settings;

#[cfg(test)]
mod test_support;

pub use report::{build_report, run_batch, BatchEntry, PredictionReport};
pub use settings::{LogFormat, Settings, SettingsError};

/// Exit code for a missing or unusable model artifact
pub const EXIT_MODEL_UNAVAILABLE: u8 = 3;
/// Exit code for invalid settings
pub const EXIT_CONFIG: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "pathoscope", version, about = "Bacterial pathogenicity prediction")]
pub struct Cli {
    /// Settings file layered over the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict one organism and list its most similar stored organisms
    Predict {
        /// JSON file holding one organism record
        #[arg(long)]
        input: PathBuf,
        /// JSON array of stored organisms to rank against
        #[arg(long)]
        organisms: Option<PathBuf>,
        /// Number of similar organisms to report
        #[arg(long)]
        top_n: Option<NonZeroUsize>,
    },
    /// Predict every record of a JSON array
    Batch {
        #[arg(long)]
        inputs: PathBuf,
        #[arg(long)]
        organisms: Option<PathBuf>,
        /// Number of similar organisms to report
        #[arg(long)]
        top_n: Option<NonZeroUsize>,
    },
    /// Load the artifact and report the service status
    Status,
}

/// State shared by every command
pub struct AppState {
    pub service: Arc<InferenceService>,
    pub repository: Arc<Repository>,
    pub settings: Settings,
    pub version: String,
}

impl AppState {
    pub fn new(settings: Settings, repository: Repository) -> Self {
        let service = InferenceService::new(ArtifactLoader::new(settings.candidate_paths()));
        if settings.model_preload {
            let status = service.initialize();
            info!("Model preload finished: {}", status);
        }

        Self {
            service: Arc::new(service),
            repository: Arc::new(repository),
            settings,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn top_n(&self, requested: Option<NonZeroUsize>) -> usize {
        requested.map_or(self.settings.similarity_top_n, NonZeroUsize::get)
    }
}

/// Service status as printed by `pathoscope status`
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: ServiceStatus,
    pub version: String,
    pub candidates: Vec<PathBuf>,
    pub artifact: Option<PathBuf>,
    pub schema_width: Option<usize>,
    pub failure: Option<String>,
}

impl StatusReport {
    pub fn collect(state: &AppState) -> Self {
        let service = &state.service;
        let status = service.initialize();
        let bundle = service.bundle();
        Self {
            status,
            version: state.version.clone(),
            candidates: service.loader().candidates().to_vec(),
            artifact: bundle.and_then(|b| b.source()).map(Path::to_path_buf),
            schema_width: service.schema().map(|s| s.len()),
            failure: service.load_failure().map(ToString::to_string),
        }
    }
}

/// Initialize logging
pub fn init_logging(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .context("invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match settings.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}

/// Process exit status for a failed command
pub fn exit_status(err: &anyhow::Error) -> u8 {
    let model_unavailable = err.chain().any(|cause| {
        cause
            .downcast_ref::<InferenceError>()
            .is_some_and(InferenceError::is_operator_recoverable)
    });
    if model_unavailable {
        EXIT_MODEL_UNAVAILABLE
    } else {
        1
    }
}

/// Run one command, printing its JSON result to stdout
pub async fn run(cli: Cli, settings: Settings) -> anyhow::Result<()> {
    match cli.command {
        Command::Predict { input, organisms, top_n } => {
            let state = AppState::new(settings, open_repository(organisms.as_deref())?);
            let report = predict(&state, &input, top_n)?;
            print_json(&report)
        }
        Command::Batch { inputs, organisms, top_n } => {
            let state = AppState::new(settings, open_repository(organisms.as_deref())?);
            let entries = batch(&state, &inputs, top_n).await?;
            print_json(&entries)?;
            if let Some(failure) = state.service.load_failure() {
                return Err(InferenceError::ModelUnavailable(failure.to_string()).into());
            }
            Ok(())
        }
        Command::Status => {
            let state = AppState::new(settings, Repository::new());
            let report = StatusReport::collect(&state);
            print_json(&report)?;
            if !report.status.is_usable() {
                let reason = report.failure.unwrap_or_else(|| report.status.to_string());
                return Err(InferenceError::ModelUnavailable(reason).into());
            }
            Ok(())
        }
    }
}

fn predict(state: &AppState, input: &Path, top_n: Option<NonZeroUsize>) -> anyhow::Result<PredictionReport> {
    let mut records = read_records(input)?;
    if records.len() != 1 {
        bail!("{} holds {} records, expected exactly one", input.display(), records.len());
    }
    let query = records.remove(0);

    let report = build_report(
        &state.service,
        &state.repository,
        query,
        state.top_n(top_n),
        state.settings.similarity_sample_limit,
    )?;
    Ok(report)
}

async fn batch(state: &AppState, inputs: &Path, top_n: Option<NonZeroUsize>) -> anyhow::Result<Vec<BatchEntry>> {
    let queries = read_records(inputs)?;
    info!("Running batch of {} queries", queries.len());

    let entries = run_batch(
        Arc::clone(&state.service),
        Arc::clone(&state.repository),
        queries,
        state.top_n(top_n),
        state.settings.similarity_sample_limit,
    )
    .await;

    let failed = entries.iter().filter(|e| e.is_failure()).count();
    if failed > 0 {
        warn!("{} of {} batch queries failed", failed, entries.len());
    }
    Ok(entries)
}

fn open_repository(path: Option<&Path>) -> anyhow::Result<Repository> {
    match path {
        Some(path) => {
            let repository = Repository::load_json(path)
                .with_context(|| format!("loading organisms from {}", path.display()))?;
            info!("Ranking against {} stored organisms", repository.len()?);
            Ok(repository)
        }
        None => Ok(Repository::new()),
    }
}

fn read_records(path: &Path) -> anyhow::Result<Vec<OrganismRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    OrganismRecord::many_from_json_str(&contents)
        .with_context(|| format!("parsing organism records from {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
