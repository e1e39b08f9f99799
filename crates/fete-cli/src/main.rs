//! Fete command line interface.
//!
//! Validates extracted scan report measurements against reference profiles.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use fete_core::{summarize, Entity, ExtractedData, Outcome, ReferenceProfileStore, Validator};
use fete_runtime::{
    InspectionReport, RuntimeConfig, ScanImage, ScanInspectorBuilder, TranscriptRecognizer,
};

/// Fetal ultrasound scan report validation
#[derive(Parser, Debug)]
#[command(name = "fete")]
#[command(version, about = "Validate fetal ultrasound measurements against reference ranges")]
struct Cli {
    /// Log level filter, overridden by RUST_LOG
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate extracted measurements (label map or entity list, JSON or YAML)
    Validate {
        /// Extracted data file
        file: PathBuf,

        /// Profile catalog to use instead of the built-in profiles
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Recognize and validate an OCR transcript of a scan report
    Inspect {
        /// Transcript text file
        text_file: PathBuf,

        /// Profile catalog to use instead of the built-in profiles
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Runtime configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List reference profiles, or show one
    Profiles {
        /// Profile to show
        name: Option<String>,

        /// Profile catalog to use instead of the built-in profiles
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

/// Exit code for failures other than a verdict.
const EXIT_FAILURE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(command: Command) -> Result<u8> {
    match command {
        Command::Validate {
            file,
            catalog,
            format,
        } => {
            let store = load_store(catalog.as_deref())?;
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let extracted = parse_extracted(&contents)
                .with_context(|| format!("Invalid extracted data in {}", file.display()))?;
            debug!(labels = extracted.len(), "Loaded extracted data");

            let outcome = Validator::new(&store).validate(&extracted);
            match format {
                OutputFormat::Text => print!("{}", render_outcome(&outcome)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
            }
            Ok(exit_code(&outcome))
        }

        Command::Inspect {
            text_file,
            catalog,
            config,
            format,
        } => {
            let store = load_store(catalog.as_deref())?;
            let config = match config {
                Some(path) => RuntimeConfig::from_yaml_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => RuntimeConfig::default(),
            };
            let report = inspect_transcript(&text_file, store, config).await?;

            match format {
                OutputFormat::Text => {
                    for entity in &report.assessment.entities {
                        println!("{}: {}", entity.label, entity.text);
                    }
                    println!();
                    print!("{}", render_outcome(&report.assessment.outcome));
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report.assessment)?)
                }
            }
            Ok(exit_code(&report.assessment.outcome))
        }

        Command::Profiles { name, catalog } => {
            let store = load_store(catalog.as_deref())?;
            print!("{}", render_profiles(&store, name.as_deref())?);
            Ok(0)
        }
    }
}

/// Run a transcript file through the inspection pipeline.
async fn inspect_transcript(
    text_file: &Path,
    store: ReferenceProfileStore,
    config: RuntimeConfig,
) -> Result<InspectionReport> {
    let bytes = std::fs::read(text_file)
        .with_context(|| format!("Failed to read {}", text_file.display()))?;

    let inspector = ScanInspectorBuilder::new()
        .text_recognizer(Arc::new(TranscriptRecognizer::new()))
        .store(Arc::new(store))
        .config(config)
        .build()?;
    let image = ScanImage::new(text_file.display().to_string(), bytes);
    let report = inspector.inspect(&image).await?;
    info!(entities = report.assessment.entities.len(), "Transcript inspected");
    Ok(report)
}

fn load_store(catalog: Option<&Path>) -> Result<ReferenceProfileStore> {
    match catalog {
        Some(path) => ReferenceProfileStore::from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Ok(ReferenceProfileStore::builtin().clone()),
    }
}

/// Parse extracted data from JSON or YAML.
///
/// Accepts a label to value map, or a list of `{text, label}` entities.
fn parse_extracted(contents: &str) -> Result<ExtractedData> {
    // JSON documents are valid YAML
    let value: Value = serde_yaml::from_str(contents)?;

    match value {
        Value::Array(_) => {
            let entities: Vec<Entity> = serde_json::from_value(value)?;
            Ok(ExtractedData::from_entities(&entities))
        }
        Value::Object(map) => map
            .into_iter()
            .map(|(label, value)| -> Result<(String, String)> {
                let text = scalar_text(&label, value)?;
                Ok((label, text))
            })
            .collect(),
        _ => bail!("Expected a label map or a list of entities"),
    }
}

fn scalar_text(label: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => bail!("Value for {} must be a string or number", label),
    }
}

fn exit_code(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Assessed { verdict } if verdict.is_healthy() => 0,
        Outcome::Assessed { .. } => 1,
        Outcome::UnknownProfile { .. } => 2,
    }
}

fn render_outcome(outcome: &Outcome) -> String {
    let mut out = String::new();
    match outcome {
        Outcome::Assessed { verdict } => {
            out.push_str(&format!("Profile: {}\n", verdict.profile()));
            if verdict.is_healthy() {
                out.push_str(&format!("{}\n", summarize(outcome)));
            } else {
                out.push_str("Fetus is not in good condition. Issues found:\n");
                for issue in verdict.issues() {
                    out.push_str(&format!("  - {}\n", issue));
                }
            }
        }
        Outcome::UnknownProfile { selector } => {
            out.push_str(&format!("{}\n", summarize(outcome)));
            match selector {
                Some(value) => out.push_str(&format!("No reference profile named {:?}\n", value)),
                None => out.push_str("No profile selector in the extracted data\n"),
            }
        }
    }
    out
}

fn render_profiles(store: &ReferenceProfileStore, name: Option<&str>) -> Result<String> {
    let mut out = String::new();
    match name {
        None => {
            for profile in store.profiles() {
                out.push_str(&format!(
                    "{} ({} measurements)\n",
                    profile.name(),
                    profile.measurements().len()
                ));
            }
        }
        Some(name) => {
            let Some(profile) = store.get_profile(name) else {
                bail!(
                    "Unknown profile {:?}. Available: {}",
                    name,
                    store.names().join(", ")
                );
            };
            out.push_str(&format!("{}\n", profile.name()));
            for measurement in profile.measurements() {
                let unit = measurement
                    .unit
                    .as_deref()
                    .map(|u| format!(" {}", u))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "  {}: {}{}\n",
                    measurement.label,
                    measurement.expected.describe(),
                    unit
                ));
            }
        }
    }
    Ok(out)
}
