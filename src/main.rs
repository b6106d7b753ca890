use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use referral_intake::config::{self, EngineConfig};
use referral_intake::pipeline::corpus::{build_corpus_from_dir, save_corpus, CorpusError};
use referral_intake::pipeline::processor::{IntakePipeline, PipelineError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Debug, Parser)]
#[command(name = config::APP_NAME, version, about = "Section detection and suggestions for referral documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the pattern corpus from a directory of labeled analysis samples.
    BuildCorpus {
        samples: PathBuf,
        /// Defaults to the configured corpus path.
        #[arg(long, env = config::CORPUS_ENV)]
        out: Option<PathBuf>,
    },
    /// Analyze one plain-text document and print the result as JSON.
    Analyze {
        file: PathBuf,
        #[arg(long, env = config::CORPUS_ENV)]
        corpus: Option<PathBuf>,
        #[arg(long, env = config::RULES_ENV)]
        rules: Option<PathBuf>,
        /// Reference date (YYYY-MM-DD) for age rules; defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

fn main() -> ExitCode {
    referral_intake::init_tracing();
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::BuildCorpus { samples, out } => {
            let (corpus, sample_count) = build_corpus_from_dir(&samples)?;
            let out = out.unwrap_or_else(config::corpus_path);
            let artifact = save_corpus(&out, &corpus, sample_count)?;
            tracing::info!(
                path = %out.display(),
                samples = sample_count,
                checksum = %artifact.checksum,
                "Corpus written"
            );
        }
        Command::Analyze {
            file,
            corpus,
            rules,
            as_of,
        } => {
            let text = std::fs::read_to_string(&file).map_err(|source| CliError::Read {
                path: file.clone(),
                source,
            })?;
            let mut engine = EngineConfig::from_env();
            if let Some(path) = corpus {
                engine.corpus_path = path;
            }
            if rules.is_some() {
                engine.rules_path = rules;
            }

            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            let output = IntakePipeline::from_config(&engine)?
                .with_reference_date(as_of)
                .analyze(&text);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
