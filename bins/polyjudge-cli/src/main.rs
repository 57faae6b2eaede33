mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "polyjudge-cli")]
#[command(about = "Polyjudge CLI - Inspect adapters, wire output and diagnostics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the type-support matrix and constructs of a language
    Support {
        /// Language name (python, bash, haskell); all languages when omitted
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Decode a captured wire stream, one value per line
    Decode {
        /// File with the captured stdout
        file: PathBuf,

        /// Number of values the stream must hold
        #[arg(short, long)]
        expected: Option<usize>,
    },

    /// Normalize a diagnostic file the way a language adapter does
    Normalize {
        #[arg(short, long)]
        language: String,

        /// File with raw compiler or runtime output
        file: PathBuf,

        /// Natural language of diagnostic keywords
        #[arg(long, default_value = "en")]
        natural_language: String,
    },

    /// Render the encoder program for a JSON array of values
    Encoder {
        #[arg(short, long)]
        language: String,

        /// JSON file holding an array of values
        values: PathBuf,
    },

    /// Judge a submission against a test plan and print the report
    Judge {
        /// Overrides the submission's `#!tested` line and the configured language
        #[arg(short, long)]
        language: Option<String>,

        /// Test plan JSON
        #[arg(short, long)]
        plan: PathBuf,

        /// Submission source file
        #[arg(short, long)]
        submission: PathBuf,

        /// Judge configuration JSON (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Support { language } => {
            commands::print_support(language.as_deref())?;
        }
        Commands::Decode { file, expected } => {
            commands::decode_file(&file, expected)?;
        }
        Commands::Normalize { language, file, natural_language } => {
            commands::normalize_file(&language, &file, &natural_language)?;
        }
        Commands::Encoder { language, values } => {
            commands::render_encoder(&language, &values)?;
        }
        Commands::Judge { language, plan, submission, config } => {
            commands::judge(language.as_deref(), &plan, &submission, config.as_deref()).await?;
        }
    }

    Ok(())
}
