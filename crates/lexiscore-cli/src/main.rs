//! lexiscore CLI — essay analysis, follow-up tests, and grading.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "lexiscore",
    version,
    about = "Essay-based CEFR estimation with follow-up diagnostic tests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an essay, or every .txt essay in a directory
    Analyze {
        /// Essay text file or directory of .txt files
        #[arg(long)]
        text: PathBuf,

        /// Pre-annotated JSON document(s); bypasses the annotation service
        #[arg(long)]
        annotations: Option<PathBuf>,

        /// Write the analysis JSON here (a directory when analyzing several essays)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, table
        #[arg(long, default_value = "table")]
        format: String,

        /// Skip the rule checker even if one is configured
        #[arg(long)]
        no_rule_check: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate a follow-up test from a saved analysis
    Followup {
        /// Analysis JSON written by `analyze`
        #[arg(long)]
        result: PathBuf,

        /// Shuffle seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Extra question-bank file or directory (repeatable)
        #[arg(long)]
        bank: Vec<PathBuf>,

        /// Write the questions as JSON here
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade answers to a follow-up test
    Grade {
        /// Analysis JSON written by `analyze`
        #[arg(long)]
        result: PathBuf,

        /// Questions JSON written by `followup`
        #[arg(long)]
        questions: PathBuf,

        /// Answers JSON object: question id -> chosen option
        #[arg(long)]
        answers: PathBuf,

        /// Output format: json, table
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Validate question-bank TOML files
    ValidateBank {
        /// Bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create a starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "lexiscore=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            text,
            annotations,
            output,
            format,
            no_rule_check,
            config,
        } => {
            commands::analyze::execute(text, annotations, output, format, no_rule_check, config)
                .await
        }
        Commands::Followup {
            result,
            seed,
            bank,
            output,
            config,
        } => commands::followup::execute(result, seed, bank, output, config),
        Commands::Grade {
            result,
            questions,
            answers,
            format,
        } => commands::grade::execute(result, questions, answers, format),
        Commands::ValidateBank { bank } => commands::validate_bank::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
