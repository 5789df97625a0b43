//! skillcheck CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "skillcheck",
    version,
    about = "LLM skill-assessment generator and grader"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address (overrides [server] bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Generate a test, printing progress events to stderr
    Generate {
        /// Skill to assess
        #[arg(long)]
        skill: String,

        /// Level: beginner, intermediate, advanced, expert, specialist
        #[arg(long)]
        level: String,

        /// Candidate specialization
        #[arg(long)]
        specialization: Option<String>,

        /// Candidate highest qualification
        #[arg(long)]
        qualification: Option<String>,

        /// Write the test JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Continue from a checkpoint written by a failed run
        #[arg(long)]
        resume_from: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score free-text answers against their rubrics
    Evaluate {
        /// JSON file holding an array of text answers
        #[arg(long)]
        answers: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example answers file
    Init,
}

#[tokio::main]
async fn main() {
    skillcheck_server::telemetry::init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, bind } => commands::serve::execute(config, bind).await,
        Commands::Generate {
            skill,
            level,
            specialization,
            qualification,
            output,
            resume_from,
            config,
        } => {
            commands::generate::execute(commands::generate::GenerateArgs {
                skill,
                level,
                specialization,
                qualification,
                output,
                resume_from,
                config,
            })
            .await
        }
        Commands::Evaluate {
            answers,
            config,
            format,
        } => commands::evaluate::execute(answers, config, format).await,
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
