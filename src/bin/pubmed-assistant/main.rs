use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(
    name = "pubmed-assistant",
    about = "PubMed research assistant with LLM summaries and citation export",
    long_about = "Search PubMed with structured filters, summarize and analyze the results with an \
                  OpenAI-compatible model, and export them as CSV, JSON, BibTeX or a report"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API key for NCBI E-utilities (increases rate limit)
    #[arg(long, env = "NCBI_API_KEY", global = true)]
    api_key: Option<String>,

    /// Email for NCBI requests (recommended)
    #[arg(long, env = "NCBI_EMAIL", global = true)]
    email: Option<String>,

    /// Tool name for NCBI requests
    #[arg(long, env = "NCBI_TOOL", default_value = "pubmed-assistant", global = true)]
    tool: String,

    /// API key for the chat-completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", global = true, hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", global = true)]
    openai_base_url: Option<String>,

    /// Chat model used for summaries and analysis
    #[arg(long, env = "OPENAI_MODEL", global = true)]
    model: Option<String>,

    /// Timeout in seconds for chat completions (default: none)
    #[arg(long, global = true)]
    llm_timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how many PubMed records match the filters
    Count(commands::count::Count),
    /// Search PubMed, optionally summarizing, analyzing and exporting the results
    Search(Box<commands::search::Search>),
    /// List the preset searches or run one of them
    Samples(commands::samples::Samples),
    /// Interactive session with history, summaries, analysis, Q&A and export
    Shell(commands::shell::Shell),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; variables may come from the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing with indicatif layer for progress spinners
    let filter = if cli.verbose { "debug" } else { "info" };

    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(indicatif_layer.get_stderr_writer()),
        )
        .with(indicatif_layer)
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    match &cli.command {
        Commands::Count(cmd) => cmd.execute(&cli).await,
        Commands::Search(cmd) => cmd.execute(&cli).await,
        Commands::Samples(cmd) => cmd.execute(&cli).await,
        Commands::Shell(cmd) => cmd.execute(&cli).await,
    }
}
