use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use prlens_core::{OutputFormat, PrLensConfig, PullSummary};
use prlens_review::pipeline::Analyzer;

const CONFIG_FILE: &str = ".prlens.toml";

#[derive(Parser)]
#[command(
    name = "prlens",
    version,
    about = "LLM-assisted pull request review with line-level citations",
    long_about = "prlens fetches a GitHub pull request, asks an OpenAI-compatible LLM for a\n\
                  structured review, and rejects any review whose citations do not point at\n\
                  lines that exist in the PR's patches.\n\n\
                  Examples:\n  \
                    prlens serve                                        Start the HTTP API on 127.0.0.1:8000\n  \
                    prlens analyze https://github.com/o/r/pull/42       Review a pull request\n  \
                    prlens list https://github.com/o/r                  List open pull requests\n  \
                    prlens init                                         Write a default .prlens.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .prlens.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API
    #[command(long_about = "Start the HTTP API.\n\n\
        Routes:\n  POST /analyze    {\"pr_url\": ...} -> {review, pr, files}\n  \
        POST /list-prs   {\"pr_url\": ...} -> {prs}\n  GET  /health\n\n\
        Examples:\n  prlens serve\n  prlens serve --host 0.0.0.0 --port 9000")]
    Serve {
        /// Interface to bind (overrides config and PRLENS_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config and PRLENS_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Review a single pull request and print the result
    Analyze {
        /// Pull request URL, e.g. https://github.com/owner/repo/pull/42
        pr_url: String,

        /// Output format: text, json, or markdown
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// List the most recently updated open pull requests of a repository
    List {
        /// Repository URL, e.g. https://github.com/owner/repo
        repo_url: String,

        /// Output format: text, json, or markdown
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Create a default .prlens.toml in the current directory
    Init,
}

const DEFAULT_CONFIG: &str = r#"# prlens configuration
# Environment variables (and a .env file) override these values.

[github]
# Personal access token; prefer GITHUB_TOKEN in the environment.
# token = "ghp_..."
# api_url = "https://api.github.com"
# timeout_secs = 30

[llm]
# API key; prefer LLM_API_KEY in the environment.
# api_key = "sk-..."
# base_url = "https://api.openai.com/v1"
# model = "gpt-4-turbo"
# timeout_secs = 120

[server]
# host = "127.0.0.1"
# port = 8000
# allowed_origins = ["http://localhost:3000", "http://localhost:3001"]
"#;

fn load_config(path: Option<&Path>) -> Result<PrLensConfig> {
    let config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            PrLensConfig::from_file(path)?
        }
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                debug!(path = CONFIG_FILE, "loading configuration");
                PrLensConfig::from_file(default_path)?
            } else {
                debug!("no {CONFIG_FILE} found, using defaults");
                PrLensConfig::default()
            }
        }
    };
    Ok(config.with_process_env()?)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render_pulls(pulls: &[PullSummary], format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&serde_json::json!({ "prs": pulls })).into_diagnostic()?
        }
        OutputFormat::Markdown => {
            let mut out = String::from("| # | Title | Author | Updated |\n|---|---|---|---|\n");
            for p in pulls {
                out.push_str(&format!(
                    "| [{}]({}) | {} | {} | {} |\n",
                    p.number, p.url, p.title, p.user, p.updated_at
                ));
            }
            out
        }
        OutputFormat::Text => {
            if pulls.is_empty() {
                return Ok("No open pull requests.".into());
            }
            pulls
                .iter()
                .map(|p| format!("#{:<6} {}  (@{}, updated {})", p.number, p.title, p.user, p.updated_at))
                .collect::<Vec<_>>()
                .join("\n")
        }
    };
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            prlens_server::run_server(&config).await?;
        }
        Command::Analyze { pr_url, format } => {
            let config = load_config(cli.config.as_deref())?;
            let analyzer = Analyzer::from_config(&config)?;
            let report = analyzer.analyze(&pr_url).await?;
            match format {
                OutputFormat::Text => print!("{report}"),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?)
                }
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
            }
        }
        Command::List { repo_url, format } => {
            let config = load_config(cli.config.as_deref())?;
            let analyzer = Analyzer::from_config(&config)?;
            let pulls = analyzer.list_open_prs(&repo_url).await?;
            println!("{}", render_pulls(&pulls, format)?);
        }
        Command::Init => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            info!(path = CONFIG_FILE, "wrote default configuration");
            println!("Created {CONFIG_FILE} with default configuration");
        }
    }

    Ok(())
}
