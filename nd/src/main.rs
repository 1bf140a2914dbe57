//! notiond - AI assistant for a Notion workspace
//!
//! CLI entry point: run the HTTP server or call an assistant operation once.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use notiond::assistant::Assistant;
use notiond::cli::{Cli, Command, get_log_path};
use notiond::config::Config;
use notiond::integration::{NativeIntegration, page_link};
use notiond::llm::create_generator;
use notiond::page_id::{extract_page_id, resolve_page_ref};
use notiond::prompts::PromptLoader;
use notiond::server::{self, AppState};
use notiond::workspace::{NotionConnector, PageMeta, WorkspaceConnector};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so nothing here can trace
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notiond")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("notiond.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("notiond loaded config: model={}", config.gemini.model);

    debug!(command = ?cli.command, "main: dispatching command");
    let target = cli.command.target().unwrap_or_default();
    match cli.command {
        Command::Serve { host, port } => cmd_serve(config, host, port).await,
        Command::PageId { url } => cmd_page_id(&url),
        Command::Logs { lines } => cmd_logs(lines),
        Command::Users => cmd_users(&config).await,
        Command::Summarize { .. } => {
            let assistant = assistant(&config)?;
            print_result("Summary", assistant.summarize_page(&target).await?);
            Ok(())
        }
        Command::Questions { kind, .. } => {
            let assistant = assistant(&config)?;
            print_result("Questions", assistant.questions_for_page(&target, kind).await?);
            Ok(())
        }
        Command::KeyInfo { .. } => {
            let assistant = assistant(&config)?;
            print_result("Key Information", assistant.key_info_for_page(&target).await?);
            Ok(())
        }
        Command::Improve { kind, .. } => {
            let assistant = assistant(&config)?;
            print_result("Suggestions", assistant.improve_page(&target, kind).await?);
            Ok(())
        }
        Command::AnalyzeDb { .. } => {
            let assistant = assistant(&config)?;
            print_result("Database Analysis", assistant.analyze_database(&target).await?);
            Ok(())
        }
        Command::Search { query } => {
            let assistant = assistant(&config)?;
            print_result("Search & Analysis", assistant.search_and_analyze(&query).await?);
            Ok(())
        }
        Command::WriteSummary { .. } => {
            integration(&config)?.add_summary_to_page(&target).await?;
            println!("{} AI summary added to {}", "✓".green(), page_link(&target));
            Ok(())
        }
        Command::WriteQuestions { .. } => {
            integration(&config)?.add_questions_to_page(&target).await?;
            println!("{} AI questions added to {}", "✓".green(), page_link(&target));
            Ok(())
        }
        Command::AnalysisPage { parent, .. } => {
            let parent = parent.as_deref().map(resolve_page_ref);
            let page = integration(&config)?
                .create_analysis_page(&target, parent.as_deref())
                .await?;
            print_created("Analysis page", &page);
            Ok(())
        }
        Command::Demo { .. } => {
            let page = integration(&config)?.demonstrate(&target).await?;
            print_created("Demo complete. Analysis page", &page);
            Ok(())
        }
    }
}

/// Build the shared server state from configuration
fn build_state(config: Config) -> Result<AppState> {
    debug!("build_state: called");
    let generator = create_generator(&config.gemini).context("Failed to create Gemini client")?;
    let connector = NotionConnector::new(config.notion.clone()).context("Failed to create Notion client")?;
    let root = std::env::current_dir().context("Failed to read current directory")?;

    Ok(AppState {
        default_token: config.notion.token(),
        generator,
        connector: Arc::new(connector),
        prompts: Arc::new(PromptLoader::new(root)),
        config: Arc::new(config),
    })
}

/// Run the HTTP server
async fn cmd_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    debug!(?host, ?port, "cmd_serve: called");
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    println!("{} notiond listening on http://{}", "→".cyan(), addr);
    println!("Logs: {}", get_log_path().display());

    server::serve(build_state(config)?).await
}

/// Assistant bound to the configured workspace token
fn assistant(config: &Config) -> Result<Assistant> {
    debug!("assistant: called");
    config.validate()?;
    let token = config.notion.token().ok_or_else(|| {
        eyre::eyre!(
            "Notion token not found. Set the {} environment variable.",
            config.notion.token_env
        )
    })?;

    let state = build_state(config.clone())?;
    let store = state.connector.connect(&token)?;
    Ok(Assistant::new(store, state.generator, state.prompts))
}

fn integration(config: &Config) -> Result<NativeIntegration> {
    Ok(NativeIntegration::new(assistant(config)?, config.chunking.max_length))
}

async fn cmd_users(config: &Config) -> Result<()> {
    debug!("cmd_users: called");
    let users = assistant(config)?.store().list_users().await?;
    if users.is_empty() {
        println!("No users visible to this integration");
        return Ok(());
    }
    for user in users {
        let name = user.name.as_deref().unwrap_or("(unnamed)");
        let kind = user.kind.as_deref().unwrap_or("unknown");
        println!("{:<36} {:<8} {}", user.id.dimmed(), kind, name.bold());
    }
    Ok(())
}

fn cmd_page_id(url: &str) -> Result<()> {
    debug!(%url, "cmd_page_id: called");
    match extract_page_id(url) {
        Some(id) => {
            println!("{}", id);
            Ok(())
        }
        None => Err(eyre::eyre!("No page ID found in URL: {}", url)),
    }
}

/// Show the last N lines of the server log
fn cmd_logs(lines: usize) -> Result<()> {
    debug!(lines, "cmd_logs: called");
    let log_path = get_log_path();

    if !log_path.exists() {
        debug!(?log_path, "cmd_logs: log file does not exist");
        println!("No log file found at: {}", log_path.display());
        return Ok(());
    }

    let file = fs::File::open(&log_path).context("Failed to open log file")?;
    let all_lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();
    let start = all_lines.len().saturating_sub(lines);

    for line in &all_lines[start..] {
        println!("{}", line);
    }
    Ok(())
}

fn print_result(heading: &str, text: String) {
    println!("{}", heading.bold().underline());
    println!();
    println!("{}", text);
}

fn print_created(label: &str, page: &PageMeta) {
    let url = page.url.clone().unwrap_or_else(|| page_link(&page.id));
    println!("{} {}: {}", "✓".green(), label, url);
}
