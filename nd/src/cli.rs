//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::assistant::{ImprovementType, QuestionType};
use crate::page_id::resolve_page_ref;

/// notiond - AI assistant for a Notion workspace
#[derive(Parser)]
#[command(
    name = "nd",
    about = "AI assistant for a Notion workspace, backed by Google Gemini",
    version = env!("GIT_DESCRIBE"),
    after_help = after_help()
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
///
/// Every PAGE argument takes either a raw id or a Notion URL.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Summarize a page
    Summarize {
        #[arg(value_name = "PAGE")]
        page: String,
    },

    /// Generate questions about a page
    Questions {
        #[arg(value_name = "PAGE")]
        page: String,

        /// Question flavor (review, discussion, analysis)
        #[arg(short, long, default_value = "review")]
        kind: QuestionType,
    },

    /// Extract key information from a page
    KeyInfo {
        #[arg(value_name = "PAGE")]
        page: String,
    },

    /// Suggest improvements for a page
    Improve {
        #[arg(value_name = "PAGE")]
        page: String,

        /// Focus (clarity, grammar, style, conciseness)
        #[arg(short, long, default_value = "clarity")]
        kind: ImprovementType,
    },

    /// Analyze a database's schema and sample entries
    AnalyzeDb {
        #[arg(value_name = "DB")]
        database: String,
    },

    /// Search the workspace and analyze the hits
    Search { query: String },

    /// Append an AI summary callout to a page
    WriteSummary {
        #[arg(value_name = "PAGE")]
        page: String,
    },

    /// Append AI discussion questions to a page
    WriteQuestions {
        #[arg(value_name = "PAGE")]
        page: String,
    },

    /// Create a full analysis page for a page
    AnalysisPage {
        #[arg(value_name = "PAGE")]
        page: String,

        /// Parent page for the new page (defaults to PAGE)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Run every write-back on one page
    Demo {
        #[arg(value_name = "PAGE")]
        page: String,
    },

    /// Print the page id found in a Notion URL
    PageId { url: String },

    /// List workspace users
    Users,

    /// Show server logs
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

impl Command {
    /// Page or database id for the subcommand, with URLs resolved
    pub fn target(&self) -> Option<String> {
        let raw = match self {
            Self::Summarize { page }
            | Self::Questions { page, .. }
            | Self::KeyInfo { page }
            | Self::Improve { page, .. }
            | Self::WriteSummary { page }
            | Self::WriteQuestions { page }
            | Self::AnalysisPage { page, .. }
            | Self::Demo { page } => page,
            Self::AnalyzeDb { database } => database,
            _ => return None,
        };
        Some(resolve_page_ref(raw))
    }
}

/// Location of the server log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notiond")
        .join("logs")
        .join("notiond.log");
    debug!(?path, "get_log_path: returning path");
    path
}

fn after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::parse_from(["nd", "serve", "--port", "8080"]);
        assert!(matches!(
            cli.command,
            Command::Serve {
                host: None,
                port: Some(8080)
            }
        ));
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["nd"]).is_err());
    }

    #[test]
    fn test_cli_parse_questions_kind() {
        let cli = Cli::parse_from(["nd", "questions", "abc", "--kind", "Discussion"]);
        if let Command::Questions { page, kind } = cli.command {
            assert_eq!(page, "abc");
            assert_eq!(kind, QuestionType::Discussion);
        } else {
            panic!("Expected Questions command");
        }
    }

    #[test]
    fn test_cli_parse_improve_defaults_to_clarity() {
        let cli = Cli::parse_from(["nd", "improve", "abc"]);
        assert!(matches!(
            cli.command,
            Command::Improve {
                kind: ImprovementType::Clarity,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["nd", "improve", "abc", "--kind", "louder"]).is_err());
    }

    #[test]
    fn test_target_resolves_urls() {
        let cli = Cli::parse_from([
            "nd",
            "summarize",
            "https://www.notion.so/team/Roadmap-1234567890abcdef1234567890abcdef",
        ]);
        assert_eq!(cli.command.target().as_deref(), Some("1234567890abcdef1234567890abcdef"));

        let cli = Cli::parse_from(["nd", "analyze-db", "  db-1 "]);
        assert_eq!(cli.command.target().as_deref(), Some("db-1"));

        let cli = Cli::parse_from(["nd", "users"]);
        assert!(cli.command.target().is_none());
    }

    #[test]
    fn test_cli_with_config_and_log_level() {
        let cli = Cli::parse_from(["nd", "-c", "/path/to/notiond.yml", "-l", "debug", "logs"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/notiond.yml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Logs { lines: 50 }));
    }

    #[test]
    fn test_analysis_page_parent() {
        let cli = Cli::parse_from(["nd", "analysis-page", "p1", "--parent", "p0"]);
        if let Command::AnalysisPage { page, parent } = cli.command {
            assert_eq!(page, "p1");
            assert_eq!(parent.as_deref(), Some("p0"));
        } else {
            panic!("Expected AnalysisPage command");
        }
    }
}
