//! notiond - AI assistant for a Notion workspace
//!
//! Reads pages and databases, asks Google Gemini to summarize, question or
//! improve them, and writes the results back as native blocks.
//!
//! # Modules
//!
//! - [`workspace`] - workspace store trait and Notion REST client
//! - [`llm`] - text generator trait and Gemini client
//! - [`prompts`] - handlebars prompt templates
//! - [`assistant`] - fetch, flatten, prompt, generate
//! - [`integration`] - native write-back (callouts, question lists, analysis pages)
//! - [`interpret`] - natural-language page control
//! - [`server`] - HTTP surface
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod assistant;
pub mod cli;
pub mod config;
pub mod integration;
pub mod interpret;
pub mod llm;
pub mod page_id;
pub mod prompts;
pub mod server;
pub mod workspace;

pub use assistant::{Assistant, AssistantError};
pub use config::Config;
pub use llm::{LlmError, TextGenerator};
pub use workspace::{WorkspaceError, WorkspaceStore};
