//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::embedded;
use crate::assistant::{ImprovementType, QuestionType};

/// One renderable prompt and the values it needs
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt<'a> {
    Summarize {
        content: &'a str,
        max_words: u32,
    },
    Analyze {
        content: &'a str,
        context: Option<&'a str>,
    },
    Suggestions {
        topic: &'a str,
        requirements: &'a str,
    },
    Improve {
        content: &'a str,
        improvement: ImprovementType,
    },
    Questions {
        content: &'a str,
        question: QuestionType,
    },
    KeyInfo {
        content: &'a str,
    },
    /// Ask the model to classify a free-form page command
    InterpretCommand {
        command: &'a str,
        page_id: Option<&'a str>,
        database_id: Option<&'a str>,
        context: Option<&'a str>,
    },
    CreatePage {
        details: &'a str,
    },
    AddBlocks {
        details: &'a str,
    },
    Generate {
        details: &'a str,
        context: Option<&'a str>,
    },
    Custom {
        prompt: &'a str,
        content: &'a str,
    },
    /// Catch-all assistance when a command can't be classified
    General {
        command: &'a str,
        available: Option<&'a str>,
        context: Option<&'a str>,
    },
}

impl Prompt<'_> {
    /// Template file name, without the `.pmt` extension
    pub fn template_name(&self) -> &'static str {
        match self {
            Prompt::Summarize { .. } => "summarize",
            Prompt::Analyze { .. } => "analyze",
            Prompt::Suggestions { .. } => "suggestions",
            Prompt::Improve { .. } => "improve",
            Prompt::Questions { .. } => "questions",
            Prompt::KeyInfo { .. } => "key-info",
            Prompt::InterpretCommand { .. } => "interpret-command",
            Prompt::CreatePage { .. } => "create-page",
            Prompt::AddBlocks { .. } => "add-blocks",
            Prompt::Generate { .. } => "generate",
            Prompt::Custom { .. } => "custom",
            Prompt::General { .. } => "general",
        }
    }

    /// Template variables
    pub fn context(&self) -> Value {
        match self {
            Prompt::Summarize { content, max_words } => json!({ "content": content, "max_words": max_words }),
            Prompt::Analyze { content, context } => json!({ "content": content, "context": context }),
            Prompt::Suggestions { topic, requirements } => json!({ "topic": topic, "requirements": requirements }),
            Prompt::Improve { content, improvement } => {
                json!({ "content": content, "improvement_type": improvement.as_str() })
            }
            Prompt::Questions { content, question } => {
                json!({ "content": content, "question_type": question.as_str() })
            }
            Prompt::KeyInfo { content } => json!({ "content": content }),
            Prompt::InterpretCommand {
                command,
                page_id,
                database_id,
                context,
            } => json!({
                "command": command,
                "page_id": page_id,
                "database_id": database_id,
                "context": context,
            }),
            Prompt::CreatePage { details } | Prompt::AddBlocks { details } => json!({ "details": details }),
            Prompt::Generate { details, context } => json!({ "details": details, "context": context }),
            Prompt::Custom { prompt, content } => json!({ "prompt": prompt, "content": content }),
            Prompt::General {
                command,
                available,
                context,
            } => json!({ "command": command, "available": available, "context": context }),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.notiond/prompts/`)
    user_dir: Option<PathBuf>,
    /// Repo default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `root`
    ///
    /// Looks for `.notiond/prompts/` and `prompts/` under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        debug!(?root, "PromptLoader::new: called");
        let user_dir = root.join(".notiond/prompts");
        let repo_dir = root.join("prompts");

        let user_dir_exists = user_dir.is_dir();
        let repo_dir_exists = repo_dir.is_dir();
        debug!(
            ?user_dir,
            %user_dir_exists,
            ?repo_dir,
            %repo_dir_exists,
            "PromptLoader::new: checking directories"
        );

        Self {
            hbs: Self::engine(),
            user_dir: user_dir_exists.then_some(user_dir),
            repo_dir: repo_dir_exists.then_some(repo_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.notiond/prompts/{name}.pmt`
    /// 2. Repo default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for (label, dir) in [("user override", &self.user_dir), ("repo", &self.repo_dir)] {
            let Some(dir) = dir else {
                continue;
            };
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, %label, "PromptLoader::load_template: found on disk");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read {} prompt {}: {}", label, path.display(), e));
            }
            debug!(?path, %label, "PromptLoader::load_template: not found");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a prompt
    pub fn render(&self, prompt: &Prompt<'_>) -> Result<String> {
        let name = prompt.template_name();
        debug!(%name, "PromptLoader::render: called");
        let template = self.load_template(name)?;
        info!("Rendering template '{}'", name);

        self.hbs
            .render_template(&template, &prompt.context())
            .map(|s| s.trim_end().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }
}
