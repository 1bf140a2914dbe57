//! notiond configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main notiond configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Workspace API settings
    pub notion: NotionConfig,

    /// Text generation settings
    pub gemini: GeminiConfig,

    /// Write-back chunking
    pub chunking: ChunkingConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// The generation key is required up front. The workspace token can arrive
    /// per request, so its absence only warns.
    pub fn validate(&self) -> Result<()> {
        debug!("validate: called");
        if std::env::var(&self.gemini.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Gemini API key not found. Set the {} environment variable.",
                self.gemini.api_key_env
            ));
        }
        if self.notion.token().is_none() {
            tracing::warn!(
                "{} is not set; requests must carry an Authorization: Bearer token",
                self.notion.token_env
            );
        }
        if self.chunking.max_length == 0 {
            return Err(eyre::eyre!("chunking.max-length must be greater than zero"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .notiond.yml
        let local_config = PathBuf::from(".notiond.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/notiond/notiond.yml
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Walks the same fallback chain as [`Config::load`] but never fails.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".notiond.yml")];
                paths.extend(Self::user_config_path());
                paths
            }
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("notiond").join("notiond.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// CORS origins; empty allows any origin
    #[serde(rename = "allowed-origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: Vec::new(),
        }
    }
}

/// Workspace API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Value sent in the Notion-Version header
    #[serde(rename = "api-version")]
    pub api_version: String,

    /// Environment variable holding the default integration token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl NotionConfig {
    /// Default token from the environment, if set and non-empty
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.trim().is_empty())
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.notion.com".to_string(),
            api_version: "2022-06-28".to_string(),
            token_env: "NOTION_API_KEY".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Model identifier
    pub model: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Maximum tokens per response
    #[serde(rename = "max-output-tokens")]
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    /// Get the API key from the environment
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("Gemini API key not found. Set the {} environment variable.", self.api_key_env))
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_ms: 60_000,
            max_output_tokens: 2048,
        }
    }
}

/// Write-back chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum characters per written paragraph
    #[serde(rename = "max-length")]
    pub max_length: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_length: pagetext::DEFAULT_MAX_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.allowed_origins.is_empty());
        assert_eq!(config.notion.api_version, "2022-06-28");
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.chunking.max_length, 1800);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
server:
  host: 127.0.0.1
  port: 8080
  allowed-origins:
    - https://www.notion.so

notion:
  base-url: http://localhost:9000
  token-env: MY_NOTION_TOKEN
  timeout-ms: 5000

gemini:
  model: gemini-1.5-pro
  api-key-env: MY_GEMINI_KEY
  max-output-tokens: 512

chunking:
  max-length: 900

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origins, vec!["https://www.notion.so"]);
        assert_eq!(config.notion.base_url, "http://localhost:9000");
        assert_eq!(config.notion.token_env, "MY_NOTION_TOKEN");
        assert_eq!(config.notion.timeout_ms, 5000);
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.api_key_env, "MY_GEMINI_KEY");
        assert_eq!(config.gemini.max_output_tokens, 512);
        assert_eq!(config.chunking.max_length, 900);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
gemini:
  model: gemini-2.0-flash
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.notion.base_url, "https://api.notion.com");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 4100\nlog-level: trace").unwrap();
        let path = file.path().to_path_buf();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("trace"));
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let path = PathBuf::from("/definitely/not/here/notiond.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    #[serial]
    fn test_validate_requires_gemini_key() {
        let mut config = Config::default();
        config.gemini.api_key_env = "NOTIOND_TEST_GEMINI_KEY".to_string();

        // SAFETY: serialized test, no other thread reads this variable
        unsafe { std::env::remove_var("NOTIOND_TEST_GEMINI_KEY") };
        assert!(config.validate().is_err());

        unsafe { std::env::set_var("NOTIOND_TEST_GEMINI_KEY", "k") };
        assert!(config.validate().is_ok());
        unsafe { std::env::remove_var("NOTIOND_TEST_GEMINI_KEY") };
    }

    #[test]
    #[serial]
    fn test_notion_token_ignores_blank() {
        let config = NotionConfig {
            token_env: "NOTIOND_TEST_NOTION_TOKEN".to_string(),
            ..Default::default()
        };

        unsafe { std::env::set_var("NOTIOND_TEST_NOTION_TOKEN", "  ") };
        assert!(config.token().is_none());

        unsafe { std::env::set_var("NOTIOND_TEST_NOTION_TOKEN", "secret_abc") };
        assert_eq!(config.token().as_deref(), Some("secret_abc"));
        unsafe { std::env::remove_var("NOTIOND_TEST_NOTION_TOKEN") };
    }
}
