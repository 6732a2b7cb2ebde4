//! Configuration management for liftrag.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.liftrag/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. The workspace holds all local state under `.liftrag/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Default AWS region for both Bedrock endpoints.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default foundation model used for generation and entity extraction.
pub const DEFAULT_MODEL_ARN: &str =
    "arn:aws:bedrock:us-east-1::foundation-model/amazon.nova-pro-v1:0";

/// Environment variable holding the Bedrock API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Prompt definition used when none is configured.
pub const DEFAULT_PROMPT_ID: &str = "kb.answer.default";

/// Elevator models the knowledge base holds documents for.
pub const DEFAULT_ALLOWED_VALUES: [&str; 3] =
    ["Elevador PVE 30", "Elevador PVE 37", "Elevador PVE 52"];

/// Attempts for idempotent Bedrock calls.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upper bound Bedrock accepts for `numberOfResults`.
pub const MAX_TOP_K: u32 = 100;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .liftrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Bedrock connection settings
    pub bedrock: BedrockSettings,

    /// Retrieval and generation settings
    pub retrieval: RetrievalSettings,

    /// Metadata filter settings
    pub filter: FilterSettings,

    /// Chat surface settings
    pub chat: ChatSettings,

    /// API key passed explicitly (LIFTRAG_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Bedrock endpoints, identifiers and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockSettings {
    pub region: String,

    /// Knowledge base to retrieve from (required)
    pub knowledge_base_id: Option<String>,

    /// Model ARN used by retrieve-and-generate
    pub model_arn: String,

    /// Model id (or ARN) used by the entity-extraction converse call
    pub extraction_model_id: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Override for the bedrock-runtime base URL
    pub runtime_endpoint: Option<String>,

    /// Override for the bedrock-agent-runtime base URL
    pub agent_runtime_endpoint: Option<String>,

    /// Deadline for each external call, in seconds, retries included
    pub timeout_secs: u64,

    /// Attempts for converse calls (retrieve-and-generate is sent once)
    pub max_attempts: u32,
}

impl Default for BedrockSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            knowledge_base_id: None,
            model_arn: DEFAULT_MODEL_ARN.to_string(),
            extraction_model_id: DEFAULT_MODEL_ARN.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            runtime_endpoint: None,
            agent_runtime_endpoint: None,
            timeout_secs: 60,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl BedrockSettings {
    /// Base URL of the runtime service (converse).
    pub fn runtime_url(&self) -> String {
        self.runtime_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region))
    }

    /// Base URL of the agent runtime service (retrieve-and-generate).
    pub fn agent_runtime_url(&self) -> String {
        self.agent_runtime_endpoint.clone().unwrap_or_else(|| {
            format!("https://bedrock-agent-runtime.{}.amazonaws.com", self.region)
        })
    }

    /// Deadline for a whole external call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn has_custom_endpoints(&self) -> bool {
        self.runtime_endpoint.is_some() && self.agent_runtime_endpoint.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Number of chunks the vector search returns
    pub top_k: u32,

    /// Prompt definition id rendered into the generation template
    pub prompt_id: String,

    /// Send a custom prompt template (false uses the service default)
    pub use_prompt_template: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 6,
            prompt_id: DEFAULT_PROMPT_ID.to_string(),
            use_prompt_template: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Reject filters whose value is not a known elevator model
    pub strict: bool,

    /// Known elevator models
    pub allowed_values: Vec<String>,

    /// Ingested corpus whose metadata values extend the allow-list
    pub corpus: Option<PathBuf>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            strict: true,
            allowed_values: DEFAULT_ALLOWED_VALUES.iter().map(|v| v.to_string()).collect(),
            corpus: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Delay between streamed words, in milliseconds (0 disables pacing)
    pub pacing_ms: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { pacing_ms: 50 }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    bedrock: Option<BedrockSection>,
    retrieval: Option<RetrievalSection>,
    filter: Option<FilterSection>,
    chat: Option<ChatSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BedrockSection {
    region: Option<String>,
    knowledge_base_id: Option<String>,
    model_arn: Option<String>,
    extraction_model_id: Option<String>,
    api_key_env: Option<String>,
    runtime_endpoint: Option<String>,
    agent_runtime_endpoint: Option<String>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalSection {
    top_k: Option<u32>,
    prompt_id: Option<String>,
    use_prompt_template: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterSection {
    strict: Option<bool>,
    allowed_values: Option<Vec<String>>,
    corpus: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatSection {
    pacing_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            bedrock: BedrockSettings::default(),
            retrieval: RetrievalSettings::default(),
            filter: FilterSettings::default(),
            chat: ChatSettings::default(),
            api_key: None,
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default locations.
    ///
    /// Environment variables:
    /// - `LIFTRAG_WORKSPACE`: Override workspace path
    /// - `LIFTRAG_CONFIG`: Path to config file
    /// - `LIFTRAG_REGION`: AWS region
    /// - `LIFTRAG_KNOWLEDGE_BASE_ID`: Knowledge base identifier
    /// - `LIFTRAG_MODEL_ARN`: Generation model ARN
    /// - `LIFTRAG_API_KEY`: API key (otherwise read from `bedrock.apiKeyEnv`)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use liftrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let workspace = std::env::var("LIFTRAG_WORKSPACE").ok().map(PathBuf::from);
        let config_file = std::env::var("LIFTRAG_CONFIG").ok().map(PathBuf::from);
        Self::load_from(workspace, config_file)
    }

    /// Load configuration for an explicit workspace and config file.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.config_path(),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(region) = std::env::var("LIFTRAG_REGION") {
            config.bedrock.region = region;
        }

        if let Ok(kb_id) = std::env::var("LIFTRAG_KNOWLEDGE_BASE_ID") {
            config.bedrock.knowledge_base_id = Some(kb_id);
        }

        if let Ok(model_arn) = std::env::var("LIFTRAG_MODEL_ARN") {
            config.bedrock.model_arn = model_arn;
        }

        config.api_key = std::env::var("LIFTRAG_API_KEY").ok();

        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);

        self.merge(config_file)
    }

    fn merge(&self, file: ConfigFile) -> AppResult<Self> {
        let mut result = self.clone();

        if let Some(path) = file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(b) = file.bedrock {
            if let Some(region) = b.region {
                result.bedrock.region = region;
            }
            if b.knowledge_base_id.is_some() {
                result.bedrock.knowledge_base_id = b.knowledge_base_id;
            }
            if let Some(model_arn) = b.model_arn {
                result.bedrock.model_arn = model_arn;
            }
            if let Some(model_id) = b.extraction_model_id {
                result.bedrock.extraction_model_id = model_id;
            }
            if let Some(env) = b.api_key_env {
                result.bedrock.api_key_env = env;
            }
            if b.runtime_endpoint.is_some() {
                result.bedrock.runtime_endpoint = b.runtime_endpoint;
            }
            if b.agent_runtime_endpoint.is_some() {
                result.bedrock.agent_runtime_endpoint = b.agent_runtime_endpoint;
            }
            if let Some(timeout) = b.timeout_secs {
                result.bedrock.timeout_secs = timeout;
            }
            if let Some(attempts) = b.max_attempts {
                result.bedrock.max_attempts = attempts;
            }
        }

        if let Some(r) = file.retrieval {
            if let Some(top_k) = r.top_k {
                result.retrieval.top_k = top_k;
            }
            if let Some(prompt_id) = r.prompt_id {
                result.retrieval.prompt_id = prompt_id;
            }
            if let Some(use_template) = r.use_prompt_template {
                result.retrieval.use_prompt_template = use_template;
            }
        }

        if let Some(f) = file.filter {
            if let Some(strict) = f.strict {
                result.filter.strict = strict;
            }
            if let Some(values) = f.allowed_values {
                result.filter.allowed_values = values;
            }
            if let Some(corpus) = f.corpus {
                // Relative corpus paths are resolved against the workspace
                let corpus = PathBuf::from(corpus);
                result.filter.corpus = Some(if corpus.is_relative() {
                    result.workspace.join(corpus)
                } else {
                    corpus
                });
            }
        }

        if let Some(pacing) = file.chat.and_then(|c| c.pacing_ms) {
            result.chat.pacing_ms = pacing;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = LogFormat::parse(&format).ok_or_else(|| {
                    AppError::Config(format!(
                        "Unknown logging.format '{}'. Expected pretty or json",
                        format
                    ))
                })?;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the config file and environment.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        region: Option<String>,
        knowledge_base_id: Option<String>,
        model_arn: Option<String>,
        log_level: Option<String>,
        log_json: bool,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(region) = region {
            self.bedrock.region = region;
        }

        if let Some(kb_id) = knowledge_base_id {
            self.bedrock.knowledge_base_id = Some(kb_id);
        }

        if let Some(model_arn) = model_arn {
            self.bedrock.model_arn = model_arn;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if log_json {
            self.log_format = LogFormat::Json;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .liftrag directory.
    pub fn liftrag_dir(&self) -> PathBuf {
        self.workspace.join(".liftrag")
    }

    /// Default location of the YAML config file.
    pub fn config_path(&self) -> PathBuf {
        self.liftrag_dir().join("config.yaml")
    }

    /// Ensure the .liftrag directory exists.
    pub fn ensure_liftrag_dir(&self) -> AppResult<()> {
        let dir = self.liftrag_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .liftrag directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// The configured knowledge base id, or a configuration error.
    pub fn knowledge_base_id(&self) -> AppResult<&str> {
        self.bedrock
            .knowledge_base_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "No knowledge base configured. Set bedrock.knowledgeBaseId or LIFTRAG_KNOWLEDGE_BASE_ID"
                        .to_string(),
                )
            })
    }

    /// Resolve the API key: explicit key first, then the configured env variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        std::env::var(&self.bedrock.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    /// Validate configuration before any external call is made.
    pub fn validate(&self) -> AppResult<()> {
        self.knowledge_base_id()?;

        if self.retrieval.top_k == 0 || self.retrieval.top_k > MAX_TOP_K {
            return Err(AppError::Config(format!(
                "retrieval.topK must be between 1 and {}, got {}",
                MAX_TOP_K, self.retrieval.top_k
            )));
        }

        if self.bedrock.max_attempts == 0 {
            return Err(AppError::Config(
                "bedrock.maxAttempts must be at least 1".to_string(),
            ));
        }

        if self.bedrock.timeout_secs == 0 {
            return Err(AppError::Config(
                "bedrock.timeoutSecs must be greater than zero".to_string(),
            ));
        }

        if self.filter.strict && self.filter.allowed_values.is_empty() && self.filter.corpus.is_none()
        {
            return Err(AppError::Config(
                "Strict filtering needs filter.allowedValues or filter.corpus".to_string(),
            ));
        }

        // Custom endpoints (gateways, local stubs) may authenticate on their own
        if self.resolve_api_key().is_none() && !self.bedrock.has_custom_endpoints() {
            return Err(AppError::Config(format!(
                "API key not found. Set LIFTRAG_API_KEY or {}",
                self.bedrock.api_key_env
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.bedrock.knowledge_base_id = Some("KB123".to_string());
        config.api_key = Some("test-key".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bedrock.region, "us-east-1");
        assert_eq!(config.bedrock.model_arn, DEFAULT_MODEL_ARN);
        assert_eq!(config.retrieval.top_k, 6);
        assert!(config.filter.strict);
        assert_eq!(config.filter.allowed_values.len(), 3);
        assert_eq!(config.chat.pacing_ms, 50);
        assert!(!config.verbose);
    }

    #[test]
    fn test_endpoint_urls() {
        let mut settings = BedrockSettings::default();
        settings.region = "eu-west-1".to_string();
        assert_eq!(
            settings.runtime_url(),
            "https://bedrock-runtime.eu-west-1.amazonaws.com"
        );
        assert_eq!(
            settings.agent_runtime_url(),
            "https://bedrock-agent-runtime.eu-west-1.amazonaws.com"
        );

        settings.runtime_endpoint = Some("http://localhost:9000".to_string());
        assert_eq!(settings.runtime_url(), "http://localhost:9000");
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
bedrock:
  region: eu-central-1
  knowledgeBaseId: DJ31JD5YCZ
  timeoutSecs: 15
  maxAttempts: 5
retrieval:
  topK: 4
filter:
  strict: false
  corpus: info.json
chat:
  pacingMs: 0
logging:
  level: debug
  color: false
  format: json
"#,
        )
        .unwrap();

        let mut base = AppConfig::default();
        base.workspace = temp.path().to_path_buf();
        let config = base.merge_yaml(&path).unwrap();

        assert_eq!(config.bedrock.region, "eu-central-1");
        assert_eq!(config.bedrock.knowledge_base_id.as_deref(), Some("DJ31JD5YCZ"));
        assert_eq!(config.bedrock.timeout_secs, 15);
        assert_eq!(config.bedrock.max_attempts, 5);
        assert_eq!(config.retrieval.top_k, 4);
        assert!(!config.filter.strict);
        assert_eq!(config.filter.corpus, Some(temp.path().join("info.json")));
        assert_eq!(config.chat.pacing_ms, 0);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.no_color);
        assert_eq!(config.log_format, LogFormat::Json);
        // Untouched sections keep their defaults
        assert_eq!(config.bedrock.model_arn, DEFAULT_MODEL_ARN);
    }

    #[test]
    fn test_merge_unknown_log_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "logging:\n  format: xml\n").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("xml")));
    }

    #[test]
    fn test_validate_max_attempts() {
        let mut config = configured();
        assert_eq!(config.bedrock.timeout(), Duration::from_secs(60));
        config.bedrock.max_attempts = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(msg)) if msg.contains("maxAttempts")));
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "bedrock: [unclosed").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_from_missing_explicit_config() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_from(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("us-west-2".to_string()),
            Some("KB999".to_string()),
            None,
            None,
            true,
            true,
            false,
        );

        assert_eq!(config.bedrock.region, "us-west-2");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bedrock.knowledge_base_id.as_deref(), Some("KB999"));
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_requires_knowledge_base() {
        let mut config = configured();
        config.bedrock.knowledge_base_id = None;
        assert!(config.validate().is_err());

        config.bedrock.knowledge_base_id = Some("   ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_top_k_bounds() {
        let mut config = configured();
        assert!(config.validate().is_ok());

        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        config.retrieval.top_k = MAX_TOP_K + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_strict_needs_allow_list() {
        let mut config = configured();
        config.filter.allowed_values.clear();
        assert!(config.validate().is_err());

        config.filter.corpus = Some(PathBuf::from("info.json"));
        assert!(config.validate().is_ok());

        config.filter.corpus = None;
        config.filter.strict = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_custom_endpoints_without_key() {
        let mut config = configured();
        config.api_key = None;
        config.bedrock.api_key_env = "LIFTRAG_TEST_UNSET_KEY_VAR".to_string();
        assert!(config.validate().is_err());

        config.bedrock.runtime_endpoint = Some("http://localhost:9000".to_string());
        config.bedrock.agent_runtime_endpoint = Some("http://localhost:9001".to_string());
        assert!(config.validate().is_ok());
    }
}
