//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub reddit: RedditConfig,

    #[serde(default)]
    pub x: XConfig,

    #[serde(default)]
    pub linkedin: LinkedinConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_ledger_db_path")]
    pub ledger_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dry_run: bool,

    /// Keywords driving both source fetchers; the KEYWORDS env var
    /// (comma-separated) overrides this list
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "default_max_candidate_items")]
    pub max_candidate_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default = "default_reddit_client_id_env")]
    pub client_id_env: String,

    #[serde(default = "default_reddit_client_secret_env")]
    pub client_secret_env: String,

    #[serde(default = "default_reddit_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,

    #[serde(default = "default_limit_per_subreddit")]
    pub limit_per_subreddit: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XConfig {
    #[serde(default)]
    pub read: XReadConfig,

    #[serde(default)]
    pub write: XWriteConfig,

    #[serde(default)]
    pub oauth2: XOAuth2Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XReadConfig {
    #[serde(default = "default_x_bearer_token_env")]
    pub bearer_token_env: String,

    #[serde(default = "default_x_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XWriteConfig {
    #[serde(default = "default_x_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_x_api_secret_env")]
    pub api_secret_env: String,

    #[serde(default = "default_x_access_token_env")]
    pub access_token_env: String,

    #[serde(default = "default_x_access_token_secret_env")]
    pub access_token_secret_env: String,

    #[serde(default = "default_x_oauth2_access_token_env")]
    pub oauth2_access_token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XOAuth2Config {
    #[serde(default = "default_x_client_id_env")]
    pub client_id_env: String,

    #[serde(default = "default_x_client_secret_env")]
    pub client_secret_env: String,

    #[serde(default = "default_x_redirect_uri")]
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedinConfig {
    #[serde(default = "default_linkedin_access_token_env")]
    pub access_token_env: String,

    #[serde(default = "default_linkedin_id_token_env")]
    pub id_token_env: String,

    #[serde(default = "default_linkedin_author_urn_env")]
    pub author_urn_env: String,

    #[serde(default = "default_linkedin_visibility")]
    pub visibility: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// auto, openai, gemini, or stub. Auto prefers Gemini when its key is
    /// set, then OpenAI.
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum pending records retried per platform per invocation
    #[serde(default = "default_pending_limit")]
    pub pending_limit: usize,
}

// Default value functions
fn default_ledger_db_path() -> PathBuf {
    PathBuf::from("./ledger.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_candidate_items() -> usize {
    10
}

fn default_keywords() -> Vec<String> {
    [
        "tech",
        "software engineering",
        "programming",
        "systems design",
        "backend",
        "api",
        "microservices",
        "cloud",
        "aws",
        "kubernetes",
        "docker",
        "devops",
        "observability",
        "security",
        "data engineering",
        "machine learning",
        "artificial intelligence",
        "ai",
        "ai agents",
        "genai",
        "llm",
        "openai",
        "rag",
        "postgres",
        "python",
        "typescript",
        "rust",
        "golang",
        "nvidia",
        "microsoft",
        "google",
        "anthropic",
        "hugging face",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_reddit_client_id_env() -> String {
    "REDDIT_CLIENT_ID".to_string()
}

fn default_reddit_client_secret_env() -> String {
    "REDDIT_CLIENT_SECRET".to_string()
}

fn default_reddit_user_agent() -> String {
    "autoposter/1.0".to_string()
}

fn default_subreddits() -> Vec<String> {
    [
        "technology",
        "MachineLearning",
        "OpenAI",
        "programming",
        "Futurology",
        "ArtificialIntelligence",
        "dataengineering",
        "devops",
        "docker",
        "kubernetes",
        "aws",
        "azure",
        "googlecloud",
        "golang",
        "rust",
        "python",
        "javascript",
        "typescript",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_limit_per_subreddit() -> u32 {
    20
}

fn default_x_bearer_token_env() -> String {
    "X_BEARER_TOKEN".to_string()
}

fn default_x_max_results() -> u32 {
    10
}

fn default_x_api_key_env() -> String {
    "X_API_KEY".to_string()
}

fn default_x_api_secret_env() -> String {
    "X_API_SECRET".to_string()
}

fn default_x_access_token_env() -> String {
    "X_ACCESS_TOKEN".to_string()
}

fn default_x_access_token_secret_env() -> String {
    "X_ACCESS_TOKEN_SECRET".to_string()
}

fn default_x_oauth2_access_token_env() -> String {
    "X_OAUTH2_ACCESS_TOKEN".to_string()
}

fn default_x_client_id_env() -> String {
    "X_CLIENT_ID".to_string()
}

fn default_x_client_secret_env() -> String {
    "X_CLIENT_SECRET".to_string()
}

fn default_x_redirect_uri() -> String {
    "http://localhost:8080/callback".to_string()
}

fn default_linkedin_access_token_env() -> String {
    "LINKEDIN_ACCESS_TOKEN".to_string()
}

fn default_linkedin_id_token_env() -> String {
    "LINKEDIN_ID_TOKEN".to_string()
}

fn default_linkedin_author_urn_env() -> String {
    "LINKEDIN_PERSON_URN".to_string()
}

fn default_linkedin_visibility() -> String {
    "PUBLIC".to_string()
}

fn default_provider() -> String {
    "auto".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.4
}

fn default_timeout() -> u64 {
    45
}

fn default_max_output_tokens() -> u32 {
    700
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_gemini_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_pending_limit() -> usize {
    10
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ledger_db_path: default_ledger_db_path(),
            log_level: default_log_level(),
            dry_run: false,
            keywords: default_keywords(),
            max_candidate_items: default_max_candidate_items(),
        }
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id_env: default_reddit_client_id_env(),
            client_secret_env: default_reddit_client_secret_env(),
            user_agent: default_reddit_user_agent(),
            subreddits: default_subreddits(),
            limit_per_subreddit: default_limit_per_subreddit(),
        }
    }
}

impl Default for XReadConfig {
    fn default() -> Self {
        Self {
            bearer_token_env: default_x_bearer_token_env(),
            max_results: default_x_max_results(),
        }
    }
}

impl Default for XWriteConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_x_api_key_env(),
            api_secret_env: default_x_api_secret_env(),
            access_token_env: default_x_access_token_env(),
            access_token_secret_env: default_x_access_token_secret_env(),
            oauth2_access_token_env: default_x_oauth2_access_token_env(),
        }
    }
}

impl Default for XOAuth2Config {
    fn default() -> Self {
        Self {
            client_id_env: default_x_client_id_env(),
            client_secret_env: default_x_client_secret_env(),
            redirect_uri: default_x_redirect_uri(),
        }
    }
}

impl Default for LinkedinConfig {
    fn default() -> Self {
        Self {
            access_token_env: default_linkedin_access_token_env(),
            id_token_env: default_linkedin_id_token_env(),
            author_urn_env: default_linkedin_author_urn_env(),
            visibility: default_linkedin_visibility(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_api_key_env(),
            base_url: default_openai_base_url(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_gemini_api_key_env(),
            model: default_gemini_model(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            max_output_tokens: default_max_output_tokens(),
            openai: OpenAiConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            pending_limit: default_pending_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("AUTOPOSTER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Comma-separated KEYWORDS env var replaces the configured list
        if let Ok(keywords) = std::env::var("KEYWORDS") {
            let parsed: Vec<String> = keywords
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.general.keywords = parsed;
            }
        }

        Ok(config)
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# autoposter configuration

[general]
ledger_db_path = "./ledger.sqlite"
log_level = "info"
dry_run = false
max_candidate_items = 10
# keywords = ["ai", "rust", "devops"]  # or set the KEYWORDS env var

[reddit]
client_id_env = "REDDIT_CLIENT_ID"
client_secret_env = "REDDIT_CLIENT_SECRET"
user_agent = "autoposter/1.0"
limit_per_subreddit = 20
# subreddits = ["technology", "programming"]

[x.read]
bearer_token_env = "X_BEARER_TOKEN"
max_results = 10

[x.write]
# OAuth 1.0a credential set, preferred for posting
api_key_env = "X_API_KEY"
api_secret_env = "X_API_SECRET"
access_token_env = "X_ACCESS_TOKEN"
access_token_secret_env = "X_ACCESS_TOKEN_SECRET"
# OAuth 2.0 user token fallback (see `autoposter auth x-url`)
oauth2_access_token_env = "X_OAUTH2_ACCESS_TOKEN"

[x.oauth2]
client_id_env = "X_CLIENT_ID"
client_secret_env = "X_CLIENT_SECRET"
redirect_uri = "http://localhost:8080/callback"

[linkedin]
access_token_env = "LINKEDIN_ACCESS_TOKEN"
id_token_env = "LINKEDIN_ID_TOKEN"
author_urn_env = "LINKEDIN_PERSON_URN"
visibility = "PUBLIC"  # PUBLIC or CONNECTIONS

[llm]
provider = "auto"  # auto, openai, gemini, stub
model = "gpt-4o-mini"
temperature = 0.4
timeout_secs = 45
max_output_tokens = 700

[llm.openai]
api_key_env = "OPENAI_API_KEY"
base_url = "https://api.openai.com/v1"

[llm.gemini]
api_key_env = "GEMINI_API_KEY"
model = "gemini-1.5-flash"

[retry]
pending_limit = 10
"#
        .to_string()
    }
}
