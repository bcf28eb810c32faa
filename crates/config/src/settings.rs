//! Runtime settings
//!
//! Priority: env vars (`REALTY_*`) > `config/{env}.yaml` > `config/default.yaml`
//! > built-in defaults. API keys are additionally read from the plain
//! `OPENAI_API_KEY` / `ESTATY_API_KEY` variables when not set elsewhere.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub tools: ToolsSettings,
    /// Path to the code-mapping tables asset.
    #[serde(default = "default_tables_path")]
    pub tables_path: String,
}

/// External collaborator settings (web search)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsSettings {
    /// Search endpoint (SearX-style `?q=` API). `None` disables web search;
    /// market/buying-guide answers then come from the model alone.
    #[serde(default)]
    pub search_url: Option<String>,
    #[serde(default = "default_tools_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tools_timeout_secs() -> u64 {
    10
}

impl Default for ToolsSettings {
    fn default() -> Self {
        Self {
            search_url: None,
            timeout_secs: default_tools_timeout_secs(),
        }
    }
}

impl ToolsSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_tables_path() -> String {
    "config/tables.yaml".to_string()
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// LLM backend settings (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_llm_max_tokens() -> usize {
    800
}

fn default_llm_temperature() -> f32 {
    0.7
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: String::new(),
            timeout_secs: default_llm_timeout_secs(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Property gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gateway_base_url() -> String {
    "https://panel.estaty.app/api/v1".to_string()
}

fn default_gateway_timeout_secs() -> u64 {
    20
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_gateway_base_url(),
            api_key: String::new(),
            timeout_secs: default_gateway_timeout_secs(),
        }
    }
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Full-catalog cache refresher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Interval between full refreshes. Default: once per day.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Page size used when paginating the full catalog fetch.
    #[serde(default = "default_catalog_page_size")]
    pub page_size: usize,
}

fn default_refresh_interval_secs() -> u64 {
    86_400
}

fn default_catalog_page_size() -> usize {
    100
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            page_size: default_catalog_page_size(),
        }
    }
}

impl CatalogSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Conversational search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Listings shown per page of results.
    #[serde(default = "default_search_page_size")]
    pub page_size: usize,
    /// Minimum similarity ratio for fuzzy code-table matches.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// How many districts the district-suggestion flow returns.
    #[serde(default = "default_district_suggestions")]
    pub district_suggestions: usize,
}

fn default_search_page_size() -> usize {
    3
}

fn default_fuzzy_threshold() -> f64 {
    0.70
}

fn default_district_suggestions() -> usize {
    5
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: default_search_page_size(),
            fuzzy_threshold: default_fuzzy_threshold(),
            district_suggestions: default_district_suggestions(),
        }
    }
}

/// Session store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Sessions idle longer than this are evicted.
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_session_ttl_secs() -> u64 {
    1_800
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.search.fuzzy_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "search.fuzzy_threshold".to_string(),
                message: format!(
                    "Must be between 0.0 and 1.0, got {}",
                    self.search.fuzzy_threshold
                ),
            });
        }
        if self.search.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.page_size".to_string(),
                message: "Page size must be at least 1".to_string(),
            });
        }
        if self.catalog.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "catalog.page_size".to_string(),
                message: "Catalog page size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from files and the environment.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder().add_source(File::with_name("config/default").required(false));

    if let Some(env) = env {
        builder = builder.add_source(File::with_name(&format!("config/{env}")).required(false));
    }

    let config = builder
        .add_source(Environment::with_prefix("REALTY").separator("__"))
        .build()?;

    let mut settings: Settings = config.try_deserialize()?;

    // API keys fall back to the conventional env vars.
    if settings.llm.api_key.is_empty() {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            settings.llm.api_key = key;
        }
    }
    if settings.gateway.api_key.is_empty() {
        if let Ok(key) = std::env::var("ESTATY_API_KEY") {
            settings.gateway.api_key = key;
        }
    }

    settings.validate()?;
    Ok(settings)
}
