use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend: {other}")),
        }
    }
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            url: String::new(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub country: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            api_key: None,
            country: "us".to_string(),
            page_size: 10,
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: crate::fetcher::BROWSER_USER_AGENT.to_string(),
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerProvider {
    Lead,
    Ollama,
}

impl SummarizerProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummarizerProvider::Lead => "lead",
            SummarizerProvider::Ollama => "ollama",
        }
    }
}

impl std::str::FromStr for SummarizerProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lead" => Ok(SummarizerProvider::Lead),
            "ollama" => Ok(SummarizerProvider::Ollama),
            other => Err(anyhow!("unknown summarizer provider: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub provider: SummarizerProvider,
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: SummarizerProvider::Lead,
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "llama3.2".to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 300,
            refresh_ttl_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/news_digest.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub news_api: NewsApiConfig,
    pub scraper: ScraperConfig,
    pub summarizer: SummarizerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let explicit_path = std::env::var("CONFIG_FILE").ok();
        let config = if let Some(path) = explicit_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(anyhow!("config file {:?} not found", path));
            }
            Self::load_from_file(&path)?
        } else {
            let path = locate_default_config();
            if let Some(path) = path {
                Self::load_from_file(&path)?
            } else {
                AppConfig::default()
            }
        };

        Self::apply_env_overrides(config)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::parse_yaml(&contents).with_context(|| format!("failed to parse config file {:?}", path))
    }

    fn parse_yaml(contents: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    fn apply_env_overrides(mut config: AppConfig) -> anyhow::Result<AppConfig> {
        if let Ok(bind) = std::env::var("SERVER_BIND") {
            config.server.bind = bind;
        }

        if let Some(backend) = parse_optional_env::<StorageBackend>("STORAGE_BACKEND")? {
            config.db.backend = backend;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.db.url = url;
        }

        if let Some(max_conn) = parse_optional_env("DB_MAX_CONNECTIONS")? {
            config.db.max_connections = max_conn;
        }

        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            config.news_api.api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("NEWS_API_BASE_URL") {
            config.news_api.base_url = base_url;
        }

        if let Some(page_size) = parse_optional_env("NEWS_API_PAGE_SIZE")? {
            config.news_api.page_size = page_size;
        }

        if let Some(timeout) = parse_optional_env("SCRAPER_TIMEOUT_SECS")? {
            config.scraper.request_timeout_secs = timeout;
        }

        if let Some(provider) = parse_optional_env::<SummarizerProvider>("SUMMARIZER_PROVIDER")? {
            config.summarizer.provider = provider;
        }

        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            config.summarizer.base_url = base_url;
        }

        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            config.summarizer.model = model;
        }

        if let Some(ttl) = parse_optional_env("ACCESS_TOKEN_TTL_SECS")? {
            config.auth.access_ttl_secs = ttl;
        }

        if let Some(ttl) = parse_optional_env("REFRESH_TOKEN_TTL_SECS")? {
            config.auth.refresh_ttl_secs = ttl;
        }

        if let Ok(log_file) = std::env::var("LOG_FILE_PATH") {
            config.logging.file = log_file;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.logging.level = Some(log_level);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.db.backend == StorageBackend::Postgres && self.db.url.trim().is_empty() {
            return Err(anyhow!(
                "database url missing; set DATABASE_URL env var or db.url in config file"
            ));
        }

        Ok(())
    }
}

fn parse_optional_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: Into<anyhow::Error>,
{
    match std::env::var(key) {
        Ok(v) => {
            let parsed = v
                .parse::<T>()
                .map_err(|err| -> anyhow::Error { err.into() })
                .with_context(|| format!("{key} must be a valid value"))?;
            Ok(Some(parsed))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn locate_default_config() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/config.yaml"),
        PathBuf::from("../config/config.yaml"),
    ];

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = AppConfig::parse_yaml("{}").unwrap();
        assert_eq!(config.db.backend, StorageBackend::Postgres);
        assert_eq!(config.scraper.request_timeout_secs, 15);
        assert_eq!(config.summarizer.provider, SummarizerProvider::Lead);
        assert_eq!(config.auth.access_ttl_secs, 300);
    }

    #[test]
    fn yaml_sections_override_defaults() {
        let yaml = r#"
db:
  backend: memory
news_api:
  api_key: abc
  page_size: 5
summarizer:
  provider: ollama
  model: mistral
"#;
        let config = AppConfig::parse_yaml(yaml).unwrap();
        assert_eq!(config.db.backend, StorageBackend::Memory);
        assert_eq!(config.news_api.api_key.as_deref(), Some("abc"));
        assert_eq!(config.news_api.page_size, 5);
        assert_eq!(config.news_api.country, "us");
        assert_eq!(config.summarizer.provider, SummarizerProvider::Ollama);
        assert_eq!(config.summarizer.model, "mistral");
    }

    #[test]
    fn postgres_backend_requires_url() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut memory = AppConfig::default();
        memory.db.backend = StorageBackend::Memory;
        assert!(memory.validate().is_ok());
    }

    #[test]
    fn backend_and_provider_parse_from_strings() {
        assert_eq!("Memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("pg".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!("sqlite".parse::<StorageBackend>().is_err());
        assert_eq!(
            "OLLAMA".parse::<SummarizerProvider>().unwrap(),
            SummarizerProvider::Ollama
        );
    }
}
