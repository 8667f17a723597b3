//! Configuration for the askgate gateway.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - An optional YAML config file
//!
//! The result is a single `GatewayConfig` constructed once at startup and
//! passed by reference into the pipeline and its clients. Request-handling
//! code never reads the environment ad hoc, which keeps the pipeline
//! testable with injected fakes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main gateway configuration.
///
/// Holds every recognized option: backend endpoints and keys, credential
/// settings, and rate-limit policy. `validate()` must pass before the
/// gateway serves traffic: a missing backend endpoint or key is a fatal
/// misconfiguration, not a per-request condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP bind settings
    pub server: ServerConfig,

    /// Search backend (retrieval index)
    pub search: SearchConfig,

    /// Azure OpenAI backend (embeddings + chat completions)
    pub openai: OpenAiConfig,

    /// Credential verification settings
    pub auth: AuthConfig,

    /// Rate limiting settings
    pub limit: LimitConfig,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Search backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Service endpoint, e.g. "https://myservice.search.windows.net"
    pub endpoint: String,

    /// Admin/query key sent in the `api-key` header
    pub api_key: String,

    /// Index to query
    pub index: String,

    /// Optional static OData filter expression applied to every query.
    /// Configured, never caller-supplied.
    pub filter: Option<String>,
}

/// Azure OpenAI backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Resource endpoint, e.g. "https://myresource.openai.azure.com"
    pub endpoint: String,

    /// Key sent in the `api-key` header
    pub api_key: String,

    /// Chat completion deployment name
    pub chat_deployment: String,

    /// Embedding deployment name
    pub embedding_deployment: String,
}

/// Credential verification settings.
///
/// Both mechanisms are optional and compose: when both are set, a request
/// must satisfy both. When neither is set the gateway accepts every caller;
/// that open mode is an explicit deployment choice and the server logs a
/// prominent warning at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Static shared secret expected in the `x-api-key` header
    pub api_key: Option<String>,

    /// Signed-token verification settings
    pub jwt: Option<JwtConfig>,
}

/// Bearer-token verification settings (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Symmetric signing secret
    pub secret: String,

    /// Expected `iss` claim; unchecked when absent
    pub issuer: Option<String>,

    /// Expected `aud` claim; unchecked when absent
    pub audience: Option<String>,
}

/// Rate limiting settings.
///
/// The strategy is a configuration-time decision: a Redis URL selects the
/// shared fixed-window counter keyed by caller identity; otherwise a local
/// continuous-refill bucket with a single global key is used. The two are
/// never combined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Token-bucket refill rate and burst cap, in requests per second
    pub rate_per_sec: f64,

    /// Fixed-window ceiling, in requests per minute per identity
    pub per_minute: u32,

    /// Shared counter store; presence selects the fixed-window strategy
    pub redis_url: Option<String>,

    /// Policy when the shared store is unreachable: admit (true) or
    /// reject (false). Default closed.
    pub fail_open: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            search: SearchConfig {
                endpoint: String::new(),
                api_key: String::new(),
                index: "etl-docs-index".to_string(),
                filter: None,
            },
            openai: OpenAiConfig {
                endpoint: String::new(),
                api_key: String::new(),
                chat_deployment: "gpt-4o-mini".to_string(),
                embedding_deployment: "text-embedding-3-small".to_string(),
            },
            auth: AuthConfig::default(),
            limit: LimitConfig {
                rate_per_sec: 2.0,
                per_minute: 120,
                redis_url: None,
                fail_open: false,
            },
        }
    }
}

/// Partial structure of the YAML config file. Every field is optional;
/// present fields override the defaults, environment variables override
/// the file.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    server: Option<ServerFileSection>,
    search: Option<SearchFileSection>,
    openai: Option<OpenAiFileSection>,
    auth: Option<AuthFileSection>,
    limit: Option<LimitFileSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerFileSection {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchFileSection {
    endpoint: Option<String>,
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
    index: Option<String>,
    filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiFileSection {
    endpoint: Option<String>,
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
    #[serde(rename = "chatDeployment")]
    chat_deployment: Option<String>,
    #[serde(rename = "embeddingDeployment")]
    embedding_deployment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AuthFileSection {
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
    #[serde(rename = "jwtSecret")]
    jwt_secret: Option<String>,
    #[serde(rename = "jwtIssuer")]
    jwt_issuer: Option<String>,
    #[serde(rename = "jwtAudience")]
    jwt_audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LimitFileSection {
    #[serde(rename = "ratePerSec")]
    rate_per_sec: Option<f64>,
    #[serde(rename = "perMinute")]
    per_minute: Option<u32>,
    #[serde(rename = "redisUrl")]
    redis_url: Option<String>,
    #[serde(rename = "failOpen")]
    fail_open: Option<bool>,
}

impl GatewayConfig {
    /// Load configuration from an optional YAML file and the environment.
    ///
    /// Environment variables (override the file):
    /// - `ASKGATE_SEARCH_ENDPOINT`, `ASKGATE_SEARCH_KEY`, `ASKGATE_SEARCH_INDEX`,
    ///   `ASKGATE_SEARCH_FILTER`
    /// - `ASKGATE_OPENAI_ENDPOINT`, `ASKGATE_OPENAI_KEY`,
    ///   `ASKGATE_CHAT_DEPLOYMENT`, `ASKGATE_EMBEDDING_DEPLOYMENT`
    /// - `ASKGATE_API_KEY`, `ASKGATE_JWT_SECRET`, `ASKGATE_JWT_ISSUER`,
    ///   `ASKGATE_JWT_AUDIENCE`
    /// - `ASKGATE_RATE_LIMIT_RPS`, `ASKGATE_RATE_LIMIT_PER_MIN`,
    ///   `ASKGATE_REDIS_URL`, `ASKGATE_RATE_LIMIT_FAIL_OPEN`
    /// - `ASKGATE_HOST`, `ASKGATE_PORT`
    pub fn load(config_file: Option<&PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_file {
            config.merge_yaml(path)?;
        }

        config.merge_env();

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(server) = file.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(search) = file.search {
            if let Some(endpoint) = search.endpoint {
                self.search.endpoint = endpoint;
            }
            if let Some(api_key) = search.api_key {
                self.search.api_key = api_key;
            }
            if let Some(index) = search.index {
                self.search.index = index;
            }
            if search.filter.is_some() {
                self.search.filter = search.filter;
            }
        }

        if let Some(openai) = file.openai {
            if let Some(endpoint) = openai.endpoint {
                self.openai.endpoint = endpoint;
            }
            if let Some(api_key) = openai.api_key {
                self.openai.api_key = api_key;
            }
            if let Some(chat) = openai.chat_deployment {
                self.openai.chat_deployment = chat;
            }
            if let Some(embedding) = openai.embedding_deployment {
                self.openai.embedding_deployment = embedding;
            }
        }

        if let Some(auth) = file.auth {
            if auth.api_key.is_some() {
                self.auth.api_key = auth.api_key;
            }
            if let Some(secret) = auth.jwt_secret {
                self.auth.jwt = Some(JwtConfig {
                    secret,
                    issuer: auth.jwt_issuer,
                    audience: auth.jwt_audience,
                });
            }
        }

        if let Some(limit) = file.limit {
            if let Some(rate) = limit.rate_per_sec {
                self.limit.rate_per_sec = rate;
            }
            if let Some(per_minute) = limit.per_minute {
                self.limit.per_minute = per_minute;
            }
            if limit.redis_url.is_some() {
                self.limit.redis_url = limit.redis_url;
            }
            if let Some(fail_open) = limit.fail_open {
                self.limit.fail_open = fail_open;
            }
        }

        Ok(())
    }

    /// Apply environment variable overrides.
    fn merge_env(&mut self) {
        if let Ok(host) = std::env::var("ASKGATE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("ASKGATE_PORT") {
            self.server.port = port;
        }

        if let Ok(endpoint) = std::env::var("ASKGATE_SEARCH_ENDPOINT") {
            self.search.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("ASKGATE_SEARCH_KEY") {
            self.search.api_key = key;
        }
        if let Ok(index) = std::env::var("ASKGATE_SEARCH_INDEX") {
            self.search.index = index;
        }
        if let Ok(filter) = std::env::var("ASKGATE_SEARCH_FILTER") {
            self.search.filter = Some(filter);
        }

        if let Ok(endpoint) = std::env::var("ASKGATE_OPENAI_ENDPOINT") {
            self.openai.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("ASKGATE_OPENAI_KEY") {
            self.openai.api_key = key;
        }
        if let Ok(chat) = std::env::var("ASKGATE_CHAT_DEPLOYMENT") {
            self.openai.chat_deployment = chat;
        }
        if let Ok(embedding) = std::env::var("ASKGATE_EMBEDDING_DEPLOYMENT") {
            self.openai.embedding_deployment = embedding;
        }

        if let Ok(key) = std::env::var("ASKGATE_API_KEY") {
            self.auth.api_key = Some(key);
        }
        if let Ok(secret) = std::env::var("ASKGATE_JWT_SECRET") {
            self.auth.jwt = Some(JwtConfig {
                secret,
                issuer: std::env::var("ASKGATE_JWT_ISSUER").ok(),
                audience: std::env::var("ASKGATE_JWT_AUDIENCE").ok(),
            });
        }

        if let Some(rate) = env_parse("ASKGATE_RATE_LIMIT_RPS") {
            self.limit.rate_per_sec = rate;
        }
        if let Some(per_minute) = env_parse("ASKGATE_RATE_LIMIT_PER_MIN") {
            self.limit.per_minute = per_minute;
        }
        if let Ok(url) = std::env::var("ASKGATE_REDIS_URL") {
            self.limit.redis_url = Some(url);
        }
        if let Some(fail_open) = env_parse("ASKGATE_RATE_LIMIT_FAIL_OPEN") {
            self.limit.fail_open = fail_open;
        }
    }

    /// Validate the configuration.
    ///
    /// Missing backend endpoints or keys are fatal: the gateway refuses to
    /// start rather than rejecting every request at runtime.
    pub fn validate(&self) -> AppResult<()> {
        let mut missing = Vec::new();

        if self.search.endpoint.trim().is_empty() {
            missing.push("search.endpoint");
        }
        if self.search.api_key.trim().is_empty() {
            missing.push("search.apiKey");
        }
        if self.openai.endpoint.trim().is_empty() {
            missing.push("openai.endpoint");
        }
        if self.openai.api_key.trim().is_empty() {
            missing.push("openai.apiKey");
        }

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.limit.rate_per_sec <= 0.0 {
            return Err(AppError::Config(format!(
                "limit.ratePerSec must be positive, got {}",
                self.limit.rate_per_sec
            )));
        }
        if self.limit.per_minute == 0 {
            return Err(AppError::Config(
                "limit.perMinute must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether no credential mechanism is configured.
    ///
    /// The open mode is preserved deliberately; callers should surface it
    /// loudly (the server logs a warning at startup).
    pub fn auth_is_open(&self) -> bool {
        self.auth.api_key.is_none() && self.auth.jwt.is_none()
    }
}

/// Parse an environment variable, ignoring unset or unparseable values.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.search.endpoint = "https://search.example.net".to_string();
        config.search.api_key = "search-key".to_string();
        config.openai.endpoint = "https://openai.example.com".to_string();
        config.openai.api_key = "openai-key".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.search.index, "etl-docs-index");
        assert_eq!(config.openai.chat_deployment, "gpt-4o-mini");
        assert_eq!(config.limit.rate_per_sec, 2.0);
        assert_eq!(config.limit.per_minute, 120);
        assert!(!config.limit.fail_open);
        assert!(config.auth_is_open());
    }

    #[test]
    fn test_validate_missing_backends() {
        let config = GatewayConfig::default();
        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("search.endpoint"));
        assert!(message.contains("openai.apiKey"));
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let mut config = valid_config();
        config.limit.rate_per_sec = 0.0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.limit.per_minute = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_not_open_with_api_key() {
        let mut config = GatewayConfig::default();
        config.auth.api_key = Some("secret".to_string());
        assert!(!config.auth_is_open());
    }

    #[test]
    fn test_yaml_merge() {
        use std::io::Write;

        let yaml = r#"
search:
  endpoint: "https://search.example.net"
  apiKey: "s3cret"
  filter: "department eq 'HR'"
openai:
  endpoint: "https://openai.example.com"
  apiKey: "k3y"
auth:
  jwtSecret: "hush"
  jwtIssuer: "askgate"
limit:
  perMinute: 60
  failOpen: true
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let mut config = GatewayConfig::default();
        config.merge_yaml(&file.path().to_path_buf()).unwrap();

        assert_eq!(config.search.endpoint, "https://search.example.net");
        assert_eq!(config.search.api_key, "s3cret");
        assert_eq!(config.search.filter.as_deref(), Some("department eq 'HR'"));
        assert_eq!(config.openai.endpoint, "https://openai.example.com");
        // Unset file fields keep their defaults
        assert_eq!(config.openai.chat_deployment, "gpt-4o-mini");
        let jwt = config.auth.jwt.as_ref().unwrap();
        assert_eq!(jwt.secret, "hush");
        assert_eq!(jwt.issuer.as_deref(), Some("askgate"));
        assert!(jwt.audience.is_none());
        assert_eq!(config.limit.per_minute, 60);
        assert!(config.limit.fail_open);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_merge_rejects_bad_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"search: [not, a, mapping]").unwrap();

        let mut config = GatewayConfig::default();
        let err = config.merge_yaml(&file.path().to_path_buf()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
