use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr};
use url::Url;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Where the rate-limit ledgers live.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Memory,
    File,
    Redis,
    Postgres,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    #[serde(default = "default_ledger_backend")]
    pub ledger_backend: LedgerBackend,

    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: String,

    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub emailjs_service_id: String,

    #[serde(default)]
    pub emailjs_template_id: String,

    #[serde(default)]
    pub emailjs_public_key: String,

    #[serde(default)]
    pub emailjs_private_key: Option<String>,

    #[serde(default = "default_emailjs_api_url")]
    pub emailjs_api_url: String,

    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_secs: u64,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Contact".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_ledger_backend() -> LedgerBackend {
    LedgerBackend::Memory
}
fn default_ledger_dir() -> String {
    "data/ledgers".to_string()
}
fn default_emailjs_api_url() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}
fn default_delivery_timeout() -> u64 {
    10
}
fn default_session_ttl() -> u64 {
    60 * 60
}
fn default_purge_interval() -> u64 {
    60 * 15
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.validate()?;
        Ok(config)
    }

    /// Collects every problem before failing, so one run shows them all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.emailjs_service_id.trim().is_empty() {
            errors.push("APP_EMAILJS_SERVICE_ID must be set".to_string());
        }
        if self.emailjs_template_id.trim().is_empty() {
            errors.push("APP_EMAILJS_TEMPLATE_ID must be set".to_string());
        }
        if self.emailjs_public_key.trim().is_empty() {
            errors.push("APP_EMAILJS_PUBLIC_KEY must be set".to_string());
        }
        if let Err(e) = Url::parse(&self.emailjs_api_url) {
            errors.push(format!("APP_EMAILJS_API_URL is not a valid URL: {}", e));
        }
        if self.delivery_timeout_secs == 0 {
            errors.push("APP_DELIVERY_TIMEOUT_SECS must be greater than zero".to_string());
        }
        match self.ledger_backend {
            LedgerBackend::Redis if self.redis_url.as_deref().is_none_or(|u| u.trim().is_empty()) => {
                errors.push("APP_REDIS_URL is required for the redis ledger backend".to_string());
            }
            LedgerBackend::Postgres if self.database_url.as_deref().is_none_or(|u| u.trim().is_empty()) => {
                errors.push("APP_DATABASE_URL is required for the postgres ledger backend".to_string());
            }
            LedgerBackend::File if self.ledger_dir.trim().is_empty() => {
                errors.push("APP_LEDGER_DIR is required for the file ledger backend".to_string());
            }
            _ => {}
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Defaults suitable for tests: in-memory ledgers and placeholder relay ids.
    pub fn for_testing() -> Self {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "Portfolio-Contact-Test".to_string(),
            port: 0,
            host: default_host(),
            worker_count: 1,
            log_format: default_log_format(),
            cors_allowed_origins: default_cors_origins(),
            trust_x_forwarded_for: true,
            ledger_backend: LedgerBackend::Memory,
            ledger_dir: default_ledger_dir(),
            redis_url: None,
            database_url: None,
            emailjs_service_id: "service_test".to_string(),
            emailjs_template_id: "template_test".to_string(),
            emailjs_public_key: "public_test".to_string(),
            emailjs_private_key: None,
            emailjs_api_url: default_emailjs_api_url(),
            delivery_timeout_secs: default_delivery_timeout(),
            session_ttl_secs: default_session_ttl(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self {
            Some(value) => value.as_str().redact(),
            None => "[NOT SET]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("log_format", &self.log_format)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("ledger_backend", &self.ledger_backend)
            .field("ledger_dir", &self.ledger_dir)
            .field("redis_url", &self.redis_url.redact())
            .field("database_url", &self.database_url.redact())
            .field("emailjs_service_id", &self.emailjs_service_id)
            .field("emailjs_template_id", &self.emailjs_template_id)
            .field("emailjs_public_key", &self.emailjs_public_key.as_str().redact())
            .field("emailjs_private_key", &self.emailjs_private_key.redact())
            .field("emailjs_api_url", &self.emailjs_api_url)
            .field("delivery_timeout_secs", &self.delivery_timeout_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("purge_interval_secs", &self.purge_interval_secs)
            .finish()
    }
}
