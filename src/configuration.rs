use config::{Config, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

const BASE_CONFIG: &str = include_str!("../configuration/base.yaml");
const LOCAL_CONFIG: &str = include_str!("../configuration/local.yaml");
const PRODUCTION_CONFIG: &str = include_str!("../configuration/production.yaml");

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub github: GitHubSettings,
    pub dispatch: DispatchSettings,
    pub cors: CorsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubSettings {
    pub api_base_url: String,
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    pub token: Option<SecretString>,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl GitHubSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DispatchSettings {
    pub webhook_timeout_seconds: u64,
    /// `None` lets scripts run without a deadline.
    pub script_timeout_seconds: Option<u64>,
    pub shell: String,
    /// Parent directory for per-run script directories. Defaults to the system temp dir.
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

impl DispatchSettings {
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_seconds)
    }

    pub fn script_timeout(&self) -> Option<Duration> {
        self.script_timeout_seconds.map(Duration::from_secs)
    }

    pub fn workdir(&self) -> PathBuf {
        self.workdir.clone().unwrap_or_else(env::temp_dir)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()).map(SecretString::from))
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    dotenvy::dotenv().ok();

    let environment = get_environment()?;
    info!(environment = environment.as_str(), "loading configuration");
    let settings = build_configuration(environment)?;
    Ok(with_token_fallback(settings, env::var("GITHUB_TOKEN").ok()))
}

fn get_environment() -> Result<Environment, config::ConfigError> {
    let env_var = env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string());

    env_var
        .try_into()
        .map_err(|_| config::ConfigError::NotFound("Failed to parse APP_ENVIRONMENT".to_string()))
}

fn build_configuration(environment: Environment) -> Result<Settings, config::ConfigError> {
    build_configuration_with(environment, env_source())
}

/// `APP_` variables with `__` between sections. `APP_CORS__ALLOWED_ORIGINS` takes a
/// comma separated list.
fn env_source() -> config::Environment {
    config::Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
}

fn build_configuration_with(
    environment: Environment,
    env_source: config::Environment,
) -> Result<Settings, config::ConfigError> {
    let environment_config = match environment {
        Environment::Local => LOCAL_CONFIG,
        Environment::Production => PRODUCTION_CONFIG,
    };

    let config = Config::builder()
        .add_source(File::from_str(BASE_CONFIG, FileFormat::Yaml))
        .add_source(File::from_str(environment_config, FileFormat::Yaml))
        .add_source(env_source)
        .build()?;

    config.try_deserialize::<Settings>()
}

/// `GITHUB_TOKEN` is only consulted when no token came from the layered config.
fn with_token_fallback(mut settings: Settings, fallback: Option<String>) -> Settings {
    if settings.github.token.is_none() {
        settings.github.token = fallback
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);
    }
    settings
}

#[derive(Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
