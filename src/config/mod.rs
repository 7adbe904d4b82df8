use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

/// Name of the signing-secret variable used by earlier deployments.
/// When set it wins over `APP_AUTH__JWT_SECRET`.
pub const LEGACY_SECRET_VAR: &str = "JWT_SECRET_KEY";

/// Completion API key variable used by earlier deployments.
pub const LEGACY_OPENAI_KEY_VAR: &str = "TUTORLY_OPENAI_DEV";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Symmetric HS256 secret. Empty is accepted but leaves tokens forgeable.
    pub jwt_secret: String,
    /// Username to lowercase hex SHA-256 digest of the password.
    #[serde(default)]
    pub users: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    /// Missing key fails each completion request, not startup.
    #[serde(default)]
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub openai: OpenAiConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let legacy = vec![
            ("auth.jwt_secret", env::var(LEGACY_SECRET_VAR).ok()),
            ("openai.api_key", env::var(LEGACY_OPENAI_KEY_VAR).ok()),
        ];
        Self::build(&run_mode, None, legacy)
    }

    /// Layers defaults, config files and `APP_*` variables. `env_source`
    /// replaces the process environment when given; `legacy` values that are
    /// set override everything else.
    fn build(
        run_mode: &str,
        env_source: Option<HashMap<String, String>>,
        legacy: Vec<(&str, Option<String>)>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Start with default values
            .set_default("environment", run_mode)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("auth.jwt_secret", "")?
            .set_default("cors.enabled", true)?
            .set_default("cors.allow_any_origin", true)?
            .set_default("cors.max_age", 3600)?
            .set_default("openai.api_url", "https://api.openai.com/v1/chat/completions")?
            .set_default("openai.model", "gpt-3.5-turbo")?
            .set_default("openai.timeout_secs", 60)?

            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))

            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_source)
            );

        for (key, value) in legacy {
            builder = builder.set_override_option(key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    #[cfg(test)]
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::build("test", Some(HashMap::new()), Vec::new())
    }
}
