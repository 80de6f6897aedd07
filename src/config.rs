use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub security: SecurityConfig,

    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/dapur.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8001,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC-SHA256 secret for ACCESS tokens.
    /// Overridable via the `DAPUR_ACCESS_TOKEN_SECRET` env var.
    pub access_token_secret: String,

    /// HMAC-SHA256 secret for REFRESH tokens.
    /// Overridable via the `DAPUR_REFRESH_TOKEN_SECRET` env var.
    pub refresh_token_secret: String,

    /// Access token lifetime in minutes (default: 15)
    pub access_token_expiry_minutes: i64,

    /// Refresh token lifetime in days (default: 7)
    pub refresh_token_expiry_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: "dapur_dev_access_secret_change_me".to_string(),
            refresh_token_secret: "dapur_dev_refresh_secret_change_me".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// How often the expired-token sweep runs (default: 60 minutes)
    pub sweep_interval_minutes: u32,

    /// Optional cron expression overriding the fixed interval
    pub cron_expression: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_minutes: 60,
            cron_expression: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self::load_with_source()?.0)
    }

    /// Load config and report the file it came from, if any. This runs before
    /// the tracing subscriber is installed, so logging the chosen path is the
    /// caller's job.
    pub fn load_with_source() -> Result<(Self, Option<PathBuf>)> {
        for path in Self::config_paths() {
            if path.exists() {
                let mut config = Self::load_from_path(&path)?;
                config.apply_env_overrides();
                return Ok((config, Some(path)));
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok((config, None))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Env vars take precedence over the config file so secrets can be
    /// injected without touching config.toml.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("DAPUR_ACCESS_TOKEN_SECRET")
            && !secret.is_empty()
        {
            self.auth.access_token_secret = secret;
        }

        if let Ok(secret) = std::env::var("DAPUR_REFRESH_TOKEN_SECRET")
            && !secret.is_empty()
        {
            self.auth.refresh_token_secret = secret;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("dapur").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".dapur").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.access_token_secret.is_empty() || self.auth.refresh_token_secret.is_empty() {
            anyhow::bail!("Token secrets cannot be empty");
        }

        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            anyhow::bail!("Access and refresh token secrets must differ");
        }

        if self.auth.access_token_expiry_minutes <= 0 || self.auth.refresh_token_expiry_days <= 0 {
            anyhow::bail!("Token lifetimes must be > 0");
        }

        if self.scheduler.enabled
            && self.scheduler.sweep_interval_minutes == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Sweep interval must be > 0 or cron expression must be set");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.auth.access_token_expiry_minutes, 15);
        assert_eq!(config.auth.refresh_token_expiry_days, 7);
        assert_eq!(config.scheduler.sweep_interval_minutes, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [scheduler]
            sweep_interval_minutes = 30
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.scheduler.sweep_interval_minutes, 30);

        assert_eq!(config.server.port, 8001);
    }

    #[test]
    fn test_load_with_source_reports_origin() {
        let (config, source) = Config::load_with_source().unwrap();
        assert!(config.validate().is_ok());
        // Some(path) only when the probed file really exists.
        if let Some(path) = source {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_validate_rejects_shared_secret() {
        let mut config = Config::default();
        config.auth.refresh_token_secret = config.auth.access_token_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval_without_cron() {
        let mut config = Config::default();
        config.scheduler.sweep_interval_minutes = 0;
        config.scheduler.cron_expression = None;
        assert!(config.validate().is_err());

        config.scheduler.cron_expression = Some("0 0 * * * *".to_string());
        assert!(config.validate().is_ok());
    }
}
