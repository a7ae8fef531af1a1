use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{fs, io};

use crate::services::heartbeat::HeartbeatConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
const ENV_PREFIX: &str = "REGISTRY_";

/// 配置加载错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid environment override: {0}")]
    Env(#[from] envy::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub heartbeat: HeartbeatSettings,
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:10000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatSettings {
    pub interval_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_secs: u64,
    pub max_down_rounds: Option<u32>,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            interval_secs: 4,
            max_attempts: 3,
            retry_backoff_secs: 1,
            max_down_rounds: Some(75),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// 出站请求的传输层超时，未设置时不限制
    pub timeout_secs: Option<u64>,
}

// 环境变量覆盖项，例如 REGISTRY_LISTEN_ADDR
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    listen_addr: Option<String>,
    heartbeat_interval_secs: Option<u64>,
    heartbeat_max_attempts: Option<u32>,
    heartbeat_retry_backoff_secs: Option<u64>,
    heartbeat_max_down_rounds: Option<u32>,
    http_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(DEFAULT_CONFIG_PATH)?;
        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    /// 读取 TOML 配置文件，文件不存在时使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(config_str) => Ok(toml::from_str(&config_str)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_iter(vars)?;

        if let Some(addr) = overrides.listen_addr {
            self.server.listen_addr = addr;
        }
        if let Some(secs) = overrides.heartbeat_interval_secs {
            self.heartbeat.interval_secs = secs;
        }
        if let Some(attempts) = overrides.heartbeat_max_attempts {
            self.heartbeat.max_attempts = attempts;
        }
        if let Some(secs) = overrides.heartbeat_retry_backoff_secs {
            self.heartbeat.retry_backoff_secs = secs;
        }
        if let Some(rounds) = overrides.heartbeat_max_down_rounds {
            self.heartbeat.max_down_rounds = Some(rounds);
        }
        if let Some(secs) = overrides.http_timeout_secs {
            self.http.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig {
            interval: Duration::from_secs(self.heartbeat.interval_secs),
            max_attempts: self.heartbeat.max_attempts,
            retry_backoff: Duration::from_secs(self.heartbeat.retry_backoff_secs),
            max_down_rounds: self.heartbeat.max_down_rounds,
        }
    }

    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}
