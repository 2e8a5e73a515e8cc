use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{QueueError, Result};
use crate::services::{ProducerOptions, RedisOptions};

/// Prefijo de las variables de entorno, p. ej. `REDISQUEUE_REDIS__ADDRS=a:6379,b:6379`
pub const ENV_PREFIX: &str = "REDISQUEUE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub redis: RedisOptions,
    pub producer: ProducerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub stream_max_length: u64,
    pub stream_min_id: Option<String>,
    pub use_approximate: bool,
    pub trim_limit: u64,
    /// 0 = sin timeout por comando
    pub command_timeout_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            stream_max_length: 1000,
            stream_min_id: None,
            use_approximate: true,
            trim_limit: 0,
            command_timeout_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            json_format: true,
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (`REDISQUEUE_<SECCION>__<CAMPO>`)
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix(ENV_PREFIX))
    }

    /// Carga la configuración desde una fuente de entorno concreta
    pub fn load_from(environment: Environment) -> std::result::Result<Self, ConfigError> {
        let redis = RedisOptions::default();
        let producer = ProducerConfig::default();
        let logging = LoggingConfig::default();

        Config::builder()
            .set_default("redis.addrs", redis.addrs)?
            .set_default("redis.db", redis.db)?
            .set_default("redis.tls", redis.tls)?
            .set_default("redis.cluster", redis.cluster)?
            .set_default("redis.connect_timeout_ms", redis.connect_timeout_ms)?
            .set_default("producer.stream_max_length", producer.stream_max_length)?
            .set_default("producer.use_approximate", producer.use_approximate)?
            .set_default("producer.trim_limit", producer.trim_limit)?
            .set_default("producer.command_timeout_ms", producer.command_timeout_ms)?
            .set_default("logging.level", logging.level)?
            .set_default("logging.json_format", logging.json_format)?
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("redis.addrs")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<()> {
        if self.redis.addrs.is_empty() || self.redis.addrs.iter().any(|a| a.trim().is_empty()) {
            return Err(QueueError::Config(ConfigError::Message(
                "las direcciones de Redis no pueden estar vacías".into(),
            )));
        }

        if self.redis.connect_timeout_ms == 0 {
            return Err(QueueError::Config(ConfigError::Message(
                "connect_timeout_ms debe ser mayor a 0".into(),
            )));
        }

        if self.redis.cluster && self.redis.db != 0 {
            return Err(QueueError::Config(ConfigError::Message(
                "Redis cluster solo admite la base de datos 0".into(),
            )));
        }

        Ok(())
    }

    /// Configuración por defecto para desarrollo
    pub fn default_dev() -> Self {
        Self {
            redis: RedisOptions::default(),
            producer: ProducerConfig::default(),
            logging: LoggingConfig {
                json_format: false,
                level: "debug".to_string(),
                ..LoggingConfig::default()
            },
        }
    }

    /// Opciones del productor a partir de la configuración
    pub fn producer_options(&self) -> ProducerOptions {
        ProducerOptions {
            stream_max_length: self.producer.stream_max_length,
            stream_min_id: self.producer.stream_min_id.clone().filter(|id| !id.is_empty()),
            use_approximate: self.producer.use_approximate,
            trim_limit: self.producer.trim_limit,
            redis_client: None,
            redis_options: self.redis.clone(),
            command_timeout: match self.producer.command_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    /// Muestra la configuración (ocultando información sensible)
    pub fn display_safe(&self) -> AppConfigSafe {
        AppConfigSafe {
            redis: RedisConfigSafe {
                addrs: self.redis.addrs.clone(),
                db: self.redis.db,
                tls: self.redis.tls,
                cluster: self.redis.is_cluster(),
                has_credentials: self.redis.password.is_some(),
            },
            producer: self.producer.clone(),
            logging: self.logging.clone(),
        }
    }
}

/// Versión segura de la configuración para mostrar en logs
#[derive(Debug, Serialize)]
pub struct AppConfigSafe {
    pub redis: RedisConfigSafe,
    pub producer: ProducerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize)]
pub struct RedisConfigSafe {
    pub addrs: Vec<String>,
    pub db: i64,
    pub tls: bool,
    pub cluster: bool,
    pub has_credentials: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::load_from(env(&[])).unwrap();
        assert_eq!(config.redis, RedisOptions::default());
        assert_eq!(config.producer, ProducerConfig::default());
        assert!(config.validate().is_ok());

        let options = config.producer_options();
        assert_eq!(options.stream_max_length, 1000);
        assert!(options.use_approximate);
        assert_eq!(options.command_timeout, None);
    }

    #[test]
    fn environment_overrides() {
        let config = AppConfig::load_from(env(&[
            ("REDISQUEUE_REDIS__ADDRS", "a:7000,b:7001"),
            ("REDISQUEUE_REDIS__PASSWORD", "secret"),
            ("REDISQUEUE_PRODUCER__STREAM_MAX_LENGTH", "0"),
            ("REDISQUEUE_PRODUCER__STREAM_MIN_ID", "1690000000000-0"),
            ("REDISQUEUE_PRODUCER__USE_APPROXIMATE", "false"),
            ("REDISQUEUE_PRODUCER__COMMAND_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.redis.addrs, vec!["a:7000", "b:7001"]);
        assert!(config.redis.is_cluster());

        let options = config.producer_options();
        assert_eq!(options.stream_max_length, 0);
        assert_eq!(options.stream_min_id.as_deref(), Some("1690000000000-0"));
        assert!(!options.use_approximate);
        assert_eq!(options.command_timeout, Some(Duration::from_millis(250)));

        let safe = config.display_safe();
        assert!(safe.redis.has_credentials);
        assert!(!format!("{:?}", safe).contains("secret"));
    }

    #[test]
    fn validate_rejects_cluster_with_db() {
        let mut config = AppConfig::default_dev();
        config.redis.cluster = true;
        config.redis.db = 2;
        assert!(matches!(config.validate(), Err(QueueError::Config(_))));
    }
}
