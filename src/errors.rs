use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Error de conexión a Redis: {0}")]
    Connection(#[source] redis::RedisError),
    #[error("Error en preflight check: {0}")]
    Preflight(String),
    #[error("Redis streams no están soportados en la versión {0:?}")]
    UnsupportedVersion(String),
    #[error("Error de Redis: {0}")]
    Broker(#[from] redis::RedisError),
    #[error("Timeout de {0:?} esperando respuesta de Redis")]
    Timeout(Duration),
    #[error("Mensaje inválido: {0}")]
    InvalidMessage(String),
    #[error("Valor de campo no soportado: {0}")]
    InvalidFieldValue(String),
    #[error("Error de configuración: {0}")]
    Config(#[from] config::ConfigError),
}

impl QueueError {
    /// Devuelve el error original de Redis, si lo hay
    pub fn redis_error(&self) -> Option<&redis::RedisError> {
        match self {
            QueueError::Connection(e) | QueueError::Broker(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
