use async_trait::async_trait;
use redis::RedisError;

use crate::models::AppendRequest;

/// Trait para abstraer la conexión a Redis que usa el productor (nodo único, cluster o mock)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamBroker: Send + Sync {
    /// Ejecuta un XADD y devuelve el ID asignado (o el ID explícito)
    async fn append(&self, request: &AppendRequest) -> Result<String, RedisError>;

    /// Devuelve la sección `server` de `INFO`
    async fn server_info(&self) -> Result<String, RedisError>;
}
