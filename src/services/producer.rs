use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::errors::{QueueError, Result};
use crate::models::Message;
use crate::services::preflight::redis_preflight_checks;
use crate::services::trim;
use crate::services::{RedisConnection, RedisOptions, StreamBroker};

/// Opciones del productor
#[derive(Clone)]
pub struct ProducerOptions {
    /// MAXLEN por defecto del XADD. Limita el total de entradas del stream (no solo las
    /// ya procesadas): si los consumidores están caídos se descartan mensajes sin procesar.
    pub stream_max_length: u64,
    /// MINID por defecto del XADD. Se ignora si hay un MAXLEN efectivo.
    pub stream_min_id: Option<String>,
    /// Usa `~` con MAXLEN/MINID para que Redis recorte de forma más eficiente
    pub use_approximate: bool,
    /// LIMIT por defecto del XADD
    pub trim_limit: u64,
    /// Conexión ya creada; tiene prioridad sobre `redis_options`. Se conserva en
    /// [`Producer::options`] y el llamador sigue siendo su dueño.
    pub redis_client: Option<Arc<dyn StreamBroker>>,
    pub redis_options: RedisOptions,
    /// Timeout por comando; `None` deja el control al llamador
    pub command_timeout: Option<Duration>,
}

impl Default for ProducerOptions {
    fn default() -> Self {
        Self {
            stream_max_length: 1000,
            stream_min_id: None,
            use_approximate: true,
            trim_limit: 0,
            redis_client: None,
            redis_options: RedisOptions::default(),
            command_timeout: None,
        }
    }
}

impl fmt::Debug for ProducerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerOptions")
            .field("stream_max_length", &self.stream_max_length)
            .field("stream_min_id", &self.stream_min_id)
            .field("use_approximate", &self.use_approximate)
            .field("trim_limit", &self.trim_limit)
            .field("redis_client", &self.redis_client.as_ref().map(|_| "[SET]"))
            .field("redis_addrs", &self.redis_options.addrs)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

/// Productor que encola mensajes en streams de Redis para que un consumidor
/// los procese más tarde
#[derive(Clone)]
pub struct Producer {
    options: Arc<ProducerOptions>,
    broker: Arc<dyn StreamBroker>,
}

impl Producer {
    /// Crea un productor con las opciones por defecto (MAXLEN ~ 1000)
    pub async fn new() -> Result<Self> {
        Self::with_options(ProducerOptions::default()).await
    }

    /// Crea un productor con opciones personalizadas.
    ///
    /// Verifica la conexión y la versión de Redis antes de devolver el productor.
    pub async fn with_options(options: ProducerOptions) -> Result<Self> {
        let broker: Arc<dyn StreamBroker> = match &options.redis_client {
            Some(client) => {
                debug!("Usando cliente de Redis inyectado");
                Arc::clone(client)
            }
            None => Arc::new(RedisConnection::connect(&options.redis_options).await?),
        };

        redis_preflight_checks(broker.as_ref()).await?;

        info!(
            "✅ Producer configurado: maxlen={}, minid={:?}, approx={}, limit={}",
            options.stream_max_length,
            options.stream_min_id,
            options.use_approximate,
            options.trim_limit
        );

        Ok(Self {
            options: Arc::new(options),
            broker,
        })
    }

    pub fn options(&self) -> &ProducerOptions {
        &self.options
    }

    /// Encola un mensaje en `msg.stream`.
    ///
    /// Si Redis genera el ID, se escribe en `msg.id`. Si falla, `msg.id` no se toca.
    pub async fn enqueue(&self, msg: &mut Message) -> Result<()> {
        let id = match self.options.command_timeout {
            Some(timeout) => self.append_with_timeout(msg, timeout).await?,
            None => self.append(msg).await?,
        };
        msg.id = Some(id);
        Ok(())
    }

    /// Igual que [`Producer::enqueue`] pero con un timeout para esta llamada
    pub async fn enqueue_with_timeout(&self, msg: &mut Message, timeout: Duration) -> Result<()> {
        let id = self.append_with_timeout(msg, timeout).await?;
        msg.id = Some(id);
        Ok(())
    }

    async fn append_with_timeout(&self, msg: &Message, timeout: Duration) -> Result<String> {
        tokio::time::timeout(timeout, self.append(msg))
            .await
            .map_err(|_| QueueError::Timeout(timeout))?
    }

    async fn append(&self, msg: &Message) -> Result<String> {
        validate(msg)?;

        let request = trim::resolve(msg, &self.options);
        let id = self.broker.append(&request).await.map_err(|e| {
            error!("❌ Error encolando mensaje en stream {}: {}", msg.stream, e);
            QueueError::Broker(e)
        })?;

        debug!(stream = %msg.stream, id = %id, trim = ?request.trim, "📨 Mensaje encolado");
        Ok(id)
    }

    /// Verifica el estado de salud de Redis
    pub async fn health_check(&self) -> Result<bool> {
        match redis_preflight_checks(self.broker.as_ref()).await {
            Ok(()) => Ok(true),
            Err(e) => {
                error!("Redis health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

fn validate(msg: &Message) -> Result<()> {
    if msg.stream.is_empty() {
        return Err(QueueError::InvalidMessage(
            "el stream no puede estar vacío".into(),
        ));
    }

    if msg.values.is_empty() {
        return Err(QueueError::InvalidMessage(format!(
            "el mensaje para {} no tiene valores",
            msg.stream
        )));
    }

    Ok(())
}
