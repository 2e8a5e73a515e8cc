use anyhow::{bail, Context, Result};
use clap::Parser;
use std::future::Future;
use tokio::signal;
use tracing::{error, info, warn};

use redis_stream_producer::config::AppConfig;
use redis_stream_producer::logging;
use redis_stream_producer::{FieldValue, Message, Producer};

/// Publica mensajes en un stream de Redis
#[derive(Debug, Parser)]
#[command(name = "stream-publish", version, about)]
struct Cli {
    /// Stream destino
    #[arg(short, long)]
    stream: String,

    /// Campo del mensaje en formato clave=valor (repetible)
    #[arg(short, long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,

    /// Objeto JSON con los campos del mensaje
    #[arg(long)]
    json: Option<String>,

    /// MAXLEN para este mensaje (0 = usar el del productor)
    #[arg(long)]
    max_len: Option<u64>,

    /// MINID para este mensaje
    #[arg(long)]
    min_id: Option<String>,

    /// LIMIT para el recorte
    #[arg(long)]
    trim_limit: Option<u64>,

    /// ID explícito (por defecto lo genera Redis)
    #[arg(long)]
    id: Option<String>,

    /// Número de copias a publicar
    #[arg(short, long, default_value_t = 1)]
    count: usize,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("campo inválido {:?}, se esperaba clave=valor", raw))
}

impl Cli {
    fn build_message(&self) -> Result<Message> {
        let mut msg = Message::new(&self.stream);
        msg.stream_max_length = self.max_len;
        msg.stream_min_id = self.min_id.clone();
        msg.trim_limit = self.trim_limit;
        msg.id = self.id.clone();

        if let Some(raw) = &self.json {
            let value: serde_json::Value =
                serde_json::from_str(raw).context("--json no es JSON válido")?;
            let serde_json::Value::Object(object) = value else {
                bail!("--json debe ser un objeto");
            };
            for (key, value) in object {
                msg.values.insert(key, FieldValue::from_json(value)?);
            }
        }

        for (key, value) in &self.fields {
            msg.values.insert(key.clone(), FieldValue::from(value.as_str()));
        }

        Ok(msg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error cargando configuración: {}", e);
            eprintln!("🔄 Usando configuración por defecto de desarrollo");
            AppConfig::default_dev()
        }
    };

    let _log_guard = logging::init_tracing(&config.logging);

    info!("🚀 Iniciando stream-publish v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;
    info!("✅ Configuración cargada y validada");
    info!("📋 Config: {:#?}", config.display_safe());

    let template = cli.build_message()?;
    if cli.count > 1 && template.explicit_id().is_some() {
        bail!("--id solo puede usarse con --count 1");
    }

    info!("📡 Conectando a Redis...");
    let producer = Producer::with_options(config.producer_options()).await?;

    run_until_interrupted(publish(&producer, &template, cli.count), async {
        // Si no se puede escuchar la señal, la publicación sigue hasta terminar
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!("🛑 stream-publish terminado");
    Ok(())
}

/// Ejecuta la publicación salvo que llegue la interrupción antes; en ese caso
/// devuelve error para que el proceso no termine con código 0
async fn run_until_interrupted<P, I>(publish: P, interrupt: I) -> Result<()>
where
    P: Future<Output = Result<()>>,
    I: Future<Output = ()>,
{
    tokio::select! {
        result = publish => result,
        _ = interrupt => {
            warn!("🔔 Ctrl+C recibido, abortando publicación");
            bail!("publicación interrumpida antes de terminar")
        }
    }
}

/// Publica `count` copias del mensaje en paralelo
async fn publish(producer: &Producer, template: &Message, count: usize) -> Result<()> {
    let futures = (0..count).map(|_| {
        let mut msg = template.clone();
        async move {
            producer.enqueue(&mut msg).await?;
            Ok::<_, redis_stream_producer::QueueError>(msg)
        }
    });

    let results = futures::future::join_all(futures).await;

    let mut errors = 0;
    for result in results {
        match result {
            Ok(msg) => info!(
                "✅ Mensaje publicado en {} con ID {}",
                msg.stream,
                msg.id.as_deref().unwrap_or_default()
            ),
            Err(e) => {
                error!("❌ Error publicando mensaje: {}", e);
                errors += 1;
            }
        }
    }

    if errors > 0 {
        bail!("{} de {} mensajes no se publicaron", errors, count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn interrupted_publish_is_an_error() {
        let publish = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, anyhow::Error>(())
        };
        let result = run_until_interrupted(publish, async {}).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn finished_publish_returns_its_result() {
        let interrupt = std::future::pending::<()>();
        assert!(run_until_interrupted(async { Ok(()) }, interrupt).await.is_ok());

        let interrupt = std::future::pending::<()>();
        let failed = async { Err::<(), _>(anyhow::anyhow!("2 de 5 mensajes no se publicaron")) };
        assert!(run_until_interrupted(failed, interrupt).await.is_err());
    }

    #[test]
    fn field_parsing() {
        assert_eq!(parse_field("id=42").unwrap(), ("id".to_string(), "42".to_string()));
        assert_eq!(parse_field("url=a=b").unwrap(), ("url".to_string(), "a=b".to_string()));
        assert!(parse_field("=x").is_err());
        assert!(parse_field("novalue").is_err());
    }
}
