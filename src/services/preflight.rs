use tracing::{debug, info};

use crate::errors::{QueueError, Result};
use crate::services::StreamBroker;

/// Versión mínima de Redis con soporte de streams
pub const MIN_REDIS_MAJOR_VERSION: u32 = 5;

/// Extrae `redis_version` de la respuesta de `INFO server`
pub fn parse_redis_version(info: &str) -> Option<&str> {
    info.lines()
        .find_map(|line| line.trim().strip_prefix("redis_version:"))
        .map(str::trim)
        .filter(|version| !version.is_empty())
}

/// Verifica que Redis responde y que su versión soporta streams
pub async fn redis_preflight_checks(broker: &dyn StreamBroker) -> Result<()> {
    let info = broker.server_info().await.map_err(QueueError::Connection)?;

    let version = parse_redis_version(&info)
        .ok_or_else(|| QueueError::Preflight("no se pudo extraer la versión de Redis".into()))?;

    let major = version
        .split('.')
        .next()
        .and_then(|major| major.parse::<u32>().ok())
        .ok_or_else(|| QueueError::Preflight(format!("versión de Redis inválida: {}", version)))?;

    if major < MIN_REDIS_MAJOR_VERSION {
        return Err(QueueError::UnsupportedVersion(version.to_string()));
    }

    debug!(version = %version, "Preflight check de Redis superado");
    info!("✅ Redis {} disponible con soporte de streams", version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockStreamBroker;
    use tokio_test::{assert_err, assert_ok};

    const INFO_7: &str = "# Server\r\nredis_version:7.2.4\r\nredis_git_sha1:00000000\r\n";

    fn broker_with_info(info: &'static str) -> MockStreamBroker {
        let mut broker = MockStreamBroker::new();
        broker
            .expect_server_info()
            .returning(move || Ok(info.to_string()));
        broker
    }

    #[test]
    fn parses_version_line() {
        assert_eq!(parse_redis_version(INFO_7), Some("7.2.4"));
        assert_eq!(parse_redis_version("# Server\r\nos:Linux\r\n"), None);
    }

    #[tokio::test]
    async fn accepts_redis_5_and_later() {
        assert_ok!(redis_preflight_checks(&broker_with_info(INFO_7)).await);
        assert_ok!(redis_preflight_checks(&broker_with_info("redis_version:5.0.0\r\n")).await);
    }

    #[tokio::test]
    async fn rejects_redis_4() {
        let err = redis_preflight_checks(&broker_with_info("redis_version:4.0.14\r\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::UnsupportedVersion(v) if v == "4.0.14"));
    }

    #[tokio::test]
    async fn missing_version_is_preflight_error() {
        let err = redis_preflight_checks(&broker_with_info("# Server\r\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Preflight(_)));
    }

    #[tokio::test]
    async fn unreachable_redis_is_connection_error() {
        let mut broker = MockStreamBroker::new();
        broker.expect_server_info().returning(|| {
            Err(redis::RedisError::from(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        });

        let result = redis_preflight_checks(&broker).await;
        assert_err!(&result);
        assert!(matches!(result, Err(QueueError::Connection(_))));
    }
}
