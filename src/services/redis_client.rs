use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::cluster_routing::{RoutingInfo, SingleNodeRoutingInfo};
use redis::{
    Client, ConnectionAddr, ConnectionInfo, ErrorKind, FromRedisValue, RedisConnectionInfo,
    RedisError, RedisResult, Value,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{QueueError, Result};
use crate::models::AppendRequest;
use crate::services::preflight::parse_redis_version;
use crate::services::StreamBroker;

/// Opciones de conexión a Redis (solo se pasan al cliente de Redis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisOptions {
    /// `host:port`; con más de una dirección se usa el cliente de cluster
    pub addrs: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub db: i64,
    pub tls: bool,
    /// Fuerza el cliente de cluster aunque haya una sola dirección
    pub cluster: bool,
    pub connect_timeout_ms: u64,
}

impl Default for RedisOptions {
    fn default() -> Self {
        Self {
            addrs: vec!["127.0.0.1:6379".to_string()],
            username: None,
            password: None,
            db: 0,
            tls: false,
            cluster: false,
            connect_timeout_ms: 5000,
        }
    }
}

impl RedisOptions {
    pub fn is_cluster(&self) -> bool {
        self.cluster || self.addrs.len() > 1
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Construye la información de conexión para una dirección `host:port`.
    ///
    /// Las credenciales se pasan tal cual, sin pasar por una URL.
    pub fn connection_info(&self, addr: &str) -> RedisResult<ConnectionInfo> {
        let (host, port) = split_host_port(addr)?;
        let addr = if self.tls {
            ConnectionAddr::TcpTls {
                host,
                port,
                insecure: false,
                tls_params: None,
            }
        } else {
            ConnectionAddr::Tcp(host, port)
        };

        Ok(ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                // Cluster no admite seleccionar base de datos
                db: if self.is_cluster() { 0 } else { self.db },
                username: self.username.clone(),
                password: self.password.clone(),
                ..Default::default()
            },
        })
    }

    /// Información de conexión de todas las direcciones configuradas
    pub fn connection_infos(&self) -> RedisResult<Vec<ConnectionInfo>> {
        self.addrs.iter().map(|addr| self.connection_info(addr)).collect()
    }
}

const DEFAULT_REDIS_PORT: u16 = 6379;

fn split_host_port(addr: &str) -> RedisResult<(String, u16)> {
    let addr = addr.trim();
    let invalid = || {
        RedisError::from((
            ErrorKind::InvalidClientConfig,
            "dirección de Redis inválida",
            addr.to_string(),
        ))
    };

    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        // IPv6: `[::1]` o `[::1]:6379`
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        match tail.strip_prefix(':') {
            Some(port) => (host, Some(port)),
            None if tail.is_empty() => (host, None),
            None => return Err(invalid()),
        }
    } else {
        match addr.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (addr, None),
        }
    };

    if host.is_empty() {
        return Err(invalid());
    }

    let port = match port {
        Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
        None => DEFAULT_REDIS_PORT,
    };

    Ok((host.to_string(), port))
}

/// Convierte la respuesta de `INFO` en texto.
///
/// En cluster la respuesta puede llegar como un mapa nodo => INFO; se devuelve el
/// INFO del nodo con la versión más baja.
pub fn info_from_value(value: &Value) -> RedisResult<String> {
    match value {
        Value::Map(nodes) => {
            let mut lowest: Option<(Vec<u32>, String)> = None;
            for (_, node_info) in nodes {
                let info = String::from_redis_value(node_info)?;
                let version = parse_redis_version(&info)
                    .map(version_key)
                    .unwrap_or_default();
                if lowest.as_ref().map_or(true, |(current, _)| version < *current) {
                    lowest = Some((version, info));
                }
            }
            lowest.map(|(_, info)| info).ok_or_else(|| {
                RedisError::from((ErrorKind::TypeError, "INFO sin respuesta de ningún nodo"))
            })
        }
        other => String::from_redis_value(other),
    }
}

fn version_key(version: &str) -> Vec<u32> {
    version
        .split('.')
        .map(|part| part.parse::<u32>().unwrap_or(0))
        .collect()
}

/// Conexión a Redis compartida por el productor
#[derive(Clone)]
pub enum RedisConnection {
    Single(ConnectionManager),
    Cluster(ClusterConnection),
}

impl RedisConnection {
    /// Abre una conexión de nodo único o de cluster según las opciones
    pub async fn connect(options: &RedisOptions) -> Result<Self> {
        if options.addrs.is_empty() {
            return Err(QueueError::Connection(RedisError::from((
                ErrorKind::InvalidClientConfig,
                "se requiere al menos una dirección de Redis",
            ))));
        }

        let timeout = options.connect_timeout();
        let connect = async {
            if options.is_cluster() {
                let client = ClusterClient::new(options.connection_infos()?)?;
                let conn = client.get_async_connection().await?;
                Ok::<_, RedisError>(RedisConnection::Cluster(conn))
            } else {
                let client = Client::open(options.connection_info(&options.addrs[0])?)?;
                let conn = ConnectionManager::new(client).await?;
                Ok(RedisConnection::Single(conn))
            }
        };

        let conn = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| {
                RedisError::from((
                    ErrorKind::IoError,
                    "timeout conectando a Redis",
                    format!("{:?}", timeout),
                ))
            })
            .and_then(|result| result)
            .map_err(QueueError::Connection)?;

        info!(
            "✅ Conectado a Redis ({}): {:?}",
            if options.is_cluster() { "cluster" } else { "nodo único" },
            options.addrs
        );

        Ok(conn)
    }
}

#[async_trait]
impl StreamBroker for RedisConnection {
    async fn append(&self, request: &AppendRequest) -> std::result::Result<String, RedisError> {
        let cmd = request.to_cmd();
        let id: String = match self {
            RedisConnection::Single(conn) => cmd.query_async(&mut conn.clone()).await?,
            RedisConnection::Cluster(conn) => cmd.query_async(&mut conn.clone()).await?,
        };

        debug!(stream = %request.stream, id = %id, "XADD ejecutado");
        Ok(id)
    }

    async fn server_info(&self) -> std::result::Result<String, RedisError> {
        let mut cmd = redis::cmd("INFO");
        cmd.arg("server");
        let value: Value = match self {
            RedisConnection::Single(conn) => cmd.query_async(&mut conn.clone()).await?,
            // Sin ruta explícita el cluster envía INFO a todos los masters
            RedisConnection::Cluster(conn) => {
                conn.clone()
                    .route_command(
                        &cmd,
                        RoutingInfo::SingleNode(SingleNodeRoutingInfo::Random),
                    )
                    .await?
            }
        };
        info_from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tcp(info: &ConnectionInfo, expected_host: &str, expected_port: u16) {
        assert!(
            matches!(&info.addr, ConnectionAddr::Tcp(host, port) if host == expected_host && *port == expected_port),
            "dirección inesperada: {:?}",
            info.addr
        );
    }

    #[test]
    fn single_address_is_not_cluster() {
        let options = RedisOptions::default();
        assert!(!options.is_cluster());

        let info = options.connection_info("127.0.0.1:6379").unwrap();
        assert_tcp(&info, "127.0.0.1", 6379);
        assert_eq!(info.redis.db, 0);
        assert_eq!(info.redis.password, None);
    }

    #[test]
    fn credentials_tls_and_db_are_passed_through() {
        let options = RedisOptions {
            addrs: vec!["cache:6380".into()],
            username: Some("app".into()),
            password: Some("secret".into()),
            db: 3,
            tls: true,
            ..Default::default()
        };
        let infos = options.connection_infos().unwrap();
        assert_eq!(infos.len(), 1);
        assert!(matches!(
            &infos[0].addr,
            ConnectionAddr::TcpTls { host, port: 6380, insecure: false, .. } if host == "cache"
        ));
        assert_eq!(infos[0].redis.db, 3);
        assert_eq!(infos[0].redis.username.as_deref(), Some("app"));
        assert_eq!(infos[0].redis.password.as_deref(), Some("secret"));
    }

    #[test]
    fn reserved_characters_in_password_survive() {
        for password in ["a/b", "x#y", "q?r", "p@ss", "%2F:/?#[]@"] {
            let options = RedisOptions {
                password: Some(password.to_string()),
                ..Default::default()
            };
            let info = options.connection_info("127.0.0.1:6379").unwrap();
            assert_eq!(info.redis.password.as_deref(), Some(password));
            assert!(Client::open(info).is_ok(), "password {:?} rechazado", password);
        }
    }

    #[test]
    fn several_addresses_select_cluster_without_db() {
        let options = RedisOptions {
            addrs: vec!["a:7000".into(), "b:7001".into()],
            password: Some("pw".into()),
            db: 2,
            ..Default::default()
        };
        assert!(options.is_cluster());

        let infos = options.connection_infos().unwrap();
        assert_tcp(&infos[0], "a", 7000);
        assert_tcp(&infos[1], "b", 7001);
        assert!(infos.iter().all(|info| info.redis.db == 0));
        assert!(ClusterClient::new(infos).is_ok());
    }

    #[test]
    fn host_port_parsing() {
        assert_eq!(split_host_port("cache").unwrap(), ("cache".to_string(), 6379));
        assert_eq!(split_host_port("[::1]:7000").unwrap(), ("::1".to_string(), 7000));
        assert_eq!(split_host_port("[::1]").unwrap(), ("::1".to_string(), 6379));
        assert!(split_host_port("cache:notaport").is_err());
        assert!(split_host_port(":6379").is_err());
    }

    #[test]
    fn info_reply_as_plain_string() {
        let value = Value::BulkString(b"# Server\r\nredis_version:7.2.4\r\n".to_vec());
        let info = info_from_value(&value).unwrap();
        assert_eq!(parse_redis_version(&info), Some("7.2.4"));
    }

    #[test]
    fn info_reply_per_node_map_uses_lowest_version() {
        let value = Value::Map(vec![
            (
                Value::BulkString(b"10.0.0.1:7000".to_vec()),
                Value::BulkString(b"# Server\r\nredis_version:7.2.4\r\n".to_vec()),
            ),
            (
                Value::BulkString(b"10.0.0.2:7001".to_vec()),
                Value::BulkString(b"# Server\r\nredis_version:6.2.14\r\n".to_vec()),
            ),
        ]);
        let info = info_from_value(&value).unwrap();
        assert_eq!(parse_redis_version(&info), Some("6.2.14"));
    }

    #[test]
    fn empty_info_map_is_an_error() {
        assert!(info_from_value(&Value::Map(vec![])).is_err());
    }

    #[tokio::test]
    async fn empty_addresses_fail_before_connecting() {
        let options = RedisOptions {
            addrs: vec![],
            ..Default::default()
        };
        let result = RedisConnection::connect(&options).await;
        assert!(matches!(result, Err(QueueError::Connection(_))));
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        // Dirección no enrutable: o expira el timeout o falla la conexión
        let options = RedisOptions {
            addrs: vec!["10.255.255.1:6379".into()],
            connect_timeout_ms: 50,
            ..Default::default()
        };
        let result = RedisConnection::connect(&options).await;
        assert!(matches!(result, Err(QueueError::Connection(_))));
    }
}
