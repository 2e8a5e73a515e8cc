use bytes::Bytes;
use redis::{RedisWrite, ToRedisArgs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::QueueError;

/// Valor de un campo de un mensaje.
///
/// Conjunto cerrado de tipos que Redis puede almacenar en una entrada de stream.
/// Cualquier otro tipo se convierte (o se rechaza) antes de llegar al productor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Bytes),
}

impl FieldValue {
    /// Convierte un valor JSON a `FieldValue`.
    ///
    /// Escalares se mapean a su variante; arrays y objetos se serializan como
    /// texto JSON; `null` se rechaza.
    pub fn from_json(value: serde_json::Value) -> Result<Self, QueueError> {
        use serde_json::Value;

        match value {
            Value::Null => Err(QueueError::InvalidFieldValue(
                "null no es un valor válido para un campo de stream".to_string(),
            )),
            Value::Bool(b) => Ok(FieldValue::Bool(b)),
            Value::String(s) => Ok(FieldValue::Str(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Int(i))
                } else if n.is_u64() {
                    // No cabe en i64: se conserva como texto para no perder precisión
                    Ok(FieldValue::Str(n.to_string()))
                } else {
                    n.as_f64().map(FieldValue::Float).ok_or_else(|| {
                        QueueError::InvalidFieldValue(format!("número no representable: {}", n))
                    })
                }
            }
            other @ (Value::Array(_) | Value::Object(_)) => Ok(FieldValue::Str(other.to_string())),
        }
    }
}

impl ToRedisArgs for FieldValue {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        match self {
            FieldValue::Str(s) => out.write_arg(s.as_bytes()),
            FieldValue::Int(i) => out.write_arg_fmt(i),
            FieldValue::Float(f) => out.write_arg_fmt(f),
            FieldValue::Bool(true) => out.write_arg(b"1"),
            FieldValue::Bool(false) => out.write_arg(b"0"),
            FieldValue::Bytes(b) => out.write_arg(b),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(Bytes::from(value))
    }
}

/// Mensaje que se encola en un stream de Redis.
///
/// Al encolar se recomienda dejar `id` vacío para que Redis lo genere; el ID
/// asignado se escribe de vuelta en el mensaje.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<String>,
    pub stream: String,
    #[serde(default)]
    pub stream_max_length: Option<u64>,
    #[serde(default)]
    pub stream_min_id: Option<String>,
    #[serde(default)]
    pub trim_limit: Option<u64>,
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
}

impl Message {
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_max_length(mut self, max_length: u64) -> Self {
        self.stream_max_length = Some(max_length);
        self
    }

    pub fn with_min_id(mut self, min_id: impl Into<String>) -> Self {
        self.stream_min_id = Some(min_id.into());
        self
    }

    pub fn with_trim_limit(mut self, limit: u64) -> Self {
        self.trim_limit = Some(limit);
        self
    }

    /// ID explícito del mensaje, ignorando cadenas vacías
    pub fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}
