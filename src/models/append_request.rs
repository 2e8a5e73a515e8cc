use std::collections::BTreeMap;

use crate::models::FieldValue;

/// Estrategia de recorte efectiva para un XADD.
///
/// MAXLEN y MINID son mutuamente excluyentes por llamada.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrimPolicy {
    #[default]
    None,
    MaxLen(u64),
    MinId(String),
}

/// Comando XADD ya resuelto, listo para enviarse a Redis
#[derive(Debug, Clone, PartialEq)]
pub struct AppendRequest {
    pub stream: String,
    /// `None` => Redis genera el ID (`*`)
    pub id: Option<String>,
    pub values: BTreeMap<String, FieldValue>,
    pub trim: TrimPolicy,
    pub approximate: bool,
    /// Solo se aplica cuando hay recorte
    pub limit: Option<u64>,
}

impl AppendRequest {
    /// Construye `XADD <stream> [MAXLEN|MINID [~] <umbral>] [LIMIT <n>] <id|*> <campo> <valor> ...`
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.stream);

        let threshold_kind = match &self.trim {
            TrimPolicy::None => None,
            TrimPolicy::MaxLen(max_len) => Some(("MAXLEN", max_len.to_string())),
            TrimPolicy::MinId(min_id) => Some(("MINID", min_id.clone())),
        };

        if let Some((kind, threshold)) = threshold_kind {
            cmd.arg(kind);
            if self.approximate {
                cmd.arg("~");
            }
            cmd.arg(threshold);
            if let Some(limit) = self.limit {
                cmd.arg("LIMIT").arg(limit);
            }
        }

        cmd.arg(self.id.as_deref().unwrap_or("*"));

        for (field, value) in &self.values {
            cmd.arg(field).arg(value);
        }

        cmd
    }
}
