//! Resolución de las opciones de recorte de un mensaje.
//!
//! Cada campo se resuelve de forma independiente: el valor del mensaje si está
//! definido (distinto de cero / no vacío), si no el valor por defecto del productor.
//! Si el MAXLEN efectivo es mayor que cero, el MINID se descarta.

use crate::models::{AppendRequest, Message, TrimPolicy};
use crate::services::ProducerOptions;

fn first_non_zero(value: Option<u64>, default: u64) -> u64 {
    value.filter(|v| *v > 0).unwrap_or(default)
}

fn first_non_empty<'a>(value: Option<&'a str>, default: Option<&'a str>) -> Option<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .or_else(|| default.filter(|v| !v.is_empty()))
}

/// Calcula la política de recorte efectiva
pub fn resolve_trim(message: &Message, options: &ProducerOptions) -> TrimPolicy {
    let max_len = first_non_zero(message.stream_max_length, options.stream_max_length);
    let min_id = first_non_empty(
        message.stream_min_id.as_deref(),
        options.stream_min_id.as_deref(),
    );

    match (max_len, min_id) {
        (max_len, _) if max_len > 0 => TrimPolicy::MaxLen(max_len),
        (_, Some(min_id)) => TrimPolicy::MinId(min_id.to_string()),
        _ => TrimPolicy::None,
    }
}

/// Construye el XADD efectivo para un mensaje. Función pura: no modifica el mensaje.
pub fn resolve(message: &Message, options: &ProducerOptions) -> AppendRequest {
    let trim = resolve_trim(message, options);
    let limit = match trim {
        TrimPolicy::None => None,
        _ => Some(first_non_zero(message.trim_limit, options.trim_limit)).filter(|l| *l > 0),
    };

    AppendRequest {
        stream: message.stream.clone(),
        id: message.explicit_id().map(str::to_string),
        values: message.values.clone(),
        trim,
        approximate: options.use_approximate,
        limit,
    }
}
