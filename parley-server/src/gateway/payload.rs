use crate::error::GatewayError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

/// Убрать префикс `data:<mime>;base64,`. Обычный base64 возвращается как есть.
pub fn strip_data_uri(input: &str) -> &str {
    if !input.starts_with("data:") {
        return input;
    }
    match input.find(',') {
        Some(idx) => &input[idx + 1..],
        None => input,
    }
}

/// Декодировать base64 медиаданные, отбрасывая пустые и слишком большие.
pub fn decode_media(input: &str, max_bytes: usize) -> Result<Bytes, GatewayError> {
    let encoded = strip_data_uri(input.trim());
    if encoded.is_empty() {
        return Err(GatewayError::InvalidPayload("empty media payload".to_owned()));
    }
    if encoded.len() / 4 * 3 > max_bytes {
        return Err(GatewayError::InvalidPayload(format!(
            "media payload exceeds {max_bytes} bytes"
        )));
    }

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| GatewayError::InvalidPayload(format!("bad base64: {e}")))?;
    Ok(Bytes::from(decoded))
}
