//! Marker payload codec.
//!
//! # Invariants
//! - Encoded tokens only use `[A-Za-z0-9+/=]` and never wrap lines.
//! - `decode` never fails; malformed tokens decode to `""`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;

/// Encodes text into a token safe to embed inside a marker.
pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decodes a marker token back into text.
///
/// Best-effort: invalid alphabet, bad padding and non UTF-8 payloads all
/// yield an empty string.
pub fn decode(token: &str) -> String {
    let bytes = match STANDARD.decode(token) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(
                "event=marker_decode module=content status=error error_code=invalid_base64 token_len={} error={}",
                token.len(),
                err
            );
            return String::new();
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => {
            debug!(
                "event=marker_decode module=content status=error error_code=invalid_utf8 token_len={}",
                token.len()
            );
            String::new()
        }
    }
}
