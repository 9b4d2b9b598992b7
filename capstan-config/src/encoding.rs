//! Auto-detecting decoder for encoded override blobs
//!
//! Overrides arrive either base64-encoded (the web layer's preference) or
//! percent-encoded (shell-friendly). Base64 is tried first with a strict
//! engine; silent fallback to the raw input is deliberately not offered —
//! when both schemes fail, the error carries both underlying reasons.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::trace;

use crate::error::{ConfigError, ConfigResult};

/// Stateless decoder; pure function of its input
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingDetector;

impl EncodingDetector {
    pub fn new() -> Self {
        Self
    }

    /// Decode an override blob into JSON text.
    ///
    /// Callers must not pass empty input; overrides that are absent or
    /// blank skip the decode step entirely.
    pub fn auto_detect_and_decode(&self, input: &str) -> ConfigResult<String> {
        if input.trim().is_empty() {
            return Err(ConfigError::Decode(
                "encoded input cannot be null or empty".to_string(),
            ));
        }

        let base64_failure = match self.try_base64(input) {
            Ok(decoded) => {
                trace!("override decoded as base64");
                return Ok(decoded);
            }
            Err(reason) => reason,
        };

        match self.try_url(input) {
            Ok(decoded) => {
                trace!("override decoded as percent-encoding");
                Ok(decoded)
            }
            Err(url_failure) => Err(ConfigError::Decode(format!(
                "input is neither valid base64 nor URL-encoded: base64: {}; url: {}",
                base64_failure, url_failure
            ))),
        }
    }

    fn try_base64(&self, input: &str) -> Result<String, String> {
        let bytes = BASE64
            .decode(input.trim())
            .map_err(|e| format!("invalid base64: {e}"))?;
        String::from_utf8(bytes).map_err(|e| format!("decoded bytes are not UTF-8: {e}"))
    }

    fn try_url(&self, input: &str) -> Result<String, String> {
        // A percent-decode that cannot change anything is not a decode.
        if !input.contains('%') {
            return Err("input contains no percent-encoded sequences".to_string());
        }
        urlencoding::decode(input)
            .map(|cow| cow.into_owned())
            .map_err(|e| format!("decoded bytes are not UTF-8: {e}"))
    }
}
