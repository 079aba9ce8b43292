//! Settings tokens
//!
//! A token is the canonical JSON form of [`WireSettings`] in URL-safe base64
//! without padding. It is neither signed nor encrypted: anyone holding a token
//! can read the settings back, which is fine because settings carry no secret.

use crate::error::{InvalidTokenError, ValidationError};
use crate::settings::{Settings, WireSettings};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Serialize settings into a token usable as a path segment or query value
pub fn encode(settings: &Settings) -> String {
    // Serializing plain strings, numbers and unit enums cannot fail
    let json = serde_json::to_vec(&settings.to_wire()).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Reverse [`encode`], re-validating every field.
///
/// Fails closed: anything that is not exactly a well-formed token is rejected.
pub fn decode(token: &str) -> Result<Settings, InvalidTokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(token.as_bytes())?;
    let json = String::from_utf8(bytes)?;
    let wire: WireSettings = serde_json::from_str(&json)
        .map_err(|e| ValidationError::Schema(e.to_string()))?;
    Ok(Settings::try_from(wire)?)
}
