use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::errors::TokenError;

/// Number of random bytes behind every token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generate an opaque random token.
///
/// Draws `TOKEN_BYTES` from the operating system RNG and encodes them as
/// URL-safe base64 without padding, so the value can travel in cookies and
/// form fields unchanged.
///
/// # Returns
/// 43 character token string
///
/// # Errors
/// * `GenerationFailed` - Operating system RNG is unavailable
pub fn generate_token() -> Result<String, TokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::GenerationFailed(e.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
