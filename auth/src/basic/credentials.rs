use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::errors::BasicAuthError;

const SCHEME: &str = "Basic ";

/// Credentials carried by a `Basic` authorization header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

impl BasicCredentials {
    /// Decode credentials from a raw `Authorization` header value.
    ///
    /// The payload is `base64(email:password)`; only the first `:` separates
    /// the two parts, so passwords may themselves contain colons.
    ///
    /// # Arguments
    /// * `header` - Header value, e.g. `Basic Ym9iQGV4YW1wbGUuY29tOnB3ZA==`
    ///
    /// # Returns
    /// Decoded email and password
    ///
    /// # Errors
    /// * `MissingScheme` - Header does not start with `Basic `
    /// * `InvalidEncoding` - Payload is not base64 or not UTF-8
    /// * `MissingSeparator` - Decoded payload has no `:`
    pub fn from_header(header: &str) -> Result<Self, BasicAuthError> {
        let encoded = header
            .strip_prefix(SCHEME)
            .ok_or(BasicAuthError::MissingScheme)?;

        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| BasicAuthError::InvalidEncoding(e.to_string()))?;
        let decoded =
            String::from_utf8(bytes).map_err(|e| BasicAuthError::InvalidEncoding(e.to_string()))?;

        let (email, password) = decoded
            .split_once(':')
            .ok_or(BasicAuthError::MissingSeparator)?;

        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}
