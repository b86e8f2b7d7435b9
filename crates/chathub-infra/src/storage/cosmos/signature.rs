//! Master-key request signing and connection string parsing for Cosmos DB.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chathub_types::error::{ConfigError, RepositoryError};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const CONNECTION_STRING_FIELD: &str = "chat_store.cosmos.connection_string";

/// Endpoint and master key parsed from `AccountEndpoint=...;AccountKey=...;`.
pub struct CosmosConnection {
    pub endpoint: String,
    key: SecretString,
}

impl CosmosConnection {
    pub fn parse(connection_string: &str) -> Result<Self, ConfigError> {
        let mut endpoint = None;
        let mut key = None;

        for part in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((name, value)) = part.split_once('=') else {
                return Err(invalid(format!("malformed segment '{}'", redact_segment(part))));
            };
            match name.trim().to_ascii_lowercase().as_str() {
                "accountendpoint" => endpoint = Some(value.trim().trim_end_matches('/').to_string()),
                // Keys are base64 and may end in '=' padding, so split only on the first '='.
                "accountkey" => key = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let endpoint = endpoint
            .filter(|e| !e.is_empty())
            .ok_or_else(|| invalid("AccountEndpoint is missing".to_string()))?;
        let key = key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| invalid("AccountKey is missing".to_string()))?;

        STANDARD
            .decode(&key)
            .map_err(|_| invalid("AccountKey is not valid base64".to_string()))?;

        Ok(Self {
            endpoint,
            key: SecretString::from(key),
        })
    }

    /// Authorization header value for one request.
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> Result<String, RepositoryError> {
        authorization_token(self.key.expose_secret(), verb, resource_type, resource_link, date)
    }
}

impl std::fmt::Debug for CosmosConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosConnection")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid {
        field: CONNECTION_STRING_FIELD,
        message,
    }
}

fn redact_segment(segment: &str) -> &str {
    segment.split('=').next().unwrap_or("")
}

/// Build the URL-encoded `type=master&ver=1.0&sig=...` token.
///
/// The signed payload is `verb\nresourceType\nresourceLink\ndate\n\n` with
/// verb, resource type and date lowercased. `key` is the base64 master key.
pub(crate) fn authorization_token(
    key: &str,
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String, RepositoryError> {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );

    let key_bytes = STANDARD
        .decode(key)
        .map_err(|e| RepositoryError::Connection(format!("invalid account key: {e}")))?;
    let mut mac = HmacSha256::new_from_slice(&key_bytes)
        .map_err(|e| RepositoryError::Connection(format!("invalid account key: {e}")))?;
    mac.update(payload.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let token = format!("type=master&ver=1.0&sig={signature}");
    Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
}

/// RFC 1123 date used in the `x-ms-date` header.
pub(crate) fn request_date(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
