//! Request identity resolution.
//!
//! Token verification happens in front of this service; what remains here is
//! the sanitized `x-user-id` contract that the verified identity (or dev
//! tooling) arrives through.

use axum::http::HeaderMap;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Keep only URL-safe characters so a hostile header can't inject into
/// store document ids.
fn sanitize_user_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '@' | '-'))
        .collect()
}

pub fn resolve_user_id(headers: &HeaderMap, config: &ServerConfig) -> Result<String, ApiError> {
    if let Some(raw) = headers.get("x-user-id").and_then(|value| value.to_str().ok()) {
        let user_id = sanitize_user_id(raw.trim());
        if !user_id.is_empty() {
            return Ok(user_id);
        }
    }

    if config.allows_dev_auth() {
        return Err(ApiError::Unauthorized(
            "Missing x-user-id header (dev auth bypass is enabled).".to_string(),
        ));
    }

    Err(ApiError::Unauthorized(
        "Authentication is required.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiEnvironment;

    fn dev_config() -> ServerConfig {
        ServerConfig {
            api_env: ApiEnvironment::Dev,
            auth_bypass_dev: true,
            bind_addr: "127.0.0.1:0".to_string(),
            allowed_origins: Vec::new(),
        }
    }

    #[test]
    fn strips_unsafe_characters_from_user_id() {
        assert_eq!(sanitize_user_id("user/../1<script>"), "user..1script");
        assert_eq!(sanitize_user_id("google:123@example.com"), "google:123@example.com");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(resolve_user_id(&headers, &dev_config()).is_err());
    }

    #[test]
    fn fully_stripped_header_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "///".parse().unwrap());
        assert!(resolve_user_id(&headers, &dev_config()).is_err());
    }

    #[test]
    fn valid_header_resolves() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "user-1".parse().unwrap());
        assert_eq!(resolve_user_id(&headers, &dev_config()).unwrap(), "user-1");
    }
}
