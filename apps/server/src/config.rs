//! Environment-derived server configuration.
//!
//! Built once in `main` and injected through `AppState`; nothing here is
//! cached at module level.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEnvironment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api_env: ApiEnvironment,
    pub auth_bypass_dev: bool,
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let api_env = match read_env("API_ENV").to_lowercase().as_str() {
            "prod" => ApiEnvironment::Prod,
            _ => ApiEnvironment::Dev,
        };

        Self {
            api_env,
            auth_bypass_dev: parse_bool(
                &read_env("AUTH_BYPASS_DEV"),
                api_env == ApiEnvironment::Dev,
            ),
            bind_addr: read_env_or("BIND_ADDR", "0.0.0.0:8787"),
            allowed_origins: parse_allowed_origins(&read_env("ALLOWED_ORIGINS")),
        }
    }

    /// Whether the sanitized `x-user-id` header stands in for a verified
    /// identity (dev tooling only).
    pub fn allows_dev_auth(&self) -> bool {
        self.auth_bypass_dev && self.api_env == ApiEnvironment::Dev
    }
}

fn read_env(name: &str) -> String {
    std::env::var(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn read_env_or(name: &str, default: &str) -> String {
    let value = read_env(name);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    if value.is_empty() {
        default
    } else {
        value.eq_ignore_ascii_case("true")
    }
}

fn parse_allowed_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
