/// `load_config` module: resolves how the CLI reaches the Fundamento API.
///
/// Values come from command-line flags first, then from the process
/// environment (which `main` has already populated from `.env`), then from
/// built-in defaults. Only the API key has no default.
///
/// # Errors
/// A missing API key is the only failure. It surfaces as an `anyhow::Error`
/// at the CLI boundary with a message telling the user how to fix it.
use anyhow::{anyhow, Result};
use std::env;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://fundamento.cloud";
pub const BASE_URL_ENV: &str = "FUNDAMENTO_BASE_URL";
pub const API_KEY_ENV: &str = "FUNDAMENTO_API_KEY";

pub const MISSING_API_KEY: &str =
    "API key is required. Set FUNDAMENTO_API_KEY environment variable or use --token option.";

#[derive(Clone)]
pub struct ClientConfig {
    /// Without a trailing `/`.
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Resolve the client configuration from flags, then environment, then defaults.
pub fn load_config(token: Option<String>, base_url: Option<String>) -> Result<ClientConfig> {
    let api_key = non_empty(token)
        .or_else(|| non_empty(env::var(API_KEY_ENV).ok()))
        .ok_or_else(|| {
            error!(env = API_KEY_ENV, "No API key in flags or environment");
            anyhow!(MISSING_API_KEY)
        })?;

    let base_url = non_empty(base_url)
        .or_else(|| non_empty(env::var(BASE_URL_ENV).ok()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = base_url.trim_end_matches('/').to_string();

    info!(base_url = %base_url, "Resolved client configuration");
    debug!(api_key_len = api_key.len(), "API key present");
    Ok(ClientConfig { base_url, api_key })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
