//! Configuration for the `linear-labels` binary.
//!
//! Only the binary reads the environment; library code takes explicit values.

use std::env;

use anyhow::{anyhow, Context, Result};

use crate::client::{LinearClient, LINEAR_API_URL};
use crate::sync::LabelPolicy;

/// Environment-derived settings.
#[derive(Clone)]
pub struct Config {
    /// API key or OAuth token (`LINEAR_API_KEY`, falling back to `LINEAR_OAUTH_TOKEN`).
    pub api_key: Option<String>,
    /// GraphQL endpoint (`LINEAR_API_URL`).
    pub api_url: String,
    /// Policy for labels outside the taxonomy (`LINEAR_LABEL_POLICY`).
    pub label_policy: LabelPolicy,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("label_policy", &self.label_policy)
            .finish()
    }
}

impl Config {
    /// Load from the process environment.
    ///
    /// # Errors
    /// Returns an error if `LINEAR_LABEL_POLICY` is set to an unknown value.
    pub fn from_env() -> Result<Self> {
        let label_policy = match non_empty("LINEAR_LABEL_POLICY") {
            Some(raw) => raw
                .parse::<LabelPolicy>()
                .map_err(|e: String| anyhow!(e))
                .context("invalid LINEAR_LABEL_POLICY")?,
            None => LabelPolicy::default(),
        };

        Ok(Self {
            api_key: non_empty("LINEAR_API_KEY").or_else(|| non_empty("LINEAR_OAUTH_TOKEN")),
            api_url: non_empty("LINEAR_API_URL").unwrap_or_else(|| LINEAR_API_URL.to_string()),
            label_policy,
        })
    }

    /// Build a client, failing if no credentials are configured.
    ///
    /// # Errors
    /// Returns an error if no API key is set or the HTTP client cannot be built.
    pub fn client(&self) -> Result<LinearClient> {
        let key = self
            .api_key
            .as_deref()
            .context("LINEAR_API_KEY (or LINEAR_OAUTH_TOKEN) is not set")?;
        LinearClient::with_url(key, &self.api_url).context("failed to build Linear client")
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
