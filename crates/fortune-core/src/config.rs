use std::time::Duration;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::signature::ProxyVerifier;

const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-5";
const DEFAULT_TIMEOUT_SECS: u64 = 45;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("SHOPIFY_API_SECRET must be set (or DEV_SKIP_PROXY_VERIFY=true for local development)")]
    MissingSecret,
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Which model to ask, and with what credential.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl LlmSettings {
    /// Ollama runs locally and needs no key; every other provider does.
    pub fn is_configured(&self) -> bool {
        !self.provider.is_empty()
            && !self.model.is_empty()
            && (self.provider == "ollama" || !self.api_key.is_empty())
    }
}

/// Process-wide configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct FortuneConfig {
    pub verifier: ProxyVerifier,
    unlock_codes: Vec<String>,
    pub llm: LlmSettings,
    pub generation_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl FortuneConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let skip = get("DEV_SKIP_PROXY_VERIFY").as_deref() == Some("true");
        let verifier = if skip {
            ProxyVerifier::bypass()
        } else {
            ProxyVerifier::new(get("SHOPIFY_API_SECRET").ok_or(ConfigError::MissingSecret)?)
        };

        let unlock_codes = get("UNLOCK_CODES")
            .map(|raw| parse_unlock_codes(&raw))
            .unwrap_or_default();

        let llm = LlmSettings {
            provider: get("FORTUNE_LLM_PROVIDER").unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            api_key: get("FORTUNE_LLM_API_KEY")
                .or_else(|| get("OPENAI_API_KEY"))
                .unwrap_or_default(),
            model: get("FORTUNE_LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        let generation_timeout = match get("FORTUNE_GENERATION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|v| (1..=300).contains(v))
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    key: "FORTUNE_GENERATION_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            verifier,
            unlock_codes,
            llm,
            generation_timeout,
            host: get("FORTUNE_BIND_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn unlock_code_count(&self) -> usize {
        self.unlock_codes.len()
    }

    /// Constant-time check of `code` against every configured unlock code.
    pub fn is_unlock_code(&self, code: &str) -> bool {
        let mut found = false;
        for known in &self.unlock_codes {
            if known.len() == code.len() && bool::from(known.as_bytes().ct_eq(code.as_bytes())) {
                found = true;
            }
        }
        found
    }
}

fn parse_unlock_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
