//! Provider selection and credentials
//!
//! Supports two OpenAI-compatible providers:
//! 1. OpenRouter (OPENROUTER_API_KEY) - preferred when present
//! 2. OpenAI (OPENAI_API_KEY)
//!
//! `CODEX_MODEL` overrides the model for either provider.

use smith_core::{Result, SmithError};

pub const OPENROUTER_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "CODEX_MODEL";
pub const REFERER_ENV: &str = "HTTP_REFERER";
pub const TITLE_ENV: &str = "X_TITLE";

const DEFAULT_REFERER: &str = "https://github.com";
const DEFAULT_TITLE: &str = "GitHub Actions";

/// Supported chat-completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenRouter,
    OpenAi,
}

impl Provider {
    pub fn base_url(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "openai/gpt-4o",
            Provider::OpenAi => "gpt-4o",
        }
    }

    /// Environment variable holding this provider's key
    pub fn key_env(&self) -> &'static str {
        match self {
            Provider::OpenRouter => OPENROUTER_KEY_ENV,
            Provider::OpenAi => OPENAI_KEY_ENV,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenRouter => write!(f, "openrouter"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

/// An API key bound to the provider it belongs to
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub provider: Provider,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Resolve credentials through an environment lookup
///
/// Priority:
/// 1. OPENROUTER_API_KEY
/// 2. OPENAI_API_KEY
///
/// Empty values count as unset.
pub fn resolve_credentials<F>(lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    for provider in [Provider::OpenRouter, Provider::OpenAi] {
        if let Some(api_key) = lookup(provider.key_env()).filter(|k| !k.trim().is_empty()) {
            tracing::info!("Using {}", provider.key_env());
            return Ok(Credentials { provider, api_key });
        }
    }

    Err(SmithError::MissingCredentials)
}

/// Resolve credentials from the process environment
pub fn credentials_from_env() -> Result<Credentials> {
    resolve_credentials(|key| std::env::var(key).ok())
}

/// Everything needed to address one provider endpoint
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub credentials: Credentials,
    pub base_url: String,
    pub model: String,
    /// Extra request headers (OpenRouter attribution)
    pub headers: Vec<(String, String)>,
}

impl ProviderSettings {
    /// Build settings for resolved credentials, reading overrides via `lookup`
    pub fn resolve<F>(credentials: Credentials, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = credentials.provider;
        let model = lookup(MODEL_ENV)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let headers = match provider {
            Provider::OpenRouter => vec![
                (
                    "HTTP-Referer".to_string(),
                    lookup(REFERER_ENV).unwrap_or_else(|| DEFAULT_REFERER.to_string()),
                ),
                (
                    "X-Title".to_string(),
                    lookup(TITLE_ENV).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                ),
            ],
            Provider::OpenAi => Vec::new(),
        };

        Self {
            credentials,
            base_url: provider.base_url().to_string(),
            model,
            headers,
        }
    }

    /// Point requests at another OpenAI-compatible base URL
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }

    pub fn provider(&self) -> Provider {
        self.credentials.provider
    }

    /// Full URL of the chat-completions endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_openrouter_priority() {
        let creds = resolve_credentials(env(&[
            (OPENROUTER_KEY_ENV, "or-key"),
            (OPENAI_KEY_ENV, "oa-key"),
        ]))
        .unwrap();
        assert_eq!(creds.provider, Provider::OpenRouter);
        assert_eq!(creds.api_key, "or-key");
    }

    #[test]
    fn test_openai_fallback() {
        let creds = resolve_credentials(env(&[(OPENAI_KEY_ENV, "oa-key")])).unwrap();
        assert_eq!(creds.provider, Provider::OpenAi);
        assert_eq!(creds.api_key, "oa-key");
    }

    #[test]
    fn test_empty_key_counts_as_unset() {
        let creds =
            resolve_credentials(env(&[(OPENROUTER_KEY_ENV, ""), (OPENAI_KEY_ENV, "oa")])).unwrap();
        assert_eq!(creds.provider, Provider::OpenAi);
    }

    #[test]
    fn test_no_credentials() {
        let result = resolve_credentials(env(&[]));
        assert!(matches!(result, Err(SmithError::MissingCredentials)));
    }

    #[test]
    fn test_openrouter_settings_defaults() {
        let creds = Credentials {
            provider: Provider::OpenRouter,
            api_key: "k".to_string(),
        };
        let settings = ProviderSettings::resolve(creds, env(&[]));
        assert_eq!(settings.model, "openai/gpt-4o");
        assert_eq!(settings.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        assert!(settings
            .headers
            .contains(&("X-Title".to_string(), "GitHub Actions".to_string())));
        assert!(settings
            .headers
            .contains(&("HTTP-Referer".to_string(), "https://github.com".to_string())));
    }

    #[test]
    fn test_model_and_header_overrides() {
        let creds = Credentials {
            provider: Provider::OpenRouter,
            api_key: "k".to_string(),
        };
        let settings = ProviderSettings::resolve(
            creds,
            env(&[(MODEL_ENV, "anthropic/claude-3.5-sonnet"), (TITLE_ENV, "ci")]),
        );
        assert_eq!(settings.model, "anthropic/claude-3.5-sonnet");
        assert!(settings
            .headers
            .contains(&("X-Title".to_string(), "ci".to_string())));
    }

    #[test]
    fn test_openai_settings_have_no_extra_headers() {
        let creds = Credentials {
            provider: Provider::OpenAi,
            api_key: "k".to_string(),
        };
        let settings = ProviderSettings::resolve(creds, env(&[]));
        assert_eq!(settings.model, "gpt-4o");
        assert!(settings.headers.is_empty());
        assert_eq!(settings.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_base_url_override() {
        let creds = Credentials {
            provider: Provider::OpenRouter,
            api_key: "k".to_string(),
        };
        let settings = ProviderSettings::resolve(creds, env(&[]));
        let unchanged = settings.clone().with_base_url(Some("  "));
        assert_eq!(unchanged.base_url, "https://openrouter.ai/api/v1");

        let local = settings.with_base_url(Some("http://127.0.0.1:8080/v1/"));
        assert_eq!(local.endpoint(), "http://127.0.0.1:8080/v1/chat/completions");
        assert_eq!(local.provider(), Provider::OpenRouter);
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = Credentials {
            provider: Provider::OpenAi,
            api_key: "sk-secret".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("sk-secret"));
    }
}
