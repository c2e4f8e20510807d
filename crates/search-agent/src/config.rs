//! Start-up configuration.
//!
//! Configuration is read once from the environment:
//! - `MODEL_API_KEY` (or `GROQ_API_KEY`): required, the model endpoint key.
//! - `SEARCH_API_KEY` (or `SERPER_API_KEY`): required, the web search key.
//! - `LOOKUP_TOKEN`: optional bearer token, only sent to an overridden
//!   encyclopedia or paper endpoint.
//! - `MODEL_BASE_URL`, `MODEL_NAME`: optional model endpoint overrides.
//! - `WIKIPEDIA_BASE_URL`, `ARXIV_BASE_URL`, `SEARCH_BASE_URL`: optional
//!   lookup endpoint overrides.
//!
//! Empty values count as unset.

use std::env;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};

use search_agent_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

const MODEL_API_KEY: [&str; 2] = ["MODEL_API_KEY", "GROQ_API_KEY"];
const SEARCH_API_KEY: [&str; 2] = ["SEARCH_API_KEY", "SERPER_API_KEY"];

/// Describes why the configuration could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set. Carries the preferred name.
    Missing(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "{var} environment variable is not set")
            }
        }
    }
}

impl StdError for ConfigError {}

/// Credentials and endpoints, immutable once loaded.
#[derive(Clone)]
pub struct Config {
    /// Key of the model endpoint.
    pub model_api_key: String,
    /// Overrides the model endpoint.
    pub model_base_url: Option<String>,
    /// Overrides the model name.
    pub model_name: Option<String>,
    /// Key of the web search service.
    pub search_api_key: String,
    /// Bearer token for overridden encyclopedia and paper endpoints.
    pub lookup_token: Option<String>,
    /// Overrides the encyclopedia endpoint.
    pub wikipedia_base_url: Option<String>,
    /// Overrides the paper endpoint.
    pub arxiv_base_url: Option<String>,
    /// Overrides the web search endpoint.
    pub search_base_url: Option<String>,
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if a required key is not set.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |vars: &[&str]| {
            vars.iter()
                .filter_map(|var| lookup(var))
                .map(|value| value.trim().to_owned())
                .find(|value| !value.is_empty())
        };

        let model_api_key = first(&MODEL_API_KEY)
            .ok_or(ConfigError::Missing(MODEL_API_KEY[0]))?;
        let search_api_key = first(&SEARCH_API_KEY)
            .ok_or(ConfigError::Missing(SEARCH_API_KEY[0]))?;

        Ok(Self {
            model_api_key,
            model_base_url: first(&["MODEL_BASE_URL"]),
            model_name: first(&["MODEL_NAME"]),
            search_api_key,
            lookup_token: first(&["LOOKUP_TOKEN"]),
            wikipedia_base_url: first(&["WIKIPEDIA_BASE_URL"]),
            arxiv_base_url: first(&["ARXIV_BASE_URL"]),
            search_base_url: first(&["SEARCH_BASE_URL"]),
        })
    }

    /// Builds the config of the model provider.
    pub fn model_config(&self) -> OpenAIConfig {
        let mut builder =
            OpenAIConfigBuilder::with_api_key(self.model_api_key.clone());
        if let Some(base_url) = &self.model_base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        if let Some(model) = &self.model_name {
            builder = builder.with_model(model.clone());
        }
        builder.build()
    }

    /// The token to send to the encyclopedia endpoint. The public endpoint
    /// never gets one.
    #[inline]
    pub fn wikipedia_token(&self) -> Option<&str> {
        self.wikipedia_base_url.as_ref().and(self.lookup_token.as_deref())
    }

    /// The token to send to the paper endpoint. The public endpoint never
    /// gets one.
    #[inline]
    pub fn arxiv_token(&self) -> Option<&str> {
        self.arxiv_base_url.as_ref().and(self.lookup_token.as_deref())
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model_api_key", &"<redacted>")
            .field("model_base_url", &self.model_base_url)
            .field("model_name", &self.model_name)
            .field("search_api_key", &"<redacted>")
            .field(
                "lookup_token",
                &self.lookup_token.as_ref().map(|_| "<redacted>"),
            )
            .field("wikipedia_base_url", &self.wikipedia_base_url)
            .field("arxiv_base_url", &self.arxiv_base_url)
            .field("search_base_url", &self.search_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<_, _> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_required_keys() {
        assert_eq!(
            load(&[("SEARCH_API_KEY", "s")]).unwrap_err(),
            ConfigError::Missing("MODEL_API_KEY")
        );
        assert_eq!(
            load(&[("MODEL_API_KEY", "m")]).unwrap_err(),
            ConfigError::Missing("SEARCH_API_KEY")
        );
        assert_eq!(
            load(&[("MODEL_API_KEY", "  "), ("SEARCH_API_KEY", "s")])
                .unwrap_err()
                .to_string(),
            "MODEL_API_KEY environment variable is not set"
        );
    }

    #[test]
    fn test_fallback_names() {
        let config = load(&[
            ("GROQ_API_KEY", "groq"),
            ("SERPER_API_KEY", "serper"),
            ("HF_TOKEN", "hf"),
            ("HUGGINGFACE_TOKEN", "hf"),
        ])
        .unwrap();
        assert_eq!(config.model_api_key, "groq");
        assert_eq!(config.search_api_key, "serper");
        assert_eq!(config.lookup_token, None);
        assert_eq!(config.model_base_url, None);

        let config = load(&[
            ("MODEL_API_KEY", "model"),
            ("GROQ_API_KEY", "groq"),
            ("SEARCH_API_KEY", "search"),
        ])
        .unwrap();
        assert_eq!(config.model_api_key, "model");
        assert_eq!(config.lookup_token, None);
    }

    #[test]
    fn test_token_only_for_overridden_endpoints() {
        let config = load(&[
            ("MODEL_API_KEY", "model"),
            ("SEARCH_API_KEY", "search"),
            ("LOOKUP_TOKEN", "lookup"),
        ])
        .unwrap();
        assert_eq!(config.lookup_token.as_deref(), Some("lookup"));
        assert_eq!(config.wikipedia_token(), None);
        assert_eq!(config.arxiv_token(), None);

        let config = load(&[
            ("MODEL_API_KEY", "model"),
            ("SEARCH_API_KEY", "search"),
            ("LOOKUP_TOKEN", "lookup"),
            ("ARXIV_BASE_URL", "http://localhost:8081"),
        ])
        .unwrap();
        assert_eq!(config.wikipedia_token(), None);
        assert_eq!(config.arxiv_token(), Some("lookup"));
    }

    #[test]
    fn test_model_config() {
        let config = load(&[
            ("MODEL_API_KEY", "model"),
            ("SEARCH_API_KEY", "search"),
            ("MODEL_BASE_URL", "http://localhost:8080/v1/"),
            ("MODEL_NAME", "tiny"),
        ])
        .unwrap();
        let model_config = config.model_config();
        assert_eq!(model_config.base_url(), "http://localhost:8080/v1");
        assert_eq!(model_config.model(), "tiny");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("MODEL_API_KEY", "model-secret"),
            ("SEARCH_API_KEY", "search-secret"),
            ("LOOKUP_TOKEN", "lookup-secret"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
    }
}
