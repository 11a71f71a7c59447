//! Defines the configuration settings for the lead-sleuth application.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then command-line arguments and environment variables, then a
//! validation pass that repairs nonsense values. The final `Config` is
//! built once in `main` and passed into the pipeline explicitly.

use crate::models::{DEFAULT_PROMPT_TEMPLATE, ScrapeSettings};
use crate::relay::DEFAULT_RELAY_ENDPOINTS;
use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_MODEL_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL_NAME: &str = "meta-llama/llama-3.1-8b-instruct:free";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Command line options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub(crate) struct CommonArgs {
    /// Path to configuration file (TOML format)
    #[arg(long, env = "LEAD_SLEUTH_CONFIG")]
    pub config_file: Option<String>,

    /// Delay between listings in milliseconds
    #[arg(long, env = "LEAD_SLEUTH_DELAY_MS")]
    pub delay_ms: Option<u64>,

    /// Settle delay between harvest passes in milliseconds
    #[arg(long, env = "LEAD_SLEUTH_SETTLE_MS")]
    pub settle_ms: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "LEAD_SLEUTH_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// User agent string for HTTP requests
    #[arg(long, env = "LEAD_SLEUTH_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Bearer credential for the language-model collaborator
    #[arg(long, env = "LEAD_SLEUTH_API_KEY")]
    pub api_key: Option<String>,

    /// Model identifier sent to the language-model endpoint
    #[arg(long, env = "LEAD_SLEUTH_MODEL")]
    pub model: Option<String>,

    /// Chat-completions endpoint of the language-model collaborator
    #[arg(long, env = "LEAD_SLEUTH_MODEL_ENDPOINT")]
    pub model_endpoint: Option<String>,

    /// Comma-separated list of relay endpoints for website fetches
    #[arg(long, env = "LEAD_SLEUTH_RELAYS")]
    pub relays: Option<String>,

    /// Disable the language-model fallback states
    #[arg(long, default_value = "false", env = "LEAD_SLEUTH_NO_MODEL")]
    pub no_model: bool,

    /// Disable auto-scroll on live surfaces
    #[arg(long, default_value = "false")]
    pub no_auto_scroll: bool,

    /// Prompt template for the generation state ({businessName},
    /// {businessType}, {location} placeholders)
    #[arg(long, env = "LEAD_SLEUTH_PROMPT")]
    pub prompt_template: Option<String>,
}

/// TOML configuration file structure.
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    network: Option<NetworkConfig>,
    session: Option<SessionConfig>,
    model: Option<ModelConfig>,
    relay: Option<RelayConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct NetworkConfig {
    request_timeout: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct SessionConfig {
    delay_ms: Option<u64>,
    settle_ms: Option<u64>,
    auto_scroll: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
struct ModelConfig {
    endpoint: Option<String>,
    name: Option<String>,
    api_key: Option<String>,
    fallback_enabled: Option<bool>,
    prompt_template: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct RelayConfig {
    endpoints: Option<Vec<String>>,
}

/// Application configuration settings.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Per-session scrape settings handed to the session context.
    pub settings: ScrapeSettings,
    /// Delay between harvest passes after expanding collapsed content.
    pub settle_delay: Duration,
    /// Timeout for individual HTTP requests.
    pub request_timeout: Duration,
    /// User agent string to use for HTTP requests.
    pub user_agent: String,
    /// Relay endpoints tried in order for cross-origin fetches.
    pub relay_endpoints: Vec<String>,
    /// Chat-completions endpoint of the language-model collaborator.
    pub model_endpoint: String,
    /// Model identifier sent with every completion request.
    pub model_name: String,
    /// Bearer credential; absent or implausibly short means the model
    /// states are skipped.
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            settings: ScrapeSettings::default(),
            settle_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            relay_endpoints: DEFAULT_RELAY_ENDPOINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            model_endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            api_key: None,
        }
    }
}

fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", file_path);
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::info!("Loaded configuration from {}", file_path);
    Ok(config)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    if let Some(network) = &file_config.network {
        if let Some(timeout) = network.request_timeout {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(user_agent) = &network.user_agent {
            config.user_agent = user_agent.clone();
        }
    }

    if let Some(session) = &file_config.session {
        if let Some(delay) = session.delay_ms {
            config.settings.delay_ms = delay;
        }
        if let Some(settle) = session.settle_ms {
            config.settle_delay = Duration::from_millis(settle);
        }
        if let Some(auto_scroll) = session.auto_scroll {
            config.settings.auto_scroll = auto_scroll;
        }
    }

    if let Some(model) = &file_config.model {
        if let Some(endpoint) = &model.endpoint {
            config.model_endpoint = endpoint.clone();
        }
        if let Some(name) = &model.name {
            config.model_name = name.clone();
        }
        if let Some(api_key) = &model.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(enabled) = model.fallback_enabled {
            config.settings.model_fallback = enabled;
        }
        if let Some(template) = &model.prompt_template {
            config.settings.prompt_template = template.clone();
        }
    }

    if let Some(relay) = &file_config.relay {
        if let Some(endpoints) = &relay.endpoints {
            config.relay_endpoints = endpoints.clone();
        }
    }
}

fn apply_cli_args(config: &mut Config, args: &CommonArgs) {
    if let Some(delay) = args.delay_ms {
        config.settings.delay_ms = delay;
    }
    if let Some(settle) = args.settle_ms {
        config.settle_delay = Duration::from_millis(settle);
    }
    if let Some(timeout) = args.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = user_agent.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(model) = &args.model {
        config.model_name = model.clone();
    }
    if let Some(endpoint) = &args.model_endpoint {
        config.model_endpoint = endpoint.clone();
    }
    if let Some(relays) = &args.relays {
        config.relay_endpoints = relays
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if args.no_model {
        config.settings.model_fallback = false;
    }
    if args.no_auto_scroll {
        config.settings.auto_scroll = false;
    }
    if let Some(template) = &args.prompt_template {
        config.settings.prompt_template = template.clone();
    }
}

fn validate_config(config: &mut Config) {
    if config.settle_delay > Duration::from_secs(10) {
        config.settle_delay = Duration::from_secs(10);
        tracing::warn!("Settle delay exceeded 10s. Clamping to 10s.");
    }

    if config.relay_endpoints.is_empty() {
        config.relay_endpoints = DEFAULT_RELAY_ENDPOINTS
            .iter()
            .map(|s| s.to_string())
            .collect();
        tracing::warn!("Relay endpoint list was empty. Restoring defaults.");
    }

    if config.settings.prompt_template.trim().is_empty() {
        config.settings.prompt_template = DEFAULT_PROMPT_TEMPLATE.to_string();
        tracing::warn!("Prompt template was empty. Restoring default.");
    } else if !config.settings.prompt_template.contains("{businessName}") {
        tracing::warn!("Prompt template has no {{businessName}} placeholder.");
    }

    if config.request_timeout < Duration::from_secs(1) {
        config.request_timeout = Duration::from_secs(1);
        tracing::warn!("Request timeout below 1s. Clamping to 1s.");
    }
}

/// Builds the final configuration from defaults, the configuration file,
/// and command-line arguments, in that order.
pub(crate) fn build_config(args: &CommonArgs) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(file_path) = &args.config_file {
        let file_config = load_config_file(file_path)?;
        apply_file_config(&mut config, &file_config);
    } else {
        for path in ["./lead-sleuth.toml", "./config.toml"] {
            if Path::new(path).exists() {
                match load_config_file(path) {
                    Ok(file_config) => {
                        apply_file_config(&mut config, &file_config);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load configuration from {}: {}", path, e);
                    }
                }
            }
        }
    }

    apply_cli_args(&mut config, args);
    validate_config(&mut config);

    tracing::debug!("Final configuration: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = build_config(&CommonArgs::default()).unwrap();
        assert_eq!(config.settings.delay_ms, 1500);
        assert!(config.settings.auto_scroll);
        assert!(config.settings.model_fallback);
        assert_eq!(config.relay_endpoints.len(), 3);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let args = CommonArgs {
            delay_ms: Some(200),
            no_model: true,
            relays: Some("https://relay.one/, ,https://relay.two/".to_string()),
            ..CommonArgs::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.settings.delay_ms, 200);
        assert!(!config.settings.model_fallback);
        assert_eq!(
            config.relay_endpoints,
            vec![
                "https://relay.one/".to_string(),
                "https://relay.two/".to_string()
            ]
        );
    }

    #[test]
    fn test_validation_repairs_values() {
        let args = CommonArgs {
            settle_ms: Some(60_000),
            request_timeout: Some(0),
            prompt_template: Some("   ".to_string()),
            ..CommonArgs::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.settle_delay, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.settings.prompt_template, DEFAULT_PROMPT_TEMPLATE);
    }
}
