use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

pub const CREDENTIAL_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8097";
const DEFAULT_GENERATION_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_PROMPT_LEN: usize = 500;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    pub api_key: Option<String>,
    pub generation_url: String,
    pub request_timeout: Duration,
    pub max_prompt_len: usize,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            api_key: cli_api_key,
            generation_url: cli_generation_url,
            request_timeout_secs: cli_request_timeout_secs,
            max_prompt_len: cli_max_prompt_len,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            http_bind: file_http_bind,
            api_key: file_api_key,
            generation_url: file_generation_url,
            request_timeout_secs: file_request_timeout_secs,
            max_prompt_len: file_max_prompt_len,
        } = file_config;

        let http_bind_address = cli_http_bind.or(file_http_bind).unwrap_or_else(|| {
            DEFAULT_HTTP_BIND
                .parse()
                .expect("default bind address valid")
        });

        // Blank credentials count as absent so the per-request error fires
        // instead of an authentication failure from upstream.
        let api_key = cli_api_key
            .or(file_api_key)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let generation_url = cli_generation_url
            .or(file_generation_url)
            .unwrap_or_else(|| DEFAULT_GENERATION_URL.to_string());

        let request_timeout = Duration::from_secs(
            cli_request_timeout_secs
                .or(file_request_timeout_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        let max_prompt_len = cli_max_prompt_len
            .or(file_max_prompt_len)
            .unwrap_or(DEFAULT_MAX_PROMPT_LEN);

        Ok(Self {
            http_bind_address,
            api_key,
            generation_url,
            request_timeout,
            max_prompt_len,
        })
    }

    /// Fail-fast validation of values the server cannot run with. A missing
    /// credential is deliberately not checked here: it is a recoverable
    /// configuration error surfaced through the generation envelope.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.max_prompt_len >= 1,
            "max prompt length must be at least 1"
        );
        anyhow::ensure!(
            self.request_timeout >= Duration::from_secs(1),
            "request timeout must be at least one second"
        );
        anyhow::ensure!(
            self.generation_url.starts_with("http://") || self.generation_url.starts_with("https://"),
            "generation URL {:?} is not an http(s) endpoint",
            self.generation_url
        );
        Ok(())
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "pagecraft", about = "Prompt-to-page generation server", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "PAGECRAFT_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address for the API server"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = CREDENTIAL_ENV,
        value_name = "KEY",
        hide_env_values = true,
        help = "Credential for the generation API"
    )]
    pub api_key: Option<String>,

    #[arg(
        long,
        env = "PAGECRAFT_GENERATION_URL",
        value_name = "URL",
        help = "Generation API endpoint (overridable for testing)"
    )]
    pub generation_url: Option<String>,

    #[arg(
        long,
        env = "PAGECRAFT_REQUEST_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Deadline for one upstream generation call",
        value_parser = clap::value_parser!(u64)
    )]
    pub request_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "PAGECRAFT_MAX_PROMPT_LEN",
        value_name = "N",
        help = "Maximum accepted prompt length in characters",
        value_parser = clap::value_parser!(usize)
    )]
    pub max_prompt_len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    api_key: Option<String>,
    generation_url: Option<String>,
    request_timeout_secs: Option<u64>,
    max_prompt_len: Option<usize>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(args: CliArgs) -> ServerConfig {
        ServerConfig::from_args(args).expect("config builds")
    }

    #[test]
    fn defaults_apply_without_flags() {
        let config = config_from(CliArgs::default());
        assert_eq!(config.http_bind_address.to_string(), DEFAULT_HTTP_BIND);
        assert_eq!(config.generation_url, DEFAULT_GENERATION_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_prompt_len, 500);
        assert!(!config.has_credential());
    }

    #[test]
    fn blank_credential_counts_as_absent() {
        let config = config_from(CliArgs {
            api_key: Some("   ".to_string()),
            ..CliArgs::default()
        });
        assert!(!config.has_credential());

        let config = config_from(CliArgs {
            api_key: Some(" secret ".to_string()),
            ..CliArgs::default()
        });
        assert_eq!(config.api_key(), Some("secret"));
    }

    #[test]
    fn validate_rejects_nonsense_values() {
        let mut config = config_from(CliArgs::default());
        config.max_prompt_len = 0;
        assert!(config.validate().is_err());

        let mut config = config_from(CliArgs::default());
        config.generation_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        assert!(config_from(CliArgs::default()).validate().is_ok());
    }

    #[test]
    fn cli_overrides_defaults() {
        let config = config_from(CliArgs {
            generation_url: Some("http://127.0.0.1:9/generate".to_string()),
            request_timeout_secs: Some(5),
            max_prompt_len: Some(100),
            ..CliArgs::default()
        });
        assert_eq!(config.generation_url, "http://127.0.0.1:9/generate");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_prompt_len, 100);
    }
}
