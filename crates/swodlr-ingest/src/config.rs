//! Configuration management
//!
//! Deployment parameters come from a [`ParameterSource`]: the SSM parameter
//! store under [`SSM_PARAMETER_PATH`] in production, or `SWODLR_<name>`
//! environment variables everywhere else. [`IngestSettings`] turns those
//! parameters into typed settings for the submission and polling stages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use swodlr_common::notification::{AcceptRule, IdSource, ParserConfig};
use tracing::{debug, info};

use crate::error::{IngestError, IngestResult};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Parameter Source Constants
// ============================================================================

/// Environment variable selecting the parameter source.
pub const ENV_SELECTOR: &str = "SWODLR_ENV";

/// Value of [`ENV_SELECTOR`] that reads from SSM. Also the default.
pub const PROD_ENV: &str = "prod";

/// SSM path holding the service parameters.
pub const SSM_PARAMETER_PATH: &str = "/service/swodlr/ingest/";

/// Prefix of environment variables read by [`EnvParameters`].
pub const ENV_PREFIX: &str = "SWODLR_";

/// Default bound on concurrent SDS calls per stage.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Read-only lookup of deployment parameters by short name
/// (e.g. `sds_host`).
pub trait ParameterSource: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Parameters from `SWODLR_<name>` environment variables
#[derive(Debug, Clone)]
pub struct EnvParameters {
    prefix: String,
}

impl EnvParameters {
    /// Load `.env` if present and read variables with the default prefix.
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        Self::with_prefix(ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for EnvParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSource for EnvParameters {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}{}", self.prefix, name))
            .ok()
            .filter(|value| !value.is_empty())
    }
}

/// Parameters snapshotted from the SSM parameter store
#[derive(Debug, Clone, Default)]
pub struct SsmParameters {
    values: HashMap<String, String>,
}

impl SsmParameters {
    /// Fetch every parameter under `path`, decrypted, following pagination.
    /// Names are stored without the path prefix.
    pub async fn load(client: &aws_sdk_ssm::Client, path: &str) -> IngestResult<Self> {
        let mut values = HashMap::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = client
                .get_parameters_by_path()
                .path(path)
                .with_decryption(true)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    IngestError::Config(format!(
                        "SSM GetParametersByPath failed: {}",
                        aws_sdk_ssm::error::DisplayErrorContext(&e)
                    ))
                })?;

            for parameter in response.parameters() {
                if let (Some(name), Some(value)) = (parameter.name(), parameter.value()) {
                    let short = name.strip_prefix(path).unwrap_or(name);
                    values.insert(short.to_string(), value.to_string());
                }
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = values.len(), path, "Loaded SSM parameters");
        Ok(Self { values })
    }

    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl ParameterSource for SsmParameters {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Pick the parameter source from `SWODLR_ENV`: SSM for `prod` (the
/// default), environment variables otherwise.
pub async fn load_parameters(
    sdk_config: &aws_config::SdkConfig,
) -> IngestResult<Box<dyn ParameterSource>> {
    dotenvy::dotenv().ok();
    let env = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| PROD_ENV.to_string());

    if env == PROD_ENV {
        info!(path = SSM_PARAMETER_PATH, "Loading parameters from SSM");
        let client = aws_sdk_ssm::Client::new(sdk_config);
        Ok(Box::new(SsmParameters::load(&client, SSM_PARAMETER_PATH).await?))
    } else {
        info!(env = %env, "Loading parameters from environment");
        Ok(Box::new(EnvParameters::new()))
    }
}

/// Connection settings for the SDS job API
#[derive(Clone)]
pub struct SdsConfig {
    pub host: String,
    pub username: String,
    pub password: Option<String>,
    /// PCM release tag, the suffix of the ingest job type
    pub release_tag: String,
    /// Fixed job queue; resolved from the SDS when unset
    pub queue: Option<String>,
}

impl std::fmt::Debug for SdsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdsConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("release_tag", &self.release_tag)
            .field("queue", &self.queue)
            .finish()
    }
}

/// Settings for the submission and polling stages
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub ingest_table_name: String,
    pub available_tiles_table_name: String,
    pub sds: SdsConfig,
    pub stepfunction_arn: Option<String>,
    pub parser: ParserConfig,
    pub max_concurrency: usize,
}

impl IngestSettings {
    /// Assemble settings, failing on the first missing required parameter.
    pub fn load(params: &dyn ParameterSource) -> IngestResult<Self> {
        let settings = Self {
            ingest_table_name: required(params, "ingest_table_name")?,
            available_tiles_table_name: required(params, "available_tiles_table_name")?,
            sds: SdsConfig {
                host: required(params, "sds_host")?,
                username: required(params, "sds_username")?,
                password: params.get("sds_password"),
                release_tag: required(params, "sds_pcm_release_tag")?,
                queue: params.get("sds_ingest_queue"),
            },
            stepfunction_arn: params.get("stepfunction_arn"),
            parser: parser_config(params)?,
            max_concurrency: match params.get("max_concurrency") {
                Some(value) => value.parse().map_err(|_| {
                    IngestError::Config(format!("max_concurrency must be a positive integer, got '{}'", value))
                })?,
                None => DEFAULT_MAX_CONCURRENCY,
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> IngestResult<()> {
        if self.max_concurrency == 0 {
            return Err(IngestError::Config("max_concurrency must be at least 1".to_string()));
        }

        if !self.sds.host.starts_with("http://") && !self.sds.host.starts_with("https://") {
            return Err(IngestError::Config(format!(
                "sds_host must be an http(s) URL, got '{}'",
                self.sds.host
            )));
        }

        if self.parser.accepted_extensions.is_empty() {
            return Err(IngestError::Config("accepted_extensions must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Read a parameter that has no default
pub fn required(params: &dyn ParameterSource, name: &str) -> IngestResult<String> {
    params
        .get(name)
        .ok_or_else(|| IngestError::Config(format!("missing required parameter '{}'", name)))
}

fn parser_config(params: &dyn ParameterSource) -> IngestResult<ParserConfig> {
    let mut parser = ParserConfig::default();

    if let Some(list) = params.get("accepted_extensions") {
        parser = parser.with_extensions(&list);
    }
    if let Some(selection) = params.get("file_selection") {
        parser.primary = selection.parse::<AcceptRule>().map_err(|_| {
            IngestError::Config(format!("file_selection must be 'extension' or 'type', got '{}'", selection))
        })?;
    }
    if let Some(source) = params.get("granule_id_source") {
        parser.id_source = source.parse::<IdSource>().map_err(|_| {
            IngestError::Config(format!("granule_id_source must be 'identifier' or 'filename', got '{}'", source))
        })?;
    }

    Ok(parser)
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = ServerConfig {
            host: std::env::var("SWODLR_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: std::env::var("SWODLR_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            shutdown_timeout_secs: std::env::var("SWODLR_SHUTDOWN_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> SsmParameters {
        SsmParameters::from_map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ingest_table_name", "swodlr-ingest"),
            ("available_tiles_table_name", "swodlr-tiles"),
            ("sds_host", "https://sds.example.com"),
            ("sds_username", "swodlr"),
            ("sds_password", "secret"),
            ("sds_pcm_release_tag", "2.0.0"),
        ]
    }

    #[test]
    fn test_load_defaults() {
        let settings = IngestSettings::load(&params(&base())).unwrap();

        assert_eq!(settings.ingest_table_name, "swodlr-ingest");
        assert_eq!(settings.sds.release_tag, "2.0.0");
        assert_eq!(settings.sds.password.as_deref(), Some("secret"));
        assert!(settings.sds.queue.is_none());
        assert!(settings.stepfunction_arn.is_none());
        assert_eq!(settings.parser, ParserConfig::default());
        assert_eq!(settings.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn test_missing_required_names_the_key() {
        let pairs: Vec<_> = base().into_iter().filter(|(k, _)| *k != "sds_host").collect();
        let err = IngestSettings::load(&params(&pairs)).unwrap_err();
        assert!(err.to_string().contains("sds_host"));
    }

    #[test]
    fn test_parser_overrides() {
        let mut pairs = base();
        pairs.push(("accepted_extensions", "nc, .h5"));
        pairs.push(("file_selection", "type"));
        pairs.push(("granule_id_source", "filename"));
        pairs.push(("max_concurrency", "2"));

        let settings = IngestSettings::load(&params(&pairs)).unwrap();
        assert_eq!(settings.parser.accepted_extensions, vec!["nc", "h5"]);
        assert_eq!(settings.parser.primary, AcceptRule::DataType);
        assert_eq!(settings.parser.id_source, IdSource::Filename);
        assert_eq!(settings.max_concurrency, 2);
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let mut pairs = base();
        pairs.push(("max_concurrency", "0"));
        assert!(IngestSettings::load(&params(&pairs)).is_err());
    }

    #[test]
    fn test_rejects_non_http_host() {
        let pairs: Vec<_> = base()
            .into_iter()
            .map(|(k, v)| if k == "sds_host" { (k, "sds.example.com") } else { (k, v) })
            .collect();
        assert!(IngestSettings::load(&params(&pairs)).is_err());
    }

    #[test]
    fn test_password_is_redacted() {
        let settings = IngestSettings::load(&params(&base())).unwrap();
        let rendered = format!("{:?}", settings.sds);
        assert!(!rendered.contains("secret"));
    }
}
