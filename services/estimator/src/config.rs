//! Configuration for the estimator service
//!
//! Loaded from an optional TOML file, then `ESTIMATOR_*` environment
//! variables (e.g. `ESTIMATOR_RPC_URL`), then command-line overrides.
//! Zero timeouts fall back to their defaults.

use crate::engine::EngineConfig;
use amm::{FeeRate, DEFAULT_SCRATCH_CAPACITY};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:1337";
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Read when no path is given explicitly and the file exists
pub const DEFAULT_CONFIG_PATH: &str = "config/estimator.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// JSON-RPC endpoint of the chain node
    #[serde(default)]
    pub rpc_url: String,

    /// HTTP bind address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Grace period for in-flight requests on shutdown
    #[serde(default = "default_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Overall budget for one estimate request
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Budget for a single contract call
    #[serde(default = "default_timeout_ms")]
    pub call_timeout_ms: u64,

    #[serde(default = "default_fee_numerator")]
    pub fee_numerator: u32,

    #[serde(default = "default_fee_denominator")]
    pub fee_denominator: u32,

    #[serde(default = "default_scratch_pool_size")]
    pub scratch_pool_size: usize,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_fee_numerator() -> u32 {
    FeeRate::UNISWAP_V2.numerator()
}

fn default_fee_denominator() -> u32 {
    FeeRate::UNISWAP_V2.denominator()
}

fn default_scratch_pool_size() -> usize {
    DEFAULT_SCRATCH_CAPACITY
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            listen_addr: default_listen_addr(),
            shutdown_timeout_ms: DEFAULT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            call_timeout_ms: DEFAULT_TIMEOUT_MS,
            fee_numerator: default_fee_numerator(),
            fee_denominator: default_fee_denominator(),
            scratch_pool_size: DEFAULT_SCRATCH_CAPACITY,
        }
    }
}

impl EstimatorConfig {
    /// Explicit path if given, otherwise `default` when that file exists
    pub fn resolve_path(explicit: Option<PathBuf>, default: &Path) -> Option<PathBuf> {
        explicit.or_else(|| default.is_file().then(|| default.to_path_buf()))
    }

    /// Load and validate configuration from `path` (if given) with
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_sources(path)?.validated()
    }

    /// Read file and environment sources without validating, so callers
    /// can apply further overrides first
    pub fn from_sources(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix("ESTIMATOR").try_parsing(true));

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Check required fields and apply defaults for zero timeouts
    pub fn validated(mut self) -> Result<Self> {
        if self.rpc_url.trim().is_empty() {
            bail!("rpc_url is required");
        }
        for timeout in [
            &mut self.shutdown_timeout_ms,
            &mut self.request_timeout_ms,
            &mut self.call_timeout_ms,
        ] {
            if *timeout == 0 {
                *timeout = DEFAULT_TIMEOUT_MS;
            }
        }
        self.fee_rate()?;
        self.socket_addr()?;
        Ok(self)
    }

    pub fn fee_rate(&self) -> Result<FeeRate> {
        FeeRate::new(self.fee_numerator, self.fee_denominator).context("Invalid fee configuration")
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.listen_addr))
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        Ok(EngineConfig {
            fee: self.fee_rate()?,
            scratch_pool_size: self.scratch_pool_size,
        })
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_applies_defaults() {
        let file = write_config(r#"rpc_url = "http://localhost:8545""#);
        let config = EstimatorConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.listen_addr, "0.0.0.0:1337");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.fee_rate().unwrap(), FeeRate::UNISWAP_V2);
    }

    #[test]
    fn test_load_reads_all_fields() {
        let file = write_config(
            r#"
            rpc_url = "https://polygon-rpc.com"
            listen_addr = "127.0.0.1:8080"
            shutdown_timeout_ms = 2000
            request_timeout_ms = 8000
            call_timeout_ms = 1500
            fee_numerator = 9975
            fee_denominator = 10000
            scratch_pool_size = 8
            "#,
        );
        let config = EstimatorConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(2));
        assert_eq!(config.request_timeout(), Duration::from_secs(8));
        assert_eq!(config.call_timeout(), Duration::from_millis(1500));
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.fee, FeeRate::new(9975, 10000).unwrap());
        assert_eq!(engine.scratch_pool_size, 8);
    }

    #[test]
    fn test_zero_timeouts_fall_back_to_defaults() {
        let config = EstimatorConfig {
            rpc_url: "http://localhost:8545".to_string(),
            call_timeout_ms: 0,
            shutdown_timeout_ms: 0,
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_rpc_url_required() {
        let err = EstimatorConfig::default().validated().unwrap_err();
        assert!(err.to_string().contains("rpc_url"));
    }

    #[test]
    fn test_invalid_fee_rejected() {
        let config = EstimatorConfig {
            rpc_url: "http://localhost:8545".to_string(),
            fee_numerator: 1001,
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_from_sources_defers_validation() {
        let file = write_config(r#"listen_addr = "127.0.0.1:9000""#);
        let mut config = EstimatorConfig::from_sources(Some(file.path())).unwrap();
        assert!(config.rpc_url.is_empty());

        config.rpc_url = "http://localhost:8545".to_string();
        let config = config.validated().unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        let default = write_config(r#"rpc_url = "http://localhost:8545""#);
        let explicit = PathBuf::from("/etc/estimator.toml");
        assert_eq!(
            EstimatorConfig::resolve_path(Some(explicit.clone()), default.path()),
            Some(explicit)
        );
    }

    #[test]
    fn test_resolve_path_falls_back_to_existing_default() {
        let default = write_config(r#"rpc_url = "http://localhost:8545""#);
        assert_eq!(
            EstimatorConfig::resolve_path(None, default.path()),
            Some(default.path().to_path_buf())
        );
        assert_eq!(
            EstimatorConfig::resolve_path(None, Path::new("/nonexistent/estimator.toml")),
            None
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = EstimatorConfig::load(Some(Path::new("/nonexistent/estimator.toml")));
        assert!(result.is_err());
    }
}
