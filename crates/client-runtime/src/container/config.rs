//! # Client Configuration
//!
//! Unified configuration for the RPC layer, payload mapping, signing and
//! transaction building. Every subsystem gets its own plain value derived
//! from here; nothing is read from globals after construction.
//!
//! ## Sources
//!
//! - `Default` (public main-network nodes)
//! - TOML through [`ClientConfig::load`] / [`ClientConfig::parse`]
//! - `SC_*` environment overrides through [`ClientConfig::from_env`]
//!
//! ## Config File Format
//!
//! ```toml
//! response_timeout_ms = 2000
//! default_account = "steemj"
//!
//! [[endpoints]]
//! uri = "wss://steemd.steemit.com"
//!
//! [[endpoints]]
//! uri = "ws://127.0.0.1:8090"
//! secure = false
//! ```

use sc_01_communication::{
    CommunicationConfig, Endpoint, EndpointDirectory, MapperError, PayloadMapper,
    DEFAULT_DATE_TIME_PATTERN,
};
use serde::{Deserialize, Serialize};
use shared_types::{AccountName, ChainId, TypeError};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Longest expiration the node accepts, in seconds.
pub const MAX_TRANSACTION_EXPIRATION_SECS: u32 = 3_600;

/// One candidate node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub uri: String,
    /// Inferred from the scheme when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

impl EndpointConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            secure: None,
        }
    }

    pub fn to_endpoint(&self) -> Endpoint {
        match self.secure {
            Some(secure) => Endpoint::new(self.uri.clone(), secure),
            None => Endpoint::from_uri(self.uri.clone()),
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Nodes tried in order; failures advance to the next one.
    pub endpoints: Vec<EndpointConfig>,
    /// Reply wait per call. 0 waits forever.
    pub response_timeout_ms: u64,
    /// Idle limit of a socket session. 0 disables.
    pub socket_timeout_ms: u64,
    /// `None` reconnects forever.
    pub max_reconnect_attempts: Option<u32>,
    pub reconnect_backoff_ms: u64,
    pub strict_response_ids: bool,
    /// strftime pattern of timestamps inside payloads.
    pub date_time_pattern: String,
    /// `UTC` or a fixed offset such as `+02:00`.
    pub time_zone: String,
    /// Hex chain id mixed into every signing digest.
    pub chain_id: String,
    /// Account used by the convenience operations.
    pub default_account: Option<String>,
    pub transaction_expiration_secs: u32,
    /// Written into the metadata of posts and comments.
    pub app_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                EndpointConfig {
                    uri: "wss://steemd.steemit.com".to_string(),
                    secure: Some(true),
                },
                EndpointConfig {
                    uri: "wss://gtg.steem.house:8090".to_string(),
                    secure: Some(true),
                },
            ],
            response_timeout_ms: 1_000,
            socket_timeout_ms: 0,
            max_reconnect_attempts: None,
            reconnect_backoff_ms: 0,
            strict_response_ids: false,
            date_time_pattern: DEFAULT_DATE_TIME_PATTERN.to_string(),
            time_zone: "UTC".to_string(),
            chain_id: ChainId::default().to_hex(),
            default_account: None,
            transaction_expiration_secs: 60,
            app_name: concat!("steem-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys keep their
    /// defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `SC_*` environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SC_ENDPOINTS`: comma separated node URIs
    /// - `SC_RESPONSE_TIMEOUT_MS`, `SC_SOCKET_TIMEOUT_MS`
    /// - `SC_MAX_RECONNECT_ATTEMPTS`, `SC_RECONNECT_BACKOFF_MS`
    /// - `SC_STRICT_RESPONSE_IDS`: `true` / `1`
    /// - `SC_CHAIN_ID`: 64 hex characters
    /// - `SC_DEFAULT_ACCOUNT`
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `SC_*` overrides looked up through `lookup`. Values that do not
    /// parse leave the current setting in place.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(list) = lookup("SC_ENDPOINTS") {
            let endpoints: Vec<_> = list
                .split(',')
                .map(str::trim)
                .filter(|uri| !uri.is_empty())
                .map(EndpointConfig::new)
                .collect();
            if !endpoints.is_empty() {
                self.endpoints = endpoints;
            }
        }
        if let Some(ms) = lookup("SC_RESPONSE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.response_timeout_ms = ms;
        }
        if let Some(ms) = lookup("SC_SOCKET_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.socket_timeout_ms = ms;
        }
        if let Some(max) = lookup("SC_MAX_RECONNECT_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.max_reconnect_attempts = Some(max);
        }
        if let Some(ms) = lookup("SC_RECONNECT_BACKOFF_MS").and_then(|v| v.parse().ok()) {
            self.reconnect_backoff_ms = ms;
        }
        if let Some(strict) = lookup("SC_STRICT_RESPONSE_IDS") {
            self.strict_response_ids = strict.eq_ignore_ascii_case("true") || strict == "1";
        }
        if let Some(chain_id) = lookup("SC_CHAIN_ID") {
            self.chain_id = chain_id;
        }
        if let Some(account) = lookup("SC_DEFAULT_ACCOUNT") {
            self.default_account = Some(account);
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::Invalid("at least one endpoint is required".into()));
        }
        for endpoint in &self.endpoints {
            let scheme_ok = ["ws://", "wss://"]
                .iter()
                .any(|scheme| endpoint.uri.starts_with(scheme));
            if !scheme_ok {
                return Err(ConfigError::Invalid(format!(
                    "endpoint {} must use ws:// or wss://",
                    endpoint.uri
                )));
            }
        }

        if self.transaction_expiration_secs == 0
            || self.transaction_expiration_secs > MAX_TRANSACTION_EXPIRATION_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "transaction_expiration_secs must be within 1..={MAX_TRANSACTION_EXPIRATION_SECS}"
            )));
        }

        self.chain_id()?;
        self.payload_mapper()?;
        self.default_account()?;
        Ok(())
    }

    pub fn communication(&self) -> CommunicationConfig {
        CommunicationConfig {
            response_timeout_ms: self.response_timeout_ms,
            socket_timeout_ms: self.socket_timeout_ms,
            max_reconnect_attempts: self.max_reconnect_attempts,
            reconnect_backoff_ms: self.reconnect_backoff_ms,
            strict_response_ids: self.strict_response_ids,
        }
    }

    pub fn endpoint_directory(&self) -> EndpointDirectory {
        EndpointDirectory::new(self.endpoints.iter().map(EndpointConfig::to_endpoint).collect())
    }

    pub fn payload_mapper(&self) -> Result<PayloadMapper, ConfigError> {
        Ok(PayloadMapper::new(&self.date_time_pattern, &self.time_zone)?)
    }

    pub fn chain_id(&self) -> Result<ChainId, ConfigError> {
        self.chain_id
            .parse()
            .map_err(|e: TypeError| ConfigError::Invalid(format!("chain_id: {e}")))
    }

    pub fn default_account(&self) -> Result<Option<AccountName>, ConfigError> {
        self.default_account
            .as_deref()
            .map(|name| {
                AccountName::new(name).map_err(|e| ConfigError::Invalid(format!("default_account: {e}")))
            })
            .transpose()
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid payload mapping: {0}")]
    Mapper(#[from] MapperError),
}
