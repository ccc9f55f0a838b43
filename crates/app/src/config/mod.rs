//! Client configuration module

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Args;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use rusty_money::iso::{self, Currency};
use thiserror::Error;

use crate::{
    api::HttpCartApi,
    snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore},
    sync::SyncSettings,
};

pub mod logging;

pub use logging::{LogFormat, LoggingConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The currency code is not an ISO 4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// The session token cannot be sent as a header.
    #[error("session token is not a valid header value")]
    InvalidSessionToken,

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    /// The snapshot directory could not be opened.
    #[error("failed to open snapshot directory")]
    Snapshots(#[source] SnapshotError),
}

/// Cart service and sync settings.
#[derive(Debug, Args)]
pub struct ClientConfig {
    /// Cart service base URL
    #[arg(long, env = "CART_API_URL")]
    pub api_url: String,

    /// Bearer token identifying the session to the cart service
    #[arg(long, env = "CART_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Quiet period before the cart is reloaded, in milliseconds
    #[arg(long, env = "CART_RELOAD_QUIET_PERIOD_MS", default_value_t = 250_u64)]
    pub quiet_period_ms: u64,

    /// Directory for cart snapshots; snapshots stay in memory when omitted
    #[arg(long, env = "CART_SNAPSHOT_DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// ISO 4217 currency prices are shown in
    #[arg(long, env = "CART_CURRENCY", default_value = "KRW")]
    pub currency: String,
}

impl ClientConfig {
    /// Sync engine settings.
    #[must_use]
    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            quiet_period: Duration::from_millis(self.quiet_period_ms),
        }
    }

    /// Display currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not a known ISO currency.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        iso::find(&self.currency.to_uppercase())
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }

    /// HTTP cart client, carrying the session token when one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header or the client cannot be built.
    pub fn api(&self) -> Result<HttpCartApi, ConfigError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &self.session_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_err| ConfigError::InvalidSessionToken)?;
            value.set_sensitive(true);

            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(HttpCartApi::with_client(self.api_url.clone(), http))
    }

    /// Snapshot store: file-backed when a directory is configured, in memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot directory cannot be created.
    pub fn snapshot_store(&self) -> Result<Arc<dyn SnapshotStore>, ConfigError> {
        match &self.snapshot_dir {
            Some(dir) => Ok(Arc::new(
                FileSnapshotStore::open(dir).map_err(ConfigError::Snapshots)?,
            )),
            None => Ok(Arc::new(MemorySnapshotStore::new())),
        }
    }
}
