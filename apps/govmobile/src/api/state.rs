//! Shared server state and its construction from [`Config`].

use crate::config::{BackendConfig, CRM_FILE, Config, ERP_FILE};
use crate::error::AppError;
use crate::portal::Portal;
use crate::store::{DataStore, DemoStore, InMemoryStore, PlatformStore, Seed, Session, StoreError};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use govmobile_core::directory::{CrmExport, Directory, ErpExport};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Why the server could not start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
    /// Page services over the configured backend.
    pub live: Portal,
    /// Page services over the demo backend, when demo sessions are on.
    pub demo: Option<Portal>,
    pub directory: Arc<Directory>,
    pub auth_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(
        live: Portal,
        demo: Option<Portal>,
        directory: Directory,
        auth_rate_per_minute: NonZeroU32,
    ) -> Self {
        Self {
            live,
            demo,
            directory: Arc::new(directory),
            auth_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(auth_rate_per_minute))),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let live: Arc<dyn DataStore> = match &config.backend {
            BackendConfig::Memory { seed } => Arc::new(
                InMemoryStore::new(load_seed(seed)?).with_session_ttl(config.session_ttl),
            ),
            BackendConfig::Platform { base_url, app_id } => {
                info!(%base_url, %app_id, "using hosted platform backend");
                Arc::new(PlatformStore::new(base_url.as_str(), app_id.as_str())?)
            }
        };

        let demo = match config.demo_delay {
            Some(delay) => {
                let catalog = InMemoryStore::new(load_seed(&config.demo_seed)?);
                let store = DemoStore::connect(catalog, delay)
                    .await?
                    .with_session_ttl(config.session_ttl);
                let store: Arc<dyn DataStore> = Arc::new(store);
                Some(Portal::new(store))
            }
            None => None,
        };

        let directory = load_directory(&config.data_dir)?;
        info!(
            backend = live.backend(),
            demo = demo.is_some(),
            directory_customers = directory.customer_count(),
            "state initialized"
        );

        Ok(Self::new(
            Portal::new(live),
            demo,
            directory,
            config.auth_rate_per_minute,
        ))
    }

    /// The page services a session belongs to.
    pub fn portal(&self, session: &Session) -> Result<&Portal, AppError> {
        if session.is_demo() {
            self.demo.as_ref().ok_or(AppError::Unauthorized)
        } else {
            Ok(&self.live)
        }
    }
}

/// The CRM and ERP exports under `data_dir`. Missing files are empty exports.
pub fn load_directory(data_dir: &Path) -> Result<Directory, StartupError> {
    Ok(Directory::new(
        load_json_or_default::<CrmExport>(&data_dir.join(CRM_FILE))?,
        load_json_or_default::<ErpExport>(&data_dir.join(ERP_FILE))?,
    ))
}

fn load_seed(path: &Path) -> Result<Seed, StartupError> {
    let seed: Seed = load_json_or_default(path)?;
    info!(
        path = %path.display(),
        devices = seed.devices.len(),
        users = seed.users.len(),
        orders = seed.orders.len(),
        "seed loaded"
    );
    Ok(seed)
}

/// Parse a JSON file, or fall back to the empty document if it is absent.
fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StartupError> {
    if !path.exists() {
        warn!(path = %path.display(), "file not found, starting empty");
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| StartupError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StartupError::Parse {
        path: path.display().to_string(),
        source,
    })
}
