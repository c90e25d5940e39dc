//! Server configuration.
//!
//! Every setting is a `serve` flag with a `GOVMOBILE_*` environment fallback.
//! [`Config::from_args`] validates the combination.

use crate::store::demo::DEFAULT_DEMO_DELAY;
use crate::store::sessions::DEFAULT_SESSION_TTL;
use clap::{ArgAction, Args, ValueEnum};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// File names inside the data directory.
pub const SEED_FILE: &str = "seed.json";
pub const CRM_FILE: &str = "crm.json";
pub const ERP_FILE: &str = "erp.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Seeded in-memory store.
    Memory,
    /// The hosted platform.
    Platform,
}

/// Flags of `govmobile serve`.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "GOVMOBILE_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Data backend
    #[arg(long, env = "GOVMOBILE_BACKEND", value_enum, default_value_t = Backend::Memory)]
    pub backend: Backend,

    /// Seed document (defaults to <data-dir>/seed.json)
    #[arg(long, env = "GOVMOBILE_SEED")]
    pub seed: Option<PathBuf>,

    /// Directory holding seed.json, crm.json and erp.json
    #[arg(long, env = "GOVMOBILE_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Base URL of the hosted platform
    #[arg(long, env = "GOVMOBILE_PLATFORM_URL")]
    pub platform_url: Option<String>,

    /// Application id on the hosted platform
    #[arg(long, env = "GOVMOBILE_PLATFORM_APP_ID")]
    pub platform_app_id: Option<String>,

    /// Offer demo sessions
    #[arg(long, env = "GOVMOBILE_DEMO", default_value_t = true, action = ArgAction::Set)]
    pub demo: bool,

    /// How long a demo order placement takes, in milliseconds
    #[arg(long, env = "GOVMOBILE_DEMO_DELAY_MS", default_value_t = DEFAULT_DEMO_DELAY.as_millis() as u64)]
    pub demo_delay_ms: u64,

    /// Sign-in attempts allowed per minute, across all clients
    #[arg(long, env = "GOVMOBILE_AUTH_RATE_PER_MINUTE", default_value_t = 30)]
    pub auth_rate_per_minute: u32,

    /// How long a session stays valid after sign-in, in minutes
    #[arg(
        long,
        env = "GOVMOBILE_SESSION_TTL_MINUTES",
        default_value_t = DEFAULT_SESSION_TTL.as_secs() / 60
    )]
    pub session_ttl_minutes: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the platform backend needs --platform-url and --platform-app-id")]
    MissingPlatform,

    #[error("--auth-rate-per-minute must be at least 1")]
    ZeroRate,

    #[error("--session-ttl-minutes must be at least 1")]
    ZeroSessionTtl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Memory { seed: PathBuf },
    Platform { base_url: String, app_id: String },
}

/// Validated server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    pub backend: BackendConfig,
    pub data_dir: PathBuf,
    /// Seed for the demo catalog.
    pub demo_seed: PathBuf,
    /// `None` when demo sessions are off.
    pub demo_delay: Option<Duration>,
    pub auth_rate_per_minute: NonZeroU32,
    /// Lifetime of sessions issued by the in-memory and demo backends.
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_args(args: &ServeArgs) -> Result<Self, ConfigError> {
        let seed = args
            .seed
            .clone()
            .unwrap_or_else(|| args.data_dir.join(SEED_FILE));

        let backend = match args.backend {
            Backend::Memory => BackendConfig::Memory { seed: seed.clone() },
            Backend::Platform => {
                let base_url = non_blank(args.platform_url.as_deref());
                let app_id = non_blank(args.platform_app_id.as_deref());
                match (base_url, app_id) {
                    (Some(base_url), Some(app_id)) => BackendConfig::Platform { base_url, app_id },
                    _ => return Err(ConfigError::MissingPlatform),
                }
            }
        };

        Ok(Self {
            bind: args.bind,
            backend,
            data_dir: args.data_dir.clone(),
            demo_seed: seed,
            demo_delay: args
                .demo
                .then(|| Duration::from_millis(args.demo_delay_ms)),
            auth_rate_per_minute: NonZeroU32::new(args.auth_rate_per_minute)
                .ok_or(ConfigError::ZeroRate)?,
            session_ttl: match args.session_ttl_minutes {
                0 => return Err(ConfigError::ZeroSessionTtl),
                minutes => Duration::from_secs(minutes.saturating_mul(60)),
            },
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
