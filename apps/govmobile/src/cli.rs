//! # CLI Module
//!
//! Command-line entry points. `serve` runs the HTTP API; the others answer
//! portal questions offline from the seed and directory files.

use crate::api::{self, StartupError, load_directory};
use crate::config::{Config, ConfigError, ServeArgs};
use crate::store::{Seed, SeedIssue, StoreError};
use clap::{Parser, Subcommand};
use govmobile_core::catalog::{CatalogQuery, CatalogView};
use govmobile_core::directory::DirectoryError;
use govmobile_core::pricing::{Quote, eligible};
use govmobile_core::{CoreError, RoleLevel, User};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "govmobile",
    version,
    about = "Government mobile-device ordering portal"
)]
pub struct Cli {
    /// Verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// List the devices a role may order, as the device page would
    Catalog {
        #[arg(long, env = "GOVMOBILE_SEED", default_value = "data/seed.json")]
        seed: PathBuf,
        #[arg(long)]
        role: RoleLevel,
        /// Remaining budget
        #[arg(long, default_value_t = 0)]
        budget: u64,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// price | -price | model
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Price one device for a role and remaining budget
    Quote {
        #[arg(long, env = "GOVMOBILE_SEED", default_value = "data/seed.json")]
        seed: PathBuf,
        #[arg(long)]
        device: String,
        #[arg(long)]
        role: RoleLevel,
        #[arg(long, default_value_t = 0)]
        budget: u64,
    },

    /// Check whether a name may sign in through the directory
    Lookup {
        #[arg(long, env = "GOVMOBILE_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
        name: String,
    },

    /// Check a seed file for broken references and budgets
    CheckSeed {
        #[arg(env = "GOVMOBILE_SEED", default_value = "data/seed.json")]
        seed: PathBuf,
    },
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("device '{0}' not found")]
    UnknownDevice(String),

    #[error("seed has {} issue(s):\n{}", .0.len(), list_issues(.0))]
    SeedIssues(Vec<SeedIssue>),
}

fn list_issues(issues: &[SeedIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("  - {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let output = match cli.command {
        Command::Serve(args) => return cmd_serve(&args).await,
        Command::Catalog {
            seed,
            role,
            budget,
            search,
            brand,
            category,
            sort,
            json,
        } => {
            let query = CatalogQuery::parse(
                search.as_deref(),
                brand.as_deref(),
                category.as_deref(),
                sort.as_deref(),
            )?;
            cmd_catalog(&seed, role, budget, &query, json)?
        }
        Command::Quote {
            seed,
            device,
            role,
            budget,
        } => cmd_quote(&seed, &device, role, budget)?,
        Command::Lookup { data_dir, name } => cmd_lookup(&data_dir, &name)?,
        Command::CheckSeed { seed } => cmd_check_seed(&seed)?,
    };
    println!("{output}");
    Ok(())
}

pub async fn cmd_serve(args: &ServeArgs) -> Result<(), CliError> {
    let config = Config::from_args(args)?;
    api::serve(config).await?;
    Ok(())
}

/// A user with just the attributes pricing and eligibility look at.
fn quote_user(role: RoleLevel, budget: u64) -> User {
    User::new("cli", "", "")
        .with_role(role)
        .with_budget(budget, budget)
}

pub fn cmd_catalog(
    seed: &Path,
    role: RoleLevel,
    budget: u64,
    query: &CatalogQuery,
    json: bool,
) -> Result<String, CliError> {
    let seed = Seed::load(seed)?;
    let view = CatalogView::build(seed.devices, &quote_user(role, budget), query);

    if json {
        return Ok(serde_json::to_string_pretty(&view)?);
    }

    let mut out = String::new();
    for card in &view.devices {
        let d = &card.device;
        let _ = writeln!(
            out,
            "{:<10} {:<24} {:>6}  fee {:>6}  {}",
            d.brand, d.model, d.price, card.upgrade_cost, d.availability
        );
    }
    out.push_str(&view.summary());
    Ok(out)
}

pub fn cmd_quote(
    seed: &Path,
    device_id: &str,
    role: RoleLevel,
    budget: u64,
) -> Result<String, CliError> {
    let seed = Seed::load(seed)?;
    let device = seed
        .devices
        .iter()
        .find(|d| d.id == device_id)
        .ok_or_else(|| CliError::UnknownDevice(device_id.to_string()))?;
    let user = quote_user(role, budget);
    let quote = Quote::for_device(device, &user);

    let mut out = format!("{} {}\n", device.brand, device.model);
    let _ = writeln!(out, "price:             {}", quote.price);
    let _ = writeln!(out, "monthly cost:      {}", quote.monthly_cost);
    let _ = writeln!(out, "covered by budget: {}", quote.covered_by_budget);
    let _ = writeln!(out, "upgrade fee:       {}", quote.upgrade_fee);
    let _ = write!(out, "total:             {}", quote.total_cost);
    if !eligible(device, &user) {
        let _ = write!(out, "\nnot eligible for role '{role}'");
    }
    Ok(out)
}

pub fn cmd_lookup(data_dir: &Path, name: &str) -> Result<String, CliError> {
    let directory = load_directory(data_dir)?;
    let identity = directory.authorize(name.trim())?;

    let mut out = format!(
        "{}: employee, signs in as {}",
        identity.customer.name,
        identity.login_email()
    );
    if let Some(employee) = &identity.employee {
        let role = employee
            .role_level
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        let _ = write!(
            out,
            "\nERP: {} / {} / role {role}",
            employee.department.as_deref().unwrap_or("-"),
            employee.job_title.as_deref().unwrap_or("-"),
        );
    }
    Ok(out)
}

pub fn cmd_check_seed(seed_path: &Path) -> Result<String, CliError> {
    let seed = Seed::load(seed_path)?;
    let issues = seed.check();
    if !issues.is_empty() {
        return Err(CliError::SeedIssues(issues));
    }
    Ok(format!(
        "seed OK: {} devices, {} users, {} orders",
        seed.devices.len(),
        seed.users.len(),
        seed.orders.len()
    ))
}
