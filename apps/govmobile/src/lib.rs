//! # GovMobile Library
//!
//! This library exposes the portal's modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod portal;
pub mod store;

// Re-export govmobile_core for convenience
pub use govmobile_core;
