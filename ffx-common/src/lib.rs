//! # Francoflex Common Library
//!
//! Shared code for Francoflex services including:
//! - Common error type
//! - Bootstrap configuration loading (TOML file, environment, defaults)
//! - Credential resolution with source tracking

pub mod config;
pub mod error;

pub use error::{Error, Result};
