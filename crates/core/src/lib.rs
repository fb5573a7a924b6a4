//! Core types for the dms-gui store
//!
//! This crate contains the pieces shared by the storage layer and the
//! binary: version ordering, settings and constants.

pub mod constants;
mod env_config;
mod error;
mod settings;
mod version;

pub use env_config::*;
pub use error::*;
pub use settings::*;
pub use version::*;
