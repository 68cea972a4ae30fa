//! Shared domain types for the Sunlog analytics core.

pub mod config;
pub mod exposure;
pub mod session;
pub mod skin;

mod errors;

pub use errors::{Result, SunlogError};
