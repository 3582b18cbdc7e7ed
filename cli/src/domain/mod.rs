//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, or `std::process`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod renewal;
pub mod target;

pub use config::RenewerConfig;
pub use error::{ConfigError, RenewalError, TargetError, exit_code_for};
pub use renewal::{ArchiveInfo, RenewalReport, Step};
pub use target::RenewalTarget;
