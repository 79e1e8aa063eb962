//! Core library for ghpi.
//!
//! Collects release assets from a forge, builds the in-memory
//! [`PackageIndex`] and renders it as a static simple index.

pub mod collector;
pub mod error;
pub mod forge;
pub mod index;
pub mod io;
pub mod render;
pub mod repo;
pub mod run;

#[cfg(test)]
mod testing;

pub use collector::{Collection, ReleaseCollector};
pub use error::{CollectWarning, ConfigError, ForgeError, OutputWriteFailure, RunError};
pub use index::{PackageIndex, PackageIndexBuilder};
pub use render::{RenderConfig, RenderSummary, UrlTemplate, render};
pub use repo::{Repository, load_repositories, parse_repositories};
pub use run::{RunSummary, run};

/// User Agent string for forge requests
pub const USER_AGENT: &str = concat!("ghpi/", env!("CARGO_PKG_VERSION"));
