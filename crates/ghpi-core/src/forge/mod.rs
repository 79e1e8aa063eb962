//! Forge adapters for code hosting platforms.

/// GitHub REST API adapter.
pub mod github;
/// Bounded retries with exponential backoff.
pub mod retry;
/// Shared traits and record types for forge adapters.
pub mod traits;

pub use retry::RetryPolicy;
pub use traits::{Asset, Forge, Release};
