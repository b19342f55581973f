pub mod client;
pub mod conditions;
pub mod config;
pub mod events;
pub mod readiness;
pub mod resource;

/// Default user agent - automatically uses the package version
///
/// All clients are created with `client::new(Some(USER_AGENT))` so API
/// server audit logs can attribute the watcher's reads.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
