//! Synchronization between the operations engine and an externally owned
//! board document.
//!
//! - [`normalize`]: alias-tolerant request parsing into typed operations
//! - [`adapter`]: [`SyncAdapter`], one read-execute-reconcile-write cycle
//! - [`reconcile`]: id remapping into the host's id space
//! - [`host`]: the [`HostDocument`] port and [`InMemoryHost`]
//! - [`config`]: [`SyncConfig`] and the [`PersistPolicy`]
//!
//! This crate never installs a tracing subscriber; binaries do.

pub mod adapter;
pub mod config;
pub mod error;
pub mod host;
pub mod normalize;
pub mod reconcile;

pub use adapter::{SyncAdapter, SyncReport};
pub use config::{PersistPolicy, SyncConfig, PERSIST_DELAYS_ENV};
pub use error::{ConfigError, HostError, NormalizeError, SyncError};
pub use host::{HostDocument, InMemoryHost};
pub use normalize::{normalize, Action};
pub use reconcile::{reconcile, Reconciled};
