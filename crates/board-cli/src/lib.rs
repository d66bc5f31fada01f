//! Support library for the `boardctl` binary: a file-backed host and the
//! subcommand implementations, kept out of `main.rs` so they can be tested.

pub mod commands;
pub mod file_host;

pub use file_host::FileHost;
