//! carbonseerd — assembly of the CarbonSeer subsystems.
//!
//! The binary in `main.rs` only parses flags and installs signal
//! handling; everything it runs is built here so it can be driven from
//! tests with fake collaborators.

pub mod daemon;
pub mod logging;

pub use daemon::{Daemon, serve};
