//! Task queue orchestration.
//!
//! Tasks move through a validated lifecycle, are selected by priority and
//! arrival order once their dependencies and holds clear, and are
//! snapshotted to a pluggable store. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
