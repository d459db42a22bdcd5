//! Step definitions for worker-facing queue scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
