//! Adapter implementations for task queue ports.

pub mod filesystem;
pub mod memory;
pub mod postgres;
