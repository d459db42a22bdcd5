//! Atelier: task queue orchestration for autonomous coding workers.
//!
//! This crate holds the queue that sits between a coordinator and its
//! workers: it accepts tasks, decides which one runs next, tracks each task
//! through its lifecycle, and keeps a bounded snapshot so a restart resumes
//! open work.
//!
//! # Architecture
//!
//! Atelier follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (filesystem, database)
//!
//! # Modules
//!
//! - [`config`]: Queue tuning knobs
//! - [`task`]: Task model, scheduling, lifecycle, and persistence
//! - [`protocol`]: JSON request/response surface for workers

pub mod config;
pub mod protocol;
pub mod task;
