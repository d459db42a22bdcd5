//! Unit tests for the task module.
//!
//! Tests are organised by component: the domain lifecycle, the store and
//! scheduler, snapshot encoding, persistence, and the lifecycle controller.

mod persistence_tests;
mod status_transition_tests;
