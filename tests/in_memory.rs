//! In-memory integration tests for the task queue.
//!
//! Tests are organised into modules by functionality:
//! - `queue_flow_tests`: worker flows across several lifecycle operations
//! - `persistence_round_trip_tests`: flushing and reloading through a
//!   shared snapshot store

mod in_memory {
    pub mod helpers;

    mod persistence_round_trip_tests;
    mod queue_flow_tests;
}
