//! Shared world state for queue BDD scenarios.

use std::sync::Arc;

use atelier::config::QueueConfig;
use atelier::protocol::ProtocolFacade;
use atelier::task::{
    adapters::memory::{CountingNotifier, InMemorySnapshotStore},
    services::{LifecycleController, QueueHandle},
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;

/// Facade type used by the BDD world.
pub type TestFacade = ProtocolFacade<InMemorySnapshotStore, CountingNotifier, DefaultClock>;

/// Scenario world for queue behaviour tests.
pub struct QueueWorld {
    pub facade: TestFacade,
    pub next_request_id: i64,
    pub last_response: Option<Value>,
}

impl QueueWorld {
    /// Creates a world over an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let controller = LifecycleController::new(
            Arc::new(InMemorySnapshotStore::new()),
            Arc::new(CountingNotifier::new()),
            Arc::new(DefaultClock),
            QueueConfig::default(),
        )
        .expect("default configuration is valid");

        Self {
            facade: ProtocolFacade::new(QueueHandle::new(controller)),
            next_request_id: 1,
            last_response: None,
        }
    }

    /// Sends a request through the JSON entry point and keeps the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response is not valid JSON.
    pub fn call(&mut self, method: &str, params: Value) -> Result<&Value, eyre::Report> {
        let request = serde_json::json!({
            "id": self.next_request_id,
            "method": method,
            "params": params,
        });
        self.next_request_id += 1;
        let raw = run_async(self.facade.handle_json(&request.to_string()));
        let response = serde_json::from_str(&raw)?;
        Ok(self.last_response.insert(response))
    }

    /// Returns the most recent response.
    ///
    /// # Errors
    ///
    /// Returns an error if no request has been sent yet.
    pub fn last_response(&self) -> Result<&Value, eyre::Report> {
        self.last_response
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no response recorded in scenario world"))
    }
}

impl Default for QueueWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> QueueWorld {
    QueueWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
