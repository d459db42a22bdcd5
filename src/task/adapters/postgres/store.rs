//! `PostgreSQL` snapshot store.

use super::{models::NewSnapshotRow, schema::queue_snapshots};
use crate::task::ports::{SnapshotStore, SnapshotStoreError, SnapshotStoreResult};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::upsert::excluded;
use mockable::Clock;
use std::sync::Arc;

/// `PostgreSQL` connection pool type used by the snapshot store.
pub type SnapshotPgPool = Pool<ConnectionManager<PgConnection>>;

/// Longest namespace accepted by the `queue_snapshots` table.
const MAX_NAMESPACE_LENGTH: usize = 255;

/// `PostgreSQL`-backed snapshot store keeping one row per namespace.
#[derive(Clone)]
pub struct PostgresSnapshotStore<C>
where
    C: Clock + Send + Sync,
{
    pool: SnapshotPgPool,
    clock: Arc<C>,
}

impl<C> PostgresSnapshotStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SnapshotPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SnapshotStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SnapshotStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(SnapshotStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(SnapshotStoreError::persistence)?
    }
}

fn checked_namespace(key: &str) -> SnapshotStoreResult<String> {
    if key.is_empty() || key.chars().count() > MAX_NAMESPACE_LENGTH {
        return Err(SnapshotStoreError::InvalidKey(key.to_owned()));
    }
    Ok(key.to_owned())
}

#[async_trait]
impl<C> SnapshotStore for PostgresSnapshotStore<C>
where
    C: Clock + Send + Sync,
{
    async fn read(&self, key: &str) -> SnapshotStoreResult<Option<Vec<u8>>> {
        let namespace = checked_namespace(key)?;
        self.run_blocking(move |connection| {
            queue_snapshots::table
                .filter(queue_snapshots::namespace.eq(&namespace))
                .select(queue_snapshots::payload)
                .first::<Vec<u8>>(connection)
                .optional()
                .map_err(SnapshotStoreError::persistence)
        })
        .await
    }

    async fn write(&self, key: &str, payload: Vec<u8>) -> SnapshotStoreResult<()> {
        let row = NewSnapshotRow {
            namespace: checked_namespace(key)?,
            payload,
            updated_at: self.clock.utc(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(queue_snapshots::table)
                .values(&row)
                .on_conflict(queue_snapshots::namespace)
                .do_update()
                .set((
                    queue_snapshots::payload.eq(excluded(queue_snapshots::payload)),
                    queue_snapshots::updated_at.eq(excluded(queue_snapshots::updated_at)),
                ))
                .execute(connection)
                .map_err(SnapshotStoreError::persistence)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    fn unreachable_store() -> PostgresSnapshotStore<DefaultClock> {
        let manager =
            ConnectionManager::<PgConnection>::new("postgres://atelier@127.0.0.1:1/atelier");
        let pool = Pool::builder()
            .connection_timeout(Duration::from_millis(200))
            .build_unchecked(manager);
        PostgresSnapshotStore::new(pool, Arc::new(DefaultClock))
    }

    #[rstest]
    #[case("")]
    #[case(&"q".repeat(MAX_NAMESPACE_LENGTH + 1))]
    fn rejects_unstorable_namespaces(#[case] key: &str) {
        assert!(matches!(
            checked_namespace(key),
            Err(SnapshotStoreError::InvalidKey(_))
        ));
    }

    #[rstest]
    fn accepts_the_default_namespace() {
        assert_eq!(
            checked_namespace("atelier.task_queue").ok().as_deref(),
            Some("atelier.task_queue")
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_key_fails_before_connecting(
        unreachable_store: PostgresSnapshotStore<DefaultClock>,
    ) {
        let result = unreachable_store.write("", b"{}".to_vec()).await;
        assert!(matches!(result, Err(SnapshotStoreError::InvalidKey(_))));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_database_surfaces_persistence_error(
        unreachable_store: PostgresSnapshotStore<DefaultClock>,
    ) {
        let result = unreachable_store.read("atelier.task_queue").await;
        assert!(matches!(result, Err(SnapshotStoreError::Persistence(_))));
    }
}
