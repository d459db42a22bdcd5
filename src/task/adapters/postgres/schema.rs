//! Diesel schema for queue snapshot persistence.

diesel::table! {
    /// One serialised snapshot per queue namespace.
    queue_snapshots (namespace) {
        /// Queue namespace key.
        #[max_length = 255]
        namespace -> Varchar,
        /// Encoded snapshot document.
        payload -> Bytea,
        /// Last write timestamp.
        updated_at -> Timestamptz,
    }
}
