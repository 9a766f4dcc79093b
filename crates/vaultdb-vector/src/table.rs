//! LanceDB connection helpers.
use arrow_array::RecordBatchIterator;
use arrow_schema::Schema;
use lancedb::{connect, Connection};
use std::sync::Arc;

pub async fn open_db(uri: &str) -> Result<Connection, lancedb::Error> {
    connect(uri).execute().await
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool, lancedb::Error> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Create `name` with zero rows unless it already exists.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<(), lancedb::Error> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await?;
    tracing::info!(table = name, "created table");
    Ok(())
}
