//! `VectorStore` backed by a LanceDB table, one table per collection.
//!
//! Equality clauses are pushed down to LanceDB as SQL predicates. Regex
//! clauses are applied to the rows LanceDB returns, so a filter with a regex
//! scans the whole collection.
use std::path::Path;
use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};
use tokio::runtime::Runtime;

use vaultdb_core::filter::{Clause, Filter};
use vaultdb_core::traits::VectorStore;
use vaultdb_core::types::{ChunkId, ChunkMetadata, ChunkRecord, DocumentChunk, SearchHit};
use vaultdb_core::{Error, Result};

use crate::schema::{build_arrow_schema, vector_dim, DISTANCE_COLUMN, METADATA_COLUMNS};
use crate::table::{ensure_table, open_db, table_exists};

/// Ids per `DELETE ... WHERE id IN (...)` statement.
const DELETE_BATCH: usize = 256;

fn store_err(e: impl std::fmt::Display) -> Error {
    Error::Store(e.to_string())
}

pub struct LanceStore {
    runtime: Runtime,
    table: Table,
    dim: usize,
}

impl LanceStore {
    /// Open `collection` under `db_path`, creating it for `dim`-wide vectors
    /// if it does not exist yet.
    pub fn open(db_path: &Path, collection: &str, dim: usize) -> Result<Self> {
        let width = i32::try_from(dim)
            .map_err(|_| Error::InvalidConfig(format!("vector dimension {dim} is too large")))?;
        let runtime = Runtime::new()?;
        let uri = db_path.to_string_lossy().to_string();
        let table = runtime
            .block_on(open_or_create(&uri, collection, width))
            .map_err(store_err)?;
        let store = Self::from_table(runtime, table)?;
        if store.dim != dim {
            return Err(Error::InvalidConfig(format!(
                "collection '{}' holds {}-dimensional vectors but the embedder produces {}",
                collection, store.dim, dim
            )));
        }
        Ok(store)
    }

    /// Open a collection that must already exist.
    pub fn connect_existing(db_path: &Path, collection: &str) -> Result<Self> {
        if !db_path.exists() {
            return Err(Error::NotFound(format!("no database at {}", db_path.display())));
        }
        let runtime = Runtime::new()?;
        let uri = db_path.to_string_lossy().to_string();
        let table = runtime
            .block_on(open_if_exists(&uri, collection))
            .map_err(store_err)?
            .ok_or_else(|| {
                Error::NotFound(format!("collection '{}' not found in {}", collection, db_path.display()))
            })?;
        Self::from_table(runtime, table)
    }

    fn from_table(runtime: Runtime, table: Table) -> Result<Self> {
        let schema = runtime.block_on(table.schema()).map_err(store_err)?;
        let dim = vector_dim(&schema)
            .ok_or_else(|| Error::Store(format!("table '{}' has no vector column", table.name())))?;
        tracing::debug!(table = table.name(), dim, "opened collection");
        Ok(Self { runtime, table, dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn collection(&self) -> &str {
        self.table.name()
    }
}

async fn open_or_create(uri: &str, collection: &str, width: i32) -> std::result::Result<Table, lancedb::Error> {
    let conn: Connection = open_db(uri).await?;
    ensure_table(&conn, collection, build_arrow_schema(width)).await?;
    conn.open_table(collection).execute().await
}

async fn open_if_exists(uri: &str, collection: &str) -> std::result::Result<Option<Table>, lancedb::Error> {
    let conn = open_db(uri).await?;
    if !table_exists(&conn, collection).await? {
        return Ok(None);
    }
    conn.open_table(collection).execute().await.map(Some)
}

impl VectorStore for LanceStore {
    fn upsert(&self, records: &[ChunkRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let batch = records_to_batch(records, self.dim)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let merged = self
            .runtime
            .block_on(async {
                let mut mi = self.table.merge_insert(&["id"]);
                mi.when_matched_update_all(None).when_not_matched_insert_all();
                mi.execute(reader).await
            })
            .map_err(store_err)?;
        tracing::debug!(
            inserted = merged.num_inserted_rows,
            updated = merged.num_updated_rows,
            table = self.table.name(),
            "upsert"
        );
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize, filter: &Filter) -> Result<Vec<SearchHit>> {
        if vector.len() != self.dim {
            return Err(Error::Store(format!(
                "query vector has {} dimensions, collection expects {}",
                vector.len(),
                self.dim
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let fetch = if filter.has_regex() { self.count()? } else { k };
        if fetch == 0 {
            return Ok(Vec::new());
        }
        let predicate = equality_predicate(filter);
        let batches = self
            .runtime
            .block_on(async {
                let mut q = self
                    .table
                    .vector_search(vector.to_vec())?
                    .distance_type(DistanceType::Cosine)
                    .limit(fetch);
                if let Some(p) = &predicate {
                    q = q.only_if(p.as_str());
                }
                q.execute().await?.try_collect::<Vec<RecordBatch>>().await
            })
            .map_err(store_err)?;

        let distances: Vec<&Float32Array> =
            batches.iter().map(|b| float_column(b, DISTANCE_COLUMN)).collect::<Result<_>>()?;
        let mut hits: Vec<SearchHit> = matching_rows(&batches, filter)?
            .into_iter()
            .map(|(chunk, b, row)| SearchHit::from_chunk(chunk, distances[b].value(row)))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn get(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<DocumentChunk>> {
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let total = self.count()?;
        if total == 0 {
            return Ok(Vec::new());
        }
        let fetch = match limit {
            Some(n) if !filter.has_regex() => n.min(total),
            _ => total,
        };
        let predicate = equality_predicate(filter);
        let batches = self
            .runtime
            .block_on(async {
                let mut q = self.table.query().select(Select::columns(&METADATA_COLUMNS)).limit(fetch);
                if let Some(p) = &predicate {
                    q = q.only_if(p.as_str());
                }
                q.execute().await?.try_collect::<Vec<RecordBatch>>().await
            })
            .map_err(store_err)?;

        let mut chunks: Vec<DocumentChunk> =
            matching_rows(&batches, filter)?.into_iter().map(|(chunk, _, _)| chunk).collect();
        if let Some(n) = limit {
            chunks.truncate(n);
        }
        Ok(chunks)
    }

    fn delete(&self, ids: &[ChunkId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let before = self.count()?;
        for batch in ids.chunks(DELETE_BATCH) {
            let predicate = id_in_predicate(batch);
            self.runtime.block_on(self.table.delete(&predicate)).map_err(store_err)?;
        }
        let after = self.count()?;
        Ok(before.saturating_sub(after))
    }

    fn count(&self) -> Result<usize> {
        self.runtime.block_on(self.table.count_rows(None)).map_err(store_err)
    }
}

/// Rows of `batches` that pass `filter`, with their (batch, row) position.
fn matching_rows(batches: &[RecordBatch], filter: &Filter) -> Result<Vec<(DocumentChunk, usize, usize)>> {
    let mut rows = Vec::new();
    for (b, batch) in batches.iter().enumerate() {
        for (row, chunk) in read_chunks(batch)?.into_iter().enumerate() {
            if filter.accepts(&chunk.metadata) {
                rows.push((chunk, b, row));
            }
        }
    }
    Ok(rows)
}

fn sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// SQL for the equality clauses of `filter`, or `None` when it has none.
/// Numeric clauses whose value is not an integer are left to the row check.
pub(crate) fn equality_predicate(filter: &Filter) -> Option<String> {
    let parts: Vec<String> = filter
        .clauses()
        .iter()
        .filter_map(|clause| match clause {
            Clause::Equals(field, value) if field.is_numeric() => {
                value.parse::<i64>().ok().map(|n| format!("{} = {}", field.column(), n))
            }
            Clause::Equals(field, value) => Some(format!("{} = {}", field.column(), sql_string(value))),
            Clause::Matches(..) => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" AND "))
    }
}

fn id_in_predicate(ids: &[ChunkId]) -> String {
    let list: Vec<String> = ids.iter().map(|id| sql_string(id)).collect();
    format!("id IN ({})", list.join(", "))
}

fn to_i32(n: usize) -> Result<i32> {
    i32::try_from(n).map_err(|_| Error::Store(format!("chunk position {n} does not fit the table schema")))
}

fn records_to_batch(records: &[ChunkRecord], dim: usize) -> Result<RecordBatch> {
    let width = i32::try_from(dim).map_err(|_| Error::Store(format!("vector dimension {dim} is too large")))?;
    let mut ids = Vec::with_capacity(records.len());
    let mut file_paths = Vec::with_capacity(records.len());
    let mut chunk_indices = Vec::with_capacity(records.len());
    let mut total_chunks = Vec::with_capacity(records.len());
    let mut directories = Vec::with_capacity(records.len());
    let mut file_names = Vec::with_capacity(records.len());
    let mut documents = Vec::with_capacity(records.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(records.len());
    for record in records {
        if record.vector.len() != dim {
            return Err(Error::Store(format!(
                "chunk {} has a {}-dimensional vector, collection expects {}",
                record.chunk.id,
                record.vector.len(),
                dim
            )));
        }
        let meta = &record.chunk.metadata;
        ids.push(record.chunk.id.as_str());
        file_paths.push(meta.file_path.as_str());
        chunk_indices.push(to_i32(meta.chunk_index)?);
        total_chunks.push(to_i32(meta.total_chunks)?);
        directories.push(meta.directory.as_str());
        file_names.push(meta.file_name.as_str());
        documents.push(record.chunk.content.as_str());
        vectors.push(Some(record.vector.iter().copied().map(Some).collect()));
    }
    RecordBatch::try_new(
        build_arrow_schema(width),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(file_paths)),
            Arc::new(Int32Array::from(chunk_indices)),
            Arc::new(Int32Array::from(total_chunks)),
            Arc::new(StringArray::from(directories)),
            Arc::new(StringArray::from(file_names)),
            Arc::new(StringArray::from(documents)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, width)),
        ],
    )
    .map_err(store_err)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Store(format!("column '{name}' missing or not utf8")))
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| Error::Store(format!("column '{name}' missing or not int32")))
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| Error::Store(format!("column '{name}' missing or not float32")))
}

fn to_usize(v: i32) -> Result<usize> {
    usize::try_from(v).map_err(|_| Error::Store(format!("negative chunk position {v}")))
}

fn read_chunks(batch: &RecordBatch) -> Result<Vec<DocumentChunk>> {
    let ids = string_column(batch, "id")?;
    let file_paths = string_column(batch, "file_path")?;
    let chunk_indices = int_column(batch, "chunk_index")?;
    let total_chunks = int_column(batch, "total_chunks")?;
    let directories = string_column(batch, "directory")?;
    let file_names = string_column(batch, "file_name")?;
    let documents = string_column(batch, "document")?;
    (0..batch.num_rows())
        .map(|row| {
            Ok(DocumentChunk {
                id: ids.value(row).to_string(),
                content: documents.value(row).to_string(),
                metadata: ChunkMetadata {
                    file_path: file_paths.value(row).to_string(),
                    chunk_index: to_usize(chunk_indices.value(row))?,
                    total_chunks: to_usize(total_chunks.value(row))?,
                    directory: directories.value(row).to_string(),
                    file_name: file_names.value(row).to_string(),
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultdb_core::filter::MetaField;

    #[test]
    fn equality_clauses_become_sql() {
        let f = Filter::new()
            .equals(MetaField::FilePath, "it's/a.md")
            .equals(MetaField::ChunkIndex, "2")
            .matches(MetaField::Directory, "proj")
            .unwrap();
        assert_eq!(equality_predicate(&f).unwrap(), "file_path = 'it''s/a.md' AND chunk_index = 2");
    }

    #[test]
    fn regex_only_filter_has_no_predicate() {
        let f = Filter::new().matches(MetaField::FilePath, ".*x.*").unwrap();
        assert!(equality_predicate(&f).is_none());
        assert!(equality_predicate(&Filter::new()).is_none());
    }

    #[test]
    fn non_integer_numeric_value_is_not_pushed_down() {
        let f = Filter::new().equals(MetaField::TotalChunks, "many");
        assert!(equality_predicate(&f).is_none());
    }

    #[test]
    fn id_list_quotes_each_id() {
        let ids = vec!["a".to_string(), "b'c".to_string()];
        assert_eq!(id_in_predicate(&ids), "id IN ('a', 'b''c')");
    }
}
