// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store handle, connection management, and row decoding.

mod jobs;
mod pipelines;
mod runs;

use crate::fence::{FenceError, VolumeFence};
use crate::schema;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt {column} column on record {id}: {message}")]
    Decode {
        column: &'static str,
        id: String,
        message: String,
    },
    #[error("could not encode composite column: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Fence(#[from] FenceError),
}

/// Durable relational store shared by the HTTP surface and the engines.
///
/// Updates run on a single-connection writer pool inside short write
/// transactions; reads use a separate pool. The database runs in WAL
/// mode so readers never block the writer.
#[derive(Clone)]
pub struct Store {
    writer: SqlitePool,
    reader: SqlitePool,
    fence: Arc<dyn VolumeFence>,
}

impl Store {
    /// Open (creating if missing) the database at `path`.
    pub async fn open(
        path: impl AsRef<Path>,
        fence: Arc<dyn VolumeFence>,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        let reader = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(schema::SCHEMA).execute(&writer).await?;
        tracing::debug!(path = %path.display(), "store opened");

        Ok(Self {
            writer,
            reader,
            fence,
        })
    }

    /// Publish local writes to readers in other processes.
    ///
    /// Called by the engines after every state-boundary write; within a
    /// single attempt, updates may batch into one commit at the end.
    pub async fn commit(&self) -> Result<(), StoreError> {
        self.fence.commit().await?;
        Ok(())
    }

    /// Import writes committed by other processes.
    ///
    /// Called by every HTTP read path before querying, and by the
    /// engines on entry.
    pub async fn reload(&self) -> Result<(), StoreError> {
        self.fence.reload().await?;
        Ok(())
    }

    pub(crate) fn writer(&self) -> &SqlitePool {
        &self.writer
    }

    pub(crate) fn reader(&self) -> &SqlitePool {
        &self.reader
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Store;
    use crate::NoopFence;
    use std::sync::Arc;

    /// Open a store on a fresh temp directory. The directory guard must
    /// outlive the store.
    pub(crate) async fn open_temp() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("drover.db"), Arc::new(NoopFence))
            .await
            .unwrap();
        (dir, store)
    }
}

/// Decode an optional JSON text column, attributing failures to the row.
pub(crate) fn decode_json<T: DeserializeOwned>(
    raw: Option<String>,
    column: &'static str,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match raw {
        None => Ok(None),
        Some(text) if text.is_empty() => Ok(None),
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StoreError::Decode {
                column,
                id: id.to_string(),
                message: e.to_string(),
            }),
    }
}
