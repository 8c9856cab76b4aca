// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process visibility fence for the volume-backed store.

use async_trait::async_trait;
use thiserror::Error;

/// Error from a fence round-trip.
#[derive(Debug, Error)]
#[error("volume fence error: {0}")]
pub struct FenceError(pub String);

/// Commit/reload pair that exchanges writes across processes sharing a
/// volume-backed database file.
///
/// `commit` publishes local writes to remote readers; `reload` imports
/// writes committed elsewhere. Both may block on network round-trips.
#[async_trait]
pub trait VolumeFence: Send + Sync {
    async fn commit(&self) -> Result<(), FenceError>;
    async fn reload(&self) -> Result<(), FenceError>;
}

/// Fence for a plain local file: SQLite's WAL already gives readers in
/// this process a consistent view, so both operations are no-ops.
#[derive(Debug, Default)]
pub struct NoopFence;

#[async_trait]
impl VolumeFence for NoopFence {
    async fn commit(&self) -> Result<(), FenceError> {
        Ok(())
    }

    async fn reload(&self) -> Result<(), FenceError> {
        Ok(())
    }
}

/// Fence that counts calls, for asserting fence discipline in tests.
#[cfg(feature = "test-support")]
#[derive(Debug, Default)]
pub struct CountingFence {
    commits: std::sync::atomic::AtomicUsize,
    reloads: std::sync::atomic::AtomicUsize,
}

#[cfg(feature = "test-support")]
impl CountingFence {
    pub fn commits(&self) -> usize {
        self.commits.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "test-support")]
#[async_trait]
impl VolumeFence for CountingFence {
    async fn commit(&self) -> Result<(), FenceError> {
        self.commits
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn reload(&self) -> Result<(), FenceError> {
        self.reloads
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
