// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! drover-storage: SQLite persistence for jobs, pipelines, and runs.
//!
//! Writers and readers may live in different processes sharing a
//! volume-backed database file, so the store pairs every state-boundary
//! write with a [`VolumeFence::commit`] and every cross-process read
//! with a [`VolumeFence::reload`]. The local single-host deployment
//! installs [`NoopFence`]; a networked volume supplies its own fence.

mod fence;
mod schema;
mod store;

pub use fence::{FenceError, NoopFence, VolumeFence};
pub use store::{Store, StoreError};

#[cfg(feature = "test-support")]
pub use fence::CountingFence;
