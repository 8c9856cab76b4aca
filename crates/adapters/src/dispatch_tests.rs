// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_dispatcher_records_calls_in_order() {
    let dispatcher = FakeDispatcher::new();
    dispatcher.authenticate("tok-1").await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let ws = dir.path().join("ws");
    dispatcher
        .prepare("https://github.com/o/r", &ws, false)
        .await
        .unwrap();
    dispatcher
        .prepare("https://github.com/o/r", &ws, true)
        .await
        .unwrap();

    assert_eq!(
        dispatcher.calls(),
        vec![
            DispatchCall::Authenticate {
                token: "tok-1".to_string()
            },
            DispatchCall::Prepare {
                repo_url: "https://github.com/o/r".to_string(),
                workspace: ws.clone(),
                skip_clone: false,
            },
            DispatchCall::Prepare {
                repo_url: "https://github.com/o/r".to_string(),
                workspace: ws.clone(),
                skip_clone: true,
            },
        ]
    );
    assert!(ws.is_dir());
}

#[tokio::test]
async fn prepare_skip_clone_on_missing_dir_falls_through_to_clone_error() {
    // skip_clone with a missing directory must attempt a fresh clone,
    // which fails for an unreachable URL.
    let dir = tempfile::tempdir().unwrap();
    let ws = dir.path().join("ws");
    let dispatcher = GitDispatcher::new();
    let result = dispatcher
        .prepare("file:///nonexistent/repo.git", &ws, true)
        .await;
    assert!(result.is_err());
}
