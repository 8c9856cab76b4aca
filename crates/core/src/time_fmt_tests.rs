// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn now_iso_is_utc_rfc3339() {
    let ts = now_iso();
    assert!(ts.ends_with('Z'), "expected Z suffix: {ts}");
    assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
}

#[test]
fn now_iso_sorts_lexicographically() {
    let a = now_iso();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = now_iso();
    assert!(a < b);
}
