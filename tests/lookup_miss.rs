//! Every entry point that resolves an address reports a lookup miss as
//! `-1` (or `false` for the boolean query), never a panic.

use multiverse_commit::MultiverseEngine;

#[test]
fn commit_and_revert_report_miss_as_minus_one() {
    let engine = MultiverseEngine::new();
    assert_eq!(engine.commit_fn(0x1234), -1);
    assert_eq!(engine.revert_fn(0x1234), -1);
    assert_eq!(engine.commit_refs(0x5678), -1);
    assert_eq!(engine.revert_refs(0x5678), -1);
}

#[test]
fn is_committed_on_unknown_address_is_false() {
    let engine = MultiverseEngine::new();
    assert!(!engine.is_committed(0x1234));
}
