//! `bind` fails for unknown addresses and for variables never declared
//! tracked, but a negative state is a query that never fails.

use multiverse_commit::{CompileUnit, MultiverseEngine, TrackedVariable, VarWidth};
use std::sync::Arc;

#[test]
fn bind_rejects_unknown_address() {
    let engine = MultiverseEngine::new();
    assert_eq!(engine.bind(0xdead_beef, 1), -1);
}

#[test]
fn bind_rejects_untracked_variable() {
    let storage = Box::leak(Box::new(0u32));
    let variable = Arc::new(TrackedVariable::new(
        storage as *mut u32 as usize,
        VarWidth::Four,
        false,
    ));

    let engine = MultiverseEngine::new();
    engine.load_unit(CompileUnit::new().with_variable(variable.clone()));

    assert_eq!(engine.bind(variable.address(), 1), -1);
}

#[test]
fn negative_state_queries_without_mutating() {
    let storage = Box::leak(Box::new(0u32));
    let variable = Arc::new(TrackedVariable::new(
        storage as *mut u32 as usize,
        VarWidth::Four,
        true,
    ));

    let engine = MultiverseEngine::new();
    engine.load_unit(CompileUnit::new().with_variable(variable.clone()));

    assert_eq!(engine.bind(variable.address(), -1), 0);
    assert_eq!(engine.bind(variable.address(), 3), 3);
    assert_eq!(engine.bind(variable.address(), -1), 3);
}
