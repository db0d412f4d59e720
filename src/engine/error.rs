/// Recoverable failures the commit engine can report as `-1` at its public
/// boundary (§7). Fatal conditions — an invalid tracked-variable width, or a
/// failing `mprotect` — are not represented here: the source treats them as
/// unrecoverable (`assert(0 && ...)`), so this crate panics for them instead
/// of asking every caller to handle an error variant they cannot act on.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("no managed function found for address {0:#x}")]
    FunctionNotFound(usize),

    #[error("no tracked variable found for address {0:#x}")]
    VariableNotFound(usize),

    #[error("failed to allocate a commit context")]
    ContextAlloc,

    #[error("cannot bind: variable is not declared tracked")]
    NotTracked,
}
