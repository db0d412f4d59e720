use std::collections::HashMap;
use std::sync::Arc;

use crate::model::variable::TrackedVariable;
use crate::model::variant::ManagedFunction;

/// The functions and tracked variables contributed by a single compiled
/// translation unit (§3). `InfoSet` aggregates one or more of these; nothing
/// here is specific to a unit beyond the grouping itself.
#[derive(Default)]
pub struct CompileUnit {
    functions: Vec<Arc<ManagedFunction>>,
    variables: Vec<Arc<TrackedVariable>>,
}

impl CompileUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(mut self, function: Arc<ManagedFunction>) -> Self {
        function.register_with_variables();
        self.functions.push(function);
        self
    }

    pub fn with_variable(mut self, variable: Arc<TrackedVariable>) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn functions(&self) -> &[Arc<ManagedFunction>] {
        &self.functions
    }

    pub fn variables(&self) -> &[Arc<TrackedVariable>] {
        &self.variables
    }
}

/// The whole-program view the commit engine operates over (§3): every
/// managed function and tracked variable known to the process, indexed by
/// address for the lookups §4.4's entry points need.
///
/// Functions are also kept in a declaration-ordered `Vec`: §5 requires a
/// whole-program batch to process functions in descriptor-declaration
/// order, which a `HashMap`'s iteration order (randomized per process)
/// cannot provide.
#[derive(Default)]
pub struct InfoSet {
    functions_in_order: Vec<Arc<ManagedFunction>>,
    functions_by_address: HashMap<usize, Arc<ManagedFunction>>,
    variables_by_address: HashMap<usize, Arc<TrackedVariable>>,
}

impl InfoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds every function and variable of `unit` into the whole-program
    /// index. Units are merged, never partitioned back out — mirroring the
    /// source's flattened `multiverse_info_*` global arrays.
    pub fn add_unit(&mut self, unit: CompileUnit) {
        for function in unit.functions {
            self.functions_by_address
                .insert(function.generic_address(), function.clone());
            self.functions_in_order.push(function);
        }
        for variable in unit.variables {
            self.variables_by_address.insert(variable.address(), variable);
        }
    }

    pub(crate) fn function_at(&self, address: usize) -> Option<&Arc<ManagedFunction>> {
        self.functions_by_address.get(&address)
    }

    pub(crate) fn variable_at(&self, address: usize) -> Option<&Arc<TrackedVariable>> {
        self.variables_by_address.get(&address)
    }

    pub(crate) fn all_functions(&self) -> impl Iterator<Item = &Arc<ManagedFunction>> {
        self.functions_in_order.iter()
    }

    /// Every still-live managed function that references `variable`, used by
    /// the "commit references to a variable" entry points (§4.4).
    pub(crate) fn functions_referencing(&self, address: usize) -> Vec<Arc<ManagedFunction>> {
        match self.variable_at(address) {
            Some(variable) => variable.referrers(),
            None => Vec::new(),
        }
    }
}
