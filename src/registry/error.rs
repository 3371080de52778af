//! Error types for registry mutations.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    /// The ancestor chain loops back on the kind or repeats an ancestor.
    #[error("Kind {crd_type} has a cyclic hierarchy through {ancestor}")]
    CyclicHierarchy { crd_type: String, ancestor: String },
}
