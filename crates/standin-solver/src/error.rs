//! Fatal invariant violations.
//!
//! Everything the engine can recover from is modelled with `Option` at the
//! oracle boundary. What remains here are consistency bugs in declared type
//! metadata or in the engine itself: they abort the surrounding check and
//! must not be retried.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    /// Substitution (or construction) would leave a union with no atomics.
    #[error("substituting `{union_id}` produced an empty union")]
    EmptyUnion { union_id: String },

    /// A generic object synthesized from template-extends metadata would
    /// have no type arguments.
    #[error("template-extends list of `{class_name}` for `{ancestor}` has no named arguments")]
    EmptyTemplateExtends { class_name: String, ancestor: String },
}
