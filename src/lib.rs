//! Template standin substitution for a structural static type checker.
//!
//! Given a declared type that mentions template parameters and the type
//! observed at a call or assignment site, [`substitute`] produces the
//! concrete standin and records the inferred bindings in a
//! [`TemplateResult`]; [`replace_inferred`] later applies those bindings to
//! other declared types (return types, property types).
//!
//! ```
//! use standin::{
//!     Atomic, ClassMetadataStore, KeyedCombiner, Oracles, StandinOptions, TemplateResult,
//!     Union, substitute,
//! };
//!
//! let classes = ClassMetadataStore::new();
//! let oracles = Oracles::new(&KeyedCombiner, &classes);
//!
//! let mut result = TemplateResult::new();
//! result.add_template_type("T", None, Union::mixed());
//!
//! // list<T> checked against list<int>
//! let declared = Union::new(Atomic::list(Union::new(Atomic::template_param(
//!     "T",
//!     None,
//!     Union::mixed(),
//! ))));
//! let argument = Union::new(Atomic::list(Union::int()));
//!
//! substitute(&declared, &mut result, oracles, Some(&argument), None, StandinOptions::standin(), 0)?;
//! assert_eq!(result.binding("T", None).map(|b| b.ty.id()), Some("int".to_string()));
//! # Ok::<(), standin::SubstitutionError>(())
//! ```

pub mod tracing_config;

pub use standin_common::limits;
pub use standin_solver::*;
