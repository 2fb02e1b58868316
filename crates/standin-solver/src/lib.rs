//! Template Standin Solver
//!
//! Specializes declared types that mention template parameters against the
//! types observed at a call or assignment site. It is built from:
//!
//! - **Atomic type model** (`types`): a closed enum of type alternatives
//! - **Unions** (`union`): ordered, keyed, never-empty sets of atomics
//! - **Template result** (`template_result`): declared bounds and inferred
//!   bindings for one check
//! - **Atomic matcher** (`matcher`): finds the input member corresponding to
//!   a declared container
//! - **Substitution engine** (`standin`): the recursive standin algorithm
//!
//! Subtyping, union joining, callable extraction and class metadata are not
//! answered here; they are supplied by the host through `oracles`.
pub mod error;
pub mod inferred;
pub mod matcher;
pub mod oracles;
pub mod standin;
pub mod template_result;
pub mod types;
pub mod union;

pub use error::SubstitutionError;
pub use inferred::{InferredTypeReplacer, replace_inferred};
pub use matcher::match_atomic;
pub use oracles::{
    CallableShapeOracle, ClassMetadata, ClassMetadataProvider, ClassMetadataStore, CombineOracle,
    ContainmentOracle, ExtendsArg, ExtendsArgKey, KeyedCombiner, Oracles,
};
pub use standin::{StandinOptions, StandinReplacer, substitute};
pub use template_result::{Binding, BindingOutcome, TemplateKey, TemplateResult};
pub use types::{
    ArrayKey, ArrayType, Atomic, CallableSignature, ClassString, FxIndexMap, GenericObject,
    IterableType, KeyedArray, ListType, NamedObject, OBJECT_CLASS, TemplateIndexedAccess,
    TemplateKeyOf, TemplateParam, TemplateParamClass, TypeArgPosition, base_key,
};
pub use union::{Union, UnionFlags};
