//! Semantic analysis for SpecQL.
//!
//! This crate provides:
//! - `spec`: Spec identifiers, the stable symbolic names for schema and
//!   operation elements
//! - `registry`: The schema type registry builder and spec map
//! - `overlay`: Per-operation registry overlay for variables and fragments
//! - `validate`: The operation validator
//! - `rules`: The individual validation rules

pub mod overlay;
pub mod registry;
pub mod rules;
pub mod spec;
pub mod validate;

pub use overlay::OperationOverlay;
pub use registry::{
    build_registry, ArgumentShape, BuildOutcome, DirectiveShape, FieldShape, SchemaState, SpecMap,
    TypeDescriptor, TypeKind, TypeShape, TypeSig,
};
pub use spec::{ScopeHash, SpecId};
pub use validate::{validate_document, RuleName, ValidatedDocument};
