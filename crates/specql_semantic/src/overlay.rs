//! Per-operation registry overlay.
//!
//! Variables and fragments are scoped to one operation document, not to the
//! schema. The validator records their spec identifiers here, layered on top
//! of the schema registry; the executor resolves through the overlay first
//! and falls back to the schema spec map.

use crate::registry::{signature_layered, SpecMap, TypeSig};
use crate::spec::{ScopeHash, SpecId};
use rustc_hash::FxHashMap;
use specql_core::Span;

/// The overlay: operation-scoped specs plus span-keyed AST annotations.
///
/// Lifetime is a single validation/execution session; the schema registry it
/// layers over is never mutated.
#[derive(Debug, Clone)]
pub struct OperationOverlay {
    /// Scope hash of the operation source.
    pub hash: ScopeHash,
    /// Operation-scoped spec entries (variable and fragment descriptors).
    pub specs: SpecMap,
    /// Variable name to spec identifier.
    variables: FxHashMap<String, SpecId>,
    /// Fragment name to spec identifier.
    fragments: FxHashMap<String, SpecId>,
    /// Spec identifier annotations keyed by the annotated node's span.
    bindings: FxHashMap<Span, SpecId>,
}

impl OperationOverlay {
    /// Creates an empty overlay for an operation source.
    pub fn new(hash: ScopeHash) -> Self {
        Self {
            hash,
            specs: SpecMap::new(),
            variables: FxHashMap::default(),
            fragments: FxHashMap::default(),
            bindings: FxHashMap::default(),
        }
    }

    /// Registers a variable spec.
    pub fn insert_variable(&mut self, name: impl Into<String>, id: SpecId) {
        self.variables.insert(name.into(), id);
    }

    /// Registers a fragment spec.
    pub fn insert_fragment(&mut self, name: impl Into<String>, id: SpecId) {
        self.fragments.insert(name.into(), id);
    }

    /// Returns the spec of a variable.
    pub fn variable(&self, name: &str) -> Option<&SpecId> {
        self.variables.get(name)
    }

    /// Returns the spec of a fragment.
    pub fn fragment(&self, name: &str) -> Option<&SpecId> {
        self.fragments.get(name)
    }

    /// Returns the declared variable names.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Annotates a node (by its span) with a spec identifier.
    pub fn bind(&mut self, span: Span, id: SpecId) {
        self.bindings.insert(span, id);
    }

    /// Returns the spec identifier a node was annotated with.
    pub fn binding(&self, span: Span) -> Option<&SpecId> {
        self.bindings.get(&span)
    }

    /// Number of annotated nodes.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Resolves a spec identifier to its wrapping signature, consulting the
    /// overlay first and the schema spec map second.
    pub fn signature(&self, schema_specs: &SpecMap, id: &SpecId) -> Option<TypeSig> {
        signature_layered(&self.specs, Some(schema_specs), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{TypeShape, TypeSig};

    #[test]
    fn test_variable_signature_resolves_through_schema() {
        let hash = ScopeHash::of_source("query($x: Int!) { f }");
        let mut overlay = OperationOverlay::new(hash);

        let mut schema_specs = SpecMap::new();
        schema_specs.insert_shape(
            SpecId::builtin("Int"),
            TypeShape::Scalar {
                name: "Int".to_string(),
            },
        );

        let var = SpecId::variable(hash, "x");
        let wrapper = var.wrapped("notnull");
        overlay.specs.insert_shape(
            wrapper.clone(),
            TypeShape::NonNull {
                of: SpecId::builtin("Int"),
            },
        );
        overlay.specs.insert_alias(var.clone(), wrapper);
        overlay.insert_variable("x", var.clone());

        let sig = overlay.signature(&schema_specs, overlay.variable("x").unwrap());
        assert_eq!(sig, Some(TypeSig::NonNull(Box::new(TypeSig::Named("Int".into())))));
    }

    #[test]
    fn test_bindings_are_span_keyed() {
        let hash = ScopeHash::of_source("{ f }");
        let mut overlay = OperationOverlay::new(hash);
        let id = SpecId::fragment(hash, "frag");
        overlay.bind(Span::new(2, 3), id.clone());
        assert_eq!(overlay.binding(Span::new(2, 3)), Some(&id));
        assert_eq!(overlay.binding(Span::new(0, 1)), None);
    }
}
