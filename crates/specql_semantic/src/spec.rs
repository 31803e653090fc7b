//! Spec identifiers: stable symbolic names for schema and operation elements.
//!
//! A spec identifier has the shape `<base>.<scope-hash>.<segment>…/<leaf>`,
//! where the base is the fixed literal `spec`, the scope hash pins the
//! identifier to one schema (or one operation, for variables and fragments),
//! and the segments come from the AST path. The five built-in scalars carry
//! fixed identifiers with no scope hash.
//!
//! Spec identifiers are the only cross-component reference: the validator and
//! executor pass them around and resolve through the registry instead of
//! sharing AST nodes.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

const BASE: &str = "spec";

/// Names of the five built-in scalars.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Returns true if the name is one of the built-in scalars.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// A stable hash scoping spec identifiers to one schema or operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeHash(u64);

impl ScopeHash {
    /// Computes the scope hash of a source string. Stable across processes
    /// for identical input.
    #[must_use]
    pub fn of_source(source: &str) -> Self {
        let mut hasher = FxHasher::default();
        source.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Returns the raw hash value.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ScopeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", (self.0 >> 32) as u32 ^ self.0 as u32)
    }
}

/// A spec identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecId(String);

impl SpecId {
    /// The fixed identifier of a built-in scalar: `spec/Int`.
    #[must_use]
    pub fn builtin(name: &str) -> Self {
        Self(format!("{BASE}/{name}"))
    }

    /// A declared type: `spec.<hash>/<Type>`.
    #[must_use]
    pub fn schema_type(hash: ScopeHash, name: &str) -> Self {
        Self(format!("{BASE}.{hash}/{name}"))
    }

    /// The extension spec of an interface-implementing object:
    /// `spec.<hash>.ext/<Type>`.
    #[must_use]
    pub fn extension(hash: ScopeHash, name: &str) -> Self {
        Self(format!("{BASE}.{hash}.ext/{name}"))
    }

    /// A field of a type: `spec.<hash>.<Type>/<field>`.
    #[must_use]
    pub fn field(hash: ScopeHash, type_name: &str, field: &str) -> Self {
        Self(format!("{BASE}.{hash}.{type_name}/{field}"))
    }

    /// An argument of a field: `spec.<hash>.arg.<Type>.<field>/<arg>`.
    #[must_use]
    pub fn argument(hash: ScopeHash, type_name: &str, field: &str, arg: &str) -> Self {
        Self(format!("{BASE}.{hash}.arg.{type_name}.{field}/{arg}"))
    }

    /// An argument of a directive: `spec.<hash>.arg.@<directive>/<arg>`.
    #[must_use]
    pub fn directive_argument(hash: ScopeHash, directive: &str, arg: &str) -> Self {
        Self(format!("{BASE}.{hash}.arg.@{directive}/{arg}"))
    }

    /// An operation variable: `spec.<hash>.var/<name>`.
    #[must_use]
    pub fn variable(hash: ScopeHash, name: &str) -> Self {
        Self(format!("{BASE}.{hash}.var/{name}"))
    }

    /// A named fragment: `spec.<hash>.frag/<name>`.
    #[must_use]
    pub fn fragment(hash: ScopeHash, name: &str) -> Self {
        Self(format!("{BASE}.{hash}.frag/{name}"))
    }

    /// Derives an identifier one wrapper deeper: the parent's leaf becomes a
    /// path segment and `leaf` becomes the new leaf. Used for list and
    /// non-null wrapper descriptors at a declaration site.
    #[must_use]
    pub fn wrapped(&self, leaf: &str) -> Self {
        Self(format!("{}/{leaf}", self.0.replacen('/', ".", 1)))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpecId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_have_no_scope_hash() {
        assert_eq!(SpecId::builtin("Int").as_str(), "spec/Int");
        assert!(is_builtin_scalar("ID"));
        assert!(!is_builtin_scalar("Dog"));
    }

    #[test]
    fn test_scope_hash_is_stable() {
        let a = ScopeHash::of_source("type Dog { name: String }");
        let b = ScopeHash::of_source("type Dog { name: String }");
        let c = ScopeHash::of_source("type Cat { name: String }");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string().len(), 8);
    }

    #[test]
    fn test_identifier_construction() {
        let hash = ScopeHash::of_source("schema");
        let field = SpecId::field(hash, "Human", "pets");
        assert_eq!(field.as_str(), format!("spec.{hash}.Human/pets"));

        let arg = SpecId::argument(hash, "Query", "dog", "name");
        assert_eq!(arg.as_str(), format!("spec.{hash}.arg.Query.dog/name"));

        let directive_arg = SpecId::directive_argument(hash, "include", "if");
        assert_eq!(
            directive_arg.as_str(),
            format!("spec.{hash}.arg.@include/if")
        );
    }

    #[test]
    fn test_wrapped_extends_the_path() {
        let hash = ScopeHash::of_source("schema");
        let field = SpecId::field(hash, "Human", "pets");
        let list = field.wrapped("list");
        assert_eq!(list.as_str(), format!("spec.{hash}.Human.pets/list"));
        let inner = list.wrapped("notnull");
        assert_eq!(
            inner.as_str(),
            format!("spec.{hash}.Human.pets.list/notnull")
        );
    }
}
