//! Public entry points: `build_schema`, `validate`, `execute`.
//!
//! `execute` accepts either raw sources or pre-built states for both the
//! schema and the operation, so callers can do one-shot execution or build
//! once and execute many times.

use crate::executor::{Context, Executor};
use crate::resolver::ResolverMap;
use crate::response::{errors_from_diagnostics, ErrorCode, GraphQLError, Response};
use specql_core::LineMap;
use specql_semantic::{build_registry, validate_document, RuleName, SchemaState, ValidatedDocument};
use tracing::debug;

/// Errors from schema construction.
#[derive(Debug, Clone, thiserror::Error)]
#[error("schema build failed with {} error(s)", errors.len())]
pub struct SchemaErrors {
    pub errors: Vec<GraphQLError>,
}

/// Builds an immutable schema state from schema source text.
pub fn build_schema(source: &str) -> Result<SchemaState, SchemaErrors> {
    let line_map = LineMap::new(source);
    let parsed = specql_syntax::parse(source);
    if parsed.diagnostics.has_errors() {
        return Err(SchemaErrors {
            errors: errors_from_diagnostics(&parsed.diagnostics, &line_map, ErrorCode::SyntaxError),
        });
    }

    let outcome = build_registry(&parsed.document, source);
    if outcome.diagnostics.has_errors() {
        return Err(SchemaErrors {
            errors: errors_from_diagnostics(
                &outcome.diagnostics,
                &line_map,
                ErrorCode::SchemaError,
            ),
        });
    }
    debug!(hash = %outcome.state.hash, "schema state built");
    Ok(outcome.state)
}

/// Result of validating an operation document.
#[derive(Debug, Clone)]
pub struct Validation {
    /// The annotated document, usable by the executor when error-free.
    pub document: ValidatedDocument,
    /// Wire-shaped validation (and syntax) errors.
    pub errors: Vec<GraphQLError>,
}

impl Validation {
    /// Returns true when the document passed validation.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates an operation document against a schema. `rules` selects a rule
/// subset; `None` runs every rule.
pub fn validate(schema: &SchemaState, source: &str, rules: Option<&[RuleName]>) -> Validation {
    let document = validate_document(schema, source, rules);
    let errors = errors_from_diagnostics(
        &document.diagnostics,
        &document.line_map,
        ErrorCode::ValidationError,
    );
    Validation { document, errors }
}

/// Schema input for [`execute`]: raw source or a pre-built state.
pub enum SchemaInput<'a> {
    Source(&'a str),
    State(&'a SchemaState),
}

impl<'a> From<&'a str> for SchemaInput<'a> {
    fn from(source: &'a str) -> Self {
        Self::Source(source)
    }
}

impl<'a> From<&'a SchemaState> for SchemaInput<'a> {
    fn from(state: &'a SchemaState) -> Self {
        Self::State(state)
    }
}

/// Operation input for [`execute`]: raw source or a validated document.
pub enum OperationInput<'a> {
    Source(&'a str),
    Validated(&'a ValidatedDocument),
}

impl<'a> From<&'a str> for OperationInput<'a> {
    fn from(source: &'a str) -> Self {
        Self::Source(source)
    }
}

impl<'a> From<&'a ValidatedDocument> for OperationInput<'a> {
    fn from(validated: &'a ValidatedDocument) -> Self {
        Self::Validated(validated)
    }
}

/// Builds (if needed), validates (if needed), and executes an operation.
/// Validation errors short-circuit: execution is not attempted when any
/// exist.
pub async fn execute(
    ctx: &Context,
    schema: SchemaInput<'_>,
    resolvers: &ResolverMap,
    operation: OperationInput<'_>,
    variables: Option<serde_json::Value>,
) -> Response {
    let built;
    let schema = match schema {
        SchemaInput::State(state) => state,
        SchemaInput::Source(source) => match build_schema(source) {
            Ok(state) => {
                built = state;
                &built
            }
            Err(failure) => return Response::from_errors(failure.errors),
        },
    };

    let validated;
    let operation = match operation {
        OperationInput::Validated(doc) => doc,
        OperationInput::Source(source) => {
            let validation = validate(schema, source, None);
            if !validation.is_ok() {
                return Response::from_errors(validation.errors);
            }
            validated = validation.document;
            &validated
        }
    };

    Executor::new(schema, resolvers)
        .execute(ctx, operation, variables)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_schema_reports_syntax_errors() {
        let result = build_schema("type {");
        let failure = result.err().expect("expected syntax errors");
        assert!(!failure.errors.is_empty());
        assert_eq!(failure.errors[0].code(), Some("SYNTAX_ERROR"));
    }

    #[test]
    fn test_build_schema_reports_schema_errors() {
        let result = build_schema("type Query { dog: Doge }");
        let failure = result.err().expect("expected schema errors");
        assert_eq!(failure.errors[0].code(), Some("SCHEMA_ERROR"));
        assert!(failure.errors[0].message.contains("unknown type 'Doge'"));
    }

    #[test]
    fn test_validate_produces_wire_errors() {
        let schema = build_schema("type Query { dog: Dog } type Dog { name: String }").unwrap();
        let validation = validate(&schema, "{ dog { nome } }", None);
        assert!(!validation.is_ok());
        assert_eq!(
            validation.errors[0].message,
            "Cannot query field 'nome' on type 'Dog'."
        );
        assert_eq!(validation.errors[0].code(), Some("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_execute_from_raw_sources() {
        let resolvers = ResolverMap::new();
        let ctx = Context::new();
        let response = execute(
            &ctx,
            SchemaInput::Source("type Query { greeting: String }"),
            &resolvers,
            OperationInput::Source("{ greeting }"),
            None,
        )
        .await;
        assert!(response.is_ok(), "{:?}", response.errors);
        assert_eq!(response.data, Some(serde_json::json!({"greeting": null})));
    }

    #[tokio::test]
    async fn test_execute_refuses_invalid_operations() {
        let schema = build_schema("type Query { greeting: String }").unwrap();
        let resolvers = ResolverMap::new();
        let ctx = Context::new();
        let response = execute(
            &ctx,
            SchemaInput::State(&schema),
            &resolvers,
            OperationInput::Source("{ missing }"),
            None,
        )
        .await;
        assert!(response.data.is_none());
        assert!(!response.errors.is_empty());
    }
}
