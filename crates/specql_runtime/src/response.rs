//! Wire-shaped responses and errors.
//!
//! The top-level response is `{data?, errors?}`; each error carries a
//! message, source locations, the response path where it occurred, and a
//! typed code under `extensions.code`.

use serde::{Deserialize, Serialize};
use specql_core::{DiagnosticBag, LineMap, Location};
use std::collections::HashMap;

/// Typed error codes, rendered into `extensions.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    /// Schema construction failed.
    SchemaError,
    /// The parser rejected the document.
    SyntaxError,
    /// A validation rule was violated.
    ValidationError,
    /// Missing, unknown, or mistyped argument at runtime.
    ArgumentError,
    /// A resolver signalled failure or returned an uncoercible value.
    ResolverError,
    /// Null was produced where the declared type forbids it.
    NonNullViolation,
    /// An engine invariant was broken.
    InternalError,
    /// The execution was cancelled by the host.
    Cancelled,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaError => "SCHEMA_ERROR",
            Self::SyntaxError => "SYNTAX_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ArgumentError => "ARGUMENT_ERROR",
            Self::ResolverError => "RESOLVER_ERROR",
            Self::NonNullViolation => "NON_NULL_VIOLATION",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A segment of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// A structured error in the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,
    /// Source locations the error points at.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<Location>,
    /// The response path to the originating field.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub path: Vec<PathSegment>,
    /// Error extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

impl GraphQLError {
    /// Creates a new error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }

    /// Adds a source location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Sets the response path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Records the typed code under `extensions.code`.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.extensions
            .get_or_insert_with(HashMap::new)
            .insert("code".to_string(), serde_json::json!(code.as_str()));
        self
    }

    /// Returns the typed code recorded in the extensions, if any.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(|code| code.as_str())
    }
}

/// A GraphQL response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The data. Absent only when the operation could not be started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// The errors. Absent when none occurred.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<GraphQLError>,
}

impl Response {
    /// A successful response.
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// A response that failed before execution started.
    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        Self { data: None, errors }
    }

    /// Returns true if no errors were recorded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Converts accumulated diagnostics into wire errors, resolving spans to
/// line/column locations.
pub fn errors_from_diagnostics(
    diagnostics: &DiagnosticBag,
    line_map: &LineMap,
    code: ErrorCode,
) -> Vec<GraphQLError> {
    diagnostics
        .errors()
        .map(|diagnostic| {
            let mut error = GraphQLError::new(diagnostic.message.clone()).with_code(code);
            if let Some(span) = diagnostic.primary_span() {
                error = error.with_location(line_map.span_location(span));
            }
            error
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization_shape() {
        let error = GraphQLError::new("Cannot query field 'nome' on type 'Dog'.")
            .with_location(Location::new(1, 9))
            .with_code(ErrorCode::ValidationError);
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["message"], "Cannot query field 'nome' on type 'Dog'.");
        assert_eq!(json["locations"][0]["line"], 1);
        assert_eq!(json["locations"][0]["column"], 9);
        assert_eq!(json["extensions"]["code"], "VALIDATION_ERROR");
        assert!(json.get("path").is_none());
    }

    #[test]
    fn test_path_segments_serialize_untagged() {
        let error = GraphQLError::new("boom").with_path(vec![
            PathSegment::Field("pets".to_string()),
            PathSegment::Index(2),
            PathSegment::Field("name".to_string()),
        ]);
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["path"], serde_json::json!(["pets", 2, "name"]));
    }

    #[test]
    fn test_response_skips_empty_parts() {
        let response = Response::data(serde_json::json!({"f": 9}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("errors"));

        let response = Response::from_errors(vec![GraphQLError::new("boom")]);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("data"));
    }
}
