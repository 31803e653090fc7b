//! Evaluation of the built-in `@include` and `@skip` directives.
//!
//! Both are evaluated during field collection: `@skip(if: true)` and
//! `@include(if: false)` drop the selection they annotate. Unknown
//! directives are a validation concern and are ignored here.

use specql_core::Span;
use specql_syntax::ast::{Directive, Value};

/// A directive evaluation failure, pointing at the offending node.
#[derive(Debug, Clone)]
pub struct DirectiveError {
    pub span: Span,
    pub message: String,
}

/// Decides whether a selection annotated with `directives` is included,
/// resolving `if` arguments against the coerced variable values.
pub fn selection_included(
    directives: &[Directive],
    variables: &serde_json::Map<String, serde_json::Value>,
) -> Result<bool, DirectiveError> {
    for directive in directives {
        let negate = match directive.name.value.as_str() {
            "skip" => true,
            "include" => false,
            _ => continue,
        };

        let condition = directive
            .arguments
            .iter()
            .find(|argument| argument.name.value == "if");
        let Some(condition) = condition else {
            return Err(DirectiveError {
                span: directive.span,
                message: format!(
                    "Missing required argument 'if' on directive '@{}'.",
                    directive.name.value
                ),
            });
        };

        let flag = match &condition.value {
            Value::Boolean(flag, _) => *flag,
            Value::Variable(name) => match variables.get(&name.value) {
                Some(serde_json::Value::Bool(flag)) => *flag,
                Some(other) => {
                    return Err(DirectiveError {
                        span: name.span,
                        message: format!(
                            "Variable '${}' used by '@{}' must be a Boolean, found {other}.",
                            name.value, directive.name.value
                        ),
                    });
                }
                None => {
                    return Err(DirectiveError {
                        span: name.span,
                        message: format!(
                            "Variable '${}' used by '@{}' was not provided.",
                            name.value, directive.name.value
                        ),
                    });
                }
            },
            other => {
                return Err(DirectiveError {
                    span: other.span(),
                    message: format!(
                        "Argument 'if' of '@{}' must be a Boolean literal or variable.",
                        directive.name.value
                    ),
                });
            }
        };

        if flag == negate {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use specql_syntax::ast::{Definition, Selection};

    fn field_directives(query: &str) -> Vec<Directive> {
        let parsed = specql_syntax::parse(query);
        let Definition::Operation(op) = &parsed.document.definitions[0] else {
            panic!("expected operation");
        };
        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        field.directives.clone()
    }

    fn vars(pairs: &[(&str, serde_json::Value)]) -> serde_json::Map<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_skip_true_drops_selection() {
        let directives = field_directives("{ f @skip(if: true) }");
        assert!(!selection_included(&directives, &vars(&[])).unwrap());
    }

    #[test]
    fn test_include_false_drops_selection() {
        let directives = field_directives("{ f @include(if: false) }");
        assert!(!selection_included(&directives, &vars(&[])).unwrap());
    }

    #[test]
    fn test_include_true_keeps_selection() {
        let directives = field_directives("{ f @include(if: true) }");
        assert!(selection_included(&directives, &vars(&[])).unwrap());
    }

    #[test]
    fn test_variable_condition() {
        let directives = field_directives("{ f @skip(if: $flag) }");
        let included =
            selection_included(&directives, &vars(&[("flag", serde_json::json!(false))]));
        assert!(included.unwrap());

        let skipped =
            selection_included(&directives, &vars(&[("flag", serde_json::json!(true))]));
        assert!(!skipped.unwrap());
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let directives = field_directives("{ f @skip(if: $ghost) }");
        let result = selection_included(&directives, &vars(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_boolean_variable_is_an_error() {
        let directives = field_directives("{ f @include(if: $flag) }");
        let result = selection_included(&directives, &vars(&[("flag", serde_json::json!(1))]));
        assert!(result.is_err());
    }

    #[test]
    fn test_unrelated_directives_are_ignored() {
        let directives = field_directives("{ f @traced }");
        assert!(selection_included(&directives, &vars(&[])).unwrap());
    }
}
