//! The validation rules.
//!
//! Each rule is a visitor over the traversal events the runner produces; the
//! runner resolves parent types and field/argument declarations once and the
//! rules read that shared context. Rules only ever append diagnostics, so
//! composing them preserves document-traversal error order.

use crate::registry::{SchemaState, TypeKind, TypeShape, TypeSig};
use crate::validate::{ArgInfo, RuleName, ValidationContext};
use specql_syntax::ast::{
    Argument, Directive, Document, FieldSelection, FragmentDefinition, FragmentSpread,
    InlineFragment, OperationDefinition, Value, VariableDefinition,
};

/// A single validation rule.
#[allow(unused_variables)]
pub trait ValidationRule {
    fn name(&self) -> RuleName;

    fn enter_operation(&mut self, ctx: &mut ValidationContext, op: &OperationDefinition) {}
    fn enter_variable_definition(&mut self, ctx: &mut ValidationContext, var: &VariableDefinition) {
    }
    fn enter_field(&mut self, ctx: &mut ValidationContext, field: &FieldSelection) {}
    fn enter_argument(&mut self, ctx: &mut ValidationContext, argument: &Argument) {}
    fn enter_directive(&mut self, ctx: &mut ValidationContext, directive: &Directive) {}
    fn enter_fragment(&mut self, ctx: &mut ValidationContext, fragment: &FragmentDefinition) {}
    fn enter_inline_fragment(&mut self, ctx: &mut ValidationContext, inline: &InlineFragment) {}
    fn enter_fragment_spread(&mut self, ctx: &mut ValidationContext, spread: &FragmentSpread) {}
    fn leave_document(&mut self, ctx: &mut ValidationContext, doc: &Document) {}
}

/// Instantiates the requested rules in the given order.
pub fn rules_for(names: &[RuleName]) -> Vec<Box<dyn ValidationRule>> {
    names
        .iter()
        .map(|name| -> Box<dyn ValidationRule> {
            match name {
                RuleName::FieldsOnCorrectType => Box::new(FieldsOnCorrectType),
                RuleName::KnownArgumentNames => Box::new(KnownArgumentNames),
                RuleName::ProvidedRequiredArguments => Box::new(ProvidedRequiredArguments),
                RuleName::ArgumentsOfCorrectType => Box::new(ArgumentsOfCorrectType),
                RuleName::VariablesAreInputTypes => Box::new(VariablesAreInputTypes),
                RuleName::NoUnusedFragments => Box::new(NoUnusedFragments),
                RuleName::KnownFragmentNames => Box::new(KnownFragmentNames),
                RuleName::FragmentsOnCompositeTypes => Box::new(FragmentsOnCompositeTypes),
                RuleName::ScalarLeafs => Box::new(ScalarLeafs),
                RuleName::NoSubselectionAllowed => Box::new(NoSubselectionAllowed),
                RuleName::KnownDirectives => Box::new(KnownDirectives),
            }
        })
        .collect()
}

/// Every selected field must exist on its parent type.
pub struct FieldsOnCorrectType;

impl ValidationRule for FieldsOnCorrectType {
    fn name(&self) -> RuleName {
        RuleName::FieldsOnCorrectType
    }

    fn enter_field(&mut self, ctx: &mut ValidationContext, field: &FieldSelection) {
        if field.name.value == "__typename" {
            return;
        }
        let unresolved_on = ctx.current_field().and_then(|event| {
            if event.resolved.is_none() {
                event.parent_type.clone()
            } else {
                None
            }
        });
        if let Some(parent) = unresolved_on {
            ctx.report(
                self.name(),
                field.name.span,
                format!(
                    "Cannot query field '{}' on type '{parent}'.",
                    field.name.value
                ),
            );
        }
    }
}

/// Every provided argument must be declared on its field or directive.
pub struct KnownArgumentNames;

impl ValidationRule for KnownArgumentNames {
    fn name(&self) -> RuleName {
        RuleName::KnownArgumentNames
    }

    fn enter_argument(&mut self, ctx: &mut ValidationContext, argument: &Argument) {
        let name = &argument.name.value;

        if let Some(directive) = ctx.current_directive().cloned() {
            let Some(args) = &directive.resolved else {
                return;
            };
            if !args.contains_key(name) {
                let message = format!(
                    "Unknown argument '{name}' on directive '@{}'.",
                    directive.name
                );
                ctx.report(self.name(), argument.name.span, message);
            }
            return;
        }

        let Some(info) = ctx.current_field().and_then(|event| event.resolved.clone()) else {
            return;
        };
        if !info.arguments.contains_key(name) {
            ctx.report(
                self.name(),
                argument.name.span,
                format!(
                    "Unknown argument '{name}' on field '{}' of type '{}'.",
                    info.name, info.parent_type
                ),
            );
        }
    }
}

/// Required arguments without defaults must be provided.
pub struct ProvidedRequiredArguments;

impl ValidationRule for ProvidedRequiredArguments {
    fn name(&self) -> RuleName {
        RuleName::ProvidedRequiredArguments
    }

    fn enter_field(&mut self, ctx: &mut ValidationContext, field: &FieldSelection) {
        let Some(info) = ctx.current_field().and_then(|event| event.resolved.clone()) else {
            return;
        };
        for (name, arg) in &info.arguments {
            if arg.required
                && !field
                    .arguments
                    .iter()
                    .any(|provided| &provided.name.value == name)
            {
                ctx.report(
                    self.name(),
                    field.name.span,
                    format!(
                        "Missing required argument '{name}' on field '{}' of type '{}'.",
                        info.name, info.parent_type
                    ),
                );
            }
        }
    }

    fn enter_directive(&mut self, ctx: &mut ValidationContext, directive: &Directive) {
        let Some(args) = ctx
            .current_directive()
            .and_then(|event| event.resolved.clone())
        else {
            return;
        };
        for (name, arg) in &args {
            if arg.required
                && !directive
                    .arguments
                    .iter()
                    .any(|provided| &provided.name.value == name)
            {
                ctx.report(
                    self.name(),
                    directive.name.span,
                    format!(
                        "Missing required argument '{name}' on directive '@{}'.",
                        directive.name.value
                    ),
                );
            }
        }
    }
}

/// Argument values must match their declared types; variable usages must be
/// compatible with the position they appear in.
pub struct ArgumentsOfCorrectType;

impl ValidationRule for ArgumentsOfCorrectType {
    fn name(&self) -> RuleName {
        RuleName::ArgumentsOfCorrectType
    }

    fn enter_argument(&mut self, ctx: &mut ValidationContext, argument: &Argument) {
        let declared: Option<ArgInfo> = if let Some(directive) = ctx.current_directive() {
            directive
                .resolved
                .as_ref()
                .and_then(|args| args.get(&argument.name.value))
                .cloned()
        } else {
            ctx.current_field()
                .and_then(|event| event.resolved.as_ref())
                .and_then(|info| info.arguments.get(&argument.name.value))
                .cloned()
        };

        if let Some(sig) = declared.and_then(|arg| arg.sig) {
            check_value(ctx, self.name(), &argument.value, &sig);
        }
    }
}

/// Variable types must be scalars, enums, or input objects.
pub struct VariablesAreInputTypes;

impl ValidationRule for VariablesAreInputTypes {
    fn name(&self) -> RuleName {
        RuleName::VariablesAreInputTypes
    }

    fn enter_variable_definition(&mut self, ctx: &mut ValidationContext, var: &VariableDefinition) {
        let base = &var.ty.base().name;
        match ctx.kind_of(base) {
            None => {
                let message =
                    format!("Unknown type '{base}' for variable '${}'.", var.name.value);
                ctx.report(self.name(), var.ty.span(), message);
            }
            Some(kind) if !kind.is_input() => {
                let message = format!(
                    "Variable '${}' cannot be of non-input type '{}'.",
                    var.name.value, var.ty
                );
                ctx.report(self.name(), var.ty.span(), message);
            }
            Some(_) => {}
        }
    }
}

/// Every declared fragment must be spread at least once.
pub struct NoUnusedFragments;

impl ValidationRule for NoUnusedFragments {
    fn name(&self) -> RuleName {
        RuleName::NoUnusedFragments
    }

    fn leave_document(&mut self, ctx: &mut ValidationContext, _doc: &Document) {
        let unused: Vec<_> = ctx
            .fragment_definitions
            .iter()
            .filter(|(name, _)| !ctx.used_fragments.contains(*name))
            .map(|(name, info)| (name.clone(), info.name_span))
            .collect();
        for (name, span) in unused {
            ctx.report(self.name(), span, format!("Fragment '{name}' is never used."));
        }
    }
}

/// Every fragment spread must name a declared fragment.
pub struct KnownFragmentNames;

impl ValidationRule for KnownFragmentNames {
    fn name(&self) -> RuleName {
        RuleName::KnownFragmentNames
    }

    fn enter_fragment_spread(&mut self, ctx: &mut ValidationContext, spread: &FragmentSpread) {
        if !ctx.fragment_definitions.contains_key(&spread.name.value) {
            ctx.report(
                self.name(),
                spread.name.span,
                format!("Unknown fragment '{}'.", spread.name.value),
            );
        }
    }
}

/// Fragment type conditions must name object, interface, or union types.
pub struct FragmentsOnCompositeTypes;

impl FragmentsOnCompositeTypes {
    fn check_condition(
        &self,
        ctx: &mut ValidationContext,
        condition: &specql_syntax::ast::Name,
        owner: Option<&str>,
    ) {
        match ctx.kind_of(&condition.value) {
            None => {
                let message = format!("Unknown type '{}' in fragment type condition.", condition.value);
                ctx.report(self.name(), condition.span, message);
            }
            Some(kind) if !kind.is_composite() => {
                let message = match owner {
                    Some(name) => format!(
                        "Fragment '{name}' cannot condition on non-composite type '{}'.",
                        condition.value
                    ),
                    None => format!(
                        "Fragment cannot condition on non-composite type '{}'.",
                        condition.value
                    ),
                };
                ctx.report(self.name(), condition.span, message);
            }
            Some(_) => {}
        }
    }
}

impl ValidationRule for FragmentsOnCompositeTypes {
    fn name(&self) -> RuleName {
        RuleName::FragmentsOnCompositeTypes
    }

    fn enter_fragment(&mut self, ctx: &mut ValidationContext, fragment: &FragmentDefinition) {
        let owner = fragment.name.value.clone();
        self.check_condition(ctx, &fragment.type_condition, Some(&owner));
    }

    fn enter_inline_fragment(&mut self, ctx: &mut ValidationContext, inline: &InlineFragment) {
        if let Some(condition) = &inline.type_condition {
            self.check_condition(ctx, condition, None);
        }
    }
}

/// Composite-typed fields must have sub-selections.
pub struct ScalarLeafs;

impl ValidationRule for ScalarLeafs {
    fn name(&self) -> RuleName {
        RuleName::ScalarLeafs
    }

    fn enter_field(&mut self, ctx: &mut ValidationContext, field: &FieldSelection) {
        if field.selection_set.is_some() {
            return;
        }
        let Some(sig) = ctx
            .current_field()
            .and_then(|event| event.resolved.as_ref())
            .and_then(|info| info.sig.clone())
        else {
            return;
        };
        if ctx
            .kind_of(sig.base_name())
            .is_some_and(TypeKind::is_composite)
        {
            ctx.report(
                self.name(),
                field.name.span,
                format!(
                    "Field '{}' of type '{sig}' must have a selection of subfields.",
                    field.name.value
                ),
            );
        }
    }
}

/// Scalar and enum fields must not have sub-selections.
pub struct NoSubselectionAllowed;

impl ValidationRule for NoSubselectionAllowed {
    fn name(&self) -> RuleName {
        RuleName::NoSubselectionAllowed
    }

    fn enter_field(&mut self, ctx: &mut ValidationContext, field: &FieldSelection) {
        if field.selection_set.is_none() {
            return;
        }
        if field.name.value == "__typename" {
            ctx.report(
                self.name(),
                field.name.span,
                "Field '__typename' must not have a selection since type 'String!' has no subfields."
                    .to_string(),
            );
            return;
        }
        let Some(sig) = ctx
            .current_field()
            .and_then(|event| event.resolved.as_ref())
            .and_then(|info| info.sig.clone())
        else {
            return;
        };
        if matches!(
            ctx.kind_of(sig.base_name()),
            Some(TypeKind::Scalar) | Some(TypeKind::Enum)
        ) {
            ctx.report(
                self.name(),
                field.name.span,
                format!(
                    "Field '{}' must not have a selection since type '{sig}' has no subfields.",
                    field.name.value
                ),
            );
        }
    }
}

/// Every directive must be declared (built-in or in the schema).
pub struct KnownDirectives;

impl ValidationRule for KnownDirectives {
    fn name(&self) -> RuleName {
        RuleName::KnownDirectives
    }

    fn enter_directive(&mut self, ctx: &mut ValidationContext, directive: &Directive) {
        let unknown = ctx
            .current_directive()
            .is_some_and(|event| event.resolved.is_none());
        if unknown {
            ctx.report(
                self.name(),
                directive.name.span,
                format!("Unknown directive '@{}'.", directive.name.value),
            );
        }
    }
}

/// Checks a literal (or variable usage) against an expected type signature.
fn check_value(ctx: &mut ValidationContext, rule: RuleName, value: &Value, expected: &TypeSig) {
    let schema: &SchemaState = ctx.schema;

    if let Value::Variable(name) = value {
        let Some(var) = ctx.variable_definitions.get(&name.value).cloned() else {
            ctx.report(
                rule,
                name.span,
                format!("Variable '${}' is not defined.", name.value),
            );
            return;
        };
        if let Some(var_sig) = &var.sig {
            if !variable_allowed(var_sig, expected, var.has_default) {
                ctx.report(
                    rule,
                    name.span,
                    format!(
                        "Variable '${}' of type '{var_sig}' used in position expecting type '{expected}'.",
                        name.value
                    ),
                );
            }
        }
        return;
    }

    match expected {
        TypeSig::NonNull(inner) => {
            if matches!(value, Value::Null(_)) {
                ctx.report(
                    rule,
                    value.span(),
                    format!("Expected value of type '{expected}', found null."),
                );
            } else {
                check_value(ctx, rule, value, inner);
            }
        }
        TypeSig::List(inner) => match value {
            Value::Null(_) => {}
            Value::List(items, _) => {
                for item in items {
                    check_value(ctx, rule, item, inner);
                }
            }
            // A single value coerces to a one-element list.
            other => check_value(ctx, rule, other, inner),
        },
        TypeSig::Named(name) => check_named(ctx, rule, value, name, schema),
    }
}

fn check_named(
    ctx: &mut ValidationContext,
    rule: RuleName,
    value: &Value,
    type_name: &str,
    schema: &SchemaState,
) {
    if matches!(value, Value::Null(_)) {
        return;
    }
    let Some(shape) = schema.shape(type_name) else {
        return;
    };

    match shape {
        TypeShape::Scalar { name } => {
            let ok = match name.as_str() {
                "Int" => match value {
                    Value::Int(n, _) => i32::try_from(*n).is_ok(),
                    _ => false,
                },
                "Float" => matches!(value, Value::Int(..) | Value::Float(..)),
                "String" => matches!(value, Value::String(..)),
                "Boolean" => matches!(value, Value::Boolean(..)),
                "ID" => matches!(value, Value::String(..) | Value::Int(..)),
                // Custom scalars accept any literal.
                _ => true,
            };
            if !ok {
                ctx.report(
                    rule,
                    value.span(),
                    format!(
                        "Expected value of type '{name}', found {}.",
                        value.kind_str()
                    ),
                );
            }
        }
        TypeShape::Enum { name, values } => match value {
            Value::Enum(enum_value) => {
                if !values.contains(&enum_value.value) {
                    ctx.report(
                        rule,
                        enum_value.span,
                        format!(
                            "Value '{}' is not a valid value for enum '{name}'.",
                            enum_value.value
                        ),
                    );
                }
            }
            other => {
                ctx.report(
                    rule,
                    other.span(),
                    format!("Expected value of type '{name}', found {}.", other.kind_str()),
                );
            }
        },
        TypeShape::InputObject { name, fields } => match value {
            Value::Object(provided, span) => {
                let field_sigs: Vec<(String, Option<TypeSig>, bool)> = fields
                    .iter()
                    .map(|(field_name, field)| {
                        (
                            field_name.clone(),
                            schema.spec_map.signature(&field.spec),
                            field.required,
                        )
                    })
                    .collect();

                for (provided_name, provided_value) in provided {
                    match field_sigs
                        .iter()
                        .find(|(field_name, _, _)| field_name == &provided_name.value)
                    {
                        Some((_, Some(sig), _)) => {
                            let sig = sig.clone();
                            check_value(ctx, rule, provided_value, &sig);
                        }
                        Some((_, None, _)) => {}
                        None => {
                            ctx.report(
                                rule,
                                provided_name.span,
                                format!(
                                    "Unknown field '{}' on input object '{name}'.",
                                    provided_name.value
                                ),
                            );
                        }
                    }
                }

                for (field_name, _, required) in &field_sigs {
                    if *required
                        && !provided
                            .iter()
                            .any(|(provided_name, _)| &provided_name.value == field_name)
                    {
                        ctx.report(
                            rule,
                            *span,
                            format!("Missing required input field '{field_name}' on '{name}'."),
                        );
                    }
                }
            }
            other => {
                ctx.report(
                    rule,
                    other.span(),
                    format!("Expected value of type '{name}', found {}.", other.kind_str()),
                );
            }
        },
        composite => {
            if let Some(name) = composite.name() {
                ctx.report(
                    rule,
                    value.span(),
                    format!("Type '{name}' is not an input type."),
                );
            }
        }
    }
}

/// GraphQL variable-position compatibility: the variable's type must be at
/// least as strict as the position's type. A variable with a default may fill
/// a non-null position of the same inner type.
fn variable_allowed(var: &TypeSig, location: &TypeSig, has_default: bool) -> bool {
    match location {
        TypeSig::NonNull(inner) => match var {
            TypeSig::NonNull(var_inner) => variable_allowed(var_inner, inner, false),
            _ => has_default && variable_allowed(var, inner, false),
        },
        _ => {
            let var = var.unwrap_non_null();
            match (var, location) {
                (TypeSig::List(var_inner), TypeSig::List(loc_inner)) => {
                    variable_allowed(var_inner, loc_inner, false)
                }
                (TypeSig::Named(a), TypeSig::Named(b)) => a == b,
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::build_registry;
    use crate::validate::{validate_document, RuleName, ValidatedDocument};
    use specql_core::Location;
    use specql_syntax::parse;

    const PETS: &str = "type Query { dog: Dog human: Human }\n\
        type Dog { name: String }\n\
        type Human { pets: [Pet] }\n\
        type Pet { name: String }";

    const PETS_WITH_FRIENDS: &str = "type Query { dog: Dog human: Human }\n\
        type Dog { name: String }\n\
        type Human { pets: [Pet] }\n\
        type Pet { name: String friends: [Dog] }";

    fn schema(source: &str) -> crate::registry::SchemaState {
        let parsed = parse(source);
        let outcome = build_registry(&parsed.document, source);
        assert!(outcome.is_ok(), "schema build failed: {:?}", outcome.diagnostics);
        outcome.state
    }

    fn validate(schema_source: &str, query: &str) -> ValidatedDocument {
        let state = schema(schema_source);
        validate_document(&state, query, None)
    }

    fn messages(validated: &ValidatedDocument) -> Vec<String> {
        validated
            .diagnostics
            .errors()
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn test_valid_query_passes() {
        let state = schema(PETS);
        let validated = validate_document(
            &state,
            "{ dog { name } }",
            Some(&[RuleName::FieldsOnCorrectType]),
        );
        assert!(validated.is_valid());
    }

    #[test]
    fn test_valid_nested_list_query_passes() {
        let validated = validate(PETS, "{ human { pets { name } } }");
        assert!(validated.is_valid(), "{:?}", messages(&validated));
    }

    #[test]
    fn test_unknown_field_reports_parent_type_and_location() {
        let validated = validate(PETS, "{ dog { nome } }");
        let errors = messages(&validated);
        assert_eq!(errors, vec!["Cannot query field 'nome' on type 'Dog'."]);

        let span = validated
            .diagnostics
            .errors()
            .next()
            .unwrap()
            .primary_span()
            .unwrap();
        assert_eq!(validated.line_map.span_location(span), Location::new(1, 9));
    }

    #[test]
    fn test_unknown_field_on_list_element_type() {
        let validated = validate(PETS, "{ human { pets { nome } } }");
        assert_eq!(
            messages(&validated),
            vec!["Cannot query field 'nome' on type 'Pet'."]
        );
    }

    #[test]
    fn test_unknown_field_does_not_cascade() {
        // 'friends' does not exist on this Pet. The selections underneath it
        // have no resolvable parent and must stay silent; exactly one error.
        let validated = validate(PETS, "{ human { pets { friends { nome } } } }");
        assert_eq!(
            messages(&validated),
            vec!["Cannot query field 'friends' on type 'Pet'."]
        );
    }

    #[test]
    fn test_error_lands_on_deepest_resolvable_parent() {
        // Here 'pets' and 'friends' both resolve, so the parent-type walk
        // carries all the way down to Dog and only the leaf fails. Still
        // exactly one error, at the deepest resolvable ancestor's type.
        let validated = validate(PETS_WITH_FRIENDS, "{ human { pets { friends { nome } } } }");
        assert_eq!(
            messages(&validated),
            vec!["Cannot query field 'nome' on type 'Dog'."]
        );
    }

    #[test]
    fn test_field_bindings_are_annotated() {
        let state = schema(PETS);
        let validated = validate_document(&state, "{ dog { name } }", None);
        assert!(validated.is_valid());
        // Both selections carry spec annotations after validation.
        assert!(validated.overlay.binding_count() >= 2);
    }

    #[test]
    fn test_unknown_argument() {
        let validated = validate(PETS, "{ dog(id: 1) { name } }");
        assert_eq!(
            messages(&validated),
            vec!["Unknown argument 'id' on field 'dog' of type 'Query'."]
        );
    }

    #[test]
    fn test_missing_required_argument() {
        let source = "type Query { square(n: Int!): Int }";
        let validated = validate(source, "{ square }");
        assert_eq!(
            messages(&validated),
            vec!["Missing required argument 'n' on field 'square' of type 'Query'."]
        );
    }

    #[test]
    fn test_default_satisfies_required_argument() {
        let source = "type Query { square(n: Int! = 3): Int }";
        let validated = validate(source, "{ square }");
        assert!(validated.is_valid(), "{:?}", messages(&validated));
    }

    #[test]
    fn test_argument_type_mismatch() {
        let source = "type Query { square(n: Int): Int }";
        let validated = validate(source, "{ square(n: \"nine\") }");
        assert_eq!(
            messages(&validated),
            vec!["Expected value of type 'Int', found string."]
        );
    }

    #[test]
    fn test_int_rejects_float_literal() {
        let source = "type Query { square(n: Int): Int }";
        let validated = validate(source, "{ square(n: 1.0) }");
        assert!(!validated.is_valid());
    }

    #[test]
    fn test_float_accepts_int_literal() {
        let source = "type Query { half(x: Float): Float }";
        let validated = validate(source, "{ half(x: 3) }");
        assert!(validated.is_valid(), "{:?}", messages(&validated));
    }

    #[test]
    fn test_non_null_argument_rejects_null() {
        let source = "type Query { square(n: Int!): Int }";
        let validated = validate(source, "{ square(n: null) }");
        assert_eq!(
            messages(&validated),
            vec!["Expected value of type 'Int!', found null."]
        );
    }

    #[test]
    fn test_variable_usage_compatible() {
        let source = "type Query { square(n: Int): Int }";
        let validated = validate(source, "query ($x: Int) { square(n: $x) }");
        assert!(validated.is_valid(), "{:?}", messages(&validated));
    }

    #[test]
    fn test_nullable_variable_in_non_null_position() {
        let source = "type Query { square(n: Int!): Int }";
        let validated = validate(source, "query ($x: Int) { square(n: $x) }");
        assert_eq!(
            messages(&validated),
            vec!["Variable '$x' of type 'Int' used in position expecting type 'Int!'."]
        );
    }

    #[test]
    fn test_variable_with_default_in_non_null_position() {
        let source = "type Query { square(n: Int!): Int }";
        let validated = validate(source, "query ($x: Int = 3) { square(n: $x) }");
        assert!(validated.is_valid(), "{:?}", messages(&validated));
    }

    #[test]
    fn test_undefined_variable() {
        let source = "type Query { square(n: Int): Int }";
        let validated = validate(source, "{ square(n: $ghost) }");
        assert_eq!(messages(&validated), vec!["Variable '$ghost' is not defined."]);
    }

    #[test]
    fn test_variables_must_be_input_types() {
        let validated = validate(PETS, "query ($d: Dog) { dog { name } }");
        assert_eq!(
            messages(&validated),
            vec!["Variable '$d' cannot be of non-input type 'Dog'."]
        );
    }

    #[test]
    fn test_unused_fragment() {
        let validated = validate(
            PETS,
            "{ dog { name } } fragment dogFields on Dog { name }",
        );
        assert_eq!(messages(&validated), vec!["Fragment 'dogFields' is never used."]);
    }

    #[test]
    fn test_unknown_fragment() {
        let validated = validate(PETS, "{ dog { ...ghost } }");
        assert_eq!(messages(&validated), vec!["Unknown fragment 'ghost'."]);
    }

    #[test]
    fn test_fragment_on_non_composite_type() {
        let validated = validate(
            PETS,
            "{ dog { ...strFields } } fragment strFields on String { length }",
        );
        let errors = messages(&validated);
        assert!(errors
            .iter()
            .any(|m| m.contains("cannot condition on non-composite type 'String'")));
    }

    #[test]
    fn test_scalar_leafs_requires_subselection() {
        let validated = validate(PETS, "{ dog }");
        assert_eq!(
            messages(&validated),
            vec!["Field 'dog' of type 'Dog' must have a selection of subfields."]
        );
    }

    #[test]
    fn test_no_subselection_on_scalar() {
        let validated = validate(PETS, "{ dog { name { length } } }");
        assert_eq!(
            messages(&validated),
            vec!["Field 'name' must not have a selection since type 'String' has no subfields."]
        );
    }

    #[test]
    fn test_unknown_directive() {
        let validated = validate(PETS, "{ dog @uppercase { name } }");
        assert_eq!(messages(&validated), vec!["Unknown directive '@uppercase'."]);
    }

    #[test]
    fn test_include_directive_is_known() {
        let validated = validate(PETS, "{ dog @include(if: true) { name } }");
        assert!(validated.is_valid(), "{:?}", messages(&validated));
    }

    #[test]
    fn test_include_requires_if_argument() {
        let validated = validate(PETS, "{ dog @include { name } }");
        assert_eq!(
            messages(&validated),
            vec!["Missing required argument 'if' on directive '@include'."]
        );
    }

    #[test]
    fn test_typename_is_always_valid() {
        let validated = validate(PETS, "{ __typename dog { __typename name } }");
        assert!(validated.is_valid(), "{:?}", messages(&validated));
    }

    #[test]
    fn test_selected_rule_subset_only() {
        let state = schema(PETS);
        // The query has both an unknown field and a missing subselection, but
        // only FieldsOnCorrectType runs.
        let validated = validate_document(
            &state,
            "{ dog { nome } human }",
            Some(&[RuleName::FieldsOnCorrectType]),
        );
        assert_eq!(
            messages(&validated),
            vec!["Cannot query field 'nome' on type 'Dog'."]
        );
    }

    #[test]
    fn test_inline_fragment_type_condition_scopes_fields() {
        let source = "type Query { pet: Pet }\n\
            interface Pet { name: String }\n\
            type Dog implements Pet { name: String barks: Boolean }";
        let validated = validate(source, "{ pet { ... on Dog { barks } } }");
        assert!(validated.is_valid(), "{:?}", messages(&validated));
    }

    #[test]
    fn test_enum_value_validation() {
        let source = "type Query { walk(direction: Direction): Boolean }\n\
            enum Direction { NORTH SOUTH }";
        let ok = validate(source, "{ walk(direction: NORTH) }");
        assert!(ok.is_valid(), "{:?}", messages(&ok));

        let bad = validate(source, "{ walk(direction: UP) }");
        assert_eq!(
            messages(&bad),
            vec!["Value 'UP' is not a valid value for enum 'Direction'."]
        );
    }

    #[test]
    fn test_input_object_validation() {
        let source = "type Query { find(filter: Filter): Int }\n\
            input Filter { name: String! limit: Int }";
        let ok = validate(source, "{ find(filter: {name: \"a\", limit: 3}) }");
        assert!(ok.is_valid(), "{:?}", messages(&ok));

        let missing = validate(source, "{ find(filter: {limit: 3}) }");
        assert_eq!(
            messages(&missing),
            vec!["Missing required input field 'name' on 'Filter'."]
        );

        let unknown = validate(source, "{ find(filter: {name: \"a\", depth: 1}) }");
        assert_eq!(
            messages(&unknown),
            vec!["Unknown field 'depth' on input object 'Filter'."]
        );
    }

    #[test]
    fn test_errors_accumulate_in_traversal_order() {
        let validated = validate(PETS, "{ dog { nome } human { age } }");
        assert_eq!(
            messages(&validated),
            vec![
                "Cannot query field 'nome' on type 'Dog'.",
                "Cannot query field 'age' on type 'Human'.",
            ]
        );
    }
}
