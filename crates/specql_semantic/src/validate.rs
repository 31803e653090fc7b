//! Operation validation.
//!
//! The validator walks an operation document once, maintaining the current
//! parent-type context, and dispatches each node to the active rules in
//! declared order. Rules are independently addressable so callers can request
//! a subset. Errors accumulate; there is no early exit.

use crate::overlay::OperationOverlay;
use crate::registry::{SchemaState, TypeKind, TypeSig};
use crate::rules::{rules_for, ValidationRule};
use crate::spec::{is_builtin_scalar, ScopeHash, SpecId};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use specql_core::{codes, DiagnosticBag, LineMap, Span};
use specql_syntax::ast::{
    Argument, Directive, Document, FieldSelection, FragmentDefinition, FragmentSpread,
    InlineFragment, OperationDefinition, Type, VariableDefinition,
};
use specql_syntax::visit::{walk_document, Node, Visitor};
use tracing::debug;

/// Identifiers of the validation rules, exposed for selective validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleName {
    FieldsOnCorrectType,
    KnownArgumentNames,
    ProvidedRequiredArguments,
    ArgumentsOfCorrectType,
    VariablesAreInputTypes,
    NoUnusedFragments,
    KnownFragmentNames,
    FragmentsOnCompositeTypes,
    ScalarLeafs,
    NoSubselectionAllowed,
    KnownDirectives,
}

impl RuleName {
    /// All rules, in default execution order.
    pub fn all() -> Vec<RuleName> {
        vec![
            Self::FieldsOnCorrectType,
            Self::KnownArgumentNames,
            Self::ProvidedRequiredArguments,
            Self::ArgumentsOfCorrectType,
            Self::VariablesAreInputTypes,
            Self::NoUnusedFragments,
            Self::KnownFragmentNames,
            Self::FragmentsOnCompositeTypes,
            Self::ScalarLeafs,
            Self::NoSubselectionAllowed,
            Self::KnownDirectives,
        ]
    }

    /// Returns the rule identifier string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FieldsOnCorrectType => "FieldsOnCorrectType",
            Self::KnownArgumentNames => "KnownArgumentNames",
            Self::ProvidedRequiredArguments => "ProvidedRequiredArguments",
            Self::ArgumentsOfCorrectType => "ArgumentsOfCorrectType",
            Self::VariablesAreInputTypes => "VariablesAreInputTypes",
            Self::NoUnusedFragments => "NoUnusedFragments",
            Self::KnownFragmentNames => "KnownFragmentNames",
            Self::FragmentsOnCompositeTypes => "FragmentsOnCompositeTypes",
            Self::ScalarLeafs => "ScalarLeafs",
            Self::NoSubselectionAllowed => "NoSubselectionAllowed",
            Self::KnownDirectives => "KnownDirectives",
        }
    }
}

impl std::fmt::Display for RuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleName::all()
            .into_iter()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| format!("unknown validation rule '{s}'"))
    }
}

/// Resolved information about an argument declaration.
#[derive(Debug, Clone)]
pub struct ArgInfo {
    pub name: String,
    pub spec: SpecId,
    pub sig: Option<TypeSig>,
    pub required: bool,
}

/// Resolved information about the field a selection bound to.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub parent_type: String,
    pub name: String,
    pub spec: SpecId,
    pub sig: Option<TypeSig>,
    pub arguments: IndexMap<String, ArgInfo>,
}

/// Per-field traversal event exposed to rules.
#[derive(Debug, Clone)]
pub struct FieldEvent {
    /// Name of the parent composite type, when the nearest spec-carrying
    /// ancestor resolved.
    pub parent_type: Option<String>,
    /// The bound field declaration; `None` for unknown fields and
    /// `__typename`.
    pub resolved: Option<FieldInfo>,
}

/// Per-directive traversal event exposed to rules.
#[derive(Debug, Clone)]
pub struct DirectiveEvent {
    pub name: String,
    /// Declared arguments; `None` when the directive is unknown.
    pub resolved: Option<IndexMap<String, ArgInfo>>,
}

/// A declared operation variable.
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub sig: Option<TypeSig>,
    pub has_default: bool,
    pub span: Span,
}

/// A declared fragment.
#[derive(Debug, Clone)]
pub struct FragmentInfo {
    pub type_condition: String,
    pub name_span: Span,
}

/// Shared state the rules read and report through.
pub struct ValidationContext<'a> {
    pub schema: &'a SchemaState,
    pub overlay: &'a mut OperationOverlay,
    pub diagnostics: DiagnosticBag,
    /// Fragments declared in the document, in source order.
    pub fragment_definitions: IndexMap<String, FragmentInfo>,
    pub used_fragments: FxHashSet<String>,
    /// Variables of the operation currently being traversed.
    pub variable_definitions: IndexMap<String, VariableInfo>,
    type_stack: Vec<Option<SpecId>>,
    field_events: Vec<FieldEvent>,
    directive_event: Option<DirectiveEvent>,
}

impl<'a> ValidationContext<'a> {
    fn new(schema: &'a SchemaState, overlay: &'a mut OperationOverlay) -> Self {
        Self {
            schema,
            overlay,
            diagnostics: DiagnosticBag::new(),
            fragment_definitions: IndexMap::new(),
            used_fragments: FxHashSet::default(),
            variable_definitions: IndexMap::new(),
            type_stack: Vec::new(),
            field_events: Vec::new(),
            directive_event: None,
        }
    }

    /// Reports a rule violation.
    pub fn report(&mut self, rule: RuleName, span: Span, message: impl Into<String>) {
        self.diagnostics.error(rule.as_str(), message, span);
    }

    /// Returns the event for the field currently being visited.
    pub fn current_field(&self) -> Option<&FieldEvent> {
        self.field_events.last()
    }

    /// Returns the event for the directive currently being visited.
    pub fn current_directive(&self) -> Option<&DirectiveEvent> {
        self.directive_event.as_ref()
    }

    /// Returns the kind of a named type, if declared.
    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.schema.shape(name).map(|shape| shape.kind())
    }

    /// Current parent composite type name, if resolvable.
    fn parent_type_name(&self) -> Option<String> {
        let spec = self.type_stack.last()?.as_ref()?;
        self.schema
            .spec_map
            .resolve(spec)
            .and_then(|shape| shape.name())
            .map(str::to_string)
    }
}

struct Runner<'a> {
    ctx: ValidationContext<'a>,
    rules: Vec<Box<dyn ValidationRule>>,
}

macro_rules! dispatch {
    ($self:ident, $hook:ident, $node:expr) => {
        let Runner { ctx, rules } = $self;
        for rule in rules.iter_mut() {
            rule.$hook(ctx, $node);
        }
    };
}

impl Visitor for Runner<'_> {
    fn enter_operation(&mut self, op: &OperationDefinition, _path: &[Node<'_>]) {
        self.ctx.variable_definitions.clear();
        let root = self.ctx.schema.root(op.operation).cloned();
        if root.is_none() {
            self.ctx.diagnostics.error(
                codes::MISSING_ROOT,
                format!("schema has no {} root type", op.operation),
                op.span,
            );
        }
        if let Some(root) = &root {
            self.ctx.overlay.bind(op.span, root.clone());
        }
        self.ctx.type_stack.push(root);
        dispatch!(self, enter_operation, op);
    }

    fn leave_operation(&mut self, _op: &OperationDefinition, _path: &[Node<'_>]) {
        self.ctx.type_stack.pop();
    }

    fn enter_variable_definition(&mut self, var: &VariableDefinition, _path: &[Node<'_>]) {
        self.register_variable(var);
        dispatch!(self, enter_variable_definition, var);
    }

    fn enter_field(&mut self, field: &FieldSelection, _path: &[Node<'_>]) {
        let event = self.resolve_field(field);
        let child = event
            .resolved
            .as_ref()
            .and_then(|info| info.sig.as_ref())
            .map(TypeSig::base_name)
            .filter(|base| {
                self.ctx
                    .kind_of(base)
                    .is_some_and(TypeKind::is_composite)
            })
            .and_then(|base| self.ctx.schema.type_spec(base))
            .cloned();
        self.ctx.field_events.push(event);
        self.ctx.type_stack.push(child);
        dispatch!(self, enter_field, field);
    }

    fn leave_field(&mut self, _field: &FieldSelection, _path: &[Node<'_>]) {
        self.ctx.type_stack.pop();
        self.ctx.field_events.pop();
    }

    fn enter_argument(&mut self, argument: &Argument, _path: &[Node<'_>]) {
        let declared = if let Some(directive) = self.ctx.current_directive() {
            directive
                .resolved
                .as_ref()
                .and_then(|args| args.get(&argument.name.value))
                .map(|arg| arg.spec.clone())
        } else {
            self.ctx
                .current_field()
                .and_then(|event| event.resolved.as_ref())
                .and_then(|info| info.arguments.get(&argument.name.value))
                .map(|arg| arg.spec.clone())
        };
        if let Some(spec) = declared {
            self.ctx.overlay.bind(argument.span, spec);
        }
        dispatch!(self, enter_argument, argument);
    }

    fn enter_directive(&mut self, directive: &Directive, _path: &[Node<'_>]) {
        let resolved = self
            .ctx
            .schema
            .directives
            .get(&directive.name.value)
            .map(|shape| {
                shape
                    .arguments
                    .iter()
                    .map(|(name, arg)| {
                        (
                            name.clone(),
                            ArgInfo {
                                name: arg.name.clone(),
                                spec: arg.spec.clone(),
                                sig: self.ctx.schema.spec_map.signature(&arg.spec),
                                required: arg.required,
                            },
                        )
                    })
                    .collect()
            });
        self.ctx.directive_event = Some(DirectiveEvent {
            name: directive.name.value.clone(),
            resolved,
        });
        dispatch!(self, enter_directive, directive);
    }

    fn leave_directive(&mut self, _directive: &Directive, _path: &[Node<'_>]) {
        self.ctx.directive_event = None;
    }

    fn enter_fragment_spread(&mut self, spread: &FragmentSpread, _path: &[Node<'_>]) {
        self.ctx.used_fragments.insert(spread.name.value.clone());
        if let Some(fragment_spec) = self.ctx.overlay.fragment(&spread.name.value).cloned() {
            self.ctx.overlay.bind(spread.span, fragment_spec);
        }
        dispatch!(self, enter_fragment_spread, spread);
    }

    fn enter_inline_fragment(&mut self, fragment: &InlineFragment, _path: &[Node<'_>]) {
        let child = match &fragment.type_condition {
            Some(condition) => self.composite_spec(&condition.value),
            None => self.ctx.type_stack.last().cloned().flatten(),
        };
        if let Some(spec) = &child {
            self.ctx.overlay.bind(fragment.span, spec.clone());
        }
        self.ctx.type_stack.push(child);
        dispatch!(self, enter_inline_fragment, fragment);
    }

    fn leave_inline_fragment(&mut self, _fragment: &InlineFragment, _path: &[Node<'_>]) {
        self.ctx.type_stack.pop();
    }

    fn enter_fragment(&mut self, fragment: &FragmentDefinition, _path: &[Node<'_>]) {
        if let Some(fragment_spec) = self.ctx.overlay.fragment(&fragment.name.value).cloned() {
            self.ctx.overlay.bind(fragment.span, fragment_spec);
        }
        let child = self.composite_spec(&fragment.type_condition.value);
        self.ctx.type_stack.push(child);
        dispatch!(self, enter_fragment, fragment);
    }

    fn leave_fragment(&mut self, _fragment: &FragmentDefinition, _path: &[Node<'_>]) {
        self.ctx.type_stack.pop();
    }

    fn leave_document(&mut self, doc: &Document) {
        dispatch!(self, leave_document, doc);
    }
}

impl Runner<'_> {
    /// Resolves a field selection against the current parent type and
    /// annotates the AST node with the field's spec identifier.
    fn resolve_field(&mut self, field: &FieldSelection) -> FieldEvent {
        let parent_type = self.ctx.parent_type_name();
        let Some(parent_name) = &parent_type else {
            return FieldEvent {
                parent_type: None,
                resolved: None,
            };
        };

        let Some(shape) = self.ctx.schema.field(parent_name, &field.name.value) else {
            return FieldEvent {
                parent_type: parent_type.clone(),
                resolved: None,
            };
        };

        self.ctx.overlay.bind(field.span, shape.spec.clone());
        let arguments = shape
            .arguments
            .iter()
            .map(|(name, arg)| {
                (
                    name.clone(),
                    ArgInfo {
                        name: arg.name.clone(),
                        spec: arg.spec.clone(),
                        sig: self.ctx.schema.spec_map.signature(&arg.spec),
                        required: arg.required,
                    },
                )
            })
            .collect();

        FieldEvent {
            parent_type: parent_type.clone(),
            resolved: Some(FieldInfo {
                parent_type: parent_name.clone(),
                name: shape.name.clone(),
                spec: shape.spec.clone(),
                sig: self.ctx.schema.spec_map.signature(&shape.spec),
                arguments,
            }),
        }
    }

    /// Registers a variable's spec and wrapper descriptors in the overlay.
    fn register_variable(&mut self, var: &VariableDefinition) {
        let var_id = SpecId::variable(self.ctx.overlay.hash, &var.name.value);
        let target = self.register_variable_type(&var_id, &var.ty);
        self.ctx.overlay.specs.insert_alias(var_id.clone(), target);
        self.ctx
            .overlay
            .insert_variable(var.name.value.clone(), var_id.clone());
        self.ctx.overlay.bind(var.span, var_id.clone());

        let sig = self
            .ctx
            .overlay
            .signature(&self.ctx.schema.spec_map, &var_id);
        self.ctx.variable_definitions.insert(
            var.name.value.clone(),
            VariableInfo {
                sig,
                has_default: var.default_value.is_some(),
                span: var.span,
            },
        );
    }

    fn register_variable_type(&mut self, site: &SpecId, ty: &Type) -> SpecId {
        match ty {
            Type::Named(named) => {
                if is_builtin_scalar(&named.name) {
                    SpecId::builtin(&named.name)
                } else {
                    self.ctx
                        .schema
                        .type_spec(&named.name)
                        .cloned()
                        .unwrap_or_else(|| SpecId::schema_type(self.ctx.schema.hash, &named.name))
                }
            }
            Type::List(inner, _) => {
                let id = site.wrapped("list");
                let of = self.register_variable_type(&id, inner);
                self.ctx
                    .overlay
                    .specs
                    .insert_shape(id.clone(), crate::registry::TypeShape::List { of });
                id
            }
            Type::NonNull(inner, _) => {
                let id = site.wrapped("notnull");
                let of = self.register_variable_type(&id, inner);
                self.ctx
                    .overlay
                    .specs
                    .insert_shape(id.clone(), crate::registry::TypeShape::NonNull { of });
                id
            }
        }
    }

    /// Resolves a type-condition name to its canonical spec when it names a
    /// composite type.
    fn composite_spec(&self, name: &str) -> Option<SpecId> {
        self.ctx
            .kind_of(name)
            .filter(|kind| kind.is_composite())
            .and_then(|_| self.ctx.schema.type_spec(name))
            .cloned()
    }
}

/// A validated operation document: the AST, its overlay annotations, and any
/// accumulated diagnostics. Execution must refuse documents with errors.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub document: Document,
    pub overlay: OperationOverlay,
    pub line_map: LineMap,
    pub diagnostics: DiagnosticBag,
}

impl ValidatedDocument {
    /// Returns true when no syntax or validation errors were found.
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Parses and validates an operation document against a schema.
///
/// `rules` selects a subset of validation rules; `None` runs all of them.
/// Syntax errors short-circuit rule execution but are reported through the
/// same diagnostics list.
pub fn validate_document(
    schema: &SchemaState,
    source: &str,
    rules: Option<&[RuleName]>,
) -> ValidatedDocument {
    let parsed = specql_syntax::parse(source);
    let line_map = LineMap::new(source);
    let mut overlay = OperationOverlay::new(ScopeHash::of_source(source));
    let mut diagnostics = parsed.diagnostics;

    if !diagnostics.has_errors() {
        let selected = rules.map(<[RuleName]>::to_vec).unwrap_or_else(RuleName::all);
        let mut ctx = ValidationContext::new(schema, &mut overlay);

        // Fragments are visible before their definition site; collect them
        // and register their specs up front.
        for fragment in parsed.document.fragments() {
            let fragment_id = SpecId::fragment(ctx.overlay.hash, &fragment.name.value);
            if let Some(condition) = schema.type_spec(&fragment.type_condition.value) {
                ctx.overlay
                    .specs
                    .insert_alias(fragment_id.clone(), condition.clone());
            }
            ctx.overlay
                .insert_fragment(fragment.name.value.clone(), fragment_id);
            ctx.fragment_definitions.insert(
                fragment.name.value.clone(),
                FragmentInfo {
                    type_condition: fragment.type_condition.value.clone(),
                    name_span: fragment.name.span,
                },
            );
        }

        let mut runner = Runner {
            ctx,
            rules: rules_for(&selected),
        };
        walk_document(&mut runner, &parsed.document);
        debug!(
            errors = runner.ctx.diagnostics.error_count(),
            bindings = runner.ctx.overlay.binding_count(),
            "operation validated"
        );
        diagnostics.extend(runner.ctx.diagnostics);
    }

    ValidatedDocument {
        document: parsed.document,
        overlay,
        line_map,
        diagnostics,
    }
}
