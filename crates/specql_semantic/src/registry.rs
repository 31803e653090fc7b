//! Schema type registry: spec map construction from a schema document.
//!
//! The builder walks the schema AST once, assigning every declared type,
//! field, argument, and wrapper a spec identifier and recording a descriptor
//! for it. Forward and recursive type references are recorded as pending
//! names during the first pass and resolved by a second, idempotent link
//! pass, so mutually recursive object types build without divergence.

use crate::spec::{is_builtin_scalar, ScopeHash, SpecId, BUILTIN_SCALARS};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use specql_core::{codes, DiagnosticBag, Span};
use specql_syntax::ast::{
    Definition, Document, InputValueDefinition, OperationType, Type, TypeDefinition, Value,
};
use tracing::debug;

/// The kind tag of a type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    /// Returns the conventional tag spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::InputObject => "INPUT_OBJECT",
            Self::List => "LIST",
            Self::NonNull => "NOT_NULL",
        }
    }

    /// Returns true for object, interface, and union kinds.
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::Union)
    }

    /// Returns true for kinds usable as variable and argument types.
    pub const fn is_input(self) -> bool {
        matches!(self, Self::Scalar | Self::Enum | Self::InputObject)
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fully resolved wrapping structure of a type reference.
///
/// Signatures are derived from spec identifier chains and carry no spans;
/// they are what the validator compares and the executor completes against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSig {
    Named(String),
    List(Box<TypeSig>),
    NonNull(Box<TypeSig>),
}

impl TypeSig {
    /// Returns the innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }

    /// Returns true if the outermost wrapper is non-null.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Strips one leading non-null wrapper, if present.
    pub fn unwrap_non_null(&self) -> &TypeSig {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl std::fmt::Display for TypeSig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Shape of a declared output field.
#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: String,
    /// Spec identifier of this field; an alias to the declared type's entry.
    pub spec: SpecId,
    pub arguments: IndexMap<String, ArgumentShape>,
    pub span: Span,
}

/// Shape of an argument or input object field.
#[derive(Debug, Clone)]
pub struct ArgumentShape {
    pub name: String,
    /// Spec identifier of this argument; an alias to the declared type's entry.
    pub spec: SpecId,
    /// True when the type is non-null and no default is declared.
    pub required: bool,
    pub default: Option<serde_json::Value>,
    pub span: Span,
}

/// A direct type descriptor.
#[derive(Debug, Clone)]
pub enum TypeShape {
    Scalar {
        name: String,
    },
    Object {
        name: String,
        fields: IndexMap<String, FieldShape>,
        interfaces: Vec<SpecId>,
    },
    /// Disjunction encoding for an object implementing interfaces: the first
    /// part is the object's extension spec (its own fields), the rest are the
    /// implemented interface specs.
    Extended {
        name: String,
        parts: Vec<SpecId>,
    },
    Interface {
        name: String,
        fields: IndexMap<String, FieldShape>,
    },
    Union {
        name: String,
        members: Vec<SpecId>,
    },
    Enum {
        name: String,
        values: Vec<String>,
    },
    InputObject {
        name: String,
        fields: IndexMap<String, ArgumentShape>,
    },
    List {
        of: SpecId,
    },
    NonNull {
        of: SpecId,
    },
}

impl TypeShape {
    /// Returns the kind tag.
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar { .. } => TypeKind::Scalar,
            Self::Object { .. } | Self::Extended { .. } => TypeKind::Object,
            Self::Interface { .. } => TypeKind::Interface,
            Self::Union { .. } => TypeKind::Union,
            Self::Enum { .. } => TypeKind::Enum,
            Self::InputObject { .. } => TypeKind::InputObject,
            Self::List { .. } => TypeKind::List,
            Self::NonNull { .. } => TypeKind::NonNull,
        }
    }

    /// Returns the declared type name, if this is a named shape.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Scalar { name }
            | Self::Object { name, .. }
            | Self::Extended { name, .. }
            | Self::Interface { name, .. }
            | Self::Union { name, .. }
            | Self::Enum { name, .. }
            | Self::InputObject { name, .. } => Some(name),
            Self::List { .. } | Self::NonNull { .. } => None,
        }
    }
}

/// A type descriptor: a direct shape or an alias to another spec entry.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Alias(SpecId),
    Shape(TypeShape),
}

const MAX_ALIAS_DEPTH: u32 = 64;

/// The spec map: spec identifier to type descriptor.
#[derive(Debug, Default, Clone)]
pub struct SpecMap {
    entries: FxHashMap<SpecId, TypeDescriptor>,
    /// Field specs whose declared base type is an enclosing type; resolved by
    /// the second pass.
    recursive: FxHashSet<SpecId>,
}

impl SpecMap {
    /// Creates an empty spec map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a direct shape descriptor.
    pub fn insert_shape(&mut self, id: SpecId, shape: TypeShape) {
        self.entries.insert(id, TypeDescriptor::Shape(shape));
    }

    /// Inserts an alias descriptor.
    pub fn insert_alias(&mut self, id: SpecId, target: SpecId) {
        self.entries.insert(id, TypeDescriptor::Alias(target));
    }

    /// Marks a spec as recursive.
    pub fn mark_recursive(&mut self, id: SpecId) {
        self.recursive.insert(id);
    }

    /// Returns true if the spec was tagged recursive during construction.
    pub fn is_recursive(&self, id: &SpecId) -> bool {
        self.recursive.contains(id)
    }

    /// Returns the spec identifiers tagged recursive.
    pub fn recursive_specs(&self) -> impl Iterator<Item = &SpecId> {
        self.recursive.iter()
    }

    /// Gets the descriptor for a spec identifier.
    pub fn get(&self, id: &SpecId) -> Option<&TypeDescriptor> {
        self.entries.get(id)
    }

    /// Returns true if an entry exists for the identifier.
    pub fn contains(&self, id: &SpecId) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a spec identifier through aliases to a direct shape.
    pub fn resolve(&self, id: &SpecId) -> Option<&TypeShape> {
        let mut current = id;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.entries.get(current)? {
                TypeDescriptor::Alias(target) => current = target,
                TypeDescriptor::Shape(shape) => return Some(shape),
            }
        }
        None
    }

    /// Derives the wrapping signature of a spec identifier.
    pub fn signature(&self, id: &SpecId) -> Option<TypeSig> {
        signature_layered(self, None, id)
    }

    /// Looks up a field on a shape, searching extension parts for objects
    /// that implement interfaces. Own fields shadow interface fields.
    pub fn field_of<'a>(&'a self, shape: &'a TypeShape, name: &str) -> Option<&'a FieldShape> {
        match shape {
            TypeShape::Object { fields, .. } | TypeShape::Interface { fields, .. } => {
                fields.get(name)
            }
            TypeShape::Extended { parts, .. } => parts
                .iter()
                .filter_map(|part| self.resolve(part))
                .find_map(|part| self.field_of(part, name)),
            _ => None,
        }
    }
}

/// Resolves a spec identifier into its wrapping signature, consulting
/// `primary` first and `fallback` second at each step. Used to resolve
/// operation-overlay specs against the schema registry.
pub fn signature_layered(
    primary: &SpecMap,
    fallback: Option<&SpecMap>,
    id: &SpecId,
) -> Option<TypeSig> {
    fn lookup<'a>(
        primary: &'a SpecMap,
        fallback: Option<&'a SpecMap>,
        id: &SpecId,
    ) -> Option<&'a TypeDescriptor> {
        primary
            .entries
            .get(id)
            .or_else(|| fallback.and_then(|map| map.entries.get(id)))
    }

    let mut current = id.clone();
    let mut depth = 0;
    loop {
        depth += 1;
        if depth > MAX_ALIAS_DEPTH {
            return None;
        }
        match lookup(primary, fallback, &current)? {
            TypeDescriptor::Alias(target) => current = target.clone(),
            TypeDescriptor::Shape(TypeShape::List { of }) => {
                let inner = signature_layered(primary, fallback, of)?;
                return Some(TypeSig::List(Box::new(inner)));
            }
            TypeDescriptor::Shape(TypeShape::NonNull { of }) => {
                let inner = signature_layered(primary, fallback, of)?;
                return Some(TypeSig::NonNull(Box::new(inner)));
            }
            TypeDescriptor::Shape(shape) => {
                return Some(TypeSig::Named(shape.name()?.to_string()));
            }
        }
    }
}

/// A declared or built-in directive.
#[derive(Debug, Clone)]
pub struct DirectiveShape {
    pub name: String,
    pub arguments: IndexMap<String, ArgumentShape>,
}

/// Root operation type specs.
#[derive(Debug, Clone, Default)]
pub struct RootSpecs {
    pub query: Option<SpecId>,
    pub mutation: Option<SpecId>,
    pub subscription: Option<SpecId>,
}

/// The immutable schema state: spec map, schema hash, roots, directives.
///
/// Construction happens once per schema; afterwards the state is shared
/// read-only across validations and executions.
#[derive(Debug, Clone)]
pub struct SchemaState {
    pub hash: ScopeHash,
    pub spec_map: SpecMap,
    /// Canonical spec for each declared (and built-in) type name.
    types: FxHashMap<String, SpecId>,
    pub roots: RootSpecs,
    pub directives: FxHashMap<String, DirectiveShape>,
    /// Interface name to implementing object type names, and union name to
    /// member object type names.
    implementations: FxHashMap<String, Vec<String>>,
}

impl SchemaState {
    /// Returns the canonical spec for a type name.
    pub fn type_spec(&self, name: &str) -> Option<&SpecId> {
        self.types.get(name)
    }

    /// Resolves a type name to its shape.
    pub fn shape(&self, name: &str) -> Option<&TypeShape> {
        self.spec_map.resolve(self.types.get(name)?)
    }

    /// Returns the root spec for an operation type.
    pub fn root(&self, operation: OperationType) -> Option<&SpecId> {
        match operation {
            OperationType::Query => self.roots.query.as_ref(),
            OperationType::Mutation => self.roots.mutation.as_ref(),
            OperationType::Subscription => self.roots.subscription.as_ref(),
        }
    }

    /// Looks up a field on a named type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldShape> {
        let shape = self.shape(type_name)?;
        self.spec_map.field_of(shape, field_name)
    }

    /// Returns the concrete object type names a composite type can stand for.
    pub fn possible_types(&self, name: &str) -> Vec<String> {
        match self.shape(name).map(TypeShape::kind) {
            Some(TypeKind::Object) => vec![name.to_string()],
            Some(TypeKind::Interface) | Some(TypeKind::Union) => self
                .implementations
                .get(name)
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Returns true if `concrete` satisfies the type condition `condition`.
    pub fn type_applies(&self, condition: &str, concrete: &str) -> bool {
        if condition == concrete {
            return true;
        }
        self.implementations
            .get(condition)
            .is_some_and(|names| names.iter().any(|n| n == concrete))
    }
}

/// Outcome of registry construction.
#[derive(Debug)]
pub struct BuildOutcome {
    pub state: SchemaState,
    pub diagnostics: DiagnosticBag,
}

impl BuildOutcome {
    /// Returns true if construction produced no errors.
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Builds the schema registry from a parsed schema document.
pub fn build_registry(document: &Document, source: &str) -> BuildOutcome {
    let mut builder = RegistryBuilder::new(ScopeHash::of_source(source));
    builder.collect_declarations(document);
    builder.register_definitions(document);
    builder.link();
    builder.resolve_roots(document);
    debug!(
        types = builder.types.len(),
        specs = builder.spec_map.len(),
        errors = builder.diagnostics.error_count(),
        "schema registry built"
    );
    builder.finish()
}

struct RegistryBuilder {
    hash: ScopeHash,
    spec_map: SpecMap,
    types: FxHashMap<String, SpecId>,
    type_kinds: FxHashMap<String, TypeKind>,
    directives: FxHashMap<String, DirectiveShape>,
    implementations: FxHashMap<String, Vec<String>>,
    /// Named type references awaiting the link pass: (name, usage span).
    pending: Vec<(String, Span)>,
    roots: RootSpecs,
    diagnostics: DiagnosticBag,
}

impl RegistryBuilder {
    fn new(hash: ScopeHash) -> Self {
        let mut builder = Self {
            hash,
            spec_map: SpecMap::new(),
            types: FxHashMap::default(),
            type_kinds: FxHashMap::default(),
            directives: FxHashMap::default(),
            implementations: FxHashMap::default(),
            pending: Vec::new(),
            roots: RootSpecs::default(),
            diagnostics: DiagnosticBag::new(),
        };

        for name in BUILTIN_SCALARS {
            let id = SpecId::builtin(name);
            builder.spec_map.insert_shape(
                id.clone(),
                TypeShape::Scalar {
                    name: name.to_string(),
                },
            );
            builder.types.insert(name.to_string(), id);
            builder.type_kinds.insert(name.to_string(), TypeKind::Scalar);
        }
        builder.register_builtin_directives();
        builder
    }

    /// Pre-registers `@include(if: Boolean!)` and `@skip(if: Boolean!)`.
    fn register_builtin_directives(&mut self) {
        for name in ["include", "skip"] {
            let arg_id = SpecId::directive_argument(self.hash, name, "if");
            let wrapper = arg_id.wrapped("notnull");
            self.spec_map.insert_shape(
                wrapper.clone(),
                TypeShape::NonNull {
                    of: SpecId::builtin("Boolean"),
                },
            );
            self.spec_map.insert_alias(arg_id.clone(), wrapper);

            let mut arguments = IndexMap::new();
            arguments.insert(
                "if".to_string(),
                ArgumentShape {
                    name: "if".to_string(),
                    spec: arg_id,
                    required: true,
                    default: None,
                    span: Span::default(),
                },
            );
            self.directives.insert(
                name.to_string(),
                DirectiveShape {
                    name: name.to_string(),
                    arguments,
                },
            );
        }
    }

    /// First pass: declare every type name, rejecting duplicates.
    fn collect_declarations(&mut self, document: &Document) {
        for definition in &document.definitions {
            let Definition::Type(type_def) = definition else {
                continue;
            };
            let name = &type_def.name().value;
            if name.is_empty() {
                continue;
            }
            if self.types.contains_key(name) {
                self.diagnostics.error(
                    codes::DUPLICATE_TYPE,
                    format!("duplicate type name '{name}'"),
                    type_def.name().span,
                );
                continue;
            }
            let kind = match type_def {
                TypeDefinition::Object(_) => TypeKind::Object,
                TypeDefinition::Interface(_) => TypeKind::Interface,
                TypeDefinition::Union(_) => TypeKind::Union,
                TypeDefinition::Enum(_) => TypeKind::Enum,
                TypeDefinition::Input(_) => TypeKind::InputObject,
                TypeDefinition::Scalar(_) => TypeKind::Scalar,
            };
            self.types
                .insert(name.clone(), SpecId::schema_type(self.hash, name));
            self.type_kinds.insert(name.clone(), kind);
        }
    }

    /// Second pass: register a descriptor for every declared element.
    fn register_definitions(&mut self, document: &Document) {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for definition in &document.definitions {
            match definition {
                Definition::Type(type_def) => {
                    let name = type_def.name().value.as_str();
                    if name.is_empty() || !seen.insert(name) {
                        continue;
                    }
                    self.register_type(type_def);
                }
                Definition::Directive(directive) => {
                    self.register_directive(directive);
                }
                _ => {}
            }
        }
    }

    fn register_type(&mut self, type_def: &TypeDefinition) {
        let canonical = SpecId::schema_type(self.hash, &type_def.name().value);
        match type_def {
            TypeDefinition::Object(object) => {
                let name = object.name.value.clone();
                let fields = self.register_fields(&name, &object.fields);
                let mut interfaces = Vec::new();
                for implemented in &object.implements {
                    self.pending
                        .push((implemented.value.clone(), implemented.span));
                    if self.type_kinds.get(&implemented.value).copied()
                        == Some(TypeKind::Interface)
                        || !self.type_kinds.contains_key(&implemented.value)
                    {
                        self.implementations
                            .entry(implemented.value.clone())
                            .or_default()
                            .push(name.clone());
                    } else {
                        self.diagnostics.error(
                            codes::INVALID_MEMBER,
                            format!("'{}' is not an interface", implemented.value),
                            implemented.span,
                        );
                    }
                    interfaces.push(SpecId::schema_type(self.hash, &implemented.value));
                }

                if interfaces.is_empty() {
                    self.spec_map.insert_shape(
                        canonical,
                        TypeShape::Object {
                            name,
                            fields,
                            interfaces,
                        },
                    );
                } else {
                    // Interface-implementing objects get an extension spec for
                    // their own fields; the canonical spec is the disjunction
                    // of the extension and the implemented interfaces.
                    let extension = SpecId::extension(self.hash, &name);
                    let mut parts = vec![extension.clone()];
                    parts.extend(interfaces.iter().cloned());
                    self.spec_map.insert_shape(
                        extension,
                        TypeShape::Object {
                            name: name.clone(),
                            fields,
                            interfaces,
                        },
                    );
                    self.spec_map
                        .insert_shape(canonical, TypeShape::Extended { name, parts });
                }
            }
            TypeDefinition::Interface(interface) => {
                let name = interface.name.value.clone();
                let fields = self.register_fields(&name, &interface.fields);
                self.spec_map
                    .insert_shape(canonical, TypeShape::Interface { name, fields });
            }
            TypeDefinition::Union(union) => {
                let name = union.name.value.clone();
                let mut members = Vec::new();
                for member in &union.members {
                    self.pending.push((member.value.clone(), member.span));
                    if self.type_kinds.get(&member.value).copied() == Some(TypeKind::Object)
                        || !self.type_kinds.contains_key(&member.value)
                    {
                        self.implementations
                            .entry(name.clone())
                            .or_default()
                            .push(member.value.clone());
                    } else {
                        self.diagnostics.error(
                            codes::INVALID_MEMBER,
                            format!("union member '{}' is not an object type", member.value),
                            member.span,
                        );
                    }
                    members.push(SpecId::schema_type(self.hash, &member.value));
                }
                self.spec_map
                    .insert_shape(canonical, TypeShape::Union { name, members });
            }
            TypeDefinition::Enum(enum_def) => {
                let name = enum_def.name.value.clone();
                let values = enum_def
                    .values
                    .iter()
                    .map(|value| value.name.value.clone())
                    .collect();
                self.spec_map
                    .insert_shape(canonical, TypeShape::Enum { name, values });
            }
            TypeDefinition::Input(input) => {
                let name = input.name.value.clone();
                let fields = self.register_input_fields(&name, &input.fields);
                self.spec_map
                    .insert_shape(canonical, TypeShape::InputObject { name, fields });
            }
            TypeDefinition::Scalar(scalar) => {
                let name = scalar.name.value.clone();
                self.spec_map
                    .insert_shape(canonical, TypeShape::Scalar { name });
            }
        }
    }

    fn register_fields(
        &mut self,
        type_name: &str,
        definitions: &[specql_syntax::ast::FieldDefinition],
    ) -> IndexMap<String, FieldShape> {
        let mut fields = IndexMap::new();
        for field in definitions {
            let field_id = SpecId::field(self.hash, type_name, &field.name.value);
            if fields.contains_key(&field.name.value) {
                self.diagnostics.error(
                    codes::DUPLICATE_FIELD,
                    format!(
                        "duplicate field '{}' on type '{type_name}'",
                        field.name.value
                    ),
                    field.name.span,
                );
                continue;
            }

            if field.ty.base().name == type_name {
                self.spec_map.mark_recursive(field_id.clone());
            }
            let target = self.register_type_ref(&field_id, &field.ty);
            self.spec_map.insert_alias(field_id.clone(), target);

            let mut arguments = IndexMap::new();
            for argument in &field.arguments {
                let arg_id = SpecId::argument(
                    self.hash,
                    type_name,
                    &field.name.value,
                    &argument.name.value,
                );
                arguments.insert(
                    argument.name.value.clone(),
                    self.register_input_value(arg_id, argument),
                );
            }

            fields.insert(
                field.name.value.clone(),
                FieldShape {
                    name: field.name.value.clone(),
                    spec: field_id,
                    arguments,
                    span: field.span,
                },
            );
        }
        fields
    }

    fn register_input_fields(
        &mut self,
        type_name: &str,
        definitions: &[InputValueDefinition],
    ) -> IndexMap<String, ArgumentShape> {
        let mut fields = IndexMap::new();
        for field in definitions {
            if field.ty.base().name == type_name {
                // A non-null self-reference in an input object can never be
                // satisfied by any finite value. A list along the chain
                // breaks the cycle.
                if is_non_null_self_chain(&field.ty) {
                    self.diagnostics.error(
                        codes::INVALID_WRAPPER,
                        format!(
                            "input field '{}' forms a non-null reference cycle on '{type_name}'",
                            field.name.value
                        ),
                        field.ty.span(),
                    );
                }
                self.spec_map
                    .mark_recursive(SpecId::field(self.hash, type_name, &field.name.value));
            }
            let field_id = SpecId::field(self.hash, type_name, &field.name.value);
            fields.insert(
                field.name.value.clone(),
                self.register_input_value(field_id, field),
            );
        }
        fields
    }

    fn register_input_value(
        &mut self,
        id: SpecId,
        definition: &InputValueDefinition,
    ) -> ArgumentShape {
        let target = self.register_type_ref(&id, &definition.ty);
        self.spec_map.insert_alias(id.clone(), target);

        let default = definition
            .default_value
            .as_ref()
            .and_then(const_value_to_json);
        ArgumentShape {
            name: definition.name.value.clone(),
            spec: id,
            required: definition.ty.is_non_null() && default.is_none(),
            default,
            span: definition.span,
        }
    }

    fn register_directive(&mut self, directive: &specql_syntax::ast::DirectiveDefinition) {
        let name = directive.name.value.clone();
        if name.is_empty() || self.directives.contains_key(&name) {
            return;
        }
        let mut arguments = IndexMap::new();
        for argument in &directive.arguments {
            let arg_id = SpecId::directive_argument(self.hash, &name, &argument.name.value);
            arguments.insert(
                argument.name.value.clone(),
                self.register_input_value(arg_id, argument),
            );
        }
        self.directives
            .insert(name.clone(), DirectiveShape { name, arguments });
    }

    /// Registers wrapper descriptors for a declared type reference and
    /// returns the spec identifier the declaration site should alias.
    fn register_type_ref(&mut self, site: &SpecId, ty: &Type) -> SpecId {
        match ty {
            Type::Named(named) => {
                self.pending.push((named.name.clone(), named.span));
                if is_builtin_scalar(&named.name) {
                    SpecId::builtin(&named.name)
                } else {
                    SpecId::schema_type(self.hash, &named.name)
                }
            }
            Type::List(inner, _) => {
                let id = site.wrapped("list");
                let of = self.register_type_ref(&id, inner);
                self.spec_map.insert_shape(id.clone(), TypeShape::List { of });
                id
            }
            Type::NonNull(inner, span) => {
                if matches!(inner.as_ref(), Type::NonNull(..)) {
                    self.diagnostics.error(
                        codes::INVALID_WRAPPER,
                        "non-null wrapper cannot wrap another non-null wrapper",
                        *span,
                    );
                }
                let id = site.wrapped("notnull");
                let of = self.register_type_ref(&id, inner);
                self.spec_map
                    .insert_shape(id.clone(), TypeShape::NonNull { of });
                id
            }
        }
    }

    /// Link pass: every recorded type name reference must now resolve. This
    /// pass is idempotent; running it again reports nothing new once clean.
    fn link(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let mut reported: FxHashSet<(String, Span)> = FxHashSet::default();
        for (name, span) in pending {
            if self.types.contains_key(&name) {
                continue;
            }
            if reported.insert((name.clone(), span)) {
                self.diagnostics.error(
                    codes::UNKNOWN_TYPE,
                    format!("unknown type '{name}'"),
                    span,
                );
            }
        }
    }

    /// Resolves root operation types from the schema definition, falling
    /// back to the conventional `Query`/`Mutation`/`Subscription` names.
    fn resolve_roots(&mut self, document: &Document) {
        let mut roots = RootSpecs::default();
        let schema_def = document.definitions.iter().find_map(|def| match def {
            Definition::Schema(schema) => Some(schema),
            _ => None,
        });

        if let Some(schema) = schema_def {
            for binding in &schema.operations {
                let name = &binding.type_name.value;
                if self.type_kinds.get(name).copied() != Some(TypeKind::Object) {
                    self.diagnostics.error(
                        codes::MISSING_ROOT,
                        format!("root operation type '{name}' is not a declared object type"),
                        binding.type_name.span,
                    );
                    continue;
                }
                let id = SpecId::schema_type(self.hash, name);
                match binding.operation {
                    OperationType::Query => roots.query = Some(id),
                    OperationType::Mutation => roots.mutation = Some(id),
                    OperationType::Subscription => roots.subscription = Some(id),
                }
            }
        } else {
            for (name, slot) in [
                ("Query", &mut roots.query),
                ("Mutation", &mut roots.mutation),
                ("Subscription", &mut roots.subscription),
            ] {
                if self.type_kinds.get(name).copied() == Some(TypeKind::Object) {
                    *slot = Some(SpecId::schema_type(self.hash, name));
                }
            }
        }
        self.roots = roots;
    }

    fn finish(self) -> BuildOutcome {
        BuildOutcome {
            state: SchemaState {
                hash: self.hash,
                spec_map: self.spec_map,
                types: self.types,
                roots: self.roots,
                directives: self.directives,
                implementations: self.implementations,
            },
            diagnostics: self.diagnostics,
        }
    }
}

/// Returns true when the chain from the root of the type reference to the
/// named base passes exclusively through non-null wrappers.
fn is_non_null_self_chain(ty: &Type) -> bool {
    fn all_non_null(ty: &Type) -> bool {
        match ty {
            Type::Named(_) => true,
            Type::NonNull(inner, _) => all_non_null(inner),
            Type::List(..) => false,
        }
    }
    matches!(ty, Type::NonNull(..)) && all_non_null(ty)
}

/// Converts a const value literal into JSON. Variables yield `None`.
pub fn const_value_to_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::Variable(_) => None,
        Value::Int(n, _) => Some(serde_json::Value::from(*n)),
        Value::Float(n, _) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number),
        Value::String(s, _) => Some(serde_json::Value::String(s.clone())),
        Value::Boolean(b, _) => Some(serde_json::Value::Bool(*b)),
        Value::Null(_) => Some(serde_json::Value::Null),
        Value::Enum(name) => Some(serde_json::Value::String(name.value.clone())),
        Value::List(items, _) => items
            .iter()
            .map(const_value_to_json)
            .collect::<Option<Vec<_>>>()
            .map(serde_json::Value::Array),
        Value::Object(fields, _) => {
            let mut map = serde_json::Map::with_capacity(fields.len());
            for (name, field_value) in fields {
                map.insert(name.value.clone(), const_value_to_json(field_value)?);
            }
            Some(serde_json::Value::Object(map))
        }
    }
}
