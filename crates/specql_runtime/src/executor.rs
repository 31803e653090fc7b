//! Query execution.
//!
//! The executor drives a validated operation: it flattens fragments into
//! grouped field sets (CollectFields), merges argument defaults with literals
//! and supplied variables, invokes resolvers, and recursively completes
//! values against the declared field types (CompleteValue). Sibling fields of
//! queries resolve concurrently; top-level mutation fields run serially in
//! source order. Response key order always equals source order.

use crate::cancel::CancellationToken;
use crate::directives::selection_included;
use crate::resolver::{ResolverArgs, ResolverMap};
use crate::response::{errors_from_diagnostics, ErrorCode, GraphQLError, PathSegment, Response};
use futures::future::{join_all, BoxFuture};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde_json::Value as Json;
use specql_core::{LineMap, Span};
use specql_semantic::registry::{FieldShape, SchemaState, TypeKind, TypeShape, TypeSig};
use specql_semantic::ValidatedDocument;
use specql_syntax::ast::{
    FieldSelection, FragmentDefinition, OperationDefinition, OperationType, Selection,
    SelectionSet, Value,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Execution context, host-defined and opaque to the engine.
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, Json>,
}

impl Context {
    /// Creates a new context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value in the context.
    pub fn set<T: serde::Serialize>(&mut self, key: impl Into<String>, value: T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.data.insert(key.into(), value);
        }
    }

    /// Gets a value from the context.
    pub fn get<T: for<'de> serde::Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Executor configuration.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Maximum selection nesting depth during execution.
    pub max_depth: Option<u32>,
}

/// Runtime type resolution hook for interfaces and unions: given the resolved
/// value and the possible concrete type names, picks the concrete type.
pub type TypeResolverFn = Arc<dyn Fn(&Json, &[String]) -> Option<String> + Send + Sync>;

/// The query executor.
pub struct Executor<'a> {
    schema: &'a SchemaState,
    resolvers: &'a ResolverMap,
    config: ExecutorConfig,
    type_resolver: Option<TypeResolverFn>,
    token: Option<CancellationToken>,
}

impl<'a> Executor<'a> {
    /// Creates a new executor over a schema and resolver registry.
    pub fn new(schema: &'a SchemaState, resolvers: &'a ResolverMap) -> Self {
        Self {
            schema,
            resolvers,
            config: ExecutorConfig::default(),
            type_resolver: None,
            token: None,
        }
    }

    /// Sets the executor configuration.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs a runtime type resolution hook for interfaces and unions.
    /// Without one, the executor reads a `__typename` member of the resolved
    /// value.
    pub fn with_type_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&Json, &[String]) -> Option<String> + Send + Sync + 'static,
    {
        self.type_resolver = Some(Arc::new(f));
        self
    }

    /// Attaches a cancellation token checked throughout the execution.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Executes the first operation of a validated document.
    pub async fn execute(
        &self,
        ctx: &Context,
        validated: &ValidatedDocument,
        variables: Option<Json>,
    ) -> Response {
        if !validated.is_valid() {
            return Response::from_errors(errors_from_diagnostics(
                &validated.diagnostics,
                &validated.line_map,
                ErrorCode::ValidationError,
            ));
        }

        let Some(op) = validated.document.operations().next() else {
            return Response::from_errors(vec![GraphQLError::new(
                "Document contains no executable operations.",
            )
            .with_code(ErrorCode::ValidationError)]);
        };
        if op.operation == OperationType::Subscription {
            return Response::from_errors(vec![GraphQLError::new(
                "Subscription operations are not supported.",
            )
            .with_code(ErrorCode::ValidationError)]);
        }

        let root_name = self
            .schema
            .root(op.operation)
            .and_then(|spec| self.schema.spec_map.resolve(spec))
            .and_then(TypeShape::name)
            .map(str::to_string);
        let Some(root_name) = root_name else {
            return Response::from_errors(vec![GraphQLError::new(format!(
                "Schema has no {} root type.",
                op.operation
            ))
            .with_code(ErrorCode::ValidationError)]);
        };

        let variables = match coerce_variables(self.schema, validated, op, variables) {
            Ok(variables) => variables,
            Err(errors) => return Response::from_errors(errors),
        };

        let exec = ExecCtx {
            schema: self.schema,
            resolvers: self.resolvers,
            host: ctx,
            config: &self.config,
            type_resolver: self.type_resolver.as_ref(),
            token: self.token.as_ref(),
            variables,
            fragments: validated
                .document
                .fragments()
                .map(|fragment| (fragment.name.value.as_str(), fragment))
                .collect(),
            line_map: &validated.line_map,
            errors: Mutex::new(Vec::new()),
        };

        debug!(operation = %op.operation, root = %root_name, "executing operation");
        let serial = op.operation == OperationType::Mutation;
        let result = exec
            .execute_selection_set(
                root_name,
                Json::Null,
                vec![&op.selection_set],
                Vec::new(),
                serial,
                0,
            )
            .await;

        let mut errors = exec
            .errors
            .into_inner()
            .unwrap_or_else(|poison| poison.into_inner());
        match result {
            Ok(data) => Response {
                data: Some(data),
                errors,
            },
            Err(Interrupt::PropagateNull) => Response {
                data: Some(Json::Null),
                errors,
            },
            Err(Interrupt::Abort(error)) => {
                errors.push(error);
                Response { data: None, errors }
            }
        }
    }
}

/// How a subtree stopped: non-null propagation walking up to the nearest
/// nullable ancestor, or a whole-operation abort (cancellation, broken
/// invariant).
enum Interrupt {
    PropagateNull,
    Abort(GraphQLError),
}

struct ExecCtx<'a> {
    schema: &'a SchemaState,
    resolvers: &'a ResolverMap,
    host: &'a Context,
    config: &'a ExecutorConfig,
    type_resolver: Option<&'a TypeResolverFn>,
    token: Option<&'a CancellationToken>,
    variables: serde_json::Map<String, Json>,
    fragments: HashMap<&'a str, &'a FragmentDefinition>,
    line_map: &'a LineMap,
    errors: Mutex<Vec<GraphQLError>>,
}

impl<'a> ExecCtx<'a> {
    fn record(&self, error: GraphQLError) {
        self.errors
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(error);
    }

    fn error(
        &self,
        code: ErrorCode,
        span: Span,
        path: Vec<PathSegment>,
        message: impl Into<String>,
    ) -> GraphQLError {
        GraphQLError::new(message.into())
            .with_code(code)
            .with_location(self.line_map.span_location(span))
            .with_path(path)
    }

    fn bail(&self) -> Result<(), Interrupt> {
        if let Some(token) = self.token {
            token.bail_if_cancelled().map_err(|err| {
                Interrupt::Abort(GraphQLError::new(err.to_string()).with_code(ErrorCode::Cancelled))
            })?;
        }
        Ok(())
    }

    /// CollectFields: flattens fragments into a response-key-grouped field
    /// map, preserving first-seen source order and honoring `@skip` and
    /// `@include`. Fragment cycles are cut by the visited set.
    fn collect_fields(
        &self,
        concrete_type: &str,
        set: &'a SelectionSet,
        visited: &mut FxHashSet<&'a str>,
        grouped: &mut IndexMap<String, Vec<&'a FieldSelection>>,
        path: &[PathSegment],
    ) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    match selection_included(&field.directives, &self.variables) {
                        Ok(true) => grouped
                            .entry(field.response_key().to_string())
                            .or_default()
                            .push(field),
                        Ok(false) => {}
                        Err(err) => self.record(self.error(
                            ErrorCode::ArgumentError,
                            err.span,
                            path.to_vec(),
                            err.message,
                        )),
                    }
                }
                Selection::FragmentSpread(spread) => {
                    match selection_included(&spread.directives, &self.variables) {
                        Ok(true) => {
                            let name = spread.name.value.as_str();
                            if !visited.insert(name) {
                                continue;
                            }
                            if let Some(fragment) = self.fragments.get(name).copied() {
                                if self
                                    .schema
                                    .type_applies(&fragment.type_condition.value, concrete_type)
                                {
                                    self.collect_fields(
                                        concrete_type,
                                        &fragment.selection_set,
                                        visited,
                                        grouped,
                                        path,
                                    );
                                }
                            }
                        }
                        Ok(false) => {}
                        Err(err) => self.record(self.error(
                            ErrorCode::ArgumentError,
                            err.span,
                            path.to_vec(),
                            err.message,
                        )),
                    }
                }
                Selection::InlineFragment(inline) => {
                    match selection_included(&inline.directives, &self.variables) {
                        Ok(true) => {
                            let applies = inline.type_condition.as_ref().map_or(true, |cond| {
                                self.schema.type_applies(&cond.value, concrete_type)
                            });
                            if applies {
                                self.collect_fields(
                                    concrete_type,
                                    &inline.selection_set,
                                    visited,
                                    grouped,
                                    path,
                                );
                            }
                        }
                        Ok(false) => {}
                        Err(err) => self.record(self.error(
                            ErrorCode::ArgumentError,
                            err.span,
                            path.to_vec(),
                            err.message,
                        )),
                    }
                }
            }
        }
    }

    /// ExecuteFields over one object value. Serial mode resolves entries in
    /// strict source order; otherwise siblings resolve concurrently and the
    /// response map is assembled in source order afterwards.
    fn execute_selection_set(
        &self,
        parent_type: String,
        parent_value: Json,
        selection_sets: Vec<&'a SelectionSet>,
        path: Vec<PathSegment>,
        serial: bool,
        depth: u32,
    ) -> BoxFuture<'_, Result<Json, Interrupt>> {
        Box::pin(async move {
            self.bail()?;
            if let Some(max) = self.config.max_depth {
                if depth > max {
                    return Err(Interrupt::Abort(
                        GraphQLError::new(format!("Maximum query depth {max} exceeded."))
                            .with_code(ErrorCode::InternalError),
                    ));
                }
            }

            let mut grouped: IndexMap<String, Vec<&FieldSelection>> = IndexMap::new();
            let mut visited: FxHashSet<&str> = FxHashSet::default();
            for set in selection_sets.iter().copied() {
                self.collect_fields(&parent_type, set, &mut visited, &mut grouped, &path);
            }

            let mut output = serde_json::Map::with_capacity(grouped.len());
            if serial {
                for (key, fields) in &grouped {
                    let value = self
                        .resolve_field_entry(&parent_type, &parent_value, key, fields, &path, depth)
                        .await?;
                    output.insert(key.clone(), value);
                }
            } else {
                let entries: Vec<_> = grouped
                    .iter()
                    .map(|(key, fields)| {
                        let parent_type = &parent_type;
                        let parent_value = &parent_value;
                        let path = &path;
                        async move {
                            (
                                key,
                                self.resolve_field_entry(
                                    parent_type,
                                    parent_value,
                                    key,
                                    fields,
                                    path,
                                    depth,
                                )
                                .await,
                            )
                        }
                    })
                    .collect();

                let mut propagate = false;
                let mut abort: Option<GraphQLError> = None;
                for (key, result) in join_all(entries).await {
                    match result {
                        Ok(value) => {
                            output.insert(key.clone(), value);
                        }
                        Err(Interrupt::PropagateNull) => propagate = true,
                        Err(Interrupt::Abort(error)) => {
                            abort.get_or_insert(error);
                        }
                    }
                }
                if let Some(error) = abort {
                    return Err(Interrupt::Abort(error));
                }
                if propagate {
                    return Err(Interrupt::PropagateNull);
                }
            }

            Ok(Json::Object(output))
        })
    }

    /// Resolves one response-key entry: merge arguments, invoke the resolver,
    /// complete the value. Failures null the field or propagate when the
    /// declared type is non-null.
    async fn resolve_field_entry(
        &self,
        parent_type: &str,
        parent_value: &Json,
        response_key: &str,
        fields: &[&'a FieldSelection],
        path: &[PathSegment],
        depth: u32,
    ) -> Result<Json, Interrupt> {
        let field = fields[0];
        let mut path = path.to_vec();
        path.push(PathSegment::Field(response_key.to_string()));

        if field.name.value == "__typename" {
            return Ok(Json::String(parent_type.to_string()));
        }

        let Some(shape) = self.schema.field(parent_type, &field.name.value) else {
            return Err(Interrupt::Abort(self.error(
                ErrorCode::InternalError,
                field.name.span,
                path,
                format!(
                    "Missing registry entry for field '{}' on type '{parent_type}'.",
                    field.name.value
                ),
            )));
        };
        let Some(sig) = self.schema.spec_map.signature(&shape.spec) else {
            return Err(Interrupt::Abort(self.error(
                ErrorCode::InternalError,
                field.name.span,
                path,
                format!("Unresolvable spec '{}'.", shape.spec),
            )));
        };

        let args = match self.merge_arguments(shape, field, &path) {
            Ok(args) => args,
            Err(()) => return field_failure(&sig),
        };

        self.bail()?;
        let resolver = self.resolvers.lookup(parent_type, &field.name.value);
        let resolved = match resolver
            .resolve(self.host, parent_value, args.as_ref(), &field.name.value)
            .await
        {
            Ok(value) => value,
            Err(err) => {
                self.record(self.error(
                    ErrorCode::ResolverError,
                    field.name.span,
                    path.clone(),
                    err.to_string(),
                ));
                return field_failure(&sig);
            }
        };

        let completed = self
            .complete_value(
                sig.clone(),
                resolved,
                parent_type.to_string(),
                fields.to_vec(),
                path,
                depth,
            )
            .await;
        match completed {
            // A violation below already recorded its error; this field is the
            // nearest nullable ancestor.
            Err(Interrupt::PropagateNull) if !sig.is_non_null() => Ok(Json::Null),
            other => other,
        }
    }

    /// Argument merging: declared defaults, overlaid by literal arguments,
    /// overlaid by supplied variable values. An absent variable preserves the
    /// default; an explicit null overrides it.
    fn merge_arguments(
        &self,
        shape: &FieldShape,
        field: &'a FieldSelection,
        path: &[PathSegment],
    ) -> Result<Option<ResolverArgs>, ()> {
        let mut merged: IndexMap<String, Json> = IndexMap::new();
        for (name, arg) in &shape.arguments {
            if let Some(default) = &arg.default {
                merged.insert(name.clone(), default.clone());
            }
        }

        for provided in &field.arguments {
            match &provided.value {
                Value::Variable(variable) => {
                    if let Some(value) = self.variables.get(&variable.value) {
                        merged.insert(provided.name.value.clone(), value.clone());
                    }
                }
                literal => {
                    merged.insert(provided.name.value.clone(), self.literal_to_json(literal));
                }
            }
        }

        let mut failed = false;
        for (name, arg) in &shape.arguments {
            let non_null = self
                .schema
                .spec_map
                .signature(&arg.spec)
                .is_some_and(|sig| sig.is_non_null());
            match merged.get(name) {
                None if arg.required => {
                    self.record(self.error(
                        ErrorCode::ArgumentError,
                        field.name.span,
                        path.to_vec(),
                        format!(
                            "Missing required argument '{name}' on field '{}'.",
                            field.name.value
                        ),
                    ));
                    failed = true;
                }
                Some(Json::Null) if non_null => {
                    self.record(self.error(
                        ErrorCode::ArgumentError,
                        field.name.span,
                        path.to_vec(),
                        format!(
                            "Argument '{name}' of field '{}' must not be null.",
                            field.name.value
                        ),
                    ));
                    failed = true;
                }
                _ => {}
            }
        }
        if failed {
            return Err(());
        }

        Ok(if merged.is_empty() {
            None
        } else {
            Some(ResolverArgs::from_pairs(merged.into_iter().collect()))
        })
    }

    /// Converts a literal to JSON, substituting variable references. Inside
    /// nested structures an unsupplied variable becomes null.
    fn literal_to_json(&self, value: &Value) -> Json {
        match value {
            Value::Variable(name) => self
                .variables
                .get(&name.value)
                .cloned()
                .unwrap_or(Json::Null),
            Value::Int(n, _) => Json::from(*n),
            Value::Float(n, _) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s, _) => Json::String(s.clone()),
            Value::Boolean(b, _) => Json::Bool(*b),
            Value::Null(_) => Json::Null,
            Value::Enum(name) => Json::String(name.value.clone()),
            Value::List(items, _) => {
                Json::Array(items.iter().map(|item| self.literal_to_json(item)).collect())
            }
            Value::Object(fields, _) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (name, field_value) in fields {
                    map.insert(name.value.clone(), self.literal_to_json(field_value));
                }
                Json::Object(map)
            }
        }
    }

    /// CompleteValue: coerces a resolver's raw return into the declared type.
    /// Nullable positions absorb non-null violations from below; non-null
    /// positions record the violation and pass it up.
    fn complete_value(
        &self,
        sig: TypeSig,
        value: Json,
        parent_type: String,
        fields: Vec<&'a FieldSelection>,
        path: Vec<PathSegment>,
        depth: u32,
    ) -> BoxFuture<'_, Result<Json, Interrupt>> {
        Box::pin(async move {
            let field = fields[0];
            match sig {
                TypeSig::NonNull(inner) => {
                    let completed = self
                        .complete_value(
                            *inner,
                            value,
                            parent_type.clone(),
                            fields.clone(),
                            path.clone(),
                            depth,
                        )
                        .await?;
                    if completed.is_null() {
                        self.record(self.error(
                            ErrorCode::NonNullViolation,
                            field.name.span,
                            path,
                            format!(
                                "Cannot return null for non-nullable field '{parent_type}.{}'.",
                                field.name.value
                            ),
                        ));
                        Err(Interrupt::PropagateNull)
                    } else {
                        Ok(completed)
                    }
                }
                _ if value.is_null() => Ok(Json::Null),
                TypeSig::List(inner) => {
                    let Json::Array(items) = value else {
                        self.record(self.error(
                            ErrorCode::ResolverError,
                            field.name.span,
                            path,
                            format!(
                                "Resolver for field '{}' returned a non-list value for a list type.",
                                field.name.value
                            ),
                        ));
                        return Ok(Json::Null);
                    };

                    let element_non_null = inner.is_non_null();
                    let elements: Vec<_> = items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| {
                            let mut element_path = path.clone();
                            element_path.push(PathSegment::Index(index));
                            self.complete_value(
                                (*inner).clone(),
                                item,
                                parent_type.clone(),
                                fields.clone(),
                                element_path,
                                depth,
                            )
                        })
                        .collect();

                    let mut completed = Vec::with_capacity(elements.len());
                    let mut nulled = false;
                    let mut abort: Option<GraphQLError> = None;
                    for result in join_all(elements).await {
                        match result {
                            Ok(value) => completed.push(value),
                            Err(Interrupt::PropagateNull) if element_non_null => {
                                // A non-null element failed: this list is the
                                // nearest nullable ancestor.
                                nulled = true;
                            }
                            // A nullable element absorbs the violation from
                            // below and stays in place as null.
                            Err(Interrupt::PropagateNull) => completed.push(Json::Null),
                            Err(Interrupt::Abort(error)) => {
                                abort.get_or_insert(error);
                            }
                        }
                    }
                    if let Some(error) = abort {
                        return Err(Interrupt::Abort(error));
                    }
                    if nulled {
                        return Ok(Json::Null);
                    }
                    Ok(Json::Array(completed))
                }
                TypeSig::Named(name) => {
                    self.complete_named(&name, value, fields, path, depth).await
                }
            }
        })
    }

    async fn complete_named(
        &self,
        type_name: &str,
        value: Json,
        fields: Vec<&'a FieldSelection>,
        path: Vec<PathSegment>,
        depth: u32,
    ) -> Result<Json, Interrupt> {
        let field = fields[0];
        let Some(shape) = self.schema.shape(type_name) else {
            return Err(Interrupt::Abort(self.error(
                ErrorCode::InternalError,
                field.name.span,
                path,
                format!("Missing registry entry for type '{type_name}'."),
            )));
        };

        match shape.kind() {
            TypeKind::Scalar => match coerce_scalar(type_name, value) {
                Ok(coerced) => Ok(coerced),
                Err(found) => {
                    self.record(self.error(
                        ErrorCode::ResolverError,
                        field.name.span,
                        path,
                        format!(
                            "Resolver for field '{}' returned {found} for type '{type_name}'.",
                            field.name.value
                        ),
                    ));
                    Ok(Json::Null)
                }
            },
            TypeKind::Enum => {
                let valid = match (&value, shape) {
                    (Json::String(s), TypeShape::Enum { values, .. }) => values.contains(s),
                    _ => false,
                };
                if valid {
                    Ok(value)
                } else {
                    self.record(self.error(
                        ErrorCode::ResolverError,
                        field.name.span,
                        path,
                        format!(
                            "Resolver for field '{}' returned an invalid value for enum '{type_name}'.",
                            field.name.value
                        ),
                    ));
                    Ok(Json::Null)
                }
            }
            TypeKind::Object | TypeKind::Interface | TypeKind::Union => {
                if !value.is_object() {
                    self.record(self.error(
                        ErrorCode::ResolverError,
                        field.name.span,
                        path,
                        format!(
                            "Resolver for field '{}' returned a non-object value for type '{type_name}'.",
                            field.name.value
                        ),
                    ));
                    return Ok(Json::Null);
                }

                let concrete = if shape.kind() == TypeKind::Object {
                    Some(type_name.to_string())
                } else {
                    self.resolve_concrete_type(type_name, &value)
                };
                let Some(concrete) = concrete else {
                    self.record(self.error(
                        ErrorCode::ResolverError,
                        field.name.span,
                        path,
                        format!(
                            "Could not resolve the concrete type of '{type_name}' for field '{}'.",
                            field.name.value
                        ),
                    ));
                    return Ok(Json::Null);
                };

                let subsets: Vec<&SelectionSet> = fields
                    .iter()
                    .filter_map(|field| field.selection_set.as_ref())
                    .collect();
                self.execute_selection_set(concrete, value, subsets, path, false, depth + 1)
                    .await
            }
            TypeKind::InputObject | TypeKind::List | TypeKind::NonNull => {
                Err(Interrupt::Abort(self.error(
                    ErrorCode::InternalError,
                    field.name.span,
                    path,
                    format!("Type '{type_name}' cannot appear in an output position."),
                )))
            }
        }
    }

    /// Runtime type resolution for interfaces and unions: the installed hook
    /// first, then a `__typename` member of the value. The result must be one
    /// of the possible concrete types.
    fn resolve_concrete_type(&self, abstract_type: &str, value: &Json) -> Option<String> {
        let possible = self.schema.possible_types(abstract_type);
        let picked = self
            .type_resolver
            .and_then(|resolve| resolve(value, &possible))
            .or_else(|| {
                value
                    .get("__typename")
                    .and_then(Json::as_str)
                    .map(str::to_string)
            })?;
        possible.contains(&picked).then_some(picked)
    }
}

fn field_failure(sig: &TypeSig) -> Result<Json, Interrupt> {
    if sig.is_non_null() {
        Err(Interrupt::PropagateNull)
    } else {
        Ok(Json::Null)
    }
}

/// Strict result coercion for the built-in scalars. Custom scalars pass
/// through unchanged. Returns the offending kind on mismatch.
fn coerce_scalar(name: &str, value: Json) -> Result<Json, &'static str> {
    let ok = match name {
        "Int" => value.is_i64() || value.is_u64(),
        "Float" => value.is_number(),
        "String" => value.is_string(),
        "Boolean" => value.is_boolean(),
        "ID" => {
            if value.is_i64() || value.is_u64() {
                return Ok(Json::String(value.to_string()));
            }
            value.is_string()
        }
        _ => true,
    };
    if ok {
        Ok(value)
    } else {
        Err(json_kind(&value))
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(n) if n.is_f64() => "a float",
        Json::Number(_) => "an integer",
        Json::String(_) => "a string",
        Json::Array(_) => "a list",
        Json::Object(_) => "an object",
    }
}

/// Coerces the provided variable values against the operation's variable
/// definitions: supplied values are checked against the declared types,
/// absent variables fall back to their declared defaults, and missing
/// non-null variables are errors. Absent nullable variables stay absent so
/// argument defaults can apply.
fn coerce_variables(
    schema: &SchemaState,
    validated: &ValidatedDocument,
    op: &OperationDefinition,
    provided: Option<Json>,
) -> Result<serde_json::Map<String, Json>, Vec<GraphQLError>> {
    let provided = match provided {
        Some(Json::Object(map)) => map,
        Some(Json::Null) | None => serde_json::Map::new(),
        Some(_) => {
            return Err(vec![GraphQLError::new("Variables must be an object.")
                .with_code(ErrorCode::ArgumentError)])
        }
    };

    let mut coerced = serde_json::Map::new();
    let mut errors = Vec::new();

    for var in &op.variables {
        let name = &var.name.value;
        let sig = validated
            .overlay
            .variable(name)
            .and_then(|spec| validated.overlay.signature(&schema.spec_map, spec));

        if let Some(value) = provided.get(name) {
            if let Some(sig) = &sig {
                if let Err(message) = check_runtime_value(schema, value, sig) {
                    errors.push(
                        GraphQLError::new(format!("Variable '${name}': {message}"))
                            .with_code(ErrorCode::ArgumentError)
                            .with_location(validated.line_map.span_location(var.span)),
                    );
                    continue;
                }
            }
            coerced.insert(name.clone(), value.clone());
        } else if let Some(default) = &var.default_value {
            let value =
                specql_semantic::registry::const_value_to_json(default).unwrap_or(Json::Null);
            coerced.insert(name.clone(), value);
        } else if sig.as_ref().is_some_and(TypeSig::is_non_null) {
            errors.push(
                GraphQLError::new(format!(
                    "Variable '${name}' of required type '{}' was not provided.",
                    sig.as_ref().map(ToString::to_string).unwrap_or_default()
                ))
                .with_code(ErrorCode::ArgumentError)
                .with_location(validated.line_map.span_location(var.span)),
            );
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Strict runtime type check for supplied variable values.
fn check_runtime_value(schema: &SchemaState, value: &Json, sig: &TypeSig) -> Result<(), String> {
    match sig {
        TypeSig::NonNull(inner) => {
            if value.is_null() {
                Err(format!("expected non-null value of type '{sig}'"))
            } else {
                check_runtime_value(schema, value, inner)
            }
        }
        _ if value.is_null() => Ok(()),
        TypeSig::List(inner) => match value {
            Json::Array(items) => {
                for item in items {
                    check_runtime_value(schema, item, inner)?;
                }
                Ok(())
            }
            single => check_runtime_value(schema, single, inner),
        },
        TypeSig::Named(name) => {
            let Some(shape) = schema.shape(name) else {
                return Ok(());
            };
            match shape {
                TypeShape::Scalar { .. } => {
                    let ok = match name.as_str() {
                        "Int" => value
                            .as_i64()
                            .is_some_and(|n| i32::try_from(n).is_ok()),
                        "Float" => value.is_number(),
                        "String" => value.is_string(),
                        "Boolean" => value.is_boolean(),
                        "ID" => value.is_string() || value.is_i64() || value.is_u64(),
                        _ => true,
                    };
                    if ok {
                        Ok(())
                    } else {
                        Err(format!("expected a value of type '{name}'"))
                    }
                }
                TypeShape::Enum { values, .. } => match value.as_str() {
                    Some(s) if values.iter().any(|v| v == s) => Ok(()),
                    _ => Err(format!("expected a value of enum '{name}'")),
                },
                TypeShape::InputObject { fields, .. } => {
                    let Json::Object(map) = value else {
                        return Err(format!("expected an input object of type '{name}'"));
                    };
                    for key in map.keys() {
                        if !fields.contains_key(key) {
                            return Err(format!("unknown field '{key}' on input object '{name}'"));
                        }
                    }
                    for (field_name, field) in fields {
                        match map.get(field_name) {
                            Some(field_value) => {
                                if let Some(field_sig) = schema.spec_map.signature(&field.spec) {
                                    check_runtime_value(schema, field_value, &field_sig)?;
                                }
                            }
                            None if field.required => {
                                return Err(format!(
                                    "missing required field '{field_name}' on input object '{name}'"
                                ));
                            }
                            None => {}
                        }
                    }
                    Ok(())
                }
                _ => Err(format!("type '{name}' is not an input type")),
            }
        }
    }
}
