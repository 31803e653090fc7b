//! Resolver registry and resolver traits.
//!
//! Resolvers are callables of shape `(context, parent-value, args-or-null)`.
//! The registry maps `(parent-type-name, field-name)` pairs to resolvers and
//! substitutes a by-field-name lookup on the parent object whenever no
//! explicit resolver is registered.

use crate::executor::Context;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Arguments passed to a resolver, in declared order.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    args: IndexMap<String, Value>,
}

impl ResolverArgs {
    /// Creates empty resolver args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from (name, value) pairs.
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self {
            args: pairs.into_iter().collect(),
        }
    }

    /// Gets an argument by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument deserialized into a concrete type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Gets a required argument, failing when absent or mistyped.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        self.args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))
            .and_then(|value| {
                serde_json::from_value(value.clone()).map_err(|err| {
                    ResolverError::ArgumentParse(name.to_string(), err.to_string())
                })
            })
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }

    /// Iterates the arguments in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.args.iter()
    }

    /// Returns true if no arguments are present.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Result type for resolvers.
pub type ResolverResult = Result<Value, ResolverError>;

/// Future type for resolvers.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Error from a resolver.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolverError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Failed to parse argument '{0}': {1}")]
    ArgumentParse(String, String),

    #[error("{0}")]
    Failed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        Self::Failed(message)
    }
}

impl From<&str> for ResolverError {
    fn from(message: &str) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value. `args` is `None` when the field has no
    /// arguments after defaults and variables are merged.
    fn resolve<'a>(
        &'a self,
        ctx: &'a Context,
        parent: &'a Value,
        args: Option<&'a ResolverArgs>,
    ) -> ResolverFuture<'a>;
}

/// A boxed resolver.
pub type BoxedResolver = Box<dyn Resolver>;

/// A sync resolver function.
pub type SyncResolverFn =
    Arc<dyn Fn(&Context, &Value, Option<&ResolverArgs>) -> ResolverResult + Send + Sync>;

/// A wrapper for sync resolver functions.
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    /// Creates a new function resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context, &Value, Option<&ResolverArgs>) -> ResolverResult + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(
        &'a self,
        ctx: &'a Context,
        parent: &'a Value,
        args: Option<&'a ResolverArgs>,
    ) -> ResolverFuture<'a> {
        let result = (self.func)(ctx, parent, args);
        Box::pin(async move { result })
    }
}

/// An async resolver function type.
pub type AsyncResolverFn = Arc<
    dyn Fn(Context, Value, Option<ResolverArgs>) -> ResolverFuture<'static> + Send + Sync,
>;

/// A wrapper for async resolver functions.
pub struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    /// Creates a new async function resolver.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, Value, Option<ResolverArgs>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |ctx, parent, args| Box::pin(f(ctx, parent, args))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        ctx: &'a Context,
        parent: &'a Value,
        args: Option<&'a ResolverArgs>,
    ) -> ResolverFuture<'a> {
        let ctx = ctx.clone();
        let parent = parent.clone();
        let args = args.cloned();
        let func = Arc::clone(&self.func);
        Box::pin(async move { func(ctx, parent, args).await })
    }
}

/// The default resolution: look the field up by name on the parent object.
/// The synthetic root value and missing members both yield null.
pub fn default_resolve(parent: &Value, field_name: &str) -> ResolverResult {
    match parent {
        Value::Object(map) => Ok(map.get(field_name).cloned().unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

/// A resolver bound to one field lookup.
pub enum FieldResolver<'a> {
    User(&'a dyn Resolver),
    Default,
}

impl FieldResolver<'_> {
    /// Invokes the resolver.
    pub async fn resolve(
        &self,
        ctx: &Context,
        parent: &Value,
        args: Option<&ResolverArgs>,
        field_name: &str,
    ) -> ResolverResult {
        match self {
            Self::User(resolver) => resolver.resolve(ctx, parent, args).await,
            Self::Default => default_resolve(parent, field_name),
        }
    }
}

/// Storage for resolvers organized by parent type and field.
#[derive(Default)]
pub struct ResolverMap {
    /// Resolvers indexed by "TypeName.fieldName".
    resolvers: HashMap<String, BoxedResolver>,
}

impl ResolverMap {
    /// Creates a new resolver map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a resolver map from a nested user map
    /// `{type-name -> {field-name -> resolver}}`.
    pub fn from_map(map: HashMap<String, HashMap<String, BoxedResolver>>) -> Self {
        let mut resolvers = HashMap::new();
        for (type_name, fields) in map {
            for (field_name, resolver) in fields {
                resolvers.insert(format!("{type_name}.{field_name}"), resolver);
            }
        }
        Self { resolvers }
    }

    /// Registers a resolver for a specific type and field.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        let key = format!("{}.{}", type_name.into(), field_name.into());
        self.resolvers.insert(key, Box::new(resolver));
    }

    /// Registers a sync function as a resolver.
    pub fn register_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Context, &Value, Option<&ResolverArgs>) -> ResolverResult + Send + Sync + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Registers an async function as a resolver.
    pub fn register_async<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(Context, Value, Option<ResolverArgs>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    /// Looks up the resolver for a type and field, falling back to the
    /// default by-name resolver.
    pub fn lookup(&self, type_name: &str, field_name: &str) -> FieldResolver<'_> {
        let key = format!("{type_name}.{field_name}");
        match self.resolvers.get(&key) {
            Some(resolver) => FieldResolver::User(resolver.as_ref()),
            None => FieldResolver::Default,
        }
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolver_count", &self.resolvers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_args() {
        let mut args = ResolverArgs::new();
        args.set("id", serde_json::json!(123));
        args.set("name", serde_json::json!("test"));

        assert_eq!(args.get_as::<i64>("id"), Some(123));
        assert_eq!(args.get_as::<String>("name"), Some("test".to_string()));
        assert_eq!(args.get_as::<i64>("missing"), None);
    }

    #[test]
    fn test_args_preserve_declared_order() {
        let args = ResolverArgs::from_pairs(vec![
            ("b".to_string(), serde_json::json!(1)),
            ("a".to_string(), serde_json::json!(2)),
        ]);
        let names: Vec<_> = args.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_default_resolve() {
        let parent = serde_json::json!({"name": "Rex", "age": 3});
        assert_eq!(default_resolve(&parent, "name").unwrap(), serde_json::json!("Rex"));
        assert_eq!(default_resolve(&parent, "missing").unwrap(), Value::Null);
        assert_eq!(default_resolve(&Value::Null, "name").unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_fn_resolver() {
        let resolver = FnResolver::new(|_ctx, _parent, args| {
            let n: i64 = args
                .ok_or(ResolverError::MissingArgument("n".to_string()))?
                .require("n")?;
            Ok(serde_json::json!(n * n))
        });

        let ctx = Context::new();
        let mut args = ResolverArgs::new();
        args.set("n", serde_json::json!(3));

        let result = resolver
            .resolve(&ctx, &Value::Null, Some(&args))
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!(9));
    }

    #[tokio::test]
    async fn test_resolver_map_lookup() {
        let mut map = ResolverMap::new();
        map.register_fn("Query", "hello", |_ctx, _parent, _args| {
            Ok(serde_json::json!("Hello, World!"))
        });

        let ctx = Context::new();
        let result = map
            .lookup("Query", "hello")
            .resolve(&ctx, &Value::Null, None, "hello")
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!("Hello, World!"));

        // Unregistered fields fall back to by-name lookup.
        let parent = serde_json::json!({"name": "Bob"});
        let result = map
            .lookup("User", "name")
            .resolve(&ctx, &parent, None, "name")
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!("Bob"));
    }

    #[tokio::test]
    async fn test_async_resolver() {
        let resolver = AsyncFnResolver::new(|_ctx, _parent, _args| async {
            Ok(serde_json::json!("deferred"))
        });
        let ctx = Context::new();
        let result = resolver.resolve(&ctx, &Value::Null, None).await.unwrap();
        assert_eq!(result, serde_json::json!("deferred"));
    }
}
