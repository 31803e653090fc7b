//! Execution runtime for SpecQL.
//!
//! This crate provides:
//! - `resolver`: The resolver registry and resolver traits
//! - `executor`: Field collection, resolution, and value completion
//! - `response`: The wire-shaped response and error model
//! - `directives`: `@include`/`@skip` evaluation
//! - `cancel`: Cooperative cancellation for executions
//! - `engine`: The public `build_schema`/`validate`/`execute` entry points

pub mod cancel;
pub mod directives;
pub mod engine;
pub mod executor;
pub mod resolver;
pub mod response;

pub use cancel::{CancellationError, CancellationToken};
pub use engine::{build_schema, execute, validate, OperationInput, SchemaErrors, SchemaInput, Validation};
pub use executor::{Context, Executor, ExecutorConfig, TypeResolverFn};
pub use resolver::{
    AsyncFnResolver, FnResolver, Resolver, ResolverArgs, ResolverError, ResolverMap, ResolverResult,
};
pub use response::{ErrorCode, GraphQLError, PathSegment, Response};

pub use specql_semantic::{RuleName, SchemaState, ValidatedDocument};
