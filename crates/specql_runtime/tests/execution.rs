//! End-to-end execution tests: schema source in, response tree out.

use serde_json::{json, Value};
use specql_runtime::{
    build_schema, execute, Context, Executor, ExecutorConfig, OperationInput, ResolverMap,
    SchemaInput,
};
use specql_runtime::{CancellationToken, ResolverError};
use std::sync::{Arc, Mutex};

async fn run(
    schema: &str,
    resolvers: &ResolverMap,
    query: &str,
    variables: Option<Value>,
) -> specql_runtime::Response {
    let ctx = Context::new();
    execute(
        &ctx,
        SchemaInput::Source(schema),
        resolvers,
        OperationInput::Source(query),
        variables,
    )
    .await
}

const PETS: &str = "type Query { dog: Dog human: Human }\n\
    type Dog { name: String }\n\
    type Human { pets: [Pet] }\n\
    type Pet { name: String }";

fn pet_resolvers() -> ResolverMap {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "dog", |_ctx, _parent, _args| {
        Ok(json!({"name": "Rex"}))
    });
    resolvers.register_fn("Query", "human", |_ctx, _parent, _args| {
        Ok(json!({"pets": [{"name": "Rex"}, {"name": "Mia"}]}))
    });
    resolvers
}

#[tokio::test]
async fn executes_object_and_leaf_fields() {
    let response = run(PETS, &pet_resolvers(), "{ dog { name } }", None).await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.data, Some(json!({"dog": {"name": "Rex"}})));
}

#[tokio::test]
async fn executes_lists_with_default_resolvers() {
    let response = run(PETS, &pet_resolvers(), "{ human { pets { name } } }", None).await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({"human": {"pets": [{"name": "Rex"}, {"name": "Mia"}]}}))
    );
}

#[tokio::test]
async fn variable_default_is_used_when_variables_are_omitted() {
    let schema = "type Query { f(n: Int): Int }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "f", |_ctx, _parent, args| {
        match args.and_then(|a| a.get_as::<i64>("n")) {
            Some(n) => Ok(json!(n * n)),
            None => Ok(Value::Null),
        }
    });

    let response = run(schema, &resolvers, "query($x: Int = 3) { f(n: $x) }", None).await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.data, Some(json!({"f": 9})));
}

#[tokio::test]
async fn explicit_null_variable_overrides_the_default() {
    let schema = "type Query { f(n: Int): Int }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "f", |_ctx, _parent, args| {
        match args.and_then(|a| a.get_as::<i64>("n")) {
            Some(n) => Ok(json!(n * n)),
            None => Ok(Value::Null),
        }
    });

    let response = run(
        schema,
        &resolvers,
        "query($x: Int = 3) { f(n: $x) }",
        Some(json!({"x": null})),
    )
    .await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.data, Some(json!({"f": null})));
}

#[tokio::test]
async fn null_for_non_null_argument_is_an_argument_error() {
    let schema = "type Query { f(n: Int!): Int }";
    let resolvers = ResolverMap::new();
    let response = run(
        schema,
        &resolvers,
        "query($x: Int = 3) { f(n: $x) }",
        Some(json!({"x": null})),
    )
    .await;
    assert_eq!(response.data, Some(json!({"f": null})));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code(), Some("ARGUMENT_ERROR"));
}

#[tokio::test]
async fn response_keys_preserve_source_order() {
    let resolvers = pet_resolvers();
    let response = run(
        PETS,
        &resolvers,
        "{ second: human { pets { name } } first: dog { name } }",
        None,
    )
    .await;
    assert!(response.is_ok(), "{:?}", response.errors);
    let rendered = serde_json::to_string(&response.data.unwrap()).unwrap();
    let second = rendered.find("\"second\"").unwrap();
    let first = rendered.find("\"first\"").unwrap();
    assert!(second < first, "keys out of source order: {rendered}");
}

#[tokio::test]
async fn sibling_order_is_stable_even_when_resolvers_finish_out_of_order() {
    let schema = "type Query { slow: Int fast: Int }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_async("Query", "slow", |_ctx, _parent, _args| async {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Ok(json!(1))
    });
    resolvers.register_fn("Query", "fast", |_ctx, _parent, _args| Ok(json!(2)));

    let response = run(schema, &resolvers, "{ slow fast }", None).await;
    let rendered = serde_json::to_string(&response.data.unwrap()).unwrap();
    assert_eq!(rendered, r#"{"slow":1,"fast":2}"#);
}

#[tokio::test]
async fn mutations_execute_in_strict_source_order() {
    let schema = "schema { query: Query mutation: Mutation }\n\
        type Query { ok: Boolean }\n\
        type Mutation { a: Int b: Int c: Int }";

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut resolvers = ResolverMap::new();
    for (field, delay_ms) in [("a", 30u64), ("b", 10), ("c", 0)] {
        let log = Arc::clone(&log);
        resolvers.register_async("Mutation", field, move |_ctx, _parent, _args| {
            let log = Arc::clone(&log);
            async move {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                log.lock().unwrap().push(field);
                Ok(json!(1))
            }
        });
    }

    let response = run(schema, &resolvers, "mutation { a b c }", None).await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn fragments_expand_and_cycles_terminate() {
    let query = "{ dog { ...a } }\n\
        fragment a on Dog { name ...b }\n\
        fragment b on Dog { ...a }";
    let response = run(PETS, &pet_resolvers(), query, None).await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.data, Some(json!({"dog": {"name": "Rex"}})));
}

#[tokio::test]
async fn skip_and_include_directives_drop_selections() {
    let response = run(
        PETS,
        &pet_resolvers(),
        "query($keep: Boolean!) { dog { name @skip(if: true) kept: name @include(if: $keep) } }",
        Some(json!({"keep": true})),
    )
    .await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.data, Some(json!({"dog": {"kept": "Rex"}})));
}

#[tokio::test]
async fn typename_resolves_without_a_resolver() {
    let response = run(
        PETS,
        &pet_resolvers(),
        "{ __typename dog { __typename } }",
        None,
    )
    .await;
    assert_eq!(
        response.data,
        Some(json!({"__typename": "Query", "dog": {"__typename": "Dog"}}))
    );
}

#[tokio::test]
async fn interface_runtime_type_comes_from_typename_member() {
    let schema = "type Query { pet: Named }\n\
        interface Named { name: String }\n\
        type Dog implements Named { name: String barks: Boolean }\n\
        type Cat implements Named { name: String }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "pet", |_ctx, _parent, _args| {
        Ok(json!({"__typename": "Dog", "name": "Rex", "barks": true}))
    });

    let response = run(
        schema,
        &resolvers,
        "{ pet { name ... on Dog { barks } } }",
        None,
    )
    .await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({"pet": {"name": "Rex", "barks": true}}))
    );
}

#[tokio::test]
async fn union_runtime_type_uses_the_installed_hook() {
    let schema = "type Query { pet: Pet }\n\
        union Pet = Dog | Cat\n\
        type Dog { name: String }\n\
        type Cat { lives: Int }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "pet", |_ctx, _parent, _args| {
        Ok(json!({"lives": 9}))
    });

    let state = build_schema(schema).unwrap();
    let validation = specql_runtime::validate(&state, "{ pet { ... on Cat { lives } } }", None);
    assert!(validation.is_ok(), "{:?}", validation.errors);

    let executor = Executor::new(&state, &resolvers).with_type_resolver(|value, possible| {
        if value.get("lives").is_some() {
            possible.iter().find(|name| *name == "Cat").cloned()
        } else {
            possible.first().cloned()
        }
    });
    let response = executor
        .execute(&Context::new(), &validation.document, None)
        .await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(response.data, Some(json!({"pet": {"lives": 9}})));
}

#[tokio::test]
async fn resolver_error_nulls_the_field_and_records_the_path() {
    let schema = "type Query { human: Human }\n\
        type Human { pets: [Pet] }\n\
        type Pet { name: String }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "human", |_ctx, _parent, _args| {
        Ok(json!({"pets": [{"name": "Rex"}]}))
    });
    resolvers.register_fn("Pet", "name", |_ctx, _parent, _args| {
        Err(ResolverError::Failed("kennel unavailable".to_string()))
    });

    let response = run(schema, &resolvers, "{ human { pets { name } } }", None).await;
    assert_eq!(
        response.data,
        Some(json!({"human": {"pets": [{"name": null}]}}))
    );
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "kennel unavailable");
    let path = serde_json::to_value(&response.errors[0].path).unwrap();
    assert_eq!(path, json!(["human", "pets", 0, "name"]));
}

#[tokio::test]
async fn non_null_violation_nulls_the_nearest_nullable_ancestor() {
    let schema = "type Query { dog: Dog }\n\
        type Dog { name: String! }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "dog", |_ctx, _parent, _args| Ok(json!({})));

    let response = run(schema, &resolvers, "{ dog { name } }", None).await;
    // Dog.name is non-null, so the dog object itself becomes null.
    assert_eq!(response.data, Some(json!({"dog": null})));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code(), Some("NON_NULL_VIOLATION"));
    assert!(response.errors[0]
        .message
        .contains("non-nullable field 'Dog.name'"));
}

#[tokio::test]
async fn non_null_list_permits_null_elements_of_nullable_type() {
    let schema = "type Query { pets: [Pet]! }\n\
        type Pet { name: String }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "pets", |_ctx, _parent, _args| {
        Ok(json!([{"name": "Rex"}, null]))
    });

    let response = run(schema, &resolvers, "{ pets { name } }", None).await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({"pets": [{"name": "Rex"}, null]}))
    );
}

#[tokio::test]
async fn null_for_a_non_null_list_propagates() {
    let schema = "type Query { pets: [Pet]! }\n\
        type Pet { name: String }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "pets", |_ctx, _parent, _args| Ok(Value::Null));

    let response = run(schema, &resolvers, "{ pets { name } }", None).await;
    assert_eq!(response.data, Some(json!(null)));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code(), Some("NON_NULL_VIOLATION"));
}

#[tokio::test]
async fn deeply_nested_lists_round_trip() {
    let schema = "type Query { grid: [[[Int]]] }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "grid", |_ctx, _parent, _args| {
        Ok(json!([[[1, 2], [3]], [[4]]]))
    });

    let response = run(schema, &resolvers, "{ grid }", None).await;
    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        Some(json!({"grid": [[[1, 2], [3]], [[4]]]}))
    );
}

#[tokio::test]
async fn strict_scalar_coercion_rejects_mismatched_results() {
    let schema = "type Query { count: Int }";
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "count", |_ctx, _parent, _args| Ok(json!(1.5)));

    let response = run(schema, &resolvers, "{ count }", None).await;
    assert_eq!(response.data, Some(json!({"count": null})));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code(), Some("RESOLVER_ERROR"));
}

#[tokio::test]
async fn executing_twice_yields_identical_results() {
    let state = build_schema(PETS).unwrap();
    let resolvers = pet_resolvers();
    let validation =
        specql_runtime::validate(&state, "{ human { pets { name } } dog { name } }", None);
    assert!(validation.is_ok());

    let executor = Executor::new(&state, &resolvers);
    let first = executor
        .execute(&Context::new(), &validation.document, None)
        .await;
    let second = executor
        .execute(&Context::new(), &validation.document, None)
        .await;
    assert_eq!(first.data, second.data);
}

#[tokio::test]
async fn cancelled_execution_returns_a_cancelled_error() {
    let state = build_schema(PETS).unwrap();
    let resolvers = pet_resolvers();
    let validation = specql_runtime::validate(&state, "{ dog { name } }", None);

    let token = CancellationToken::new();
    token.cancel();
    let executor = Executor::new(&state, &resolvers).with_cancellation(token);
    let response = executor
        .execute(&Context::new(), &validation.document, None)
        .await;
    assert!(response.data.is_none());
    assert!(response
        .errors
        .iter()
        .any(|error| error.code() == Some("CANCELLED")));
}

#[tokio::test]
async fn max_depth_limit_aborts_execution() {
    let state = build_schema(PETS).unwrap();
    let resolvers = pet_resolvers();
    let validation = specql_runtime::validate(&state, "{ human { pets { name } } }", None);

    let executor = Executor::new(&state, &resolvers).with_config(ExecutorConfig {
        max_depth: Some(1),
    });
    let response = executor
        .execute(&Context::new(), &validation.document, None)
        .await;
    assert!(response.data.is_none());
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn missing_non_null_variable_fails_before_execution() {
    let schema = "type Query { f(n: Int!): Int }";
    let resolvers = ResolverMap::new();
    let response = run(schema, &resolvers, "query($x: Int!) { f(n: $x) }", None).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0]
        .message
        .contains("Variable '$x' of required type 'Int!' was not provided."));
}

#[tokio::test]
async fn supplied_variable_with_wrong_runtime_type_is_rejected() {
    let schema = "type Query { f(n: Int): Int }";
    let resolvers = ResolverMap::new();
    let response = run(
        schema,
        &resolvers,
        "query($x: Int) { f(n: $x) }",
        Some(json!({"x": "three"})),
    )
    .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), Some("ARGUMENT_ERROR"));
}
