mod support;

use plinth_core::{query::OrderByArg, Operation};
use plinth_sql::{Compiler, Config};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{args, blog, USER_COLUMNS};

fn order_by_sql(order_by: serde_json::Value) -> String {
    let schema = blog();
    let compiler = Compiler::postgresql(&schema);
    let order_by: OrderByArg = serde_json::from_value(order_by).unwrap();
    let fragment = compiler
        .compile_order_by("User", Operation::FindMany, &order_by)
        .unwrap()
        .unwrap();
    compiler.render(&fragment).sql
}

fn order_by_err(order_by: serde_json::Value) -> plinth_core::Error {
    let schema = blog();
    let order_by: OrderByArg = serde_json::from_value(order_by).unwrap();
    Compiler::postgresql(&schema)
        .compile_order_by("User", Operation::FindMany, &order_by)
        .unwrap_err()
}

#[test]
fn single_field() {
    assert_eq!(order_by_sql(json!({ "name": "asc" })), r#"ORDER BY t0."name" ASC"#);
    assert_eq!(order_by_sql(json!({ "name": "desc" })), r#"ORDER BY t0."name" DESC"#);
}

#[test]
fn directions_are_case_insensitive() {
    assert_eq!(order_by_sql(json!({ "name": "DESC" })), r#"ORDER BY t0."name" DESC"#);
    assert_eq!(order_by_sql(json!({ "name": "Asc" })), r#"ORDER BY t0."name" ASC"#);
}

#[test]
fn entries_keep_input_order() {
    assert_eq!(
        order_by_sql(json!([{ "name": "desc" }, { "id": "asc" }])),
        r#"ORDER BY t0."name" DESC, t0."id" ASC"#
    );
    assert_eq!(
        order_by_sql(json!({ "email": "asc", "name": "desc" })),
        r#"ORDER BY t0."email" ASC, t0."name" DESC"#
    );
}

#[test]
fn in_a_full_statement() {
    let schema = blog();
    let stmt = Compiler::postgresql(&schema)
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({ "where": { "age": { "gte": 18 } }, "orderBy": { "name": "asc" } })),
        )
        .unwrap();

    assert_eq!(
        stmt.sql,
        format!(r#"SELECT {USER_COLUMNS} FROM "users" AS t0 WHERE t0."age" >= $1 ORDER BY t0."name" ASC"#)
    );
}

#[test]
fn invalid_direction() {
    let err = order_by_err(json!({ "name": "up" }));
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "invalid query on `User.name`: invalid order direction `up`, expected `asc` or `desc`"
    );

    let err = order_by_err(json!({ "name": 1 }));
    assert!(err.is_validation());
}

#[test]
fn nulls_placement() {
    assert_eq!(
        order_by_sql(json!({ "age": { "sort": "asc", "nulls": "last" } })),
        r#"ORDER BY t0."age" ASC NULLS LAST"#
    );
    assert_eq!(
        order_by_sql(json!({ "age": { "sort": "desc", "nulls": "first" } })),
        r#"ORDER BY t0."age" DESC NULLS FIRST"#
    );

    let err = order_by_err(json!({ "age": { "nulls": "last" } }));
    assert!(err.is_validation());

    let err = order_by_err(json!({ "age": { "sort": "asc", "nulls": "middle" } }));
    assert!(err.is_validation());
}

#[test]
fn nulls_placement_is_unsupported_on_mysql() {
    let schema = blog();
    let err = Compiler::mysql(&schema)
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({ "orderBy": { "age": { "sort": "asc", "nulls": "last" } } })),
        )
        .unwrap_err();

    assert!(err.is_unsupported_operation());
}

#[test]
fn unsupported_and_unknown_keys() {
    let err = order_by_err(json!({ "posts": { "title": "asc" } }));
    assert!(err.is_unsupported_operation());
    assert_eq!(err.to_string(), "unsupported operation: ordering by relation fields");

    let err = order_by_err(json!({ "nickname": "asc" }));
    assert!(err.is_schema_reference());

    let err = order_by_err(json!([{}]));
    assert!(err.is_validation());

    // Aggregates are only orderable in `groupBy`
    let err = order_by_err(json!({ "_count": "desc" }));
    assert!(err.is_validation());
}

#[test]
fn tiebreaker_applies_to_paginated_reads() {
    let schema = blog();
    let compiler = Compiler::builder(&schema).order_tiebreaker(true).build();

    let stmt = compiler
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({ "orderBy": { "name": "asc" }, "take": 10 })),
        )
        .unwrap();
    assert!(stmt.sql.ends_with(r#"ORDER BY t0."name" ASC, t0."id" ASC LIMIT 10"#));

    // Already ordered on the identifier
    let stmt = compiler
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({ "orderBy": { "id": "desc" }, "skip": 3 })),
        )
        .unwrap();
    assert!(stmt.sql.ends_with(r#"ORDER BY t0."id" DESC OFFSET 3"#));

    // Nothing to stabilize without pagination
    let stmt = compiler
        .compile("User", Operation::FindMany, &args(json!({ "orderBy": { "name": "asc" } })))
        .unwrap();
    assert!(stmt.sql.ends_with(r#"ORDER BY t0."name" ASC"#));

    let stmt = compiler
        .compile("User", Operation::FindMany, &args(json!({ "take": 5 })))
        .unwrap();
    assert!(stmt.sql.ends_with(r#"ORDER BY t0."id" ASC LIMIT 5"#));
}

#[test]
fn tiebreaker_is_off_by_default() {
    let schema = blog();
    let stmt = Compiler::postgresql(&schema)
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({ "orderBy": { "name": "asc" }, "take": 10 })),
        )
        .unwrap();
    assert!(stmt.sql.ends_with(r#"ORDER BY t0."name" ASC LIMIT 10"#));
}

#[test]
fn tiebreaker_from_config() {
    let schema = blog();
    let config = Config::from_json_str(r#"{ "orderTiebreaker": true }"#).unwrap();
    let compiler = Compiler::from_config(&schema, config);

    let stmt = compiler
        .compile(
            "Tag",
            Operation::FindMany,
            &args(json!({ "orderBy": { "name": "desc" }, "take": 1 })),
        )
        .unwrap();
    assert_eq!(
        stmt.sql,
        r#"SELECT t0."id", t0."name" FROM "tags" AS t0 ORDER BY t0."name" DESC, t0."id" ASC LIMIT 1"#
    );
}
