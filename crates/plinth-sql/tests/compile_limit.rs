mod support;

use plinth_core::{Operation, QueryArgs, Value};
use plinth_sql::Compiler;
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{args, blog, USER_COLUMNS};

fn limit_sql(compiler: &Compiler<'_>, take: Option<u64>, skip: Option<u64>) -> Option<String> {
    compiler
        .compile_limit("User", take, skip)
        .unwrap()
        .map(|fragment| compiler.render(&fragment).sql)
}

#[test]
fn take_and_skip() {
    let schema = blog();
    let stmt = Compiler::postgresql(&schema)
        .compile("User", Operation::FindMany, &args(json!({ "take": 10, "skip": 5 })))
        .unwrap();

    assert_eq!(
        stmt.sql,
        format!(r#"SELECT {USER_COLUMNS} FROM "users" AS t0 LIMIT 10 OFFSET 5"#)
    );
    assert!(stmt.params.is_empty());
}

#[test]
fn limit_forms_per_dialect() {
    let schema = blog();

    let postgresql = Compiler::postgresql(&schema);
    assert_eq!(limit_sql(&postgresql, None, None), None);
    assert_eq!(limit_sql(&postgresql, Some(0), None).as_deref(), Some("LIMIT 0"));
    assert_eq!(limit_sql(&postgresql, Some(10), Some(5)).as_deref(), Some("LIMIT 10 OFFSET 5"));
    assert_eq!(limit_sql(&postgresql, None, Some(5)).as_deref(), Some("OFFSET 5"));

    let sqlite = Compiler::sqlite(&schema);
    assert_eq!(limit_sql(&sqlite, Some(10), Some(5)).as_deref(), Some("LIMIT 10 OFFSET 5"));
    assert_eq!(limit_sql(&sqlite, None, Some(5)).as_deref(), Some("LIMIT -1 OFFSET 5"));

    let mysql = Compiler::mysql(&schema);
    assert_eq!(limit_sql(&mysql, Some(10), None).as_deref(), Some("LIMIT 10"));
    assert_eq!(
        limit_sql(&mysql, None, Some(5)).as_deref(),
        Some("LIMIT 18446744073709551615 OFFSET 5")
    );
}

#[test]
fn negative_take_is_rejected_upstream() {
    assert!(QueryArgs::from_json(json!({ "take": -1 })).is_err());

    let schema = blog();
    let err = Compiler::postgresql(&schema)
        .compile_json("User", Operation::FindMany, json!({ "skip": -3 }))
        .unwrap_err();
    assert!(err.to_string().contains("invalid value"));
}

#[test]
fn single_record_reads_take_one() {
    let schema = blog();
    let compiler = Compiler::postgresql(&schema);

    let stmt = compiler
        .compile(
            "User",
            Operation::FindFirst,
            &args(json!({ "where": { "name": "ann" }, "orderBy": { "age": "desc" }, "skip": 2 })),
        )
        .unwrap();
    assert_eq!(
        stmt.sql,
        format!(r#"SELECT {USER_COLUMNS} FROM "users" AS t0 WHERE t0."name" = $1 ORDER BY t0."age" DESC LIMIT 1 OFFSET 2"#)
    );

    let stmt = compiler
        .compile("User", Operation::FindUnique, &args(json!({ "where": { "email": "a@b.c" } })))
        .unwrap();
    assert_eq!(
        stmt.sql,
        format!(r#"SELECT {USER_COLUMNS} FROM "users" AS t0 WHERE t0."email" = $1 LIMIT 1"#)
    );
}

#[test]
fn find_unique_needs_a_unique_equality() {
    let schema = blog();
    let compiler = Compiler::postgresql(&schema);

    compiler
        .compile("User", Operation::FindUnique, &args(json!({ "where": { "id": { "equals": 3 } } })))
        .unwrap();

    let err = compiler
        .compile("User", Operation::FindUnique, &args(json!({ "where": { "name": "ann" } })))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "invalid query on `User`: `findUnique` needs an equality on a unique field (id, email)"
    );

    let err = compiler
        .compile("User", Operation::FindUnique, &args(json!({ "where": { "email": { "contains": "a" } } })))
        .unwrap_err();
    assert!(err.is_validation());

    let err = compiler
        .compile("User", Operation::FindUnique, &args(json!({})))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn cursor_is_a_keyset_predicate() {
    let schema = blog();
    let compiler = Compiler::postgresql(&schema);

    let stmt = compiler
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({ "cursor": { "id": 10 }, "take": 5, "orderBy": { "id": "desc" } })),
        )
        .unwrap();
    assert_eq!(
        stmt.sql,
        format!(r#"SELECT {USER_COLUMNS} FROM "users" AS t0 WHERE t0."id" <= $1 ORDER BY t0."id" DESC LIMIT 5"#)
    );
    assert_eq!(stmt.params, [Value::from(10)]);

    let stmt = compiler
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({ "where": { "name": "ann" }, "cursor": { "email": "a@b.c" }, "take": 5 })),
        )
        .unwrap();
    assert!(stmt
        .sql
        .ends_with(r#"WHERE (t0."name" = $1 AND t0."email" >= $2) ORDER BY t0."email" ASC LIMIT 5"#));
}

#[test]
fn cursor_orders_on_its_fields() {
    let schema = blog();
    let compiler = Compiler::postgresql(&schema);

    let stmt = compiler
        .compile("User", Operation::FindMany, &args(json!({ "cursor": { "id": 10 }, "take": 5 })))
        .unwrap();
    assert_eq!(
        stmt.sql,
        format!(r#"SELECT {USER_COLUMNS} FROM "users" AS t0 WHERE t0."id" >= $1 ORDER BY t0."id" ASC LIMIT 5"#)
    );

    // The page of a paginated count is ordered too.
    let stmt = compiler
        .compile("User", Operation::Count, &args(json!({ "cursor": { "id": 10 }, "take": 5 })))
        .unwrap();
    assert!(stmt
        .sql
        .contains(r#"WHERE t0."id" >= $1 ORDER BY t0."id" ASC LIMIT 5"#));
}

#[test]
fn cursor_on_several_fields_is_a_row_comparison() {
    let schema = blog();
    let compiler = Compiler::postgresql(&schema);

    let stmt = compiler
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({ "cursor": { "id": 10, "email": "a@b.c" }, "take": 2 })),
        )
        .unwrap();
    assert_eq!(
        stmt.sql,
        format!(
            r#"SELECT {USER_COLUMNS} FROM "users" AS t0 WHERE (t0."id", t0."email") >= ($1, $2) ORDER BY t0."id" ASC, t0."email" ASC LIMIT 2"#
        )
    );
    assert_eq!(stmt.params, [Value::from(10), Value::from("a@b.c")]);

    // `orderBy` decides the order of the boundary columns.
    let stmt = compiler
        .compile(
            "User",
            Operation::FindMany,
            &args(json!({
                "cursor": { "id": 10, "email": "a@b.c" },
                "orderBy": [{ "email": "desc" }, { "id": "desc" }],
            })),
        )
        .unwrap();
    assert_eq!(
        stmt.sql,
        format!(
            r#"SELECT {USER_COLUMNS} FROM "users" AS t0 WHERE (t0."email", t0."id") <= ($1, $2) ORDER BY t0."email" DESC, t0."id" DESC"#
        )
    );
    assert_eq!(stmt.params, [Value::from("a@b.c"), Value::from(10)]);
}

#[test]
fn cursor_errors() {
    let schema = blog();
    let compiler = Compiler::postgresql(&schema);

    let compile = |query: serde_json::Value| {
        compiler
            .compile("User", Operation::FindMany, &args(query))
            .unwrap_err()
    };

    assert!(compile(json!({ "cursor": {} })).is_validation());
    assert!(compile(json!({ "cursor": { "name": "ann" } })).is_validation());
    assert!(compile(json!({ "cursor": { "id": null } })).is_validation());
    assert!(compile(json!({ "cursor": { "nope": 1 } })).is_schema_reference());

    let err = compile(json!({ "cursor": { "id": 10 }, "orderBy": { "name": "asc" } }));
    assert!(err.is_unsupported_operation());

    let err = compile(json!({ "cursor": { "id": 10, "email": "a@b.c" }, "orderBy": { "id": "desc" } }));
    assert!(err.is_unsupported_operation());
    assert_eq!(
        err.to_string(),
        "unsupported operation: cursor pagination with mixed ordering directions"
    );

    let err = compile(json!({ "cursor": { "id": 10 }, "distinct": ["name"] }));
    assert!(err.is_unsupported_operation());
}
