mod support;

use plinth_core::{Operation, Value};
use plinth_sql::{Compiler, Statement};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{args, blog, USER_COLUMNS};

fn compile(model: &str, operation: Operation, args_json: serde_json::Value) -> Statement {
    let schema = blog();
    Compiler::postgresql(&schema)
        .compile(model, operation, &args(args_json))
        .unwrap()
}

fn compile_err(model: &str, operation: Operation, args_json: serde_json::Value) -> plinth_core::Error {
    let schema = blog();
    Compiler::postgresql(&schema)
        .compile(model, operation, &args(args_json))
        .unwrap_err()
}

#[test]
fn default_projection_is_every_scalar() {
    let stmt = compile("User", Operation::FindMany, json!({}));
    assert_eq!(stmt.sql, format!(r#"SELECT {USER_COLUMNS} FROM "users" AS t0"#));
}

#[test]
fn explicit_selection() {
    let stmt = compile(
        "User",
        Operation::FindMany,
        json!({ "select": { "id": true, "email": true, "name": false } }),
    );
    assert_eq!(stmt.sql, r#"SELECT t0."id", t0."email" FROM "users" AS t0"#);

    let schema = blog();
    let compiler = Compiler::postgresql(&schema);
    let list = compiler
        .compile_select("User", Operation::FindMany, &args(json!({ "select": { "name": true } })))
        .unwrap();
    assert_eq!(compiler.render(&list).sql, r#"t0."name""#);
}

#[test]
fn distinct_keeps_one_row_per_value() {
    let stmt = compile("User", Operation::FindMany, json!({ "distinct": ["name"] }));
    assert_eq!(
        stmt.sql,
        format!(r#"SELECT DISTINCT ON (t0."name") {USER_COLUMNS} FROM "users" AS t0 ORDER BY t0."name" ASC"#)
    );

    // Distinct fields lead the ordering and keep a requested direction.
    let stmt = compile(
        "User",
        Operation::FindMany,
        json!({
            "distinct": ["name", "age"],
            "orderBy": [{ "email": "asc" }, { "age": "desc" }],
            "take": 3,
        }),
    );
    assert_eq!(
        stmt.sql,
        format!(
            r#"SELECT DISTINCT ON (t0."name", t0."age") {USER_COLUMNS} FROM "users" AS t0 ORDER BY t0."name" ASC, t0."age" DESC, t0."email" ASC LIMIT 3"#
        )
    );
}

#[test]
fn distinct_with_include() {
    let stmt = compile(
        "User",
        Operation::FindMany,
        json!({ "distinct": ["name"], "include": { "posts": true } }),
    );
    assert!(stmt.sql.starts_with(r#"SELECT DISTINCT ON (t0."name") t0."id", "#));
    assert!(stmt.sql.ends_with(r#"AS "posts" FROM "users" AS t0 ORDER BY t0."name" ASC"#));
}

#[test]
fn distinct_errors() {
    let err = compile_err("User", Operation::FindMany, json!({ "distinct": [] }));
    assert!(err.is_validation());

    let err = compile_err("User", Operation::FindMany, json!({ "distinct": "nope" }));
    assert!(err.is_schema_reference());

    let schema = blog();
    for compiler in [Compiler::sqlite(&schema), Compiler::mysql(&schema)] {
        let err = compiler
            .compile("User", Operation::FindMany, &args(json!({ "distinct": ["name"] })))
            .unwrap_err();
        assert!(err.is_unsupported_operation());
        assert_eq!(err.to_string(), "unsupported operation: distinct on fields");
    }
}

#[test]
fn include_one_to_many() {
    let stmt = compile("User", Operation::FindMany, json!({ "include": { "posts": true } }));

    assert_eq!(
        stmt.sql,
        format!(
            r#"SELECT {USER_COLUMNS}, (SELECT COALESCE(json_agg(json_build_object('id', t2."id", 'title', t2."title", 'published', t2."published", 'authorId', t2."authorId")), '[]'::json) FROM (SELECT t1."id", t1."title", t1."published", t1."authorId" FROM "posts" AS t1 WHERE t1."authorId" = t0."id") AS t2) AS "posts" FROM "users" AS t0"#
        )
    );
    assert!(stmt.params.is_empty());
}

#[test]
fn include_false_is_skipped() {
    let stmt = compile("User", Operation::FindMany, json!({ "include": { "posts": false } }));
    assert_eq!(stmt.sql, format!(r#"SELECT {USER_COLUMNS} FROM "users" AS t0"#));
}

#[test]
fn include_many_to_one_is_an_object() {
    let stmt = compile("Post", Operation::FindMany, json!({ "include": { "author": true } }));

    assert!(stmt.sql.contains(
        r#"(SELECT json_build_object('id', t2."id", 'email', t2."email", 'name', t2."name", 'age', t2."age") FROM (SELECT t1."id", t1."email", t1."name", t1."age" FROM "users" AS t1 WHERE t1."id" = t0."authorId") AS t2) AS "author""#
    ));
}

#[test]
fn include_with_arguments() {
    let stmt = compile(
        "User",
        Operation::FindMany,
        json!({
            "include": {
                "posts": {
                    "where": { "published": true },
                    "orderBy": { "title": "asc" },
                    "take": 3,
                }
            }
        }),
    );

    assert!(stmt.sql.contains(
        r#"FROM (SELECT t1."id", t1."title", t1."published", t1."authorId" FROM "posts" AS t1 WHERE (t1."published" = $1 AND t1."authorId" = t0."id") ORDER BY t1."title" ASC LIMIT 3) AS t2"#
    ));
    assert_eq!(stmt.params, [Value::from(true)]);
}

#[test]
fn include_many_to_many() {
    let stmt = compile("Post", Operation::FindMany, json!({ "include": { "tags": true } }));

    assert!(stmt.sql.contains(
        r#"(SELECT COALESCE(json_agg(json_build_object('id', t3."id", 'name', t3."name")), '[]'::json) FROM (SELECT t1."id", t1."name" FROM "tags" AS t1 WHERE EXISTS (SELECT 1 FROM "_PostToTag" AS t2 WHERE (t2."tagId" = t1."id" AND t2."postId" = t0."id"))) AS t3) AS "tags""#
    ));
}

#[test]
fn nested_includes() {
    let query = json!({ "include": { "posts": { "include": { "comments": true } } } });

    let stmt = compile("User", Operation::FindMany, query.clone());
    assert!(stmt.sql.contains(
        r#"FROM (SELECT t2."id", t2."body", t2."postId", t2."authorId" FROM "comments" AS t2 WHERE t2."postId" = t1."id") AS t3) AS "comments""#
    ));
    assert!(stmt.sql.contains(r#"'authorId', t4."authorId", 'comments', t4."comments")"#));

    // SQLite hands nested JSON back as text
    let schema = blog();
    let stmt = Compiler::sqlite(&schema)
        .compile("User", Operation::FindMany, &args(query))
        .unwrap();
    assert!(stmt.sql.contains(r#"'comments', json(t4."comments"))"#));
}

#[test]
fn select_with_relation() {
    let stmt = compile(
        "Post",
        Operation::FindMany,
        json!({ "select": { "title": true, "author": { "select": { "name": true } } } }),
    );

    assert_eq!(
        stmt.sql,
        r#"SELECT t0."title", (SELECT json_build_object('name', t2."name") FROM (SELECT t1."name" FROM "users" AS t1 WHERE t1."id" = t0."authorId") AS t2) AS "author" FROM "posts" AS t0"#
    );
}

#[test]
fn selection_errors() {
    let err = compile_err(
        "User",
        Operation::FindMany,
        json!({ "select": { "id": true }, "include": { "posts": true } }),
    );
    assert!(err.is_validation());

    let err = compile_err("User", Operation::FindMany, json!({ "select": { "id": false } }));
    assert!(err.is_validation());

    let err = compile_err("User", Operation::FindMany, json!({ "select": { "id": 1 } }));
    assert!(err.is_validation());

    let err = compile_err("User", Operation::FindMany, json!({ "include": { "name": true } }));
    assert!(err.is_validation());

    let err = compile_err("User", Operation::FindMany, json!({ "include": { "_count": true } }));
    assert!(err.is_unsupported_operation());

    let err = compile_err("User", Operation::FindMany, json!({ "include": { "nope": true } }));
    assert!(err.is_schema_reference());

    let err = compile_err("Post", Operation::FindMany, json!({ "include": { "author": { "take": 1 } } }));
    assert!(err.is_validation());

    let err = compile_err("User", Operation::FindMany, json!({ "include": { "posts": { "limit": 1 } } }));
    assert!(err.is_validation());
    assert!(err.to_string().contains("unknown include argument `limit`"));
}

#[test]
fn aggregate_projection() {
    let stmt = compile(
        "Product",
        Operation::Aggregate,
        json!({ "_count": true, "_sum": { "price": true } }),
    );
    assert_eq!(
        stmt.sql,
        r#"SELECT COUNT(*) AS "_count", SUM(t0."price") AS "_sum_price" FROM "products" AS t0"#
    );

    // Output follows `_count`, `_sum`, `_avg`, `_min`, `_max` regardless of
    // input order.
    let stmt = compile(
        "Product",
        Operation::Aggregate,
        json!({ "_max": { "price": true }, "_min": { "stock": true }, "_avg": { "price": true } }),
    );
    assert_eq!(
        stmt.sql,
        r#"SELECT AVG(t0."price") AS "_avg_price", MIN(t0."stock") AS "_min_stock", MAX(t0."price") AS "_max_price" FROM "products" AS t0"#
    );
}

#[test]
fn aggregate_with_filter() {
    let stmt = compile(
        "Product",
        Operation::Aggregate,
        json!({ "where": { "category": "books" }, "_avg": { "price": true } }),
    );
    assert_eq!(
        stmt.sql,
        r#"SELECT AVG(t0."price") AS "_avg_price" FROM "products" AS t0 WHERE t0."category" = $1"#
    );
    assert_eq!(stmt.params, [Value::from("books")]);
}

#[test]
fn count_fields() {
    let stmt = compile(
        "User",
        Operation::Aggregate,
        json!({ "_count": { "_all": true, "age": true } }),
    );
    assert_eq!(
        stmt.sql,
        r#"SELECT COUNT(*) AS "_count__all", COUNT(t0."age") AS "_count_age" FROM "users" AS t0"#
    );
}

#[test]
fn aggregate_errors() {
    let err = compile_err("Product", Operation::Aggregate, json!({}));
    assert!(err.is_validation());

    let err = compile_err("Product", Operation::Aggregate, json!({ "_sum": true }));
    assert!(err.is_validation());

    let err = compile_err("Product", Operation::Aggregate, json!({ "_sum": { "name": true } }));
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "invalid query on `Product.name`: `_sum` needs a numeric field, `name` is String"
    );

    let err = compile_err("Product", Operation::Aggregate, json!({ "_max": { "weight": true } }));
    assert!(err.is_schema_reference());
}

#[test]
fn count() {
    let stmt = compile("Product", Operation::Count, json!({}));
    assert_eq!(stmt.sql, r#"SELECT COUNT(*) AS "_count" FROM "products" AS t0"#);

    // Ordering does not change an unpaginated count.
    let stmt = compile(
        "Product",
        Operation::Count,
        json!({ "where": { "category": "books" }, "orderBy": { "price": "desc" } }),
    );
    assert_eq!(
        stmt.sql,
        r#"SELECT COUNT(*) AS "_count" FROM "products" AS t0 WHERE t0."category" = $1"#
    );
}

#[test]
fn paginated_count_uses_a_derived_table() {
    let stmt = compile(
        "Product",
        Operation::Count,
        json!({ "where": { "category": "books" }, "take": 10 }),
    );
    assert_eq!(
        stmt.sql,
        r#"SELECT COUNT(*) AS "_count" FROM (SELECT t0."id" FROM "products" AS t0 WHERE t0."category" = $1 LIMIT 10) AS t1"#
    );
    assert_eq!(stmt.params, [Value::from("books")]);
}

#[test]
fn paginated_aggregate_projects_aggregated_fields() {
    let stmt = compile(
        "Product",
        Operation::Aggregate,
        json!({ "_sum": { "price": true }, "orderBy": { "price": "desc" }, "take": 5, "skip": 10 }),
    );
    assert_eq!(
        stmt.sql,
        r#"SELECT SUM(t1."price") AS "_sum_price" FROM (SELECT t0."price" FROM "products" AS t0 ORDER BY t0."price" DESC LIMIT 5 OFFSET 10) AS t1"#
    );
}

#[test]
fn single_row_aggregates_drop_aggregate_ordering() {
    let stmt = compile(
        "Product",
        Operation::Aggregate,
        json!({ "_count": true, "orderBy": { "_count": "desc" }, "take": 5 }),
    );
    assert_eq!(
        stmt.sql,
        r#"SELECT COUNT(*) AS "_count" FROM (SELECT t0."id" FROM "products" AS t0 LIMIT 5) AS t1"#
    );

    // Still validated
    let err = compile_err(
        "Product",
        Operation::Aggregate,
        json!({ "_count": true, "orderBy": { "_sum": { "name": "asc" } } }),
    );
    assert!(err.is_validation());
}

#[test]
fn group_by_with_having_and_ordering() {
    let stmt = compile(
        "Product",
        Operation::GroupBy,
        json!({
            "by": ["category"],
            "_sum": { "price": true },
            "having": { "price": { "_sum": { "gt": 100 } } },
            "orderBy": { "_sum": { "price": "desc" } },
        }),
    );

    assert_eq!(
        stmt.sql,
        r#"SELECT t0."category", SUM(t0."price") AS "_sum_price" FROM "products" AS t0 GROUP BY t0."category" HAVING SUM(t0."price") > $1 ORDER BY SUM(t0."price") DESC"#
    );
    assert_eq!(stmt.params, [Value::from(100)]);
}

#[test]
fn group_by_several_fields() {
    let stmt = compile(
        "Product",
        Operation::GroupBy,
        json!({
            "by": ["category", "name"],
            "_count": true,
            "where": { "stock": { "gt": 0 } },
            "orderBy": [{ "category": "asc" }, { "_count": "desc" }],
            "take": 20,
        }),
    );

    assert_eq!(
        stmt.sql,
        r#"SELECT t0."category", t0."name", COUNT(*) AS "_count" FROM "products" AS t0 WHERE t0."stock" > $1 GROUP BY t0."category", t0."name" ORDER BY t0."category" ASC, COUNT(*) DESC LIMIT 20"#
    );
}

#[test]
fn having_on_grouping_fields() {
    let stmt = compile(
        "Product",
        Operation::GroupBy,
        json!({
            "by": "category",
            "having": {
                "category": { "not": "toys" },
                "OR": [{ "stock": { "_min": { "lt": 5 } } }, { "stock": { "_max": { "gte": 50 } } }],
            },
        }),
    );

    assert!(stmt.sql.ends_with(
        r#"GROUP BY t0."category" HAVING (t0."category" <> $1 AND (MIN(t0."stock") < $2 OR MAX(t0."stock") >= $3))"#
    ));
}

#[test]
fn group_by_errors() {
    let err = compile_err("Product", Operation::GroupBy, json!({ "_count": true }));
    assert!(err.is_validation());

    let err = compile_err("Product", Operation::GroupBy, json!({ "by": [] }));
    assert!(err.is_validation());

    let err = compile_err(
        "Product",
        Operation::GroupBy,
        json!({ "by": ["category"], "having": { "name": "x" } }),
    );
    assert!(err.is_validation());

    let err = compile_err(
        "Product",
        Operation::GroupBy,
        json!({ "by": ["category"], "orderBy": { "price": "asc" } }),
    );
    assert!(err.is_validation());

    let err = compile_err(
        "Product",
        Operation::GroupBy,
        json!({ "by": ["category"], "having": { "name": { "_sum": { "gt": 1 } } } }),
    );
    assert!(err.is_validation());
}

#[test]
fn arguments_foreign_to_the_operation() {
    let err = compile_err("Product", Operation::Count, json!({ "select": { "id": true } }));
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "invalid query on `Product`: `select` is not a valid argument for `count`"
    );

    let err = compile_err("Product", Operation::FindMany, json!({ "by": ["category"] }));
    assert!(err.is_validation());
}
