#![allow(dead_code)]

use plinth_core::{
    schema::{Field, Model, Relation, Type},
    QueryArgs, Schema,
};

/// A small blog: users with posts, profiles, comments and followers, posts
/// with tags through a junction table, and a product catalog for aggregates.
pub fn blog() -> Schema {
    Schema::builder()
        .model(
            Model::new("User")
                .table("users")
                .field(Field::new("id", Type::I64).id())
                .field(Field::new("email", Type::String).unique())
                .field(Field::new("name", Type::String))
                .field(Field::new("age", Type::I32).nullable())
                .relation(Relation::one_to_many("posts", "Post").fields(["id"]).references(["authorId"]))
                .relation(Relation::one_to_one("profile", "Profile").fields(["id"]).references(["userId"]))
                .relation(Relation::one_to_many("comments", "Comment").fields(["id"]).references(["authorId"]))
                .relation(
                    Relation::many_to_many("followers", "User")
                        .fields(["id"])
                        .references(["id"])
                        .through("_UserFollows", "followingId", "followerId"),
                ),
        )
        .model(
            Model::new("Post")
                .table("posts")
                .field(Field::new("id", Type::I64).id())
                .field(Field::new("title", Type::String))
                .field(Field::new("published", Type::Bool))
                .field(Field::new("authorId", Type::I64).nullable())
                .relation(Relation::many_to_one("author", "User").fields(["authorId"]).references(["id"]))
                .relation(
                    Relation::many_to_many("tags", "Tag")
                        .fields(["id"])
                        .references(["id"])
                        .through("_PostToTag", "postId", "tagId"),
                )
                .relation(Relation::one_to_many("comments", "Comment").fields(["id"]).references(["postId"])),
        )
        .model(
            Model::new("Profile")
                .table("profiles")
                .field(Field::new("id", Type::I64).id())
                .field(Field::new("bio", Type::String))
                .field(Field::new("userId", Type::I64).unique())
                .relation(Relation::one_to_one("user", "User").fields(["userId"]).references(["id"])),
        )
        .model(
            Model::new("Tag")
                .table("tags")
                .field(Field::new("id", Type::I64).id())
                .field(Field::new("name", Type::String).unique())
                .relation(
                    Relation::many_to_many("posts", "Post")
                        .fields(["id"])
                        .references(["id"])
                        .through("_PostToTag", "tagId", "postId"),
                ),
        )
        .model(
            Model::new("Comment")
                .table("comments")
                .field(Field::new("id", Type::I64).id())
                .field(Field::new("body", Type::String))
                .field(Field::new("postId", Type::I64))
                .field(Field::new("authorId", Type::I64))
                .relation(Relation::many_to_one("post", "Post").fields(["postId"]).references(["id"]))
                .relation(Relation::many_to_one("author", "User").fields(["authorId"]).references(["id"])),
        )
        .model(
            Model::new("Product")
                .table("products")
                .field(Field::new("id", Type::I64).id())
                .field(Field::new("name", Type::String))
                .field(Field::new("category", Type::String))
                .field(Field::new("price", Type::F64))
                .field(Field::new("stock", Type::I32))
                .field(Field::new("attributes", Type::Json).nullable()),
        )
        .build()
        .unwrap()
}

/// Scalar projection of `User` as `t0`.
pub const USER_COLUMNS: &str = r#"t0."id", t0."email", t0."name", t0."age""#;

/// Scalar projection of `Post` as `t0`.
pub const POST_COLUMNS: &str = r#"t0."id", t0."title", t0."published", t0."authorId""#;

pub fn args(json: serde_json::Value) -> QueryArgs {
    QueryArgs::from_json(json).unwrap()
}

/// Routes compiler logs to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .try_init();
}
