//! Clause compilers.
//!
//! Every clause compiler is an `impl` block on [`Compilation`], the state of
//! one top-level compile call. The compilers read the schema, ask the dialect
//! for every piece of SQL syntax and return [`Fragment`]s; none of them
//! assembles a full statement.

mod aggregate;
pub(crate) use aggregate::Projection;

mod cursor;

mod field_filter;

mod filter;
pub(crate) use filter::Scope;

mod having;

mod include;

mod limit;

mod order_by;

mod relation;

mod select;

use crate::{context::Pagination, Aliases, Config, Context, Dialect, Fragment};
use plinth_core::{
    query::{Fields, Json, Object, QueryArgs},
    schema::{Model, Relation},
    Error, Operation, Result, Schema, Value,
};

/// State of one top-level compilation.
///
/// The alias generator lives here rather than on the compiler, so every call
/// starts from `t0` and concurrent calls never share a counter.
pub(crate) struct Compilation<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) dialect: &'a dyn Dialect,
    pub(crate) config: &'a Config,
    pub(crate) aliases: Aliases,
}

impl<'a> Compilation<'a> {
    pub(crate) fn new(schema: &'a Schema, dialect: &'a dyn Dialect, config: &'a Config) -> Compilation<'a> {
        Compilation {
            schema,
            dialect,
            config,
            aliases: Aliases::new(),
        }
    }

    /// Allocates the root alias and builds the root context of a query,
    /// carrying the pagination of reads and the payload of mutations.
    pub(crate) fn root(&mut self, model: &'a Model, operation: Operation, args: &'a QueryArgs) -> Result<Context<'a>> {
        let alias = self.aliases.next();
        let builder = Context::builder(model, operation, alias);

        let builder = if operation.is_mutation() {
            match &args.data {
                Some(data) => builder.mutation(data),
                None => builder,
            }
        } else {
            builder.pagination(Pagination {
                take: args.take,
                skip: args.skip,
                cursor: args.cursor.as_ref(),
                distinct: args.distinct.as_ref().map(Fields::names),
            })
        };

        builder.build()
    }

    /// Derives the context of a subquery over the target of `relation`,
    /// enforcing the configured nesting limit.
    pub(crate) fn descend(&mut self, cx: &Context<'a>, relation: &'a Relation) -> Result<Context<'a>> {
        let target = relation.target(self.schema)?;

        if cx.depth >= self.config.max_depth {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(&relation.name),
                format!(
                    "relation nesting exceeds the maximum depth of {} (path: {} > {})",
                    self.config.max_depth,
                    cx.path_display(),
                    target.name
                ),
            ));
        }

        let alias = self.aliases.next();
        let child = cx.nested(relation, target, alias);

        tracing::trace!(
            relation = %relation.name,
            depth = child.depth,
            path = %child.path_display(),
            "descending into relation"
        );

        Ok(child)
    }

    /// ANDs operands through the dialect; `None` when there are none.
    pub(crate) fn conjunction(&self, cx: &Context<'_>, operands: Vec<Fragment>) -> Option<Fragment> {
        if operands.is_empty() {
            None
        } else {
            Some(self.dialect.and(cx, operands))
        }
    }
}

/// The clauses of one SELECT statement, assembled in SQL order.
#[derive(Debug, Default)]
pub(crate) struct Select {
    pub(crate) projection: Fragment,
    pub(crate) distinct: Option<Fragment>,
    pub(crate) source: Fragment,
    pub(crate) filter: Option<Fragment>,
    pub(crate) group_by: Option<Fragment>,
    pub(crate) having: Option<Fragment>,
    pub(crate) order_by: Option<Fragment>,
    pub(crate) limit: Option<Fragment>,
}

impl Compilation<'_> {
    pub(crate) fn assemble(&self, cx: &Context<'_>, select: Select) -> Fragment {
        let mut parts = vec![
            self.dialect.select(cx, select.projection, select.distinct),
            self.dialect.from(cx, select.source),
        ];

        parts.extend(select.filter.map(|filter| self.dialect.where_clause(cx, filter)));
        parts.extend(select.group_by);
        parts.extend(select.having.map(|having| self.dialect.having(cx, having)));
        parts.extend(select.order_by);
        parts.extend(select.limit);

        Fragment::join(parts, " ")
    }
}

/// Converts a JSON scalar to a bound value.
pub(crate) fn scalar(cx: &Context<'_>, field: &str, value: &Json) -> Result<Value> {
    Value::from_json(value).ok_or_else(|| {
        Error::validation_on(
            &cx.model.name,
            Some(field),
            format!("expected a scalar value, got {}", json_kind(value)),
        )
    })
}

/// Reads a `true`/`false` selection flag.
pub(crate) fn flag(cx: &Context<'_>, key: &str, value: &Json) -> Result<bool> {
    match value {
        Json::Bool(flag) => Ok(*flag),
        _ => Err(Error::validation_on(
            &cx.model.name,
            Some(key),
            format!("expected `true` or `false`, got {}", json_kind(value)),
        )),
    }
}

/// Reads a JSON object argument.
pub(crate) fn object<'v>(cx: &Context<'_>, key: &str, value: &'v Json) -> Result<&'v Object> {
    value.as_object().ok_or_else(|| {
        Error::validation_on(
            &cx.model.name,
            Some(key),
            format!("expected an object, got {}", json_kind(value)),
        )
    })
}

pub(crate) fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
