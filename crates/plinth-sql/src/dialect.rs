//! The dialect adapter.
//!
//! Every primitive SQL fragment the compiler emits comes from a [`Dialect`]:
//! identifier quoting, operators, EXISTS wrapping, aggregate functions, JSON
//! aggregation and statement skeletons. The clause compilers never write
//! dialect syntax themselves. The provided methods emit ANSI SQL; each
//! database overrides what it spells differently.

mod mysql;
pub use mysql::Mysql;

mod postgresql;
pub use postgresql::Postgresql;

mod sqlite;
pub use sqlite::Sqlite;

use crate::{Alias, Context, Fragment, Placeholder};
use plinth_core::{query::AggregateKind, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

/// A column of a derived table that is folded into a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonColumn {
    pub name: String,

    /// True if the column already holds JSON (a nested relation)
    pub json: bool,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

pub trait Dialect: Send + Sync + core::fmt::Debug {
    /// Short lowercase name, e.g. `postgresql`.
    fn name(&self) -> &'static str;

    // ===== identifiers =====

    /// Quotes an identifier.
    fn quote(&self, ident: &str) -> String;

    /// Placeholder syntax for a bound value.
    fn placeholder(&self, placeholder: Placeholder) -> String;

    /// `t0."column"`
    fn column(&self, alias: Alias, column: &str) -> Fragment {
        sql!(alias "." (self.quote(column)))
    }

    /// `"table" AS t0`
    fn table(&self, name: &str, alias: Alias) -> Fragment {
        sql!((self.quote(name)) " AS " alias)
    }

    /// `expr AS "name"`
    fn aliased(&self, expr: Fragment, name: &str) -> Fragment {
        sql!(expr " AS " (self.quote(name)))
    }

    /// A string literal for schema-defined text such as JSON keys. Never
    /// used for values coming from a query.
    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    // ===== operators =====

    fn and(&self, _cx: &Context<'_>, operands: Vec<Fragment>) -> Fragment {
        combine(operands, " AND ")
    }

    fn or(&self, _cx: &Context<'_>, operands: Vec<Fragment>) -> Fragment {
        combine(operands, " OR ")
    }

    fn not(&self, _cx: &Context<'_>, operand: Fragment) -> Fragment {
        sql!("NOT (" operand ")")
    }

    fn eq(&self, cx: &Context<'_>, lhs: Fragment, rhs: Fragment) -> Fragment {
        self.compare(cx, lhs, BinaryOp::Eq, rhs)
    }

    fn compare(&self, _cx: &Context<'_>, lhs: Fragment, op: BinaryOp, rhs: Fragment) -> Fragment {
        sql!(lhs " " (op.as_str()) " " rhs)
    }

    fn is_null(&self, _cx: &Context<'_>, expr: Fragment) -> Fragment {
        sql!(expr " IS NULL")
    }

    fn is_not_null(&self, _cx: &Context<'_>, expr: Fragment) -> Fragment {
        sql!(expr " IS NOT NULL")
    }

    fn in_list(&self, _cx: &Context<'_>, expr: Fragment, items: Vec<Fragment>, negate: bool) -> Fragment {
        let op = if negate { " NOT IN (" } else { " IN (" };
        sql!(expr op (Fragment::join(items, ", ")) ")")
    }

    /// `expr LIKE pattern`, where `pattern` escapes wildcards with a
    /// backslash.
    fn like(&self, _cx: &Context<'_>, expr: Fragment, pattern: Fragment) -> Fragment {
        sql!(expr " LIKE " pattern)
    }

    fn literal_true(&self, _cx: &Context<'_>) -> Fragment {
        Fragment::sql("TRUE")
    }

    fn literal_false(&self, _cx: &Context<'_>) -> Fragment {
        Fragment::sql("FALSE")
    }

    // ===== aggregates =====

    /// `COUNT(*)` when no column is given.
    fn count(&self, _cx: &Context<'_>, column: Option<Fragment>) -> Fragment {
        match column {
            Some(column) => sql!("COUNT(" column ")"),
            None => Fragment::sql("COUNT(*)"),
        }
    }

    fn sum(&self, _cx: &Context<'_>, column: Fragment) -> Fragment {
        sql!("SUM(" column ")")
    }

    fn avg(&self, _cx: &Context<'_>, column: Fragment) -> Fragment {
        sql!("AVG(" column ")")
    }

    fn min(&self, _cx: &Context<'_>, column: Fragment) -> Fragment {
        sql!("MIN(" column ")")
    }

    fn max(&self, _cx: &Context<'_>, column: Fragment) -> Fragment {
        sql!("MAX(" column ")")
    }

    // ===== relation filters =====

    /// At least one related record matches.
    fn relation_some(&self, cx: &Context<'_>, subquery: Fragment) -> Fragment {
        self.exists(cx, subquery)
    }

    /// Every related record matches. `subquery` selects the related records
    /// that do *not* match.
    fn relation_every(&self, cx: &Context<'_>, subquery: Fragment) -> Fragment {
        self.not_exists(cx, subquery)
    }

    /// No related record matches.
    fn relation_none(&self, cx: &Context<'_>, subquery: Fragment) -> Fragment {
        self.not_exists(cx, subquery)
    }

    /// The (single) related record matches.
    fn relation_direct(&self, cx: &Context<'_>, subquery: Fragment) -> Fragment {
        self.exists(cx, subquery)
    }

    // ===== utils =====

    fn exists(&self, _cx: &Context<'_>, subquery: Fragment) -> Fragment {
        sql!("EXISTS (" subquery ")")
    }

    fn not_exists(&self, _cx: &Context<'_>, subquery: Fragment) -> Fragment {
        sql!("NOT EXISTS (" subquery ")")
    }

    /// Folds case for a case-insensitive comparison. `cx.field` is the field
    /// being compared.
    fn case_insensitive(&self, _cx: &Context<'_>, expr: Fragment) -> Fragment {
        sql!("LOWER(" expr ")")
    }

    // ===== builders =====

    /// `distinct` is the prefix built by [`Dialect::distinct_on`].
    fn select(&self, _cx: &Context<'_>, projection: Fragment, distinct: Option<Fragment>) -> Fragment {
        sql!("SELECT " (distinct.unwrap_or_default()) projection)
    }

    /// Keeps the first row of every distinct combination of `columns`. The
    /// statement's ordering starts with the same columns.
    fn distinct_on(&self, _cx: &Context<'_>, _columns: Vec<Fragment>) -> Result<Fragment> {
        Err(Error::unsupported_operation("distinct on fields"))
    }

    fn from(&self, _cx: &Context<'_>, source: Fragment) -> Fragment {
        sql!("FROM " source)
    }

    fn where_clause(&self, _cx: &Context<'_>, predicate: Fragment) -> Fragment {
        sql!("WHERE " predicate)
    }

    /// `(subquery) AS t1`
    fn derived_table(&self, _cx: &Context<'_>, subquery: Fragment, alias: Alias) -> Fragment {
        sql!("(" subquery ") AS " alias)
    }

    /// Counts the rows of a derived table: `SELECT <projection> FROM
    /// (subquery) AS t1`.
    fn count_rows(&self, cx: &Context<'_>, projection: Fragment, subquery: Fragment, alias: Alias) -> Fragment {
        let source = self.derived_table(cx, subquery, alias);
        sql!((self.select(cx, projection, None)) " " (self.from(cx, source)))
    }

    fn group_by(&self, _cx: &Context<'_>, columns: Vec<Fragment>) -> Fragment {
        sql!("GROUP BY " (Fragment::join(columns, ", ")))
    }

    fn having(&self, _cx: &Context<'_>, predicate: Fragment) -> Fragment {
        sql!("HAVING " predicate)
    }

    fn order_by(&self, _cx: &Context<'_>, items: Vec<Fragment>) -> Fragment {
        sql!("ORDER BY " (Fragment::join(items, ", ")))
    }

    fn order_by_item(
        &self,
        _cx: &Context<'_>,
        expr: Fragment,
        direction: Direction,
        nulls: Option<Nulls>,
    ) -> Result<Fragment> {
        let nulls = match nulls {
            Some(Nulls::First) => " NULLS FIRST",
            Some(Nulls::Last) => " NULLS LAST",
            None => "",
        };
        Ok(sql!(expr " " (direction.as_str()) nulls))
    }

    /// `LIMIT <take> OFFSET <skip>`, omitting whichever is absent.
    fn limit_offset(&self, _cx: &Context<'_>, take: Option<u64>, skip: Option<u64>) -> Option<Fragment> {
        match (take, skip) {
            (None, None) => None,
            (Some(take), None) => Some(sql!("LIMIT " take)),
            (None, Some(skip)) => Some(sql!("OFFSET " skip)),
            (Some(take), Some(skip)) => Some(sql!("LIMIT " take " OFFSET " skip)),
        }
    }

    fn insert(&self, _cx: &Context<'_>, table: &str, columns: Vec<&str>, values: Vec<Fragment>) -> Fragment {
        if columns.is_empty() {
            return sql!("INSERT INTO " (self.quote(table)) " DEFAULT VALUES");
        }

        let columns = Fragment::join(columns.into_iter().map(|c| Fragment::sql(self.quote(c))), ", ");
        let values = Fragment::join(values, ", ");
        sql!("INSERT INTO " (self.quote(table)) " (" columns ") VALUES (" values ")")
    }

    fn update(&self, _cx: &Context<'_>, table: &str, alias: Alias, assignments: Vec<(&str, Fragment)>) -> Fragment {
        let assignments = Fragment::join(
            assignments
                .into_iter()
                .map(|(column, value)| sql!((self.quote(column)) " = " value)),
            ", ",
        );
        sql!("UPDATE " (self.table(table, alias)) " SET " assignments)
    }

    fn delete(&self, _cx: &Context<'_>, table: &str, alias: Alias) -> Fragment {
        sql!("DELETE FROM " (self.table(table, alias)))
    }

    // ===== JSON =====

    /// Aggregates the rows of `subquery` into a JSON array (empty, never
    /// null, when there are no rows).
    fn json_array_agg(&self, cx: &Context<'_>, subquery: Fragment, alias: Alias, columns: &[JsonColumn]) -> Fragment;

    /// Folds the single row of `subquery` into a JSON object (null when
    /// there is no row).
    fn json_row(&self, cx: &Context<'_>, subquery: Fragment, alias: Alias, columns: &[JsonColumn]) -> Fragment;
}

/// Applies one of the dialect's aggregate functions.
pub fn aggregate(dialect: &dyn Dialect, cx: &Context<'_>, kind: AggregateKind, column: Option<Fragment>) -> Fragment {
    match (kind, column) {
        (AggregateKind::Count, column) => dialect.count(cx, column),
        (_, None) => dialect.count(cx, None),
        (AggregateKind::Sum, Some(column)) => dialect.sum(cx, column),
        (AggregateKind::Avg, Some(column)) => dialect.avg(cx, column),
        (AggregateKind::Min, Some(column)) => dialect.min(cx, column),
        (AggregateKind::Max, Some(column)) => dialect.max(cx, column),
    }
}

/// Joins boolean operands, parenthesizing the result so it composes under
/// any enclosing operator.
fn combine(mut operands: Vec<Fragment>, op: &str) -> Fragment {
    if operands.len() == 1 {
        return operands.remove(0);
    }
    Fragment::join(operands, op).parenthesized()
}

/// JSON object key/value pairs over a derived table's columns, shared by the
/// dialects spelling them `'key', t2."key"`.
fn json_pairs(dialect: &dyn Dialect, alias: Alias, columns: &[JsonColumn], wrap_json: impl Fn(Fragment) -> Fragment) -> Fragment {
    Fragment::join(
        columns.iter().map(|column| {
            let value = dialect.column(alias, &column.name);
            let value = if column.json { wrap_json(value) } else { value };
            sql!((dialect.string_literal(&column.name)) ", " value)
        }),
        ", ",
    )
}
