//! The query compiler.
//!
//! A [`Compiler`] pairs a schema with a dialect and a [`Config`]. It holds no
//! per-call state: every call to [`Compiler::compile`] runs its own
//! compilation with its own alias generator, so one compiler can be shared
//! by any number of threads.

mod mutation;
mod read;

use crate::{
    clause::{Compilation, Scope},
    Config, DialectKind, Dialect, Fragment,
};
use plinth_core::{
    query::{Json, Object, OrderByArg},
    Error, Operation, QueryArgs, Result, Schema, Value,
};

/// Compiles structured queries against a schema.
#[derive(Debug)]
pub struct Compiler<'a> {
    /// Schema against which queries are compiled
    schema: &'a Schema,

    /// Supplies every piece of SQL syntax
    dialect: Box<dyn Dialect>,

    config: Config,
}

#[derive(Debug)]
pub struct Builder<'a> {
    schema: &'a Schema,
    config: Config,
    dialect: Option<Box<dyn Dialect>>,
}

/// A compiled statement: SQL text and the values bound to its placeholders,
/// in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl<'a> Compiler<'a> {
    pub fn builder(schema: &'a Schema) -> Builder<'a> {
        Builder {
            schema,
            config: Config::default(),
            dialect: None,
        }
    }

    pub fn from_config(schema: &'a Schema, config: Config) -> Compiler<'a> {
        Compiler {
            schema,
            dialect: config.dialect.dialect(),
            config,
        }
    }

    /// Creates a compiler emitting PostgreSQL.
    pub fn postgresql(schema: &'a Schema) -> Compiler<'a> {
        Compiler::builder(schema).dialect(DialectKind::Postgresql).build()
    }

    /// Creates a compiler emitting SQLite.
    pub fn sqlite(schema: &'a Schema) -> Compiler<'a> {
        Compiler::builder(schema).dialect(DialectKind::Sqlite).build()
    }

    /// Creates a compiler emitting MySQL.
    pub fn mysql(schema: &'a Schema) -> Compiler<'a> {
        Compiler::builder(schema).dialect(DialectKind::Mysql).build()
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiles one operation on `model` into a parameterized statement.
    pub fn compile(&self, model: &str, operation: Operation, args: &QueryArgs) -> Result<Statement> {
        let span = tracing::debug_span!("compile", model, %operation);
        let _enter = span.enter();

        let model = self.schema.model(model)?;
        check_args(&model.name, operation, args)?;

        let mut compilation = self.compilation();
        let cx = compilation.root(model, operation, args)?;

        let fragment = match operation {
            Operation::FindMany | Operation::FindFirst | Operation::FindUnique => compilation.find(&cx, args)?,
            Operation::Count | Operation::Aggregate => compilation.aggregate_query(&cx, args)?,
            Operation::GroupBy => compilation.group_by(&cx, args)?,
            Operation::Create => compilation.create(&cx)?,
            Operation::Update => compilation.update(&cx, args)?,
            Operation::Delete => compilation.delete(&cx, args)?,
        };

        let statement = self.render(&fragment);

        tracing::debug!(
            aliases = compilation.aliases.len(),
            sql_len = statement.sql.len(),
            params = statement.params.len(),
            "compiled statement"
        );

        Ok(statement)
    }

    /// Deserializes the arguments from JSON, then compiles them.
    pub fn compile_json(&self, model: &str, operation: Operation, args: Json) -> Result<Statement> {
        let args = QueryArgs::from_json(args)?;
        self.compile(model, operation, &args)
    }

    /// Compiles a filter tree alone, against `model` aliased as `t0`.
    /// Returns `None` for an empty tree.
    pub fn compile_where(&self, model: &str, filter: &Object) -> Result<Option<Fragment>> {
        let model = self.schema.model(model)?;
        let args = QueryArgs::default();

        let mut compilation = self.compilation();
        let cx = compilation.root(model, Operation::FindMany, &args)?;
        compilation.filter(&cx, filter, Scope::Public)
    }

    /// Compiles the SELECT list of an operation.
    pub fn compile_select(&self, model: &str, operation: Operation, args: &QueryArgs) -> Result<Fragment> {
        let model = self.schema.model(model)?;

        let mut compilation = self.compilation();
        let cx = compilation.root(model, operation, args)?;
        let projections = compilation.select(&cx, args)?;
        Ok(crate::clause::Projection::list(&projections))
    }

    /// Compiles an ORDER BY clause. `None` if it orders on nothing.
    pub fn compile_order_by(&self, model: &str, operation: Operation, order_by: &OrderByArg) -> Result<Option<Fragment>> {
        let model = self.schema.model(model)?;
        let args = QueryArgs::default();

        let mut compilation = self.compilation();
        let cx = compilation.root(model, operation, &args)?;
        compilation.order_by(&cx, Some(order_by), None)
    }

    /// Compiles a LIMIT/OFFSET clause. `None` if neither is given.
    pub fn compile_limit(&self, model: &str, take: Option<u64>, skip: Option<u64>) -> Result<Option<Fragment>> {
        let model = self.schema.model(model)?;
        let args = QueryArgs {
            take,
            skip,
            ..QueryArgs::default()
        };

        let mut compilation = self.compilation();
        let cx = compilation.root(model, Operation::FindMany, &args)?;
        Ok(compilation.limit(&cx, take, skip))
    }

    /// Renders a fragment with this compiler's placeholder syntax.
    pub fn render(&self, fragment: &Fragment) -> Statement {
        let mut params: Vec<Value> = vec![];
        let sql = fragment.serialize(&*self.dialect, &mut params);
        Statement { sql, params }
    }

    fn compilation(&self) -> Compilation<'_> {
        Compilation::new(self.schema, &*self.dialect, &self.config)
    }
}

impl<'a> Builder<'a> {
    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.config.dialect = dialect;
        self.dialect = None;
        self
    }

    /// Uses a dialect other than the built-in ones.
    pub fn custom_dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Some(Box::new(dialect));
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn order_tiebreaker(mut self, enabled: bool) -> Self {
        self.config.order_tiebreaker = enabled;
        self
    }

    pub fn build(self) -> Compiler<'a> {
        let dialect = self.dialect.unwrap_or_else(|| self.config.dialect.dialect());
        Compiler {
            schema: self.schema,
            dialect,
            config: self.config,
        }
    }
}

impl core::fmt::Display for Statement {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Rejects arguments the operation has no use for, rather than silently
/// ignoring them.
fn check_args(model: &str, operation: Operation, args: &QueryArgs) -> Result<()> {
    const READ: &[&str] = &["where", "select", "include", "orderBy", "take", "skip", "cursor", "distinct"];
    const COUNT: &[&str] = &["where", "orderBy", "take", "skip", "cursor", "_count"];
    const AGGREGATE: &[&str] = &[
        "where", "orderBy", "take", "skip", "cursor", "_count", "_sum", "_avg", "_min", "_max",
    ];
    const GROUP_BY: &[&str] = &[
        "where", "by", "having", "orderBy", "take", "skip", "_count", "_sum", "_avg", "_min", "_max",
    ];

    let allowed = match operation {
        Operation::FindMany | Operation::FindFirst | Operation::FindUnique => READ,
        Operation::Count => COUNT,
        Operation::Aggregate => AGGREGATE,
        Operation::GroupBy => GROUP_BY,
        Operation::Create => &["data"],
        Operation::Update => &["where", "data"],
        Operation::Delete => &["where"],
    };

    match args.present_keys().into_iter().find(|key| !allowed.contains(key)) {
        Some(key) => Err(Error::validation_on(
            model,
            None,
            format!("`{key}` is not a valid argument for `{operation}`"),
        )),
        None => Ok(()),
    }
}
