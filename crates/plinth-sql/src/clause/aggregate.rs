use super::{flag, json_kind, Compilation};
use crate::{dialect, Context, Fragment};
use plinth_core::{
    query::{AggregateKind, Fields, Json, QueryArgs},
    schema::Field,
    Error, Result,
};

/// One entry of a SELECT list.
#[derive(Debug, Clone)]
pub(crate) struct Projection {
    /// The expression, already aliased when its name differs from the
    /// column it reads
    pub(crate) expr: Fragment,

    /// Name the result column is found under
    pub(crate) name: String,

    /// True if the column holds JSON (an included relation)
    pub(crate) json: bool,
}

impl Projection {
    /// Comma-joins a SELECT list.
    pub(crate) fn list(projections: &[Projection]) -> Fragment {
        Fragment::join(projections.iter().map(|projection| projection.expr.clone()), ", ")
    }
}

impl<'a> Compilation<'a> {
    /// Projections for every aggregate payload present in `args`, in
    /// `_count`, `_sum`, `_avg`, `_min`, `_max` order.
    pub(crate) fn aggregates(&self, cx: &Context<'a>, args: &QueryArgs) -> Result<Vec<Projection>> {
        let mut projections = vec![];

        for kind in AggregateKind::ALL {
            if let Some(value) = args.aggregate(kind) {
                projections.extend(self.aggregate(cx, kind, value)?);
            }
        }

        Ok(projections)
    }

    /// The projection of a `count` operation: `COUNT(*)` unless specific
    /// fields are requested.
    pub(crate) fn count_projection(&self, cx: &Context<'a>, count: Option<&Json>) -> Result<Vec<Projection>> {
        let projections = match count {
            None => self.aggregate(cx, AggregateKind::Count, &Json::Bool(true))?,
            Some(value) => self.aggregate(cx, AggregateKind::Count, value)?,
        };

        if projections.is_empty() {
            return Err(Error::validation_on(&cx.model.name, None, "count selects nothing"));
        }

        Ok(projections)
    }

    fn aggregate(&self, cx: &Context<'a>, kind: AggregateKind, value: &Json) -> Result<Vec<Projection>> {
        match value {
            Json::Bool(true) if kind.supports_global() => Ok(vec![self.global(cx, kind, kind.key())]),
            Json::Bool(true) => Err(Error::validation_on(
                &cx.model.name,
                None,
                format!("`{kind}` needs an object of fields; only `_count` accepts `true`"),
            )),
            Json::Bool(false) => Ok(vec![]),
            Json::Object(fields) => {
                let mut projections = vec![];

                for (name, value) in fields {
                    if !flag(cx, name, value)? {
                        continue;
                    }

                    let alias = format!("{}_{name}", kind.key());

                    if name == "_all" && kind.supports_global() {
                        projections.push(self.global(cx, kind, &alias));
                        continue;
                    }

                    let field = self.aggregate_field(cx, kind, name)?;
                    let expr = self.aggregate_expr(cx, kind, field);

                    projections.push(Projection {
                        expr: self.dialect.aliased(expr, &alias),
                        name: alias,
                        json: false,
                    });
                }

                Ok(projections)
            }
            _ => Err(Error::validation_on(
                &cx.model.name,
                None,
                format!("`{kind}` expects `true` or an object of fields, got {}", json_kind(value)),
            )),
        }
    }

    fn global(&self, cx: &Context<'a>, kind: AggregateKind, alias: &str) -> Projection {
        let expr = dialect::aggregate(self.dialect, cx, kind, None);
        Projection {
            expr: self.dialect.aliased(expr, alias),
            name: alias.to_string(),
            json: false,
        }
    }

    /// Looks up the field an aggregate applies to, checking it can be
    /// aggregated that way.
    pub(crate) fn aggregate_field(&self, cx: &Context<'a>, kind: AggregateKind, name: &str) -> Result<&'a Field> {
        let field = cx.model.expect_field(name)?;

        if kind.requires_numeric() && !field.ty.is_summable() {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(name),
                format!("`{kind}` needs a numeric field, `{name}` is {}", field.ty),
            ));
        }

        Ok(field)
    }

    /// `SUM(t0."price")` and friends.
    pub(crate) fn aggregate_expr(&self, cx: &Context<'a>, kind: AggregateKind, field: &Field) -> Fragment {
        let column = self.dialect.column(cx.alias, &field.name);
        dialect::aggregate(self.dialect, cx, kind, Some(column))
    }

    /// Fields read by the aggregate payloads of `args`, in first-use order.
    /// A derived table feeding the aggregates has to project them.
    pub(crate) fn aggregated_fields(&self, cx: &Context<'a>, args: &QueryArgs) -> Result<Vec<&'a Field>> {
        let mut fields: Vec<&'a Field> = vec![];

        for kind in AggregateKind::ALL {
            let Some(Json::Object(payload)) = args.aggregate(kind) else {
                continue;
            };

            for name in payload.keys() {
                if name == "_all" {
                    continue;
                }

                let field = cx.model.expect_field(name)?;
                if !fields.iter().any(|f| f.name == field.name) {
                    fields.push(field);
                }
            }
        }

        Ok(fields)
    }

    /// Resolves the `by` fields of a `groupBy`.
    pub(crate) fn grouping(&self, cx: &Context<'a>, by: Option<&Fields>) -> Result<Vec<&'a Field>> {
        let names = by.map(Fields::names).unwrap_or_default();

        if names.is_empty() {
            return Err(Error::validation_on(
                &cx.model.name,
                None,
                "`groupBy` needs at least one field in `by`",
            ));
        }

        names.iter().map(|name| cx.model.expect_field(name)).collect()
    }
}
