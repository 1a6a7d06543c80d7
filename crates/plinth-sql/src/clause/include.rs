use super::{
    filter::{JUNCTION, PARENT},
    json_kind, object, Compilation, Projection, Scope, Select,
};
use crate::{
    context::{Extension, Pagination},
    dialect::JsonColumn,
    Context,
};
use plinth_core::{
    query::{Json, Object, OrderByArg},
    schema::{Cardinality, Relation},
    Error, Result,
};

/// Arguments of one included relation.
#[derive(Debug, Default)]
struct Include<'v> {
    select: Option<&'v Object>,
    include: Option<&'v Object>,
    filter: Option<&'v Object>,
    order_by: Option<OrderByArg>,
    take: Option<u64>,
    skip: Option<u64>,
}

impl<'a> Compilation<'a> {
    /// Projects a relation as a correlated subquery aggregated to JSON:
    /// an array for to-many relations, an object (or null) for to-one.
    pub(crate) fn include(&mut self, cx: &Context<'a>, relation: &'a Relation, value: &Json) -> Result<Option<Projection>> {
        let include = match value {
            Json::Bool(false) => return Ok(None),
            Json::Bool(true) => Include::default(),
            Json::Object(args) => Include::parse(cx, relation, args)?,
            _ => {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(&relation.name),
                    format!("expected `true`, `false` or an object, got {}", json_kind(value)),
                ))
            }
        };

        if relation.cardinality.is_to_one() && (include.take.is_some() || include.skip.is_some()) {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(&relation.name),
                "`take` and `skip` only apply to to-many relations",
            ));
        }

        let mut child = self.descend(cx, relation)?;
        child.extension = Extension::Pagination(Pagination {
            take: include.take,
            skip: include.skip,
            ..Pagination::default()
        });

        let columns = self.records(&child, include.select, include.include)?;

        let mut filter = Object::new();
        if let Some(nested) = include.filter {
            filter.insert("AND".to_string(), Json::Object(nested.clone()));
        }
        match relation.cardinality {
            Cardinality::ManyToMany => {
                filter.insert(JUNCTION.to_string(), Json::Bool(true));
            }
            _ => {
                // child column -> parent column
                let pairs = relation
                    .link_pairs()
                    .map(|(local, referenced)| (referenced.to_string(), Json::from(local)))
                    .collect();
                filter.insert(PARENT.to_string(), Json::Object(pairs));
            }
        }

        let predicate = self.filter(&child, &filter, Scope::Internal)?;
        let order_by = self.order_by(&child, include.order_by.as_ref(), None)?;
        let limit = self.limit(&child, include.take, include.skip);

        let subquery = self.assemble(
            &child,
            Select {
                projection: Projection::list(&columns),
                source: self.dialect.table(child.model.table_name(), child.alias),
                filter: predicate,
                order_by,
                limit,
                ..Select::default()
            },
        );

        let json_columns: Vec<_> = columns
            .iter()
            .map(|column| JsonColumn {
                name: column.name.clone(),
                json: column.json,
            })
            .collect();

        let alias = self.aliases.next();
        let expr = if relation.cardinality.is_to_many() {
            self.dialect.json_array_agg(&child, subquery, alias, &json_columns)
        } else {
            self.dialect.json_row(&child, subquery, alias, &json_columns)
        };

        tracing::trace!(
            relation = %relation.name,
            depth = child.depth,
            "compiled relation inclusion"
        );

        Ok(Some(Projection {
            expr: self.dialect.aliased(expr, &relation.name),
            name: relation.name.clone(),
            json: true,
        }))
    }
}

impl<'v> Include<'v> {
    fn parse(cx: &Context<'_>, relation: &Relation, args: &'v Object) -> Result<Include<'v>> {
        let mut include = Include::default();

        for (key, value) in args {
            match key.as_str() {
                "select" => include.select = Some(object(cx, key, value)?),
                "include" => include.include = Some(object(cx, key, value)?),
                "where" => include.filter = Some(object(cx, key, value)?),
                "orderBy" => {
                    include.order_by = Some(serde_json::from_value(value.clone()).map_err(|_| {
                        Error::validation_on(
                            &cx.model.name,
                            Some(&relation.name),
                            "`orderBy` expects an object or an array of objects",
                        )
                    })?)
                }
                "take" => include.take = Some(count(cx, relation, key, value)?),
                "skip" => include.skip = Some(count(cx, relation, key, value)?),
                _ => {
                    return Err(Error::validation_on(
                        &cx.model.name,
                        Some(&relation.name),
                        format!("unknown include argument `{key}`"),
                    ))
                }
            }
        }

        Ok(include)
    }
}

fn count(cx: &Context<'_>, relation: &Relation, key: &str, value: &Json) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        Error::validation_on(
            &cx.model.name,
            Some(&relation.name),
            format!("`{key}` expects a non-negative integer, got {}", json_kind(value)),
        )
    })
}
