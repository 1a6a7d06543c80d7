use super::{flag, Compilation, Projection};
use crate::Context;
use plinth_core::{
    query::{Object, QueryArgs},
    schema::Field,
    Error, Operation, Result,
};

impl<'a> Compilation<'a> {
    /// Compiles the SELECT list of the context's operation.
    pub(crate) fn select(&mut self, cx: &Context<'a>, args: &QueryArgs) -> Result<Vec<Projection>> {
        let projections = match cx.operation {
            Operation::Count => self.count_projection(cx, args.count.as_ref())?,
            Operation::Aggregate => {
                let projections = self.aggregates(cx, args)?;
                if projections.is_empty() {
                    return Err(Error::validation_on(
                        &cx.model.name,
                        None,
                        "`aggregate` needs at least one of `_count`, `_sum`, `_avg`, `_min` or `_max`",
                    ));
                }
                projections
            }
            Operation::GroupBy => {
                let mut projections: Vec<_> = self
                    .grouping(cx, args.by.as_ref())?
                    .into_iter()
                    .map(|field| self.column(cx, &field.name))
                    .collect();
                projections.extend(self.aggregates(cx, args)?);
                projections
            }
            _ => self.records(cx, args.select.as_ref(), args.include.as_ref())?,
        };

        tracing::trace!(
            model = %cx.model.name,
            columns = projections.len(),
            "compiled select list"
        );

        Ok(projections)
    }

    /// Fields named by `distinct`, in the order given.
    pub(crate) fn distinct_fields(&self, cx: &Context<'a>) -> Result<Vec<&'a Field>> {
        let Some(names) = cx.pagination().and_then(|pagination| pagination.distinct) else {
            return Ok(vec![]);
        };

        if names.is_empty() {
            return Err(Error::validation_on(&cx.model.name, None, "`distinct` needs at least one field"));
        }

        names.iter().map(|name| cx.model.expect_field(name)).collect()
    }

    /// The projection of a record read: the selected scalar fields (all of
    /// them by default) followed by included relations.
    pub(crate) fn records(
        &mut self,
        cx: &Context<'a>,
        select: Option<&Object>,
        include: Option<&Object>,
    ) -> Result<Vec<Projection>> {
        match (select, include) {
            (Some(_), Some(_)) => Err(Error::validation_on(
                &cx.model.name,
                None,
                "`select` and `include` cannot be used together",
            )),
            (Some(select), None) => self.explicit_selection(cx, select),
            (None, include) => {
                let mut projections: Vec<_> = cx
                    .model
                    .fields
                    .keys()
                    .map(|name| self.column(cx, name))
                    .collect();

                if let Some(include) = include {
                    for (key, value) in include {
                        if key == "_count" {
                            return Err(Error::unsupported_operation("relation counts"));
                        }

                        if cx.model.field_by_name(key).is_some() {
                            return Err(Error::validation_on(
                                &cx.model.name,
                                Some(key),
                                "only relations can be included; select scalar fields with `select`",
                            ));
                        }

                        let relation = cx.model.expect_relation(key)?;
                        projections.extend(self.include(cx, relation, value)?);
                    }
                }

                Ok(projections)
            }
        }
    }

    fn explicit_selection(&mut self, cx: &Context<'a>, select: &Object) -> Result<Vec<Projection>> {
        let mut projections = vec![];

        for (key, value) in select {
            if let Some(field) = cx.model.field_by_name(key) {
                if flag(cx, key, value)? {
                    projections.push(self.column(cx, &field.name));
                }
            } else if let Some(relation) = cx.model.relation_by_name(key) {
                projections.extend(self.include(cx, relation, value)?);
            } else if key == "_count" {
                return Err(Error::unsupported_operation("relation counts"));
            } else {
                return Err(cx.model.unknown_member(key));
            }
        }

        if projections.is_empty() {
            return Err(Error::validation_on(
                &cx.model.name,
                None,
                "`select` needs at least one field set to `true`",
            ));
        }

        Ok(projections)
    }

    fn column(&self, cx: &Context<'a>, name: &str) -> Projection {
        Projection {
            expr: self.dialect.column(cx.alias, name),
            name: name.to_string(),
            json: false,
        }
    }
}

