use crate::{
    clause::{Compilation, Scope},
    Context, Fragment,
};
use plinth_core::{
    query::{Json, Object, QueryArgs},
    schema::{Field, Type},
    Error, Result, Value,
};

impl<'a> Compilation<'a> {
    /// `INSERT INTO <table> (<columns>) VALUES (<params>)`
    pub(super) fn create(&mut self, cx: &Context<'a>) -> Result<Fragment> {
        let data = self.payload(cx)?;
        let (columns, values) = self.assignments(cx, data)?.into_iter().unzip();
        Ok(self.dialect.insert(cx, cx.model.table_name(), columns, values))
    }

    /// `UPDATE <table> AS t0 SET <column> = <param>, .. [WHERE ..]`
    pub(super) fn update(&mut self, cx: &Context<'a>, args: &QueryArgs) -> Result<Fragment> {
        let data = self.payload(cx)?;
        let assignments = self.assignments(cx, data)?;

        if assignments.is_empty() {
            return Err(Error::validation_on(&cx.model.name, None, "`update` needs at least one field in `data`"));
        }

        let update = self
            .dialect
            .update(cx, cx.model.table_name(), cx.alias, assignments);
        self.with_filter(cx, update, args)
    }

    /// `DELETE FROM <table> AS t0 [WHERE ..]`
    pub(super) fn delete(&mut self, cx: &Context<'a>, args: &QueryArgs) -> Result<Fragment> {
        let delete = self.dialect.delete(cx, cx.model.table_name(), cx.alias);
        self.with_filter(cx, delete, args)
    }

    fn with_filter(&mut self, cx: &Context<'a>, statement: Fragment, args: &QueryArgs) -> Result<Fragment> {
        let filter = match &args.filter {
            Some(filter) => self.filter(cx, filter, Scope::Public)?,
            None => None,
        };

        Ok(match filter {
            Some(filter) => sql!(statement " " (self.dialect.where_clause(cx, filter))),
            None => statement,
        })
    }

    fn payload(&self, cx: &Context<'a>) -> Result<&'a Object> {
        cx.mutation().ok_or_else(|| {
            Error::validation_on(
                &cx.model.name,
                None,
                format!("`{}` needs `data`", cx.operation),
            )
        })
    }

    /// Column/value pairs of a mutation payload, in payload order.
    fn assignments(&self, cx: &Context<'a>, data: &'a Object) -> Result<Vec<(&'a str, Fragment)>> {
        let mut assignments = Vec::with_capacity(data.len());

        for (key, value) in data {
            if cx.model.relation_by_name(key).is_some() {
                return Err(Error::unsupported_operation("nested relation writes"));
            }

            let Some(field) = cx.model.field_by_name(key) else {
                return Err(cx.model.unknown_member(key));
            };

            // `{set: value}` is the explicit form of a plain value. A JSON
            // document whose only key is `set` has to be written through it.
            let value = match value {
                Json::Object(op) => match (op.len(), op.get("set")) {
                    (1, Some(value)) => value,
                    _ if field.ty == Type::Json => value,
                    _ => {
                        return Err(Error::unsupported_operation(format!(
                            "update operators other than `set` (on `{}.{key}`)",
                            cx.model.name
                        )))
                    }
                },
                value => value,
            };

            let value = write_value(cx, field, value)?;
            assignments.push((field.name.as_str(), Fragment::param(value)));
        }

        Ok(assignments)
    }
}

fn write_value(cx: &Context<'_>, field: &Field, value: &Json) -> Result<Value> {
    if value.is_null() && !field.nullable {
        return Err(Error::validation_on(
            &cx.model.name,
            Some(&field.name),
            "field is not nullable",
        ));
    }

    match value {
        // JSON documents are bound as their text
        Json::Object(_) | Json::Array(_) if field.ty == Type::Json => Ok(Value::String(value.to_string())),
        Json::Object(_) | Json::Array(_) => Err(Error::validation_on(
            &cx.model.name,
            Some(&field.name),
            format!("{} fields take scalar values", field.ty),
        )),
        _ => Ok(Value::from_json(value).unwrap_or_default()),
    }
}
