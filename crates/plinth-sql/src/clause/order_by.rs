use super::{json_kind, Compilation};
use crate::{
    dialect::{Direction, Nulls},
    Context, Fragment,
};
use plinth_core::{
    query::{AggregateKind, Json, OrderByArg},
    Error, Operation, Result,
};

impl<'a> Compilation<'a> {
    /// Compiles `orderBy`. Entries are emitted in input order. `by` holds
    /// the grouping fields of a `groupBy`, which are the only plain fields
    /// it may order on.
    ///
    /// Reads with `distinct` order on the distinct fields first, keeping any
    /// direction `orderBy` gives them. Reads with a cursor end with the
    /// cursor fields `orderBy` leaves out, ascending.
    pub(crate) fn order_by(
        &self,
        cx: &Context<'a>,
        order_by: Option<&OrderByArg>,
        by: Option<&[String]>,
    ) -> Result<Option<Fragment>> {
        let lead = self.distinct_fields(cx)?;
        let mut leading: Vec<Option<Fragment>> = lead.iter().map(|_| None).collect();
        let mut items = vec![];
        let mut ordered: Vec<&str> = vec![];

        for entry in order_by.map(OrderByArg::entries).unwrap_or_default() {
            if entry.is_empty() {
                return Err(Error::validation_on(
                    &cx.model.name,
                    None,
                    "`orderBy` entries need a field",
                ));
            }

            for (key, value) in entry {
                if let Some(kind) = AggregateKind::from_key(key) {
                    self.order_by_aggregate(cx, kind, value, &mut items)?;
                    continue;
                }

                if let Some(field) = cx.model.field_by_name(key) {
                    if by.is_some_and(|by| !by.contains(&field.name)) {
                        return Err(Error::validation_on(
                            &cx.model.name,
                            Some(key),
                            "a grouped query can only order on fields in `by` or on aggregates",
                        ));
                    }

                    let (direction, nulls) = parse_order(cx, key, value)?;
                    let column = self.dialect.column(cx.alias, &field.name);
                    let item = self.dialect.order_by_item(cx, column, direction, nulls)?;

                    match lead.iter().position(|led| led.name == field.name) {
                        Some(i) => leading[i] = Some(item),
                        None => items.push(item),
                    }
                    ordered.push(&field.name);
                    continue;
                }

                if cx.model.relation_by_name(key).is_some() {
                    return Err(Error::unsupported_operation("ordering by relation fields"));
                }

                return Err(cx.model.unknown_member(key));
            }
        }

        let mut all = Vec::with_capacity(lead.len() + items.len());
        for (field, item) in lead.iter().zip(leading) {
            match item {
                Some(item) => all.push(item),
                None => {
                    all.push(self.ascending(cx, &field.name)?);
                    ordered.push(&field.name);
                }
            }
        }
        all.append(&mut items);

        if let Some(cursor) = cx.pagination().and_then(|pagination| pagination.cursor) {
            for name in cursor.keys() {
                let field = cx.model.expect_field(name)?;
                if !ordered.contains(&field.name.as_str()) {
                    all.push(self.ascending(cx, &field.name)?);
                    ordered.push(&field.name);
                }
            }
        }

        if self.tiebreak(cx) {
            for field in cx.model.identifiers() {
                if !ordered.contains(&field.name.as_str()) {
                    all.push(self.ascending(cx, &field.name)?);
                }
            }
        }

        if all.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.dialect.order_by(cx, all)))
    }

    fn ascending(&self, cx: &Context<'a>, name: &str) -> Result<Fragment> {
        let column = self.dialect.column(cx.alias, name);
        self.dialect.order_by_item(cx, column, Direction::Asc, None)
    }

    /// `{_count: "desc"}` orders on the global count; `{_sum: {price: "asc"}}`
    /// orders on an aggregate of a field.
    fn order_by_aggregate(
        &self,
        cx: &Context<'a>,
        kind: AggregateKind,
        value: &Json,
        items: &mut Vec<Fragment>,
    ) -> Result<()> {
        if !cx.operation.is_aggregate() {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(kind.key()),
                "ordering on aggregates is only valid in `count`, `aggregate` and `groupBy`",
            ));
        }

        // `count` and `aggregate` return a single row: the entry is checked,
        // then dropped.
        let grouped = cx.operation == Operation::GroupBy;

        match value {
            Json::String(_) if kind.supports_global() => {
                let (direction, nulls) = parse_order(cx, kind.key(), value)?;
                if grouped {
                    let expr = crate::dialect::aggregate(self.dialect, cx, kind, None);
                    items.push(self.dialect.order_by_item(cx, expr, direction, nulls)?);
                }
            }
            Json::Object(fields) => {
                for (name, value) in fields {
                    let field = self.aggregate_field(cx, kind, name)?;
                    let (direction, nulls) = parse_order(cx, name, value)?;
                    if grouped {
                        let expr = self.aggregate_expr(cx, kind, field);
                        items.push(self.dialect.order_by_item(cx, expr, direction, nulls)?);
                    }
                }
            }
            _ => {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(kind.key()),
                    format!("`{kind}` ordering expects an object of fields"),
                ))
            }
        }

        Ok(())
    }

    /// A tie-breaker keeps pages stable when the requested ordering has ties.
    fn tiebreak(&self, cx: &Context<'a>) -> bool {
        self.config.order_tiebreaker
            && cx.operation.is_read()
            && cx
                .pagination()
                .is_some_and(|pagination| pagination.take.is_some() || pagination.skip.is_some())
    }
}

/// Parses `"asc"`, `"DESC"` or `{sort: "asc", nulls: "last"}`.
pub(crate) fn parse_order(cx: &Context<'_>, field: &str, value: &Json) -> Result<(Direction, Option<Nulls>)> {
    match value {
        Json::String(direction) => Ok((parse_direction(cx, field, direction)?, None)),
        Json::Object(order) => {
            let mut direction = None;
            let mut nulls = None;

            for (key, value) in order {
                match (key.as_str(), value) {
                    ("sort", Json::String(sort)) => direction = Some(parse_direction(cx, field, sort)?),
                    ("nulls", Json::String(n)) if n.eq_ignore_ascii_case("first") => nulls = Some(Nulls::First),
                    ("nulls", Json::String(n)) if n.eq_ignore_ascii_case("last") => nulls = Some(Nulls::Last),
                    _ => {
                        return Err(Error::validation_on(
                            &cx.model.name,
                            Some(field),
                            format!("invalid ordering option `{key}: {value}`"),
                        ))
                    }
                }
            }

            let Some(direction) = direction else {
                return Err(Error::validation_on(&cx.model.name, Some(field), "ordering needs `sort`"));
            };

            Ok((direction, nulls))
        }
        _ => Err(Error::validation_on(
            &cx.model.name,
            Some(field),
            format!("invalid order direction: expected `asc` or `desc`, got {}", json_kind(value)),
        )),
    }
}

fn parse_direction(cx: &Context<'_>, field: &str, direction: &str) -> Result<Direction> {
    if direction.eq_ignore_ascii_case("asc") {
        Ok(Direction::Asc)
    } else if direction.eq_ignore_ascii_case("desc") {
        Ok(Direction::Desc)
    } else {
        Err(Error::validation_on(
            &cx.model.name,
            Some(field),
            format!("invalid order direction `{direction}`, expected `asc` or `desc`"),
        ))
    }
}
