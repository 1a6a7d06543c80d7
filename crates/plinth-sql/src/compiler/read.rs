use crate::{
    clause::{Compilation, Projection, Scope, Select},
    Context, Fragment,
};
use plinth_core::{
    query::{Json, QueryArgs},
    Error, Operation, Result,
};

impl<'a> Compilation<'a> {
    /// `findMany`, `findFirst` and `findUnique`.
    pub(super) fn find(&mut self, cx: &Context<'a>, args: &QueryArgs) -> Result<Fragment> {
        let pagination = cx.pagination().copied().unwrap_or_default();

        if cx.operation == Operation::FindUnique {
            self.check_unique(cx, args)?;
        }

        let projection = self.select(cx, args)?;

        let distinct = self.distinct_fields(cx)?;
        let distinct = if distinct.is_empty() {
            None
        } else {
            if pagination.cursor.is_some() {
                return Err(Error::unsupported_operation("cursor pagination with `distinct`"));
            }
            let columns = distinct
                .iter()
                .map(|field| self.dialect.column(cx.alias, &field.name))
                .collect();
            Some(self.dialect.distinct_on(cx, columns)?)
        };

        let filter = self.read_filter(cx, args)?;
        let order_by = self.order_by(cx, args.order_by.as_ref(), None)?;

        // Single-record reads fetch at most one row.
        let take = if cx.operation.is_single() { Some(1) } else { pagination.take };
        let limit = self.limit(cx, take, pagination.skip);

        Ok(self.assemble(
            cx,
            Select {
                projection: Projection::list(&projection),
                distinct,
                source: self.dialect.table(cx.model.table_name(), cx.alias),
                filter,
                order_by,
                limit,
                ..Select::default()
            },
        ))
    }

    /// `count` and `aggregate`.
    ///
    /// Pagination picks the rows to aggregate, so a paginated query
    /// aggregates over a derived table holding the page.
    pub(super) fn aggregate_query(&mut self, cx: &Context<'a>, args: &QueryArgs) -> Result<Fragment> {
        let pagination = cx.pagination().copied().unwrap_or_default();
        let filter = self.read_filter(cx, args)?;

        // Ordering only matters for which rows make the page, but it is
        // checked either way.
        let order_by = self.order_by(cx, args.order_by.as_ref(), None)?;

        if pagination.take.is_none() && pagination.skip.is_none() {
            let projection = self.select(cx, args)?;
            return Ok(self.assemble(
                cx,
                Select {
                    projection: Projection::list(&projection),
                    source: self.dialect.table(cx.model.table_name(), cx.alias),
                    filter,
                    ..Select::default()
                },
            ));
        }

        let mut fields = self.aggregated_fields(cx, args)?;
        if fields.is_empty() {
            fields = cx.model.identifiers().collect();
        }

        let columns = Fragment::join(
            fields
                .iter()
                .map(|field| self.dialect.column(cx.alias, &field.name)),
            ", ",
        );

        let page = self.assemble(
            cx,
            Select {
                projection: columns,
                source: self.dialect.table(cx.model.table_name(), cx.alias),
                filter,
                order_by,
                limit: self.limit(cx, pagination.take, pagination.skip),
                ..Select::default()
            },
        );

        let alias = self.aliases.next();
        let outer = cx.with_alias(alias);
        let projection = self.select(&outer, args)?;

        Ok(self
            .dialect
            .count_rows(&outer, Projection::list(&projection), page, alias))
    }

    /// `groupBy`.
    pub(super) fn group_by(&mut self, cx: &Context<'a>, args: &QueryArgs) -> Result<Fragment> {
        let pagination = cx.pagination().copied().unwrap_or_default();

        let grouping = self.grouping(cx, args.by.as_ref())?;
        let by: Vec<String> = grouping.iter().map(|field| field.name.clone()).collect();

        let projection = self.select(cx, args)?;
        let filter = self.read_filter(cx, args)?;

        let columns = grouping
            .iter()
            .map(|field| self.dialect.column(cx.alias, &field.name))
            .collect();
        let group_by = self.dialect.group_by(cx, columns);

        let having = match &args.having {
            Some(having) => self.having(cx, having, &by)?,
            None => None,
        };

        let order_by = self.order_by(cx, args.order_by.as_ref(), Some(&by))?;
        let limit = self.limit(cx, pagination.take, pagination.skip);

        Ok(self.assemble(
            cx,
            Select {
                projection: Projection::list(&projection),
                source: self.dialect.table(cx.model.table_name(), cx.alias),
                filter,
                group_by: Some(group_by),
                having,
                order_by,
                limit,
                ..Select::default()
            },
        ))
    }

    /// The user's filter ANDed with the cursor's keyset predicate.
    fn read_filter(&mut self, cx: &Context<'a>, args: &QueryArgs) -> Result<Option<Fragment>> {
        let mut operands = vec![];

        if let Some(filter) = &args.filter {
            operands.extend(self.filter(cx, filter, Scope::Public)?);
        }

        if let Some(cursor) = cx.pagination().and_then(|pagination| pagination.cursor) {
            operands.push(self.cursor(cx, cursor, args.order_by.as_ref())?);
        }

        Ok(self.conjunction(cx, operands))
    }

    /// `findUnique` has to pin a unique field to a value.
    fn check_unique(&self, cx: &Context<'a>, args: &QueryArgs) -> Result<()> {
        let pinned = args.filter.iter().flatten().any(|(key, value)| {
            let Some(field) = cx.model.field_by_name(key) else {
                return false;
            };

            let value = match value {
                Json::Object(operators) if operators.len() == 1 => operators.get("equals"),
                value => Some(value),
            };

            field.is_unique() && value.is_some_and(|value| !value.is_null() && !value.is_object() && !value.is_array())
        });

        if pinned {
            return Ok(());
        }

        let unique: Vec<_> = cx
            .model
            .fields
            .values()
            .filter(|field| field.is_unique())
            .map(|field| field.name.as_str())
            .collect();

        Err(Error::validation_on(
            &cx.model.name,
            None,
            format!(
                "`findUnique` needs an equality on a unique field ({})",
                unique.join(", ")
            ),
        ))
    }
}
