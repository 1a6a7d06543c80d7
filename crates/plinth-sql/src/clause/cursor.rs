use super::{scalar, Compilation};
use crate::{
    dialect::{BinaryOp, Direction},
    Context, Fragment,
};
use plinth_core::{
    query::{Json, Object, OrderByArg},
    Error, Result,
};

impl<'a> Compilation<'a> {
    /// Translates a cursor to a keyset predicate: rows at or past the cursor
    /// in the page ordering. The page orders on the cursor fields, those
    /// named by `orderBy` first, then the rest ascending. With more than one
    /// field the boundary is a row-value comparison, `(a, b) >= ($1, $2)`.
    pub(crate) fn cursor(&self, cx: &Context<'a>, cursor: &Object, order_by: Option<&OrderByArg>) -> Result<Fragment> {
        if cursor.is_empty() {
            return Err(Error::validation_on(&cx.model.name, None, "`cursor` needs at least one field"));
        }

        let mut keys: Vec<(&str, &Json, Direction)> = vec![];
        for entry in order_by.map(OrderByArg::entries).unwrap_or_default() {
            for (key, order) in entry {
                let Some(value) = cursor.get(key) else {
                    return Err(Error::unsupported_operation(
                        "cursor pagination with ordering on non-cursor fields",
                    ));
                };
                let (direction, _) = super::order_by::parse_order(cx, key, order)?;
                if !keys.iter().any(|(name, ..)| *name == key.as_str()) {
                    keys.push((key.as_str(), value, direction));
                }
            }
        }
        for (name, value) in cursor {
            if !keys.iter().any(|(key, ..)| *key == name.as_str()) {
                keys.push((name.as_str(), value, Direction::Asc));
            }
        }

        let direction = keys[0].2;
        if keys.iter().any(|(.., other)| *other != direction) {
            return Err(Error::unsupported_operation(
                "cursor pagination with mixed ordering directions",
            ));
        }

        let mut columns = Vec::with_capacity(keys.len());
        let mut values = Vec::with_capacity(keys.len());

        for (name, value, _) in keys {
            let field = cx.model.expect_field(name)?;

            if !field.is_unique() {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(name),
                    "cursor fields must be unique or part of the identifier",
                ));
            }

            let value = scalar(cx, name, value)?;
            if value.is_null() {
                return Err(Error::validation_on(&cx.model.name, Some(name), "cursor values cannot be null"));
            }

            columns.push(self.dialect.column(cx.alias, &field.name));
            values.push(Fragment::param(value));
        }

        let op = match direction {
            Direction::Asc => BinaryOp::Ge,
            Direction::Desc => BinaryOp::Le,
        };

        if columns.len() == 1 {
            return Ok(self.dialect.compare(cx, columns.remove(0), op, values.remove(0)));
        }

        let lhs = Fragment::join(columns, ", ").parenthesized();
        let rhs = Fragment::join(values, ", ").parenthesized();
        Ok(self.dialect.compare(cx, lhs, op, rhs))
    }
}
