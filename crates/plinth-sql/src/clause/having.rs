use super::{json_kind, object, Compilation};
use crate::{Context, Fragment};
use plinth_core::{
    query::{AggregateKind, Json, Object},
    schema::Field,
    Error, Result,
};

impl<'a> Compilation<'a> {
    /// Compiles the `having` filter of a `groupBy`.
    ///
    /// A field condition is either a plain filter on a grouping field or a
    /// filter on an aggregate of the field:
    /// `{price: {_sum: {gt: 100}}, category: "books"}`.
    pub(crate) fn having(&mut self, cx: &Context<'a>, having: &Object, by: &[String]) -> Result<Option<Fragment>> {
        let mut operands = vec![];

        for (key, value) in having {
            match key.as_str() {
                "AND" | "OR" | "NOT" => operands.push(self.having_logical(cx, key, value, by)?),
                _ => {
                    let field = cx.model.expect_field(key)?;
                    operands.extend(self.having_field(cx, field, value, by)?);
                }
            }
        }

        Ok(self.conjunction(cx, operands))
    }

    fn having_logical(&mut self, cx: &Context<'a>, key: &str, value: &Json, by: &[String]) -> Result<Fragment> {
        let conditions: Vec<&Object> = match value {
            Json::Object(condition) => vec![condition],
            Json::Array(conditions) if !conditions.is_empty() => conditions
                .iter()
                .map(|condition| object(cx, key, condition))
                .collect::<Result<_>>()?,
            _ => {
                return Err(Error::validation_on(
                    &cx.model.name,
                    None,
                    format!("`{key}` needs at least one condition, got {}", json_kind(value)),
                ))
            }
        };

        let mut compiled = vec![];
        for condition in conditions {
            compiled.push(self.having(cx, condition, by)?);
        }

        match key {
            "AND" => {
                let operands = compiled.into_iter().flatten().collect();
                Ok(self
                    .conjunction(cx, operands)
                    .unwrap_or_else(|| self.dialect.literal_true(cx)))
            }
            "OR" => {
                let operands = compiled
                    .into_iter()
                    .map(|operand| operand.unwrap_or_else(|| self.dialect.literal_true(cx)))
                    .collect();
                Ok(self.dialect.or(cx, operands))
            }
            _ => {
                let mut operands: Vec<_> = compiled.into_iter().flatten().collect();
                if operands.len() != 1 {
                    return Err(Error::validation_on(
                        &cx.model.name,
                        None,
                        format!("`NOT` needs exactly one condition, got {}", operands.len()),
                    ));
                }
                Ok(self.dialect.not(cx, operands.remove(0)))
            }
        }
    }

    fn having_field(&mut self, cx: &Context<'a>, field: &'a Field, value: &Json, by: &[String]) -> Result<Vec<Fragment>> {
        let mut operands = vec![];
        let mut plain = Object::new();

        match value {
            Json::Object(conditions) => {
                for (key, condition) in conditions {
                    match AggregateKind::from_key(key) {
                        Some(kind) => {
                            let field = self.aggregate_field(cx, kind, &field.name)?;
                            let expr = self.aggregate_expr(cx, kind, field);
                            operands.extend(self.field_condition(cx, field, expr, condition)?);
                        }
                        None => {
                            plain.insert(key.clone(), condition.clone());
                        }
                    }
                }
            }
            _ => {
                plain.insert("equals".to_string(), value.clone());
            }
        }

        if !plain.is_empty() {
            if !by.contains(&field.name) {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(&field.name),
                    "`having` can only filter fields in `by` unless it aggregates them",
                ));
            }
            operands.extend(self.field_filter(cx, field, &Json::Object(plain))?);
        }

        Ok(operands)
    }
}
