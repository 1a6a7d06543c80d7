use super::{json_kind, scalar, Compilation};
use crate::{dialect::BinaryOp, Context, Fragment};
use plinth_core::{
    query::{Json, Object},
    schema::Field,
    Error, Result, Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Default,
    Insensitive,
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Contains,
    StartsWith,
    EndsWith,
}

impl<'a> Compilation<'a> {
    /// Compiles the condition on one scalar field of the context's model.
    pub(crate) fn field_filter(&mut self, cx: &Context<'a>, field: &'a Field, value: &Json) -> Result<Option<Fragment>> {
        let column = self.dialect.column(cx.alias, &field.name);
        self.field_condition(cx, field, column, value)
    }

    /// Compiles a field condition against an arbitrary left-hand side, e.g.
    /// an aggregate expression in `HAVING`.
    pub(crate) fn field_condition(
        &mut self,
        cx: &Context<'a>,
        field: &'a Field,
        lhs: Fragment,
        value: &Json,
    ) -> Result<Option<Fragment>> {
        let cx = cx.with_field(field);

        match value {
            Json::Null => Ok(Some(self.dialect.is_null(&cx, lhs))),
            Json::Array(_) => Err(Error::validation_on(
                &cx.model.name,
                Some(&field.name),
                "array values need an operator such as `in`",
            )),
            Json::Object(operators) => self.field_operators(&cx, field, lhs, operators),
            _ => {
                let value = scalar(&cx, &field.name, value)?;
                Ok(Some(self.dialect.eq(&cx, lhs, Fragment::param(value))))
            }
        }
    }

    fn field_operators(
        &mut self,
        cx: &Context<'a>,
        field: &'a Field,
        lhs: Fragment,
        operators: &Object,
    ) -> Result<Option<Fragment>> {
        let mode = match operators.get("mode") {
            None => Mode::Default,
            Some(Json::String(mode)) if mode == "default" => Mode::Default,
            Some(Json::String(mode)) if mode == "insensitive" => {
                if !field.ty.is_textual() {
                    return Err(Error::validation_on(
                        &cx.model.name,
                        Some(&field.name),
                        format!("`mode: insensitive` is not supported on {} fields", field.ty),
                    ));
                }
                Mode::Insensitive
            }
            Some(other) => {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(&field.name),
                    format!("invalid filter mode {other}"),
                ))
            }
        };

        let mut operands = vec![];

        for (op, value) in operators {
            let operand = match op.as_str() {
                "mode" => continue,
                "equals" => self.equals(cx, field, &lhs, value, mode)?,
                "not" => match value {
                    Json::Null => self.dialect.is_not_null(cx, lhs.clone()),
                    Json::Object(nested) => {
                        // The nested object inherits the mode unless it sets its own.
                        let mut nested = nested.clone();
                        if mode == Mode::Insensitive && !nested.contains_key("mode") {
                            nested.insert("mode".to_string(), Json::from("insensitive"));
                        }
                        match self.field_operators(cx, field, lhs.clone(), &nested)? {
                            Some(condition) => self.dialect.not(cx, condition),
                            None => continue,
                        }
                    }
                    _ => self.compare(cx, field, &lhs, BinaryOp::Ne, value, mode)?,
                },
                "in" => self.in_list(cx, field, &lhs, value, mode, false)?,
                "notIn" => self.in_list(cx, field, &lhs, value, mode, true)?,
                "lt" => self.compare(cx, field, &lhs, BinaryOp::Lt, value, mode)?,
                "lte" => self.compare(cx, field, &lhs, BinaryOp::Le, value, mode)?,
                "gt" => self.compare(cx, field, &lhs, BinaryOp::Gt, value, mode)?,
                "gte" => self.compare(cx, field, &lhs, BinaryOp::Ge, value, mode)?,
                "contains" => self.pattern(cx, field, &lhs, Pattern::Contains, value, mode)?,
                "startsWith" => self.pattern(cx, field, &lhs, Pattern::StartsWith, value, mode)?,
                "endsWith" => self.pattern(cx, field, &lhs, Pattern::EndsWith, value, mode)?,
                "path" | "string_contains" | "string_starts_with" | "string_ends_with" | "array_contains"
                | "array_starts_with" | "array_ends_with" => {
                    return Err(Error::unsupported_operation("JSON path filters"));
                }
                "search" => return Err(Error::unsupported_operation("full-text search filters")),
                "has" | "hasEvery" | "hasSome" | "isEmpty" => {
                    return Err(Error::unsupported_operation("scalar list filters"));
                }
                _ => {
                    return Err(Error::validation_on(
                        &cx.model.name,
                        Some(&field.name),
                        format!("unknown filter operator `{op}`"),
                    ))
                }
            };

            operands.push(operand);
        }

        Ok(self.conjunction(cx, operands))
    }

    fn equals(&self, cx: &Context<'a>, field: &Field, lhs: &Fragment, value: &Json, mode: Mode) -> Result<Fragment> {
        if value.is_null() {
            return Ok(self.dialect.is_null(cx, lhs.clone()));
        }
        self.compare(cx, field, lhs, BinaryOp::Eq, value, mode)
    }

    fn compare(
        &self,
        cx: &Context<'a>,
        field: &Field,
        lhs: &Fragment,
        op: BinaryOp,
        value: &Json,
        mode: Mode,
    ) -> Result<Fragment> {
        let value = non_null_scalar(cx, field, value)?;
        let (lhs, rhs) = self.apply_mode(cx, mode, lhs.clone(), Fragment::param(value));
        Ok(self.dialect.compare(cx, lhs, op, rhs))
    }

    fn in_list(
        &self,
        cx: &Context<'a>,
        field: &Field,
        lhs: &Fragment,
        value: &Json,
        mode: Mode,
        negate: bool,
    ) -> Result<Fragment> {
        let Json::Array(items) = value else {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(&field.name),
                format!("`{}` expects an array, got {}", if negate { "notIn" } else { "in" }, json_kind(value)),
            ));
        };

        // Nothing is in the empty set.
        if items.is_empty() {
            return Ok(if negate {
                self.dialect.literal_true(cx)
            } else {
                self.dialect.literal_false(cx)
            });
        }

        let mut params = Vec::with_capacity(items.len());
        for item in items {
            let param = Fragment::param(non_null_scalar(cx, field, item)?);
            params.push(match mode {
                Mode::Default => param,
                Mode::Insensitive => self.dialect.case_insensitive(cx, param),
            });
        }

        let lhs = match mode {
            Mode::Default => lhs.clone(),
            Mode::Insensitive => self.dialect.case_insensitive(cx, lhs.clone()),
        };

        Ok(self.dialect.in_list(cx, lhs, params, negate))
    }

    fn pattern(
        &self,
        cx: &Context<'a>,
        field: &Field,
        lhs: &Fragment,
        pattern: Pattern,
        value: &Json,
        mode: Mode,
    ) -> Result<Fragment> {
        if !field.ty.is_textual() {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(&field.name),
                format!("pattern filters are not supported on {} fields", field.ty),
            ));
        }

        let Some(text) = value.as_str() else {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(&field.name),
                format!("pattern filters expect a string, got {}", json_kind(value)),
            ));
        };

        let escaped = escape_like(text);
        let pattern = match pattern {
            Pattern::Contains => format!("%{escaped}%"),
            Pattern::StartsWith => format!("{escaped}%"),
            Pattern::EndsWith => format!("%{escaped}"),
        };

        let (lhs, rhs) = self.apply_mode(cx, mode, lhs.clone(), Fragment::param(Value::String(pattern)));
        Ok(self.dialect.like(cx, lhs, rhs))
    }

    fn apply_mode(&self, cx: &Context<'a>, mode: Mode, lhs: Fragment, rhs: Fragment) -> (Fragment, Fragment) {
        match mode {
            Mode::Default => (lhs, rhs),
            Mode::Insensitive => (
                self.dialect.case_insensitive(cx, lhs),
                self.dialect.case_insensitive(cx, rhs),
            ),
        }
    }
}

fn non_null_scalar(cx: &Context<'_>, field: &Field, value: &Json) -> Result<Value> {
    if value.is_null() {
        return Err(Error::validation_on(
            &cx.model.name,
            Some(&field.name),
            "null is only valid with `equals` and `not`",
        ));
    }
    scalar(cx, &field.name, value)
}

/// Escapes `LIKE` wildcards with a backslash.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
