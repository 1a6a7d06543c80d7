use super::{json_kind, object, Compilation};
use crate::{Context, Fragment};
use plinth_core::{
    query::{Json, Object},
    Error, Result,
};

/// Who wrote the filter being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Query input. Reserved `__` keys are rejected.
    Public,

    /// A filter assembled by the relation synthesizer. Reserved keys are
    /// accepted at the top level only.
    Internal,
}

/// Link condition between a relation subquery and its parent, plus the
/// not-null guard on the foreign key.
pub(crate) const LINK: &str = "__link";

/// Junction-table existence check of a many-to-many subquery.
pub(crate) const JUNCTION: &str = "__junction";

/// Explicit `child.column = parent.column` equalities.
pub(crate) const PARENT: &str = "__parent";

const RESERVED_PREFIX: &str = "__";

#[derive(Debug, Clone, Copy)]
enum Logical {
    And,
    Or,
    Not,
}

impl Logical {
    fn from_key(key: &str) -> Option<Logical> {
        match key {
            "AND" => Some(Logical::And),
            "OR" => Some(Logical::Or),
            "NOT" => Some(Logical::Not),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Logical::And => "AND",
            Logical::Or => "OR",
            Logical::Not => "NOT",
        }
    }
}

impl<'a> Compilation<'a> {
    /// Compiles a filter tree against the context's model. Returns `None`
    /// for an empty tree; top-level keys are ANDed in input order.
    pub(crate) fn filter(&mut self, cx: &Context<'a>, filter: &Object, scope: Scope) -> Result<Option<Fragment>> {
        let mut operands = vec![];

        for (key, value) in filter {
            self.filter_entry(cx, key, value, scope, &mut operands)?;
        }

        let predicate = self.conjunction(cx, operands);

        if let Some(predicate) = &predicate {
            tracing::trace!(model = %cx.model.name, alias = %cx.alias, %predicate, "compiled filter");
        }

        Ok(predicate)
    }

    fn filter_entry(
        &mut self,
        cx: &Context<'a>,
        key: &str,
        value: &Json,
        scope: Scope,
        operands: &mut Vec<Fragment>,
    ) -> Result<()> {
        if let Some(logical) = Logical::from_key(key) {
            operands.push(self.logical(cx, logical, value)?);
            return Ok(());
        }

        if key.starts_with(RESERVED_PREFIX) {
            if scope == Scope::Public {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(key),
                    "keys starting with `__` are reserved",
                ));
            }

            return self.marker(cx, key, value, operands);
        }

        if let Some(field) = cx.model.field_by_name(key) {
            operands.extend(self.field_filter(cx, field, value)?);
            return Ok(());
        }

        if let Some(relation) = cx.model.relation_by_name(key) {
            operands.push(self.relation_filter(cx, relation, value)?);
            return Ok(());
        }

        Err(cx.model.unknown_member(key))
    }

    fn logical(&mut self, cx: &Context<'a>, logical: Logical, value: &Json) -> Result<Fragment> {
        let conditions = logical_operands(cx, logical.key(), value)?;

        let mut compiled = Vec::with_capacity(conditions.len());
        for condition in conditions {
            compiled.push(self.filter(cx, condition, Scope::Public)?);
        }

        match logical {
            Logical::And => {
                let operands: Vec<_> = compiled.into_iter().flatten().collect();
                Ok(self
                    .conjunction(cx, operands)
                    .unwrap_or_else(|| self.dialect.literal_true(cx)))
            }
            Logical::Or => {
                // A branch without a predicate matches everything.
                let operands = compiled
                    .into_iter()
                    .map(|operand| operand.unwrap_or_else(|| self.dialect.literal_true(cx)))
                    .collect();
                Ok(self.dialect.or(cx, operands))
            }
            Logical::Not => {
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

    /// Compiles one of the synthesizer's reserved keys. The link expands to
    /// several operands so it ANDs flat with the caller's nested filter.
    fn marker(&mut self, cx: &Context<'a>, key: &str, value: &Json, operands: &mut Vec<Fragment>) -> Result<()> {
        match key {
            LINK => {
                expect_marker_flag(cx, key, value)?;
                operands.extend(self.link(cx)?);
            }
            JUNCTION => {
                expect_marker_flag(cx, key, value)?;
                operands.push(self.junction(cx)?);
            }
            PARENT => {
                let pairs = object(cx, key, value)?;
                operands.extend(self.parent_equalities(cx, pairs)?);
            }
            _ => {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(key),
                    "unknown reserved key",
                ))
            }
        }
        Ok(())
    }
}

/// The conditions of a logical operator: one object or a non-empty array of
/// objects.
fn logical_operands<'v>(cx: &Context<'_>, key: &str, value: &'v Json) -> Result<Vec<&'v Object>> {
    match value {
        Json::Object(condition) => Ok(vec![condition]),
        Json::Array(conditions) if conditions.is_empty() => Err(Error::validation_on(
            &cx.model.name,
            None,
            format!("`{key}` needs at least one condition"),
        )),
        Json::Array(conditions) => conditions
            .iter()
            .map(|condition| object(cx, key, condition))
            .collect(),
        _ => Err(Error::validation_on(
            &cx.model.name,
            None,
            format!("`{key}` expects an object or an array of objects, got {}", json_kind(value)),
        )),
    }
}

fn expect_marker_flag(cx: &Context<'_>, key: &str, value: &Json) -> Result<()> {
    if value == &Json::Bool(true) {
        Ok(())
    } else {
        Err(Error::validation_on(&cx.model.name, Some(key), "reserved key expects `true`"))
    }
}
