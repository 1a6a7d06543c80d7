//! Relation subquery synthesizer.
//!
//! A relation condition becomes a correlated `SELECT 1 FROM <target> AS tN
//! WHERE ...` whose predicate is built as an internal filter object: the
//! caller's nested filter under `AND` (or `NOT` for `every`), followed by a
//! reserved key asking for the link back to the parent row. The filter
//! compiler expands the reserved keys through [`Compilation::link`],
//! [`Compilation::junction`] and [`Compilation::parent_equalities`].

use super::{
    filter::{JUNCTION, LINK},
    json_kind, Compilation, Scope, Select,
};
use crate::{Context, Fragment};
use plinth_core::{
    query::{Json, Object},
    schema::{Cardinality, Relation, Side},
    Error, Result,
};

/// Keywords of a relation condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Some,
    Every,
    None,
    Is,
    IsNot,
}

impl Keyword {
    fn from_key(key: &str) -> Option<Keyword> {
        match key {
            "some" => Some(Keyword::Some),
            "every" => Some(Keyword::Every),
            "none" => Some(Keyword::None),
            "is" => Some(Keyword::Is),
            "isNot" => Some(Keyword::IsNot),
            _ => None,
        }
    }

    fn is_to_many(self) -> bool {
        matches!(self, Keyword::Some | Keyword::Every | Keyword::None)
    }
}

impl<'a> Compilation<'a> {
    /// Compiles the condition on one relation of the context's model.
    pub(crate) fn relation_filter(&mut self, cx: &Context<'a>, relation: &'a Relation, value: &Json) -> Result<Fragment> {
        let condition = match value {
            // `author: null` is shorthand for `author: { is: null }`
            Json::Null if relation.cardinality.is_to_one() => {
                return self.relation_keyword(cx, relation, Keyword::Is, value);
            }
            Json::Object(condition) => condition,
            _ => {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(&relation.name),
                    format!("relation conditions must be objects, got {}", json_kind(value)),
                ))
            }
        };

        let keywords = condition
            .keys()
            .filter(|key| Keyword::from_key(key).is_some())
            .count();

        if keywords == 0 {
            let child = self.descend(cx, relation)?;
            let subquery = self.relation_subquery(&child, Nested::Matching(condition))?;
            return Ok(self.dialect.relation_direct(cx, subquery));
        }

        if keywords != condition.len() {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(&relation.name),
                "relation keywords cannot be mixed with field conditions",
            ));
        }

        let mut operands = vec![];
        for (key, value) in condition {
            if let Some(keyword) = Keyword::from_key(key) {
                operands.push(self.relation_keyword(cx, relation, keyword, value)?);
            }
        }

        Ok(self.dialect.and(cx, operands))
    }

    fn relation_keyword(
        &mut self,
        cx: &Context<'a>,
        relation: &'a Relation,
        keyword: Keyword,
        value: &Json,
    ) -> Result<Fragment> {
        if keyword.is_to_many() != relation.cardinality.is_to_many() {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(&relation.name),
                format!(
                    "`{}` cannot be used on {} relation `{}`",
                    match keyword {
                        Keyword::Some => "some",
                        Keyword::Every => "every",
                        Keyword::None => "none",
                        Keyword::Is => "is",
                        Keyword::IsNot => "isNot",
                    },
                    relation.cardinality,
                    relation.name
                ),
            ));
        }

        // `is: null` and `isNot: null` test for the related record itself.
        if value.is_null() && matches!(keyword, Keyword::Is | Keyword::IsNot) {
            let child = self.descend(cx, relation)?;
            let subquery = self.relation_subquery(&child, Nested::Any)?;
            return Ok(match keyword {
                Keyword::Is => self.dialect.relation_none(cx, subquery),
                _ => self.dialect.relation_direct(cx, subquery),
            });
        }

        let Json::Object(nested) = value else {
            return Err(Error::validation_on(
                &cx.model.name,
                Some(&relation.name),
                format!("relation keywords expect an object, got {}", json_kind(value)),
            ));
        };

        // Every record of an unconstrained set matches.
        if keyword == Keyword::Every && nested.is_empty() {
            return Ok(self.dialect.literal_true(cx));
        }

        let child = self.descend(cx, relation)?;

        Ok(match keyword {
            Keyword::Some => {
                let subquery = self.relation_subquery(&child, Nested::Matching(nested))?;
                self.dialect.relation_some(cx, subquery)
            }
            Keyword::Every => {
                let subquery = self.relation_subquery(&child, Nested::NotMatching(nested))?;
                self.dialect.relation_every(cx, subquery)
            }
            Keyword::None => {
                let subquery = self.relation_subquery(&child, Nested::Matching(nested))?;
                self.dialect.relation_none(cx, subquery)
            }
            Keyword::Is => {
                let subquery = self.relation_subquery(&child, Nested::Matching(nested))?;
                self.dialect.relation_direct(cx, subquery)
            }
            Keyword::IsNot => {
                let subquery = self.relation_subquery(&child, Nested::Matching(nested))?;
                self.dialect.relation_none(cx, subquery)
            }
        })
    }

    /// `SELECT 1 FROM <target> AS <child alias> WHERE <nested> AND <link>`
    fn relation_subquery(&mut self, child: &Context<'a>, nested: Nested<'_>) -> Result<Fragment> {
        let Some(relation) = child.relation else {
            return Err(Error::validation_on(&child.model.name, None, "relation subquery without a relation"));
        };

        let mut filter = Object::new();
        match nested {
            Nested::Any => {}
            Nested::Matching(nested) if nested.is_empty() => {}
            Nested::Matching(nested) => {
                filter.insert("AND".to_string(), Json::Object(nested.clone()));
            }
            Nested::NotMatching(nested) => {
                filter.insert("NOT".to_string(), Json::Object(nested.clone()));
            }
        }

        let marker = match relation.cardinality {
            Cardinality::ManyToMany => JUNCTION,
            _ => LINK,
        };
        filter.insert(marker.to_string(), Json::Bool(true));

        let predicate = self.filter(child, &filter, Scope::Internal)?;
        Ok(self.subquery_body(child, predicate))
    }

    fn subquery_body(&self, child: &Context<'a>, predicate: Option<Fragment>) -> Fragment {
        self.assemble(
            child,
            Select {
                projection: Fragment::sql("1"),
                source: self.dialect.table(child.model.table_name(), child.alias),
                filter: predicate,
                ..Select::default()
            },
        )
    }

    /// Link between a relation subquery and its parent row: the foreign key
    /// equalities followed by a not-null guard on the foreign key.
    pub(crate) fn link(&mut self, cx: &Context<'a>) -> Result<Vec<Fragment>> {
        let (relation, parent) = correlation(cx)?;

        if relation.cardinality == Cardinality::ManyToMany {
            return Ok(vec![self.junction(cx)?]);
        }

        let mut operands = vec![];
        let mut guards = vec![];

        for (local, referenced) in relation.link_pairs() {
            let child_column = self.dialect.column(cx.alias, referenced);
            let parent_column = self.dialect.column(parent.alias, local);

            guards.push(match relation.foreign_key_side(parent.model) {
                Side::Target => child_column.clone(),
                Side::Local => parent_column.clone(),
            });
            operands.push(self.dialect.eq(cx, child_column, parent_column));
        }

        for guard in guards {
            operands.push(self.dialect.is_not_null(cx, guard));
        }

        Ok(operands)
    }

    /// `EXISTS (SELECT 1 FROM <junction> AS tN WHERE tN.<target> = child.<key>
    /// AND tN.<source> = parent.<key>)`
    pub(crate) fn junction(&mut self, cx: &Context<'a>) -> Result<Fragment> {
        let (relation, parent) = correlation(cx)?;

        let (Some(junction), Some((local, referenced))) = (&relation.through, relation.link_pairs().next()) else {
            return Err(Error::validation_on(
                &parent.model.name,
                Some(&relation.name),
                "junction check on a relation without a junction table",
            ));
        };

        let alias = self.aliases.next();

        let target_eq = self.dialect.eq(
            cx,
            self.dialect.column(alias, &junction.target),
            self.dialect.column(cx.alias, referenced),
        );
        let source_eq = self.dialect.eq(
            cx,
            self.dialect.column(alias, &junction.source),
            self.dialect.column(parent.alias, local),
        );

        let subquery = self.assemble(
            cx,
            Select {
                projection: Fragment::sql("1"),
                source: self.dialect.table(&junction.table, alias),
                filter: Some(self.dialect.and(cx, vec![target_eq, source_eq])),
                ..Select::default()
            },
        );

        Ok(self.dialect.exists(cx, subquery))
    }

    /// `child.<column> = parent.<column>` for each entry of `pairs`, which
    /// maps child columns to parent columns.
    pub(crate) fn parent_equalities(&mut self, cx: &Context<'a>, pairs: &Object) -> Result<Vec<Fragment>> {
        let (_, parent) = correlation(cx)?;

        if pairs.is_empty() {
            return Err(Error::validation_on(&cx.model.name, None, "parent reference without columns"));
        }

        let mut operands = Vec::with_capacity(pairs.len());
        for (child_column, parent_column) in pairs {
            let Some(parent_column) = parent_column.as_str() else {
                return Err(Error::validation_on(
                    &cx.model.name,
                    Some(child_column),
                    "parent reference expects a column name",
                ));
            };

            cx.model.expect_field(child_column)?;
            parent.model.expect_field(parent_column)?;

            operands.push(self.dialect.eq(
                cx,
                self.dialect.column(cx.alias, child_column),
                self.dialect.column(parent.alias, parent_column),
            ));
        }

        Ok(operands)
    }
}

/// How the caller's nested filter applies to the related records.
#[derive(Debug, Clone, Copy)]
enum Nested<'f> {
    /// No condition beyond the link
    Any,
    Matching(&'f Object),
    NotMatching(&'f Object),
}

fn correlation<'a>(cx: &Context<'a>) -> Result<(&'a Relation, crate::context::Parent<'a>)> {
    match (cx.relation, cx.parent) {
        (Some(relation), Some(parent)) => Ok((relation, parent)),
        _ => Err(Error::validation_on(
            &cx.model.name,
            None,
            "reserved keys are only valid inside a relation subquery",
        )),
    }
}
