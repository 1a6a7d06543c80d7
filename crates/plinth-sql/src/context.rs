//! Per-call compilation context.
//!
//! A [`Context`] is an immutable value describing where in the query tree a
//! clause is being compiled: which model, under which alias, for which
//! operation, and (inside a relation subquery) which parent it correlates
//! with. Descending into a relation derives a new context; nothing is ever
//! mutated in place.

use crate::Alias;
use plinth_core::{
    query::Object,
    schema::{Field, Model, Relation},
    Operation, Result,
};

#[derive(Debug, Clone)]
pub struct Context<'a> {
    /// Model whose table is in scope
    pub model: &'a Model,

    pub operation: Operation,

    /// Alias of the model's table in the current (sub)query
    pub alias: Alias,

    /// Field being compiled, when compiling a single field's condition
    pub field: Option<&'a Field>,

    /// Relation followed to reach this model
    pub relation: Option<&'a Relation>,

    /// The enclosing query this context correlates with
    pub parent: Option<Parent<'a>>,

    /// Operation-specific information
    pub extension: Extension<'a>,

    /// Number of relations followed from the root
    pub depth: usize,

    /// Names of the models from the root down to this one
    pub path: Vec<&'a str>,
}

/// The enclosing query of a correlated subquery.
#[derive(Debug, Clone, Copy)]
pub struct Parent<'a> {
    pub model: &'a Model,
    pub alias: Alias,
}

/// Operation-specific context. Reads carry pagination, mutations carry their
/// payload; a context never carries both.
#[derive(Debug, Clone, Default)]
pub enum Extension<'a> {
    #[default]
    None,
    Pagination(Pagination<'a>),
    Mutation(&'a Object),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pagination<'a> {
    pub take: Option<u64>,
    pub skip: Option<u64>,
    pub cursor: Option<&'a Object>,
    pub distinct: Option<&'a [String]>,
}

#[derive(Debug)]
pub struct Builder<'a> {
    cx: Context<'a>,
    field: Option<String>,
    relation: Option<String>,
}

impl<'a> Context<'a> {
    pub fn builder(model: &'a Model, operation: Operation, alias: Alias) -> Builder<'a> {
        Builder {
            cx: Context {
                model,
                operation,
                alias,
                field: None,
                relation: None,
                parent: None,
                extension: Extension::None,
                depth: 0,
                path: vec![model.name.as_str()],
            },
            field: None,
            relation: None,
        }
    }

    pub fn parent_alias(&self) -> Option<Alias> {
        self.parent.map(|parent| parent.alias)
    }

    pub fn pagination(&self) -> Option<&Pagination<'a>> {
        match &self.extension {
            Extension::Pagination(pagination) => Some(pagination),
            _ => None,
        }
    }

    pub fn mutation(&self) -> Option<&'a Object> {
        match self.extension {
            Extension::Mutation(data) => Some(data),
            _ => None,
        }
    }

    /// Derives the context of a correlated subquery over `model`, reached from
    /// this context by following `relation`.
    pub fn nested(&self, relation: &'a Relation, model: &'a Model, alias: Alias) -> Context<'a> {
        let mut path = self.path.clone();
        path.push(model.name.as_str());

        Context {
            model,
            operation: self.operation,
            alias,
            field: None,
            relation: Some(relation),
            parent: Some(Parent {
                model: self.model,
                alias: self.alias,
            }),
            extension: Extension::None,
            depth: self.depth + 1,
            path,
        }
    }

    /// Same scope, narrowed to one field.
    pub fn with_field(&self, field: &'a Field) -> Context<'a> {
        Context {
            field: Some(field),
            ..self.clone()
        }
    }

    /// Same model under a different alias, e.g. an outer query over a
    /// derived table.
    pub fn with_alias(&self, alias: Alias) -> Context<'a> {
        Context {
            alias,
            ..self.clone()
        }
    }

    /// `User > Post > Comment`
    pub fn path_display(&self) -> String {
        self.path.join(" > ")
    }
}

impl<'a> Builder<'a> {
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.field = Some(name.into());
        self
    }

    pub fn relation(mut self, name: impl Into<String>) -> Self {
        self.relation = Some(name.into());
        self
    }

    pub fn parent(mut self, model: &'a Model, alias: Alias) -> Self {
        self.cx.parent = Some(Parent { model, alias });
        self
    }

    pub fn pagination(mut self, pagination: Pagination<'a>) -> Self {
        self.cx.extension = Extension::Pagination(pagination);
        self
    }

    pub fn mutation(mut self, data: &'a Object) -> Self {
        self.cx.extension = Extension::Mutation(data);
        self
    }

    /// Validates the requested field and relation against the model.
    pub fn build(self) -> Result<Context<'a>> {
        let mut cx = self.cx;

        if let Some(name) = &self.field {
            cx.field = Some(cx.model.expect_field(name)?);
        }

        if let Some(name) = &self.relation {
            cx.relation = Some(cx.model.expect_relation(name)?);
        }

        tracing::trace!(
            model = %cx.model.name,
            operation = %cx.operation,
            alias = %cx.alias,
            "created compilation context"
        );

        Ok(cx)
    }
}
