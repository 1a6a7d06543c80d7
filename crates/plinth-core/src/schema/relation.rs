use super::{Model, Schema};
use crate::{err, Result};

/// How two models relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl Cardinality {
    /// True if the relation can yield more than one target record.
    pub fn is_to_many(self) -> bool {
        matches!(self, Cardinality::OneToMany | Cardinality::ManyToMany)
    }

    pub fn is_to_one(self) -> bool {
        !self.is_to_many()
    }
}

impl core::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToMany => "many-to-many",
        })
    }
}

/// Handle to the target model of a relation.
///
/// The handle is resolved against the schema when a query is compiled rather
/// than when the relation is declared, so models may reference each other in
/// any order (including themselves).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef(String);

impl ModelRef {
    pub fn new(name: impl Into<String>) -> ModelRef {
        ModelRef(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn resolve<'a>(&self, schema: &'a Schema) -> Result<&'a Model> {
        schema.model(&self.0)
    }
}

/// Auxiliary table implementing a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    /// Junction table name
    pub table: String,

    /// Junction column referencing the relation's source model
    pub source: String,

    /// Junction column referencing the relation's target model
    pub target: String,
}

/// Which end of a relation holds the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The model declaring the relation
    Local,

    /// The related model
    Target,
}

#[derive(Debug, Clone)]
pub struct Relation {
    /// Relation name, as used in queries
    pub name: String,

    pub cardinality: Cardinality,

    /// Fields on the declaring model that participate in the link
    pub fields: Vec<String>,

    /// Fields on the target model, pairwise matched with `fields`
    pub references: Vec<String>,

    /// The related model
    pub target: ModelRef,

    /// Junction table, for many-to-many relations
    pub through: Option<Junction>,
}

impl Relation {
    pub fn new(name: impl Into<String>, cardinality: Cardinality, target: impl Into<String>) -> Relation {
        Relation {
            name: name.into(),
            cardinality,
            fields: vec![],
            references: vec![],
            target: ModelRef::new(target),
            through: None,
        }
    }

    pub fn one_to_one(name: impl Into<String>, target: impl Into<String>) -> Relation {
        Relation::new(name, Cardinality::OneToOne, target)
    }

    pub fn many_to_one(name: impl Into<String>, target: impl Into<String>) -> Relation {
        Relation::new(name, Cardinality::ManyToOne, target)
    }

    pub fn one_to_many(name: impl Into<String>, target: impl Into<String>) -> Relation {
        Relation::new(name, Cardinality::OneToMany, target)
    }

    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Relation {
        Relation::new(name, Cardinality::ManyToMany, target)
    }

    pub fn fields<I, S>(mut self, fields: I) -> Relation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn references<I, S>(mut self, references: I) -> Relation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    pub fn through(
        mut self,
        table: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Relation {
        self.through = Some(Junction {
            table: table.into(),
            source: source.into(),
            target: target.into(),
        });
        self
    }

    /// Resolves the target model.
    pub fn target<'a>(&self, schema: &'a Schema) -> Result<&'a Model> {
        self.target.resolve(schema).map_err(|e| {
            e.context(err!(
                "relation `{}` targets a model that is not registered",
                self.name
            ))
        })
    }

    /// Pairs of (local field, referenced field).
    pub fn link_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields
            .iter()
            .zip(&self.references)
            .map(|(local, target)| (local.as_str(), target.as_str()))
    }

    /// Which end holds the foreign key. Many-to-many relations keep their
    /// foreign keys in the junction table; this returns `Target` for them
    /// since the not-null guard then applies to the junction side.
    pub fn foreign_key_side(&self, source: &Model) -> Side {
        match self.cardinality {
            Cardinality::ManyToOne => Side::Local,
            Cardinality::OneToMany | Cardinality::ManyToMany => Side::Target,
            Cardinality::OneToOne => {
                let local_is_identifier = self
                    .fields
                    .iter()
                    .all(|name| source.field_by_name(name).is_some_and(|field| field.id));

                if local_is_identifier {
                    Side::Target
                } else {
                    Side::Local
                }
            }
        }
    }
}
