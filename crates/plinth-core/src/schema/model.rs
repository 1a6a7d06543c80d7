use super::{Field, Relation};
use crate::{Error, Result};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct Model {
    /// Name of the model
    pub name: String,

    /// If the schema specifies a table to map the model to, this is set.
    pub table: Option<String>,

    /// Scalar fields, keyed by name
    pub fields: IndexMap<String, Field>,

    /// Relations to other models, keyed by name
    pub relations: IndexMap<String, Relation>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Model {
        Model {
            name: name.into(),
            table: None,
            fields: IndexMap::new(),
            relations: IndexMap::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Model {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: Field) -> Model {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn relation(mut self, relation: Relation) -> Model {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    /// Name of the table backing this model
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn relation_by_name(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Looks up a scalar field, failing with a schema reference error that
    /// lists the model's fields.
    pub fn expect_field(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::unknown_field(&self.name, name, self.fields.keys().map(String::as_str)))
    }

    /// Looks up a relation, failing with a schema reference error that lists
    /// the model's relations.
    pub fn expect_relation(&self, name: &str) -> Result<&Relation> {
        self.relations.get(name).ok_or_else(|| {
            Error::unknown_relation(&self.name, name, self.relations.keys().map(String::as_str))
        })
    }

    /// Field names followed by relation names, in declaration order.
    pub fn available_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields
            .keys()
            .chain(self.relations.keys())
            .map(String::as_str)
    }

    /// Error for a key that is neither a field nor a relation.
    pub fn unknown_member(&self, name: &str) -> Error {
        Error::unknown_field_or_relation(&self.name, name, self.available_names())
    }

    /// Iterate over the fields making up the model's identifier.
    pub fn identifiers(&self) -> impl Iterator<Item = &Field> + '_ {
        self.fields.values().filter(|field| field.id)
    }
}
