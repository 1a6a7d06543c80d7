//! Read-only description of the data model the compiler targets.

mod builder;
pub use builder::Builder;

mod field;
pub use field::Field;

mod model;
pub use model::Model;

mod relation;
pub use relation::{Cardinality, Junction, ModelRef, Relation, Side};

mod ty;
pub use ty::Type;

mod verify;

use crate::{Error, Result};
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct Schema {
    /// Models keyed by name, in registration order
    pub models: IndexMap<String, Model>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Get a model by name
    pub fn model(&self, name: &str) -> Result<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| Error::unknown_model(name, self.models.keys().map(String::as_str)))
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }
}
