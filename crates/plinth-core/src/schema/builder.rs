use super::{Model, Schema};
use crate::{Error, Result};
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct Builder {
    /// If set, prefix all table names with this string
    table_name_prefix: Option<String>,

    models: Vec<Model>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn model(&mut self, model: Model) -> &mut Self {
        self.models.push(model);
        self
    }

    pub fn build(&mut self) -> Result<Schema> {
        let mut models = IndexMap::new();

        for mut model in self.models.drain(..) {
            if let Some(prefix) = &self.table_name_prefix {
                model.table = Some(format!("{prefix}{}", model.table_name()));
            }

            let name = model.name.clone();
            if models.insert(name.clone(), model).is_some() {
                return Err(Error::invalid_schema(format!("duplicate model `{name}`")));
            }
        }

        let schema = Schema { models };

        // Verify the schema structure. Relation targets are deliberately not
        // resolved here; see `Relation::target`.
        schema.verify()?;

        Ok(schema)
    }
}
