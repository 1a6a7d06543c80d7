use super::{Cardinality, Model, Relation, Schema};
use crate::{Error, Result};

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        for model in self.schema.models() {
            self.verify_model_has_identifier(model)?;

            for relation in model.relations.values() {
                self.verify_relation_fields(model, relation)?;
                self.verify_junction(model, relation)?;
            }

            self.verify_member_names_are_unique(model)?;
        }

        Ok(())
    }

    fn verify_model_has_identifier(&self, model: &Model) -> Result<()> {
        if model.identifiers().next().is_none() {
            return Err(Error::invalid_schema(format!(
                "model `{}` has no identifier field",
                model.name
            )));
        }
        Ok(())
    }

    fn verify_relation_fields(&self, model: &Model, relation: &Relation) -> Result<()> {
        if relation.fields.is_empty() || relation.fields.len() != relation.references.len() {
            return Err(Error::invalid_schema(format!(
                "relation `{}.{}` must pair each local field with exactly one referenced field",
                model.name, relation.name
            )));
        }

        for field in &relation.fields {
            if model.field_by_name(field).is_none() {
                return Err(Error::invalid_schema(format!(
                    "relation `{}.{}` uses unknown local field `{field}`",
                    model.name, relation.name
                )));
            }
        }

        Ok(())
    }

    fn verify_junction(&self, model: &Model, relation: &Relation) -> Result<()> {
        match (relation.cardinality, &relation.through) {
            (Cardinality::ManyToMany, None) => Err(Error::invalid_schema(format!(
                "many-to-many relation `{}.{}` needs a junction table",
                model.name, relation.name
            ))),
            (Cardinality::ManyToMany, Some(_)) if relation.fields.len() != 1 => {
                Err(Error::invalid_schema(format!(
                    "many-to-many relation `{}.{}` must link through a single key",
                    model.name, relation.name
                )))
            }
            (Cardinality::ManyToMany, Some(_)) => Ok(()),
            (_, Some(_)) => Err(Error::invalid_schema(format!(
                "only many-to-many relations may declare a junction table (`{}.{}` is {})",
                model.name, relation.name, relation.cardinality
            ))),
            (_, None) => Ok(()),
        }
    }

    fn verify_member_names_are_unique(&self, model: &Model) -> Result<()> {
        for name in model.relations.keys() {
            if model.fields.contains_key(name) {
                return Err(Error::invalid_schema(format!(
                    "model `{}` declares `{name}` as both a field and a relation",
                    model.name
                )));
            }
        }
        Ok(())
    }
}
