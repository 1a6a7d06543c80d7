use super::Error;

/// What kind of schema item a query referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Model,
    Field,
    Relation,
    FieldOrRelation,
}

/// Error when a query names a model, field, or relation the schema does not
/// define.
///
/// The message always lists the names that *are* available so the caller can
/// spot a typo without consulting the schema.
#[derive(Debug)]
pub(super) struct SchemaReferenceError {
    kind: ReferenceKind,
    name: Box<str>,
    model: Option<Box<str>>,
    available: Vec<String>,
}

impl std::error::Error for SchemaReferenceError {}

impl core::fmt::Display for SchemaReferenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let what = match self.kind {
            ReferenceKind::Model => "model",
            ReferenceKind::Field => "field",
            ReferenceKind::Relation => "relation",
            ReferenceKind::FieldOrRelation => "field or relation",
        };

        write!(f, "unknown {what} `{}`", self.name)?;

        if let Some(model) = &self.model {
            write!(f, " on model `{model}`")?;
        }

        if !self.available.is_empty() {
            write!(f, " (available: {})", self.available.join(", "))?;
        }

        Ok(())
    }
}

impl Error {
    /// Creates a schema reference error.
    pub fn schema_reference<I, S>(
        kind: ReferenceKind,
        model: Option<&str>,
        name: &str,
        available: I,
    ) -> Error
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::from(super::ErrorKind::SchemaReference(SchemaReferenceError {
            kind,
            name: name.into(),
            model: model.map(Into::into),
            available: available.into_iter().map(Into::into).collect(),
        }))
    }

    /// A model name that is not registered with the schema.
    pub fn unknown_model<I, S>(name: &str, available: I) -> Error
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::schema_reference(ReferenceKind::Model, None, name, available)
    }

    /// A scalar field that the model does not declare.
    pub fn unknown_field<I, S>(model: &str, name: &str, available: I) -> Error
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::schema_reference(ReferenceKind::Field, Some(model), name, available)
    }

    /// A relation that the model does not declare.
    pub fn unknown_relation<I, S>(model: &str, name: &str, available: I) -> Error
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::schema_reference(ReferenceKind::Relation, Some(model), name, available)
    }

    /// A key that is neither a field nor a relation of the model.
    pub fn unknown_field_or_relation<I, S>(model: &str, name: &str, available: I) -> Error
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::schema_reference(ReferenceKind::FieldOrRelation, Some(model), name, available)
    }

    /// Returns `true` if this error is a schema reference error.
    pub fn is_schema_reference(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::SchemaReference(_)))
    }
}
