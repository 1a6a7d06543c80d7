use super::Error;

/// Error when a query argument is malformed: a bad order direction, an empty
/// logical operator, a relation keyword used with the wrong cardinality.
#[derive(Debug)]
pub(super) struct ValidationError {
    message: Box<str>,
    model: Option<Box<str>>,
    field: Option<Box<str>>,
}

impl std::error::Error for ValidationError {}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match (&self.model, &self.field) {
            (Some(model), Some(field)) => {
                write!(f, "invalid query on `{model}.{field}`: {}", self.message)
            }
            (Some(model), None) => write!(f, "invalid query on `{model}`: {}", self.message),
            _ => write!(f, "invalid query: {}", self.message),
        }
    }
}

impl Error {
    /// Creates a validation error that is not tied to a model.
    pub fn validation(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Validation(ValidationError {
            message: message.into().into(),
            model: None,
            field: None,
        }))
    }

    /// Creates a validation error naming the offending model and, when known,
    /// the offending field.
    pub fn validation_on(model: &str, field: Option<&str>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Validation(ValidationError {
            message: message.into().into(),
            model: Some(model.into()),
            field: field.map(Into::into),
        }))
    }

    /// Returns `true` if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Validation(_)))
    }
}
