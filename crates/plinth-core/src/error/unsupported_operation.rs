use super::Error;

/// Error when a query uses a feature the compiler declares but does not
/// implement, such as JSON path filters or ordering by relation fields.
#[derive(Debug)]
pub(super) struct UnsupportedOperation {
    feature: Box<str>,
}

impl std::error::Error for UnsupportedOperation {}

impl core::fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unsupported operation: {}", self.feature)
    }
}

impl Error {
    /// Creates an unsupported operation error naming the feature.
    pub fn unsupported_operation(feature: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnsupportedOperation(UnsupportedOperation {
            feature: feature.into().into(),
        }))
    }

    /// Returns `true` if this error is an unsupported operation error.
    pub fn is_unsupported_operation(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::UnsupportedOperation(_)))
    }
}
