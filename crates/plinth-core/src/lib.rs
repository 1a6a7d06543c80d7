mod error;
pub use error::{Error, IntoError, ReferenceKind};

pub mod query;
pub use query::{Operation, QueryArgs, Value};

pub mod schema;
pub use schema::Schema;

/// A Result type alias that uses plinth's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
