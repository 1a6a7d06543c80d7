//! Structured query arguments, as produced by the upstream validator.
//!
//! Filter, selection and ordering payloads stay as ordered JSON objects: the
//! compiler dispatches on their keys against the schema, and key order is
//! significant (multi-key filters are ANDed in input order).

mod aggregate;
pub use aggregate::AggregateKind;

mod args;
pub use args::{Fields, OrderByArg, QueryArgs};

mod operation;
pub use operation::Operation;

mod value;
pub use value::Value;

/// A JSON value as found in query arguments.
pub use serde_json::Value as Json;

/// An ordered JSON object.
pub type Object = serde_json::Map<String, Json>;
