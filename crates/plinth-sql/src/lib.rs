#[macro_use]
pub mod fragment;
pub use fragment::{Fragment, Params, Placeholder};

mod alias;
pub use alias::{Alias, Aliases};

mod clause;

pub mod compiler;
pub use compiler::{Compiler, Statement};

mod config;
pub use config::{Config, DialectKind};

pub mod context;
pub use context::Context;

pub mod dialect;
pub use dialect::Dialect;
