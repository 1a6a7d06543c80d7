use crate::dialect::{Dialect, Mysql, Postgresql, Sqlite};
use plinth_core::Result;

/// Compiler configuration.
///
/// Deserializes from camelCase JSON; every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    /// SQL dialect to emit
    pub dialect: DialectKind,

    /// Maximum number of relations a query may follow from its root model
    pub max_depth: usize,

    /// Append the model identifier to ORDER BY when paginating, so pages are
    /// stable even if the requested ordering has ties
    pub order_tiebreaker: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgresql,
    Sqlite,
    Mysql,
}

impl Config {
    pub fn from_json_str(src: &str) -> Result<Config> {
        Ok(serde_json::from_str(src)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dialect: DialectKind::default(),
            max_depth: 8,
            order_tiebreaker: false,
        }
    }
}

impl DialectKind {
    pub fn dialect(self) -> Box<dyn Dialect> {
        match self {
            DialectKind::Postgresql => Box::new(Postgresql),
            DialectKind::Sqlite => Box::new(Sqlite),
            DialectKind::Mysql => Box::new(Mysql),
        }
    }
}
