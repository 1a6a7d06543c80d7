//! Composable SQL fragments.
//!
//! A [`Fragment`] is SQL text interleaved with bound values. Fragments are
//! composed by concatenation; placeholders are only numbered when the final
//! statement is serialized, so nested fragments never need renumbering and
//! literal values can never end up inlined in the SQL text.

mod params;
pub use params::{Params, Placeholder};

use crate::Dialect;
use plinth_core::Value;

/// Builds a [`Fragment`] from a sequence of pieces.
///
/// String pieces are trusted SQL text, [`Value`]s become bound parameters,
/// and fragments are spliced in. Pieces that are not a single token must be
/// parenthesized.
macro_rules! sql {
    ( $( $piece:tt )* ) => {{
        #[allow(unused_mut)]
        let mut fragment = $crate::fragment::Fragment::new();
        $(
            $crate::fragment::Piece::push_to($piece, &mut fragment);
        )*
        fragment
    }};
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Sql(String),
    Param(Value),
}

/// Something that can be appended to a fragment by `sql!`.
pub trait Piece {
    fn push_to(self, fragment: &mut Fragment);
}

impl Fragment {
    pub fn new() -> Fragment {
        Fragment::default()
    }

    /// A fragment made of trusted SQL text.
    pub fn sql(text: impl Into<String>) -> Fragment {
        let text = text.into();
        if text.is_empty() {
            return Fragment::new();
        }
        Fragment {
            parts: vec![Part::Sql(text)],
        }
    }

    /// A fragment made of a single bound value.
    pub fn param(value: impl Into<Value>) -> Fragment {
        Fragment {
            parts: vec![Part::Param(value.into())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn push_sql(&mut self, text: &str) -> &mut Fragment {
        if text.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(Part::Sql(last)) => last.push_str(text),
            _ => self.parts.push(Part::Sql(text.to_string())),
        }
        self
    }

    pub fn push_param(&mut self, value: Value) -> &mut Fragment {
        self.parts.push(Part::Param(value));
        self
    }

    pub fn append(&mut self, other: Fragment) -> &mut Fragment {
        for part in other.parts {
            match part {
                Part::Sql(text) => {
                    self.push_sql(&text);
                }
                Part::Param(value) => {
                    self.push_param(value);
                }
            }
        }
        self
    }

    /// Joins fragments with a separator.
    pub fn join(fragments: impl IntoIterator<Item = Fragment>, separator: &str) -> Fragment {
        let mut ret = Fragment::new();
        let mut s = "";
        for fragment in fragments {
            ret.push_sql(s).append(fragment);
            s = separator;
        }
        ret
    }

    /// Wraps the fragment in parentheses.
    pub fn parenthesized(self) -> Fragment {
        sql!("(" self ")")
    }

    /// Bound values, in the order their placeholders appear.
    pub fn params(&self) -> impl Iterator<Item = &Value> + '_ {
        self.parts.iter().filter_map(|part| match part {
            Part::Param(value) => Some(value),
            Part::Sql(_) => None,
        })
    }

    /// Serializes the fragment, pushing bound values into `params` and
    /// rendering their placeholders with the dialect's syntax.
    pub fn serialize(&self, dialect: &dyn Dialect, params: &mut impl Params) -> String {
        let mut ret = String::new();

        for part in &self.parts {
            match part {
                Part::Sql(text) => ret.push_str(text),
                Part::Param(value) => {
                    let placeholder = params.push(value);
                    ret.push_str(&dialect.placeholder(placeholder));
                }
            }
        }

        ret
    }
}

impl core::fmt::Display for Fragment {
    /// Renders the fragment with `?` for every bound value. Only meant for
    /// logs and diagnostics.
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        for part in &self.parts {
            match part {
                Part::Sql(text) => f.write_str(text)?,
                Part::Param(_) => f.write_str("?")?,
            }
        }
        Ok(())
    }
}

impl Piece for &str {
    fn push_to(self, fragment: &mut Fragment) {
        fragment.push_sql(self);
    }
}

impl Piece for String {
    fn push_to(self, fragment: &mut Fragment) {
        fragment.push_sql(&self);
    }
}

impl Piece for &String {
    fn push_to(self, fragment: &mut Fragment) {
        fragment.push_sql(self);
    }
}

impl Piece for Fragment {
    fn push_to(self, fragment: &mut Fragment) {
        fragment.append(self);
    }
}

impl Piece for &Fragment {
    fn push_to(self, fragment: &mut Fragment) {
        fragment.append(self.clone());
    }
}

impl Piece for Value {
    fn push_to(self, fragment: &mut Fragment) {
        fragment.push_param(self);
    }
}

impl Piece for crate::Alias {
    fn push_to(self, fragment: &mut Fragment) {
        fragment.push_sql(&self.to_string());
    }
}

impl Piece for u64 {
    fn push_to(self, fragment: &mut Fragment) {
        fragment.push_sql(&self.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Mysql, Postgresql, Sqlite};
    use pretty_assertions::assert_eq;

    #[test]
    fn adjacent_text_merges() {
        let fragment = sql!("a" " = " "b");
        assert_eq!(fragment, Fragment::sql("a = b"));
    }

    #[test]
    fn params_render_per_dialect() {
        let lhs = sql!("x = " (Value::from(1)));
        let fragment = sql!(lhs " AND y = " (Value::from("a")));

        let mut params: Vec<Value> = vec![];
        assert_eq!(
            fragment.serialize(&Postgresql, &mut params),
            "x = $1 AND y = $2"
        );
        assert_eq!(params, [Value::from(1), Value::from("a")]);

        assert_eq!(
            fragment.serialize(&Sqlite, &mut Vec::<Value>::new()),
            "x = ?1 AND y = ?2"
        );
        assert_eq!(fragment.serialize(&Mysql, &mut Vec::<Value>::new()), "x = ? AND y = ?");
    }

    #[test]
    fn join_skips_separator_for_single_item() {
        let joined = Fragment::join([Fragment::sql("a")], ", ");
        assert_eq!(joined.to_string(), "a");

        let joined = Fragment::join([Fragment::sql("a"), Fragment::param(2)], ", ");
        assert_eq!(joined.to_string(), "a, ?");
        assert_eq!(joined.params().collect::<Vec<_>>(), [&Value::from(2)]);
    }
}
