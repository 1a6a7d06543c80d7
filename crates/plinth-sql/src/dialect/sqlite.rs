use super::{json_pairs, Dialect, JsonColumn};
use crate::{Alias, Context, Fragment, Placeholder};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn placeholder(&self, placeholder: Placeholder) -> String {
        format!("?{}", placeholder.0)
    }

    fn like(&self, _cx: &Context<'_>, expr: Fragment, pattern: Fragment) -> Fragment {
        // SQLite has no default escape character
        sql!(expr " LIKE " pattern " ESCAPE '\\'")
    }

    fn limit_offset(&self, _cx: &Context<'_>, take: Option<u64>, skip: Option<u64>) -> Option<Fragment> {
        match (take, skip) {
            (None, None) => None,
            (Some(take), None) => Some(sql!("LIMIT " take)),
            // OFFSET is only valid after a LIMIT
            (None, Some(skip)) => Some(sql!("LIMIT -1 OFFSET " skip)),
            (Some(take), Some(skip)) => Some(sql!("LIMIT " take " OFFSET " skip)),
        }
    }

    fn json_array_agg(&self, _cx: &Context<'_>, subquery: Fragment, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        let object = self.json_object(alias, columns);
        sql!("(SELECT json_group_array(" object ") FROM (" subquery ") AS " alias ")")
    }

    fn json_row(&self, _cx: &Context<'_>, subquery: Fragment, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        let object = self.json_object(alias, columns);
        sql!("(SELECT " object " FROM (" subquery ") AS " alias ")")
    }
}

impl Sqlite {
    fn json_object(&self, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        // Nested relations come back as text and must be re-parsed, otherwise
        // they are embedded as JSON strings.
        let pairs = json_pairs(self, alias, columns, |value| sql!("json(" value ")"));
        sql!("json_object(" pairs ")")
    }
}
