use super::{json_pairs, Dialect, JsonColumn};
use crate::{Alias, Context, Fragment, Placeholder};
use plinth_core::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgresql;

impl Dialect for Postgresql {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn quote(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn placeholder(&self, placeholder: Placeholder) -> String {
        format!("${}", placeholder.0)
    }

    fn distinct_on(&self, _cx: &Context<'_>, columns: Vec<Fragment>) -> Result<Fragment> {
        Ok(sql!("DISTINCT ON (" (Fragment::join(columns, ", ")) ") "))
    }

    fn json_array_agg(&self, _cx: &Context<'_>, subquery: Fragment, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        let object = self.json_object(alias, columns);
        sql!("(SELECT COALESCE(json_agg(" object "), '[]'::json) FROM (" subquery ") AS " alias ")")
    }

    fn json_row(&self, _cx: &Context<'_>, subquery: Fragment, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        let object = self.json_object(alias, columns);
        sql!("(SELECT " object " FROM (" subquery ") AS " alias ")")
    }
}

impl Postgresql {
    fn json_object(&self, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        // Nested relations are already `json`, so no wrapping is needed.
        sql!("json_build_object(" (json_pairs(self, alias, columns, |value| value)) ")")
    }
}
