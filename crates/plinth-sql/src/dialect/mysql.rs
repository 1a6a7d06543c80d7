use super::{json_pairs, Dialect, Direction, JsonColumn, Nulls};
use crate::{Alias, Context, Fragment, Placeholder};
use plinth_core::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct Mysql;

impl Dialect for Mysql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn placeholder(&self, _placeholder: Placeholder) -> String {
        "?".to_string()
    }

    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn order_by_item(
        &self,
        _cx: &Context<'_>,
        expr: Fragment,
        direction: Direction,
        nulls: Option<Nulls>,
    ) -> Result<Fragment> {
        if nulls.is_some() {
            return Err(Error::unsupported_operation("NULLS FIRST/LAST ordering on MySQL"));
        }
        Ok(sql!(expr " " (direction.as_str())))
    }

    fn limit_offset(&self, _cx: &Context<'_>, take: Option<u64>, skip: Option<u64>) -> Option<Fragment> {
        match (take, skip) {
            (None, None) => None,
            (Some(take), None) => Some(sql!("LIMIT " take)),
            // OFFSET is only valid after a LIMIT
            (None, Some(skip)) => Some(sql!("LIMIT " (u64::MAX) " OFFSET " skip)),
            (Some(take), Some(skip)) => Some(sql!("LIMIT " take " OFFSET " skip)),
        }
    }

    fn insert(&self, _cx: &Context<'_>, table: &str, columns: Vec<&str>, values: Vec<Fragment>) -> Fragment {
        if columns.is_empty() {
            return sql!("INSERT INTO " (self.quote(table)) " () VALUES ()");
        }

        let columns = Fragment::join(columns.into_iter().map(|c| Fragment::sql(self.quote(c))), ", ");
        let values = Fragment::join(values, ", ");
        sql!("INSERT INTO " (self.quote(table)) " (" columns ") VALUES (" values ")")
    }

    fn delete(&self, _cx: &Context<'_>, table: &str, alias: Alias) -> Fragment {
        // MySQL only accepts an aliased table in the multi-table form
        sql!("DELETE " alias " FROM " (self.table(table, alias)))
    }

    fn json_array_agg(&self, _cx: &Context<'_>, subquery: Fragment, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        let object = self.json_object(alias, columns);
        sql!("(SELECT COALESCE(JSON_ARRAYAGG(" object "), JSON_ARRAY()) FROM (" subquery ") AS " alias ")")
    }

    fn json_row(&self, _cx: &Context<'_>, subquery: Fragment, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        let object = self.json_object(alias, columns);
        sql!("(SELECT " object " FROM (" subquery ") AS " alias ")")
    }
}

impl Mysql {
    fn json_object(&self, alias: Alias, columns: &[JsonColumn]) -> Fragment {
        sql!("JSON_OBJECT(" (json_pairs(self, alias, columns, |value| value)) ")")
    }
}
