use super::{AggregateKind, Json, Object};
use crate::Result;

/// Arguments of one query, after upstream structural validation.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryArgs {
    /// Filter tree
    #[serde(rename = "where")]
    pub filter: Option<Object>,

    pub select: Option<Object>,

    pub include: Option<Object>,

    pub order_by: Option<OrderByArg>,

    pub take: Option<u64>,

    pub skip: Option<u64>,

    pub cursor: Option<Object>,

    pub distinct: Option<Fields>,

    #[serde(rename = "_count")]
    pub count: Option<Json>,

    #[serde(rename = "_sum")]
    pub sum: Option<Json>,

    #[serde(rename = "_avg")]
    pub avg: Option<Json>,

    #[serde(rename = "_min")]
    pub min: Option<Json>,

    #[serde(rename = "_max")]
    pub max: Option<Json>,

    /// Grouping fields
    pub by: Option<Fields>,

    pub having: Option<Object>,

    /// Mutation payload
    pub data: Option<Object>,
}

/// One ordering object or an ordered sequence of them.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum OrderByArg {
    One(Object),
    Many(Vec<Object>),
}

/// One field name or an ordered sequence of names.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Fields {
    One(String),
    Many(Vec<String>),
}

impl QueryArgs {
    /// Deserializes arguments from a JSON object.
    pub fn from_json(json: Json) -> Result<QueryArgs> {
        Ok(serde_json::from_value(json)?)
    }

    /// The payload given for an aggregate kind, if any.
    pub fn aggregate(&self, kind: AggregateKind) -> Option<&Json> {
        match kind {
            AggregateKind::Count => self.count.as_ref(),
            AggregateKind::Sum => self.sum.as_ref(),
            AggregateKind::Avg => self.avg.as_ref(),
            AggregateKind::Min => self.min.as_ref(),
            AggregateKind::Max => self.max.as_ref(),
        }
    }

    /// Argument keys that are set, as spelled in the input.
    pub fn present_keys(&self) -> Vec<&'static str> {
        let keys = [
            ("where", self.filter.is_some()),
            ("select", self.select.is_some()),
            ("include", self.include.is_some()),
            ("orderBy", self.order_by.is_some()),
            ("take", self.take.is_some()),
            ("skip", self.skip.is_some()),
            ("cursor", self.cursor.is_some()),
            ("distinct", self.distinct.is_some()),
            ("_count", self.count.is_some()),
            ("_sum", self.sum.is_some()),
            ("_avg", self.avg.is_some()),
            ("_min", self.min.is_some()),
            ("_max", self.max.is_some()),
            ("by", self.by.is_some()),
            ("having", self.having.is_some()),
            ("data", self.data.is_some()),
        ];

        keys.into_iter()
            .filter_map(|(key, present)| present.then_some(key))
            .collect()
    }
}

impl OrderByArg {
    pub fn entries(&self) -> &[Object] {
        match self {
            OrderByArg::One(entry) => core::slice::from_ref(entry),
            OrderByArg::Many(entries) => entries,
        }
    }
}

impl Fields {
    pub fn names(&self) -> &[String] {
        match self {
            Fields::One(name) => core::slice::from_ref(name),
            Fields::Many(names) => names,
        }
    }
}
