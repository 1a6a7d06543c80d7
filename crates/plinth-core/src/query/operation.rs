use crate::{Error, Result};

/// The finite set of operations the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    FindMany,
    FindFirst,
    FindUnique,
    Count,
    Aggregate,
    GroupBy,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::FindMany,
        Operation::FindFirst,
        Operation::FindUnique,
        Operation::Count,
        Operation::Aggregate,
        Operation::GroupBy,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::FindMany => "findMany",
            Operation::FindFirst => "findFirst",
            Operation::FindUnique => "findUnique",
            Operation::Count => "count",
            Operation::Aggregate => "aggregate",
            Operation::GroupBy => "groupBy",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Plain record reads.
    pub fn is_read(self) -> bool {
        matches!(
            self,
            Operation::FindMany | Operation::FindFirst | Operation::FindUnique
        )
    }

    /// Operations projecting aggregate expressions instead of records.
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            Operation::Count | Operation::Aggregate | Operation::GroupBy
        )
    }

    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::Create | Operation::Update | Operation::Delete
        )
    }

    /// True if the operation returns at most one record.
    pub fn is_single(self) -> bool {
        matches!(self, Operation::FindFirst | Operation::FindUnique)
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Operation> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::validation(format!("unknown operation `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_names() {
        for op in Operation::ALL {
            assert_eq!(op, op.as_str().parse::<Operation>().unwrap());
        }
    }

    #[test]
    fn parse_unknown() {
        let err = "upsert".parse::<Operation>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn classes_are_disjoint() {
        for op in Operation::ALL {
            let classes = [op.is_read(), op.is_aggregate(), op.is_mutation()];
            assert_eq!(1, classes.iter().filter(|c| **c).count(), "{op}");
        }
    }
}
