/// The five aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 5] = [
        AggregateKind::Count,
        AggregateKind::Sum,
        AggregateKind::Avg,
        AggregateKind::Min,
        AggregateKind::Max,
    ];

    /// The reserved argument key, e.g. `_sum`.
    pub fn key(self) -> &'static str {
        match self {
            AggregateKind::Count => "_count",
            AggregateKind::Sum => "_sum",
            AggregateKind::Avg => "_avg",
            AggregateKind::Min => "_min",
            AggregateKind::Max => "_max",
        }
    }

    pub fn from_key(key: &str) -> Option<AggregateKind> {
        AggregateKind::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Only `_count: true` has a global (whole-row) form.
    pub fn supports_global(self) -> bool {
        matches!(self, AggregateKind::Count)
    }

    /// True if the aggregate needs a numeric column.
    pub fn requires_numeric(self) -> bool {
        matches!(self, AggregateKind::Sum | AggregateKind::Avg)
    }
}

impl core::fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.key())
    }
}
