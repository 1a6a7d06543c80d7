/// A per-compilation table alias, rendered as `t0`, `t1`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alias(pub usize);

impl core::fmt::Display for Alias {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Hands out aliases in strictly increasing order.
///
/// One generator is scoped to one top-level compilation call. Two
/// compilations of the same query therefore assign identical aliases, and
/// concurrent compilations never share a counter.
#[derive(Debug, Default)]
pub struct Aliases {
    next: usize,
}

impl Aliases {
    pub fn new() -> Aliases {
        Aliases::default()
    }

    pub fn next(&mut self) -> Alias {
        let alias = Alias(self.next);
        self.next += 1;
        tracing::trace!(%alias, "allocated table alias");
        alias
    }

    /// Number of aliases handed out so far.
    pub fn len(&self) -> usize {
        self.next
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }
}
