use super::Compilation;
use crate::{Context, Fragment};

impl Compilation<'_> {
    /// `LIMIT <take> OFFSET <skip>`, omitting whichever is absent.
    pub(crate) fn limit(&self, cx: &Context<'_>, take: Option<u64>, skip: Option<u64>) -> Option<Fragment> {
        let limit = self.dialect.limit_offset(cx, take, skip);

        if let Some(limit) = &limit {
            tracing::trace!(?take, ?skip, %limit, "compiled limit");
        }

        limit
    }
}
