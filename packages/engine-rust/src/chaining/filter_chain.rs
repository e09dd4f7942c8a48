//! Chain-of-responsibility continuation handed to each filter.

use std::cell::Cell;

use things_core::{ThingsMessage, ThingsResponse};

use super::table::RegisteredFilter;

/// "The rest of the filter chain", as seen by one filter.
///
/// Consumed by [`proceed`](FilterChain::proceed), so a filter can run the
/// remainder of the chain at most once. Dropping it without proceeding stops
/// the dispatch: later filters, interceptors and handlers do not run.
pub struct FilterChain<'a> {
    filters: &'a [RegisteredFilter],
    reached_end: &'a Cell<bool>,
}

impl<'a> FilterChain<'a> {
    pub(crate) fn new(filters: &'a [RegisteredFilter], reached_end: &'a Cell<bool>) -> Self {
        Self {
            filters,
            reached_end,
        }
    }

    /// Hands the message to the next filter, or marks the chain as passed
    /// when no filter is left.
    ///
    /// # Errors
    ///
    /// Returns whatever error a downstream filter returns.
    pub fn proceed(self, message: &ThingsMessage, response: &mut ThingsResponse) -> anyhow::Result<()> {
        match self.filters.split_first() {
            Some((current, rest)) => {
                let next = FilterChain::new(rest, self.reached_end);
                current.plugin().apply(message, response, next)
            }
            None => {
                self.reached_end.set(true);
                Ok(())
            }
        }
    }

    /// Number of filters still ahead in the chain.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.filters.len()
    }
}
