//! Chain resolution: candidate routing keys -> ordered filters, interceptors, handlers.

use std::collections::HashSet;
use std::sync::Arc;

use things_core::{MethodType, StreamDirection, ThingsMessage, ThingsResponse};

use super::keys::ChainingKeys;
use super::table::{
    Registered, RegisteredFilter, RegisteredHandler, RegisteredInterceptor, RoutingSlot, RoutingTable,
};
use crate::traits::Handler;

// ---------------------------------------------------------------------------
// ChainBundle
// ---------------------------------------------------------------------------

/// The resolved plugins for one route signature, each list in execution order.
///
/// Immutable once built; shared between concurrent dispatches via `Arc`.
#[derive(Debug, Default)]
pub struct ChainBundle {
    pub filters: Vec<RegisteredFilter>,
    pub interceptors: Vec<RegisteredInterceptor>,
    pub handlers: Vec<RegisteredHandler>,
}

impl ChainBundle {
    /// Registration sequence numbers per kind, for comparing bundles.
    #[must_use]
    pub fn signature(&self) -> (Vec<u64>, Vec<u64>, Vec<u64>) {
        (
            self.filters.iter().map(|r| r.seq()).collect(),
            self.interceptors.iter().map(|r| r.seq()).collect(),
            self.handlers.iter().map(|r| r.seq()).collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// ChainResolver
// ---------------------------------------------------------------------------

/// Scans the routing table for every candidate key and merges the results.
pub struct ChainResolver {
    table: Arc<dyn RoutingTable>,
}

impl ChainResolver {
    #[must_use]
    pub fn new(table: Arc<dyn RoutingTable>) -> Self {
        Self { table }
    }

    /// Resolves the chain for `keys`.
    ///
    /// Each candidate key is looked up exactly once. Matches from all keys
    /// are unioned without duplicates, narrowed to the stream direction and
    /// method type (and, for handlers, to those whose `can_handle` accepts
    /// the message), then sorted by `(order, registration sequence)`.
    #[must_use]
    pub fn resolve(
        &self,
        keys: &ChainingKeys,
        direction: StreamDirection,
        message: &ThingsMessage,
        response: &ThingsResponse,
    ) -> ChainBundle {
        let slots: Vec<&RoutingSlot> = keys
            .keys
            .iter()
            .filter_map(|key| self.table.lookup(key))
            .collect();
        let method_type = keys.method_type;

        ChainBundle {
            filters: merge(slots.iter().flat_map(|s| &s.filters), direction, method_type, |_| true),
            interceptors: merge(
                slots.iter().flat_map(|s| &s.interceptors),
                direction,
                method_type,
                |_| true,
            ),
            handlers: merge::<dyn Handler, _, _>(
                slots.iter().flat_map(|s| &s.handlers),
                direction,
                method_type,
                |h| h.can_handle(message, response),
            ),
        }
    }
}

fn merge<'a, P, I, F>(
    candidates: I,
    direction: StreamDirection,
    method_type: MethodType,
    applicable: F,
) -> Vec<Arc<Registered<P>>>
where
    P: ?Sized + 'a,
    I: Iterator<Item = &'a Arc<Registered<P>>>,
    F: Fn(&P) -> bool,
{
    let mut seen = HashSet::new();
    let mut chain: Vec<Arc<Registered<P>>> = candidates
        .filter(|r| seen.insert(r.seq()))
        .filter(|r| r.applies_to(direction, method_type) && applicable(r.plugin()))
        .cloned()
        .collect();
    chain.sort_by_key(|r| (r.order(), r.seq()));
    chain
}
