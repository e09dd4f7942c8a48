//! Routing table: `(identifier, product code)` -> plugins registered for that slot.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use things_core::{MethodType, StreamDirection};

use super::keys::RoutingKey;
use crate::traits::{Filter, Handler, Interceptor};

// ---------------------------------------------------------------------------
// Registered
// ---------------------------------------------------------------------------

/// A plugin as stored in the routing table, with the attributes the resolver
/// selects and orders by.
pub struct Registered<P: ?Sized> {
    seq: u64,
    order: i32,
    direction: StreamDirection,
    method_type: MethodType,
    plugin: Arc<P>,
}

impl<P: ?Sized> Registered<P> {
    pub(crate) fn new(
        seq: u64,
        order: i32,
        direction: StreamDirection,
        method_type: MethodType,
        plugin: Arc<P>,
    ) -> Self {
        Self {
            seq,
            order,
            direction,
            method_type,
            plugin,
        }
    }

    /// Registration sequence number: the plugin's identity within the table
    /// and the tie-breaker between equal orders.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    #[must_use]
    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    #[must_use]
    pub fn method_type(&self) -> MethodType {
        self.method_type
    }

    #[must_use]
    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    pub(crate) fn applies_to(&self, direction: StreamDirection, method_type: MethodType) -> bool {
        self.direction == direction && self.method_type.accepts(method_type)
    }
}

impl<P: ?Sized> fmt::Debug for Registered<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registered")
            .field("seq", &self.seq)
            .field("order", &self.order)
            .field("direction", &self.direction)
            .field("method_type", &self.method_type)
            .finish_non_exhaustive()
    }
}

pub type RegisteredFilter = Arc<Registered<dyn Filter>>;
pub type RegisteredInterceptor = Arc<Registered<dyn Interceptor>>;
pub type RegisteredHandler = Arc<Registered<dyn Handler>>;

// ---------------------------------------------------------------------------
// RoutingSlot
// ---------------------------------------------------------------------------

/// Everything registered under one exact routing key, in registration order.
#[derive(Debug, Default)]
pub struct RoutingSlot {
    pub filters: Vec<RegisteredFilter>,
    pub interceptors: Vec<RegisteredInterceptor>,
    pub handlers: Vec<RegisteredHandler>,
}

impl RoutingSlot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len() + self.interceptors.len() + self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// RoutingTable trait
// ---------------------------------------------------------------------------

/// Read side of the routing table, queried once per candidate routing key.
///
/// Implementations must be safe to read from many dispatch threads at once.
/// Used as `Arc<dyn RoutingTable>`.
pub trait RoutingTable: Send + Sync {
    /// Plugins registered under exactly `key`.
    fn lookup(&self, key: &RoutingKey) -> Option<&RoutingSlot>;
}

// ---------------------------------------------------------------------------
// RoutingTables
// ---------------------------------------------------------------------------

/// Hash-map backed routing table.
///
/// Filled by [`ChainingRegistry`](super::ChainingRegistry) during bootstrap
/// and immutable once sealed, so lookups need no synchronization.
#[derive(Debug, Default)]
pub struct RoutingTables {
    slots: HashMap<RoutingKey, RoutingSlot>,
}

impl RoutingTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn slot_mut(&mut self, key: RoutingKey) -> &mut RoutingSlot {
        self.slots.entry(key).or_default()
    }

    /// Number of occupied `(identifier, product code)` slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Total number of registered plugins across all slots.
    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.slots.values().map(RoutingSlot::len).sum()
    }
}

impl RoutingTable for RoutingTables {
    fn lookup(&self, key: &RoutingKey) -> Option<&RoutingSlot> {
        self.slots.get(key)
    }
}
