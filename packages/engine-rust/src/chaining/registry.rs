//! Bootstrap-time plugin registration.
//!
//! Plugins are described by [`RegistrationEntry`] values and fed to a
//! [`Registrar`]. [`ChainingRegistry`] accumulates them and is sealed into a
//! [`ChainingExecutor`] before traffic starts.

use std::fmt;
use std::sync::Arc;

use things_core::{MethodType, StreamDirection, WILDCARD};

use super::executor::ChainingExecutor;
use super::keys::RoutingKey;
use super::table::{Registered, RoutingTables};
use crate::config::EngineConfig;
use crate::traits::{Filter, Handler, Interceptor};

/// Order given to entries that do not declare one: lowest precedence.
pub const DEFAULT_ORDER: i32 = i32::MAX;

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// The closed set of plugin kinds the pipeline knows how to run.
#[derive(Clone)]
pub enum Plugin {
    Filter(Arc<dyn Filter>),
    Interceptor(Arc<dyn Interceptor>),
    Handler(Arc<dyn Handler>),
}

impl Plugin {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Filter(_) => "filter",
            Self::Interceptor(_) => "interceptor",
            Self::Handler(_) => "handler",
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Filter(p) => p.name(),
            Self::Interceptor(p) => p.name(),
            Self::Handler(p) => p.name(),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.name())
    }
}

// ---------------------------------------------------------------------------
// RegistrationEntry
// ---------------------------------------------------------------------------

/// A plugin plus the routing attributes it is registered with.
///
/// ```
/// use things_core::{StreamDirection, ThingsMessage, ThingsResponse};
/// use things_engine::{Handler, RegistrationEntry};
///
/// struct OnlineHandler;
///
/// impl Handler for OnlineHandler {
///     fn handle(&self, _m: &ThingsMessage, _r: &mut ThingsResponse) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// let entry = RegistrationEntry::handler(OnlineHandler)
///     .identifier("device.online")
///     .product_code("ProductA")
///     .direction(StreamDirection::Inputting)
///     .order(10);
/// assert_eq!(entry.routing_key().identifier, "device.online");
/// ```
#[derive(Debug, Clone)]
pub struct RegistrationEntry {
    plugin: Plugin,
    identifier: String,
    product_code: String,
    direction: StreamDirection,
    method_type: MethodType,
    order: i32,
}

impl RegistrationEntry {
    /// Entry for `plugin` matching every identifier and product code inbound,
    /// at [`DEFAULT_ORDER`].
    #[must_use]
    pub fn new(plugin: Plugin) -> Self {
        Self {
            plugin,
            identifier: WILDCARD.to_string(),
            product_code: WILDCARD.to_string(),
            direction: StreamDirection::Inputting,
            method_type: MethodType::AllMethod,
            order: DEFAULT_ORDER,
        }
    }

    #[must_use]
    pub fn filter(filter: impl Filter + 'static) -> Self {
        Self::new(Plugin::Filter(Arc::new(filter)))
    }

    #[must_use]
    pub fn interceptor(interceptor: impl Interceptor + 'static) -> Self {
        Self::new(Plugin::Interceptor(Arc::new(interceptor)))
    }

    #[must_use]
    pub fn handler(handler: impl Handler + 'static) -> Self {
        Self::new(Plugin::Handler(Arc::new(handler)))
    }

    /// Identifier pattern: an exact identifier or [`WILDCARD`].
    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Product code pattern: an exact product code or [`WILDCARD`].
    #[must_use]
    pub fn product_code(mut self, product_code: impl Into<String>) -> Self {
        self.product_code = product_code.into();
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: StreamDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Restricts the entry to messages of one method type.
    #[must_use]
    pub fn method_type(mut self, method_type: MethodType) -> Self {
        self.method_type = method_type;
        self
    }

    /// Ascending execution priority.
    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn plugin(&self) -> &Plugin {
        &self.plugin
    }

    #[must_use]
    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey::new(self.identifier.clone(), self.product_code.clone())
    }
}

// ---------------------------------------------------------------------------
// Registrar
// ---------------------------------------------------------------------------

/// Write side of the routing table, driven by bootstrap code.
pub trait Registrar {
    fn register(&mut self, entry: RegistrationEntry);
}

// ---------------------------------------------------------------------------
// ChainingRegistry
// ---------------------------------------------------------------------------

/// Accumulates registrations until the dispatcher is sealed with [`build`].
///
/// [`build`]: ChainingRegistry::build
#[derive(Debug, Default)]
pub struct ChainingRegistry {
    tables: RoutingTables,
    next_seq: u64,
}

impl ChainingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every entry in iteration order.
    #[must_use]
    pub fn with_entries(mut self, entries: impl IntoIterator<Item = RegistrationEntry>) -> Self {
        for entry in entries {
            self.register(entry);
        }
        self
    }

    /// Number of registrations so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.plugin_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seals the registrations into an immutable table.
    #[must_use]
    pub fn into_tables(self) -> RoutingTables {
        self.tables
    }

    /// Seals the registrations and exposes them through a dispatcher.
    #[must_use]
    pub fn build(self, config: &EngineConfig) -> ChainingExecutor {
        tracing::info!(
            plugins = self.tables.plugin_count(),
            slots = self.tables.slot_count(),
            "routing table sealed"
        );
        ChainingExecutor::new(Arc::new(self.into_tables()), config)
    }
}

impl Registrar for ChainingRegistry {
    fn register(&mut self, entry: RegistrationEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;

        tracing::debug!(
            kind = entry.plugin.kind(),
            plugin = entry.plugin.name(),
            identifier = %entry.identifier,
            product_code = %entry.product_code,
            direction = %entry.direction,
            order = entry.order,
            seq,
            "plugin registered"
        );

        let RegistrationEntry {
            plugin,
            identifier,
            product_code,
            direction,
            method_type,
            order,
        } = entry;
        let slot = self.tables.slot_mut(RoutingKey::new(identifier, product_code));
        match plugin {
            Plugin::Filter(p) => slot
                .filters
                .push(Arc::new(Registered::new(seq, order, direction, method_type, p))),
            Plugin::Interceptor(p) => slot
                .interceptors
                .push(Arc::new(Registered::new(seq, order, direction, method_type, p))),
            Plugin::Handler(p) => slot
                .handlers
                .push(Arc::new(Registered::new(seq, order, direction, method_type, p))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaining::table::RoutingTable;
    use crate::chaining::testing::{Journal, RecordingFilter, RecordingHandler, RecordingInterceptor};

    #[test]
    fn entry_defaults_match_everything_inbound() {
        let journal = Journal::default();
        let entry = RegistrationEntry::handler(RecordingHandler::new("h", &journal));
        assert_eq!(entry.routing_key(), RoutingKey::new("*", "*"));
        assert_eq!(entry.direction, StreamDirection::Inputting);
        assert_eq!(entry.method_type, MethodType::AllMethod);
        assert_eq!(entry.order, DEFAULT_ORDER);
        assert_eq!(entry.plugin().kind(), "handler");
    }

    #[test]
    fn register_splits_plugins_by_kind() {
        let journal = Journal::default();
        let registry = ChainingRegistry::new().with_entries([
            RegistrationEntry::filter(RecordingFilter::passing("f", &journal)).identifier("x"),
            RegistrationEntry::interceptor(RecordingInterceptor::accepting("i", &journal)).identifier("x"),
            RegistrationEntry::handler(RecordingHandler::new("h", &journal)).identifier("x"),
        ]);
        assert_eq!(registry.len(), 3);

        let tables = registry.into_tables();
        let slot = tables.lookup(&RoutingKey::new("x", "*")).unwrap();
        assert_eq!(slot.filters.len(), 1);
        assert_eq!(slot.interceptors.len(), 1);
        assert_eq!(slot.handlers.len(), 1);
        assert_eq!(tables.slot_count(), 1);
    }

    #[test]
    fn sequence_numbers_follow_registration_order() {
        let journal = Journal::default();
        let tables = ChainingRegistry::new()
            .with_entries([
                RegistrationEntry::handler(RecordingHandler::new("a", &journal)).identifier("x"),
                RegistrationEntry::handler(RecordingHandler::new("b", &journal)).identifier("y"),
                RegistrationEntry::handler(RecordingHandler::new("c", &journal)).identifier("x"),
            ])
            .into_tables();

        let x: Vec<u64> = tables
            .lookup(&RoutingKey::new("x", "*"))
            .unwrap()
            .handlers
            .iter()
            .map(|h| h.seq())
            .collect();
        assert_eq!(x, vec![0, 2]);
        assert_eq!(tables.lookup(&RoutingKey::new("y", "*")).unwrap().handlers[0].seq(), 1);
    }

    #[test]
    fn empty_registry() {
        let registry = ChainingRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.into_tables().slot_count(), 0);
    }

    #[test]
    fn plugin_debug_names_kind_and_plugin() {
        let journal = Journal::default();
        let entry = RegistrationEntry::filter(RecordingFilter::passing("f", &journal));
        assert_eq!(format!("{:?}", entry.plugin()), "filter(f)");
    }
}
