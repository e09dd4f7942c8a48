//! Chaining/dispatch engine.
//!
//! A dispatch goes through these parts in order:
//!
//! 1. **Keys** (`keys`): `ThingsMessage` -> four candidate `RoutingKey`s + `CacheKey`
//! 2. **Cache** (`cache`): `CacheKey` -> previously resolved `ChainBundle`
//! 3. **Resolution** (`resolver`): routing table scan, union, narrowing, ordering
//! 4. **Execution** (`executor`): filter -> pre-handle -> handle -> post-handle -> after-completion
//!
//! The routing table (`table`) is filled through the `registry` at bootstrap
//! and is read-only afterwards.

pub mod cache;
pub mod executor;
pub mod filter_chain;
pub mod keys;
pub mod registry;
pub mod resolver;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types for convenient access.
pub use cache::{CacheStats, ResolutionCache};
pub use executor::ChainingExecutor;
pub use filter_chain::FilterChain;
pub use keys::{method_identifier, CacheKey, ChainingKeys, RoutingKey};
pub use registry::{ChainingRegistry, Plugin, Registrar, RegistrationEntry, DEFAULT_ORDER};
pub use resolver::{ChainBundle, ChainResolver};
pub use table::{
    Registered, RegisteredFilter, RegisteredHandler, RegisteredInterceptor, RoutingSlot,
    RoutingTable, RoutingTables,
};
