//! Things engine: message dispatch core for IoT device traffic.
//!
//! Inbound and outbound device messages are routed to pluggable filters,
//! interceptors and handlers selected by method type, business identifier and
//! product code, with wildcard fallback. Resolved chains are cached per route
//! signature so repeated traffic skips the routing table scan.
//!
//! ```
//! use things_core::{ThingsMessage, ThingsResponse};
//! use things_engine::{ChainingRegistry, EngineConfig, Handler, RegistrationEntry};
//!
//! struct Ack;
//!
//! impl Handler for Ack {
//!     fn handle(&self, _m: &ThingsMessage, r: &mut ThingsResponse) -> anyhow::Result<()> {
//!         r.set_attribute("ack", true.into());
//!         Ok(())
//!     }
//! }
//!
//! let executor = ChainingRegistry::new()
//!     .with_entries([RegistrationEntry::handler(Ack).identifier("device.online")])
//!     .build(&EngineConfig::default());
//!
//! let message = ThingsMessage::new("m-1", "thing.event.device.online", "ProductA");
//! let mut response = ThingsResponse::new();
//! executor.dispatch_inbound(&message, &mut response).unwrap();
//! assert_eq!(response.attribute("ack"), Some(&true.into()));
//! ```

pub mod chaining;
pub mod config;
pub mod error;
pub mod plugins;
pub mod traits;

pub use chaining::{
    CacheStats, ChainingExecutor, ChainingRegistry, FilterChain, Plugin, Registrar,
    RegistrationEntry, RoutingKey, RoutingTable, DEFAULT_ORDER,
};
pub use config::EngineConfig;
pub use error::ThingsError;
pub use traits::{Filter, Handler, Interceptor, ThingsChaining};
