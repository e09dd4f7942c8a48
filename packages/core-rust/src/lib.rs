//! `Things` Core — device message model and routing vocabulary.

pub mod message;
pub mod types;

pub use message::{BaseMetadata, ThingsMessage, ThingsResponse};
pub use types::{events, MethodType, StreamDirection, SEPARATOR, WILDCARD};
