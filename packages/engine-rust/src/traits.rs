use things_core::{ThingsMessage, ThingsResponse};

use crate::chaining::FilterChain;
use crate::error::ThingsError;

/// Pre-processing step run before any interceptor or handler.
///
/// A filter decides whether the rest of the pipeline runs: calling
/// [`FilterChain::proceed`] hands the message to the next filter (and, after
/// the last one, to the interceptors and handlers). Returning without
/// proceeding silently drops the message.
///
/// Used as `Arc<dyn Filter>`.
pub trait Filter: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Filters the message. Errors propagate straight to the dispatcher's caller.
    fn apply(
        &self,
        message: &ThingsMessage,
        response: &mut ThingsResponse,
        chain: FilterChain<'_>,
    ) -> anyhow::Result<()>;
}

/// Hooks around the handler stage.
///
/// All hooks default to accepting / doing nothing.
pub trait Interceptor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called before the handlers. Returning `false` skips the handlers and
    /// every `post_handle`, but `after_completion` still runs.
    fn pre_handle(&self, _message: &ThingsMessage, _response: &mut ThingsResponse) -> bool {
        true
    }

    /// Called after every handler succeeded.
    fn post_handle(&self, _message: &ThingsMessage, _response: &mut ThingsResponse) {}

    /// Always called once the pre-handle stage was entered, with the handler
    /// error if one occurred.
    fn after_completion(
        &self,
        _message: &ThingsMessage,
        _response: &mut ThingsResponse,
        _error: Option<&anyhow::Error>,
    ) {
    }
}

/// Business logic for a message.
pub trait Handler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Applicability check, evaluated once when the chain for a routing
    /// signature is resolved (not on every dispatch).
    fn can_handle(&self, _message: &ThingsMessage, _response: &ThingsResponse) -> bool {
        true
    }

    /// Handles the message.
    fn handle(&self, message: &ThingsMessage, response: &mut ThingsResponse) -> anyhow::Result<()>;
}

/// Entry points the transport collaborators call for every message.
pub trait ThingsChaining: Send + Sync {
    /// Dispatches a device -> platform message.
    ///
    /// # Errors
    ///
    /// See [`ThingsError`].
    fn input(&self, message: &ThingsMessage, response: &mut ThingsResponse) -> Result<(), ThingsError>;

    /// Dispatches a platform -> device message.
    ///
    /// # Errors
    ///
    /// See [`ThingsError`].
    fn output(&self, message: &ThingsMessage, response: &mut ThingsResponse) -> Result<(), ThingsError>;
}
