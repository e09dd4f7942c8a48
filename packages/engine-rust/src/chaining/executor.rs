//! Pipeline executor: resolve -> filter -> pre-handle -> handle -> post-handle -> after-completion.

use std::cell::Cell;
use std::sync::Arc;

use things_core::{StreamDirection, ThingsMessage, ThingsResponse};

use super::cache::ResolutionCache;
use super::filter_chain::FilterChain;
use super::keys::ChainingKeys;
use super::resolver::{ChainBundle, ChainResolver};
use super::table::RoutingTable;
use crate::config::EngineConfig;
use crate::error::ThingsError;
use crate::traits::ThingsChaining;

/// Dispatches messages through the plugins registered for them.
///
/// Shared by every message-processing thread; holds no per-dispatch state.
/// The routing table is immutable and the resolution cache is internally
/// synchronized, so `dispatch` takes `&self` and never blocks on a global lock.
pub struct ChainingExecutor {
    resolver: ChainResolver,
    cache: ResolutionCache,
}

impl ChainingExecutor {
    #[must_use]
    pub fn new(table: Arc<dyn RoutingTable>, config: &EngineConfig) -> Self {
        Self {
            resolver: ChainResolver::new(table),
            cache: ResolutionCache::from_config(config),
        }
    }

    /// Dispatches a device -> platform message.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_inbound(
        &self,
        message: &ThingsMessage,
        response: &mut ThingsResponse,
    ) -> Result<(), ThingsError> {
        self.dispatch(StreamDirection::Inputting, message, response)
    }

    /// Dispatches a platform -> device message.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_outbound(
        &self,
        message: &ThingsMessage,
        response: &mut ThingsResponse,
    ) -> Result<(), ThingsError> {
        self.dispatch(StreamDirection::Outputting, message, response)
    }

    /// Runs the full pipeline for `message` in `direction`.
    ///
    /// A filter that does not proceed and an interceptor whose `pre_handle`
    /// returns `false` both end the dispatch with `Ok(())`.
    ///
    /// # Errors
    ///
    /// - [`ThingsError::ServiceUnavailable`] if no handler applies; no plugin runs.
    /// - [`ThingsError::FilterFailure`] if a filter fails; interceptors are not
    ///   notified.
    /// - [`ThingsError::HandlerFailure`] if a handler fails, after every
    ///   interceptor's `after_completion` has seen the error.
    pub fn dispatch(
        &self,
        direction: StreamDirection,
        message: &ThingsMessage,
        response: &mut ThingsResponse,
    ) -> Result<(), ThingsError> {
        let span = tracing::debug_span!(
            "things_dispatch",
            direction = %direction,
            method = %message.method,
            message_id = %message.id,
        );
        let _enter = span.enter();

        let bundle = self.chain_for(direction, message, response);
        if bundle.handlers.is_empty() {
            tracing::warn!(product_code = %message.product_code(), "no handler applies to message");
            return Err(ThingsError::service_unavailable(message));
        }

        if !bundle.filters.is_empty() {
            let reached_end = Cell::new(false);
            FilterChain::new(&bundle.filters, &reached_end)
                .proceed(message, response)
                .map_err(|err| {
                    tracing::warn!(error = %err, "filter failed");
                    ThingsError::filter_failure(message, err)
                })?;
            if !reached_end.get() {
                tracing::debug!("filter chain stopped the dispatch");
                return Ok(());
            }
        }

        let outcome = run_handlers(&bundle, message, response);

        for interceptor in &bundle.interceptors {
            interceptor
                .plugin()
                .after_completion(message, response, outcome.as_ref().err());
        }

        outcome.map_err(|err| ThingsError::handler_failure(message, err))
    }

    /// The chain `message` resolves to, served from the cache when possible.
    #[must_use]
    pub fn chain_for(
        &self,
        direction: StreamDirection,
        message: &ThingsMessage,
        response: &ThingsResponse,
    ) -> Arc<ChainBundle> {
        let keys = ChainingKeys::derive(message, direction);
        self.cache.get_or_resolve(&keys.cache_key, || {
            self.resolver.resolve(&keys, direction, message, response)
        })
    }

    #[must_use]
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }
}

/// Pre-handle, handle and post-handle stages. Returns the first handler error.
fn run_handlers(
    bundle: &ChainBundle,
    message: &ThingsMessage,
    response: &mut ThingsResponse,
) -> anyhow::Result<()> {
    for interceptor in &bundle.interceptors {
        if !interceptor.plugin().pre_handle(message, response) {
            tracing::warn!(
                interceptor = interceptor.plugin().name(),
                "pre-handle rejected message"
            );
            return Ok(());
        }
    }

    for handler in &bundle.handlers {
        if let Err(err) = handler.plugin().handle(message, response) {
            tracing::warn!(handler = handler.plugin().name(), error = %err, "handler failed");
            return Err(err);
        }
    }

    for interceptor in &bundle.interceptors {
        interceptor.plugin().post_handle(message, response);
    }
    Ok(())
}

impl ThingsChaining for ChainingExecutor {
    fn input(&self, message: &ThingsMessage, response: &mut ThingsResponse) -> Result<(), ThingsError> {
        self.dispatch_inbound(message, response)
    }

    fn output(&self, message: &ThingsMessage, response: &mut ThingsResponse) -> Result<(), ThingsError> {
        self.dispatch_outbound(message, response)
    }
}
