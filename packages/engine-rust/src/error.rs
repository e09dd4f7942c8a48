//! Errors surfaced by the dispatch engine.

use things_core::ThingsMessage;

/// Stable error codes reported alongside a [`ThingsError`].
pub mod error_codes {
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const FILTER_FAILURE: &str = "FILTER_FAILURE";
    pub const HANDLER_FAILURE: &str = "HANDLER_FAILURE";
}

/// Unrecoverable dispatch failures.
///
/// Every variant carries a freshly generated trace code and the message that
/// was being dispatched, so the error can be correlated with the dispatch
/// logs. The engine never retries.
#[derive(Debug, thiserror::Error)]
pub enum ThingsError {
    /// No registered handler applies to the message.
    #[error("can not handle message `{}` (method `{}`) [trace {trace_code}]", .message.id, .message.method)]
    ServiceUnavailable {
        trace_code: String,
        message: Box<ThingsMessage>,
    },
    /// A filter returned an error. Completion hooks were not run.
    #[error("filter failed for message `{}` [trace {trace_code}]: {source}", .message.id)]
    FilterFailure {
        trace_code: String,
        message: Box<ThingsMessage>,
        #[source]
        source: anyhow::Error,
    },
    /// A handler returned an error. Completion hooks ran before it was surfaced.
    #[error("handler failed for message `{}` [trace {trace_code}]: {source}", .message.id)]
    HandlerFailure {
        trace_code: String,
        message: Box<ThingsMessage>,
        #[source]
        source: anyhow::Error,
    },
}

impl ThingsError {
    pub(crate) fn service_unavailable(message: &ThingsMessage) -> Self {
        Self::ServiceUnavailable {
            trace_code: new_trace_code(),
            message: Box::new(message.clone()),
        }
    }

    pub(crate) fn filter_failure(message: &ThingsMessage, source: anyhow::Error) -> Self {
        Self::FilterFailure {
            trace_code: new_trace_code(),
            message: Box::new(message.clone()),
            source,
        }
    }

    pub(crate) fn handler_failure(message: &ThingsMessage, source: anyhow::Error) -> Self {
        Self::HandlerFailure {
            trace_code: new_trace_code(),
            message: Box::new(message.clone()),
            source,
        }
    }

    /// Stable code identifying the failure kind.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => error_codes::SERVICE_UNAVAILABLE,
            Self::FilterFailure { .. } => error_codes::FILTER_FAILURE,
            Self::HandlerFailure { .. } => error_codes::HANDLER_FAILURE,
        }
    }

    #[must_use]
    pub fn trace_code(&self) -> &str {
        match self {
            Self::ServiceUnavailable { trace_code, .. }
            | Self::FilterFailure { trace_code, .. }
            | Self::HandlerFailure { trace_code, .. } => trace_code,
        }
    }

    /// The message whose dispatch failed.
    #[must_use]
    pub fn message(&self) -> &ThingsMessage {
        match self {
            Self::ServiceUnavailable { message, .. }
            | Self::FilterFailure { message, .. }
            | Self::HandlerFailure { message, .. } => message,
        }
    }
}

fn new_trace_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
