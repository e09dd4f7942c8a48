//! Outbound completion logging.

use std::time::{SystemTime, UNIX_EPOCH};

use things_core::{StreamDirection, ThingsMessage, ThingsResponse};

use crate::chaining::RegistrationEntry;
use crate::traits::Interceptor;

/// Logs every completed outbound dispatch at debug level, with the time
/// elapsed since the message was created.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompletionLogInterceptor;

impl CompletionLogInterceptor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Registration for every outbound message.
    #[must_use]
    pub fn registration(self) -> RegistrationEntry {
        RegistrationEntry::interceptor(self).direction(StreamDirection::Outputting)
    }
}

/// Milliseconds from `created_ms` to `now_ms`, zero if the clock went backwards.
fn elapsed_ms(created_ms: u64, now_ms: u64) -> u64 {
    now_ms.saturating_sub(created_ms)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl Interceptor for CompletionLogInterceptor {
    fn name(&self) -> &str {
        "completion-log"
    }

    fn after_completion(
        &self,
        message: &ThingsMessage,
        _response: &mut ThingsResponse,
        error: Option<&anyhow::Error>,
    ) {
        let elapsed = elapsed_ms(message.time, now_ms());
        match error {
            Some(err) => tracing::debug!(
                elapsed_ms = elapsed,
                method = %message.method,
                message_id = %message.id,
                error = %err,
                "outbound dispatch completed with error"
            ),
            None => tracing::debug!(
                elapsed_ms = elapsed,
                method = %message.method,
                message_id = %message.id,
                "outbound dispatch completed"
            ),
        }
    }
}
