//! Device online/offline notification filter.

use std::sync::Arc;

use things_core::{events, StreamDirection, ThingsMessage, ThingsResponse, WILDCARD};

use crate::chaining::{FilterChain, RegistrationEntry};
use crate::traits::Filter;

/// Receiver of device connectivity changes.
///
/// Used as `Arc<dyn DeviceStatusObserver>`.
pub trait DeviceStatusObserver: Send + Sync {
    /// Called once per inbound status event, before the rest of the pipeline runs.
    fn on_status_change(&self, product_code: &str, device_code: &str, online: bool);
}

/// Inbound filter on `device.online` / `device.offline` events.
///
/// Reports the status change to its observer and always proceeds.
pub struct DeviceStatusFilter {
    online: bool,
    observer: Arc<dyn DeviceStatusObserver>,
}

impl DeviceStatusFilter {
    /// Filter for [`events::DEVICE_ONLINE`].
    #[must_use]
    pub fn online(observer: Arc<dyn DeviceStatusObserver>) -> Self {
        Self {
            online: true,
            observer,
        }
    }

    /// Filter for [`events::DEVICE_OFFLINE`].
    #[must_use]
    pub fn offline(observer: Arc<dyn DeviceStatusObserver>) -> Self {
        Self {
            online: false,
            observer,
        }
    }

    /// The event identifier this filter watches.
    #[must_use]
    pub fn identifier(&self) -> &'static str {
        if self.online {
            events::DEVICE_ONLINE
        } else {
            events::DEVICE_OFFLINE
        }
    }

    /// Registration for every product, inbound.
    #[must_use]
    pub fn registration(self) -> RegistrationEntry {
        let identifier = self.identifier();
        RegistrationEntry::filter(self)
            .identifier(identifier)
            .product_code(WILDCARD)
            .direction(StreamDirection::Inputting)
    }
}

impl Filter for DeviceStatusFilter {
    fn name(&self) -> &str {
        if self.online {
            "device-online"
        } else {
            "device-offline"
        }
    }

    fn apply(
        &self,
        message: &ThingsMessage,
        response: &mut ThingsResponse,
        chain: FilterChain<'_>,
    ) -> anyhow::Result<()> {
        tracing::debug!(
            product_code = %message.product_code(),
            device_code = %message.metadata.device_code,
            online = self.online,
            "device status changed"
        );
        self.observer.on_status_change(
            message.product_code(),
            &message.metadata.device_code,
            self.online,
        );
        chain.proceed(message, response)
    }
}
