//! Plugins shipped with the engine.

pub mod completion_log;
pub mod device_status;

pub use completion_log::CompletionLogInterceptor;
pub use device_status::{DeviceStatusFilter, DeviceStatusObserver};
