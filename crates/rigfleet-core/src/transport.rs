// ── Device transport seam ──
//
// The prober and push coordinator talk to devices through this trait so
// the fan-out logic can run against an in-process fake.

use std::future::Future;
use std::net::Ipv4Addr;

use rigfleet_api::{DeviceClient, PushAck, SystemInfo};

use crate::error::CoreError;
use crate::model::ConfigPatch;

/// Request/response access to a single device.
///
/// Errors use the `Device*` variants of [`CoreError`].
pub trait DeviceTransport: Send + Sync + 'static {
    /// Read the device's info payload.
    fn fetch_info(
        &self,
        address: Ipv4Addr,
    ) -> impl Future<Output = Result<SystemInfo, CoreError>> + Send;

    /// Send a settings patch.
    fn apply_settings(
        &self,
        address: Ipv4Addr,
        patch: &ConfigPatch,
    ) -> impl Future<Output = Result<Option<PushAck>, CoreError>> + Send;
}

impl DeviceTransport for DeviceClient {
    async fn fetch_info(&self, address: Ipv4Addr) -> Result<SystemInfo, CoreError> {
        Ok(self.system_info(address).await?)
    }

    async fn apply_settings(
        &self,
        address: Ipv4Addr,
        patch: &ConfigPatch,
    ) -> Result<Option<PushAck>, CoreError> {
        Ok(self.update_system(address, patch).await?)
    }
}
