// System endpoints
//
// The two calls the fleet engine needs: read-only info and config update.

use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{PushAck, SystemInfo};

impl DeviceClient {
    /// Fetch the device's status and stratum configuration.
    ///
    /// `GET /api/system/info`
    pub async fn system_info(&self, address: Ipv4Addr) -> Result<SystemInfo, Error> {
        let url = self.device_url(address, "api/system/info")?;
        self.get(url).await
    }

    /// Apply a (partial) configuration to the device.
    ///
    /// `PATCH /api/system` with any subset of the settings fields.
    /// Firmware may restart services after accepting, hence the longer
    /// push deadline.
    pub async fn update_system(
        &self,
        address: Ipv4Addr,
        settings: &impl Serialize,
    ) -> Result<Option<PushAck>, Error> {
        let url = self.device_url(address, "api/system")?;
        debug!(%address, "pushing system settings");
        self.patch(url, settings).await
    }
}
