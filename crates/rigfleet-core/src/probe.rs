// ── Device prober ──
//
// One bounded-time info request per address, classified into an online
// snapshot or an offline error. Never fails: every failure becomes data.

use std::net::Ipv4Addr;

use tracing::{debug, trace};

use crate::model::settings::hostname_or_placeholder;
use crate::model::{
    CanonicalSettings, ConfigPatch, DeviceError, OnlineState, ProbeResult, PushOutcome, Telemetry,
};
use crate::transport::DeviceTransport;

/// Probe a single device.
pub async fn probe_device<T: DeviceTransport>(transport: &T, address: Ipv4Addr) -> ProbeResult {
    match transport.fetch_info(address).await {
        Ok(info) => {
            trace!(%address, "device answered");
            ProbeResult::online(
                address,
                OnlineState {
                    hostname: hostname_or_placeholder(&info, address),
                    settings: CanonicalSettings::from_info(&info),
                    telemetry: Telemetry::from_info(&info),
                },
            )
        }
        Err(err) => {
            let error = DeviceError::from(err);
            debug!(%address, kind = %error.kind, error = %error, "device offline");
            ProbeResult::offline(address, error)
        }
    }
}

/// Push a validated patch to a single device.
pub async fn push_device<T: DeviceTransport>(
    transport: &T,
    address: Ipv4Addr,
    patch: &ConfigPatch,
) -> PushOutcome {
    let result = transport
        .apply_settings(address, patch)
        .await
        .map_err(DeviceError::from);
    if let Err(err) = &result {
        debug!(%address, kind = %err.kind, error = %err, "push failed");
    }
    PushOutcome { address, result }
}
