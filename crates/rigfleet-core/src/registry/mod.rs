// ── Fleet registry ──
//
// The durable set of tracked devices. Workers write their own results
// concurrently, so every implementation must be safe to share. Writes land
// in memory; `flush` makes them durable and may block.

mod file_store;

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};

pub use file_store::{FileRegistry, REGISTRY_FILE};

use crate::error::CoreError;
use crate::model::{DeviceError, DeviceRecord, DeviceState, ProbeOutcome, ProbeResult};

/// Durable store of tracked devices keyed by address.
///
/// `last_seen` never moves backwards: writes carrying an older timestamp
/// than the stored one keep the stored value.
///
/// Mutations are visible to readers immediately and reach durable storage
/// on the next [`Registry::flush`].
pub trait Registry: Send + Sync {
    /// Tracked addresses in ascending order.
    fn list_tracked(&self) -> Result<Vec<Ipv4Addr>, CoreError>;

    /// All records in address order.
    fn records(&self) -> Result<Vec<DeviceRecord>, CoreError>;

    fn get(&self, address: Ipv4Addr) -> Result<Option<DeviceRecord>, CoreError>;

    /// Start tracking an address with a placeholder record. An already
    /// tracked address keeps its data and only has `last_seen` refreshed.
    fn track(&self, address: Ipv4Addr, seen_at: DateTime<Utc>) -> Result<DeviceRecord, CoreError>;

    /// Insert or replace the hostname and state for an address.
    fn upsert(
        &self,
        address: Ipv4Addr,
        hostname: &str,
        state: DeviceState,
        seen_at: DateTime<Utc>,
    ) -> Result<DeviceRecord, CoreError>;

    /// Replace the hostname and state of an address that is already
    /// tracked. Returns `false` without writing if it is not.
    fn refresh(
        &self,
        address: Ipv4Addr,
        hostname: &str,
        state: DeviceState,
        seen_at: DateTime<Utc>,
    ) -> Result<bool, CoreError>;

    /// Record an offline state, preserving hostname and `last_seen`.
    /// Returns `false` without writing if the address is not tracked.
    fn mark_unreachable(&self, address: Ipv4Addr, error: &DeviceError) -> Result<bool, CoreError>;

    /// Stop tracking an address. Returns `false` if it was not tracked.
    fn remove(&self, address: Ipv4Addr) -> Result<bool, CoreError>;

    /// Write pending mutations to durable storage. Blocking.
    fn flush(&self) -> Result<(), CoreError>;
}

/// Whether an online probe result may start tracking its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Discovery and explicit adds: online devices become tracked.
    Track,
    /// Refreshes of the tracked set: untracked addresses are left alone,
    /// so a device removed mid-refresh stays removed.
    TrackedOnly,
}

/// Write a probe result into the registry.
///
/// Online results upsert under [`Reconcile::Track`] and only update under
/// [`Reconcile::TrackedOnly`]; offline results only ever touch devices that
/// are already tracked.
pub fn reconcile(
    registry: &dyn Registry,
    result: &ProbeResult,
    seen_at: DateTime<Utc>,
    mode: Reconcile,
) -> Result<(), CoreError> {
    match &result.outcome {
        ProbeOutcome::Online(state) => {
            let stored = DeviceState::Online {
                settings: state.settings.clone(),
                telemetry: state.telemetry.clone(),
            };
            match mode {
                Reconcile::Track => {
                    registry.upsert(result.address, &state.hostname, stored, seen_at)?;
                }
                Reconcile::TrackedOnly => {
                    registry.refresh(result.address, &state.hostname, stored, seen_at)?;
                }
            }
        }
        ProbeOutcome::Offline(error) => {
            registry.mark_unreachable(result.address, error)?;
        }
    }
    Ok(())
}
