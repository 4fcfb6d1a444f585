// ── Fleet facade ──
//
// The operations exposed to the CLI and HTTP server. Input is validated
// before any I/O; per-device failures are returned as data; only input
// and registry errors fail a whole operation.

use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::address::{expand_subnet, parse_address};
use crate::batch::BatchRunner;
use crate::config::{ConcurrencyLimits, FleetConfig};
use crate::error::CoreError;
use crate::model::{
    ConfigPatch, DeviceError, DeviceErrorKind, DeviceRecord, DeviceView, ProbeResult, PushOutcome,
    PushReport,
};
use crate::probe::{probe_device, push_device};
use crate::registry::{Reconcile, Registry, reconcile};
use crate::transport::DeviceTransport;

/// Outcome of registering a device by address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddOutcome {
    pub record: DeviceRecord,
    pub device: DeviceView,
}

impl AddOutcome {
    pub fn is_online(&self) -> bool {
        self.device.online
    }
}

/// Outcome of a discovery scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub subnet: String,
    /// Number of hosts probed.
    pub probed: usize,
    /// Devices that answered, in address order.
    pub online: Vec<DeviceView>,
}

/// Probes, tracks and configures a fleet of devices.
pub struct Fleet<T> {
    transport: Arc<T>,
    registry: Arc<dyn Registry>,
    limits: ConcurrencyLimits,
    max_scan_hosts: usize,
}

impl<T: DeviceTransport> Fleet<T> {
    pub fn new(config: &FleetConfig, transport: T, registry: Arc<dyn Registry>) -> Self {
        Self {
            transport: Arc::new(transport),
            registry,
            limits: config.limits,
            max_scan_hosts: config.max_scan_hosts,
        }
    }

    pub fn registry(&self) -> &dyn Registry {
        self.registry.as_ref()
    }

    /// Probe every tracked device and return their current state.
    ///
    /// A device removed while the refresh is running stays removed.
    pub async fn list_devices(&self) -> Result<Vec<DeviceView>, CoreError> {
        let tracked = self.registry.list_tracked()?;
        let results = self
            .probe_and_reconcile(tracked, self.limits.probe, Reconcile::TrackedOnly)
            .await?;

        let mut views = Vec::with_capacity(results.len());
        for result in results {
            let record = self.registry.get(result.address)?;
            views.push(DeviceView::from_probe(result, record.as_ref()));
        }
        views.sort_by_key(|v| v.address);

        let online = views.iter().filter(|v| v.online).count();
        info!(tracked = views.len(), online, "fleet refreshed");
        Ok(views)
    }

    /// Track an address, then probe it once.
    ///
    /// The device stays tracked even if the probe fails.
    pub async fn add_device(&self, input: &str) -> Result<AddOutcome, CoreError> {
        let address = parse_address(input)?;
        self.registry.track(address, Utc::now())?;

        let result = probe_device(self.transport.as_ref(), address).await;
        reconcile(self.registry.as_ref(), &result, Utc::now(), Reconcile::Track)?;
        self.flush().await?;

        let record = self
            .registry
            .get(address)?
            .ok_or_else(|| CoreError::Internal(format!("{address} vanished after tracking")))?;
        let device = DeviceView::from_probe(result, Some(&record));
        info!(%address, online = device.online, "device added");
        Ok(AddOutcome { record, device })
    }

    /// Stop tracking an address. Idempotent.
    pub async fn remove_device(&self, input: &str) -> Result<bool, CoreError> {
        let address = parse_address(input)?;
        let removed = self.registry.remove(address)?;
        if removed {
            self.flush().await?;
        }
        info!(%address, removed, "device removed");
        Ok(removed)
    }

    /// The stored record for an address, without probing.
    pub fn device(&self, input: &str) -> Result<Option<DeviceRecord>, CoreError> {
        self.registry.get(parse_address(input)?)
    }

    /// Probe every host in a subnet; responsive devices become tracked.
    pub async fn scan(&self, subnet: &str) -> Result<ScanReport, CoreError> {
        let hosts = expand_subnet(subnet, self.max_scan_hosts)?;
        let probed = hosts.len();
        info!(subnet, hosts = probed, "scanning subnet");

        let results = self
            .probe_and_reconcile(hosts, self.limits.scan, Reconcile::Track)
            .await?;
        let mut online: Vec<DeviceView> = results
            .into_iter()
            .filter(ProbeResult::is_online)
            .map(|r| DeviceView::from_probe(r, None))
            .collect();
        online.sort_by_key(|v| v.address);

        info!(subnet, probed, found = online.len(), "scan complete");
        Ok(ScanReport {
            subnet: subnet.trim().to_owned(),
            probed,
            online,
        })
    }

    /// Push a settings payload to every tracked device.
    ///
    /// The payload is validated before any device is contacted. The push
    /// does not probe devices or write to the registry.
    pub async fn push(&self, payload: &Value) -> Result<PushReport, CoreError> {
        let patch = Arc::new(ConfigPatch::from_value(payload)?);
        let tracked = self.registry.list_tracked()?;
        info!(devices = tracked.len(), fields = patch.len(), "pushing settings");

        let transport = Arc::clone(&self.transport);
        let entries = BatchRunner::new(self.limits.push)
            .run(tracked, move |address| {
                let transport = Arc::clone(&transport);
                let patch = Arc::clone(&patch);
                async move { push_device(transport.as_ref(), address, &patch).await }
            })
            .await;

        let report = PushReport::from_outcomes(entries.into_iter().map(|entry| {
            entry.outcome.unwrap_or_else(|failure| PushOutcome {
                address: entry.address,
                result: Err(DeviceError::new(DeviceErrorKind::TaskFailed, failure.to_string())),
            })
        }));
        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "push complete"
        );
        Ok(report)
    }

    /// Make registry changes durable without blocking the runtime.
    async fn flush(&self) -> Result<(), CoreError> {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || registry.flush())
            .await
            .map_err(|e| CoreError::Internal(format!("registry flush task failed: {e}")))?
    }

    /// Probe addresses with bounded concurrency, each worker writing its
    /// own result to the registry as soon as it has one. The registry is
    /// flushed once after every worker has finished.
    async fn probe_and_reconcile(
        &self,
        addresses: Vec<Ipv4Addr>,
        limit: usize,
        mode: Reconcile,
    ) -> Result<Vec<ProbeResult>, CoreError> {
        let transport = Arc::clone(&self.transport);
        let registry = Arc::clone(&self.registry);

        let entries = BatchRunner::new(limit)
            .run(addresses, move |address| {
                let transport = Arc::clone(&transport);
                let registry = Arc::clone(&registry);
                async move {
                    let result = probe_device(transport.as_ref(), address).await;
                    let stored = reconcile(registry.as_ref(), &result, Utc::now(), mode);
                    (result, stored)
                }
            })
            .await;

        let mut results = Vec::with_capacity(entries.len());
        let mut registry_error = None;
        for entry in entries {
            match entry.outcome {
                Ok((result, Ok(()))) => results.push(result),
                Ok((result, Err(e))) => {
                    error!(address = %result.address, error = %e, "registry write failed");
                    registry_error.get_or_insert(e);
                    results.push(result);
                }
                Err(failure) => results.push(ProbeResult::offline(
                    entry.address,
                    DeviceError::new(DeviceErrorKind::TaskFailed, failure.to_string()),
                )),
            }
        }

        let flushed = self.flush().await;
        if let Err(e) = &flushed {
            error!(error = %e, "registry flush failed");
        }
        match (registry_error, flushed) {
            (Some(e), _) | (None, Err(e)) => Err(e),
            (None, Ok(())) => Ok(results),
        }
    }
}
