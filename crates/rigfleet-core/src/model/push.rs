// ── Config push results ──

use std::net::Ipv4Addr;

use rigfleet_api::PushAck;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::device::DeviceError;

/// Result of pushing a config patch to one device.
#[derive(Debug, Clone, PartialEq)]
pub struct PushOutcome {
    pub address: Ipv4Addr,
    pub result: Result<Option<PushAck>, DeviceError>,
}

impl PushOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Wire shape: `{address, success, data}` or `{address, success, error, errorKind}`.
/// An empty acknowledgement is `"data": null`.
impl Serialize for PushOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("address", &self.address)?;
        map.serialize_entry("success", &self.is_success())?;
        match &self.result {
            Ok(ack) => map.serialize_entry("data", ack)?,
            Err(err) => {
                map.serialize_entry("error", &err.message)?;
                map.serialize_entry("errorKind", &err.kind)?;
            }
        }
        map.end()
    }
}

/// Per-device outcomes of a fleet-wide push, split by result.
///
/// Every tracked device appears in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PushReport {
    pub succeeded: Vec<PushOutcome>,
    pub failed: Vec<PushOutcome>,
}

impl PushReport {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = PushOutcome>) -> Self {
        let (mut succeeded, mut failed): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(PushOutcome::is_success);
        succeeded.sort_by_key(|o| o.address);
        failed.sort_by_key(|o| o.address);
        Self { succeeded, failed }
    }

    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All outcomes in address order.
    pub fn into_entries(self) -> Vec<PushOutcome> {
        let mut all = self.succeeded;
        all.extend(self.failed);
        all.sort_by_key(|o| o.address);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn report_partitions_and_orders() {
        let a = Ipv4Addr::new(10, 0, 0, 2);
        let b = Ipv4Addr::new(10, 0, 0, 1);
        let c = Ipv4Addr::new(10, 0, 0, 3);
        let report = PushReport::from_outcomes([
            PushOutcome { address: a, result: Ok(None) },
            PushOutcome {
                address: c,
                result: Err(DeviceError::new(DeviceErrorKind::Timeout, "slow")),
            },
            PushOutcome { address: b, result: Ok(None) },
        ]);

        assert_eq!(report.len(), 3);
        assert_eq!(
            report.succeeded.iter().map(|o| o.address).collect::<Vec<_>>(),
            vec![b, a]
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            report.into_entries().iter().map(|o| o.address).collect::<Vec<_>>(),
            vec![b, a, c]
        );
    }

    #[test]
    fn outcome_wire_shape() {
        let ok = PushOutcome {
            address: Ipv4Addr::new(10, 0, 0, 1),
            result: Ok(Some(PushAck::Json(json!({ "status": "ok" })))),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "address": "10.0.0.1", "success": true, "data": { "status": "ok" } })
        );

        let empty = PushOutcome {
            address: Ipv4Addr::new(10, 0, 0, 3),
            result: Ok(None),
        };
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            json!({ "address": "10.0.0.3", "success": true, "data": null })
        );

        let failed = PushOutcome {
            address: Ipv4Addr::new(10, 0, 0, 2),
            result: Err(DeviceError::new(DeviceErrorKind::HttpStatus, "rejected")),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({
                "address": "10.0.0.2",
                "success": false,
                "error": "rejected",
                "errorKind": "http-status"
            })
        );
    }
}
