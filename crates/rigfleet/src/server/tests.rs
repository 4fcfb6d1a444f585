#![allow(clippy::unwrap_used)]
// Router tests over an in-process fake transport.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use rigfleet_api::{PushAck, SystemInfo};
use chrono::{DateTime, Utc};
use rigfleet_core::{
    ConfigPatch, CoreError, DeviceError, DeviceRecord, DeviceState, DeviceTransport, FileRegistry,
    Fleet, FleetConfig, Registry,
};

use super::router;

// ── Fake transport ──────────────────────────────────────────────────

#[derive(Clone)]
enum Rig {
    Online(Value),
    Rejects(&'static str),
}

#[derive(Clone, Default)]
struct FakeRigs {
    rigs: Arc<HashMap<Ipv4Addr, Rig>>,
    pushes: Arc<Mutex<Vec<(Ipv4Addr, Value)>>>,
}

impl FakeRigs {
    fn new(rigs: impl IntoIterator<Item = (Ipv4Addr, Rig)>) -> Self {
        Self {
            rigs: Arc::new(rigs.into_iter().collect()),
            ..Self::default()
        }
    }

    fn unreachable(address: Ipv4Addr) -> CoreError {
        CoreError::DeviceUnreachable {
            address: address.to_string(),
            reason: "Connection refused".into(),
        }
    }
}

impl DeviceTransport for FakeRigs {
    async fn fetch_info(&self, address: Ipv4Addr) -> Result<SystemInfo, CoreError> {
        match self.rigs.get(&address) {
            Some(Rig::Online(info)) => Ok(serde_json::from_value(info.clone()).unwrap()),
            Some(Rig::Rejects(message)) => Err(CoreError::DeviceRejected {
                status: 500,
                message: (*message).to_owned(),
            }),
            None => Err(Self::unreachable(address)),
        }
    }

    async fn apply_settings(
        &self,
        address: Ipv4Addr,
        patch: &ConfigPatch,
    ) -> Result<Option<PushAck>, CoreError> {
        self.pushes
            .lock()
            .unwrap()
            .push((address, serde_json::to_value(patch).unwrap()));
        match self.rigs.get(&address) {
            Some(Rig::Online(_)) => Ok(None),
            Some(Rig::Rejects(message)) => Err(CoreError::DeviceRejected {
                status: 422,
                message: (*message).to_owned(),
            }),
            None => Err(Self::unreachable(address)),
        }
    }
}

// ── Failing registry ────────────────────────────────────────────────

/// In-memory registry that cannot make anything durable.
struct ReadOnlyDisk(FileRegistry);

impl Registry for ReadOnlyDisk {
    fn list_tracked(&self) -> Result<Vec<Ipv4Addr>, CoreError> {
        self.0.list_tracked()
    }

    fn records(&self) -> Result<Vec<DeviceRecord>, CoreError> {
        self.0.records()
    }

    fn get(&self, address: Ipv4Addr) -> Result<Option<DeviceRecord>, CoreError> {
        self.0.get(address)
    }

    fn track(&self, address: Ipv4Addr, seen_at: DateTime<Utc>) -> Result<DeviceRecord, CoreError> {
        self.0.track(address, seen_at)
    }

    fn upsert(
        &self,
        address: Ipv4Addr,
        hostname: &str,
        state: DeviceState,
        seen_at: DateTime<Utc>,
    ) -> Result<DeviceRecord, CoreError> {
        self.0.upsert(address, hostname, state, seen_at)
    }

    fn refresh(
        &self,
        address: Ipv4Addr,
        hostname: &str,
        state: DeviceState,
        seen_at: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        self.0.refresh(address, hostname, state, seen_at)
    }

    fn mark_unreachable(&self, address: Ipv4Addr, error: &DeviceError) -> Result<bool, CoreError> {
        self.0.mark_unreachable(address, error)
    }

    fn remove(&self, address: Ipv4Addr) -> Result<bool, CoreError> {
        self.0.remove(address)
    }

    fn flush(&self) -> Result<(), CoreError> {
        Err(CoreError::RegistryIo {
            context: "write devices.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn ip(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, last)
}

fn info(hostname: &str) -> Value {
    json!({
        "hostname": hostname,
        "stratumURL": "public-pool.io",
        "stratumPort": 21496,
        "stratumUser": "bc1q.rig",
        "hashRate": 480.2
    })
}

fn build_app(rigs: &FakeRigs, tracked: &[(Ipv4Addr, &str)]) -> (Router, Arc<FileRegistry>) {
    let registry = Arc::new(FileRegistry::in_memory());
    let seen = chrono::Utc::now();
    for (address, hostname) in tracked {
        registry
            .upsert(*address, hostname, DeviceState::Unknown, seen)
            .unwrap();
    }
    let shared: Arc<dyn Registry> = registry.clone();
    let fleet = Fleet::new(&FleetConfig::default(), rigs.clone(), shared);
    (router(Arc::new(fleet), None), registry)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ── Health ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_tracked_count() {
    let rigs = FakeRigs::default();
    let (app, _) = build_app(&rigs, &[(ip(5), "rig-5"), (ip(6), "rig-6")]);

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "tracked": 2 }));
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn list_returns_every_tracked_device() {
    let rigs = FakeRigs::new([(ip(5), Rig::Online(info("rig-5")))]);
    let (app, registry) = build_app(&rigs, &[(ip(5), "rig-5"), (ip(6), "rig-6")]);

    let (status, body) = call(&app, Method::GET, "/api/devices", None).await;
    assert_eq!(status, StatusCode::OK);

    let devices = body.as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0]["address"], "10.0.0.5");
    assert_eq!(devices[0]["online"], true);
    assert_eq!(devices[0]["settings"]["primary"]["port"], 21496);
    assert_eq!(devices[1]["address"], "10.0.0.6");
    assert_eq!(devices[1]["online"], false);
    assert_eq!(devices[1]["hostname"], "rig-6");
    assert_eq!(devices[1]["errorKind"], "unreachable");

    let stored = registry.get(ip(6)).unwrap().unwrap();
    assert_eq!(stored.hostname, "rig-6");
    assert_eq!(stored.last_known_state.label(), "offline");
}

#[tokio::test]
async fn add_online_device_is_created() {
    let rigs = FakeRigs::new([(ip(7), Rig::Online(info("rig-7")))]);
    let (app, registry) = build_app(&rigs, &[]);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/devices",
        Some(json!({ "address": "10.0.0.7" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["hostname"], "rig-7");
    assert_eq!(body["online"], true);
    assert_eq!(registry.list_tracked().unwrap(), vec![ip(7)]);
}

#[tokio::test]
async fn add_offline_device_is_tracked_but_not_found() {
    let rigs = FakeRigs::default();
    let (app, registry) = build_app(&rigs, &[]);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/devices",
        Some(json!({ "address": "10.0.0.8" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Device added, but it appears to be offline.");
    assert_eq!(body["device"]["online"], false);
    assert_eq!(registry.list_tracked().unwrap(), vec![ip(8)]);
}

#[tokio::test]
async fn add_rejects_bad_input() {
    let rigs = FakeRigs::default();
    let (app, registry) = build_app(&rigs, &[]);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/devices",
        Some(json!({ "address": "10.0.0.999" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("10.0.0.999"));

    let (status, body) = call(&app, Method::POST, "/api/devices", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert!(registry.list_tracked().unwrap().is_empty());
}

#[tokio::test]
async fn get_device_reads_the_registry() {
    let rigs = FakeRigs::default();
    let (app, _) = build_app(&rigs, &[(ip(5), "rig-5")]);

    let (status, body) = call(&app, Method::GET, "/api/devices/10.0.0.5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hostname"], "rig-5");
    assert_eq!(body["lastKnownState"]["status"], "unknown");
    assert!(body["lastSeen"].is_string());

    let (status, _) = call(&app, Method::GET, "/api/devices/10.0.0.9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/api/devices/not-an-ip", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let rigs = FakeRigs::default();
    let (app, registry) = build_app(&rigs, &[(ip(5), "rig-5")]);

    let (status, body) = call(&app, Method::DELETE, "/api/devices/10.0.0.5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "removed": true }));

    let (status, body) = call(&app, Method::DELETE, "/api/devices/10.0.0.5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "removed": false }));
    assert!(registry.list_tracked().unwrap().is_empty());

    let (status, _) = call(&app, Method::DELETE, "/api/devices/bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registry_failure_is_a_server_error() {
    let rigs = FakeRigs::new([(ip(5), Rig::Online(info("rig-5")))]);
    let registry = ReadOnlyDisk(FileRegistry::in_memory());
    registry.track(ip(5), Utc::now()).unwrap();
    registry.track(ip(6), Utc::now()).unwrap();
    let shared: Arc<dyn Registry> = Arc::new(registry);
    let app = router(
        Arc::new(Fleet::new(&FleetConfig::default(), rigs, shared)),
        None,
    );

    let (status, body) = call(&app, Method::GET, "/api/devices", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Registry I/O error"));

    let (status, _) = call(&app, Method::DELETE, "/api/devices/10.0.0.6", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = call(&app, Method::DELETE, "/api/devices/bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Scan ────────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_returns_only_responders() {
    let rigs = FakeRigs::new([(ip(3), Rig::Online(info("rig-3")))]);
    let (app, registry) = build_app(&rigs, &[]);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/scan",
        Some(json!({ "subnet": "10.0.0.0/29" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["address"], "10.0.0.3");
    assert_eq!(found[0]["hostname"], "rig-3");
    assert_eq!(registry.list_tracked().unwrap(), vec![ip(3)]);
}

#[tokio::test]
async fn scan_rejects_invalid_subnet() {
    let rigs = FakeRigs::default();
    let (app, _) = build_app(&rigs, &[]);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/scan",
        Some(json!({ "subnet": "10.0.0.0/33" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("10.0.0.0/33"));
}

// ── Push ────────────────────────────────────────────────────────────

#[tokio::test]
async fn push_reports_every_tracked_device() {
    let rigs = FakeRigs::new([
        (ip(5), Rig::Online(info("rig-5"))),
        (ip(6), Rig::Rejects("invalid port")),
    ]);
    let (app, _) = build_app(&rigs, &[(ip(5), "rig-5"), (ip(6), "rig-6"), (ip(7), "rig-7")]);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/devices/update",
        Some(json!({ "stratumPort": "3333", "comment": "ignored" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "address": "10.0.0.5", "success": true, "data": null },
            { "address": "10.0.0.6", "success": false, "error": "invalid port", "errorKind": "http-status" },
            {
                "address": "10.0.0.7",
                "success": false,
                "error": "Cannot connect to 10.0.0.7: Connection refused",
                "errorKind": "unreachable"
            },
        ])
    );

    let pushes = rigs.pushes.lock().unwrap();
    assert_eq!(pushes.len(), 3);
    assert!(pushes.iter().all(|(_, body)| *body == json!({ "stratumPort": 3333 })));
}

#[tokio::test]
async fn push_alias_rejects_uncoercible_values_without_calls() {
    let rigs = FakeRigs::new([(ip(5), Rig::Online(info("rig-5")))]);
    let (app, _) = build_app(&rigs, &[(ip(5), "rig-5")]);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/update-all",
        Some(json!({ "stratumPort": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("stratumPort"));
    assert!(rigs.pushes.lock().unwrap().is_empty());
}
