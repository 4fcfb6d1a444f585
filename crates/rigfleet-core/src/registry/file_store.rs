// ── JSON file registry ──
//
// Records live in a DashMap. Mutations only mark the map dirty; `flush`
// rewrites the whole file via a temp file and rename, so readers never
// observe a torn write.

use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use super::Registry;
use crate::error::CoreError;
use crate::model::{DeviceError, DeviceRecord, DeviceState};

/// Name of the registry file inside the data directory.
pub const REGISTRY_FILE: &str = "devices.json";

/// Registry backed by a JSON file, or held purely in memory.
#[derive(Debug)]
pub struct FileRegistry {
    records: DashMap<Ipv4Addr, DeviceRecord>,
    path: Option<PathBuf>,
    dirty: AtomicBool,
    flush_lock: Mutex<()>,
}

impl FileRegistry {
    /// Open (or create) the registry in `data_dir`.
    ///
    /// The directory is created if missing. A file that exists but cannot
    /// be parsed is an error; it is never silently replaced.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, CoreError> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| CoreError::registry_io(format!("create {}", dir.display()), e))?;

        let path = dir.join(REGISTRY_FILE);
        let records = DashMap::new();
        match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => {}
            Ok(contents) => {
                let loaded: Vec<DeviceRecord> = serde_json::from_str(&contents).map_err(|e| {
                    CoreError::registry_io(
                        format!("parse {}", path.display()),
                        std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                    )
                })?;
                for record in loaded {
                    records.insert(record.address, record);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CoreError::registry_io(format!("read {}", path.display()), e)),
        }

        info!(path = %path.display(), devices = records.len(), "registry opened");
        Ok(Self {
            records,
            path: Some(path),
            dirty: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
        })
    }

    /// A registry that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            records: DashMap::new(),
            path: None,
            dirty: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn sorted_records(&self) -> Vec<DeviceRecord> {
        let mut all: Vec<DeviceRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.address);
        all
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Rewrite the backing file from a snapshot of the current map.
    fn write_snapshot(&self, path: &Path) -> Result<usize, CoreError> {
        let snapshot = self.sorted_records();
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| CoreError::registry_io("serialize registry", std::io::Error::other(e)))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| CoreError::registry_io(format!("write {}", tmp.display()), e))?;
        fs::rename(&tmp, path)
            .map_err(|e| CoreError::registry_io(format!("rename to {}", path.display()), e))?;
        Ok(snapshot.len())
    }
}

impl Registry for FileRegistry {
    fn list_tracked(&self) -> Result<Vec<Ipv4Addr>, CoreError> {
        let mut addresses: Vec<Ipv4Addr> = self.records.iter().map(|r| *r.key()).collect();
        addresses.sort_unstable();
        Ok(addresses)
    }

    fn records(&self) -> Result<Vec<DeviceRecord>, CoreError> {
        Ok(self.sorted_records())
    }

    fn get(&self, address: Ipv4Addr) -> Result<Option<DeviceRecord>, CoreError> {
        Ok(self.records.get(&address).map(|r| r.value().clone()))
    }

    fn track(&self, address: Ipv4Addr, seen_at: DateTime<Utc>) -> Result<DeviceRecord, CoreError> {
        let record = {
            let mut entry = self
                .records
                .entry(address)
                .or_insert_with(|| DeviceRecord::placeholder(address, seen_at));
            entry.last_seen = entry.last_seen.max(seen_at);
            entry.clone()
        };
        self.mark_dirty();
        Ok(record)
    }

    fn upsert(
        &self,
        address: Ipv4Addr,
        hostname: &str,
        state: DeviceState,
        seen_at: DateTime<Utc>,
    ) -> Result<DeviceRecord, CoreError> {
        let record = {
            let mut entry = self
                .records
                .entry(address)
                .or_insert_with(|| DeviceRecord::placeholder(address, seen_at));
            hostname.clone_into(&mut entry.hostname);
            entry.last_seen = entry.last_seen.max(seen_at);
            entry.last_known_state = state;
            entry.clone()
        };
        self.mark_dirty();
        Ok(record)
    }

    fn refresh(
        &self,
        address: Ipv4Addr,
        hostname: &str,
        state: DeviceState,
        seen_at: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        {
            let Some(mut record) = self.records.get_mut(&address) else {
                debug!(%address, "not tracked, refresh skipped");
                return Ok(false);
            };
            hostname.clone_into(&mut record.hostname);
            record.last_seen = record.last_seen.max(seen_at);
            record.last_known_state = state;
        }
        self.mark_dirty();
        Ok(true)
    }

    fn mark_unreachable(&self, address: Ipv4Addr, error: &DeviceError) -> Result<bool, CoreError> {
        {
            let Some(mut record) = self.records.get_mut(&address) else {
                return Ok(false);
            };
            record.last_known_state = DeviceState::Offline {
                error: error.clone(),
            };
        }
        self.mark_dirty();
        Ok(true)
    }

    fn remove(&self, address: Ipv4Addr) -> Result<bool, CoreError> {
        if self.records.remove(&address).is_none() {
            return Ok(false);
        }
        self.mark_dirty();
        Ok(true)
    }

    /// The dirty flag is cleared under the flush lock before the snapshot
    /// is taken, so a mutation racing a flush is either in that snapshot or
    /// leaves the flag set for the next one.
    fn flush(&self) -> Result<(), CoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        match self.write_snapshot(path) {
            Ok(devices) => {
                debug!(devices, "registry flushed");
                Ok(())
            }
            Err(e) => {
                self.mark_dirty();
                Err(e)
            }
        }
    }
}
