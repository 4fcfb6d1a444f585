// rigfleet-api: Async Rust client for the rig firmware HTTP API

pub mod client;
pub mod error;
pub mod models;
pub mod system;
pub mod transport;

pub use client::DeviceClient;
pub use error::Error;
pub use models::{PushAck, SystemInfo};
pub use transport::TransportConfig;
