// zpa-api: Async Rust client for the Zscaler Private Access management API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod application_segments;
mod policy;
mod segment_groups;

pub use auth::{Cloud, Credentials};
pub use client::ZpaClient;
pub use error::Error;
pub use transport::{RetryPolicy, TlsMode, TransportConfig};
