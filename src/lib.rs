//! DDNS
//!
//! A self-hosted dynamic DNS service built around the [PowerDNS] authoritative server.
//!
//! Users register a hostname below the configured domain through the [HTTP API][crate::api]
//! and receive a secret update link. Calling that link stores the caller's IP address for the
//! hostname. PowerDNS resolves the hostnames by delegating lookups to the
//! [pipe backend][crate::backend]. Hostnames that aren't updated within the configured number
//! of days expire.
//!
//! [PowerDNS]: https://www.powerdns.com
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod host_store;

use crate::host_store::{file, memory};
pub use api::new as new_http;
pub use backend::new as new_backend;
pub use config::{Config, SharedConfig};
pub use file::FileHostStore;
pub use host_store::{DynHostStore, Host, HostStore};
pub use memory::InMemoryHostStore;
