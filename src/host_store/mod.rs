//! Dynamic host record storage.
//!
//! Supports a generic interface for registering hostnames and updating the IP address they
//! resolve to. Records expire once they haven't been updated for the configured
//! [`Config::host_expiration_days`][`crate::config::Config::host_expiration_days`]; expiration
//! is the only way a record is ever removed.
//!
//! Two implementations are provided, [`memory::InMemoryHostStore`] and [`file::FileHostStore`].
//! The former is not durable across restarts and is only visible within one process. The latter
//! keeps its state in a JSON file that is re-read for every lookup, so the HTTP API and the
//! PowerDNS pipe backend can run as separate processes sharing one file.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;

pub mod file;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use file::FileHostStore;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryHostStore;

/// IP address assigned to freshly registered hosts until their first update.
pub const REGISTRATION_IP: &str = "127.0.0.1";

/// `DynHostStore` is a type alias for a [`HostStore`] that can be used by multiple read/write
/// consumers that coordinate through an [`Arc`] and a [`RwLock`] wrapping the [`HostStore`].
#[allow(clippy::module_name_repetitions)]
pub type DynHostStore = Arc<RwLock<dyn HostStore + Send + Sync>>;

/// A registered hostname, the address it resolves to and the secret token required to update it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Host {
    pub hostname: String,
    pub ip: String,
    pub token: String,
}

/// The kind of address record a [`Host`] is served as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    A,
    Aaaa,
}

impl Display for AddressKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::A => f.write_str("A"),
            AddressKind::Aaaa => f.write_str("AAAA"),
        }
    }
}

impl Host {
    /// Create the record for a new registration: the address is [`REGISTRATION_IP`] and a fresh
    /// token is generated.
    pub fn register(hostname: &str) -> Self {
        Host {
            hostname: hostname.to_string(),
            ip: REGISTRATION_IP.to_string(),
            token: Self::generate_token(hostname),
        }
    }

    fn generate_token(hostname: &str) -> String {
        let mut hash = Sha1::new();
        hash.update(OffsetDateTime::now_utc().unix_timestamp_nanos().to_string());
        hash.update(hostname);
        format!("{:x}", hash.finalize())
    }

    /// Addresses containing a `.` are IPv4 and served as `A` records, anything else as `AAAA`.
    pub fn address_kind(&self) -> AddressKind {
        if self.ip.contains('.') {
            AddressKind::A
        } else {
            AddressKind::Aaaa
        }
    }
}

/// Stores match hostnames case-insensitively.
pub(crate) fn store_key(hostname: &str) -> String {
    hostname.to_ascii_lowercase()
}

/// An async trait describing storage of [`Host`] records keyed by hostname, with sliding
/// expiration.
#[async_trait::async_trait]
pub trait HostStore {
    /// Get the record for the given hostname. Returns [`Error::HostNotFound`] both for hostnames
    /// that were never registered and for records that have expired.
    async fn get_host(&self, hostname: &str) -> Result<Host, Error>;

    /// Insert or replace the record for `host.hostname`, pushing its expiration forward.
    async fn set_host(&mut self, host: Host) -> Result<(), Error>;

    /// Whether a live record exists for the given hostname.
    async fn host_exists(&self, hostname: &str) -> Result<bool, Error> {
        match self.get_host(hostname).await {
            Ok(_) => Ok(true),
            Err(Error::HostNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_kind_follows_ip() {
        let mut host = Host::register("www");
        assert_eq!(host.address_kind(), AddressKind::A);
        host.ip = "2001:db8:85a3::8a2e:370:7334".to_string();
        assert_eq!(host.address_kind(), AddressKind::Aaaa);
        assert_eq!(host.address_kind().to_string(), "AAAA");
    }

    #[test]
    fn registration_defaults() {
        let host = Host::register("www");
        assert_eq!(host.hostname, "www");
        assert_eq!(host.ip, REGISTRATION_IP);
        assert_eq!(host.token.len(), 40);
        assert!(host.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(host.token, Host::register("other").token);
    }
}
