use crate::error::Error;
use crate::host_store::{DynHostStore, FileHostStore, InMemoryHostStore};
use ipnetwork::IpNetwork;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use trust_dns_proto::rr::Name;

pub type SharedConfig = Arc<Config>;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const MAX_HOST_EXPIRATION_DAYS: u32 = 36_500;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub domain: String,
    pub soa_fqdn: String,
    #[serde(default = "defaults::host_expiration_days")]
    pub host_expiration_days: u32,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub host_store_path: Option<String>,
    #[serde(default = "defaults::api_bind_addr")]
    pub api_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "defaults::api_timeout")]
    pub api_timeout: Duration,
    #[serde(default)]
    pub trusted_proxies: Vec<IpNetwork>,
    #[serde(default = "defaults::backend_banner")]
    pub backend_banner: String,
    #[serde(default = "defaults::backend_queue_capacity")]
    pub backend_queue_capacity: usize,
    #[serde(default = "defaults::backend_max_read_errors")]
    pub backend_max_read_errors: u32,
}

mod defaults {
    use std::net::SocketAddr;
    use std::time::Duration;

    pub(super) fn host_expiration_days() -> u32 {
        10
    }

    pub(super) fn api_bind_addr() -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], 8080))
    }

    pub(super) fn api_timeout() -> Duration {
        Duration::from_secs(10)
    }

    pub(super) fn backend_banner() -> String {
        "DDNS Backend".to_string()
    }

    pub(super) fn backend_queue_capacity() -> usize {
        5
    }

    pub(super) fn backend_max_read_errors() -> u32 {
        16
    }
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.normalized()
    }

    /// Build a config for the given zone and SOA FQDN with every other setting at its default.
    pub fn new(domain: &str, soa_fqdn: &str) -> Result<Self, Error> {
        Config {
            domain: domain.to_string(),
            soa_fqdn: soa_fqdn.to_string(),
            host_expiration_days: defaults::host_expiration_days(),
            verbose: false,
            host_store_path: None,
            api_bind_addr: defaults::api_bind_addr(),
            api_timeout: defaults::api_timeout(),
            trusted_proxies: Vec::default(),
            backend_banner: defaults::backend_banner(),
            backend_queue_capacity: defaults::backend_queue_capacity(),
            backend_max_read_errors: defaults::backend_max_read_errors(),
        }
        .normalized()
    }

    /// Validate the config, lower-casing `domain` and making sure it starts with a `.` so it
    /// can be matched as a suffix of query names.
    pub fn normalized(mut self) -> Result<Self, Error> {
        let domain = self.domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if domain.trim_start_matches('.').is_empty() {
            return Err(Error::InvalidConfig("domain must not be empty".into()));
        }
        let soa_fqdn = self.soa_fqdn.trim().trim_end_matches('.').to_string();
        if soa_fqdn.is_empty() {
            return Err(Error::InvalidConfig("soa_fqdn must not be empty".into()));
        }
        if self.host_expiration_days > MAX_HOST_EXPIRATION_DAYS {
            return Err(Error::InvalidConfig(format!(
                "host_expiration_days must be at most {MAX_HOST_EXPIRATION_DAYS}"
            )));
        }
        if self.backend_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "backend_queue_capacity must be at least 1".into(),
            ));
        }
        if self.backend_max_read_errors == 0 {
            return Err(Error::InvalidConfig(
                "backend_max_read_errors must be at least 1".into(),
            ));
        }

        self.domain = if domain.starts_with('.') {
            domain
        } else {
            format!(".{domain}")
        };
        self.soa_fqdn = soa_fqdn;
        Self::check_name(self.domain.trim_start_matches('.'))?;
        Self::check_name(&self.soa_fqdn)?;
        Ok(self)
    }

    fn check_name(name: &str) -> Result<(), Error> {
        Name::from_ascii(name)
            .map(|_| ())
            .map_err(|err| Error::InvalidDomain(name.to_string(), err))
    }

    /// Time after the last update at which a host record is released.
    pub fn host_expiration(&self) -> Duration {
        Duration::from_secs(u64::from(self.host_expiration_days) * SECONDS_PER_DAY)
    }

    /// Whether `X-Forwarded-For` headers sent by `peer` should be trusted.
    pub fn is_trusted_proxy(&self, peer: IpAddr) -> bool {
        self.trusted_proxies
            .iter()
            .any(|network| network.contains(peer))
    }

    /// Build the host store described by the config: a [`FileHostStore`] when
    /// `host_store_path` is set, an [`InMemoryHostStore`] otherwise.
    pub async fn host_store(&self) -> Result<DynHostStore, Error> {
        let expiration = self.host_expiration();
        let host_store: DynHostStore = match &self.host_store_path {
            Some(path) => {
                let store = FileHostStore::try_from_file(path, expiration).await?;
                tracing::debug!("using host store state file {path}");
                Arc::new(RwLock::new(store))
            }
            None => Arc::new(RwLock::new(InMemoryHostStore::new(expiration))),
        };
        Ok(host_store)
    }
}
