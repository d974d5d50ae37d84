use crate::backend::query::{Query, QueryType};
use crate::config::SharedConfig;
use crate::error::Error;
use crate::host_store::{AddressKind, DynHostStore};
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};
use time::OffsetDateTime;

/// TTL of every answer. Kept short so address updates propagate quickly.
pub const TTL: u32 = 10;

/// The record type of an [`Answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Soa,
    Ns,
    Address(AddressKind),
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Soa => f.write_str("SOA"),
            RecordType::Ns => f.write_str("NS"),
            RecordType::Address(kind) => Display::fmt(kind, f),
        }
    }
}

/// A single record answering a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
}

impl Answer {
    fn new(record_type: RecordType, content: String) -> Self {
        Answer {
            record_type,
            content,
            ttl: TTL,
        }
    }
}

/// Maps queries to answers using the zone settings from the config and the hosts from a
/// [`DynHostStore`].
pub struct Resolver {
    config: SharedConfig,
    hosts: DynHostStore,
    last_serial: AtomicI64,
}

impl Resolver {
    pub fn new(config: SharedConfig, hosts: DynHostStore) -> Self {
        Resolver {
            config,
            hosts,
            last_serial: AtomicI64::new(0),
        }
    }

    /// Answer the query, or return why there is no answer.
    ///
    /// # Errors
    ///
    /// [`Error::DomainMismatch`], [`Error::HostNotFound`], [`Error::RecordTypeMismatch`] and
    /// [`Error::UnsupportedQueryType`] describe queries without an answer. Storage errors from
    /// the host store are passed through.
    pub async fn resolve(&self, query: &Query) -> Result<Answer, Error> {
        match &query.query_type {
            QueryType::Soa => Ok(Answer::new(RecordType::Soa, self.soa_content())),
            QueryType::Ns => Ok(Answer::new(
                RecordType::Ns,
                format!("{}.", self.config.soa_fqdn),
            )),
            QueryType::A | QueryType::Aaaa | QueryType::Any => self.resolve_address(query).await,
            QueryType::Other(other) => Err(Error::UnsupportedQueryType(other.clone())),
        }
    }

    async fn resolve_address(&self, query: &Query) -> Result<Answer, Error> {
        let hostname = self.extract_hostname(&query.name)?;
        let host = self.hosts.read().await.get_host(&hostname).await?;

        let actual = host.address_kind();
        let requested = match query.query_type {
            QueryType::A => Some(AddressKind::A),
            QueryType::Aaaa => Some(AddressKind::Aaaa),
            _ => None,
        };
        if let Some(requested) = requested {
            if requested != actual {
                return Err(Error::RecordTypeMismatch {
                    hostname,
                    requested: requested.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        Ok(Answer::new(RecordType::Address(actual), host.ip))
    }

    /// Extract the host part of a query name: `pi.d.example.org` -> `pi` for domain
    /// `.d.example.org`.
    fn extract_hostname(&self, query_name: &str) -> Result<String, Error> {
        let query_name = query_name.to_ascii_lowercase();
        match query_name.strip_suffix(self.config.domain.as_str()) {
            Some(hostname) if !hostname.is_empty() => Ok(hostname.to_string()),
            _ => Err(Error::DomainMismatch(query_name)),
        }
    }

    fn soa_content(&self) -> String {
        format!(
            "{}. hostmaster{}. {} 1800 3600 7200 5",
            self.config.soa_fqdn,
            self.config.domain,
            self.serial()
        )
    }

    /// The zone serial is the current Unix time, never going backwards within this process.
    fn serial(&self) -> i64 {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let previous = self.last_serial.fetch_max(now, Ordering::Relaxed);
        previous.max(now)
    }
}
