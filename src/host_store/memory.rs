use crate::error::Error;
use crate::host_store::{store_key, Host, HostStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct Entry {
    host: Host,
    #[serde(with = "time::serde::timestamp")]
    expires_at: OffsetDateTime,
}

impl Entry {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryHostStore {
    hosts: HashMap<String, Entry>,
    #[serde(skip)]
    expiration: Duration,
}

impl InMemoryHostStore {
    pub fn new(expiration: Duration) -> Self {
        InMemoryHostStore {
            hosts: HashMap::default(),
            expiration,
        }
    }

    pub(super) fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub(super) fn lookup(&self, hostname: &str) -> Result<Host, Error> {
        self.hosts
            .get(&store_key(hostname))
            .filter(|entry| entry.is_live(OffsetDateTime::now_utc()))
            .map(|entry| entry.host.clone())
            .ok_or_else(|| Error::HostNotFound(hostname.to_string()))
    }

    pub(super) fn upsert(&mut self, host: Host) -> Result<(), Error> {
        let now = OffsetDateTime::now_utc();
        let expires_at = time::Duration::try_from(self.expiration)
            .ok()
            .and_then(|expiration| now.checked_add(expiration))
            .ok_or(Error::ExpirationOutOfRange(self.expiration))?;
        self.hosts.retain(|_, entry| entry.is_live(now));
        self.hosts
            .insert(store_key(&host.hostname), Entry { host, expires_at });
        Ok(())
    }
}

#[async_trait::async_trait]
impl HostStore for InMemoryHostStore {
    async fn get_host(&self, hostname: &str) -> Result<Host, Error> {
        self.lookup(hostname)
    }

    async fn set_host(&mut self, host: Host) -> Result<(), Error> {
        self.upsert(host)
    }
}
