//! Error types.

use trust_dns_proto::error::ProtoError;

/// Error enumerates the possible DDNS error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a pipe backend request line doesn't have exactly six tab separated fields.
    #[error("malformed request: found {0} fields, expected 6")]
    MalformedRequest(usize),

    /// Returned when a queried name isn't a host below
    /// [`Config::domain`][`crate::config::Config::domain`].
    #[error("query name \"{0}\" does not correspond to our domain")]
    DomainMismatch(String),

    /// Returned by a [`HostStore`][`crate::host_store::HostStore`] when a hostname was never
    /// registered, or when its registration has expired. The two cases are indistinguishable.
    #[error("host \"{0}\" does not exist")]
    HostNotFound(String),

    /// Returned when an `A` query hits a host with an IPv6 address, or an `AAAA` query hits a
    /// host with an IPv4 address.
    #[error("IP address of \"{hostname}\" is not valid for a {requested} record (found {actual})")]
    RecordTypeMismatch {
        hostname: String,
        requested: String,
        actual: String,
    },

    /// Returned for query types other than `SOA`, `NS`, `A`, `AAAA` and `ANY`.
    #[error("unsupported query type \"{0}\"")]
    UnsupportedQueryType(String),

    /// Returned when the expiration time of a host record can't be represented.
    #[error("host expiration of {0:?} is out of range")]
    ExpirationOutOfRange(std::time::Duration),

    /// Returned when a pipe backend input line isn't valid UTF-8.
    #[error("request line is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Returned when the pipe backend input failed too many times in a row.
    #[error("giving up after {0} consecutive read errors")]
    TooManyReadErrors(u32),

    /// Returned when the pipe backend output task panicked or was cancelled.
    #[error("response writer task failed")]
    WriterTask(#[from] tokio::task::JoinError),

    /// Returned when clients use a hostname that isn't a single valid DNS label.
    #[error("hostname \"{0}\" is not valid")]
    InvalidHostname(String),

    /// Returned when clients try to register a hostname that is already taken.
    #[error("hostname \"{0}\" has already been registered")]
    HostAlreadyRegistered(String),

    /// Returned when clients supply the wrong token to update a host.
    #[error("wrong token supplied for \"{0}\"")]
    TokenMismatch(String),

    /// Returned when the address of an updating client can't be determined.
    #[error("sender IP address \"{0}\" is not in the right format")]
    InvalidRemoteAddr(String),

    /// Returned when the [`Config`][`crate::config::Config`] is missing values or has
    /// inconsistent values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Returned when [`Config::domain`][`crate::config::Config::domain`] or
    /// [`Config::soa_fqdn`][`crate::config::Config::soa_fqdn`] isn't a valid DNS name.
    #[error("invalid domain name \"{0}\"")]
    InvalidDomain(String, #[source] ProtoError),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when processing JSON from disk (e.g. to
    /// [trying to load a `Config`][crate::config::Config::try_from_file], or to read the state of a
    /// [`FileHostStore`][crate::host_store::file::FileHostStore]) fails due to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error originates from the storage layer rather than from the request itself.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::IO(_) | Error::InvalidJSON(_))
    }
}
