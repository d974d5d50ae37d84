use crate::error::Error;
use serde::Serialize;

const MAX_HOSTNAME_LEN: usize = 63;

/// Check that `hostname` is a single DNS label (letters, digits and inner hyphens, at most 63
/// characters) and return it lower-cased.
pub(super) fn valid_hostname(hostname: &str) -> Result<String, Error> {
    let valid = !hostname.is_empty()
        && hostname.len() <= MAX_HOSTNAME_LEN
        && hostname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !hostname.starts_with('-')
        && !hostname.ends_with('-');
    if valid {
        Ok(hostname.to_ascii_lowercase())
    } else {
        Err(Error::InvalidHostname(hostname.to_string()))
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct AvailabilityResult {
    pub available: bool,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct RegistrationResult {
    pub hostname: String,
    pub token: String,
    pub update_link: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct UpdateResult {
    pub current_ip: String,
    pub status: String,
}
