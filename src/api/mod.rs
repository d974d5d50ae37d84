//! HTTP API for registering hostnames and updating their addresses.
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/available/:hostname` (GET)
//!
//!   Returns HTTP 200 (OK) and a JSON body of the form:
//!
//!   ```json
//!   { "available": true }
//!   ```
//!
//!   `available` is `false` when the hostname is taken or isn't a valid hostname.
//!
//! ## `/new/:hostname` (GET)
//!
//!   Registers `hostname` below [`Config::domain`][`crate::config::Config::domain`]. The host
//!   initially resolves to `127.0.0.1`. Returns HTTP 200 (OK) and a JSON body of the form:
//!
//!   ```json
//!   {
//!     "hostname": "pi",
//!     "token": "0b4f7d4e2f4c64a0c2b0b1b1f1a7d1e4a6a8c3f1",
//!     "update_link": "/update/pi/0b4f7d4e2f4c64a0c2b0b1b1f1a7d1e4a6a8c3f1"
//!   }
//!   ```
//!
//!   Hostnames are a single DNS label: 1 to 63 letters, digits or hyphens, not starting or ending
//!   with a hyphen. They are lower-cased. Returns HTTP 404 (Not Found) for invalid hostnames and
//!   HTTP 403 (Forbidden) when the hostname is already registered.
//!
//! ## `/update/:hostname/:token` (GET)
//!
//!   Points `hostname` at the address of the client and restarts its expiration period. The
//!   client address is the TCP peer, or the first `X-Forwarded-For` entry when the peer is one of
//!   the [`Config::trusted_proxies`][`crate::config::Config::trusted_proxies`]. Returns HTTP 200
//!   (OK) and a JSON body of the form:
//!
//!   ```json
//!   { "current_ip": "198.51.100.7", "status": "Successfully updated" }
//!   ```
//!
//!   Returns HTTP 404 (Not Found) for invalid, unknown or expired hostnames, HTTP 403
//!   (Forbidden) for a wrong token and HTTP 400 (Bad Request) when the client address can't be
//!   parsed.
//!
//! Errors are reported as `{"error": "..."}`.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::new;
