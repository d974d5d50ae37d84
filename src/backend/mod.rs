//! PowerDNS [pipe backend].
//!
//! PowerDNS starts `ddns backend /path/to/config.json` as a co-process and talks to it over
//! stdin/stdout, one tab separated line per message. DDNS answers queries for hosts below the
//! configured [`Config::domain`][`crate::config::Config::domain`] from the
//! [host store][crate::host_store].
//!
//! # Handshake
//!
//! PowerDNS opens with a greeting line (e.g. `HELO\t1`), which is answered with
//! `OK\tDDNS Backend` (see [`Config::backend_banner`][`crate::config::Config::backend_banner`]).
//!
//! # Queries
//!
//! Each query arrives as `Q\t<qname>\t<qclass>\t<qtype>\t<id>\t<remote-ip>`. A line with any
//! other number of fields is answered with `FAIL`. Otherwise the answer is at most one `DATA`
//! line followed by `END`.
//!
//! E.g. with domain `example.org`, SOA FQDN `dns.example.org` and host `www` registered with
//! `10.11.12.13`:
//!
//! ```text
//! → Q	www.example.org	IN	ANY	-1	203.0.113.210
//! ← DATA	www.example.org	IN	A	10	-1	10.11.12.13
//! ← END
//! → Q	example.org	IN	SOA	-1	203.0.113.210
//! ← DATA	example.org	IN	SOA	10	-1	dns.example.org. hostmaster.example.org. 1681234567 1800 3600 7200 5
//! ← END
//! → Q	ghost.example.org	IN	A	-1	203.0.113.210
//! ← END
//! ```
//!
//! ## SOA / NS
//!
//! Answered for any name, with the configured SOA FQDN. The SOA serial is the current Unix time.
//!
//! ## A / AAAA / ANY
//!
//! The host is the part of the query name in front of the domain, matched case-insensitively.
//! Hosts whose address contains a `.` are served as `A` records, all others as `AAAA`. An `A`
//! query for an IPv6 host, or an `AAAA` query for an IPv4 host, gets no `DATA` line. `ANY`
//! returns whichever record the host has.
//!
//! Queries that have no answer only get `END`. With
//! [`Config::verbose`][`crate::config::Config::verbose`] set, a `LOG` line with the reason is
//! sent before it.
//!
//! [pipe backend]: https://doc.powerdns.com/authoritative/backends/pipe.html

pub mod query;
pub mod resolver;
pub mod response;
pub mod server;
mod writer;

pub use server::{new, Backend};
