use crate::error::Error;
use std::fmt::{self, Display, Formatter};

/// Query types the backend knows how to answer. Everything else is kept verbatim in
/// [`QueryType::Other`] so it can be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryType {
    Soa,
    Ns,
    A,
    Aaaa,
    Any,
    Other(String),
}

impl From<&str> for QueryType {
    fn from(value: &str) -> Self {
        match value {
            "SOA" => QueryType::Soa,
            "NS" => QueryType::Ns,
            "A" => QueryType::A,
            "AAAA" => QueryType::Aaaa,
            "ANY" => QueryType::Any,
            other => QueryType::Other(other.to_string()),
        }
    }
}

impl Display for QueryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Soa => f.write_str("SOA"),
            QueryType::Ns => f.write_str("NS"),
            QueryType::A => f.write_str("A"),
            QueryType::Aaaa => f.write_str("AAAA"),
            QueryType::Any => f.write_str("ANY"),
            QueryType::Other(other) => f.write_str(other),
        }
    }
}

/// A `Q` request line of the pipe backend protocol:
/// `Q <qname> <qclass> <qtype> <id> <remote-ip>`, tab separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub kind: String,
    pub name: String,
    pub class: String,
    pub query_type: QueryType,
    pub id: String,
    pub remote: String,
}

impl Query {
    /// Parse a request line (without its line terminator).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] unless the line has exactly six tab separated fields.
    pub fn parse(line: &str) -> Result<Self, Error> {
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[..] {
            [kind, name, class, query_type, id, remote] => Ok(Query {
                kind: kind.to_string(),
                name: name.to_string(),
                class: class.to_string(),
                query_type: query_type.into(),
                id: id.to_string(),
                remote: remote.to_string(),
            }),
            _ => Err(Error::MalformedRequest(fields.len())),
        }
    }
}

#[cfg(test)]
pub(crate) fn query(name: &str, query_type: &str) -> Query {
    Query {
        kind: "Q".to_string(),
        name: name.to_string(),
        class: "IN".to_string(),
        query_type: query_type.into(),
        id: "-1".to_string(),
        remote: "203.0.113.210".to_string(),
    }
}
