use crate::backend::query::Query;
use crate::backend::resolver::Answer;
use std::fmt::{self, Display, Formatter};

/// One line written to PowerDNS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `OK <banner>`, the reply to the PowerDNS greeting.
    Handshake(String),
    /// `DATA <qname> <qclass> <qtype> <ttl> <id> <content>`.
    Data {
        name: String,
        class: String,
        record_type: String,
        ttl: u32,
        id: String,
        content: String,
    },
    /// `LOG <message>`, written to the PowerDNS log.
    Log(String),
    /// Terminates the answer to a query.
    End,
    /// Reports a request the backend couldn't process at all.
    Fail,
}

/// Every line produced for a single request. Groups are written atomically and in order.
pub type ResponseGroup = Vec<Response>;

impl Response {
    pub fn data(query: &Query, answer: &Answer) -> Self {
        Response::Data {
            name: query.name.clone(),
            class: query.class.clone(),
            record_type: answer.record_type.to_string(),
            ttl: answer.ttl,
            id: query.id.clone(),
            content: answer.content.clone(),
        }
    }

    /// Whether the line terminates the response to a request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Response::End | Response::Fail)
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Response::Handshake(banner) => write!(f, "OK\t{banner}"),
            Response::Data {
                name,
                class,
                record_type,
                ttl,
                id,
                content,
            } => write!(f, "DATA\t{name}\t{class}\t{record_type}\t{ttl}\t{id}\t{content}"),
            // Tabs and newlines would break the line framing.
            Response::Log(message) => write!(f, "LOG\t{}", message.replace(['\t', '\n'], " ")),
            Response::End => f.write_str("END"),
            Response::Fail => f.write_str("FAIL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::query::query;
    use crate::backend::resolver::{RecordType, TTL};
    use crate::host_store::AddressKind;

    #[test]
    fn lines() {
        let answer = Answer {
            record_type: RecordType::Address(AddressKind::A),
            content: "10.11.12.13".to_string(),
            ttl: TTL,
        };
        let data = Response::data(&query("www.example.org", "ANY"), &answer);
        assert_eq!(
            data.to_string(),
            "DATA\twww.example.org\tIN\tA\t10\t-1\t10.11.12.13"
        );
        assert!(!data.is_terminal());

        assert_eq!(Response::Handshake("DDNS Backend".into()).to_string(), "OK\tDDNS Backend");
        assert_eq!(Response::End.to_string(), "END");
        assert_eq!(Response::Fail.to_string(), "FAIL");
        assert!(Response::End.is_terminal());
        assert!(Response::Fail.is_terminal());
    }

    #[test]
    fn log_lines_stay_on_one_line() {
        assert_eq!(
            Response::Log("a\tb\nc".into()).to_string(),
            "LOG\ta b c"
        );
    }
}
