use crate::backend::query::Query;
use crate::backend::resolver::Resolver;
use crate::backend::response::{Response, ResponseGroup};
use crate::backend::writer;
use crate::config::SharedConfig;
use crate::error::Error;
use crate::host_store::DynHostStore;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, warn};

/// A PowerDNS pipe backend session: reads requests from an input stream and writes the
/// responses to an output stream.
pub struct Backend {
    resolver: Resolver,
    banner: String,
    verbose: bool,
    queue_capacity: usize,
    max_read_errors: u32,
}

/// Create a pipe backend answering from the given config and host store.
pub fn new(config: SharedConfig, hosts: DynHostStore) -> Backend {
    Backend {
        banner: config.backend_banner.clone(),
        verbose: config.verbose,
        queue_capacity: config.backend_queue_capacity,
        max_read_errors: config.backend_max_read_errors,
        resolver: Resolver::new(config, hosts),
    }
}

impl Backend {
    /// Run the session until `input` reaches EOF, then return `output` once every response has
    /// been written to it.
    ///
    /// The first line read is the PowerDNS greeting. It is answered with the handshake, without
    /// looking at its contents. Every following line is answered with exactly one response
    /// group ending in `END` or `FAIL`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyReadErrors`] once reading `input` failed
    /// `backend_max_read_errors` times in a row. Returns [`Error::IO`] if writing to `output`
    /// fails.
    pub async fn run<R, W>(&self, input: R, output: W) -> Result<W, Error>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (responses, writer) = writer::spawn(output, self.queue_capacity);
        let result = self.serve(BufReader::new(input), &responses).await;
        drop(responses);
        let output = writer.await??;
        result.map(|()| output)
    }

    async fn serve<R>(
        &self,
        mut input: BufReader<R>,
        responses: &tokio::sync::mpsc::Sender<ResponseGroup>,
    ) -> Result<(), Error>
    where
        R: AsyncRead + Unpin,
    {
        match read_line(&mut input).await {
            Ok(None) => {
                debug!("input closed before handshake");
                return Ok(());
            }
            Ok(Some(greeting)) => debug!("greeting from PowerDNS: {greeting:?}"),
            Err(err) => warn!("failed to read greeting: {err}"),
        }
        if responses
            .send(vec![Response::Handshake(self.banner.clone())])
            .await
            .is_err()
        {
            return Ok(());
        }

        let mut read_errors = 0;
        loop {
            let group = match read_line(&mut input).await {
                Ok(None) => {
                    debug!("input closed, ending session");
                    return Ok(());
                }
                Ok(Some(line)) => {
                    read_errors = 0;
                    self.handle_line(&line).await
                }
                Err(err) => {
                    read_errors += 1;
                    warn!("failed to read request ({read_errors} in a row): {err}");
                    if read_errors >= self.max_read_errors {
                        let _ = responses.send(vec![Response::Fail]).await;
                        return Err(Error::TooManyReadErrors(read_errors));
                    }
                    vec![Response::Fail]
                }
            };
            // The writer only goes away when writing failed; its error is reported by `run`.
            if responses.send(group).await.is_err() {
                return Ok(());
            }
        }
    }

    /// Build the complete response group for one request line.
    pub async fn handle_line(&self, line: &str) -> ResponseGroup {
        let query = match Query::parse(line) {
            Ok(query) => query,
            Err(err) => {
                debug!("{err}: {line:?}");
                return vec![Response::Fail];
            }
        };

        match self.resolver.resolve(&query).await {
            Ok(answer) => vec![Response::data(&query, &answer), Response::End],
            Err(err) => {
                if err.is_storage() {
                    warn!("lookup of {} {} failed: {err}", query.name, query.query_type);
                } else {
                    debug!("no answer for {} {}: {err}", query.name, query.query_type);
                }
                if self.verbose {
                    vec![Response::Log(err.to_string()), Response::End]
                } else {
                    vec![Response::End]
                }
            }
        }
    }
}

/// Read one line without its terminator. `None` means EOF.
async fn read_line<R>(input: &mut BufReader<R>) -> Result<Option<String>, Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8(buf)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::resolver::tests::{test_config, test_hosts};
    use crate::config::Config;
    use std::sync::Arc;

    async fn backend() -> Backend {
        new(test_config(), test_hosts().await)
    }

    async fn session(backend: &Backend, input: &[u8]) -> String {
        let output = backend.run(input, Vec::new()).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn handshake_then_answers() {
        let output = session(
            &backend().await,
            b"HELO\t1\nQ\twww.example.org\tIN\tANY\t-1\t203.0.113.210\n",
        )
        .await;
        assert_eq!(
            output,
            "OK\tDDNS Backend\nDATA\twww.example.org\tIN\tA\t10\t-1\t10.11.12.13\nEND\n"
        );
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        assert_eq!(session(&backend().await, b"").await, "");
    }

    #[tokio::test]
    async fn malformed_lines_fail() {
        let backend = backend().await;
        assert_eq!(backend.handle_line("Q\texample.org\tIN").await, vec![Response::Fail]);
        assert_eq!(backend.handle_line("").await, vec![Response::Fail]);
        assert_eq!(backend.handle_line("AXFR\t1").await, vec![Response::Fail]);
    }

    #[tokio::test]
    async fn unanswerable_queries_only_end() {
        let backend = backend().await;
        for line in [
            "Q\tghost.example.org\tIN\tA\t-1\t203.0.113.210",
            "Q\tv4.example.org\tIN\tAAAA\t-1\t203.0.113.210",
            "Q\twww.example.com\tIN\tA\t-1\t203.0.113.210",
            "Q\twww.example.org\tIN\tMX\t-1\t203.0.113.210",
        ] {
            assert_eq!(backend.handle_line(line).await, vec![Response::End], "{line}");
        }
    }

    #[tokio::test]
    async fn verbose_failures_are_logged() {
        let mut config = Config::new(".example.org", "dns.example.org").unwrap();
        config.verbose = true;
        let backend = new(Arc::new(config), test_hosts().await);
        let group = backend
            .handle_line("Q\tghost.example.org\tIN\tA\t-1\t203.0.113.210")
            .await;
        assert_eq!(group.len(), 2);
        assert!(matches!(&group[0], Response::Log(message) if message.contains("ghost")));
        assert_eq!(group[1], Response::End);
    }

    #[tokio::test]
    async fn invalid_utf8_fails_and_continues() {
        let output = session(
            &backend().await,
            b"HELO\t1\n\xff\xfe\nQ\tv6.example.org\tIN\tAAAA\t7\t203.0.113.210\r\n",
        )
        .await;
        assert_eq!(
            output,
            "OK\tDDNS Backend\nFAIL\nDATA\tv6.example.org\tIN\tAAAA\t10\t7\t2001:db8:85a3::8a2e:370:7334\nEND\n"
        );
    }

    #[tokio::test]
    async fn consecutive_read_errors_end_the_session() {
        let mut config = Config::new(".example.org", "dns.example.org").unwrap();
        config.backend_max_read_errors = 2;
        let backend = new(Arc::new(config), test_hosts().await);
        let result = backend
            .run(&b"HELO\t1\n\xff\n\xff\nQ\twww.example.org\tIN\tA\t-1\t0.0.0.0\n"[..], Vec::new())
            .await;
        assert!(matches!(result, Err(Error::TooManyReadErrors(2))));
    }

    #[tokio::test]
    async fn read_error_counter_resets() {
        let mut config = Config::new(".example.org", "dns.example.org").unwrap();
        config.backend_max_read_errors = 2;
        let backend = new(Arc::new(config), test_hosts().await);
        let output = session(
            &backend,
            b"HELO\t1\n\xff\nQ\tghost.example.org\tIN\tA\t-1\t0.0.0.0\n\xff\n",
        )
        .await;
        assert_eq!(output, "OK\tDDNS Backend\nFAIL\nEND\nFAIL\n");
    }
}
