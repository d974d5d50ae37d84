use crate::backend::response::ResponseGroup;
use tokio::io::{self, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawn the single task allowed to write to `output`.
///
/// Response groups are sent through a bounded queue of `capacity` groups and written in the
/// order they were queued, each one completely and followed by a flush. Senders wait while the
/// queue is full. The task ends once every sender is dropped, handing back the output.
pub(super) fn spawn<W>(
    output: W,
    capacity: usize,
) -> (mpsc::Sender<ResponseGroup>, JoinHandle<io::Result<W>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);
    (tx, tokio::spawn(write_responses(output, rx)))
}

async fn write_responses<W>(output: W, mut rx: mpsc::Receiver<ResponseGroup>) -> io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    let mut output = BufWriter::new(output);
    while let Some(group) = rx.recv().await {
        for response in group {
            output.write_all(format!("{response}\n").as_bytes()).await?;
        }
        output.flush().await?;
    }
    Ok(output.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::response::Response;

    #[tokio::test]
    async fn groups_are_written_in_queue_order() {
        let (tx, handle) = spawn(Vec::new(), 1);
        for i in 0..20 {
            tx.send(vec![Response::Log(i.to_string()), Response::End])
                .await
                .unwrap();
        }
        drop(tx);

        let output = String::from_utf8(handle.await.unwrap().unwrap()).unwrap();
        let expected: String = (0..20).map(|i| format!("LOG\t{i}\nEND\n")).collect();
        assert_eq!(output, expected);
    }
}
