//! Line-delimited JSON over a readable/writable pair — by default stdin and
//! stdout, but generic over any `AsyncRead`/`AsyncWrite` pair so tests can
//! drive it over in-memory buffers.
//!
//! The read loop never serializes message processing: every non-empty
//! line is handed to a freshly spawned task. Output is serialized through
//! one writer lock so responses never interleave mid-line.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub type MessageFuture = Pin<Box<dyn Future<Output = Value> + Send>>;
pub type MessageHandler = Arc<dyn Fn(String) -> MessageFuture + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no message handler has been set")]
    NoHandler,
    #[error("transport is already running")]
    AlreadyRunning,
}

/// A line-delimited JSON transport over a generic reader/writer pair.
pub struct StdioTransport<W: AsyncWrite + Unpin + Send + 'static> {
    handler: Mutex<Option<MessageHandler>>,
    writer: Arc<Mutex<W>>,
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<W: AsyncWrite + Unpin + Send + 'static> StdioTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            handler: Mutex::new(None),
            writer: Arc::new(Mutex::new(writer)),
            running: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    pub async fn set_message_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        let handler: MessageHandler = Arc::new(move |line| Box::pin(handler(line)));
        *self.handler.lock().await = Some(handler);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start reading lines from `reader`, dispatching each non-empty line
    /// to the message handler on its own task. Fails if no handler is set
    /// or the transport is already running.
    pub async fn start<R>(&self, reader: R) -> Result<(), TransportError>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(TransportError::AlreadyRunning);
        }
        let handler = self.handler.lock().await.clone();
        let Some(handler) = handler else {
            self.running.store(false, Ordering::SeqCst);
            return Err(TransportError::NoHandler);
        };

        let writer = self.writer.clone();
        let running = self.running.clone();
        let cancel = self.cancel.clone();

        let join = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => line,
                };
                match next {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let handler = handler.clone();
                        let writer = writer.clone();
                        tokio::spawn(async move {
                            let response = handler(line).await;
                            if let Err(e) = write_response(&writer, &response).await {
                                warn!("failed to write response: {e}");
                            }
                        });
                    }
                    Ok(None) => {
                        debug!("stdin closed (EOF)");
                        break;
                    }
                    Err(e) => {
                        warn!("error reading input: {e}");
                        break;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        *self.task.lock().await = Some(join);
        Ok(())
    }

    /// Idempotent: signal the read loop to stop and wait for it to finish.
    /// Outstanding handlers that already started still run to completion
    /// and their responses are still written, on a best-effort basis.
    pub async fn stop(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.await;
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// Block until the read loop has stopped (EOF, error, or `stop()`).
    pub async fn wait(&self) {
        // The task is consumed by `stop`; for the EOF path we poll the flag.
        while self.is_running() {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }

    pub async fn send(&self, message: &Value) -> std::io::Result<()> {
        write_response(&self.writer, message).await
    }
}

async fn write_response<W: AsyncWrite + Unpin + Send>(
    writer: &Arc<Mutex<W>>,
    message: &Value,
) -> std::io::Result<()> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    let mut guard = writer.lock().await;
    guard.write_all(line.as_bytes()).await?;
    guard.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::duplex;

    #[tokio::test]
    async fn start_fails_without_handler() {
        let (_client, server_writer) = duplex(64);
        let transport = StdioTransport::new(server_writer);
        let (reader, _client_writer) = duplex(64);
        let err = transport.start(reader).await.unwrap_err();
        assert!(matches!(err, TransportError::NoHandler));
    }

    #[tokio::test]
    async fn echoes_one_response_per_input_line() {
        let (mut client_read, server_writer) = duplex(4096);
        let transport = Arc::new(StdioTransport::new(server_writer));
        transport
            .set_message_handler(|line| async move { json!({ "echo": line }) })
            .await;

        let (reader, mut client_write) = duplex(4096);
        transport.start(reader).await.unwrap();

        use tokio::io::AsyncWriteExt;
        client_write.write_all(b"hello\n").await.unwrap();
        drop(client_write);

        use tokio::io::AsyncReadExt;
        let mut buf = Vec::new();
        let _ = tokio::time::timeout(std::time::Duration::from_secs(1), client_read.read_to_end(&mut buf)).await;
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#""echo":"hello""#));

        transport.stop().await;
        assert!(!transport.is_running());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (_client, server_writer) = duplex(64);
        let transport = StdioTransport::new(server_writer);
        transport.stop().await;
        transport.stop().await;
    }
}
