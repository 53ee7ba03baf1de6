//! The outbound connection to an upstream tracking source.
//!
//! Connects once, then runs a receive loop in its own task, dispatching
//! inbound data to application callbacks on spawned tasks so a slow
//! callback never stalls the reader.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use bearing_proto::{AckData, DataPayload, Envelope, ReplData, ReqData, SInfData, TResData};

use crate::error::BusError;
use crate::frame::{read_frame, Frame};
use crate::idgen::{now_secs, IdGenerator};
use crate::pending::PendingReplies;
use crate::reply_future::ReplyFuture;

/// Application hooks for inbound `data` payloads. Each is dispatched on its
/// own spawned task, never awaited inline in the receive loop.
pub trait ClientCallbacks: Send + Sync + 'static {
    fn on_tres(&self, data: TResData);
    fn on_sinf(&self, data: SInfData);
}

/// Something a client can send: a request, or a pre-built broadcast-shaped
/// payload used for outbound `data` (present for API symmetry with the
/// server; a client speaking `req` is the common case).
pub enum Outbound {
    Req(String),
    Data(DataPayload),
}

struct Shared {
    running: AtomicBool,
    pending: PendingReplies,
    ids: IdGenerator,
}

pub struct DataClient<C: ClientCallbacks> {
    shared: Arc<Shared>,
    write_half: tokio::sync::Mutex<OwnedWriteHalf>,
    callbacks: Arc<C>,
    receive_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<C: ClientCallbacks> DataClient<C> {
    /// Connect to `addr` and start the receive loop.
    pub async fn start(addr: &str, callbacks: C) -> Result<Arc<Self>, BusError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();

        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            pending: PendingReplies::new(),
            ids: IdGenerator::new(),
        });
        let callbacks = Arc::new(callbacks);

        let client = Arc::new(Self {
            shared: shared.clone(),
            write_half: tokio::sync::Mutex::new(write_half),
            callbacks: callbacks.clone(),
            receive_task: std::sync::Mutex::new(None),
        });

        let loop_client = client.clone();
        let handle = tokio::spawn(async move {
            loop_client.receive_loop(read_half).await;
        });
        *client.receive_task.lock().unwrap() = Some(handle);

        Ok(client)
    }

    async fn receive_loop(&self, mut reader: tokio::net::tcp::OwnedReadHalf) {
        loop {
            if !self.shared.running.load(Ordering::Acquire) {
                return;
            }
            match read_frame(&mut reader).await {
                Ok(Frame::Idle) => continue,
                Ok(Frame::Message(envelope)) => self.dispatch(envelope).await,
                Ok(Frame::Malformed { id }) => {
                    self.send_ack(id, false).await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "client transport error, stopping");
                    self.shared.running.store(false, Ordering::Release);
                    return;
                }
            }
        }
    }

    async fn dispatch(&self, envelope: Envelope) {
        match envelope {
            Envelope::Req { id, .. } => {
                tracing::debug!(id, "unsolicited req received by client, ignoring");
            }
            Envelope::Ack {
                data: AckData { to, .. },
                ..
            } => {
                if !self.shared.pending.settle(to, envelope.clone()) {
                    tracing::debug!(to, "ack for unknown or already-settled id");
                }
            }
            Envelope::Repl {
                data: ReplData { to, .. },
                ..
            } => {
                self.shared.pending.settle(to, envelope.clone());
                self.send_ack(envelope.id(), true).await;
            }
            Envelope::Data { id, data, .. } => {
                let callbacks = self.callbacks.clone();
                match data {
                    DataPayload::Tres { data } => {
                        tokio::spawn(async move { callbacks.on_tres(data) });
                        self.send_ack(id, true).await;
                    }
                    DataPayload::Sinf { data } => {
                        tokio::spawn(async move { callbacks.on_sinf(data) });
                        self.send_ack(id, true).await;
                    }
                    DataPayload::Tres3 { .. } => {
                        tracing::debug!("client received a downstream-only tres3 payload, nacking");
                        self.send_ack(id, false).await;
                    }
                }
            }
        }
    }

    async fn send_ack(&self, to: i64, ack: bool) {
        let reply = Envelope::ack(to, ack, now_secs(), self.shared.ids.next());
        if let Err(err) = self.write(&reply).await {
            tracing::warn!(error = %err, "failed to send ack");
        }
    }

    async fn write(&self, envelope: &Envelope) -> Result<(), BusError> {
        let body = bearing_proto::encode(envelope).map_err(|_| BusError::ConnectionClosed)?;
        let mut guard = self.write_half.lock().await;
        guard.write_all(body.as_bytes()).await?;
        Ok(())
    }

    /// Send `payload`. Returns a reply future when the payload is a `req`
    /// (the only outbound kind this client originates that expects a
    /// correlated reply); returns `None` otherwise.
    pub async fn send(&self, payload: Outbound) -> Result<Option<ReplyFuture>, BusError> {
        let id = self.shared.ids.next();
        let time = now_secs();
        let (envelope, wants_future) = match payload {
            Outbound::Req(req) => (
                Envelope::Req {
                    id,
                    time,
                    data: ReqData { req },
                },
                true,
            ),
            Outbound::Data(data) => (Envelope::Data { id, time, data }, true),
        };

        let fut = if wants_future {
            Some(self.shared.pending.register(id))
        } else {
            None
        };

        self.write(&envelope).await?;
        Ok(fut)
    }

    pub async fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        let mut guard = self.write_half.lock().await;
        let _ = guard.shutdown().await;
        if let Some(handle) = self.receive_task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct RecordingCallbacks {
        tres: StdMutex<Vec<TResData>>,
        sinf: StdMutex<Vec<SInfData>>,
    }

    impl ClientCallbacks for RecordingCallbacks {
        fn on_tres(&self, data: TResData) {
            self.tres.lock().unwrap().push(data);
        }
        fn on_sinf(&self, data: SInfData) {
            self.sinf.lock().unwrap().push(data);
        }
    }

    #[tokio::test]
    async fn req_registers_a_future_and_settles_on_repl() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server_task = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut r, mut w) = stream.into_split();
            let mut buf = vec![0u8; 1024];
            let n = r.read(&mut buf).await.unwrap();
            let req: Envelope = bearing_proto::decode(std::str::from_utf8(&buf[..n]).unwrap())
                .unwrap();
            let repl = Envelope::Repl {
                id: 999,
                time: 0.0,
                data: bearing_proto::ReplData {
                    to: req.id(),
                    data: serde_json::Map::new(),
                },
            };
            w.write_all(bearing_proto::encode(&repl).unwrap().as_bytes())
                .await
                .unwrap();
        });

        let client = DataClient::start(&addr.to_string(), RecordingCallbacks::default())
            .await
            .unwrap();
        let fut = client
            .send(Outbound::Req("sinfo".to_string()))
            .await
            .unwrap()
            .expect("req should register a future");

        let done = fut
            .wait_until_done(
                std::time::Duration::from_millis(2),
                std::time::Duration::from_millis(500),
            )
            .await;
        assert!(done);
        server_task.await.unwrap();
        client.stop().await;
    }
}
