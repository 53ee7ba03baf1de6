//! The downstream broadcast endpoint: accepts GUI clients, replays the
//! current camera registry to each before admitting it to the roster, and
//! fans out published payloads to every connected client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};

use bearing_proto::{AckData, DataPayload, Envelope, SInfData};

use crate::error::BusError;
use crate::frame::{read_frame, Frame};
use crate::idgen::{now_secs, IdGenerator};
use crate::pending::PendingReplies;

const ACCEPT_TIMEOUT: Duration = Duration::from_millis(200);
const BROADCAST_IDLE_SLEEP: Duration = Duration::from_millis(10);
const SEND_POLL_INTERVAL: Duration = Duration::from_millis(1);
const SEND_TIMEOUT: Duration = Duration::from_millis(200);
const REPLAY_ACK_TIMEOUT: Duration = Duration::from_millis(200);

struct Client {
    id: u64,
    write_half: tokio::sync::Mutex<OwnedWriteHalf>,
}

pub struct DataServer {
    running: Arc<AtomicBool>,
    clients: Arc<Mutex<Vec<Arc<Client>>>>,
    pending_replies: PendingReplies,
    pending_updates: Arc<Mutex<Vec<DataPayload>>>,
    cameras: Arc<Mutex<Vec<SInfData>>>,
    ids: Arc<IdGenerator>,
    next_client_id: std::sync::atomic::AtomicU64,
    accept_task: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
    broadcast_task: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl DataServer {
    /// Bind `addr` and start the accept loop and the broadcast loop.
    pub async fn start(addr: &str) -> Result<Arc<Self>, BusError> {
        let listener = TcpListener::bind(addr).await?;

        let server = Arc::new(Self {
            running: Arc::new(AtomicBool::new(true)),
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_replies: PendingReplies::new(),
            pending_updates: Arc::new(Mutex::new(Vec::new())),
            cameras: Arc::new(Mutex::new(Vec::new())),
            ids: Arc::new(IdGenerator::new()),
            next_client_id: std::sync::atomic::AtomicU64::new(0),
            accept_task: std::sync::Mutex::new(None),
            broadcast_task: std::sync::Mutex::new(None),
        });

        let accept_server = server.clone();
        let accept_handle = tokio::spawn(accept_server.accept_loop(listener));
        *server.accept_task.lock().unwrap() = Some(accept_handle);

        let broadcast_server = server.clone();
        let broadcast_handle = tokio::spawn(async move {
            broadcast_server.broadcast_loop().await;
        });
        *server.broadcast_task.lock().unwrap() = Some(broadcast_handle);

        Ok(server)
    }

    /// Record the current known stations, used to replay to newly joined
    /// clients. Called by the tracking coordinator on `update_cams`.
    pub fn record_camera(&self, sinf: SInfData) {
        let mut cams = self.cameras.lock();
        if let Some(existing) = cams.iter_mut().find(|c| c.id == sinf.id) {
            *existing = sinf;
        } else {
            cams.push(sinf);
        }
    }

    /// Enqueue a payload for the next broadcast flush.
    pub fn publish(&self, payload: DataPayload) {
        self.pending_updates.lock().push(payload);
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        while self.running.load(Ordering::Acquire) {
            match tokio::time::timeout(ACCEPT_TIMEOUT, listener.accept()).await {
                Ok(Ok((stream, peer))) => {
                    let this = self.clone();
                    tokio::spawn(async move {
                        this.handle_client(stream).await;
                    });
                    tracing::debug!(%peer, "accepted downstream client");
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "accept failed");
                }
                Err(_) => continue,
            }
        }
    }

    /// Runs the per-client receive loop from the moment the socket is
    /// accepted, independent of roster admission: the replay handshake's
    /// acks are themselves ordinary inbound messages that only this loop
    /// can dispatch, so it must already be running while replay is in
    /// flight rather than starting after admission.
    async fn handle_client(self: Arc<Self>, stream: TcpStream) {
        let (mut read_half, write_half) = stream.into_split();
        let client_id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let client = Arc::new(Client {
            id: client_id,
            write_half: tokio::sync::Mutex::new(write_half),
        });

        let receive_self = self.clone();
        let receive_client = client.clone();
        let receive_handle: tokio::task::JoinHandle<()> = tokio::spawn(async move {
            loop {
                if !receive_self.running.load(Ordering::Acquire) {
                    return;
                }
                match read_frame(&mut read_half).await {
                    Ok(Frame::Idle) => continue,
                    Ok(Frame::Message(envelope)) => {
                        receive_self.dispatch(&receive_client, envelope).await
                    }
                    Ok(Frame::Malformed { id }) => {
                        receive_self.send_ack(&receive_client, id, false).await
                    }
                    Err(err) => {
                        tracing::info!(client_id = receive_client.id, error = %err, "client disconnected");
                        return;
                    }
                }
            }
        });

        if !self.replay_cameras(&client).await {
            tracing::warn!(client_id, "camera replay failed, dropping client before admission");
            receive_handle.abort();
            return;
        }

        self.clients.lock().push(client.clone());
        tracing::info!(client_id, "client admitted to roster");

        let _ = receive_handle.await;
        self.clients.lock().retain(|c| c.id != client_id);
    }

    async fn replay_cameras(&self, client: &Arc<Client>) -> bool {
        let cams: Vec<SInfData> = self.cameras.lock().clone();
        for sinf in cams {
            let id = self.ids.next();
            let envelope = Envelope::Data {
                id,
                time: now_secs(),
                data: DataPayload::Sinf { data: sinf },
            };
            let fut = self.pending_replies.register(id);
            if self.send_to(client, &envelope).await.is_err() {
                return false;
            }
            if !fut
                .wait_until_done(SEND_POLL_INTERVAL, REPLAY_ACK_TIMEOUT)
                .await
            {
                tracing::warn!(client_id = client.id, id, "camera replay ack timed out");
            }
        }
        true
    }

    async fn dispatch(&self, client: &Arc<Client>, envelope: Envelope) {
        match envelope {
            Envelope::Ack {
                data: AckData { to, .. },
                ..
            } => {
                self.pending_replies.settle(to, envelope.clone());
            }
            other => {
                self.send_ack(client, other.id(), false).await;
            }
        }
    }

    async fn send_ack(&self, client: &Arc<Client>, to: i64, ack: bool) {
        let envelope = Envelope::ack(to, ack, now_secs(), self.ids.next());
        let _ = self.send_to(client, &envelope).await;
    }

    async fn send_to(&self, client: &Arc<Client>, envelope: &Envelope) -> Result<(), BusError> {
        let body = bearing_proto::encode(envelope).map_err(|_| BusError::ConnectionClosed)?;
        let mut guard = client.write_half.lock().await;
        guard.write_all(body.as_bytes()).await?;
        Ok(())
    }

    async fn broadcast_loop(&self) {
        loop {
            if !self.running.load(Ordering::Acquire) {
                return;
            }
            let batch: Vec<DataPayload> = {
                let mut queue = self.pending_updates.lock();
                if queue.is_empty() {
                    drop(queue);
                    tokio::time::sleep(BROADCAST_IDLE_SLEEP).await;
                    continue;
                }
                std::mem::take(&mut *queue)
            };

            let clients: Vec<Arc<Client>> = self.clients.lock().clone();
            for payload in batch {
                let mut pending = Vec::with_capacity(clients.len());
                for client in &clients {
                    let id = self.ids.next();
                    let envelope = Envelope::Data {
                        id,
                        time: now_secs(),
                        data: payload.clone(),
                    };
                    let fut = self.pending_replies.register(id);
                    if self.send_to(client, &envelope).await.is_err() {
                        tracing::debug!(client_id = client.id, "skipping client, send failed");
                        continue;
                    }
                    pending.push((client, id, fut));
                }
                for (client, id, fut) in pending {
                    if !fut.wait_until_done(SEND_POLL_INTERVAL, SEND_TIMEOUT).await {
                        tracing::warn!(client_id = client.id, id, "broadcast ack timed out");
                    }
                }
            }
        }
    }

    pub async fn stop(&self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.accept_task.lock().unwrap().take() {
            handle.abort();
        }
        if let Some(handle) = self.broadcast_task.lock().unwrap().take() {
            handle.abort();
        }
        let evicted: Vec<Arc<Client>> = self.clients.lock().drain(..).collect();
        for client in evicted {
            let mut guard = client.write_half.lock().await;
            let _ = guard.shutdown().await;
        }
    }
}
