/*
[INPUT]:  Stream URL, bearer token and a message handler
[OUTPUT]: Decoded push messages delivered to the handler; connection state via `watch`
[POS]:    WebSocket layer - connect/authenticate/receive loop with fixed-delay reconnect
[UPDATE]: When changing connection lifecycle, heartbeat or shutdown semantics
*/

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::http::{FinanceFeastError, Result};
use crate::types::Environment;
use crate::ws::handler::MessageHandler;
use crate::ws::message::{ControlMessage, decode_frame};

const OUTBOUND_CAPACITY: usize = 100;
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Streaming client configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub environment: Environment,
    /// Overrides the environment's stream URL
    pub url: Option<String>,
    /// Fixed wait between a lost connection and the next attempt
    pub reconnect_delay: Duration,
    pub ping_interval: Duration,
    /// How long to wait for a pong before the connection counts as dead
    pub ping_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            url: None,
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(10),
            ping_timeout: Duration::from_secs(8),
        }
    }
}

impl StreamConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    fn stream_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| self.environment.stream_url().to_string())
    }
}

/// Connection lifecycle as seen by the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Authenticating,
    Streaming,
    Error,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionExit {
    Closed,
    Error(String),
    Shutdown,
}

struct Inner {
    url: String,
    token: String,
    config: StreamConfig,
    handler: Box<dyn MessageHandler>,
    outbound: Mutex<Option<mpsc::Sender<WsMessage>>>,
    state: watch::Sender<StreamState>,
    shutdown: CancellationToken,
    reconnects: AtomicU64,
    running: AtomicBool,
}

/// Clears the running flag when the run loop exits, panics included
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Push client for real-time data.
///
/// Reconnects forever with a fixed delay until [`StreamingClient::shutdown`]
/// is called. Clones share the same connection.
#[derive(Clone)]
pub struct StreamingClient {
    inner: Arc<Inner>,
}

impl StreamingClient {
    pub fn new(
        token: impl Into<String>,
        handler: impl MessageHandler,
        config: StreamConfig,
    ) -> Self {
        let (state, _rx) = watch::channel(StreamState::Disconnected);
        let url = config.stream_url();
        info!(environment = %config.environment, %url, "stream environment set");

        Self {
            inner: Arc::new(Inner {
                url,
                token: token.into(),
                config,
                handler: Box::new(handler),
                outbound: Mutex::new(None),
                state,
                shutdown: CancellationToken::new(),
                reconnects: AtomicU64::new(0),
                running: AtomicBool::new(false),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> StreamState {
        *self.inner.state.borrow()
    }

    /// Subscribe to connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.inner.state.subscribe()
    }

    /// Number of reconnect attempts made after the first connection
    pub fn reconnect_count(&self) -> u64 {
        self.inner.reconnects.load(Ordering::Relaxed)
    }

    pub fn is_connected(&self) -> bool {
        self.outbound_sender().is_some()
    }

    /// Start the run loop on a new task.
    ///
    /// Must be called from within a Tokio runtime. Only one run loop drives a
    /// client at a time; while one is active the returned task finishes
    /// immediately.
    pub fn connect(&self) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move { client.run().await })
    }

    /// Stop the run loop and close the socket
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Serialize `data` as JSON and queue it for the socket.
    ///
    /// Fails with `NotConnected` when there is no live connection.
    pub async fn send<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        let frame = WsMessage::Text(serde_json::to_string(data)?.into());
        let sender = self
            .outbound_sender()
            .ok_or(FinanceFeastError::NotConnected)?;
        sender
            .send(frame)
            .await
            .map_err(|_| FinanceFeastError::NotConnected)
    }

    /// Non-blocking variant of [`StreamingClient::send`] for use inside a
    /// message handler
    pub fn try_send<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        let frame = WsMessage::Text(serde_json::to_string(data)?.into());
        let sender = self
            .outbound_sender()
            .ok_or(FinanceFeastError::NotConnected)?;
        sender.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                FinanceFeastError::WebSocket("outbound queue full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => FinanceFeastError::NotConnected,
        })
    }

    /// Send `{"type":"ping"}`
    pub async fn ping(&self) -> Result<()> {
        self.send(&ControlMessage::Ping).await
    }

    /// Drive the connection until shutdown.
    pub async fn run(&self) {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            warn!(url = %self.inner.url, "run loop already active");
            return;
        }
        let _running = RunningGuard(&self.inner.running);

        loop {
            if self.is_shutdown() {
                break;
            }

            match self.run_session().await {
                SessionExit::Shutdown => break,
                SessionExit::Closed => {
                    self.set_state(StreamState::Closed);
                    info!(url = %self.inner.url, "websocket closed");
                }
                SessionExit::Error(err) => {
                    self.set_state(StreamState::Error);
                    error!(url = %self.inner.url, error = %err, "websocket connection error");
                }
            }

            let delay = self.inner.config.reconnect_delay;
            info!(?delay, "reconnecting websocket after delay");
            tokio::select! {
                _ = self.inner.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            self.inner.reconnects.fetch_add(1, Ordering::Relaxed);
        }

        self.set_state(StreamState::Disconnected);
        info!(url = %self.inner.url, "stream stopped");
    }

    /// One physical connection: connect, authenticate, stream until it ends.
    async fn run_session(&self) -> SessionExit {
        self.set_state(StreamState::Connecting);
        debug!(url = %self.inner.url, "connecting websocket");

        let connected = tokio::select! {
            _ = self.inner.shutdown.cancelled() => return SessionExit::Shutdown,
            result = connect_async(self.inner.url.as_str()) => result,
        };
        let (ws_stream, _response) = match connected {
            Ok(connected) => connected,
            Err(err) => return SessionExit::Error(err.to_string()),
        };
        let (mut write, mut read) = ws_stream.split();

        // No acknowledgement is awaited; the server upgrades the session out of band.
        self.set_state(StreamState::Authenticating);
        let auth_frame = match serde_json::to_string(&ControlMessage::authenticate(
            self.inner.token.as_str(),
        )) {
            Ok(frame) => frame,
            Err(err) => return SessionExit::Error(err.to_string()),
        };
        let bound = Instant::now() + self.inner.config.ping_timeout;
        if let Err(exit) = self
            .write_frame(&mut write, WsMessage::Text(auth_frame.into()), bound)
            .await
        {
            return exit;
        }

        let (outbound_tx, mut outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        self.set_outbound(Some(outbound_tx));
        self.set_state(StreamState::Streaming);
        info!(url = %self.inner.url, "websocket streaming");

        let ping_interval = self.inner.config.ping_interval;
        let ping_timeout = self.inner.config.ping_timeout;
        let mut heartbeat = interval_at(Instant::now() + ping_interval, ping_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pong_deadline: Option<Instant> = None;

        let exit = loop {
            let deadline = pong_deadline;
            tokio::select! {
                _ = self.inner.shutdown.cancelled() => {
                    break SessionExit::Shutdown;
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(message) => {
                            let bound = deadline.unwrap_or_else(|| Instant::now() + ping_timeout);
                            if let Err(exit) = self.write_frame(&mut write, message, bound).await {
                                break exit;
                            }
                        }
                        None => break SessionExit::Error("outbound channel closed".to_string()),
                    }
                }
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(WsMessage::Close(frame))) => {
                            if let Some(frame) = frame {
                                info!(
                                    code = %frame.code,
                                    reason = %frame.reason.as_str(),
                                    "websocket close frame"
                                );
                            }
                            break SessionExit::Closed;
                        }
                        Some(Ok(WsMessage::Pong(_))) => {
                            pong_deadline = None;
                        }
                        Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Frame(_))) => {}
                        Some(Ok(message)) => self.dispatch(message),
                        Some(Err(err)) => break SessionExit::Error(err.to_string()),
                        None => break SessionExit::Closed,
                    }
                }
                _ = heartbeat.tick() => {
                    let bound =
                        *pong_deadline.get_or_insert_with(|| Instant::now() + ping_timeout);
                    let ping = WsMessage::Ping(Vec::new().into());
                    if let Err(exit) = self.write_frame(&mut write, ping, bound).await {
                        break exit;
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    warn!(?ping_timeout, "heartbeat missed");
                    break SessionExit::Error("heartbeat timeout".to_string());
                }
            }
        };

        self.set_outbound(None);
        if exit == SessionExit::Shutdown {
            let _ = timeout(CLOSE_TIMEOUT, write.send(WsMessage::Close(None))).await;
        }
        exit
    }

    /// Write one frame, giving up at `bound` or on shutdown.
    ///
    /// A peer that stops reading fills the socket buffer and stalls the sink;
    /// that counts as a dead connection.
    async fn write_frame<S>(
        &self,
        write: &mut S,
        message: WsMessage,
        bound: Instant,
    ) -> std::result::Result<(), SessionExit>
    where
        S: Sink<WsMessage, Error = WsError> + Unpin,
    {
        tokio::select! {
            _ = self.inner.shutdown.cancelled() => Err(SessionExit::Shutdown),
            _ = sleep_until(bound) => {
                warn!("websocket write stalled");
                Err(SessionExit::Error("write timeout".to_string()))
            }
            result = write.send(message) => {
                result.map_err(|err| SessionExit::Error(err.to_string()))
            }
        }
    }

    /// Decode a frame and hand it to the handler, isolating handler failures
    fn dispatch(&self, message: WsMessage) {
        let Some(payload) = decode_frame(message) else {
            return;
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.inner.handler.on_message(self, payload)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(error = %err, "message handler failed"),
            Err(_) => error!("message handler panicked"),
        }
    }

    fn set_state(&self, state: StreamState) {
        self.inner.state.send_replace(state);
    }

    fn set_outbound(&self, sender: Option<mpsc::Sender<WsMessage>>) {
        let mut guard = self
            .inner
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = sender;
    }

    fn outbound_sender(&self) -> Option<mpsc::Sender<WsMessage>> {
        self.inner
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for StreamingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingClient")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .field("reconnects", &self.reconnect_count())
            .finish()
    }
}
