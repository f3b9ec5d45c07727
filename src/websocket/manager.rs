//! WebSocket connection manager
//!
//! Handles the connection lifecycle, reconnection, subscription replay and
//! message dispatch. Runs as one task; every mutation of connection state,
//! subscriptions and the cache happens here, one event at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, timeout, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use super::dispatcher::{ControlSignal, Dispatcher};
use super::policy::ReconnectPolicy;
use super::state::{ConnectionState, StreamStatus};
use super::subscription::SubscriptionSet;
use super::transport::{Connector, Transport, TransportEvent, NORMAL_CLOSURE};
use crate::config::Config;
use crate::error::Result;
use crate::metrics::StreamMetrics;
use crate::parser::ClientMessage;

/// Error reported once automatic retries are used up
pub const EXHAUSTED_MESSAGE: &str = "max reconnection attempts reached";

/// Upper bound on waiting for a close handshake during teardown
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests from the client facade
#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    Disconnect,
    Subscribe(Vec<String>),
    Unsubscribe,
    Shutdown,
}

type PendingConnect = BoxFuture<'static, Result<Box<dyn Transport>>>;

/// Owns the transport, its retry policy and the subscription set
pub(crate) struct ConnectionManager {
    url: String,
    connector: Arc<dyn Connector>,
    /// At most one transport exists at a time
    transport: Option<Box<dyn Transport>>,
    /// In-flight connection attempt; dropping it cancels the attempt
    pending: Option<PendingConnect>,
    reconnect_at: Option<Instant>,
    policy: ReconnectPolicy,
    subscriptions: SubscriptionSet,
    dispatcher: Dispatcher,
    idle_timeout: Option<Duration>,
    last_frame: Instant,
    status: watch::Sender<StreamStatus>,
    commands: mpsc::UnboundedReceiver<Command>,
    metrics: Arc<StreamMetrics>,
}

impl ConnectionManager {
    pub(crate) fn new(
        config: &Config,
        connector: Arc<dyn Connector>,
        dispatcher: Dispatcher,
        status: watch::Sender<StreamStatus>,
        commands: mpsc::UnboundedReceiver<Command>,
        metrics: Arc<StreamMetrics>,
    ) -> Self {
        Self {
            url: config.ws_url.clone(),
            connector,
            transport: None,
            pending: None,
            reconnect_at: None,
            policy: config.reconnect_policy(),
            subscriptions: SubscriptionSet::new(&config.symbols),
            dispatcher,
            idle_timeout: config.idle_timeout(),
            last_frame: Instant::now(),
            status,
            commands,
            metrics,
        }
    }

    /// Run until the facade shuts down or is dropped
    pub(crate) async fn run(mut self) {
        info!(
            url = %self.url,
            symbols = ?self.subscriptions.symbols(),
            max_attempts = self.policy.max_attempts(),
            "Starting connection manager"
        );

        loop {
            let idle_deadline = self.idle_deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                outcome = poll_pending(&mut self.pending) => {
                    self.pending = None;
                    self.on_connect_outcome(outcome).await;
                }
                event = next_event(&mut self.transport, idle_deadline) => {
                    self.on_transport_event(event);
                }
                _ = sleep_until_deadline(self.reconnect_at) => {
                    self.reconnect_at = None;
                    info!(attempt = self.policy.attempt(), "Reconnecting to price stream");
                    self.begin_connect();
                }
            }
        }

        self.release_all("client shutdown").await;
        self.update_status(|status| {
            *status = StreamStatus {
                state: ConnectionState::ClosedClean,
                ..StreamStatus::default()
            }
        });
        info!("Connection manager stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        debug!(command = ?command, "Handling command");
        match command {
            Command::Connect => self.connect().await,
            Command::Disconnect => self.disconnect().await,
            Command::Subscribe(symbols) => self.subscribe(symbols).await,
            Command::Unsubscribe => self.unsubscribe().await,
            Command::Shutdown => {}
        }
    }

    async fn connect(&mut self) {
        if self.pending.is_some() {
            debug!("Connect ignored, attempt already in flight");
            return;
        }

        if self.transport.is_some() {
            if self.current_state() == ConnectionState::Open {
                debug!("Connect ignored, already open");
                return;
            }
            // Still attached after a server error frame
            self.release_transport("reconnect requested").await;
        }

        if self.reconnect_at.take().is_some() {
            debug!("Scheduled reconnect replaced by explicit connect");
        }

        self.begin_connect();
    }

    fn begin_connect(&mut self) {
        self.reconnect_at = None;
        self.metrics.connect_attempts.inc();

        let connector = Arc::clone(&self.connector);
        let url = self.url.clone();
        self.pending = Some(Box::pin(async move { connector.connect(&url).await }));

        self.update_status(|status| {
            status.state = ConnectionState::Connecting;
            status.retry_delay_ms = None;
            status.acknowledged = false;
        });
    }

    async fn disconnect(&mut self) {
        info!("Disconnecting from price stream");
        self.release_all("client disconnect").await;
        self.update_status(|status| {
            *status = StreamStatus {
                state: ConnectionState::ClosedClean,
                ..StreamStatus::default()
            }
        });
    }

    async fn subscribe(&mut self, symbols: Vec<String>) {
        let added = self.subscriptions.merge(&symbols);
        info!(
            added,
            symbols = ?self.subscriptions.symbols(),
            "Subscription set updated"
        );

        if self.transport.is_some() {
            if let Some(message) = self.subscriptions.subscribe_message() {
                self.send(&message).await;
            }
        }
    }

    async fn unsubscribe(&mut self) {
        self.subscriptions.clear();
        info!("Subscription set cleared");

        if self.transport.is_some() {
            self.send(&ClientMessage::Unsubscribe).await;
        }
    }

    async fn on_connect_outcome(&mut self, outcome: Result<Box<dyn Transport>>) {
        match outcome {
            Ok(transport) => {
                self.transport = Some(transport);
                self.last_frame = Instant::now();
                self.policy.reset();
                info!(url = %self.url, "Price stream open, resetting reconnect counter");

                self.update_status(|status| {
                    status.state = ConnectionState::Open;
                    status.attempt = 0;
                    status.retry_delay_ms = None;
                    status.acknowledged = false;
                    status.error = None;
                });

                self.replay().await;
            }
            Err(e) => {
                self.on_connection_lost(e.to_string());
            }
        }
    }

    /// Resend the whole subscription set on a freshly opened transport
    async fn replay(&mut self) {
        if let Some(message) = self.subscriptions.subscribe_message() {
            info!(symbols = ?self.subscriptions.symbols(), "Replaying subscriptions");
            self.send(&message).await;
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Text(raw) => {
                self.last_frame = Instant::now();
                match self.dispatcher.handle_frame(&raw, Utc::now()) {
                    Some(ControlSignal::Acknowledged) => self.update_status(|status| {
                        status.state = ConnectionState::Open;
                        status.acknowledged = true;
                        status.error = None;
                    }),
                    Some(ControlSignal::ServerError(message)) => self.update_status(|status| {
                        status.state = ConnectionState::ClosedError;
                        status.acknowledged = false;
                        status.error = Some(message);
                    }),
                    None => {}
                }
            }
            event if event.is_clean_close() => {
                self.transport = None;
                info!(event = ?event, "Server closed the stream normally");
                self.update_status(|status| {
                    status.state = ConnectionState::ClosedClean;
                    status.retry_delay_ms = None;
                    status.acknowledged = false;
                });
            }
            TransportEvent::Closed { code, reason } => {
                self.transport = None;
                let reason = match code {
                    Some(code) => format!("connection closed abnormally (code {code}): {reason}"),
                    None => format!("connection closed abnormally: {reason}"),
                };
                self.on_connection_lost(reason);
            }
            TransportEvent::Error(message) => {
                self.transport = None;
                self.on_connection_lost(message);
            }
        }
    }

    /// Record the failure and schedule the next attempt, if any remain
    fn on_connection_lost(&mut self, reason: String) {
        warn!(error = %reason, "Price stream connection lost");

        let next = self
            .policy
            .next_delay()
            .and_then(|delay| Some((delay, Instant::now().checked_add(delay)?)));

        match next {
            Some((delay, at)) => {
                let attempt = self.policy.attempt();
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                self.reconnect_at = Some(at);
                self.metrics.reconnects_scheduled.inc();

                warn!(attempt, delay_ms, "Reconnect scheduled");
                self.update_status(|status| {
                    status.state = ConnectionState::ReconnectScheduled;
                    status.attempt = attempt;
                    status.retry_delay_ms = Some(delay_ms);
                    status.acknowledged = false;
                    status.error = Some(reason);
                });
            }
            None => {
                let attempt = self.policy.attempt();
                error!(
                    max_attempts = self.policy.max_attempts(),
                    last_error = %reason,
                    "Max reconnection attempts reached"
                );
                self.update_status(|status| {
                    status.state = ConnectionState::ReconnectExhausted;
                    status.attempt = attempt;
                    status.retry_delay_ms = None;
                    status.acknowledged = false;
                    status.error = Some(EXHAUSTED_MESSAGE.to_string());
                });
            }
        }
    }

    async fn send(&mut self, message: &ClientMessage) {
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to encode client frame");
                return;
            }
        };

        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        let sent = transport.send_text(frame).await;
        if let Err(e) = sent {
            warn!(error = %e, "Failed to send frame");
            self.transport = None;
            self.on_connection_lost(e.to_string());
        }
    }

    /// Cancel the timer, drop any in-flight attempt, close the transport and
    /// clear subscriptions and prices
    async fn release_all(&mut self, reason: &str) {
        if self.reconnect_at.take().is_some() {
            debug!("Cancelled scheduled reconnect");
        }
        if self.pending.take().is_some() {
            debug!("Cancelled in-flight connection attempt");
        }
        self.release_transport(reason).await;
        self.policy.reset();
        self.subscriptions.clear();
        self.dispatcher.clear();
    }

    async fn release_transport(&mut self, reason: &str) {
        if let Some(mut transport) = self.transport.take() {
            if timeout(CLOSE_TIMEOUT, transport.close(NORMAL_CLOSURE, reason))
                .await
                .is_err()
            {
                warn!("Timed out closing transport");
            }
        }
    }

    fn idle_deadline(&self) -> Option<Instant> {
        self.idle_timeout
            .and_then(|limit| self.last_frame.checked_add(limit))
    }

    fn current_state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    fn update_status(&self, modify: impl FnOnce(&mut StreamStatus)) {
        self.status.send_modify(modify);
    }
}

async fn poll_pending(slot: &mut Option<PendingConnect>) -> Result<Box<dyn Transport>> {
    match slot.as_mut() {
        Some(attempt) => attempt.await,
        None => std::future::pending().await,
    }
}

async fn next_event(
    slot: &mut Option<Box<dyn Transport>>,
    idle_deadline: Option<Instant>,
) -> TransportEvent {
    let Some(transport) = slot.as_mut() else {
        return std::future::pending().await;
    };

    match idle_deadline {
        Some(deadline) => match timeout_at(deadline, transport.recv()).await {
            Ok(event) => event,
            Err(_) => TransportEvent::Error("no frame received before idle timeout".to_string()),
        },
        None => transport.recv().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
