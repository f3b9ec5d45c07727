//! Client facade
//!
//! The only surface UI layers see. Actions are fire-and-forget and safe to
//! call in any state; failures show up in the observable status, never as
//! errors or panics.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;
use crate::error::{PriceStreamError, Result};
use crate::metrics::StreamMetrics;
use crate::prices::{PriceCache, PriceReader, PriceSnapshot};
use crate::websocket::{
    Command, ConnectionManager, Connector, Dispatcher, StreamStatus, WsConnector,
};

/// Reconnecting real-time price client
///
/// Must be created inside a tokio runtime. Dropping the client stops its
/// connection manager, closing the transport and cancelling any pending
/// reconnect.
pub struct PriceStreamClient {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<StreamStatus>,
    reader: PriceReader,
    updates: broadcast::Sender<PriceSnapshot>,
    metrics: Arc<StreamMetrics>,
    task: JoinHandle<()>,
}

impl PriceStreamClient {
    /// Start a client that connects over real WebSockets
    pub fn spawn(config: &Config) -> Result<Self> {
        Self::with_connector(config, Arc::new(WsConnector::new()))
    }

    /// Start a client on a custom transport
    pub fn with_connector(config: &Config, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;

        let metrics = Arc::new(StreamMetrics::new()?);
        let cache = Arc::new(RwLock::new(PriceCache::new()));
        let (updates, _) = broadcast::channel(config.update_buffer);
        let (status_tx, status_rx) = watch::channel(StreamStatus::default());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher::new(Arc::clone(&cache), updates.clone(), Arc::clone(&metrics));
        let manager = ConnectionManager::new(
            config,
            connector,
            dispatcher,
            status_tx,
            command_rx,
            Arc::clone(&metrics),
        );
        let task = tokio::spawn(manager.run());

        Ok(Self {
            commands: command_tx,
            status: status_rx,
            reader: PriceReader::new(cache),
            updates,
            metrics,
            task,
        })
    }

    /// Open the stream; ignored while connecting or open
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Close the stream, cancel retries, clear subscriptions and prices
    pub fn disconnect(&self) {
        self.send(Command::Disconnect);
    }

    /// Add symbols; the full set is sent when the stream is open
    pub fn subscribe<I, S>(&self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = symbols
            .into_iter()
            .map(|symbol| symbol.as_ref().to_string())
            .collect();
        self.send(Command::Subscribe(symbols));
    }

    /// Clear every subscription
    pub fn unsubscribe(&self) {
        self.send(Command::Unsubscribe);
    }

    pub fn status(&self) -> StreamStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn watch_status(&self) -> watch::Receiver<StreamStatus> {
        self.status.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.status.borrow().is_connecting()
    }

    pub fn connection_error(&self) -> Option<String> {
        self.status.borrow().error.clone()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.reader.last_update()
    }

    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.reader.price(symbol)
    }

    pub fn change_24h(&self, symbol: &str) -> Option<Decimal> {
        self.reader.change_24h(symbol)
    }

    pub fn price_data(&self, symbol: &str) -> Option<PriceSnapshot> {
        self.reader.price_data(symbol)
    }

    pub fn all_prices(&self) -> Vec<PriceSnapshot> {
        self.reader.all_prices()
    }

    /// Per-update notifications; slow receivers skip the oldest entries
    pub fn updates(&self) -> broadcast::Receiver<PriceSnapshot> {
        self.updates.subscribe()
    }

    /// Read-only cache view for other consumers
    pub fn reader(&self) -> PriceReader {
        self.reader.clone()
    }

    pub fn metrics(&self) -> Arc<StreamMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Stop the connection manager and wait for its teardown
    pub async fn shutdown(self) -> Result<()> {
        let Self { commands, task, .. } = self;
        let _ = commands.send(Command::Shutdown);
        task.await
            .map_err(|e| PriceStreamError::TaskFailed(e.to_string()))
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            debug!(command = ?e.0, "Connection manager stopped, command dropped");
        }
    }
}
