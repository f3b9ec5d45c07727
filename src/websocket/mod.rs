//! WebSocket module for price stream connection management

mod client;
mod dispatcher;
mod endpoint;
mod manager;
mod policy;
mod state;
mod subscription;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{WsConnector, WsTransport};
pub use dispatcher::{ControlSignal, Dispatcher};
pub use endpoint::{PageLocation, DEFAULT_STREAM_PATH};
pub use manager::EXHAUSTED_MESSAGE;
pub use policy::{ReconnectPolicy, MAX_RETRY_DELAY};
pub use state::{ConnectionState, StreamStatus};
pub use subscription::SubscriptionSet;
pub use transport::{Connector, Transport, TransportEvent, NORMAL_CLOSURE};

pub(crate) use manager::{Command, ConnectionManager};

#[cfg(test)]
pub(crate) use transport::MockConnector;
