//! Snapshot entities backed by the protocol adapter
//!
//! Each entity is a snapshot of one broker resource: a few typed fields that
//! identify and describe it, plus an open [`Metrics`] bag holding every other
//! key of the response. `refresh()` replaces the whole snapshot; nothing is
//! merged from the previous one.
//!
//! Entities that can act on the broker hold an `Arc<Api<R>>`. [`User`] and
//! [`Message`] are plain values.

mod binding;
mod channel;
mod connection;
mod exchange;
mod message;
mod node;
mod queue;
mod snapshot;
mod user;
mod vhost;

pub use binding::{Binding, BindingData};
pub use channel::{Channel, ChannelData};
pub use connection::{Connection, ConnectionData};
pub use exchange::{Exchange, ExchangeData};
pub use message::{Message, MessageData};
pub use node::{Node, NodeData};
pub use queue::{Queue, QueueData};
pub use snapshot::Metrics;
pub use user::{User, UserData};
pub use vhost::{VHost, VHostData};

pub(crate) use snapshot::{decode, decode_listing};
