//! rabbitmon
//!
//! An async client for the RabbitMQ management HTTP API. [`Monitor`] is the
//! entry point; it hands out snapshot entities ([`VHost`], [`Exchange`],
//! [`Queue`], ...) that can refresh themselves and act on the broker.
//!
//! The transport is pluggable through [`Requester`]; `rabbitmon-http`
//! provides one built on reqwest.

pub mod entity;
pub mod monitor;

pub use entity::{
    Binding, Channel, Connection, Exchange, Message, Metrics, Node, Queue, User, VHost,
};
pub use monitor::Monitor;

// Re-export the layers underneath so most callers need one dependency
pub use rabbitmon_api::{
    Api, DestinationType, ExchangeOptions, GetMessages, PayloadEncoding, Publish, QueueAction,
    QueueOptions, Requester,
};
pub use rabbitmon_core::{Error, Result, Version};
