//! # rabbitmon-api - Management API Adapter
//!
//! Translates management operations into HTTP round trips and interprets the
//! responses. The transport itself is pluggable: anything implementing
//! [`Requester`] can carry the requests (see `rabbitmon-http` for a reqwest
//! backed one).
//!
//! ## Public API
//!
//! - [`Requester`] - One HTTP round trip; returns `Some(json)` or `None` for
//!   an empty body
//! - [`Api`] - Version-aware protocol adapter with one method per endpoint
//! - [`MessageDialect`] - Request body shapes for fetching messages, per
//!   management version range
//! - Option types: [`ExchangeOptions`], [`QueueOptions`], [`GetMessages`],
//!   [`Publish`], [`DestinationType`], [`QueueAction`]
//!
//! ## Test helpers
//!
//! With the `test-helpers` feature, [`test_utils::FakeRequester`] provides a
//! scripted transport that records every request.

pub mod api;
pub mod dialect;
pub mod options;
pub mod transport;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use api::Api;
pub use dialect::{AckMode, MessageDialect};
pub use options::{
    DestinationType, ExchangeOptions, GetMessages, PayloadEncoding, Publish, QueueAction,
    QueueOptions,
};
pub use transport::{describe, encode_path, encode_segment, LocalRequester, Method, Query, Requester};
