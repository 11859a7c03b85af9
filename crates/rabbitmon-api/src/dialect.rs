//! Request-body dialects for fetching messages from a queue
//!
//! The body of `POST queues/{vhost}/{name}/get` depends on the management
//! plugin version:
//!
//! | Version            | Dialect                          | Disposition field |
//! |--------------------|----------------------------------|-------------------|
//! | `< 3.6`            | none, [`Error::UnsupportedVersion`] | -              |
//! | `3.6 <= v < 3.7`   | [`MessageDialect::RequeueFlag`]  | `requeue: bool`   |
//! | `>= 3.7`           | [`MessageDialect::AckModeField`] | `ackmode: string` |
//!
//! A call the selected dialect cannot express fails before any request is
//! sent; it is never downgraded to a near match.

use serde::Serialize;
use serde_json::{json, Value};

use rabbitmon_core::prelude::*;
use rabbitmon_core::Version;

use crate::options::GetMessages;

const OPERATION: &str = "get messages";

/// Post-retrieval disposition used by the 3.7+ dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckMode {
    AckRequeueTrue,
    AckRequeueFalse,
    RejectRequeueTrue,
    RejectRequeueFalse,
}

impl AckMode {
    pub fn from_flags(requeue: bool, reject: bool) -> Self {
        match (requeue, reject) {
            (true, false) => AckMode::AckRequeueTrue,
            (false, false) => AckMode::AckRequeueFalse,
            (true, true) => AckMode::RejectRequeueTrue,
            (false, true) => AckMode::RejectRequeueFalse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AckMode::AckRequeueTrue => "ack_requeue_true",
            AckMode::AckRequeueFalse => "ack_requeue_false",
            AckMode::RejectRequeueTrue => "reject_requeue_true",
            AckMode::RejectRequeueFalse => "reject_requeue_false",
        }
    }
}

/// One variant per supported version range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDialect {
    /// `3.6 <= v < 3.7`: raw `requeue` boolean, no way to reject
    RequeueFlag,
    /// `v >= 3.7`: a single `ackmode` field
    AckModeField,
}

impl MessageDialect {
    /// Every known dialect, newest first
    pub const ALL: [MessageDialect; 2] = [MessageDialect::AckModeField, MessageDialect::RequeueFlag];

    /// Inclusive lower bound of the version range
    pub fn since(&self) -> Version {
        match self {
            MessageDialect::RequeueFlag => Version::from_components(&[3, 6]).with_fill(0),
            MessageDialect::AckModeField => Version::from_components(&[3, 7]).with_fill(0),
        }
    }

    /// Exclusive upper bound of the version range, if any
    pub fn until(&self) -> Option<Version> {
        match self {
            MessageDialect::RequeueFlag => Some(Version::from_components(&[3, 7]).with_fill(0)),
            MessageDialect::AckModeField => None,
        }
    }

    /// Whether `version` falls in this dialect's range
    pub fn supports(&self, version: &Version) -> Result<bool> {
        match self.until() {
            Some(upper) => version.in_range(&self.since(), &upper),
            None => Ok(version.compare(&self.since())? != std::cmp::Ordering::Less),
        }
    }

    /// Select the dialect for a detected management version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] when no dialect covers `version`.
    pub fn for_version(version: &Version) -> Result<Self> {
        for dialect in Self::ALL {
            if dialect.supports(version)? {
                debug!("Management {} uses {:?} message dialect", version, dialect);
                return Ok(dialect);
            }
        }
        Err(Error::unsupported_version(OPERATION, version.as_str()))
    }

    /// Build the request body for fetching from `vhost`/`queue`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] if the dialect cannot express
    /// the request (rejecting under [`MessageDialect::RequeueFlag`]).
    pub fn body(&self, vhost: &str, queue: &str, request: &GetMessages) -> Result<Value> {
        let mut body = json!({
            "count": request.count,
            "encoding": request.encoding,
            "name": queue,
            "vhost": vhost,
        });

        match self {
            MessageDialect::RequeueFlag => {
                if request.reject {
                    return Err(Error::unsupported_operation(
                        OPERATION,
                        "reject is not representable before management 3.7",
                    ));
                }
                body["requeue"] = json!(request.requeue);
            }
            MessageDialect::AckModeField => {
                body["ackmode"] = json!(AckMode::from_flags(request.requeue, request.reject));
            }
        }

        if let Some(truncate) = request.truncate {
            body["truncate"] = json!(truncate);
        }

        Ok(body)
    }
}
