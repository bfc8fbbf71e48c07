// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of LindaSpaces.
//
// LindaSpaces is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// LindaSpaces is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with LindaSpaces. If not, see <https://www.gnu.org/licenses/>.


//! Wire protocol between proxies and the remote endpoint
//!
//! One JSON document per line. Every request carries a caller-chosen `id`
//! and the endpoint echoes it on the response, so a single connection can
//! carry any number of concurrent calls, including long-lived blocking ones.
//!
//! ```text
//! -> {"id":7,"request":{"op":"take","template":{"fields":[...]}}}
//! <- {"id":7,"response":{"status":"tuple","tuple":{"fields":[...]}}}
//! ```

use std::time::Duration;

use lindaspaces_tuplespace::{EventMode, EventTiming, Template, Tuple, TupleSpaceError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default upper bound on a single encoded frame
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Operation forwarded to the authoritative space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SpaceRequest {
    /// Store a tuple
    Write {
        /// Tuple to store
        tuple: Tuple,
    },
    /// Blocking take
    Take {
        /// Template to match
        template: Template,
    },
    /// Blocking read
    Read {
        /// Template to match
        template: Template,
    },
    /// Non-blocking take
    TryTake {
        /// Template to match
        template: Template,
    },
    /// Non-blocking read
    TryRead {
        /// Template to match
        template: Template,
    },
    /// Remove every current match
    TakeAll {
        /// Template to match
        template: Template,
    },
    /// Copy every current match
    ReadAll {
        /// Template to match
        template: Template,
    },
    /// Wait for the resolution of a single event registered on the endpoint
    WaitEvent {
        /// Read or take
        mode: EventMode,
        /// Whether existing tuples may resolve the event
        timing: EventTiming,
        /// Template to match
        template: Template,
    },
    /// Dump the collection to the endpoint's log
    Debug {
        /// Label printed before the collection
        prefix: String,
    },
}

impl SpaceRequest {
    /// Operation name used in logs
    pub fn op(&self) -> &'static str {
        match self {
            SpaceRequest::Write { .. } => "write",
            SpaceRequest::Take { .. } => "take",
            SpaceRequest::Read { .. } => "read",
            SpaceRequest::TryTake { .. } => "try_take",
            SpaceRequest::TryRead { .. } => "try_read",
            SpaceRequest::TakeAll { .. } => "take_all",
            SpaceRequest::ReadAll { .. } => "read_all",
            SpaceRequest::WaitEvent { .. } => "wait_event",
            SpaceRequest::Debug { .. } => "debug",
        }
    }

    /// True if a successful response carries tuples removed from the space
    pub fn removes(&self) -> bool {
        match self {
            SpaceRequest::Take { .. } | SpaceRequest::TryTake { .. } | SpaceRequest::TakeAll { .. } => {
                true
            }
            SpaceRequest::WaitEvent { mode, .. } => *mode == EventMode::Take,
            _ => false,
        }
    }
}

/// Outcome of a forwarded operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpaceResponse {
    /// Operation completed with no value
    Done,
    /// A single tuple (blocking take/read, wait_event)
    Tuple {
        /// Matched tuple
        tuple: Tuple,
    },
    /// A tuple or nothing (try_take/try_read)
    Maybe {
        /// Matched tuple, if any
        tuple: Option<Tuple>,
    },
    /// Zero or more tuples (take_all/read_all)
    Tuples {
        /// Matched tuples in collection order
        tuples: Vec<Tuple>,
    },
    /// Operation failed on the endpoint
    Error {
        /// Failure class
        code: ErrorCode,
        /// Human-readable detail
        message: String,
        /// Deadline that expired, for [`ErrorCode::Timeout`]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

impl SpaceResponse {
    /// Encode an endpoint-side failure
    pub fn from_error(error: &TupleSpaceError) -> Self {
        let (code, timeout_ms) = match error {
            TupleSpaceError::Timeout(after) => (ErrorCode::Timeout, Some(after.as_millis() as u64)),
            TupleSpaceError::Cancelled(_) => (ErrorCode::Cancelled, None),
            _ => (ErrorCode::Internal, None),
        };
        SpaceResponse::Error {
            code,
            message: error.to_string(),
            timeout_ms,
        }
    }

    /// Failure with no deadline attached
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        SpaceResponse::Error {
            code,
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Tuples carried by this response, in order
    pub fn into_tuples(self) -> Vec<Tuple> {
        match self {
            SpaceResponse::Tuple { tuple } => vec![tuple],
            SpaceResponse::Maybe { tuple } => tuple.into_iter().collect(),
            SpaceResponse::Tuples { tuples } => tuples,
            SpaceResponse::Done | SpaceResponse::Error { .. } => Vec::new(),
        }
    }

    /// Variant name used in logs and mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            SpaceResponse::Done => "done",
            SpaceResponse::Tuple { .. } => "tuple",
            SpaceResponse::Maybe { .. } => "maybe",
            SpaceResponse::Tuples { .. } => "tuples",
            SpaceResponse::Error { .. } => "error",
        }
    }
}

/// Failure class carried by [`SpaceResponse::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The endpoint's wait deadline expired
    Timeout,
    /// The endpoint cancelled the wait
    Cancelled,
    /// The request could not be decoded
    BadRequest,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Rebuild the caller-side error for a remote failure
    pub fn into_error(self, message: String, timeout_ms: Option<u64>) -> TupleSpaceError {
        match self {
            ErrorCode::Timeout => {
                TupleSpaceError::Timeout(Duration::from_millis(timeout_ms.unwrap_or_default()))
            }
            ErrorCode::Cancelled => TupleSpaceError::Cancelled(message),
            ErrorCode::BadRequest | ErrorCode::Internal => TupleSpaceError::Remote(message),
        }
    }
}

/// Request frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation id, unique per connection
    pub id: u64,
    /// Forwarded operation
    pub request: SpaceRequest,
}

/// Response frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Id of the request this answers
    pub id: u64,
    /// Outcome
    pub response: SpaceResponse,
}

/// Correlation id of a request frame that does not otherwise decode
pub fn salvage_request_id(line: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()?
        .get("id")?
        .as_u64()
}

/// Serialize `message` as a single newline-terminated frame
pub fn encode_frame<T: Serialize>(message: &T, max_bytes: usize) -> Result<Vec<u8>, TupleSpaceError> {
    let mut frame =
        serde_json::to_vec(message).map_err(|e| TupleSpaceError::Serialization(e.to_string()))?;
    if frame.len() > max_bytes {
        return Err(TupleSpaceError::Serialization(format!(
            "frame too large: {} bytes (max {})",
            frame.len(),
            max_bytes
        )));
    }
    frame.push(b'\n');
    Ok(frame)
}

/// Parse one frame, with or without its trailing newline
pub fn decode_frame<T: DeserializeOwned>(line: &str, max_bytes: usize) -> Result<T, TupleSpaceError> {
    let line = line.trim_end();
    if line.len() > max_bytes {
        return Err(TupleSpaceError::Serialization(format!(
            "frame too large: {} bytes (max {})",
            line.len(),
            max_bytes
        )));
    }
    serde_json::from_str(line).map_err(|e| TupleSpaceError::Serialization(e.to_string()))
}
