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

//! Error types for tuple space operations
//!
//! Absence of a match is never an error: `try_take`/`try_read` return `None`.

use std::time::Duration;

/// TupleSpace errors
#[derive(Debug, thiserror::Error)]
pub enum TupleSpaceError {
    /// A blocking take/read/wait hit its configured deadline
    #[error("Timed out after {0:?} waiting for a matching tuple")]
    Timeout(Duration),

    /// Pending event removed before it resolved
    #[error("Wait cancelled: {0}")]
    Cancelled(String),

    /// Transport failure while a remote call was outstanding
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error reported by the remote endpoint
    #[error("Remote error: {0}")]
    Remote(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TupleSpaceError {
    /// True for failures of the channel to the authoritative space
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TupleSpaceError::Connection(_) | TupleSpaceError::Io(_)
        )
    }
}
