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


//! Remote access to a LindaSpaces tuple space
//!
//! ## Purpose
//! Lets processes share one authoritative [`TupleSpace`] over the network.
//! The endpoint side wraps the engine; the proxy side implements
//! [`TupleSpaceProvider`] by forwarding every operation.
//!
//! ## Architecture
//! ```text
//! ┌──────────────────────────┐
//! │  RemoteTupleSpace        │  TupleSpaceProvider
//! │  (proxy, any process)    │
//! └────────┬─────────────────┘
//!          │ Transport (TCP, newline-delimited JSON)
//!     ┌────▼─────────────────────┐
//!     │  SpaceServer             │  one task per request
//!     └────────┬─────────────────┘
//!              │
//!         ┌────▼─────────────┐
//!         │  SpaceEndpoint   │  request -> engine call
//!         └────────┬─────────┘
//!                  │
//!           ┌──────▼──────┐
//!           │ TupleSpace  │  authoritative collection
//!           └─────────────┘
//! ```
//!
//! ## Design Principles
//! - **Single source of truth**: proxies hold no tuples and no waiters
//! - **No hidden retries**: a broken connection fails outstanding calls with
//!   [`TupleSpaceError::Connection`]
//! - **Blocking is per request**: a pending take never delays other requests
//!   on the same connection
//!
//! ## Example
//! ```rust,no_run
//! use lindaspaces_tuplespace::{template, tuple, FieldType, TupleSpaceProvider};
//! use lindaspaces_tuplespace_service::{RemoteTupleSpace, ServiceConfig, SpaceServer};
//!
//! # async fn run() -> Result<(), lindaspaces_tuplespace::TupleSpaceError> {
//! let config = ServiceConfig::load(None)?;
//! let server = SpaceServer::bind(&config).await?;
//! tokio::spawn(server.serve());
//!
//! let proxy = RemoteTupleSpace::connect(&config).await?;
//! proxy.write(tuple!("job", 1)).await?;
//! let _job = proxy.take(&template!("job", FieldType::Integer)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod endpoint;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::RemoteTupleSpace;
pub use config::ServiceConfig;
pub use endpoint::SpaceEndpoint;
pub use protocol::{ErrorCode, SpaceRequest, SpaceResponse};
pub use server::SpaceServer;
pub use transport::{LocalTransport, TcpTransport, Transport};

#[cfg(doc)]
use lindaspaces_tuplespace::{TupleSpace, TupleSpaceError, TupleSpaceProvider};
