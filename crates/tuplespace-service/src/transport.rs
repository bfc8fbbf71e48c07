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


//! Request/response transports
//!
//! ## Purpose
//! A [`Transport`] moves one [`SpaceRequest`] to the endpoint and returns its
//! [`SpaceResponse`]. Proxies are written against the trait so the channel
//! can be a TCP connection or an in-process endpoint.
//!
//! ## Multiplexing
//! [`TcpTransport`] shares one connection between concurrent calls. Each call
//! registers a oneshot under a fresh id; a reader task routes every response
//! to the call waiting on its id. When the connection ends, every call still
//! in flight fails with [`TupleSpaceError::Connection`]. Nothing is retried.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use lindaspaces_tuplespace::TupleSpaceError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::endpoint::SpaceEndpoint;
use crate::protocol::{
    decode_frame, encode_frame, RequestEnvelope, ResponseEnvelope, SpaceRequest, SpaceResponse,
};

/// Channel to a remote endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and wait for its response
    async fn call(&self, request: SpaceRequest) -> Result<SpaceResponse, TupleSpaceError>;
}

/// Transport that calls an endpoint in the same process
#[derive(Debug, Clone)]
pub struct LocalTransport {
    endpoint: SpaceEndpoint,
}

impl LocalTransport {
    /// Wrap `endpoint`
    pub fn new(endpoint: SpaceEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn call(&self, request: SpaceRequest) -> Result<SpaceResponse, TupleSpaceError> {
        Ok(self.endpoint.handle(request).await)
    }
}

#[derive(Default)]
struct InFlight {
    calls: HashMap<u64, oneshot::Sender<SpaceResponse>>,
    closed: bool,
}

/// Transport over a single multiplexed TCP connection
pub struct TcpTransport {
    peer: SocketAddr,
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    in_flight: Arc<Mutex<InFlight>>,
    next_id: AtomicU64,
    max_frame_bytes: usize,
    reader: JoinHandle<()>,
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("peer", &self.peer)
            .field("in_flight", &lock(&self.in_flight).calls.len())
            .finish()
    }
}

impl TcpTransport {
    /// Connect to `config.server_addr` within `config.connect_timeout_ms`
    pub async fn connect(config: &ServiceConfig) -> Result<Self, TupleSpaceError> {
        let addr = config.server_addr.as_str();
        let stream = tokio::time::timeout(config.connect_timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_| {
                TupleSpaceError::Connection(format!(
                    "timed out after {:?} connecting to {}",
                    config.connect_timeout(),
                    addr
                ))
            })?
            .map_err(|e| TupleSpaceError::Connection(format!("connect to {}: {}", addr, e)))?;
        Self::from_stream(stream, config.max_frame_bytes)
    }

    /// Use an already established connection
    pub fn from_stream(stream: TcpStream, max_frame_bytes: usize) -> Result<Self, TupleSpaceError> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();
        let in_flight = Arc::new(Mutex::new(InFlight::default()));
        let reader = tokio::spawn(read_responses(
            read_half,
            in_flight.clone(),
            peer,
            max_frame_bytes,
        ));
        info!(%peer, "connected to tuple space endpoint");

        Ok(Self {
            peer,
            writer: tokio::sync::Mutex::new(write_half),
            in_flight,
            next_id: AtomicU64::new(1),
            max_frame_bytes,
            reader,
        })
    }

    /// Address of the endpoint
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Number of calls waiting for a response
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).calls.len()
    }

    async fn send(&self, id: u64, request: SpaceRequest) -> Result<(), TupleSpaceError> {
        let frame = encode_frame(&RequestEnvelope { id, request }, self.max_frame_bytes)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn call(&self, request: SpaceRequest) -> Result<SpaceResponse, TupleSpaceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let op = request.op();
        let (tx, rx) = oneshot::channel();
        {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.closed {
                return Err(TupleSpaceError::Connection(format!(
                    "connection to {} is closed",
                    self.peer
                )));
            }
            in_flight.calls.insert(id, tx);
        }
        let guard = CallGuard {
            in_flight: &self.in_flight,
            id,
        };
        debug!(peer = %self.peer, id, op, "remote call");

        if let Err(e) = self.send(id, request).await {
            warn!(peer = %self.peer, id, op, error = %e, "failed to send request");
            return Err(match e {
                TupleSpaceError::Io(io) => TupleSpaceError::Connection(io.to_string()),
                other => other,
            });
        }

        let response = rx.await.map_err(|_| {
            TupleSpaceError::Connection(format!(
                "connection to {} closed with {} outstanding",
                self.peer, op
            ))
        });
        drop(guard);
        response
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Removes a call's routing entry however the call ends
struct CallGuard<'a> {
    in_flight: &'a Mutex<InFlight>,
    id: u64,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).calls.remove(&self.id);
    }
}

async fn read_responses(
    read_half: OwnedReadHalf,
    in_flight: Arc<Mutex<InFlight>>,
    peer: SocketAddr,
    max_frame_bytes: usize,
) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let envelope: ResponseEnvelope = match decode_frame(&line, max_frame_bytes) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!(%peer, error = %e, "undecodable response, closing connection");
                        break;
                    }
                };
                let waiter = lock(&in_flight).calls.remove(&envelope.id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(envelope.response);
                    }
                    None => {
                        warn!(%peer, id = envelope.id, kind = envelope.response.kind(), "response for unknown call dropped")
                    }
                }
            }
            Ok(None) => {
                info!(%peer, "endpoint closed connection");
                break;
            }
            Err(e) => {
                warn!(%peer, error = %e, "connection read failed");
                break;
            }
        }
    }

    let mut in_flight = lock(&in_flight);
    in_flight.closed = true;
    // dropping the senders fails every outstanding call
    let failed = in_flight.calls.drain().count();
    if failed > 0 {
        warn!(%peer, failed, "failing outstanding calls");
    }
}

fn lock(in_flight: &Mutex<InFlight>) -> MutexGuard<'_, InFlight> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lindaspaces_tuplespace::{template, tuple, FieldType, TupleSpace};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_local_transport_reaches_endpoint() {
        let space = Arc::new(TupleSpace::default());
        let transport = LocalTransport::new(SpaceEndpoint::new(space.clone()));

        transport
            .call(SpaceRequest::Write { tuple: tuple!("a", 1) })
            .await
            .unwrap();
        assert_eq!(space.len(), 1);
    }

    #[tokio::test]
    async fn test_responses_are_routed_by_id() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // answers two requests in reverse order
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut lines = BufReader::new(read_half).lines();
            let mut received = Vec::new();
            for _ in 0..2 {
                let line = lines.next_line().await.unwrap().unwrap();
                let envelope: RequestEnvelope = serde_json::from_str(&line).unwrap();
                received.push(envelope);
            }
            for envelope in received.into_iter().rev() {
                let SpaceRequest::Debug { prefix } = envelope.request else {
                    panic!("unexpected request");
                };
                let response = ResponseEnvelope {
                    id: envelope.id,
                    response: SpaceResponse::Tuple {
                        tuple: tuple!(prefix.as_str()),
                    },
                };
                write_half
                    .write_all(&encode_frame(&response, 1024).unwrap())
                    .await
                    .unwrap();
            }
            // keep the connection open until the client is done
            let _ = lines.next_line().await;
        });

        let config = ServiceConfig::default().with_server_addr(addr.to_string());
        let transport = TcpTransport::connect(&config).await.unwrap();
        let (first, second) = tokio::join!(
            transport.call(SpaceRequest::Debug { prefix: "first".into() }),
            transport.call(SpaceRequest::Debug { prefix: "second".into() }),
        );
        assert_eq!(first.unwrap(), SpaceResponse::Tuple { tuple: tuple!("first") });
        assert_eq!(second.unwrap(), SpaceResponse::Tuple { tuple: tuple!("second") });
        assert_eq!(transport.in_flight(), 0);

        drop(transport);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_outstanding_calls_fail_when_connection_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // reads one request, then hangs up without answering
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(stream).lines();
            let _ = lines.next_line().await;
        });

        let config = ServiceConfig::default().with_server_addr(addr.to_string());
        let transport = TcpTransport::connect(&config).await.unwrap();
        let result = transport
            .call(SpaceRequest::Take {
                template: template!(FieldType::Integer),
            })
            .await;
        assert!(matches!(result, Err(TupleSpaceError::Connection(_))));

        let result = transport
            .call(SpaceRequest::Debug { prefix: "after".into() })
            .await;
        assert!(matches!(result, Err(TupleSpaceError::Connection(_))));
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ServiceConfig::default().with_server_addr(addr.to_string());
        let err = TcpTransport::connect(&config).await.unwrap_err();
        assert!(err.is_transport());
    }
}
