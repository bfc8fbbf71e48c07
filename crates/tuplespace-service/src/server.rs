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


//! TCP server for a [`SpaceEndpoint`]
//!
//! Each accepted connection gets a reader loop and a writer task. Every
//! request runs in its own task so that a blocking take does not hold up
//! later requests on the same connection. When the connection ends, its
//! outstanding request tasks are aborted, which cancels their engine-side
//! waiters.
//!
//! Responses are encoded by the request task. Tuples removed by a take whose
//! response cannot be delivered are written back to the space.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use lindaspaces_tuplespace::{TupleSpace, TupleSpaceError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::endpoint::SpaceEndpoint;
use crate::protocol::{
    decode_frame, encode_frame, salvage_request_id, ErrorCode, RequestEnvelope, ResponseEnvelope,
    SpaceResponse,
};

/// Listener serving one endpoint
#[derive(Debug)]
pub struct SpaceServer {
    listener: TcpListener,
    endpoint: SpaceEndpoint,
    max_frame_bytes: usize,
}

impl SpaceServer {
    /// Bind `config.bind_addr` and serve a fresh engine built from `config.space`
    pub async fn bind(config: &ServiceConfig) -> Result<Self, TupleSpaceError> {
        let space = Arc::new(TupleSpace::with_config(config.space.clone()));
        Self::bind_endpoint(config, SpaceEndpoint::new(space)).await
    }

    /// Bind `config.bind_addr` and serve an existing endpoint
    pub async fn bind_endpoint(
        config: &ServiceConfig,
        endpoint: SpaceEndpoint,
    ) -> Result<Self, TupleSpaceError> {
        let listener = TcpListener::bind(&config.bind_addr).await.map_err(|e| {
            TupleSpaceError::Connection(format!("bind {}: {}", config.bind_addr, e))
        })?;
        info!(
            addr = %listener.local_addr()?,
            space = %endpoint.space().name(),
            "tuple space endpoint listening"
        );
        Ok(Self {
            listener,
            endpoint,
            max_frame_bytes: config.max_frame_bytes,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, TupleSpaceError> {
        Ok(self.listener.local_addr()?)
    }

    /// The endpoint being served
    pub fn endpoint(&self) -> &SpaceEndpoint {
        &self.endpoint
    }

    /// Accept connections until the process ends
    pub async fn serve(self) -> Result<(), TupleSpaceError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes, then drop them all
    pub async fn serve_with_shutdown(
        self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), TupleSpaceError> {
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(connections = connections.len(), "tuple space endpoint shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(serve_connection(
                            stream,
                            peer,
                            self.endpoint.clone(),
                            self.max_frame_bytes,
                        ));
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            error!(error = %e, "connection task panicked");
                        }
                    }
                }
            }
        }

        connections.shutdown().await;
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    endpoint: SpaceEndpoint,
    max_frame_bytes: usize,
) {
    info!(%peer, "proxy connected");
    let (read_half, mut write_half) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = write_half.write_all(&frame).await {
                debug!(%peer, error = %e, "write failed");
                break;
            }
        }
    });

    let mut requests = JoinSet::new();
    let mut lines = BufReader::new(read_half).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let envelope: RequestEnvelope = match decode_frame(&line, max_frame_bytes) {
                        Ok(envelope) => envelope,
                        Err(e) => match salvage_request_id(&line) {
                            Some(id) => {
                                warn!(%peer, id, error = %e, "undecodable request");
                                let response = SpaceResponse::error(ErrorCode::BadRequest, e.to_string());
                                respond(&endpoint, &tx, id, response, false, max_frame_bytes);
                                continue;
                            }
                            None => {
                                warn!(%peer, error = %e, "unframed request, closing connection");
                                break;
                            }
                        },
                    };
                    let endpoint = endpoint.clone();
                    let tx = tx.clone();
                    requests.spawn(async move {
                        let removes = envelope.request.removes();
                        let response = endpoint.handle(envelope.request).await;
                        respond(&endpoint, &tx, envelope.id, response, removes, max_frame_bytes);
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(%peer, error = %e, "read failed");
                    break;
                }
            },
            Some(_) = requests.join_next(), if !requests.is_empty() => {}
        }
        if writer.is_finished() {
            break;
        }
    }

    let outstanding = requests.len();
    requests.shutdown().await;
    drop(tx);
    let _ = writer.await;
    info!(%peer, outstanding, "proxy disconnected");
}

/// Encode and queue one response
///
/// Tuples removed by the request go back into the space when their response
/// cannot be encoded or the connection's writer is gone. An oversized
/// response is replaced by an [`ErrorCode::Internal`] error for the same id.
fn respond(
    endpoint: &SpaceEndpoint,
    tx: &mpsc::UnboundedSender<Vec<u8>>,
    id: u64,
    response: SpaceResponse,
    removes: bool,
    max_frame_bytes: usize,
) {
    let envelope = ResponseEnvelope { id, response };
    let (frame, pending) = match encode_frame(&envelope, max_frame_bytes) {
        Ok(frame) => (frame, Some(envelope.response)),
        Err(e) => {
            warn!(id, error = %e, "response not sendable");
            if removes {
                endpoint.restore(envelope.response);
            }
            let failure = ResponseEnvelope {
                id,
                response: SpaceResponse::error(
                    ErrorCode::Internal,
                    format!("response too large: {}", e),
                ),
            };
            // error frames are small; the cap only guards tuple payloads
            match encode_frame(&failure, usize::MAX) {
                Ok(frame) => (frame, None),
                Err(e) => {
                    error!(id, error = %e, "error response not encodable");
                    return;
                }
            }
        }
    };

    if tx.send(frame).is_err() {
        if let (true, Some(response)) = (removes, pending) {
            endpoint.restore(response);
        }
    }
}
