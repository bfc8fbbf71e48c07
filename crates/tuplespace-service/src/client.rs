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


//! Remote proxy
//!
//! ## Purpose
//! [`RemoteTupleSpace`] offers the full [`TupleSpaceProvider`] operation set
//! while the collection lives behind a [`Transport`]. Every operation becomes
//! one request; the proxy keeps no tuples and no waiters of its own.
//!
//! ## Events
//! `register_event` returns as soon as a background task has been started.
//! That task issues one `wait_event` request, which may stay outstanding
//! indefinitely, and invokes the callback with the tuple it returns. A failed
//! wait is logged and the callback is never invoked.

use std::sync::Arc;

use async_trait::async_trait;
use lindaspaces_tuplespace::{
    EventCallback, EventMode, EventTiming, Template, Tuple, TupleSpaceError, TupleSpaceProvider,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::protocol::{SpaceRequest, SpaceResponse};
use crate::transport::{TcpTransport, Transport};

/// Proxy for a tuple space hosted elsewhere
#[derive(Clone)]
pub struct RemoteTupleSpace {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for RemoteTupleSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTupleSpace").finish_non_exhaustive()
    }
}

impl RemoteTupleSpace {
    /// Connect to the endpoint at `config.server_addr`
    pub async fn connect(config: &ServiceConfig) -> Result<Self, TupleSpaceError> {
        let transport = TcpTransport::connect(config).await?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Use an arbitrary transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Start a background wait for one event
    ///
    /// The returned handle resolves after the callback ran, or with the
    /// error that prevented it from running.
    pub fn spawn_event_wait(
        &self,
        mode: EventMode,
        timing: EventTiming,
        template: Template,
        callback: EventCallback,
    ) -> JoinHandle<Result<(), TupleSpaceError>> {
        let proxy = self.clone();
        tokio::spawn(async move {
            let request = SpaceRequest::WaitEvent {
                mode,
                timing,
                template: template.clone(),
            };
            match proxy.call(request).await.and_then(expect_tuple) {
                Ok(tuple) => {
                    debug!(?mode, ?timing, %template, %tuple, "remote event resolved");
                    callback(tuple);
                    Ok(())
                }
                Err(e) => {
                    warn!(?mode, ?timing, %template, error = %e, "remote event wait failed");
                    Err(e)
                }
            }
        })
    }

    async fn call(&self, request: SpaceRequest) -> Result<SpaceResponse, TupleSpaceError> {
        match self.transport.call(request).await? {
            SpaceResponse::Error {
                code,
                message,
                timeout_ms,
            } => Err(code.into_error(message, timeout_ms)),
            response => Ok(response),
        }
    }
}

#[async_trait]
impl TupleSpaceProvider for RemoteTupleSpace {
    async fn write(&self, tuple: Tuple) -> Result<(), TupleSpaceError> {
        expect_done(self.call(SpaceRequest::Write { tuple }).await?)
    }

    async fn take(&self, template: &Template) -> Result<Tuple, TupleSpaceError> {
        expect_tuple(
            self.call(SpaceRequest::Take {
                template: template.clone(),
            })
            .await?,
        )
    }

    async fn read(&self, template: &Template) -> Result<Tuple, TupleSpaceError> {
        expect_tuple(
            self.call(SpaceRequest::Read {
                template: template.clone(),
            })
            .await?,
        )
    }

    async fn try_take(&self, template: &Template) -> Result<Option<Tuple>, TupleSpaceError> {
        expect_maybe(
            self.call(SpaceRequest::TryTake {
                template: template.clone(),
            })
            .await?,
        )
    }

    async fn try_read(&self, template: &Template) -> Result<Option<Tuple>, TupleSpaceError> {
        expect_maybe(
            self.call(SpaceRequest::TryRead {
                template: template.clone(),
            })
            .await?,
        )
    }

    async fn take_all(&self, template: &Template) -> Result<Vec<Tuple>, TupleSpaceError> {
        expect_tuples(
            self.call(SpaceRequest::TakeAll {
                template: template.clone(),
            })
            .await?,
        )
    }

    async fn read_all(&self, template: &Template) -> Result<Vec<Tuple>, TupleSpaceError> {
        expect_tuples(
            self.call(SpaceRequest::ReadAll {
                template: template.clone(),
            })
            .await?,
        )
    }

    async fn register_event(
        &self,
        mode: EventMode,
        timing: EventTiming,
        template: Template,
        callback: EventCallback,
    ) -> Result<(), TupleSpaceError> {
        // detached: the task owns the wait from here on
        drop(self.spawn_event_wait(mode, timing, template, callback));
        Ok(())
    }

    async fn debug(&self, prefix: &str) -> Result<(), TupleSpaceError> {
        expect_done(
            self.call(SpaceRequest::Debug {
                prefix: prefix.to_string(),
            })
            .await?,
        )
    }
}

fn unexpected(expected: &str, got: &SpaceResponse) -> TupleSpaceError {
    TupleSpaceError::Serialization(format!(
        "expected {} response, got {}",
        expected,
        got.kind()
    ))
}

fn expect_done(response: SpaceResponse) -> Result<(), TupleSpaceError> {
    match response {
        SpaceResponse::Done => Ok(()),
        other => Err(unexpected("done", &other)),
    }
}

fn expect_tuple(response: SpaceResponse) -> Result<Tuple, TupleSpaceError> {
    match response {
        SpaceResponse::Tuple { tuple } => Ok(tuple),
        other => Err(unexpected("tuple", &other)),
    }
}

fn expect_maybe(response: SpaceResponse) -> Result<Option<Tuple>, TupleSpaceError> {
    match response {
        SpaceResponse::Maybe { tuple } => Ok(tuple),
        other => Err(unexpected("maybe", &other)),
    }
}

fn expect_tuples(response: SpaceResponse) -> Result<Vec<Tuple>, TupleSpaceError> {
    match response {
        SpaceResponse::Tuples { tuples } => Ok(tuples),
        other => Err(unexpected("tuples", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::SpaceEndpoint;
    use crate::transport::LocalTransport;
    use lindaspaces_tuplespace::{template, tuple, FieldType, TupleSpace};
    use std::sync::Mutex;

    fn local() -> (Arc<TupleSpace>, RemoteTupleSpace) {
        let space = Arc::new(TupleSpace::default());
        let transport = LocalTransport::new(SpaceEndpoint::new(space.clone()));
        (space, RemoteTupleSpace::with_transport(Arc::new(transport)))
    }

    /// Answers every call with the same response
    struct Canned(SpaceResponse);

    #[async_trait]
    impl Transport for Canned {
        async fn call(&self, _request: SpaceRequest) -> Result<SpaceResponse, TupleSpaceError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_operations_reach_the_authoritative_space() {
        let (space, proxy) = local();

        proxy.write(tuple!("a", 1)).await.unwrap();
        proxy.write(tuple!("a", 2)).await.unwrap();
        assert_eq!(space.len(), 2);

        let pattern = template!("a", FieldType::Integer);
        assert_eq!(proxy.try_read(&pattern).await.unwrap(), Some(tuple!("a", 1)));
        assert_eq!(proxy.read_all(&pattern).await.unwrap().len(), 2);
        assert_eq!(proxy.take(&pattern).await.unwrap(), tuple!("a", 1));
        assert_eq!(proxy.take_all(&pattern).await.unwrap(), vec![tuple!("a", 2)]);
        assert_eq!(proxy.try_take(&pattern).await.unwrap(), None);
        assert!(space.is_empty());
    }

    #[tokio::test]
    async fn test_register_event_returns_before_resolution() {
        let (space, proxy) = local();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let handle = proxy.spawn_event_wait(
            EventMode::Take,
            EventTiming::Immediate,
            template!(FieldType::Integer, FieldType::String),
            Box::new(move |t: Tuple| sink.lock().unwrap().push(t)),
        );
        assert!(seen.lock().unwrap().is_empty());

        space.write(tuple!(4, 5));
        space.write(tuple!("hello", 15));
        space.write(tuple!(4, "foo"));
        handle.await.unwrap().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![tuple!(4, "foo")]);
        assert_eq!(space.len(), 2);
    }

    #[tokio::test]
    async fn test_remote_error_is_rebuilt() {
        let proxy = RemoteTupleSpace::with_transport(Arc::new(Canned(SpaceResponse::Error {
            code: crate::protocol::ErrorCode::Cancelled,
            message: "gone".to_string(),
            timeout_ms: None,
        })));
        let err = proxy.take(&template!(FieldType::Integer)).await.unwrap_err();
        assert!(matches!(err, TupleSpaceError::Cancelled(m) if m == "gone"));
    }

    #[tokio::test]
    async fn test_mismatched_response_is_rejected() {
        let proxy = RemoteTupleSpace::with_transport(Arc::new(Canned(SpaceResponse::Done)));
        let err = proxy.try_take(&template!(FieldType::Integer)).await.unwrap_err();
        assert!(matches!(err, TupleSpaceError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_failed_event_wait_never_calls_back() {
        let proxy = RemoteTupleSpace::with_transport(Arc::new(Canned(SpaceResponse::Error {
            code: crate::protocol::ErrorCode::Internal,
            message: "boom".to_string(),
            timeout_ms: None,
        })));
        let called = Arc::new(Mutex::new(false));
        let flag = called.clone();

        let result = proxy
            .spawn_event_wait(
                EventMode::Read,
                EventTiming::Future,
                template!(FieldType::Integer),
                Box::new(move |_t: Tuple| *flag.lock().unwrap() = true),
            )
            .await
            .unwrap();
        assert!(matches!(result, Err(TupleSpaceError::Remote(_))));
        assert!(!*called.lock().unwrap());
    }
}
