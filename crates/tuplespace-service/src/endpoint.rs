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


//! Remote endpoint
//!
//! ## Purpose
//! Exposes one authoritative [`TupleSpace`] to proxies. The endpoint holds no
//! coordination state of its own: every request is translated into the
//! matching engine call and the outcome translated back.
//!
//! ## Blocking requests
//! `take`, `read` and `wait_event` suspend the handling task (never a thread)
//! until the engine resolves them. Dropping the future returned by
//! [`SpaceEndpoint::handle`] cancels the engine-side waiter, so a proxy that
//! disconnects mid-wait cannot swallow a later tuple.

use std::sync::Arc;

use lindaspaces_tuplespace::{EventMode, EventTiming, Template, Tuple, TupleSpace, TupleSpaceError};
use tracing::{debug, warn};

use crate::protocol::{SpaceRequest, SpaceResponse};

/// Request handler bound to one engine
#[derive(Debug, Clone)]
pub struct SpaceEndpoint {
    space: Arc<TupleSpace>,
}

impl SpaceEndpoint {
    /// Serve `space`
    pub fn new(space: Arc<TupleSpace>) -> Self {
        Self { space }
    }

    /// The engine behind this endpoint
    pub fn space(&self) -> &Arc<TupleSpace> {
        &self.space
    }

    /// Execute one forwarded operation
    pub async fn handle(&self, request: SpaceRequest) -> SpaceResponse {
        let op = request.op();
        debug!(space = %self.space.name(), op, "endpoint request");

        let response = match request {
            SpaceRequest::Write { tuple } => {
                self.space.write(tuple);
                SpaceResponse::Done
            }
            SpaceRequest::Take { template } => single(self.space.take_async(&template).await),
            SpaceRequest::Read { template } => single(self.space.read_async(&template).await),
            SpaceRequest::TryTake { template } => SpaceResponse::Maybe {
                tuple: self.space.try_take(&template),
            },
            SpaceRequest::TryRead { template } => SpaceResponse::Maybe {
                tuple: self.space.try_read(&template),
            },
            SpaceRequest::TakeAll { template } => SpaceResponse::Tuples {
                tuples: self.space.take_all(&template),
            },
            SpaceRequest::ReadAll { template } => SpaceResponse::Tuples {
                tuples: self.space.read_all(&template),
            },
            SpaceRequest::WaitEvent {
                mode,
                timing,
                template,
            } => single(self.wait_event(mode, timing, template).await),
            SpaceRequest::Debug { prefix } => {
                self.space.debug(&prefix);
                SpaceResponse::Done
            }
        };

        if let SpaceResponse::Error { code, message, .. } = &response {
            warn!(space = %self.space.name(), op, ?code, %message, "endpoint request failed");
        }
        response
    }

    /// Wait for a single event and return the tuple that resolved it
    ///
    /// The caller's timing is honored: with [`EventTiming::Immediate`] an
    /// existing tuple resolves the event at once, with
    /// [`EventTiming::Future`] only tuples written after registration do.
    pub async fn wait_event(
        &self,
        mode: EventMode,
        timing: EventTiming,
        template: Template,
    ) -> Result<Tuple, TupleSpaceError> {
        self.space.wait_event(mode, timing, template).await
    }
}

impl SpaceEndpoint {
    /// Put back tuples a removing request took but could not hand over
    ///
    /// Returns how many tuples were written back.
    pub fn restore(&self, response: SpaceResponse) -> usize {
        let tuples = response.into_tuples();
        let restored = tuples.len();
        for tuple in tuples {
            self.space.write(tuple);
        }
        if restored > 0 {
            warn!(space = %self.space.name(), restored, "response undeliverable, tuples written back");
        }
        restored
    }
}

fn single(result: Result<Tuple, TupleSpaceError>) -> SpaceResponse {
    match result {
        Ok(tuple) => SpaceResponse::Tuple { tuple },
        Err(e) => SpaceResponse::from_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorCode;
    use lindaspaces_tuplespace::{template, tuple, FieldType, SpaceConfig};
    use std::time::Duration;

    fn endpoint() -> SpaceEndpoint {
        SpaceEndpoint::new(Arc::new(TupleSpace::default()))
    }

    #[tokio::test]
    async fn test_write_then_try_take() {
        let endpoint = endpoint();
        let response = endpoint
            .handle(SpaceRequest::Write {
                tuple: tuple!("job", 1),
            })
            .await;
        assert_eq!(response, SpaceResponse::Done);

        let response = endpoint
            .handle(SpaceRequest::TryTake {
                template: template!("job", FieldType::Integer),
            })
            .await;
        assert_eq!(
            response,
            SpaceResponse::Maybe {
                tuple: Some(tuple!("job", 1))
            }
        );
        assert!(endpoint.space().is_empty());
    }

    #[tokio::test]
    async fn test_try_read_without_match_is_not_an_error() {
        let response = endpoint()
            .handle(SpaceRequest::TryRead {
                template: template!(FieldType::Boolean),
            })
            .await;
        assert_eq!(response, SpaceResponse::Maybe { tuple: None });
    }

    #[tokio::test]
    async fn test_wait_event_immediate_uses_existing_tuple() {
        let endpoint = endpoint();
        endpoint.space().write(tuple!(4, 5));

        let tuple = endpoint
            .wait_event(
                EventMode::Read,
                EventTiming::Immediate,
                template!(FieldType::Integer, FieldType::Integer),
            )
            .await
            .unwrap();
        assert_eq!(tuple, tuple!(4, 5));
        assert_eq!(endpoint.space().len(), 1);
    }

    #[tokio::test]
    async fn test_wait_event_future_ignores_existing_tuple() {
        let endpoint = endpoint();
        endpoint.space().write(tuple!(4, 5));

        let waiter = {
            let endpoint = endpoint.clone();
            tokio::spawn(async move {
                endpoint
                    .handle(SpaceRequest::WaitEvent {
                        mode: EventMode::Take,
                        timing: EventTiming::Future,
                        template: template!(FieldType::Integer, FieldType::Integer),
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        endpoint.space().write(tuple!(6, 7));
        let response = waiter.await.unwrap();
        assert_eq!(response, SpaceResponse::Tuple { tuple: tuple!(6, 7) });
        assert_eq!(endpoint.space().read_all(&template!(FieldType::Integer, FieldType::Integer)), vec![tuple!(4, 5)]);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_error_code() {
        let space = TupleSpace::with_config(
            SpaceConfig::default().with_wait_timeout(Duration::from_millis(20)),
        );
        let endpoint = SpaceEndpoint::new(Arc::new(space));

        let response = endpoint
            .handle(SpaceRequest::Take {
                template: template!("never"),
            })
            .await;
        assert!(matches!(
            response,
            SpaceResponse::Error {
                code: ErrorCode::Timeout,
                timeout_ms: Some(20),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_restore_writes_taken_tuples_back() {
        let endpoint = endpoint();
        endpoint.space().write(tuple!("job", 1));
        endpoint.space().write(tuple!("job", 2));

        let response = endpoint
            .handle(SpaceRequest::TakeAll {
                template: template!("job", FieldType::Integer),
            })
            .await;
        assert!(endpoint.space().is_empty());

        assert_eq!(endpoint.restore(response), 2);
        assert_eq!(
            endpoint.space().read_all(&template!("job", FieldType::Integer)),
            vec![tuple!("job", 1), tuple!("job", 2)]
        );
        assert_eq!(endpoint.restore(SpaceResponse::Done), 0);
    }

    #[tokio::test]
    async fn test_dropped_request_cancels_waiter() {
        let endpoint = endpoint();
        let pending = {
            let endpoint = endpoint.clone();
            tokio::spawn(async move {
                endpoint
                    .handle(SpaceRequest::Take {
                        template: template!("job", FieldType::Integer),
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(endpoint.space().stats().pending_takes(), 1);

        pending.abort();
        let _ = pending.await;
        assert_eq!(endpoint.space().stats().pending_takes(), 0);

        endpoint.space().write(tuple!("job", 9));
        assert_eq!(endpoint.space().len(), 1);
    }
}
