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


//! End-to-end tests: proxies talking to an endpoint over TCP

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lindaspaces_tuplespace::{
    template, tuple, EventMode, EventTiming, FieldType, SharedProvider, SpaceConfig, Tuple,
    TupleSpaceError, TupleSpaceProvider,
};
use lindaspaces_tuplespace_service::{RemoteTupleSpace, ServiceConfig, SpaceEndpoint, SpaceServer};
use tokio::sync::oneshot;

struct Harness {
    endpoint: SpaceEndpoint,
    config: ServiceConfig,
    _stop: oneshot::Sender<()>,
}

async fn start_server(space: SpaceConfig) -> Harness {
    let config = ServiceConfig::default()
        .with_bind_addr("127.0.0.1:0")
        .with_space(space);
    let server = SpaceServer::bind(&config).await.unwrap();
    let endpoint = server.endpoint().clone();
    let addr = server.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(server.serve_with_shutdown(async {
        let _ = stopped.await;
    }));
    Harness {
        endpoint,
        config: config.with_server_addr(addr.to_string()),
        _stop: stop,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn test_two_proxies_share_one_space() {
    let harness = start_server(SpaceConfig::default()).await;
    let producer: SharedProvider = Arc::new(RemoteTupleSpace::connect(&harness.config).await.unwrap());
    let consumer: SharedProvider = Arc::new(RemoteTupleSpace::connect(&harness.config).await.unwrap());

    producer.write(tuple!("order", 1, 9.5)).await.unwrap();

    let pattern = template!("order", FieldType::Integer, FieldType::Float);
    assert_eq!(
        consumer.read(&pattern).await.unwrap(),
        tuple!("order", 1, 9.5)
    );
    assert_eq!(
        consumer.take(&pattern).await.unwrap(),
        tuple!("order", 1, 9.5)
    );
    assert_eq!(producer.try_read(&pattern).await.unwrap(), None);
    assert!(harness.endpoint.space().is_empty());
}

#[tokio::test]
async fn test_remote_blocking_take_waits_for_remote_write() {
    let harness = start_server(SpaceConfig::default()).await;
    let consumer = RemoteTupleSpace::connect(&harness.config).await.unwrap();
    let producer = RemoteTupleSpace::connect(&harness.config).await.unwrap();

    let taker = tokio::spawn(async move {
        consumer
            .take(&template!("result", FieldType::Integer))
            .await
    });

    let space = harness.endpoint.space().clone();
    wait_until(|| space.stats().pending_takes() == 1).await;
    assert!(!taker.is_finished());

    producer.write(tuple!("result", 42)).await.unwrap();
    assert_eq!(taker.await.unwrap().unwrap(), tuple!("result", 42));
    assert!(space.is_empty());
}

#[tokio::test]
async fn test_remote_event_callback_walkthrough() {
    let harness = start_server(SpaceConfig::default()).await;
    let proxy = RemoteTupleSpace::connect(&harness.config).await.unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    proxy
        .register_event(
            EventMode::Take,
            EventTiming::Immediate,
            template!(FieldType::Integer, FieldType::String),
            Box::new(move |t: Tuple| sink.lock().unwrap().push(t)),
        )
        .await
        .unwrap();

    let space = harness.endpoint.space().clone();
    wait_until(|| space.stats().pending_takes() == 1).await;

    proxy.write(tuple!(4, 5)).await.unwrap();
    proxy.write(tuple!("hello", 15)).await.unwrap();
    proxy.write(tuple!(4, "foo")).await.unwrap();

    wait_until(|| !seen.lock().unwrap().is_empty()).await;
    assert_eq!(*seen.lock().unwrap(), vec![tuple!(4, "foo")]);

    let remaining = proxy.read_all(&template!(FieldType::Integer, FieldType::Integer)).await.unwrap();
    assert_eq!(remaining, vec![tuple!(4, 5)]);
    assert_eq!(space.len(), 2);
}

#[tokio::test]
async fn test_future_event_ignores_existing_remote_tuples() {
    let harness = start_server(SpaceConfig::default()).await;
    let proxy = RemoteTupleSpace::connect(&harness.config).await.unwrap();
    proxy.write(tuple!("tick", 1)).await.unwrap();

    let (tx, rx) = oneshot::channel();
    let handle = proxy.spawn_event_wait(
        EventMode::Read,
        EventTiming::Future,
        template!("tick", FieldType::Integer),
        Box::new(move |t: Tuple| {
            let _ = tx.send(t);
        }),
    );

    let space = harness.endpoint.space().clone();
    wait_until(|| space.stats().pending_reads() == 1).await;
    proxy.write(tuple!("tick", 2)).await.unwrap();

    assert_eq!(rx.await.unwrap(), tuple!("tick", 2));
    handle.await.unwrap().unwrap();
    assert_eq!(space.len(), 2);
}

#[tokio::test]
async fn test_take_all_and_debug_over_the_wire() {
    let harness = start_server(SpaceConfig::default().with_name("wire")).await;
    let proxy = RemoteTupleSpace::connect(&harness.config).await.unwrap();

    for i in 0..5 {
        proxy.write(tuple!("n", i)).await.unwrap();
    }
    proxy.write(tuple!("other")).await.unwrap();
    proxy.debug("before").await.unwrap();

    let taken = proxy.take_all(&template!("n", FieldType::Integer)).await.unwrap();
    assert_eq!(taken.len(), 5);
    assert_eq!(taken[0], tuple!("n", 0));
    assert_eq!(
        proxy.read_all(&template!(FieldType::String)).await.unwrap(),
        vec![tuple!("other")]
    );
}

#[tokio::test]
async fn test_endpoint_timeout_reaches_the_proxy() {
    let harness =
        start_server(SpaceConfig::default().with_wait_timeout(Duration::from_millis(30))).await;
    let proxy = RemoteTupleSpace::connect(&harness.config).await.unwrap();

    let err = proxy.read(&template!("missing")).await.unwrap_err();
    assert!(matches!(err, TupleSpaceError::Timeout(d) if d == Duration::from_millis(30)));
    assert_eq!(harness.endpoint.space().stats().pending_reads(), 0);
}

#[tokio::test]
async fn test_lost_endpoint_fails_outstanding_take() {
    let config = ServiceConfig::default().with_bind_addr("127.0.0.1:0");
    let server = SpaceServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let serving = tokio::spawn(server.serve_with_shutdown(async {
        let _ = stopped.await;
    }));

    let proxy = RemoteTupleSpace::connect(&config.with_server_addr(addr.to_string()))
        .await
        .unwrap();
    let taker = tokio::spawn(async move { proxy.take(&template!(FieldType::Boolean)).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    stop.send(()).unwrap();
    serving.await.unwrap().unwrap();

    let err = taker.await.unwrap().unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_oversized_take_all_keeps_tuples_and_connection() {
    let config = ServiceConfig {
        max_frame_bytes: 4096,
        ..ServiceConfig::default().with_bind_addr("127.0.0.1:0")
    };
    let server = SpaceServer::bind(&config).await.unwrap();
    let space = server.endpoint().space().clone();
    let config = config.with_server_addr(server.local_addr().unwrap().to_string());
    tokio::spawn(server.serve());

    let proxy = RemoteTupleSpace::connect(&config).await.unwrap();
    let payload = "b".repeat(2000);
    for i in 0..3 {
        proxy.write(tuple!("blob", payload.as_str(), i)).await.unwrap();
    }
    assert_eq!(space.len(), 3);

    let blobs = template!("blob", FieldType::String, FieldType::Integer);
    let err = proxy.take_all(&blobs).await.unwrap_err();
    assert!(matches!(err, TupleSpaceError::Remote(_)), "unexpected error: {err}");
    assert_eq!(space.len(), 3);

    let one = proxy.try_take(&blobs).await.unwrap();
    assert!(one.is_some());
    assert_eq!(space.len(), 2);
}
