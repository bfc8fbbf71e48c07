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

//! Coordination engine
//!
//! ## Purpose
//! Owns the authoritative tuple collection together with the two pending
//! event registries (read-mode and take-mode). Every operation runs under one
//! critical section covering all three, so a write's resolve-then-store
//! sequence is atomic with respect to other writers and registrars.
//!
//! ## Write ordering
//! 1. Every pending read whose template matches is resolved and removed.
//! 2. The first matching pending take (registration order) is resolved and
//!    removed; the tuple is then consumed.
//! 3. An unconsumed tuple is inserted into the collection.
//!
//! Readers are therefore notified "as of the moment of write": a reader may
//! observe a tuple that a take consumes within the same write.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info};
use ulid::Ulid;

use crate::blocking::BlockingSlot;
use crate::config::SpaceConfig;
use crate::notify::{Delivery, EventCallback, Notifier};
use crate::{Template, Tuple, TupleSpaceError};

/// Retrieval mode of a pending event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMode {
    /// Retrieve without removing
    Read,
    /// Retrieve and remove
    Take,
}

/// Whether registration first tries to match against the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTiming {
    /// Try the collection first; register only if nothing matches
    Immediate,
    /// Register for the next matching write only
    Future,
}

/// Identifier of a pending event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaiterId(Ulid);

impl WaiterId {
    fn new() -> Self {
        WaiterId(Ulid::new())
    }
}

impl std::fmt::Display for WaiterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TupleSpaceStats {
    total_writes: u64,
    total_reads: u64,
    total_takes: u64,
    current_size: usize,
    pending_reads: usize,
    pending_takes: usize,
}

impl TupleSpaceStats {
    /// Get total number of write operations
    pub fn total_writes(&self) -> u64 {
        self.total_writes
    }

    /// Get total number of tuples handed out without removal
    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    /// Get total number of tuples removed by takes
    pub fn total_takes(&self) -> u64 {
        self.total_takes
    }

    /// Get current number of tuples in the space
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Read-mode events waiting for a write
    pub fn pending_reads(&self) -> usize {
        self.pending_reads
    }

    /// Take-mode events waiting for a write
    pub fn pending_takes(&self) -> usize {
        self.pending_takes
    }
}

struct PendingEvent {
    id: WaiterId,
    template: Template,
    notifier: Notifier,
}

#[derive(Default)]
struct SpaceState {
    memory: Vec<Tuple>,
    read_waiters: Vec<PendingEvent>,
    take_waiters: Vec<PendingEvent>,
    stats: TupleSpaceStats,
}

type Deferred = Vec<(EventCallback, Tuple)>;

impl SpaceState {
    fn resolve_or_store(&mut self, tuple: Tuple, deferred: &mut Deferred) {
        self.stats.total_writes += 1;

        let mut still_waiting = Vec::with_capacity(self.read_waiters.len());
        for event in self.read_waiters.drain(..) {
            if !event.template.matches(&tuple) {
                if !event.notifier.is_abandoned() {
                    still_waiting.push(event);
                }
                continue;
            }
            match event.notifier.deliver(tuple.clone()) {
                Delivery::Delivered => self.stats.total_reads += 1,
                Delivery::Deferred(callback, t) => {
                    self.stats.total_reads += 1;
                    deferred.push((callback, t));
                }
                Delivery::Rejected => {}
            }
        }
        self.read_waiters = still_waiting;

        let mut consumed = false;
        let mut idx = 0;
        while idx < self.take_waiters.len() {
            if !self.take_waiters[idx].template.matches(&tuple) {
                idx += 1;
                continue;
            }
            let event = self.take_waiters.remove(idx);
            match event.notifier.deliver(tuple.clone()) {
                Delivery::Delivered => consumed = true,
                Delivery::Deferred(callback, t) => {
                    deferred.push((callback, t));
                    consumed = true;
                }
                // abandoned waiter: the next one in line gets a chance
                Delivery::Rejected => continue,
            }
            debug!(waiter = %event.id, "write: resolved pending take");
            break;
        }

        if consumed {
            self.stats.total_takes += 1;
        } else {
            self.memory.push(tuple);
        }
        self.refresh_sizes();
    }

    fn position(&self, template: &Template) -> Option<usize> {
        self.memory.iter().position(|t| template.matches(t))
    }

    fn try_take(&mut self, template: &Template) -> Option<Tuple> {
        let tuple = self.position(template).map(|pos| self.memory.remove(pos));
        if tuple.is_some() {
            self.stats.total_takes += 1;
            self.refresh_sizes();
        }
        tuple
    }

    fn try_read(&mut self, template: &Template) -> Option<Tuple> {
        let tuple = self.position(template).map(|pos| self.memory[pos].clone());
        if tuple.is_some() {
            self.stats.total_reads += 1;
        }
        tuple
    }

    fn register(
        &mut self,
        mode: EventMode,
        timing: EventTiming,
        template: Template,
        notifier: Notifier,
        deferred: &mut Deferred,
    ) -> Option<WaiterId> {
        let notifier = match timing {
            EventTiming::Immediate => match self.resolve_immediately(mode, &template, notifier, deferred) {
                None => return None,
                Some(notifier) => notifier,
            },
            EventTiming::Future => notifier,
        };

        let id = WaiterId::new();
        let event = PendingEvent {
            id,
            template,
            notifier,
        };
        match mode {
            EventMode::Read => self.read_waiters.push(event),
            EventMode::Take => self.take_waiters.push(event),
        }
        self.refresh_sizes();
        Some(id)
    }

    /// Hands back the notifier when nothing in the collection could be delivered
    fn resolve_immediately(
        &mut self,
        mode: EventMode,
        template: &Template,
        notifier: Notifier,
        deferred: &mut Deferred,
    ) -> Option<Notifier> {
        let Some(pos) = self.position(template) else {
            return Some(notifier);
        };

        match notifier.deliver(self.memory[pos].clone()) {
            Delivery::Delivered => {}
            Delivery::Deferred(callback, t) => deferred.push((callback, t)),
            // caller gave up before registering; leave the tuple where it is
            Delivery::Rejected => return None,
        }

        match mode {
            EventMode::Read => self.stats.total_reads += 1,
            EventMode::Take => {
                self.memory.remove(pos);
                self.stats.total_takes += 1;
                self.refresh_sizes();
            }
        }
        None
    }

    fn cancel(&mut self, id: WaiterId) -> bool {
        let removed = [&mut self.read_waiters, &mut self.take_waiters]
            .into_iter()
            .any(|waiters| match waiters.iter().position(|e| e.id == id) {
                Some(pos) => {
                    waiters.remove(pos);
                    true
                }
                None => false,
            });
        self.refresh_sizes();
        removed
    }

    fn refresh_sizes(&mut self) {
        self.stats.current_size = self.memory.len();
        self.stats.pending_reads = self.read_waiters.len();
        self.stats.pending_takes = self.take_waiters.len();
    }
}

/// TupleSpace for coordination
///
/// ## Example
/// ```
/// use lindaspaces_tuplespace::{template, tuple, FieldType, TupleSpace};
///
/// let space = TupleSpace::default();
/// space.write(tuple!(4, 5));
/// space.write(tuple!("hello", 15));
///
/// let pair = template!(FieldType::Integer, FieldType::Integer);
/// assert_eq!(space.try_read(&pair), Some(tuple!(4, 5)));
/// assert_eq!(space.try_take(&pair), Some(tuple!(4, 5)));
/// assert_eq!(space.try_take(&pair), None);
/// ```
pub struct TupleSpace {
    config: SpaceConfig,
    state: Mutex<SpaceState>,
}

impl Default for TupleSpace {
    fn default() -> Self {
        Self::with_config(SpaceConfig::default())
    }
}

impl std::fmt::Debug for TupleSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TupleSpace")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl TupleSpace {
    /// Create an empty space with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty space with the given configuration
    pub fn with_config(config: SpaceConfig) -> Self {
        TupleSpace {
            config,
            state: Mutex::new(SpaceState::default()),
        }
    }

    /// Configuration this space was built with
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Name of this space
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Write a tuple: resolve pending reads, then at most one pending take,
    /// then store whatever was not consumed
    ///
    /// Read callbacks run before a take callback. A blocked or async taker
    /// is woken inside the critical section, so it may resume before read
    /// callbacks from the same write have run.
    pub fn write(&self, tuple: Tuple) {
        debug!(space = %self.config.name, %tuple, "write");
        let mut deferred = Vec::new();
        self.lock().resolve_or_store(tuple, &mut deferred);
        run_callbacks(deferred);
    }

    /// Remove and return a matching tuple, or `None` without blocking
    pub fn try_take(&self, template: &Template) -> Option<Tuple> {
        let tuple = self.lock().try_take(template);
        debug!(space = %self.config.name, %template, found = tuple.is_some(), "try_take");
        tuple
    }

    /// Return a matching tuple without removing it, or `None` without blocking
    pub fn try_read(&self, template: &Template) -> Option<Tuple> {
        let tuple = self.lock().try_read(template);
        debug!(space = %self.config.name, %template, found = tuple.is_some(), "try_read");
        tuple
    }

    /// Remove and return a matching tuple, blocking the calling thread until
    /// one is written
    ///
    /// Fails only when [`SpaceConfig::wait_timeout`] is set and expires.
    pub fn take(&self, template: &Template) -> Result<Tuple, TupleSpaceError> {
        self.block_on(EventMode::Take, template)
    }

    /// Return a matching tuple without removing it, blocking the calling
    /// thread until one is written
    pub fn read(&self, template: &Template) -> Result<Tuple, TupleSpaceError> {
        self.block_on(EventMode::Read, template)
    }

    /// Async counterpart of [`TupleSpace::take`]
    pub async fn take_async(&self, template: &Template) -> Result<Tuple, TupleSpaceError> {
        self.wait_event(EventMode::Take, EventTiming::Immediate, template.clone())
            .await
    }

    /// Async counterpart of [`TupleSpace::read`]
    pub async fn read_async(&self, template: &Template) -> Result<Tuple, TupleSpaceError> {
        self.wait_event(EventMode::Read, EventTiming::Immediate, template.clone())
            .await
    }

    /// Take matching tuples until none is left
    ///
    /// Not atomic as a whole: each removal is its own critical section, so
    /// tuples written during the scan may or may not be collected.
    pub fn take_all(&self, template: &Template) -> Vec<Tuple> {
        let mut taken = Vec::new();
        while let Some(tuple) = self.lock().try_take(template) {
            taken.push(tuple);
        }
        debug!(space = %self.config.name, %template, count = taken.len(), "take_all");
        taken
    }

    /// Snapshot of all matching tuples, without removal
    pub fn read_all(&self, template: &Template) -> Vec<Tuple> {
        let mut state = self.lock();
        let matching: Vec<Tuple> = state
            .memory
            .iter()
            .filter(|t| template.matches(t))
            .cloned()
            .collect();
        state.stats.total_reads += matching.len() as u64;
        drop(state);
        debug!(space = %self.config.name, %template, count = matching.len(), "read_all");
        matching
    }

    /// Register interest in a tuple matching `template`
    ///
    /// With [`EventTiming::Immediate`] a tuple already in the collection
    /// resolves the event on the spot. Otherwise the event stays pending
    /// until a matching write. Never blocks.
    ///
    /// Returns the id of the pending event, or `None` if it resolved
    /// immediately.
    pub fn register_event(
        &self,
        mode: EventMode,
        timing: EventTiming,
        template: Template,
        notifier: impl Into<Notifier>,
    ) -> Option<WaiterId> {
        let notifier = notifier.into();
        debug!(space = %self.config.name, ?mode, ?timing, %template, ?notifier, "register_event");
        let mut deferred = Vec::new();
        let id = self
            .lock()
            .register(mode, timing, template, notifier, &mut deferred);
        run_callbacks(deferred);
        id
    }

    /// Remove a still-pending event
    ///
    /// Returns false if the event already resolved (or never existed).
    pub fn cancel(&self, id: WaiterId) -> bool {
        let removed = self.lock().cancel(id);
        debug!(space = %self.config.name, waiter = %id, removed, "cancel");
        removed
    }

    /// Register an event and wait for its resolution on a oneshot channel
    ///
    /// Dropping the returned future before it completes cancels the pending
    /// event. A take-mode tuple that already reached the dropped waiter is
    /// written back, so it is never lost.
    pub async fn wait_event(
        &self,
        mode: EventMode,
        timing: EventTiming,
        template: Template,
    ) -> Result<Tuple, TupleSpaceError> {
        let (tx, rx) = oneshot::channel();
        let id = self.register_event(mode, timing, template, Notifier::Channel(tx));
        let mut pending = PendingWait {
            space: self,
            id,
            mode,
            rx,
        };
        pending.recv(self.config.wait_timeout()).await
    }

    /// Number of tuples matching `template`
    pub fn count(&self, template: &Template) -> usize {
        self.lock()
            .memory
            .iter()
            .filter(|t| template.matches(t))
            .count()
    }

    /// Number of tuples in the collection
    pub fn len(&self) -> usize {
        self.lock().memory.len()
    }

    /// True if the collection holds no tuples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get space statistics
    pub fn stats(&self) -> TupleSpaceStats {
        self.lock().stats.clone()
    }

    /// Log the current collection and return the same text
    pub fn debug(&self, prefix: &str) -> String {
        let contents = {
            let state = self.lock();
            let rendered: Vec<String> = state.memory.iter().map(|t| t.to_string()).collect();
            format!("[{}]", rendered.join(", "))
        };
        info!(space = %self.config.name, prefix, %contents, "debug");
        format!("{} : {}", prefix, contents)
    }

    fn block_on(&self, mode: EventMode, template: &Template) -> Result<Tuple, TupleSpaceError> {
        let slot = Arc::new(BlockingSlot::new());
        let Some(id) = self.register_event(
            mode,
            EventTiming::Immediate,
            template.clone(),
            Notifier::Slot(slot.clone()),
        ) else {
            return Ok(slot.wait());
        };

        let Some(timeout) = self.config.wait_timeout() else {
            return Ok(slot.wait());
        };

        match slot.wait_timeout(timeout) {
            Some(tuple) => Ok(tuple),
            // a write won the race against cancel; its delivery happened under the lock
            None if !self.cancel(id) => Ok(slot.wait()),
            None => Err(TupleSpaceError::Timeout(timeout)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SpaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_callbacks(deferred: Deferred) {
    for (callback, tuple) in deferred {
        callback(tuple);
    }
}

/// Async waiter that cancels its pending event when dropped unresolved
struct PendingWait<'a> {
    space: &'a TupleSpace,
    id: Option<WaiterId>,
    mode: EventMode,
    rx: oneshot::Receiver<Tuple>,
}

impl PendingWait<'_> {
    async fn recv(&mut self, timeout: Option<Duration>) -> Result<Tuple, TupleSpaceError> {
        let received = match timeout {
            None => (&mut self.rx).await.ok(),
            Some(timeout) => match tokio::time::timeout(timeout, &mut self.rx).await {
                Ok(received) => received.ok(),
                Err(_) => match self.id {
                    Some(id) if self.space.cancel(id) => {
                        self.id = None;
                        return Err(TupleSpaceError::Timeout(timeout));
                    }
                    _ => self.rx.try_recv().ok(),
                },
            },
        };
        self.id = None;
        received.ok_or_else(|| TupleSpaceError::Cancelled("pending event dropped".to_string()))
    }
}

impl Drop for PendingWait<'_> {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if self.space.cancel(id) {
            return;
        }
        if self.mode == EventMode::Take {
            if let Ok(tuple) = self.rx.try_recv() {
                debug!(waiter = %id, %tuple, "abandoned take: writing tuple back");
                self.space.write(tuple);
            }
        }
    }
}
