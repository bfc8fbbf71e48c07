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

//! Local blocking adapter
//!
//! Turns the engine's push-style notification into a synchronous wait for a
//! caller on the same process. The waiter registers a [`BlockingSlot`] as the
//! sink of a pending event, then parks on the slot's condition until the
//! resolving write delivers a tuple.
//!
//! The slot state (`Option<Tuple>`) is the wait predicate, so a delivery that
//! happens before the waiter parks is never lost.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::Tuple;

/// Single-delivery rendezvous between a resolving write and a blocked caller
#[derive(Debug, Default)]
pub struct BlockingSlot {
    tuple: Mutex<Option<Tuple>>,
    delivered: Condvar,
}

impl BlockingSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the resolving tuple and wake the waiter
    ///
    /// Called at most once per slot: the pending event is removed from its
    /// registry on first resolution.
    pub fn deliver(&self, tuple: Tuple) {
        let mut guard = self.lock();
        debug_assert!(guard.is_none(), "blocking slot delivered twice");
        *guard = Some(tuple);
        self.delivered.notify_one();
    }

    /// Block until a tuple has been delivered and return it
    pub fn wait(&self) -> Tuple {
        let mut guard = self.lock();
        loop {
            if let Some(tuple) = guard.take() {
                return tuple;
            }
            guard = self
                .delivered
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until a tuple is delivered or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Tuple> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if let Some(tuple) = guard.take() {
                return Some(tuple);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if remaining.is_zero() {
                return None;
            }
            let (next, _) = self
                .delivered
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            guard = next;
        }
    }

    /// Take the tuple if one has already been delivered
    pub fn try_take(&self) -> Option<Tuple> {
        self.lock().take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Tuple>> {
        self.tuple.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_delivery_before_wait_is_not_lost() {
        let slot = BlockingSlot::new();
        slot.deliver(tuple!(1));
        assert_eq!(slot.wait(), tuple!(1));
    }

    #[test]
    fn test_wait_wakes_on_delivery_from_other_thread() {
        let slot = Arc::new(BlockingSlot::new());
        let writer = {
            let slot = slot.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                slot.deliver(tuple!("done"));
            })
        };

        assert_eq!(slot.wait(), tuple!("done"));
        writer.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_expires_without_delivery() {
        let slot = BlockingSlot::new();
        assert!(slot.wait_timeout(Duration::from_millis(10)).is_none());
        assert!(slot.try_take().is_none());
    }
}
