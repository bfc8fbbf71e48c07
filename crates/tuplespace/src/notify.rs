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

//! Single-shot notification sinks
//!
//! A pending event resolves by handing its tuple to a [`Notifier`]. Three
//! kinds exist:
//! - [`Notifier::Slot`]: wakes a thread blocked in the local blocking adapter
//! - [`Notifier::Channel`]: completes a oneshot awaited by an async waiter
//!   (local `take_async`/`read_async`, or a remote `wait_event`)
//! - [`Notifier::Callback`]: user code registered through `register_event`
//!
//! Slot and channel deliveries are cheap and happen inside the engine's
//! critical section. User callbacks are handed back to the engine and run
//! after the lock is released.

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::blocking::BlockingSlot;
use crate::Tuple;

/// User callback invoked at most once with the resolving tuple
pub type EventCallback = Box<dyn FnOnce(Tuple) + Send + 'static>;

/// Sink of a pending event
pub enum Notifier {
    /// Local blocking adapter
    Slot(Arc<BlockingSlot>),
    /// Async waiter
    Channel(oneshot::Sender<Tuple>),
    /// User callback
    Callback(EventCallback),
}

/// Outcome of handing a tuple to a notifier
pub(crate) enum Delivery {
    /// Tuple accepted
    Delivered,
    /// Tuple accepted; callback must run once the engine lock is released
    Deferred(EventCallback, Tuple),
    /// Receiver is gone; the tuple was not consumed
    Rejected,
}

impl Notifier {
    /// Wrap a closure as a callback notifier
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(Tuple) + Send + 'static,
    {
        Notifier::Callback(Box::new(f))
    }

    /// A channel whose receiver was dropped can never accept a tuple
    pub(crate) fn is_abandoned(&self) -> bool {
        match self {
            Notifier::Channel(tx) => tx.is_closed(),
            _ => false,
        }
    }

    pub(crate) fn deliver(self, tuple: Tuple) -> Delivery {
        match self {
            Notifier::Slot(slot) => {
                slot.deliver(tuple);
                Delivery::Delivered
            }
            Notifier::Channel(tx) => match tx.send(tuple) {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Rejected,
            },
            Notifier::Callback(callback) => Delivery::Deferred(callback, tuple),
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notifier::Slot(_) => f.debug_tuple("Slot").finish(),
            Notifier::Channel(_) => f.debug_tuple("Channel").finish(),
            Notifier::Callback(_) => f.debug_tuple("Callback").field(&"<function>").finish(),
        }
    }
}

impl From<EventCallback> for Notifier {
    fn from(callback: EventCallback) -> Self {
        Notifier::Callback(callback)
    }
}
