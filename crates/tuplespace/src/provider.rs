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

//! TupleSpaceProvider trait
//!
//! ## Purpose
//! The operation set shared by the authoritative in-process [`TupleSpace`]
//! and by proxies that forward to a remote one. Code written against
//! `TupleSpaceProvider` does not care which side of the transport it runs on.
//!
//! ## Blocking
//! `take` and `read` complete only once a matching tuple exists. On the local
//! space they park the task on a oneshot, not the thread; the synchronous
//! [`TupleSpace::take`]/[`TupleSpace::read`] are available for non-async
//! callers.

use async_trait::async_trait;
use std::sync::Arc;

use crate::notify::EventCallback;
use crate::{EventMode, EventTiming, Template, Tuple, TupleSpace, TupleSpaceError};

/// Linda operation set
#[async_trait]
pub trait TupleSpaceProvider: Send + Sync {
    /// Write a tuple to the space
    async fn write(&self, tuple: Tuple) -> Result<(), TupleSpaceError>;

    /// Remove and return a matching tuple, waiting for one if necessary
    async fn take(&self, template: &Template) -> Result<Tuple, TupleSpaceError>;

    /// Return a matching tuple without removing it, waiting if necessary
    async fn read(&self, template: &Template) -> Result<Tuple, TupleSpaceError>;

    /// Remove and return a matching tuple if one exists right now
    async fn try_take(&self, template: &Template) -> Result<Option<Tuple>, TupleSpaceError>;

    /// Return a matching tuple if one exists right now
    async fn try_read(&self, template: &Template) -> Result<Option<Tuple>, TupleSpaceError>;

    /// Remove and return every matching tuple (non-atomic, non-blocking)
    async fn take_all(&self, template: &Template) -> Result<Vec<Tuple>, TupleSpaceError>;

    /// Return every matching tuple without removal (non-atomic snapshot)
    async fn read_all(&self, template: &Template) -> Result<Vec<Tuple>, TupleSpaceError>;

    /// Invoke `callback` once with a tuple matching `template`
    ///
    /// Returns as soon as the event is registered; never waits for it.
    async fn register_event(
        &self,
        mode: EventMode,
        timing: EventTiming,
        template: Template,
        callback: EventCallback,
    ) -> Result<(), TupleSpaceError>;

    /// Diagnostic dump of the collection, logged where the collection lives
    async fn debug(&self, prefix: &str) -> Result<(), TupleSpaceError>;
}

/// Type alias for Arc-wrapped providers (for sharing across tasks)
pub type SharedProvider = Arc<dyn TupleSpaceProvider>;

#[async_trait]
impl TupleSpaceProvider for TupleSpace {
    async fn write(&self, tuple: Tuple) -> Result<(), TupleSpaceError> {
        TupleSpace::write(self, tuple);
        Ok(())
    }

    async fn take(&self, template: &Template) -> Result<Tuple, TupleSpaceError> {
        self.take_async(template).await
    }

    async fn read(&self, template: &Template) -> Result<Tuple, TupleSpaceError> {
        self.read_async(template).await
    }

    async fn try_take(&self, template: &Template) -> Result<Option<Tuple>, TupleSpaceError> {
        Ok(TupleSpace::try_take(self, template))
    }

    async fn try_read(&self, template: &Template) -> Result<Option<Tuple>, TupleSpaceError> {
        Ok(TupleSpace::try_read(self, template))
    }

    async fn take_all(&self, template: &Template) -> Result<Vec<Tuple>, TupleSpaceError> {
        Ok(TupleSpace::take_all(self, template))
    }

    async fn read_all(&self, template: &Template) -> Result<Vec<Tuple>, TupleSpaceError> {
        Ok(TupleSpace::read_all(self, template))
    }

    async fn register_event(
        &self,
        mode: EventMode,
        timing: EventTiming,
        template: Template,
        callback: EventCallback,
    ) -> Result<(), TupleSpaceError> {
        TupleSpace::register_event(self, mode, timing, template, callback);
        Ok(())
    }

    async fn debug(&self, prefix: &str) -> Result<(), TupleSpaceError> {
        TupleSpace::debug(self, prefix);
        Ok(())
    }
}
