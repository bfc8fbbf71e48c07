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

//! Linda-style tuplespace coordination
//!
//! Processes exchange tuples by writing them into a shared space and
//! retrieving them by template match, optionally waiting until a match
//! appears.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blocking;
pub mod config;
pub mod error;
pub mod notify;
pub mod provider;
pub mod space;
pub mod tuple;

// Re-export main types
pub use blocking::BlockingSlot;
pub use config::SpaceConfig;
pub use error::TupleSpaceError;
pub use notify::{EventCallback, Notifier};
pub use provider::{SharedProvider, TupleSpaceProvider};
pub use space::{EventMode, EventTiming, TupleSpace, TupleSpaceStats, WaiterId};
pub use tuple::{FieldType, OrderedFloat, Template, TemplateField, Tuple, TupleField};
