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


//! LindaSpaces: Linda-style tuple space coordination
//!
//! Processes coordinate by writing tuples into a shared space and by taking
//! or reading tuples that match a template. Blocking `take`/`read` wait for a
//! matching write; events deliver a single matching tuple to a callback.
//!
//! Two ways in:
//! - [`tuplespace`]: the in-process engine ([`tuplespace::TupleSpace`]) and
//!   the [`tuplespace::TupleSpaceProvider`] trait
//! - [`service`]: a TCP endpoint hosting one engine and
//!   [`service::RemoteTupleSpace`], a proxy implementing the same trait
//!
//! ```rust
//! use lindaspaces::tuplespace::{template, tuple, FieldType, TupleSpace};
//!
//! let space = TupleSpace::default();
//! space.write(tuple!(4, "foo"));
//! let found = space.try_read(&template!(FieldType::Integer, FieldType::String));
//! assert_eq!(found, Some(tuple!(4, "foo")));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub use lindaspaces_tuplespace as tuplespace;
pub use lindaspaces_tuplespace_service as service;
