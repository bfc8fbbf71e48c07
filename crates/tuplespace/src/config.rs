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

//! TupleSpace Configuration Module
//!
//! ## Configuration Hierarchy
//! 1. **CODE**: Explicit `SpaceConfig` in application code (highest priority)
//! 2. **ENV**: Environment variables (`LINDASPACES_SPACE_NAME`, ...)
//! 3. **FILE**: YAML configuration file
//! 4. **DEFAULT**: Unnamed space, unbounded blocking waits
//!
//! ## Example (YAML)
//! ```yaml
//! name: orders
//! wait_timeout_ms: 30000
//! ```
//!
//! `wait_timeout_ms` is off by default: blocking `take`/`read` wait until a
//! matching write arrives, however long that takes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{TupleSpace, TupleSpaceError};

/// Environment variable naming the space
pub const ENV_SPACE_NAME: &str = "LINDASPACES_SPACE_NAME";
/// Environment variable bounding blocking waits, in milliseconds
pub const ENV_WAIT_TIMEOUT_MS: &str = "LINDASPACES_WAIT_TIMEOUT_MS";

/// Settings for one coordination engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Name used in logs and debug dumps
    pub name: String,
    /// Deadline for blocking take/read/wait_event (None = wait forever)
    pub wait_timeout_ms: Option<u64>,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            wait_timeout_ms: None,
        }
    }
}

impl SpaceConfig {
    /// Deadline for blocking operations
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Set the space name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bound blocking waits
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Load configuration from a YAML file (FILE)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TupleSpaceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| {
            TupleSpaceError::InvalidConfiguration(format!(
                "Failed to parse {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Defaults overlaid with environment variables (ENV)
    pub fn from_env() -> Result<Self, TupleSpaceError> {
        Self::default().with_env_overrides()
    }

    /// Optional file, then environment overrides, then defaults for the rest
    pub fn load(file: Option<&Path>) -> Result<Self, TupleSpaceError> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// Overlay environment variables on these settings (ENV over FILE)
    pub fn with_env_overrides(mut self) -> Result<Self, TupleSpaceError> {
        if let Ok(name) = std::env::var(ENV_SPACE_NAME) {
            self.name = name;
        }

        if let Ok(raw) = std::env::var(ENV_WAIT_TIMEOUT_MS) {
            let raw = raw.trim();
            self.wait_timeout_ms = if raw.is_empty() || raw == "0" {
                None
            } else {
                Some(raw.parse::<u64>().map_err(|_| {
                    TupleSpaceError::InvalidConfiguration(format!(
                        "{} must be a number of milliseconds, got '{}'",
                        ENV_WAIT_TIMEOUT_MS, raw
                    ))
                })?)
            };
        }

        Ok(self)
    }
}

impl TupleSpace {
    /// Create a TupleSpace from environment variables
    pub fn from_env() -> Result<Self, TupleSpaceError> {
        Ok(Self::with_config(SpaceConfig::from_env()?))
    }

    /// Create a TupleSpace from a YAML file, with environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TupleSpaceError> {
        Ok(Self::with_config(SpaceConfig::load(Some(path.as_ref()))?))
    }
}
