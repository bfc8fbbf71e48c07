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


//! Service configuration
//!
//! Same hierarchy as [`SpaceConfig`]: CODE > ENV > FILE > DEFAULT.
//!
//! ## Example (YAML)
//! ```yaml
//! bind_addr: 0.0.0.0:4546
//! server_addr: linda.internal:4546
//! connect_timeout_ms: 2000
//! space:
//!   name: orders
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use lindaspaces_tuplespace::{SpaceConfig, TupleSpaceError};

use crate::protocol::DEFAULT_MAX_FRAME_BYTES;

/// Environment variable for the address the endpoint listens on
pub const ENV_BIND_ADDR: &str = "LINDASPACES_BIND_ADDR";
/// Environment variable for the address proxies connect to
pub const ENV_SERVER_ADDR: &str = "LINDASPACES_SERVER_ADDR";
/// Environment variable bounding connection establishment, in milliseconds
pub const ENV_CONNECT_TIMEOUT_MS: &str = "LINDASPACES_CONNECT_TIMEOUT_MS";
/// Environment variable bounding a single frame, in bytes
pub const ENV_MAX_FRAME_BYTES: &str = "LINDASPACES_MAX_FRAME_BYTES";

const DEFAULT_ADDR: &str = "127.0.0.1:4546";

/// Settings for the endpoint and its proxies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen address of [`SpaceServer`](crate::SpaceServer)
    pub bind_addr: String,
    /// Address [`RemoteTupleSpace::connect`](crate::RemoteTupleSpace::connect) dials
    pub server_addr: String,
    /// Bound on TCP connection establishment
    pub connect_timeout_ms: u64,
    /// Largest accepted frame, either direction
    pub max_frame_bytes: usize,
    /// Engine hosted by the endpoint
    pub space: SpaceConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            server_addr: DEFAULT_ADDR.to_string(),
            connect_timeout_ms: 5_000,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            space: SpaceConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Bound on TCP connection establishment
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Set the listen address
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the address proxies connect to
    pub fn with_server_addr(mut self, addr: impl Into<String>) -> Self {
        self.server_addr = addr.into();
        self
    }

    /// Set the hosted engine's settings
    pub fn with_space(mut self, space: SpaceConfig) -> Self {
        self.space = space;
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

    fn with_env_overrides(mut self) -> Result<Self, TupleSpaceError> {
        if let Ok(addr) = std::env::var(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
        if let Ok(addr) = std::env::var(ENV_SERVER_ADDR) {
            self.server_addr = addr;
        }
        if let Some(ms) = parse_env(ENV_CONNECT_TIMEOUT_MS)? {
            self.connect_timeout_ms = ms;
        }
        if let Some(bytes) = parse_env(ENV_MAX_FRAME_BYTES)? {
            self.max_frame_bytes = bytes;
        }
        self.space = self.space.with_env_overrides()?;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), TupleSpaceError> {
        if self.max_frame_bytes == 0 {
            return Err(TupleSpaceError::InvalidConfiguration(
                "max_frame_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str) -> Result<Option<T>, TupleSpaceError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map(Some).map_err(|_| {
            TupleSpaceError::InvalidConfiguration(format!("{} must be a number, got '{}'", var, raw))
        }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_point_client_at_server() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr, config.server_addr);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_frame_bytes, DEFAULT_MAX_FRAME_BYTES);
        assert_eq!(config.space.wait_timeout(), None);
    }

    #[test]
    fn test_from_file_with_nested_space() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr: 0.0.0.0:9000").unwrap();
        writeln!(file, "space:").unwrap();
        writeln!(file, "  name: orders").unwrap();
        writeln!(file, "  wait_timeout_ms: 500").unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.server_addr, DEFAULT_ADDR);
        assert_eq!(config.space.name, "orders");
        assert_eq!(config.space.wait_timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "connect_timeout_ms: soon").unwrap();

        let err = ServiceConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, TupleSpaceError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_frame_limit_is_invalid() {
        let config = ServiceConfig {
            max_frame_bytes: 0,
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
