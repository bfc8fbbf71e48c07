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


//! `serve` command

use anyhow::{Context, Result};
use lindaspaces_tuplespace_service::{ServiceConfig, SpaceServer};
use std::path::Path;
use tokio::signal;
use tracing::{info, warn};

/// Host a tuple space until Ctrl-C
pub async fn serve(config: Option<&Path>, bind: Option<String>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = ServiceConfig::load(config).context("Failed to load configuration")?;
    if let Some(bind) = bind {
        config = config.with_bind_addr(bind);
    }

    let server = SpaceServer::bind(&config)
        .await
        .context("Failed to start endpoint")?;
    info!(
        addr = %server.local_addr()?,
        space = %config.space.name,
        wait_timeout = ?config.space.wait_timeout(),
        "Serving tuple space"
    );

    server
        .serve_with_shutdown(async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received, stopping endpoint..."),
                Err(err) => warn!("Unable to listen for shutdown signal: {}", err),
            }
        })
        .await?;

    info!("Endpoint stopped");
    Ok(())
}
