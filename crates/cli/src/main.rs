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


//! LindaSpaces CLI Tool
//!
//! ## Purpose
//! - Host a tuple space endpoint (`serve`)
//! - Run single operations against a running endpoint
//!
//! Tuples and templates are given as JSON, in the same shape the wire
//! protocol uses:
//! ```text
//! lindaspaces write '{"fields":[{"String":"job"},{"Integer":1}]}'
//! lindaspaces take  '{"fields":[{"Exact":{"String":"job"}},{"Type":"Integer"}]}'
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod client;
mod server;

#[derive(Parser)]
#[command(name = "lindaspaces")]
#[command(about = "LindaSpaces CLI - host and use shared tuple spaces", long_about = None)]
struct Cli {
    /// YAML configuration file (environment variables override it)
    #[arg(short, long, global = true, env = "LINDASPACES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a tuple space until interrupted
    Serve {
        /// Listen address (overrides configuration)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Write a tuple
    Write {
        /// Endpoint address (overrides configuration)
        #[arg(short, long)]
        server: Option<String>,

        /// Tuple as JSON
        tuple: String,
    },

    /// Remove and print a matching tuple, waiting for one
    Take {
        /// Endpoint address (overrides configuration)
        #[arg(short, long)]
        server: Option<String>,

        /// Template as JSON
        template: String,

        /// Return immediately if nothing matches
        #[arg(long)]
        no_wait: bool,
    },

    /// Print a matching tuple without removing it, waiting for one
    Read {
        /// Endpoint address (overrides configuration)
        #[arg(short, long)]
        server: Option<String>,

        /// Template as JSON
        template: String,

        /// Return immediately if nothing matches
        #[arg(long)]
        no_wait: bool,
    },

    /// Print every matching tuple
    List {
        /// Endpoint address (overrides configuration)
        #[arg(short, long)]
        server: Option<String>,

        /// Template as JSON
        template: String,

        /// Remove the listed tuples
        #[arg(long)]
        take: bool,
    },

    /// Dump the collection to the endpoint's log
    Debug {
        /// Endpoint address (overrides configuration)
        #[arg(short, long)]
        server: Option<String>,

        /// Label for the dump
        #[arg(long, default_value = "cli")]
        prefix: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Serve { bind } => server::serve(config, bind).await,
        Commands::Write { server, tuple } => client::write(config, server, &tuple).await,
        Commands::Take {
            server,
            template,
            no_wait,
        } => client::take(config, server, &template, no_wait).await,
        Commands::Read {
            server,
            template,
            no_wait,
        } => client::read(config, server, &template, no_wait).await,
        Commands::List {
            server,
            template,
            take,
        } => client::list(config, server, &template, take).await,
        Commands::Debug { server, prefix } => client::debug(config, server, &prefix).await,
    }
}
