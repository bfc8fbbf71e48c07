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


//! One-shot operations against a running endpoint

use anyhow::{Context, Result};
use lindaspaces_tuplespace::{Template, Tuple, TupleSpaceProvider};
use lindaspaces_tuplespace_service::{RemoteTupleSpace, ServiceConfig};
use std::path::Path;

async fn connect(config: Option<&Path>, server: Option<String>) -> Result<RemoteTupleSpace> {
    let mut config = ServiceConfig::load(config).context("Failed to load configuration")?;
    if let Some(server) = server {
        config = config.with_server_addr(server);
    }
    RemoteTupleSpace::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.server_addr))
}

fn parse_tuple(json: &str) -> Result<Tuple> {
    serde_json::from_str(json).context("Invalid tuple JSON")
}

fn parse_template(json: &str) -> Result<Template> {
    serde_json::from_str(json).context("Invalid template JSON")
}

fn print_match(tuple: Option<Tuple>) {
    match tuple {
        Some(tuple) => println!("{}", tuple),
        None => println!("(no match)"),
    }
}

/// Write one tuple
pub async fn write(config: Option<&Path>, server: Option<String>, tuple: &str) -> Result<()> {
    let tuple = parse_tuple(tuple)?;
    let space = connect(config, server).await?;
    space.write(tuple.clone()).await?;
    println!("wrote {}", tuple);
    Ok(())
}

/// Take one tuple, optionally without waiting
pub async fn take(
    config: Option<&Path>,
    server: Option<String>,
    template: &str,
    no_wait: bool,
) -> Result<()> {
    let template = parse_template(template)?;
    let space = connect(config, server).await?;
    let tuple = if no_wait {
        space.try_take(&template).await?
    } else {
        Some(space.take(&template).await?)
    };
    print_match(tuple);
    Ok(())
}

/// Read one tuple, optionally without waiting
pub async fn read(
    config: Option<&Path>,
    server: Option<String>,
    template: &str,
    no_wait: bool,
) -> Result<()> {
    let template = parse_template(template)?;
    let space = connect(config, server).await?;
    let tuple = if no_wait {
        space.try_read(&template).await?
    } else {
        Some(space.read(&template).await?)
    };
    print_match(tuple);
    Ok(())
}

/// Print (and optionally remove) every match
pub async fn list(
    config: Option<&Path>,
    server: Option<String>,
    template: &str,
    take: bool,
) -> Result<()> {
    let template = parse_template(template)?;
    let space = connect(config, server).await?;
    let tuples = if take {
        space.take_all(&template).await?
    } else {
        space.read_all(&template).await?
    };
    for tuple in &tuples {
        println!("{}", tuple);
    }
    println!("{} tuple(s)", tuples.len());
    Ok(())
}

/// Ask the endpoint to log its collection
pub async fn debug(config: Option<&Path>, server: Option<String>, prefix: &str) -> Result<()> {
    let space = connect(config, server).await?;
    space.debug(prefix).await?;
    println!("debug dump requested");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lindaspaces_tuplespace::{template, tuple, FieldType};

    #[test]
    fn test_parse_tuple_json() {
        let tuple = parse_tuple(r#"{"fields":[{"String":"job"},{"Integer":1}]}"#).unwrap();
        assert_eq!(tuple, tuple!("job", 1));
    }

    #[test]
    fn test_parse_template_json() {
        let template =
            parse_template(r#"{"fields":[{"Exact":{"String":"job"}},{"Type":"Integer"}]}"#)
                .unwrap();
        assert_eq!(template, template!("job", FieldType::Integer));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_tuple("[1, 2]").is_err());
    }
}
