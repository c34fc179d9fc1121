// ABOUTME: Coderr API server binary
// ABOUTME: Loads environment configuration, opens the database, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

#![recursion_limit = "256"]

//! # Coderr API Server Binary
//!
//! Starts the marketplace REST API. Every setting comes from the environment;
//! the flags below only override the bind address.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use coderr::config::ServerConfig;
use coderr::database::Database;
use coderr::errors::set_expose_internal_errors;
use coderr::logging;
use coderr::resources::ServerResources;
use coderr::server;
use tracing::info;

#[derive(Parser)]
#[command(name = "coderr-server")]
#[command(about = "Coderr - freelancer marketplace REST API")]
struct Args {
    /// Override bind host
    #[arg(long)]
    host: Option<String>,

    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env(config.debug)?;
    set_expose_internal_errors(config.debug);

    info!("Starting Coderr API");
    info!("{}", config.summary());

    let database = Database::new(&config.database)
        .await
        .context("Failed to open database")?;
    info!(
        "Database initialized: {}",
        config.database.url.to_connection_string()
    );

    let resources = Arc::new(ServerResources::new(config, database));
    server::run(resources).await
}
