// ABOUTME: Operator command-line tool for account administration
// ABOUTME: Creates staff and superuser accounts and revokes a user's API tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Account administration for Coderr operators.
//!
//! Usage:
//! ```bash
//! # Create a staff account without a marketplace profile
//! cargo run --bin coderr-admin -- create-staff --username ops --email ops@example.com --password secret
//!
//! # Create a superuser that can also act as a business
//! cargo run --bin coderr-admin -- create-staff --username root --email root@example.com \
//!     --password secret --superuser --profile-type business
//!
//! # Log a user out everywhere
//! cargo run --bin coderr-admin -- revoke-tokens --username alice
//! ```

use std::env;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use coderr::config::{DatabaseConfig, DatabaseUrl};
use coderr::constants::{defaults, service_names};
use coderr::database::{Database, NewUser};
use coderr::models::ProfileType;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "coderr-admin",
    about = "Coderr account administration",
    long_about = "Create staff accounts and manage API tokens directly in the Coderr database."
)]
struct AdminArgs {
    #[command(subcommand)]
    command: AdminCommand,

    /// Database URL override (defaults to `DATABASE_URL`)
    #[arg(long)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Create a staff account
    CreateStaff {
        /// Login name
        #[arg(long)]
        username: String,

        /// Contact email
        #[arg(long)]
        email: String,

        /// Initial password
        #[arg(long)]
        password: String,

        /// Grant superuser rights as well
        #[arg(long)]
        superuser: bool,

        /// Also create a marketplace profile (`customer` or `business`)
        #[arg(long, value_parser = parse_profile_type)]
        profile_type: Option<ProfileType>,
    },

    /// Delete every API token of a user
    RevokeTokens {
        /// Login name
        #[arg(long)]
        username: String,
    },
}

fn parse_profile_type(raw: &str) -> Result<ProfileType, String> {
    ProfileType::parse(raw).ok_or_else(|| format!("\"{raw}\" is not a valid profile type"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AdminArgs::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    dotenvy::dotenv().ok();
    let database_url = args
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| defaults::DATABASE_URL.to_owned());
    let config = DatabaseConfig {
        url: DatabaseUrl::parse_url(&database_url)?,
        max_connections: 1,
    };

    info!("{}: connecting to {database_url}", service_names::CODERR_ADMIN);
    let database = Database::new(&config)
        .await
        .context("Failed to open database")?;

    match args.command {
        AdminCommand::CreateStaff {
            username,
            email,
            password,
            superuser,
            profile_type,
        } => create_staff(&database, username, email, &password, superuser, profile_type).await,
        AdminCommand::RevokeTokens { username } => revoke_tokens(&database, &username).await,
    }
}

async fn create_staff(
    database: &Database,
    username: String,
    email: String,
    password: &str,
    superuser: bool,
    profile_type: Option<ProfileType>,
) -> Result<()> {
    let cost = env::var("BCRYPT_COST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::BCRYPT_COST);
    let password_hash = bcrypt::hash(password, cost).context("Failed to hash password")?;

    let new_user = NewUser {
        username,
        email,
        password_hash,
        is_staff: true,
        is_superuser: superuser,
    };
    let (user, profile) = database
        .users()
        .create(&new_user, profile_type, None)
        .await
        .map_err(|e| anyhow!("Failed to create staff account: {}", e.response_body()))?;

    info!(
        user.id = user.id,
        superuser,
        profile.id = profile.as_ref().map(|p| p.id),
        "Created staff account {}",
        user.username
    );
    Ok(())
}

async fn revoke_tokens(database: &Database, username: &str) -> Result<()> {
    let user = database
        .users()
        .get_by_username(username)
        .await?
        .ok_or_else(|| anyhow!("No user named {username}"))?;
    let revoked = database.tokens().revoke_all(user.id).await?;
    info!(user.id = user.id, revoked, "Revoked API tokens for {username}");
    Ok(())
}
