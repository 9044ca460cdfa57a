// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use trybe_client::{ClientConfig, QueryClient, ResourceClient, Session};

mod commands;

#[derive(Parser)]
#[command(name = "trybe", about = "Browse Trybe challenges and keep up with check-ins")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List challenges that are currently running
    Active,
    /// Show a challenge and its program
    Show { id: String },
    /// Join a challenge, or leave it when already a member
    Toggle { id: String },
    /// Create a new challenge
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        frequency: Option<String>,
        #[arg(long)]
        self_paced: bool,
        /// Cover image to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Check whether today's check-in is done and prompt if it is not
    Status { id: String },
}

fn session_from_env() -> Option<Session> {
    let user_id = std::env::var("TRYBE_USER_ID").ok()?;
    Some(Session::new(user_id, std::env::var("TRYBE_TOKEN").ok()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    tracing_subscriber::fmt::init();
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("A TLS crypto provider is already installed");
    }

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    tracing::debug!("Using API host {}", config.host.base_url());
    let client = QueryClient::new(ResourceClient::new(&config)?, config.cache);
    let session = session_from_env();

    match cli.command {
        Command::Active => commands::list_active(&client, session.as_ref()).await,
        Command::Show { id } => commands::show(&client, &id).await,
        Command::Toggle { id } => commands::toggle(&client, &id, session.as_ref()).await,
        Command::Create {
            title,
            description,
            start,
            end,
            frequency,
            self_paced,
            image,
        } => {
            let draft = commands::build_draft(
                title,
                description,
                start,
                end,
                frequency,
                self_paced,
                image,
            )
            .await?;
            commands::create(&client, &draft, session.as_ref()).await
        }
        Command::Status { id } => commands::status(&client, &id, session.as_ref()).await,
    }
}
