mod call_command;
mod relay_command;
mod user_directory;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use crate::user_directory::{HttpUserDirectory, UserDirectory};

#[derive(Parser)]
#[command(name = "parley", version, about = "One-to-one audio calls through a signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay {
        #[arg(long, env = "PARLEY_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        /// STUN/TURN URL handed to clients. Repeatable.
        #[arg(long = "ice", env = "PARLEY_ICE", value_delimiter = ',')]
        ice: Vec<String>,

        /// Do not tell a user's peer when the user's connection drops.
        #[arg(long)]
        no_disconnect_hangup: bool,
    },

    /// Register with a relay and place or take calls.
    Call {
        #[arg(long, env = "PARLEY_RELAY", default_value = "ws://127.0.0.1:3000/ws")]
        relay: String,

        /// Your user id.
        #[arg(short, long)]
        user: String,

        /// Name shown to the people you call.
        #[arg(short, long)]
        name: Option<String>,

        /// Call this user right away instead of waiting for calls.
        #[arg(long)]
        to: Option<String>,

        /// Seconds before an unanswered call gives up; 0 rings forever.
        #[arg(long, default_value_t = 30)]
        ring_timeout: u64,
    },

    /// Find user ids in the directory service.
    Search {
        #[arg(long, env = "PARLEY_API", default_value = "http://127.0.0.1:8080/api")]
        api: String,

        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,webrtc=warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay {
            bind,
            ice,
            no_disconnect_hangup,
        } => relay_command::run(bind, ice, !no_disconnect_hangup).await,

        Commands::Call {
            relay,
            user,
            name,
            to,
            ring_timeout,
        } => {
            call_command::run(call_command::CallArgs {
                relay,
                display_name: name.unwrap_or_else(|| user.clone()),
                user,
                to,
                ring_timeout,
            })
            .await
        }

        Commands::Search { api, query } => {
            let entries = HttpUserDirectory::new(api).search(&query).await?;
            if entries.is_empty() {
                println!("{}", format!("No users match '{}'", query).yellow());
            }
            for entry in entries {
                println!(
                    "{}  {}  {}",
                    entry.id.to_string().cyan().bold(),
                    entry.name,
                    entry.email.dimmed()
                );
            }
            Ok(())
        }
    }
}
