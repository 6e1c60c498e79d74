use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use parley::client::{
    AudioTrackSource, CallClient, CallEvent, CallHandle, ClientConfig, EndReason,
};
use parley::model::{CallPhase, UserIdentity};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

pub struct CallArgs {
    pub relay: String,
    pub user: String,
    pub display_name: String,
    pub to: Option<String>,
    pub ring_timeout: u64,
}

pub async fn run(args: CallArgs) -> Result<()> {
    let mut config = ClientConfig::new(
        args.relay.clone(),
        UserIdentity::new(args.user.as_str(), args.display_name),
    );
    config.call.ring_timeout =
        (args.ring_timeout > 0).then_some(Duration::from_secs(args.ring_timeout));

    let media = Arc::new(AudioTrackSource::new(format!("parley-{}", args.user)));
    let handle = CallClient::connect(config, media)
        .await
        .with_context(|| format!("Could not register with {}", args.relay))?;
    let mut events = handle.subscribe();

    println!(
        "{} {}",
        "Connected as".green().bold(),
        handle.user_id().to_string().cyan()
    );

    let outgoing = args.to.is_some();
    match args.to {
        Some(to) => {
            handle.initiate_call(to.as_str()).await?;
            println!("Calling {}... (Ctrl+C to hang up)", to.cyan());
        }
        None => println!("Waiting for calls (Ctrl+C to quit)"),
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.end_call().await?;
                println!("{}", "Bye".dimmed());
                break;
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if !on_event(&handle, event, outgoing).await? {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => warn!("Missed {} call events", missed),
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

/// Print `event` and react to it. `false` means the session is over.
async fn on_event(handle: &CallHandle, event: CallEvent, outgoing: bool) -> Result<bool> {
    match event {
        CallEvent::IncomingCall { from, name } => {
            let caller = name.unwrap_or_else(|| from.to_string());
            if ask(format!("{} is calling. Answer?", caller)).await? {
                if let Err(e) = handle.accept_call().await {
                    println!("{} {}", "Could not answer:".red(), e);
                }
            } else if let Err(e) = handle.decline_call().await {
                warn!("Decline failed: {}", e);
            }
        }
        CallEvent::PhaseChanged { to, .. } => match to {
            CallPhase::Negotiating => println!("{}", "Connecting...".dimmed()),
            CallPhase::Active => println!("{}", "In call. Ctrl+C hangs up.".green().bold()),
            _ => {}
        },
        CallEvent::Declined { by, reason } => {
            println!("{} {} ({})", by.to_string().cyan(), "declined".yellow(), reason);
        }
        CallEvent::Unavailable { user } => {
            println!("{} {}", user.to_string().cyan(), "is not online".red());
        }
        CallEvent::RemoteMedia { remote, media } => {
            println!(
                "{} {} ({})",
                "Receiving audio from".dimmed(),
                remote.to_string().cyan(),
                media.id()
            );
        }
        CallEvent::Ended { remote, reason } => {
            println!("Call with {} ended: {}", remote.to_string().cyan(), describe(reason));
            return Ok(!outgoing);
        }
        CallEvent::Disconnected => {
            println!("{}", "Lost the relay connection".red().bold());
            return Ok(false);
        }
    }

    Ok(true)
}

async fn ask(prompt: String) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::new().with_prompt(prompt).default(true).interact()
    })
    .await??;
    Ok(answer)
}

fn describe(reason: EndReason) -> String {
    match reason {
        EndReason::LocalHangup => "you hung up".into(),
        EndReason::RemoteHangup => "they hung up".into(),
        EndReason::Rejected => "you declined".into(),
        EndReason::Declined(reason) => format!("declined ({})", reason),
        EndReason::Unavailable => "not reachable".into(),
        EndReason::Timeout => "no answer".into(),
        EndReason::ConnectionLost => "media connection lost".into(),
        EndReason::NegotiationFailed => "could not set up media".into(),
        EndReason::MediaFailed => "microphone unavailable".into(),
        EndReason::SignalingLost => "relay connection lost".into(),
        EndReason::Shutdown => "shut down".into(),
    }
}
