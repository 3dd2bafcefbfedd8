use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use palaver_core::RoomId;
use palaver_peer::capability::{CapabilityConfig, WebRtcFactory};
use palaver_peer::transport::{
    LocalTransport, ManualExchange, ManualTransport, RoomConfig, RoomTransport,
};
use palaver_peer::{Session, SessionEvent, SessionHandle, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "palaver")]
#[command(about = "Peer-to-peer call negotiation toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the shared-room signaling relay
    Relay {
        #[arg(long, default_value = "127.0.0.1:7700")]
        bind: String,
    },
    /// Chat with a peer through a shared signaling room
    Chat {
        #[arg(long, default_value = "ws://127.0.0.1:7700")]
        relay: String,
        /// Room id shared with the peer; generated when omitted
        #[arg(long)]
        room: Option<String>,
        /// Start the call (offerer side)
        #[arg(long)]
        caller: bool,
    },
    /// Chat with copy/paste signaling (no relay at all)
    Manual {
        /// Start the call (offerer side)
        #[arg(long)]
        caller: bool,
    },
    /// Two peers negotiating inside one process, end to end
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Commands::Relay { bind } => {
            println!("{}", "🛰  Starting signaling relay...".green().bold());
            palaver_relay::serve(palaver_relay::RelayConfig { bind_addr: bind }).await
        }
        Commands::Chat {
            relay,
            room,
            caller,
        } => run_chat(relay, room, caller).await,
        Commands::Manual { caller } => run_manual(caller).await,
        Commands::Demo => run_demo().await,
    }
}

async fn run_chat(relay: String, room: Option<String>, caller: bool) -> Result<()> {
    let room = match room {
        Some(id) => id.parse::<RoomId>().context("invalid room id")?,
        None => RoomId::generate(),
    };
    println!(
        "{} {}",
        "room:".bold(),
        room.to_string().green().bold()
    );
    println!("   share this id with your peer, then have them join without --caller");

    let transport = Arc::new(RoomTransport::new(RoomConfig::new(relay, room)));
    let (session, handle, events) = Session::new(
        Box::new(WebRtcFactory),
        transport,
        CapabilityConfig::default(),
    );
    tokio::spawn(session.run());
    tokio::spawn(print_events("peer", events));

    if caller {
        handle.start_call(Vec::new()).await?;
    }
    repl(handle, None).await
}

async fn run_manual(caller: bool) -> Result<()> {
    println!("{}", "📋 Manual signaling mode".green().bold());
    println!("   outgoing messages are printed for copying;");
    println!("   type {} to paste one from your peer", "/paste".cyan());

    let transport = Arc::new(ManualTransport::new(ConsoleExchange));
    let (session, handle, events) = Session::new(
        Box::new(WebRtcFactory),
        transport.clone(),
        CapabilityConfig::default(),
    );
    tokio::spawn(session.run());
    tokio::spawn(print_events("peer", events));

    if caller {
        handle.start_call(Vec::new()).await?;
    }
    repl(handle, Some(transport)).await
}

async fn run_demo() -> Result<()> {
    println!("{}", "🔁 In-process demo: caller and callee".green().bold());

    let (for_caller, for_callee) = LocalTransport::pair();
    let caller_transport = Arc::new(for_caller);
    let callee_transport = Arc::new(for_callee);

    let (caller_session, caller, caller_events) = Session::new(
        Box::new(WebRtcFactory),
        caller_transport.clone(),
        CapabilityConfig::default(),
    );
    let (callee_session, callee, callee_events) = Session::new(
        Box::new(WebRtcFactory),
        callee_transport.clone(),
        CapabilityConfig::default(),
    );
    tokio::spawn(caller_session.run());
    tokio::spawn(callee_session.run());
    tokio::spawn(print_events("caller", caller_events));
    tokio::spawn(print_events("callee", callee_events));

    // Both local queues need pumping; nobody else is around to do it.
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(50));
        loop {
            tick.tick().await;
            let _ = caller_transport.receive();
            let _ = callee_transport.receive();
        }
    });

    caller.start_call(Vec::new()).await?;
    tokio::time::sleep(Duration::from_secs(3)).await;

    caller.send_chat("hello from the caller").await?;
    callee.send_chat("hello back").await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    caller.end_call().await;
    callee.end_call().await;
    println!("{}", "✨ Demo finished".green().bold());
    Ok(())
}

/// Line loop: plain text is chat, `/paste` pulls one manually exchanged
/// signal in, `/quit` hangs up.
async fn repl(
    handle: SessionHandle,
    manual: Option<Arc<ManualTransport<ConsoleExchange>>>,
) -> Result<()> {
    loop {
        let line = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt(">")
                .allow_empty(true)
                .interact_text()
        })
        .await
        .context("input task failed")??;

        match line.trim() {
            "" => continue,
            "/quit" => {
                handle.end_call().await;
                println!("{}", "call ended".dimmed());
                return Ok(());
            }
            "/paste" => match &manual {
                Some(transport) => {
                    let transport = transport.clone();
                    let pasted =
                        tokio::task::spawn_blocking(move || transport.receive()).await?;
                    if let Err(e) = pasted {
                        eprintln!("{} {}", "paste failed:".red().bold(), e);
                    }
                }
                None => eprintln!("{}", "/paste only works in manual mode".yellow()),
            },
            text => {
                handle.send_chat(text).await?;
            }
        }
    }
}

async fn print_events(label: &'static str, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        let tag = format!("[{label}]");
        match event {
            SessionEvent::StateChanged(state) => {
                println!("{} {}", tag.dimmed(), state.as_str().dimmed());
            }
            SessionEvent::RemoteStream(stream) => {
                println!("{} {} {}", tag.dimmed(), "remote stream".green(), stream.id);
            }
            SessionEvent::ChatMessage(text) => {
                println!("{} {}", tag.cyan().bold(), text);
            }
            SessionEvent::ChannelNotReady => {
                println!(
                    "{} {}",
                    tag.dimmed(),
                    "channel not open yet; message queued".yellow()
                );
            }
            SessionEvent::SignalingError(e) => {
                eprintln!("{} {} {}", tag.dimmed(), "error:".red().bold(), e);
            }
        }
    }
}

/// Console half of manual signaling: print to copy, prompt to paste.
struct ConsoleExchange;

impl ManualExchange for ConsoleExchange {
    fn present(&self, serialized: &str) -> Result<(), TransportError> {
        println!(
            "{}",
            "✉  copy this signaling message to your peer:".yellow().bold()
        );
        println!("{}", serialized.cyan());
        Ok(())
    }

    fn collect(&self) -> Result<String, TransportError> {
        Input::<String>::new()
            .with_prompt("paste signaling message")
            .interact_text()
            .map_err(|e| TransportError::Connect(e.to_string()))
    }
}
