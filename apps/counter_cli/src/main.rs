use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{CounterSession, ReadAccess};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wallet_integration::{JsonRpcWallet, WalletProvider};

mod clipboard;
mod commands;
mod config;

use clipboard::SystemClipboard;
use commands::{render_event, render_view, Command, HELP};
use config::{load_settings, parse_read_access};

#[derive(Parser, Debug)]
#[command(about = "Read and increment an on-chain counter through a wallet")]
struct Args {
    /// Config file (defaults to ./counter.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON-RPC endpoint of the wallet or node
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    contract_address: Option<String>,
    #[arg(long)]
    confirmations: Option<u32>,
    /// `wallet` or `passive`
    #[arg(long, value_parser = parse_read_access)]
    read_access: Option<ReadAccess>,
    /// Run as if no wallet were installed
    #[arg(long)]
    no_wallet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(v) = args.rpc_url {
        settings.rpc_url = v;
    }
    if let Some(v) = args.contract_address {
        settings.contract_address = Some(v);
    }
    if let Some(v) = args.confirmations {
        settings.confirmations = v;
    }
    if let Some(v) = args.read_access {
        settings.read_access = v;
    }

    let session_config = settings.session_config()?;
    let wallet: Option<Arc<dyn WalletProvider>> = if args.no_wallet {
        None
    } else {
        Some(Arc::new(JsonRpcWallet::new(settings.rpc_wallet_config()?)))
    };
    info!(
        contract = %session_config.contract_address,
        rpc_url = %settings.rpc_url,
        wallet = wallet.is_some(),
        "starting counter session"
    );
    let session = CounterSession::new_with_wallet(session_config, wallet);

    let mut events = session.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "session event");
                    if let Some(line) = render_event(&event) {
                        println!("{line}");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event printer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        // Chain actions run in the background so the prompt stays usable;
        // their outcome arrives as session events.
        match cmd {
            Command::Connect => {
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    let _ = session.connect().await;
                });
            }
            Command::Disconnect => session.disconnect().await,
            Command::Refresh => {
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    let _ = session.get_number().await;
                });
            }
            Command::Increment => {
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    let _ = session.increment().await;
                });
            }
            Command::CopyAddress => {
                let _ = session.copy_address(&SystemClipboard).await;
            }
            Command::Status => println!("{}", render_view(&session.view().await)),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(())
}
