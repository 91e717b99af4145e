mod cli;
mod commands;
mod config;
mod credentials;
mod error;
mod prompt;

use clap::Parser;
use client::{Gateway, Session, SessionManager, TransactionStore};
use tokio_util::sync::CancellationToken;

use crate::{cli::Cli, commands::Context, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "nexkontrol={level},client={level},engine={level}",
            level = config.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    let session = Session::new(credentials::load(&config.credentials_path)?);
    let gateway = Gateway::new(&config.base_url, config.request_timeout(), session.clone())?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, abandoning pending requests");
            interrupt.cancel();
        }
    });

    let ctx = Context {
        sessions: SessionManager::new(gateway.clone()),
        store: TransactionStore::new(gateway),
        cancel,
        config,
    };
    let outcome = commands::run(&ctx, cli.command).await;

    // Login stores the new token, logout or a rejected token removes it.
    credentials::sync(
        &ctx.config.credentials_path,
        session.credential().as_ref(),
    )?;
    outcome
}
