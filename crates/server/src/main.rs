use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gamecode::{SessionStore, Site};
use gamecode_server::{AppState, routes};
use tracing::info;

/// HTTP front end for the game-code automation core.
#[derive(Debug, Parser)]
#[command(name = "gamecode-server", version, about)]
struct Args {
	/// Port to listen on.
	#[arg(long, env = "PORT", default_value_t = 3001)]
	port: u16,

	/// Backing file for persisted sessions.
	#[arg(long, default_value = "sessions.json")]
	session_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,gamecode=debug,gamecode_server=debug".into()),
		)
		.init();

	let args = Args::parse();

	let store = SessionStore::load(args.session_file.clone());
	let state = AppState::new(store, Site::default());
	let app = routes::router(state);

	let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;
	info!(target = "gamecode.server", %addr, session_file = %args.session_file.display(), "server listening");

	axum::serve(listener, app).await.context("server terminated")?;
	Ok(())
}
