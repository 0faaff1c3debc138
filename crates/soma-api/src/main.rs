//! Soma memory core entry point.
//!
//! Binary name: `soma`
//!
//! Parses CLI arguments, initializes the store and conversation service,
//! then dispatches to a command handler or starts the HTTP API server.

mod cli;
mod http;
mod state;

use anyhow::anyhow;
use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (log_json, otel) = match &cli.command {
        Commands::Serve { log_json, otel, .. } => (*log_json, *otel),
        _ => (false, false),
    };
    soma_observe::init_tracing(cli.log_filter(), log_json, otel)
        .map_err(|e| anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "soma", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { port, host, .. } => serve(state.clone(), host, port, cli.quiet).await?,
        Commands::Stats => cli::stats::show_stats(&state, cli.json).await?,
        Commands::Cleanup { days } => cli::maintenance::cleanup(&state, days, cli.json).await?,
        Commands::Export { dir, limit } => cli::export::export(&state, dir, limit, cli.json).await?,
        Commands::Identities => cli::identity::list_identities(&state, cli.json).await?,
        Commands::Search {
            query,
            limit,
            case_sensitive,
        } => cli::message::search(&state, &query, limit, case_sensitive, cli.json).await?,
        Commands::History { session_id, limit } => {
            cli::message::history(&state, &session_id, limit, cli.json).await?;
        }
        Commands::Clear { yes } => cli::maintenance::clear(&state, yes, cli.json).await?,
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    state.db_pool.close().await;
    soma_observe::shutdown_tracing();
    Ok(())
}

/// Run the HTTP API with the retention sweeper until a shutdown signal.
async fn serve(
    state: AppState,
    host: Option<String>,
    port: Option<u16>,
    quiet: bool,
) -> anyhow::Result<()> {
    let server = &state.config().server;
    let addr = format!(
        "{}:{}",
        host.unwrap_or_else(|| server.host.clone()),
        port.unwrap_or(server.port)
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let shutdown = CancellationToken::new();
    let sweeper = state.spawn_retention(shutdown.clone());

    if !quiet {
        println!(
            "  {} Soma memory API listening on {}",
            console::style("◆").cyan().bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }
    tracing::info!(%addr, "server started");

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "retention sweeper did not stop cleanly");
    }

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
