mod api;
mod app;
mod auth;
mod config;
mod error;
mod extractor;
mod fetcher;
mod middleware;
mod model;
mod repo;
mod service;
mod util;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::Path, sync::OnceLock};
use tokio::net::TcpListener;
use tracing_appender::rolling;
use tracing_subscriber::{
    filter::filter_fn, fmt::layer as fmt_layer, prelude::*, EnvFilter, Registry,
};

const CRATE_TARGET: &str = "news_digest";

#[derive(Parser, Debug)]
#[command(name = "news_digest", version, about = "News aggregation and summarization backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Delete every saved article for every user
    ClearArticles,
    /// Delete a user together with their saved articles
    DeleteUser {
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = config::AppConfig::from_env().context("failed to load configuration")?;
    setup_tracing(&config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::ClearArticles => {
            let store = app::open_store(&config).await?;
            let deleted = store
                .clear_articles()
                .await
                .context("failed to clear saved articles")?;
            println!("Successfully deleted {deleted} saved articles.");
            Ok(())
        }
        Command::DeleteUser { username } => {
            let store = app::open_store(&config).await?;
            match service::users::delete_by_username(store.as_ref(), &username)
                .await
                .map_err(|err| anyhow::anyhow!("failed to delete user: {err}"))?
            {
                Some(articles) => {
                    println!("Deleted user {username} and {articles} saved articles.")
                }
                None => println!("No user named {username}."),
            }
            Ok(())
        }
    }
}

async fn serve(config: &config::AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .context("invalid SERVER_BIND address")?;

    let state = app::build_state(config).await?;
    let app = app::router(state);

    tracing::info!(%addr, storage = config.db.backend.as_str(), "starting server");
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await.context("server failed")?;

    Ok(())
}

static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Installs the global subscriber. Later calls are no-ops, so the first file
/// writer and its guard stay in place.
fn setup_tracing(config: &config::AppConfig) -> anyhow::Result<()> {
    if FILE_GUARD.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config
            .logging
            .level
            .clone()
            .unwrap_or_else(|| "info".to_string());
        EnvFilter::new(level)
    });

    let log_path = Path::new(&config.logging.file);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = log_path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid log file path"))?;
    let directory = log_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| Path::new(".").to_path_buf());

    let file_appender = rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    FILE_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("log file writer already installed"))?;

    let crate_filter = filter_fn(|meta| meta.target().starts_with(CRATE_TARGET));
    let other_filter = filter_fn(|meta| !meta.target().starts_with(CRATE_TARGET));

    let stdout_crate = fmt_layer()
        .with_writer(std::io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_filter(crate_filter.clone());

    let stdout_general = fmt_layer()
        .with_writer(std::io::stdout)
        .with_filter(other_filter);

    let file_layer = fmt_layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(crate_filter);

    Registry::default()
        .with(env_filter)
        .with(stdout_crate)
        .with(stdout_general)
        .with(file_layer)
        .try_init()
        .context("failed to init tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_setup_runs_once() {
        let mut config = config::AppConfig::default();
        let dir = std::env::temp_dir().join(format!("news_digest_{}", uuid::Uuid::new_v4()));
        config.logging.file = dir.join("trace.log").to_string_lossy().into_owned();

        setup_tracing(&config).unwrap();
        assert!(FILE_GUARD.get().is_some());
        assert!(dir.is_dir());

        // A second call must neither fail nor replace the installed writer.
        config.logging.file = dir.join("other.log").to_string_lossy().into_owned();
        setup_tracing(&config).unwrap();
        assert!(!dir.join("other.log").exists());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["news_digest"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["news_digest", "delete-user", "reader"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::DeleteUser { ref username }) if username == "reader"
        ));

        assert!(Cli::try_parse_from(["news_digest", "delete-user"]).is_err());
    }
}
