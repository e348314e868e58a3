//! Search Agent
//!
//! Builds a Gemini agent with Google Search, asks it one question and
//! streams the answer to stdout. Logs go to stderr.

mod app;

use std::io;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_agent=info,agent_runner=info,sa_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let settings = match sa_core::config::init() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Ctrl-C ends the turn; the trailer is still printed
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, stopping the turn");
                cancel.cancel();
            }
        }
    });

    let mut stdout = io::stdout();
    match app::run(settings, cancel, &mut stdout).await {
        Ok(summary) => tracing::info!(
            "Turn finished: {} partial events, {} errors, {} grounding sources{}",
            summary.partial_events,
            summary.errors,
            summary.source_count(),
            if summary.cancelled { " (cancelled)" } else { "" }
        ),
        Err(e) => {
            tracing::error!("Agent run failed: {}", e);
            std::process::exit(1);
        }
    }
}
