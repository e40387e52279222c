mod api;
mod chat;
mod config;
mod coupon;
mod error;
mod export;
mod feed;
mod predictor;
mod state;
mod telegram;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::{router, ApiState};
use crate::chat::ChatService;
use crate::config::Config;
use crate::error::Result;
use crate::feed::LiveFeedClient;
use crate::state::RateLimiter;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let feed = LiveFeedClient::new(&cfg)?;
    let chat = ChatService::from_config(&cfg)?;

    let telegram = TelegramClient::from_config(&cfg)?;
    if telegram.is_none() {
        warn!("TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set, Telegram export disabled");
    }
    if cfg.anthropic_api_key.is_none() {
        warn!("ANTHROPIC_API_KEY not set, chat endpoint will use canned answers only");
    }

    let api_state = ApiState {
        feed,
        chat,
        telegram,
        limiter: Arc::new(RateLimiter::default()),
    };
    let app = router(api_state, &cfg);

    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}, dashboard from {}/", cfg.public_dir);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
