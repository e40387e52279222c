use crate::error::{AppError, Result};

/// Default live-feed endpoint for virtual FIFA Penalty fixtures.
/// The query string pins sport 85 and the penalty market group; the
/// response schema is unversioned and reverse-engineered in the feed module.
pub const LIVE_FEED_URL: &str = "https://1xbet.com/service-api/LiveFeed/Get1x2_VZip?sports=85&count=40&lng=fr&gr=285&mode=4&country=96&getEmpty=true&virtualSports=true&noFilterBlockEvent=true";

/// Upstream sport identifier for virtual FIFA Penalty.
pub const PENALTY_SPORT_ID: i64 = 85;

/// League/team text fragments that mark a penalty fixture. Matched against
/// diacritic-folded lowercase text.
pub const PENALTY_KEYWORDS: &[&str] = &[
    "penalty",
    "penalties",
    "tir au but",
    "tirs au but",
    "shootout",
    "penaltis",
];

/// Only odds inside this band are scored by the bots. Hand-picked business
/// rule carried over from the original system, not a derived constant.
pub const VALID_ODDS_MIN: f64 = 1.399;
pub const VALID_ODDS_MAX: f64 = 3.0;

/// Bot confidence values clamp into this range.
pub const CONFIDENCE_MIN: f64 = 5.0;
pub const CONFIDENCE_MAX: f64 = 95.0;

/// Coupon size is clamped into [1, MAX_COUPON_SIZE].
pub const MAX_COUPON_SIZE: usize = 12;

/// Default odds-drift threshold for ticket validation, in percent.
pub const DEFAULT_DRIFT_THRESHOLD_PCT: f64 = 6.0;

/// Outbound request timeouts (seconds).
pub const FEED_TIMEOUT_SECS: u64 = 45;
pub const TELEGRAM_TIMEOUT_SECS: u64 = 15;
pub const LLM_TIMEOUT_SECS: u64 = 20;

/// Chat rate limit: max requests per fixed window, per client key.
pub const CHAT_RATE_LIMIT: u32 = 10;
pub const CHAT_RATE_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub log_level: String,
    pub api_port: u16,
    /// Directory served as the static dashboard (PUBLIC_DIR).
    pub public_dir: String,
    /// Telegram export is disabled when either value is absent.
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    /// Chat endpoint degrades to canned replies when absent.
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            feed_url: std::env::var("FEED_URL").unwrap_or_else(|_| LIVE_FEED_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3029".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            public_dir: std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string()),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID")
                .ok()
                .and_then(|s| s.parse::<i64>().ok()),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            anthropic_model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string()),
        })
    }
}
