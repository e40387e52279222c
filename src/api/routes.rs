use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::chat::{ChatRequest, ChatService};
use crate::config::Config;
use crate::coupon::validate::{validate, ValidateRequest, ValidationReport};
use crate::coupon::{build_coupon, Coupon};
use crate::error::AppError;
use crate::export;
use crate::feed::live_feed::{schema_of, simplify_event, LiveFeedClient, MatchDetails};
use crate::state::RateLimiter;
use crate::telegram::{coupon_message, TelegramClient};
use crate::types::{MatchSummary, RiskProfile};

#[derive(Clone)]
pub struct ApiState {
    pub feed: LiveFeedClient,
    pub chat: ChatService,
    pub telegram: Option<TelegramClient>,
    pub limiter: Arc<RateLimiter>,
}

pub fn router(state: ApiState, cfg: &Config) -> Router {
    let api = Router::new()
        .route("/matches", get(get_matches))
        .route("/matches/:id/details", get(get_match_details))
        .route("/coupon", get(get_coupon))
        .route("/coupon/validate", post(post_validate))
        .route("/coupon/pdf", post(post_coupon_pdf))
        .route("/coupon/image", post(post_coupon_image))
        .route("/coupon/send-telegram", post(post_send_telegram))
        .route("/chat", post(post_chat))
        .route("/structure", get(get_structure))
        .fallback(api_not_found)
        .with_state(state);

    let index = format!("{}/index.html", cfg.public_dir);
    let dashboard = ServeDir::new(&cfg.public_dir).not_found_service(ServeFile::new(index));

    Router::new().nest("/api", api).fallback_service(dashboard)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CouponQuery {
    pub size: Option<usize>,
    pub league: Option<String>,
    pub risk: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesResponse {
    pub success: bool,
    pub fetched_at_unix: i64,
    pub filter_mode: crate::feed::FilterMode,
    pub total_from_api: usize,
    pub total_sport: usize,
    pub total_penalty: usize,
    pub count: usize,
    pub matches: Vec<MatchSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub details: MatchDetails,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub success: bool,
    #[serde(flatten)]
    pub coupon: Coupon,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ValidationReport,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_matches(State(state): State<ApiState>) -> Result<Json<MatchesResponse>, AppError> {
    let snapshot = state.feed.snapshot().await?;
    let matches: Vec<MatchSummary> = snapshot.events.iter().map(simplify_event).collect();
    Ok(Json(MatchesResponse {
        success: true,
        fetched_at_unix: snapshot.fetched_at_unix,
        filter_mode: snapshot.filter_mode,
        total_from_api: snapshot.total_from_api,
        total_sport: snapshot.total_sport,
        total_penalty: snapshot.total_penalty,
        count: matches.len(),
        matches,
    }))
}

async fn get_match_details(
    State(state): State<ApiState>,
    Path(match_id): Path<i64>,
) -> Result<Json<DetailsResponse>, AppError> {
    let details = state.feed.match_details(match_id).await?;
    Ok(Json(DetailsResponse { success: true, details }))
}

async fn get_coupon(
    State(state): State<ApiState>,
    Query(params): Query<CouponQuery>,
) -> Result<Json<CouponResponse>, AppError> {
    let size = params.size.unwrap_or(3);
    let league = params.league.unwrap_or_else(|| "all".to_string());
    let profile = RiskProfile::parse(params.risk.as_deref().unwrap_or("balanced"));

    let snapshot = state.feed.snapshot().await?;
    let coupon = build_coupon(&snapshot, size, &league, profile);
    info!(
        picks = coupon.picks.len(),
        profile = %coupon.risk_profile,
        combined = coupon.combined_odds,
        "coupon built"
    );
    Ok(Json(CouponResponse { success: true, coupon }))
}

async fn post_validate(
    State(state): State<ApiState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidationResponse>, AppError> {
    if request.selections.is_empty() {
        return Err(AppError::InvalidCoupon("selections list is empty".to_string()));
    }
    // One snapshot so every leg is judged against the same feed state.
    let snapshot = state.feed.snapshot().await?;
    let report = validate(&request, &snapshot);
    Ok(Json(ValidationResponse { success: true, report }))
}

async fn post_coupon_pdf(Json(coupon): Json<Coupon>) -> Result<impl IntoResponse, AppError> {
    if coupon.picks.is_empty() {
        return Err(AppError::InvalidCoupon("coupon has no picks".to_string()));
    }
    let bytes = export::coupon_pdf(&coupon);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"coupon.pdf\"".to_string(),
            ),
        ],
        bytes,
    ))
}

async fn post_coupon_image(Json(coupon): Json<Coupon>) -> Result<impl IntoResponse, AppError> {
    if coupon.picks.is_empty() {
        return Err(AppError::InvalidCoupon("coupon has no picks".to_string()));
    }
    let svg = export::coupon_svg(&coupon);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

async fn post_send_telegram(
    State(state): State<ApiState>,
    Json(coupon): Json<Coupon>,
) -> Result<Json<serde_json::Value>, AppError> {
    if coupon.picks.is_empty() {
        return Err(AppError::InvalidCoupon("coupon has no picks".to_string()));
    }
    let telegram = state.telegram.as_ref().ok_or_else(|| {
        AppError::Telegram(
            "Telegram export disabled: set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID".to_string(),
        )
    })?;

    telegram.send_message(&coupon_message(&coupon)).await?;
    telegram
        .send_document(
            "coupon.pdf",
            "application/pdf",
            export::coupon_pdf(&coupon),
            "Coupon ticket",
        )
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "message": "coupon sent" })))
}

/// Client key for the chat limiter: the proxy header when present, else
/// the socket peer address.
fn client_key(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string())
}

async fn post_chat(
    State(state): State<ApiState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = client_key(&headers, &addr);
    state.limiter.prune();
    if !state.limiter.allow(&key) {
        return Err(AppError::RateLimited);
    }
    let reply = state.chat.reply(&request.message).await;
    Ok(Json(serde_json::json!({
        "success": true,
        "reply": reply.reply,
        "source": reply.source,
    })))
}

/// Depth-limited sketch of the upstream payload, kept as a debugging aid
/// while the feed schema keeps shifting.
async fn get_structure(State(state): State<ApiState>) -> Result<Json<serde_json::Value>, AppError> {
    let payload = state.feed.fetch_raw().await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "structure": schema_of(&payload, 4),
    })))
}

async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "message": "unknown API route",
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_header_beats_socket_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.9, 172.16.0.1".parse().unwrap());
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert_eq!(client_key(&headers, &addr), "10.0.0.9");
    }

    #[test]
    fn socket_address_is_the_fallback_key() {
        let addr: SocketAddr = "192.168.1.5:1234".parse().unwrap();
        assert_eq!(client_key(&HeaderMap::new(), &addr), "192.168.1.5");
    }
}
