use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Config, FEED_TIMEOUT_SECS, PENALTY_KEYWORDS, PENALTY_SPORT_ID};
use crate::error::{AppError, Result};
use crate::feed::{markets, normalize_text};
use crate::predictor::{self, PredictionBundle, PredictionInput};
use crate::types::{MatchSummary, OneXTwoOdds, ScoreContext};

pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// How the penalty set was isolated from the raw feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterMode {
    /// At least one event matched the penalty keywords.
    #[serde(rename = "keyword-penalty")]
    KeywordPenalty,
    /// No keyword hit; fall back to the whole sport-85 set, which the
    /// request already restricts to the penalty market group (gr=285).
    #[serde(rename = "group-fallback-gr-285")]
    GroupFallback,
}

/// One fetch/filter cycle over the live feed. Events stay raw `Value`s;
/// the upstream schema is unversioned and only partially understood.
#[derive(Debug)]
pub struct FeedSnapshot {
    pub fetched_at_unix: i64,
    pub total_from_api: usize,
    pub total_sport: usize,
    pub total_penalty: usize,
    pub filter_mode: FilterMode,
    pub events: Vec<Value>,
}

/// Full per-match payload: simplified event, its markets, and the
/// prediction bundle computed over them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    #[serde(rename = "match")]
    pub summary: MatchSummary,
    pub betting_markets: Vec<crate::types::BetOption>,
    pub prediction: PredictionBundle,
}

// ---------------------------------------------------------------------------
// Raw event helpers
// ---------------------------------------------------------------------------

pub fn event_id(event: &Value) -> Option<i64> {
    event.get("I").and_then(|v| v.as_i64())
}

fn event_sport_id(event: &Value) -> Option<i64> {
    event.get("SI").and_then(|v| v.as_i64())
}

/// All text fields that may carry the league/fixture wording, folded into
/// one normalized haystack for keyword matching.
fn match_text(event: &Value) -> String {
    let fields = ["L", "LE", "LR", "N", "O1", "O2", "TN", "SN"];
    let joined = fields
        .iter()
        .filter_map(|k| event.get(*k).and_then(|v| v.as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    normalize_text(&joined)
}

fn is_penalty_event(event: &Value) -> bool {
    let text = match_text(event);
    PENALTY_KEYWORDS
        .iter()
        .any(|kw| text.contains(&normalize_text(kw)))
}

/// Numeric field that the feed sometimes sends as a string.
fn loose_number(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

pub fn parse_score_context(event: &Value) -> ScoreContext {
    let fs = event.get("SC").and_then(|sc| sc.get("FS"));
    let pick = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| loose_number(fs.and_then(|f| f.get(*k))))
            .unwrap_or(0.0) as u32
    };
    // S1/S2 is the current shape; the rest are legacy spellings seen in
    // older payloads.
    let home_goals = pick(&["S1", "H", "Home", "SA"]);
    let away_goals = pick(&["S2", "A", "Away", "SB"]);

    let minute = event
        .get("SC")
        .and_then(|sc| sc.get("CPS"))
        .and_then(|v| v.as_str())
        .map(|cps| {
            cps.chars()
                .take_while(|c| c.is_ascii_digit())
                .take(2)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse::<u32>().ok())
        .unwrap_or(0);

    ScoreContext { home_goals, away_goals, minute }
}

fn extract_one_x_two(event: &Value) -> OneXTwoOdds {
    let rows = event.get("E").and_then(|e| e.as_array());
    let pick = |bet_type: i64| {
        rows?.iter().find_map(|row| {
            let g = row.get("G").and_then(|v| v.as_i64())?;
            let t = row.get("T").and_then(|v| v.as_i64())?;
            if g == 1 && t == bet_type {
                row.get("C").and_then(|v| v.as_f64())
            } else {
                None
            }
        })
    };
    OneXTwoOdds { home: pick(1), draw: pick(2), away: pick(3) }
}

pub fn simplify_event(event: &Value) -> MatchSummary {
    let text = |key: &str, fallback: &str| {
        event
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(fallback)
            .to_string()
    };
    let sc_text = |key: &str| {
        event
            .get("SC")
            .and_then(|sc| sc.get(key))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };
    let league = event
        .get("L")
        .or_else(|| event.get("LE"))
        .and_then(|v| v.as_str())
        .unwrap_or("Virtual competition")
        .to_string();

    MatchSummary {
        id: event_id(event).unwrap_or_default(),
        team_home: text("O1", "Team 1"),
        team_away: text("O2", "Team 2"),
        league,
        start_time_unix: event.get("S").and_then(|v| v.as_i64()),
        sport_id: event_sport_id(event),
        status_text: sc_text("SLS")
            .or_else(|| sc_text("I"))
            .unwrap_or_else(|| "Pending".to_string()),
        info_text: sc_text("I").unwrap_or_default(),
        score: parse_score_context(event),
        odds_1x2: extract_one_x_two(event),
        bet_count: markets::extract_bets(event).len(),
    }
}

pub fn build_match_details(event: &Value) -> MatchDetails {
    let summary = simplify_event(event);
    let betting_markets = markets::extract_bets(event);
    let prediction = predictor::predict(&PredictionInput {
        team_home: &summary.team_home,
        team_away: &summary.team_away,
        league: &summary.league,
        score: summary.score,
        bets: &betting_markets,
    });
    MatchDetails { summary, betting_markets, prediction }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Isolate penalty fixtures from the raw payload. Keyword matches win;
/// an empty keyword set falls back to every sport-85 event so the list
/// is never empty just because the wording changed upstream.
pub fn select_penalty_events(payload: &Value) -> FeedSnapshot {
    let events: Vec<Value> = payload
        .get("Value")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let sport_events: Vec<Value> = events
        .iter()
        .filter(|e| event_sport_id(e) == Some(PENALTY_SPORT_ID))
        .cloned()
        .collect();
    let penalty_events: Vec<Value> = sport_events
        .iter()
        .filter(|e| is_penalty_event(e))
        .cloned()
        .collect();

    let (selected, filter_mode) = if penalty_events.is_empty() {
        (sport_events.clone(), FilterMode::GroupFallback)
    } else {
        (penalty_events.clone(), FilterMode::KeywordPenalty)
    };

    FeedSnapshot {
        fetched_at_unix: now_unix(),
        total_from_api: events.len(),
        total_sport: sport_events.len(),
        total_penalty: penalty_events.len(),
        filter_mode,
        events: selected,
    }
}

/// Depth-limited type sketch of a JSON value, for the schema-probe route.
pub fn schema_of(value: &Value, depth: u32) -> Value {
    match value {
        Value::Null => serde_json::json!({ "type": "null" }),
        Value::Array(items) => serde_json::json!({
            "type": "array",
            "length": items.len(),
            "sample": items.first().map(|v| schema_of(v, depth.saturating_sub(1))),
        }),
        Value::Object(map) => {
            if depth == 0 {
                return serde_json::json!({ "type": "object" });
            }
            let props: serde_json::Map<String, Value> = map
                .iter()
                .take(50)
                .map(|(k, v)| (k.clone(), schema_of(v, depth - 1)))
                .collect();
            serde_json::json!({
                "type": "object",
                "keys": map.keys().collect::<Vec<_>>(),
                "props": props,
            })
        }
        Value::Bool(_) => serde_json::json!({ "type": "boolean" }),
        Value::Number(_) => serde_json::json!({ "type": "number" }),
        Value::String(_) => serde_json::json!({ "type": "string" }),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LiveFeedClient {
    client: reqwest::Client,
    url: String,
}

impl LiveFeedClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            // The upstream rejects requests without a browser-ish agent.
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self { client, url: cfg.feed_url.clone() })
    }

    pub async fn fetch_raw(&self) -> Result<Value> {
        debug!("fetching live feed");
        let resp = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AppError::Upstream(format!("HTTP {}", resp.status())));
        }
        Ok(resp.json().await?)
    }

    /// One fetch + filter cycle.
    pub async fn snapshot(&self) -> Result<FeedSnapshot> {
        let payload = self.fetch_raw().await?;
        let snapshot = select_penalty_events(&payload);
        info!(
            total = snapshot.total_from_api,
            sport = snapshot.total_sport,
            penalty = snapshot.total_penalty,
            mode = ?snapshot.filter_mode,
            "feed snapshot"
        );
        Ok(snapshot)
    }

    /// Fresh details (markets + prediction bundle) for one match id.
    pub async fn match_details(&self, match_id: i64) -> Result<MatchDetails> {
        let payload = self.fetch_raw().await?;
        let events = payload.get("Value").and_then(|v| v.as_array());
        let found = events
            .and_then(|list| list.iter().find(|e| event_id(e) == Some(match_id)))
            .ok_or(AppError::MatchNotFound(match_id))?;
        Ok(build_match_details(found))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: i64, league: &str) -> Value {
        json!({
            "I": id,
            "SI": 85,
            "L": league,
            "O1": "Arsenal",
            "O2": "Chelsea",
            "S": 1_900_000_000i64,
            "SC": { "FS": { "S1": 1, "S2": 2 }, "CPS": "34:10" },
            "E": [
                { "G": 1, "T": 1, "C": 1.9 },
                { "G": 1, "T": 2, "C": 3.2 },
                { "G": 1, "T": 3, "C": 2.3 }
            ]
        })
    }

    fn payload(events: Vec<Value>) -> Value {
        json!({ "Value": events })
    }

    #[test]
    fn keyword_match_selects_penalty_events() {
        let p = payload(vec![
            event(1, "FIFA Penalty League"),
            event(2, "Regular Cup"),
        ]);
        let snap = select_penalty_events(&p);
        assert_eq!(snap.filter_mode, FilterMode::KeywordPenalty);
        assert_eq!(snap.events.len(), 1);
        assert_eq!(snap.total_sport, 2);
        assert_eq!(snap.total_penalty, 1);
    }

    #[test]
    fn no_keyword_match_falls_back_to_sport_set() {
        let p = payload(vec![event(1, "Regular Cup"), event(2, "Another Cup")]);
        let snap = select_penalty_events(&p);
        assert_eq!(snap.filter_mode, FilterMode::GroupFallback);
        assert_eq!(snap.events.len(), 2);
        assert_eq!(snap.total_penalty, 0);
        // serialized form is the contract the dashboard checks
        assert_eq!(
            serde_json::to_value(snap.filter_mode).unwrap(),
            json!("group-fallback-gr-285")
        );
    }

    #[test]
    fn accented_keyword_still_matches() {
        let mut e = event(1, "Ligue des pénalties");
        e["L"] = json!("Ligue des pénalties");
        let snap = select_penalty_events(&payload(vec![e]));
        assert_eq!(snap.filter_mode, FilterMode::KeywordPenalty);
    }

    #[test]
    fn score_context_reads_score_and_minute() {
        let ctx = parse_score_context(&event(1, "x"));
        assert_eq!(ctx.home_goals, 1);
        assert_eq!(ctx.away_goals, 2);
        assert_eq!(ctx.minute, 34);
        assert_eq!(ctx.total_goals(), 3);
    }

    #[test]
    fn score_context_defaults_to_zero() {
        let ctx = parse_score_context(&json!({ "I": 1 }));
        assert_eq!(ctx.total_goals(), 0);
        assert_eq!(ctx.minute, 0);
    }

    #[test]
    fn simplify_event_fills_summary() {
        let s = simplify_event(&event(7, "FIFA Penalty League"));
        assert_eq!(s.id, 7);
        assert_eq!(s.team_home, "Arsenal");
        assert_eq!(s.league, "FIFA Penalty League");
        assert_eq!(s.bet_count, 3);
        assert_eq!(s.odds_1x2.home, Some(1.9));
    }

    #[test]
    fn schema_of_sketches_shape() {
        let sketch = schema_of(&json!({ "Value": [ { "I": 1 } ] }), 2);
        assert_eq!(sketch["type"], "object");
        assert_eq!(sketch["props"]["Value"]["type"], "array");
    }
}
