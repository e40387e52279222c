//! Re-checks an existing ticket against a fresh feed snapshot. Each
//! selection is flagged independently; one bad leg never invalidates the
//! verdict for the others.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DRIFT_THRESHOLD_PCT;
use crate::coupon::{pick_option, CouponPick};
use crate::feed::live_feed::{build_match_details, event_id, now_unix, FeedSnapshot};
use crate::types::{round2, RiskProfile};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionInput {
    pub match_id: i64,
    pub bet_label: String,
    pub odds: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub selections: Vec<SelectionInput>,
    #[serde(default)]
    pub drift_threshold_pct: Option<f64>,
    #[serde(default)]
    pub risk: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationReason {
    MatchAlreadyStarted,
    MarketUnavailable,
    OddsDrift,
    LowConfidence,
    MatchNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStatus {
    Ok,
    Replace,
    Invalid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionVerdict {
    pub match_id: i64,
    pub bet_label: String,
    pub status: SelectionStatus,
    pub reasons: Vec<ValidationReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_odds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<CouponPick>,
    pub recommendation: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// `TICKET_OK` when every leg is fine, `TICKET_FIX` otherwise.
    pub ticket_status: &'static str,
    pub checked_at_unix: i64,
    pub selections: Vec<SelectionVerdict>,
}

/// Absolute odds movement as a percentage of the booked odds.
pub fn drift_pct(booked: f64, current: f64) -> f64 {
    if booked == 0.0 {
        return 0.0;
    }
    round2(((current - booked).abs() / booked) * 100.0)
}

fn verdict_for(
    selection: &SelectionInput,
    snapshot: &FeedSnapshot,
    threshold: f64,
    profile: RiskProfile,
    now: i64,
) -> SelectionVerdict {
    let event = snapshot
        .events
        .iter()
        .find(|e| event_id(e) == Some(selection.match_id));

    let event = match event {
        Some(e) => e,
        None => {
            return SelectionVerdict {
                match_id: selection.match_id,
                bet_label: selection.bet_label.clone(),
                status: SelectionStatus::Invalid,
                reasons: vec![ValidationReason::MatchNotFound],
                current_odds: None,
                drift_pct: None,
                replacement: None,
                recommendation: "remove this leg, the fixture left the feed",
            }
        }
    };

    let details = build_match_details(event);
    let mut reasons = Vec::new();

    if !details.summary.is_upcoming(now) {
        reasons.push(ValidationReason::MatchAlreadyStarted);
    }

    let market = details
        .betting_markets
        .iter()
        .find(|b| b.label == selection.bet_label);
    let current_odds = market.map(|b| b.odds);

    let mut drift = None;
    match market {
        None => reasons.push(ValidationReason::MarketUnavailable),
        Some(b) => {
            let pct = drift_pct(selection.odds, b.odds);
            drift = Some(pct);
            if pct > threshold {
                reasons.push(ValidationReason::OddsDrift);
            }
        }
    }

    // Confidence comes from the ranked analysis, which covers every market.
    if let Some(item) = details
        .prediction
        .analysis
        .items
        .iter()
        .find(|i| i.label == selection.bet_label)
    {
        if item.composite_score < 50.0 {
            reasons.push(ValidationReason::LowConfidence);
        }
    }

    let status = if reasons.is_empty() {
        SelectionStatus::Ok
    } else {
        SelectionStatus::Replace
    };
    let replacement = match status {
        SelectionStatus::Ok => None,
        _ => pick_option(&details, profile).filter(|p| p.bet_label != selection.bet_label),
    };
    let recommendation = match (status, replacement.is_some()) {
        (SelectionStatus::Ok, _) => "keep",
        (_, true) => "swap for the proposed replacement",
        (_, false) => "remove this leg",
    };

    SelectionVerdict {
        match_id: selection.match_id,
        bet_label: selection.bet_label.clone(),
        status,
        reasons,
        current_odds,
        drift_pct: drift,
        replacement,
        recommendation,
    }
}

/// Validate every leg of a ticket against one snapshot. The snapshot is
/// fetched once by the caller so all legs see the same feed state.
pub fn validate(request: &ValidateRequest, snapshot: &FeedSnapshot) -> ValidationReport {
    let threshold = request
        .drift_threshold_pct
        .unwrap_or(DEFAULT_DRIFT_THRESHOLD_PCT);
    let profile = RiskProfile::parse(request.risk.as_deref().unwrap_or("balanced"));
    let now = now_unix();

    let selections: Vec<SelectionVerdict> = request
        .selections
        .iter()
        .map(|s| verdict_for(s, snapshot, threshold, profile, now))
        .collect();

    let all_ok = selections.iter().all(|s| s.status == SelectionStatus::Ok);
    ValidationReport {
        ticket_status: if all_ok { "TICKET_OK" } else { "TICKET_FIX" },
        checked_at_unix: now_unix(),
        selections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::live_feed::select_penalty_events;
    use serde_json::{json, Value};

    fn fixture(id: i64, start_offset: i64, over_odds: f64) -> Value {
        json!({
            "I": id,
            "SI": 85,
            "L": "FIFA Penalty. World Cup",
            "O1": "Arsenal",
            "O2": "Chelsea",
            "S": now_unix() + start_offset,
            "E": [
                {"G": 17, "T": 9, "C": over_odds, "P": 2.5},
                {"G": 17, "T": 10, "C": 1.6, "P": 2.5},
            ],
        })
    }

    fn snapshot(events: Vec<Value>) -> FeedSnapshot {
        select_penalty_events(&json!({"Value": events}))
    }

    fn request(selections: Vec<SelectionInput>) -> ValidateRequest {
        ValidateRequest { selections, drift_threshold_pct: None, risk: None }
    }

    fn selection(match_id: i64, label: &str, odds: f64) -> SelectionInput {
        SelectionInput { match_id, bet_label: label.to_string(), odds }
    }

    #[test]
    fn drift_percent_matches_hand_computation() {
        assert!((drift_pct(1.50, 1.60) - 6.67).abs() < 1e-9);
        assert!(drift_pct(1.50, 1.60) > DEFAULT_DRIFT_THRESHOLD_PCT);
        assert_eq!(drift_pct(1.50, 1.50), 0.0);
    }

    #[test]
    fn started_match_needs_replacement() {
        let snap = snapshot(vec![fixture(1, -120, 1.5)]);
        let report = validate(&request(vec![selection(1, "Over 2.5 goals", 1.5)]), &snap);
        let v = &report.selections[0];
        assert_eq!(v.status, SelectionStatus::Replace);
        assert!(v.reasons.contains(&ValidationReason::MatchAlreadyStarted));
        assert_eq!(report.ticket_status, "TICKET_FIX");
    }

    #[test]
    fn drifted_odds_are_flagged() {
        let snap = snapshot(vec![fixture(1, 600, 1.60)]);
        let report = validate(&request(vec![selection(1, "Over 2.5 goals", 1.50)]), &snap);
        let v = &report.selections[0];
        assert!(v.reasons.contains(&ValidationReason::OddsDrift));
        assert_eq!(v.drift_pct, Some(6.67));
        assert_eq!(v.current_odds, Some(1.60));
    }

    #[test]
    fn missing_market_is_flagged_unavailable() {
        let snap = snapshot(vec![fixture(1, 600, 1.5)]);
        let report = validate(&request(vec![selection(1, "Over 4.5 goals", 1.9)]), &snap);
        let v = &report.selections[0];
        assert!(v.reasons.contains(&ValidationReason::MarketUnavailable));
        assert_eq!(v.current_odds, None);
    }

    #[test]
    fn unknown_match_is_invalid() {
        let snap = snapshot(vec![fixture(1, 600, 1.5)]);
        let report = validate(&request(vec![selection(99, "Over 2.5 goals", 1.5)]), &snap);
        let v = &report.selections[0];
        assert_eq!(v.status, SelectionStatus::Invalid);
        assert_eq!(v.reasons, vec![ValidationReason::MatchNotFound]);
        assert!(v.replacement.is_none());
    }

    #[test]
    fn clean_ticket_reports_ok() {
        let snap = snapshot(vec![fixture(1, 600, 1.5)]);
        let report = validate(&request(vec![selection(1, "Over 2.5 goals", 1.5)]), &snap);
        assert_eq!(report.selections[0].status, SelectionStatus::Ok);
        assert_eq!(report.ticket_status, "TICKET_OK");
    }
}
