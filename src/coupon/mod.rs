//! Coupon assembly: one chosen bet per upcoming fixture, ranked by a
//! safety score tuned per risk profile, capped at the requested size.

pub mod validate;

use serde::{Deserialize, Serialize};

use crate::config::MAX_COUPON_SIZE;
use crate::feed::live_feed::{build_match_details, now_unix, FeedSnapshot, MatchDetails};
use crate::feed::normalize_text;
use crate::types::{round1, round3, BetKind, RiskProfile, RiskSettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPick {
    pub match_id: i64,
    pub teams: String,
    pub league: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_unix: Option<i64>,
    pub bet_label: String,
    pub odds: f64,
    pub confidence: f64,
    /// confidence minus the odds distance penalty; what the ranking sorts on.
    pub safety_score: f64,
    pub kind: BetKind,
    /// Which stage produced the pick: "master", "analysis" or "fallback".
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub risk_profile: RiskProfile,
    pub requested_size: usize,
    pub picks: Vec<CouponPick>,
    pub combined_odds: f64,
    pub average_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub generated_at_unix: i64,
}

fn in_band(odds: f64, s: &RiskSettings) -> bool {
    odds >= s.min_odds && odds <= s.max_odds
}

fn safety_score(confidence: f64, odds: f64, s: &RiskSettings) -> f64 {
    confidence - (odds - s.anchor).abs() * s.slope
}

/// Chosen bet for one fixture under a risk profile. Tries the master pick
/// first, then the ranked analysis list, then the cheapest in-band market
/// at a flat confidence of 45 so a fixture with any in-band market always
/// yields something.
pub fn pick_option(details: &MatchDetails, profile: RiskProfile) -> Option<CouponPick> {
    let settings = profile.settings();
    let base = |label: String, odds: f64, confidence: f64, kind: BetKind, source: &'static str| {
        CouponPick {
            match_id: details.summary.id,
            teams: format!("{} vs {}", details.summary.team_home, details.summary.team_away),
            league: details.summary.league.clone(),
            start_time_unix: details.summary.start_time_unix,
            bet_label: label,
            odds,
            confidence: round1(confidence),
            safety_score: round1(safety_score(confidence, odds, &settings)),
            kind,
            source: source.to_string(),
        }
    };

    let decision = &details.prediction.master.decision;
    if let (Some(label), Some(odds)) = (&decision.bet_label, decision.odds) {
        let listed = details
            .betting_markets
            .iter()
            .any(|b| b.label == *label && (b.odds - odds).abs() < 1e-9);
        if listed && in_band(odds, &settings) && decision.confidence >= settings.min_confidence {
            let kind = decision.kind.unwrap_or(BetKind::Other);
            return Some(base(label.clone(), odds, decision.confidence, kind, "master"));
        }
    }

    for item in &details.prediction.analysis.top_recommendations {
        if in_band(item.odds, &settings) {
            let kind = details
                .betting_markets
                .iter()
                .find(|b| b.label == item.label)
                .map(|b| b.kind)
                .unwrap_or(BetKind::Other);
            return Some(base(
                item.label.clone(),
                item.odds,
                item.composite_score,
                kind,
                "analysis",
            ));
        }
    }

    details
        .betting_markets
        .iter()
        .filter(|b| in_band(b.odds, &settings))
        .min_by(|a, b| a.odds.total_cmp(&b.odds))
        .map(|b| base(b.label.clone(), b.odds, 45.0, b.kind, "fallback"))
}

fn league_matches(league: &str, filter: &str) -> bool {
    let filter = normalize_text(filter);
    filter.is_empty() || filter == "all" || normalize_text(league).contains(&filter)
}

/// Build a coupon from a feed snapshot: keep upcoming fixtures in the
/// requested league, pick one bet per fixture, rank by safety score and
/// take the top N (N clamped to [1, 12]).
pub fn build_coupon(
    snapshot: &FeedSnapshot,
    size: usize,
    league: &str,
    profile: RiskProfile,
) -> Coupon {
    let size = size.clamp(1, MAX_COUPON_SIZE);
    let now = now_unix();

    let mut candidates: Vec<CouponPick> = snapshot
        .events
        .iter()
        .map(build_match_details)
        .filter(|d| d.summary.is_upcoming(now))
        .filter(|d| league_matches(&d.summary.league, league))
        .filter_map(|d| pick_option(&d, profile))
        .collect();
    candidates.sort_by(|a, b| b.safety_score.total_cmp(&a.safety_score));
    candidates.truncate(size);

    let combined_odds = round3(candidates.iter().map(|p| p.odds).product());
    let average_confidence = if candidates.is_empty() {
        0.0
    } else {
        round1(candidates.iter().map(|p| p.confidence).sum::<f64>() / candidates.len() as f64)
    };

    let warning = if candidates.is_empty() {
        Some("no eligible fixture for this league and risk profile".to_string())
    } else if candidates.len() < size {
        Some(format!(
            "only {} eligible fixture(s), requested {}",
            candidates.len(),
            size
        ))
    } else if profile == RiskProfile::Aggressive {
        Some("aggressive profile: long odds, expect variance".to_string())
    } else {
        None
    };

    Coupon {
        risk_profile: profile,
        requested_size: size,
        picks: candidates,
        combined_odds,
        average_confidence,
        warning,
        generated_at_unix: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::live_feed::{now_unix, select_penalty_events};
    use serde_json::{json, Value};

    fn fixture(id: i64, home: &str, away: &str, start_offset: i64, odds: &[(i64, i64, f64)]) -> Value {
        let markets: Vec<Value> = odds
            .iter()
            .map(|(g, t, c)| json!({"G": g, "T": t, "C": c, "P": 2.5}))
            .collect();
        json!({
            "I": id,
            "SI": 85,
            "L": "FIFA Penalty. World Cup",
            "O1": home,
            "O2": away,
            "S": now_unix() + start_offset,
            "E": markets,
        })
    }

    fn snapshot(events: Vec<Value>) -> FeedSnapshot {
        select_penalty_events(&json!({"Value": events}))
    }

    #[test]
    fn coupon_respects_requested_size() {
        let events: Vec<Value> = (0..6)
            .map(|i| fixture(i, "Arsenal", "Chelsea", 600, &[(17, 9, 1.5), (17, 10, 1.6)]))
            .collect();
        let coupon = build_coupon(&snapshot(events), 3, "all", RiskProfile::Balanced);
        assert_eq!(coupon.picks.len(), 3);
    }

    #[test]
    fn combined_odds_is_the_product() {
        let events = vec![
            fixture(1, "Arsenal", "Chelsea", 600, &[(17, 9, 1.5)]),
            fixture(2, "PSG", "Lyon", 600, &[(17, 9, 1.6)]),
        ];
        let coupon = build_coupon(&snapshot(events), 2, "all", RiskProfile::Balanced);
        assert_eq!(coupon.picks.len(), 2);
        let product: f64 = coupon.picks.iter().map(|p| p.odds).product();
        assert!((coupon.combined_odds - (product * 1000.0).round() / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn safe_profile_keeps_odds_inside_its_band() {
        let events: Vec<Value> = (0..5)
            .map(|i| {
                fixture(
                    i,
                    "Arsenal",
                    "Chelsea",
                    600,
                    &[(17, 9, 1.5), (17, 10, 1.65), (1, 1, 2.4)],
                )
            })
            .collect();
        let coupon = build_coupon(&snapshot(events), 2, "all", RiskProfile::Safe);
        assert_eq!(coupon.picks.len(), 2);
        for pick in &coupon.picks {
            assert!(pick.odds >= 1.2 && pick.odds <= 1.7, "odds {}", pick.odds);
        }
    }

    #[test]
    fn started_fixtures_are_skipped() {
        let events = vec![
            fixture(1, "Arsenal", "Chelsea", -60, &[(17, 9, 1.5)]),
            fixture(2, "PSG", "Lyon", 600, &[(17, 9, 1.6)]),
        ];
        let coupon = build_coupon(&snapshot(events), 5, "all", RiskProfile::Balanced);
        assert_eq!(coupon.picks.len(), 1);
        assert_eq!(coupon.picks[0].match_id, 2);
    }

    #[test]
    fn size_is_clamped_to_the_cap() {
        let events: Vec<Value> = (0..15)
            .map(|i| fixture(i, "Arsenal", "Chelsea", 600, &[(17, 9, 1.5)]))
            .collect();
        let coupon = build_coupon(&snapshot(events), 40, "all", RiskProfile::Balanced);
        assert_eq!(coupon.requested_size, 12);
        assert!(coupon.picks.len() <= 12);
    }

    #[test]
    fn league_filter_is_accent_insensitive() {
        let mut event = fixture(1, "Arsenal", "Chelsea", 600, &[(17, 9, 1.5)]);
        event["L"] = json!("Ligue Pénalty Européenne");
        let coupon = build_coupon(&snapshot(vec![event]), 1, "europeenne", RiskProfile::Balanced);
        assert_eq!(coupon.picks.len(), 1);
    }

    #[test]
    fn fallback_pick_uses_cheapest_in_band_market() {
        // Three long-odds 1x2 lines dominate the analysis top-3 but sit
        // outside the safe band; the short under line is only reachable
        // through the fallback stage.
        let events = vec![fixture(
            1,
            "Foo",
            "Bar",
            600,
            &[(1, 1, 2.6), (1, 2, 2.8), (1, 3, 2.9), (17, 10, 1.25)],
        )];
        let coupon = build_coupon(&snapshot(events), 1, "all", RiskProfile::Safe);
        assert_eq!(coupon.picks.len(), 1);
        assert_eq!(coupon.picks[0].source, "fallback");
        assert!((coupon.picks[0].confidence - 45.0).abs() < 1e-9);
    }
}
