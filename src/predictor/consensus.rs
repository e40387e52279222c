//! Merges the bot reports into one "master" pick: the bet label most bots
//! independently landed on, weighted against the bots' own confidence.

use std::collections::HashMap;

use serde::Serialize;

use crate::predictor::bots::{BotReport, ScoredBet};
use crate::predictor::PredictionInput;
use crate::types::{round1, BetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    StrongStake,
    RecommendedStake,
    ModerateStake,
    CautiousStake,
    Avoid,
    NoBet,
}

impl Action {
    fn from_confidence(confidence: f64) -> (Self, &'static str) {
        if confidence >= 80.0 {
            (Action::StrongStake, "very high")
        } else if confidence >= 70.0 {
            (Action::RecommendedStake, "high")
        } else if confidence >= 60.0 {
            (Action::ModerateStake, "moderate")
        } else if confidence >= 50.0 {
            (Action::CautiousStake, "low")
        } else {
            (Action::Avoid, "very low")
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<BetKind>,
    pub confidence: f64,
    pub confidence_level: &'static str,
    pub teams: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSummary {
    pub consulted: usize,
    pub agreeing: usize,
    pub consensus: String,
    pub supporters: Vec<&'static str>,
    /// Mean confidence of the agreeing bots' votes for the chosen label.
    pub pick_confidence: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusReport {
    pub decision: Decision,
    pub bot_summary: BotSummary,
}

fn no_bet(input: &PredictionInput<'_>, reason: &str) -> ConsensusReport {
    ConsensusReport {
        decision: Decision {
            action: Action::NoBet,
            bet_label: None,
            odds: None,
            kind: None,
            confidence: 0.0,
            confidence_level: "none",
            teams: format!("{} vs {}", input.team_home, input.team_away),
            reason: Some(reason.to_string()),
        },
        bot_summary: BotSummary {
            consulted: 0,
            agreeing: 0,
            consensus: "none".to_string(),
            supporters: Vec::new(),
            pick_confidence: 0.0,
        },
    }
}

/// Majority vote over bet labels. Global confidence is 60% consensus
/// fraction (capped at 90 before weighting) + 40% mean bot confidence,
/// so agreement counts more than how sure any single bot says it is.
pub fn merge(reports: &[BotReport], input: &PredictionInput<'_>) -> ConsensusReport {
    let consulted: Vec<&BotReport> = reports.iter().filter(|r| !r.picks.is_empty()).collect();
    if consulted.is_empty() {
        return no_bet(input, "no bet inside the valid odds band convinced any bot");
    }

    // label → votes (bot name + the pick it cast)
    let mut votes: HashMap<&str, Vec<(&'static str, &ScoredBet)>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for report in &consulted {
        for pick in &report.picks {
            let entry = votes.entry(pick.label.as_str()).or_default();
            if entry.is_empty() {
                order.push(pick.label.as_str());
            }
            entry.push((report.name, pick));
        }
    }

    // Most-voted label; first-seen wins ties so output is deterministic.
    let mut chosen: Option<&str> = None;
    for &label in &order {
        if chosen.map_or(true, |c| votes[label].len() > votes[c].len()) {
            chosen = Some(label);
        }
    }
    let chosen = match chosen {
        Some(label) => label,
        None => return no_bet(input, "bots produced no usable picks"),
    };
    let supporters = &votes[chosen];

    let nb_bots = consulted.len();
    let consensus_confidence = ((supporters.len() as f64 / nb_bots as f64) * 100.0).min(90.0);
    let mean_bot_confidence =
        consulted.iter().map(|r| r.top_confidence).sum::<f64>() / nb_bots as f64;
    let global = consensus_confidence * 0.6 + mean_bot_confidence * 0.4;
    let pick_confidence =
        supporters.iter().map(|(_, p)| p.confidence).sum::<f64>() / supporters.len() as f64;

    let best_vote = match supporters
        .iter()
        .max_by(|a, b| a.1.confidence.total_cmp(&b.1.confidence))
    {
        Some((_, pick)) => *pick,
        None => return no_bet(input, "bots produced no usable picks"),
    };

    let (action, confidence_level) = Action::from_confidence(global);

    ConsensusReport {
        decision: Decision {
            action,
            bet_label: Some(chosen.to_string()),
            odds: Some(best_vote.odds),
            kind: Some(best_vote.kind),
            confidence: round1(global),
            confidence_level,
            teams: format!("{} vs {}", input.team_home, input.team_away),
            reason: None,
        },
        bot_summary: BotSummary {
            consulted: nb_bots,
            agreeing: supporters.len(),
            consensus: format!("{}/{} bots", supporters.len(), nb_bots),
            supporters: supporters.iter().map(|(name, _)| *name).collect(),
            pick_confidence: round1(pick_confidence),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreContext;

    fn pick(label: &str, odds: f64, confidence: f64, source: &'static str) -> ScoredBet {
        ScoredBet {
            label: label.to_string(),
            odds,
            confidence,
            kind: BetKind::TotalGoals,
            value: None,
            source,
        }
    }

    fn report(name: &'static str, picks: Vec<ScoredBet>) -> BotReport {
        let top_confidence = picks.iter().map(|p| p.confidence).fold(0.0, f64::max);
        BotReport { name, specialty: "test", picks, top_confidence }
    }

    fn input() -> PredictionInput<'static> {
        PredictionInput {
            team_home: "Arsenal",
            team_away: "Chelsea",
            league: "FIFA Penalty League",
            score: ScoreContext::default(),
            bets: &[],
        }
    }

    #[test]
    fn empty_reports_produce_no_bet() {
        let out = merge(&[], &input());
        assert_eq!(out.decision.action, Action::NoBet);
        assert_eq!(out.bot_summary.consulted, 0);
    }

    #[test]
    fn unanimous_bots_reach_strong_action() {
        let names: [&'static str; 5] = ["a", "b", "c", "d", "e"];
        let reports: Vec<BotReport> = names
            .iter()
            .map(|n| report(n, vec![pick("Over 2.5 goals", 1.8, 80.0, n)]))
            .collect();
        let out = merge(&reports, &input());
        assert_eq!(out.bot_summary.agreeing, out.bot_summary.consulted);
        // 90 * 0.6 + 80 * 0.4 = 86 → strong tier
        assert_eq!(out.decision.action, Action::StrongStake);
        assert!((out.decision.confidence - 86.0).abs() < 1e-9);
    }

    #[test]
    fn majority_label_wins() {
        let reports = vec![
            report("a", vec![pick("Over 2.5 goals", 1.8, 70.0, "a")]),
            report("b", vec![pick("Over 2.5 goals", 1.8, 65.0, "b")]),
            report("c", vec![pick("Under 2.5 goals", 2.0, 90.0, "c")]),
        ];
        let out = merge(&reports, &input());
        assert_eq!(out.decision.bet_label.as_deref(), Some("Over 2.5 goals"));
        assert_eq!(out.bot_summary.agreeing, 2);
        assert_eq!(out.bot_summary.consensus, "2/3 bots");
    }

    #[test]
    fn best_vote_supplies_the_odds() {
        let reports = vec![
            report("a", vec![pick("Over 2.5 goals", 1.8, 60.0, "a")]),
            report("b", vec![pick("Over 2.5 goals", 1.85, 75.0, "b")]),
        ];
        let out = merge(&reports, &input());
        assert_eq!(out.decision.odds, Some(1.85));
    }

    #[test]
    fn bots_with_no_picks_are_not_consulted() {
        let reports = vec![
            report("a", vec![pick("X - Draw", 2.1, 66.0, "a")]),
            report("b", Vec::new()),
        ];
        let out = merge(&reports, &input());
        assert_eq!(out.bot_summary.consulted, 1);
    }
}
