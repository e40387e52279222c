//! Ranked per-bet analysis: five 0-100 context factors averaged into a
//! composite score, compared against the odds-implied probability to get a
//! value/gain estimate. Runs over every market, not just the bots' band.

use serde::Serialize;

use crate::feed::normalize_text;
use crate::predictor::PredictionInput;
use crate::types::{round1, round2, BetOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongStake,
    RecommendedStake,
    ModerateStake,
    CautiousStake,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedBet {
    pub label: String,
    pub odds: f64,
    pub composite_score: f64,
    /// Composite expressed as an estimated win probability, percent.
    pub estimated_probability: f64,
    /// Edge over the implied probability, percent. Negative = overpriced.
    pub value: f64,
    pub gain_potential: f64,
    pub recommendation: Recommendation,
    pub risk: RiskTier,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub analyzed: usize,
    pub mean_composite: f64,
    pub positive_value_count: usize,
    pub total_gain_potential: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedAnalysis {
    /// Every market, best gain potential first.
    pub items: Vec<AnalyzedBet>,
    pub top_recommendations: Vec<AnalyzedBet>,
    pub stats: AnalysisStats,
}

fn analyze_bet(bet: &BetOption, input: &PredictionInput<'_>) -> AnalyzedBet {
    let total = input.score.total_goals();
    let minute = input.score.minute;
    let league = normalize_text(input.league);

    // Score context, strongest signal on the classic over-2.5 line.
    let mut context = 50.0;
    if bet.is_total_over() && bet.code.line == Some(2.5) {
        if total >= 3 {
            context = 95.0;
        } else if total == 2 && minute < 70 {
            context = 80.0;
        } else if total == 0 && minute > 60 {
            context = 25.0;
        }
    }

    // Late-game trend.
    let mut trend = 50.0;
    if minute > 75 && bet.is_total_over() {
        trend += 20.0;
    }
    if minute > 75 && bet.is_total_under() {
        trend += 15.0;
    }

    // Team profile.
    let mut team = 50.0;
    let offensive = ["arsenal", "manchester city", "psg", "real madrid", "barcelona", "liverpool"];
    let home = normalize_text(input.team_home);
    let away = normalize_text(input.team_away);
    if offensive.iter().any(|t| home.contains(t) || away.contains(t)) {
        team += 12.0;
    }

    // League profile.
    let mut league_score = 50.0;
    if league.contains("bundesliga") && bet.is_total_over() {
        league_score += 15.0;
    }

    // Momentum.
    let mut momentum = 50.0;
    if total >= 2 && minute < 60 && bet.is_total_over() {
        momentum += 20.0;
    }
    if total == 0 && minute > 45 && bet.is_total_under() {
        momentum += 15.0;
    }

    let composite = (context + trend + team + league_score + momentum) / 5.0;
    let estimated_probability = composite / 100.0;
    let implied_probability = 1.0 / bet.odds.max(0.01);
    let value = ((estimated_probability - implied_probability) / implied_probability) * 100.0;
    let gain_potential = if value > 0.0 { value * (bet.odds - 1.0) } else { 0.0 };

    let recommendation = if composite >= 80.0 && value > 15.0 {
        Recommendation::StrongStake
    } else if composite >= 70.0 && value > 10.0 {
        Recommendation::RecommendedStake
    } else if composite >= 60.0 && value > 5.0 {
        Recommendation::ModerateStake
    } else if composite >= 50.0 {
        Recommendation::CautiousStake
    } else {
        Recommendation::Avoid
    };

    let risk = if composite >= 75.0 && bet.odds < 2.5 {
        RiskTier::Low
    } else if composite >= 60.0 {
        RiskTier::Moderate
    } else {
        RiskTier::High
    };

    AnalyzedBet {
        label: bet.label.clone(),
        odds: bet.odds,
        composite_score: round1(composite),
        estimated_probability: round1(estimated_probability * 100.0),
        value: round2(value),
        gain_potential: round2(gain_potential),
        recommendation,
        risk,
    }
}

pub fn analyze(input: &PredictionInput<'_>) -> AdvancedAnalysis {
    let mut items: Vec<AnalyzedBet> =
        input.bets.iter().map(|b| analyze_bet(b, input)).collect();
    items.sort_by(|a, b| b.gain_potential.total_cmp(&a.gain_potential));

    let analyzed = items.len();
    let mean_composite = if analyzed == 0 {
        0.0
    } else {
        round1(items.iter().map(|i| i.composite_score).sum::<f64>() / analyzed as f64)
    };
    let positive_value_count = items.iter().filter(|i| i.value > 0.0).count();
    let total_gain_potential = round2(items.iter().map(|i| i.gain_potential).sum());

    let top_recommendations = items.iter().take(3).cloned().collect();

    AdvancedAnalysis {
        items,
        top_recommendations,
        stats: AnalysisStats { analyzed, mean_composite, positive_value_count, total_gain_potential },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetKind, MarketCode, ScoreContext};

    fn over25(odds: f64) -> BetOption {
        BetOption {
            key: "17-9".into(),
            label: "Over 2.5 goals".into(),
            odds,
            code: MarketCode { group: 17, bet_type: 9, line: Some(2.5) },
            kind: BetKind::TotalGoals,
        }
    }

    fn input(bets: &[BetOption], score: ScoreContext) -> PredictionInput<'_> {
        PredictionInput {
            team_home: "Arsenal",
            team_away: "Chelsea",
            league: "Bundesliga virtuelle",
            score,
            bets,
        }
    }

    #[test]
    fn hot_over_line_scores_high_composite() {
        let bets = vec![over25(1.8)];
        let score = ScoreContext { home_goals: 2, away_goals: 1, minute: 40 };
        let out = analyze(&input(&bets, score));
        // context 95, team +12, league +15, momentum +20 all firing
        assert!(out.items[0].composite_score >= 75.0, "{}", out.items[0].composite_score);
        assert_eq!(out.items[0].risk, RiskTier::Low);
    }

    #[test]
    fn no_gain_potential_without_positive_value() {
        // Dead match, short odds: implied probability far above composite.
        let bets = vec![over25(1.2)];
        let score = ScoreContext { home_goals: 0, away_goals: 0, minute: 65 };
        let out = analyze(&input(&bets, score));
        assert!(out.items[0].value < 0.0);
        assert_eq!(out.items[0].gain_potential, 0.0);
    }

    #[test]
    fn top_recommendations_capped_at_three() {
        let bets: Vec<BetOption> = (0..5).map(|i| over25(1.5 + 0.1 * i as f64)).collect();
        let out = analyze(&input(&bets, ScoreContext::default()));
        assert_eq!(out.top_recommendations.len(), 3);
        assert_eq!(out.stats.analyzed, 5);
    }

    #[test]
    fn items_sorted_by_gain_potential() {
        let bets = vec![over25(1.4), over25(2.8)];
        let score = ScoreContext { home_goals: 3, away_goals: 0, minute: 50 };
        let out = analyze(&input(&bets, score));
        assert!(out.items[0].gain_potential >= out.items[1].gain_potential);
    }

    #[test]
    fn empty_market_list_yields_empty_stats() {
        let out = analyze(&input(&[], ScoreContext::default()));
        assert_eq!(out.stats.analyzed, 0);
        assert_eq!(out.stats.mean_composite, 0.0);
        assert!(out.top_recommendations.is_empty());
    }
}
