pub mod analysis;
pub mod bots;
pub mod consensus;

use serde::Serialize;

pub use analysis::AdvancedAnalysis;
pub use bots::{BotReport, ScoredBet};
pub use consensus::ConsensusReport;

use crate::config::{VALID_ODDS_MAX, VALID_ODDS_MIN};
use crate::feed::live_feed::now_unix;
use crate::types::{BetOption, ScoreContext};

/// Everything the scoring functions look at for one fixture.
pub struct PredictionInput<'a> {
    pub team_home: &'a str,
    pub team_away: &'a str,
    pub league: &'a str,
    pub score: ScoreContext,
    pub bets: &'a [BetOption],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionMeta {
    pub generated_at_unix: i64,
    pub teams: String,
    pub league: String,
    pub score: ScoreContext,
    pub bets_analyzed: usize,
    pub valid_odds_range: String,
}

/// Per-request prediction bundle: the individual bot reports, the merged
/// master pick, and the ranked analysis list. Never cached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionBundle {
    pub meta: PredictionMeta,
    pub bots: Vec<BotReport>,
    pub master: ConsensusReport,
    pub analysis: AdvancedAnalysis,
}

pub fn predict(input: &PredictionInput<'_>) -> PredictionBundle {
    let bots = bots::run_bots(input);
    let master = consensus::merge(&bots, input);
    let analysis = analysis::analyze(input);

    PredictionBundle {
        meta: PredictionMeta {
            generated_at_unix: now_unix(),
            teams: format!("{} vs {}", input.team_home, input.team_away),
            league: input.league.to_string(),
            score: input.score,
            bets_analyzed: input.bets.len(),
            valid_odds_range: format!("{VALID_ODDS_MIN} - {VALID_ODDS_MAX}"),
        },
        bots,
        master,
        analysis,
    }
}
