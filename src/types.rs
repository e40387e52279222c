use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Odds formatting / rounding helpers
// ---------------------------------------------------------------------------

/// Display form of a decimal odds value: 3 decimals, or "-" when absent.
pub fn format_odds(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.3}"),
        _ => "-".to_string(),
    }
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

// ---------------------------------------------------------------------------
// Match summary
// ---------------------------------------------------------------------------

/// Live score context for one fixture. Minute comes from the feed's clock
/// string and is 0 when the match has not started.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreContext {
    pub home_goals: u32,
    pub away_goals: u32,
    pub minute: u32,
}

impl ScoreContext {
    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OneXTwoOdds {
    pub home: Option<f64>,
    pub draw: Option<f64>,
    pub away: Option<f64>,
}

/// Simplified view of one raw feed event. Derived per request, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: i64,
    pub team_home: String,
    pub team_away: String,
    pub league: String,
    pub start_time_unix: Option<i64>,
    pub sport_id: Option<i64>,
    pub status_text: String,
    pub info_text: String,
    pub score: ScoreContext,
    pub odds_1x2: OneXTwoOdds,
    pub bet_count: usize,
}

impl MatchSummary {
    /// True while the fixture has not kicked off. Start time is authoritative;
    /// the feed's French status strings act as in-play markers on top.
    pub fn is_upcoming(&self, now_unix: i64) -> bool {
        let started_by_clock = self.start_time_unix.map_or(true, |s| s <= now_unix);
        if started_by_clock {
            return false;
        }
        let info = crate::feed::normalize_text(&self.info_text);
        let status = crate::feed::normalize_text(&self.status_text);
        let in_play = info.contains("mi-temps")
            || info.contains("match termine")
            || status.contains("jeu termine");
        !in_play
    }
}

// ---------------------------------------------------------------------------
// Betting markets
// ---------------------------------------------------------------------------

/// Upstream market code triple. `group`/`bet_type` are the feed's numeric
/// G/T codes; `line` is the handicap/total line when the market carries one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCode {
    pub group: i64,
    pub bet_type: i64,
    pub line: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetKind {
    OneXTwo,
    DoubleChance,
    Handicap,
    TotalGoals,
    TeamTotal,
    BothTeamsScore,
    Other,
}

impl std::fmt::Display for BetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BetKind::OneXTwo => "1x2",
            BetKind::DoubleChance => "double_chance",
            BetKind::Handicap => "handicap",
            BetKind::TotalGoals => "total_goals",
            BetKind::TeamTotal => "team_total",
            BetKind::BothTeamsScore => "both_teams_score",
            BetKind::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl BetKind {
    /// Classify a market by its upstream group code.
    pub fn from_group(group: i64) -> Self {
        match group {
            1 => BetKind::OneXTwo,
            8 => BetKind::DoubleChance,
            2 => BetKind::Handicap,
            17 => BetKind::TotalGoals,
            15 | 62 => BetKind::TeamTotal,
            19 => BetKind::BothTeamsScore,
            _ => BetKind::Other,
        }
    }
}

/// One wagering option with a decimal odds value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetOption {
    pub key: String,
    pub label: String,
    pub odds: f64,
    pub code: MarketCode,
    pub kind: BetKind,
}

impl BetOption {
    /// Over/Under direction for totals markets. T codes 9/11/13 are Over,
    /// 10/12/14 are Under (match + team totals).
    pub fn total_direction(&self) -> Option<TotalDirection> {
        if !matches!(self.kind, BetKind::TotalGoals | BetKind::TeamTotal) {
            return None;
        }
        match self.code.bet_type {
            9 | 11 | 13 => Some(TotalDirection::Over),
            10 | 12 | 14 => Some(TotalDirection::Under),
            _ => None,
        }
    }

    pub fn is_total_over(&self) -> bool {
        self.total_direction() == Some(TotalDirection::Over)
    }

    pub fn is_total_under(&self) -> bool {
        self.total_direction() == Some(TotalDirection::Under)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalDirection {
    Over,
    Under,
}

// ---------------------------------------------------------------------------
// Risk profiles
// ---------------------------------------------------------------------------

/// Coupon risk presets. The bands, floors, anchors and slopes are ported
/// hand-tuned values with no documented derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Safe,
    #[default]
    Balanced,
    Aggressive,
}

#[derive(Debug, Clone, Copy)]
pub struct RiskSettings {
    pub min_odds: f64,
    pub max_odds: f64,
    pub min_confidence: f64,
    /// Penalty per unit of odds distance from the anchor in the safety score.
    pub slope: f64,
    /// Odds value the profile considers ideal.
    pub anchor: f64,
}

impl RiskProfile {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "safe" => RiskProfile::Safe,
            "aggressive" => RiskProfile::Aggressive,
            _ => RiskProfile::Balanced,
        }
    }

    pub fn settings(&self) -> RiskSettings {
        match self {
            RiskProfile::Safe => RiskSettings {
                min_odds: 1.2,
                max_odds: 1.7,
                min_confidence: 62.0,
                slope: 8.0,
                anchor: 1.45,
            },
            RiskProfile::Balanced => RiskSettings {
                min_odds: 1.3,
                max_odds: 2.25,
                min_confidence: 50.0,
                slope: 11.0,
                anchor: 1.7,
            },
            RiskProfile::Aggressive => RiskSettings {
                min_odds: 1.55,
                max_odds: 3.2,
                min_confidence: 45.0,
                slope: 6.0,
                anchor: 2.2,
            },
        }
    }
}

impl std::fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskProfile::Safe => "safe",
            RiskProfile::Balanced => "balanced",
            RiskProfile::Aggressive => "aggressive",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
