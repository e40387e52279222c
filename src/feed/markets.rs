use std::collections::HashSet;

use serde_json::Value;

use crate::types::{BetKind, BetOption, MarketCode};

/// Display form of a handicap/total line: integers without decimals,
/// half-lines with one.
fn format_line(line: Option<f64>) -> String {
    match line {
        Some(v) if v.is_finite() => {
            if v.fract() == 0.0 {
                format!("{}", v as i64)
            } else {
                format!("{v:.1}")
            }
        }
        _ => String::new(),
    }
}

/// Human-readable label for an upstream (G, T, line) market code.
/// Unrecognized codes fall through to a raw "Market G/T" label so the
/// option still shows up instead of being silently dropped.
pub fn bet_label(code: &MarketCode, home: &str, away: &str) -> String {
    let line = format_line(code.line);
    let line_or = |fallback: &str| if line.is_empty() { fallback.to_string() } else { line.clone() };

    match (code.group, code.bet_type) {
        (1, 1) => format!("1 - {home} to win"),
        (1, 2) => "X - Draw".to_string(),
        (1, 3) => format!("2 - {away} to win"),

        (8, 4) => format!("1X - {home} or draw"),
        (8, 5) => "12 - No draw".to_string(),
        (8, 6) => format!("X2 - {away} or draw"),

        (2, 7) => format!("Handicap {home} ({})", line_or("0")),
        (2, 8) => format!("Handicap {away} ({})", line_or("0")),

        (17, 9) => format!("Over {} goals", line_or("?")),
        (17, 10) => format!("Under {} goals", line_or("?")),

        (15, 11) => format!("{home} total - Over {}", line_or("?")),
        (15, 12) => format!("{home} total - Under {}", line_or("?")),

        (62, 13) => format!("{away} total - Over {}", line_or("?")),
        (62, 14) => format!("{away} total - Under {}", line_or("?")),

        (19, 180) => "Both teams to score - Yes".to_string(),
        (19, 181) => "Both teams to score - No".to_string(),

        (g, t) => {
            if line.is_empty() {
                format!("Market {g}/{t}")
            } else {
                format!("Market {g}/{t} ({line})")
            }
        }
    }
}

fn market_rows(event: &Value) -> Vec<&Value> {
    let direct = event
        .get("E")
        .and_then(|e| e.as_array())
        .map(|a| a.iter().collect::<Vec<_>>())
        .unwrap_or_default();

    // Alternative market groups live under AE[].ME.
    let alternative = event
        .get("AE")
        .and_then(|a| a.as_array())
        .map(|groups| {
            groups
                .iter()
                .filter_map(|g| g.get("ME").and_then(|me| me.as_array()))
                .flatten()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    direct.into_iter().chain(alternative).collect()
}

/// Extract every usable betting market from a raw event: both the direct
/// `E` list and the alternative `AE[].ME` groups, deduplicated by
/// (group, type, line, odds). Rows with odds <= 1 are unusable and skipped.
pub fn extract_bets(event: &Value) -> Vec<BetOption> {
    let home = event.get("O1").and_then(|v| v.as_str()).unwrap_or("Team 1");
    let away = event.get("O2").and_then(|v| v.as_str()).unwrap_or("Team 2");

    let mut seen: HashSet<String> = HashSet::new();
    let mut bets = Vec::new();

    for row in market_rows(event) {
        let group = match row.get("G").and_then(|v| v.as_i64()) {
            Some(g) => g,
            None => continue,
        };
        let bet_type = match row.get("T").and_then(|v| v.as_i64()) {
            Some(t) => t,
            None => continue,
        };
        let odds = match row.get("C").and_then(|v| v.as_f64()) {
            Some(c) if c > 1.0 => c,
            _ => continue,
        };
        let line = row.get("P").and_then(|v| v.as_f64()).filter(|p| p.is_finite());

        let key = format!(
            "{group}-{bet_type}-{}-{odds}",
            line.map(|l| l.to_string()).unwrap_or_else(|| "na".to_string())
        );
        if !seen.insert(key.clone()) {
            continue;
        }

        let code = MarketCode { group, bet_type, line };
        bets.push(BetOption {
            key,
            label: bet_label(&code, home, away),
            odds,
            code,
            kind: BetKind::from_group(group),
        });
    }

    bets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_with_markets() -> Value {
        json!({
            "O1": "Arsenal",
            "O2": "Chelsea",
            "E": [
                { "G": 1, "T": 1, "C": 1.85 },
                { "G": 1, "T": 2, "C": 3.4 },
                { "G": 1, "T": 3, "C": 2.1 },
                { "G": 17, "T": 9, "P": 2.5, "C": 1.72 },
                // duplicate of the row above, must be collapsed
                { "G": 17, "T": 9, "P": 2.5, "C": 1.72 },
                // odds <= 1 is unusable
                { "G": 17, "T": 10, "P": 2.5, "C": 1.0 },
            ],
            "AE": [
                { "ME": [ { "G": 2, "T": 7, "P": -1.5, "C": 2.4 } ] }
            ]
        })
    }

    #[test]
    fn extracts_direct_and_alternative_markets() {
        let bets = extract_bets(&event_with_markets());
        assert_eq!(bets.len(), 5);
        assert!(bets.iter().any(|b| b.code.group == 2 && b.code.bet_type == 7));
    }

    #[test]
    fn duplicate_and_unusable_rows_are_dropped() {
        let bets = extract_bets(&event_with_markets());
        let over_rows: Vec<_> = bets.iter().filter(|b| b.code.group == 17).collect();
        assert_eq!(over_rows.len(), 1);
        assert!(bets.iter().all(|b| b.odds > 1.0));
    }

    #[test]
    fn labels_use_team_names() {
        let bets = extract_bets(&event_with_markets());
        assert_eq!(bets[0].label, "1 - Arsenal to win");
        let over = bets.iter().find(|b| b.code.group == 17).unwrap();
        assert_eq!(over.label, "Over 2.5 goals");
        let handicap = bets.iter().find(|b| b.code.group == 2).unwrap();
        assert_eq!(handicap.label, "Handicap Arsenal (-1.5)");
    }

    #[test]
    fn unknown_code_gets_raw_label() {
        let code = MarketCode { group: 33, bet_type: 7, line: Some(4.0) };
        assert_eq!(bet_label(&code, "A", "B"), "Market 33/7 (4)");
    }

    #[test]
    fn integer_lines_render_without_decimals() {
        let code = MarketCode { group: 17, bet_type: 9, line: Some(3.0) };
        assert_eq!(bet_label(&code, "A", "B"), "Over 3 goals");
    }
}
