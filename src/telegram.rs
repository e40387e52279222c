//! Thin Telegram Bot API client used to push coupon tickets to a chat.
//! Configured entirely from the environment; when the token or chat id is
//! missing the API route reports that instead of the process failing.

use std::time::Duration;

use serde_json::json;

use crate::config::{Config, TELEGRAM_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::format_odds;

#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    token: String,
    chat_id: i64,
}

impl TelegramClient {
    /// None when the bot token or chat id is not configured.
    pub fn from_config(cfg: &Config) -> Result<Option<Self>> {
        let (token, chat_id) = match (&cfg.telegram_bot_token, cfg.telegram_chat_id) {
            (Some(token), Some(chat_id)) => (token.clone(), chat_id),
            _ => return Ok(None),
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_TIMEOUT_SECS))
            .build()?;
        Ok(Some(Self { client, token, chat_id }))
    }

    fn url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    pub async fn send_message(&self, text: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.url("sendMessage"))
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Telegram(format!(
                "sendMessage failed: {status} {body}"
            )));
        }
        Ok(())
    }

    /// Upload a file (the PDF or SVG ticket) as a document attachment.
    pub async fn send_document(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| AppError::Telegram(format!("bad mime type {mime}: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .part("document", part);

        let resp = self
            .client
            .post(self.url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Telegram(format!(
                "sendDocument failed: {status} {body}"
            )));
        }
        Ok(())
    }
}

/// HTML-formatted ticket summary for the chat message body.
pub fn coupon_message(coupon: &crate::coupon::Coupon) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<b>Penalty coupon</b> ({} profile)\n",
        coupon.risk_profile
    ));
    for (i, pick) in coupon.picks.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} | {} @ {} (conf {:.0})\n",
            i + 1,
            escape_html(&pick.teams),
            escape_html(&pick.bet_label),
            format_odds(Some(pick.odds)),
            pick.confidence,
        ));
    }
    out.push_str(&format!(
        "Combined odds: <b>{:.3}</b> | Avg confidence: {:.1}",
        coupon.combined_odds, coupon.average_confidence
    ));
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetKind, RiskProfile};

    #[test]
    fn message_contains_picks_and_totals() {
        let coupon = crate::coupon::Coupon {
            risk_profile: RiskProfile::Safe,
            requested_size: 1,
            picks: vec![crate::coupon::CouponPick {
                match_id: 1,
                teams: "Arsenal vs Chelsea".to_string(),
                league: "FIFA Penalty".to_string(),
                start_time_unix: None,
                bet_label: "Over 2.5 goals".to_string(),
                odds: 1.5,
                confidence: 70.0,
                safety_score: 69.6,
                kind: BetKind::TotalGoals,
                source: "master".to_string(),
            }],
            combined_odds: 1.5,
            average_confidence: 70.0,
            warning: None,
            generated_at_unix: 0,
        };
        let msg = coupon_message(&coupon);
        assert!(msg.contains("Arsenal vs Chelsea"));
        assert!(msg.contains("1.500"));
        assert!(msg.contains("safe"));
    }

    #[test]
    fn html_metacharacters_are_escaped() {
        assert_eq!(escape_html("A <B> & C"), "A &lt;B&gt; &amp; C");
    }
}
