//! Assistant endpoint backing the dashboard chat box. Questions go to the
//! Anthropic messages API when a key is configured; on any failure, or
//! with no key at all, a keyword-matched canned answer is returned so the
//! box always responds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::config::{Config, LLM_TIMEOUT_SECS};
use crate::error::Result;
use crate::feed::normalize_text;

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You are the assistant of a virtual FIFA penalty \
betting dashboard. Answer briefly, in the user's language, about penalty \
fixtures, odds, coupons and risk profiles. Never promise winnings.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    /// "llm" when the model answered, "local" for the canned fallback.
    pub source: &'static str,
}

#[derive(Debug, Clone)]
pub struct ChatService {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl ChatService {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key: cfg.anthropic_api_key.clone(),
            model: cfg.anthropic_model.clone(),
        })
    }

    /// Single attempt, no retries. Any error degrades to the local answer.
    pub async fn reply(&self, message: &str) -> ChatReply {
        let key = match &self.api_key {
            Some(key) => key,
            None => return local_reply(message),
        };
        match self.ask_model(key, message).await {
            Ok(reply) => ChatReply { reply, source: "llm" },
            Err(err) => {
                warn!(error = %err, "llm call failed, using local answer");
                local_reply(message)
            }
        }
    }

    async fn ask_model(&self, key: &str, message: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": 512,
            "system": SYSTEM_PROMPT,
            "messages": [{"role": "user", "content": message}],
        });
        let resp = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let value: serde_json::Value = resp.json().await?;

        let text = value
            .get("content")
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(crate::error::AppError::Upstream(
                "model returned no text block".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Keyword-matched canned answers. Keywords are checked against the
/// accent-folded lowercase message, so French questions match too.
fn local_reply(message: &str) -> ChatReply {
    let text = normalize_text(message);
    let reply = if text.contains("coupon") || text.contains("ticket") {
        "Open the coupon page and pick a size and risk profile; the system \
         selects the safest bets from the live penalty fixtures."
    } else if text.contains("risk") || text.contains("risque") || text.contains("profil") {
        "Three profiles are available: safe (odds 1.2-1.7), balanced \
         (1.3-2.25) and aggressive (1.55-3.2). Safe favours short odds and \
         high confidence."
    } else if text.contains("bot") || text.contains("prediction") || text.contains("pronostic") {
        "Five scoring bots rate every market and a consensus pick is built \
         from their votes. Confidence stays between 5 and 95."
    } else if text.contains("cote") || text.contains("odd") {
        "Bets are only scored when their odds sit between 1.399 and 3.0; \
         anything outside that band is ignored."
    } else if text.contains("valide") || text.contains("valid") {
        "Use the ticket validation to re-check each leg against the live \
         feed: started matches, missing markets and odds drift above 6% are \
         flagged."
    } else {
        "I can help with penalty fixtures, odds, coupons, risk profiles and \
         ticket validation. Ask me about one of those."
    };
    ChatReply { reply: reply.to_string(), source: "local" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_answers_without_a_key() {
        let reply = local_reply("how does the coupon work?");
        assert_eq!(reply.source, "local");
        assert!(reply.reply.contains("coupon"));
    }

    #[test]
    fn fallback_matches_accented_french() {
        let reply = local_reply("c'est quoi le profil de risque ?");
        assert!(reply.reply.contains("safe"));
    }

    #[test]
    fn unknown_topic_gets_the_generic_answer() {
        let reply = local_reply("what is the weather?");
        assert!(reply.reply.contains("I can help"));
    }
}
