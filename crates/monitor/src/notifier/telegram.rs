//! Telegram Bot API notifier.
//!
//! Sends plain-text messages via `POST /bot<token>/sendMessage` and checks
//! reachability via `GET /bot<token>/getMe`.
//!
//! The bot token is part of every request URL, so errors are stripped of
//! their URL before they are surfaced and the token never reaches the logs.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use logbell_core::config::TelegramConfig;

use super::{Notifier, NotifierError};

/// Maximum number of response-body characters kept in a [`NotifierError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Subset of the `User` object returned by `getMe`.
#[derive(Debug, Deserialize)]
struct BotUser {
    #[serde(default)]
    username: Option<String>,
}

/// Telegram notification channel.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    send_timeout: Duration,
    probe_timeout: Duration,
}

impl TelegramNotifier {
    /// Creates a notifier from the `telegram` configuration section.
    ///
    /// # Errors
    ///
    /// Returns `NotifierError::Transport` if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .user_agent(concat!("logbell/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifierError::Transport(e.without_url().to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            send_timeout: Duration::from_secs(config.send_timeout_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        })
    }

    /// Target chat ID.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("send_timeout", &self.send_timeout)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn probe(&self) -> Result<String, NotifierError> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Status {
                status: status.as_u16(),
                body: shorten(&body),
            });
        }

        let body: ApiResponse<BotUser> = response
            .json()
            .await
            .map_err(|e| NotifierError::Decode(e.without_url().to_string()))?;

        if !body.ok {
            return Err(NotifierError::Api(
                body.description
                    .unwrap_or_else(|| "getMe returned ok=false".to_owned()),
            ));
        }

        Ok(body
            .result
            .and_then(|user| user.username)
            .unwrap_or_else(|| "unknown".to_owned()))
    }

    async fn deliver(&self, message: &str) -> Result<(), NotifierError> {
        // plain text: parse_mode를 지정하지 않음
        let payload = json!({
            "chat_id": self.chat_id,
            "text": message,
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.send_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(
            status = status.as_u16(),
            body = %shorten(&body),
            "telegram sendMessage rejected"
        );
        Err(NotifierError::Status {
            status: status.as_u16(),
            body: shorten(&body),
        })
    }
}

fn map_request_error(err: reqwest::Error) -> NotifierError {
    if err.is_timeout() {
        NotifierError::Timeout
    } else {
        NotifierError::Transport(err.without_url().to_string())
    }
}

fn shorten(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_owned();
    }
    let mut short: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    short.push_str("...");
    short
}
