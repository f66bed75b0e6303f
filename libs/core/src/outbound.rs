//! Outbound message model and the Slack Web API sender.

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;

use crate::blocks::{Block, BlockError};

/// A structured message bound for one channel.
///
/// `text` is the fallback rendering for block-incapable clients and is
/// required to be non-empty at construction, so a block-bearing message can
/// never ship without one.
#[derive(Debug, Clone, PartialEq)]
pub struct OutMessage {
    pub channel: String,
    pub text: String,
    pub blocks: Vec<Block>,
    pub thread_ts: Option<String>,
}

impl OutMessage {
    pub fn new(
        channel: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Result<Self, BlockError> {
        let text = fallback.into();
        if text.is_empty() {
            return Err(BlockError::EmptyFallback);
        }
        Ok(Self {
            channel: channel.into(),
            text,
            blocks: Vec::new(),
            thread_ts: None,
        })
    }

    pub fn push_block(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Threads the message under an existing conversation timestamp.
    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }

    /// The `chat.postMessage` request body.
    pub fn payload(&self) -> Value {
        let mut payload = json!({
            "channel": self.channel,
            "text": self.text,
        });
        let object = payload.as_object_mut().expect("payload is an object");
        if !self.blocks.is_empty() {
            object.insert("blocks".into(), json!(self.blocks));
        }
        if let Some(ts) = &self.thread_ts {
            object.insert("thread_ts".into(), json!(ts));
        }
        payload
    }
}

/// Where the platform accepted the message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SendResult {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("slack transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("slack api returned status {status}")]
    Status { status: u16 },
    #[error("slack api error: {code}")]
    Api { code: String },
}

/// The seam between the dispatcher and the platform API. Must be safe for
/// concurrent use; implementations hold their own connection pooling.
#[async_trait]
pub trait MessagePoster: Send + Sync {
    async fn post_message(&self, msg: &OutMessage) -> Result<SendResult, SendError>;
}

/// Posts messages through the Slack Web API with bot-token auth.
pub struct SlackSender {
    http: reqwest::Client,
    bot_token: String,
    api_base: String,
}

impl SlackSender {
    /// `api_base` defaults to the public Slack API; a `mock://` base
    /// short-circuits the network for tests.
    pub fn new(
        http: reqwest::Client,
        bot_token: impl Into<String>,
        api_base: Option<String>,
    ) -> Self {
        Self {
            http,
            bot_token: bot_token.into(),
            api_base: api_base.unwrap_or_else(|| "https://slack.com/api".into()),
        }
    }

    fn build_url(&self, method: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            method.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl MessagePoster for SlackSender {
    async fn post_message(&self, msg: &OutMessage) -> Result<SendResult, SendError> {
        if self.api_base.starts_with("mock://") {
            return Ok(SendResult {
                channel: msg.channel.clone(),
                ts: "0000000000.000000".into(),
            });
        }

        let response = self
            .http
            .post(self.build_url("chat.postMessage"))
            .bearer_auth(&self.bot_token)
            .json(&msg.payload())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status {
                status: status.as_u16(),
            });
        }

        let raw: Value = response.json().await?;
        let ok = raw.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if !ok {
            let code = raw
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            return Err(SendError::Api { code });
        }

        Ok(SendResult {
            channel: raw
                .get("channel")
                .and_then(Value::as_str)
                .unwrap_or(&msg.channel)
                .to_string(),
            ts: raw
                .get("ts")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}
