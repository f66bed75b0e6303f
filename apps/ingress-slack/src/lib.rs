//! Slack Events API webhook service.
//!
//! Exposes `/events-endpoint` for event deliveries and `/actions` for
//! interactive callbacks. Every request is signature-verified before its body
//! is interpreted; mentions are answered with a block document posted back to
//! the mentioning channel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use hellobot_core::{
    AppMention, Block, ContextElement, Envelope, InnerEvent, MessagePoster, OutMessage,
    SendResult, SignatureError, TextObject, parse_event, parse_interaction, signature,
};
use time::OffsetDateTime;

const GREETING: &str = "Yes, hello.";
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;

/// Process configuration, read once at startup. Missing credentials are a
/// fatal startup condition, never a per-request error.
#[derive(Debug)]
pub struct Config {
    pub signing_secret: String,
    pub bot_token: String,
    pub bind: SocketAddr,
    pub api_base: Option<String>,
    pub send_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let signing_secret =
            std::env::var("SLACK_SIGNING_SECRET").context("SLACK_SIGNING_SECRET required")?;
        let bot_token = std::env::var("SLACK_BOT_TOKEN").context("SLACK_BOT_TOKEN required")?;
        let bind = std::env::var("BIND")
            .unwrap_or_else(|_| "0.0.0.0:3000".into())
            .parse()
            .context("invalid BIND address")?;
        let api_base = std::env::var("SLACK_API_BASE").ok();
        let send_timeout = match std::env::var("SEND_TIMEOUT_SECS") {
            Ok(value) => {
                Duration::from_secs(value.parse().context("invalid SEND_TIMEOUT_SECS")?)
            }
            Err(_) => Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
        };
        Ok(Self {
            signing_secret,
            bot_token,
            bind,
            api_base,
            send_timeout,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    signing_secret: String,
    poster: Arc<dyn MessagePoster>,
}

impl AppState {
    pub fn new(signing_secret: impl Into<String>, poster: Arc<dyn MessagePoster>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            poster,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events-endpoint", post(handle_events))
        .route("/actions", post(handle_actions))
        .with_state(state)
}

async fn handle_events(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(err) = verify_request(&state.signing_secret, &headers, &body) {
        tracing::warn!(error = %err, "rejected slack delivery");
        return StatusCode::FORBIDDEN.into_response();
    }

    let envelope = match parse_event(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::error!(error = %err, "failed to parse event envelope");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match envelope {
        // Endpoint handshake; never reaches the dispatcher.
        Envelope::UrlVerification { challenge } => (StatusCode::OK, challenge).into_response(),
        Envelope::EventCallback { event } => {
            dispatch_event(&state, event);
            StatusCode::OK.into_response()
        }
    }
}

async fn handle_actions(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(err) = verify_request(&state.signing_secret, &headers, &body) {
        tracing::warn!(error = %err, "rejected slack interaction");
        return StatusCode::FORBIDDEN.into_response();
    }

    match parse_interaction(&body) {
        Ok(interaction) => {
            tracing::info!(
                kind = interaction.kind().unwrap_or("unknown"),
                user = interaction.user().unwrap_or("unknown"),
                "received interaction payload"
            );
            StatusCode::OK.into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to parse interaction payload");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Extracts the signing headers and runs the core verifier against the
/// current clock.
pub fn verify_request(
    secret: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), SignatureError> {
    let timestamp = headers
        .get(signature::TIMESTAMP_HEADER)
        .ok_or(SignatureError::MissingHeader)?
        .to_str()
        .map_err(|_| SignatureError::MalformedTimestamp)?;
    let provided = headers
        .get(signature::SIGNATURE_HEADER)
        .ok_or(SignatureError::MissingHeader)?
        .to_str()
        .map_err(|_| SignatureError::MalformedSignature)?;
    signature::verify(secret, timestamp, provided, body, OffsetDateTime::now_utc())
}

/// Routes a callback event. Replies are fire-and-forget: the inbound ack is
/// already committed, so a slow or failing send can only ever cost its own
/// task.
fn dispatch_event(state: &AppState, event: InnerEvent) {
    match event {
        InnerEvent::AppMention(mention) => {
            let poster = state.poster.clone();
            tokio::spawn(async move {
                if let Err(err) = reply_to_mention(poster.as_ref(), &mention).await {
                    tracing::error!(
                        error = %err,
                        channel = %mention.channel,
                        "mention reply failed"
                    );
                }
            });
        }
        InnerEvent::Unhandled => {
            tracing::debug!("ignoring unhandled event kind");
        }
    }
}

/// Builds the reply document for a mention: greeting section, divider, and a
/// context line naming the requester, threaded under the mention.
pub fn mention_reply(mention: &AppMention) -> Result<OutMessage> {
    let mut msg = OutMessage::new(&mention.channel, GREETING)?;
    msg.push_block(Block::section(TextObject::mrkdwn(GREETING)))
        .push_block(Block::divider())
        .push_block(Block::context(vec![ContextElement::mrkdwn(format!(
            "Requested by <@{}>",
            mention.user
        ))]));
    Ok(msg.in_thread(&mention.ts))
}

pub async fn reply_to_mention(
    poster: &dyn MessagePoster,
    mention: &AppMention,
) -> Result<SendResult> {
    let msg = mention_reply(mention)?;
    let result = poster.post_message(&msg).await?;
    tracing::info!(channel = %result.channel, ts = %result.ts, "posted mention reply");
    Ok(result)
}
