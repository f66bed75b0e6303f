//! Inbound payload decoding for the Events API and interactive callbacks.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed json payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("interaction body missing `payload` field")]
    MissingPayloadField,
}

/// Top-level decoded Events API payload, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Slack's endpoint handshake; the challenge must be echoed verbatim.
    UrlVerification { challenge: String },
    /// A delivered event wrapping exactly one inner event.
    EventCallback { event: InnerEvent },
}

/// The platform event nested inside an `event_callback` envelope.
///
/// Unknown kinds decode as [`InnerEvent::Unhandled`] so new event types
/// delivered by the platform never turn into parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum InnerEvent {
    #[serde(rename = "app_mention")]
    AppMention(AppMention),
    #[serde(other)]
    Unhandled,
}

/// A user mentioned the bot in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppMention {
    pub channel: String,
    pub user: String,
    pub text: String,
    pub ts: String,
}

/// Decodes an Events API body into a typed [`Envelope`].
pub fn parse_event(body: &[u8]) -> Result<Envelope, ParseError> {
    Ok(serde_json::from_slice(body)?)
}

/// An opaque interactive callback (button click, menu choice). Kept as raw
/// JSON; the dispatcher only logs it today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionPayload(Value);

impl InteractionPayload {
    /// The payload discriminator, e.g. `block_actions`.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// The interacting user's id, when present.
    pub fn user(&self) -> Option<&str> {
        self.0.pointer("/user/id").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Decodes a form-encoded interaction body; the `payload` field carries the
/// JSON document.
pub fn parse_interaction(body: &[u8]) -> Result<InteractionPayload, ParseError> {
    let payload = form_urlencoded::parse(body)
        .find(|(key, _)| key == "payload")
        .map(|(_, value)| value.into_owned())
        .ok_or(ParseError::MissingPayloadField)?;
    Ok(InteractionPayload(serde_json::from_str(&payload)?))
}
