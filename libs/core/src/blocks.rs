//! Block document model for outbound messages.
//!
//! A message body is an ordered sequence of [`Block`]s; ordering is the
//! on-screen rendering order and is preserved through serialization. Each
//! constructor validates its own shape, so a document that exists is a
//! document the platform will accept. Serialization targets the Slack Block
//! Kit wire format directly.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

pub const OVERFLOW_MIN_OPTIONS: usize = 2;
pub const OVERFLOW_MAX_OPTIONS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error(
        "overflow menu requires {OVERFLOW_MIN_OPTIONS}-{OVERFLOW_MAX_OPTIONS} options, got {0}"
    )]
    OverflowOptionCount(usize),
    #[error("duplicate overflow option value: {0}")]
    DuplicateOptionValue(String),
    #[error("fallback text must not be empty")]
    EmptyFallback,
}

/// A composable text object, either markdown or plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
    PlainText { text: String, emoji: bool },
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText {
            text: text.into(),
            emoji: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageElement {
    pub image_url: String,
    pub alt_text: String,
}

impl ImageElement {
    pub fn new(image_url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            alt_text: alt_text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: TextObject,
    pub action_id: String,
    pub value: String,
}

impl Button {
    pub fn new(
        action_id: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            text: TextObject::plain(label),
            action_id: action_id.into(),
            value: value.into(),
        }
    }
}

/// One selectable entry of an [`Overflow`] menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverflowOption {
    pub text: TextObject,
    pub value: String,
}

impl OverflowOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: TextObject::plain(label),
            value: value.into(),
        }
    }
}

/// A compact menu of 2-5 options with unique values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overflow {
    pub action_id: String,
    pub options: Vec<OverflowOption>,
}

impl Overflow {
    pub fn new(
        action_id: impl Into<String>,
        options: Vec<OverflowOption>,
    ) -> Result<Self, BlockError> {
        if !(OVERFLOW_MIN_OPTIONS..=OVERFLOW_MAX_OPTIONS).contains(&options.len()) {
            return Err(BlockError::OverflowOptionCount(options.len()));
        }
        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.value.as_str()) {
                return Err(BlockError::DuplicateOptionValue(option.value.clone()));
            }
        }
        Ok(Self {
            action_id: action_id.into(),
            options,
        })
    }
}

/// The single optional element attached to a section block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Accessory {
    Image(ImageElement),
    Button(Button),
    Overflow(Overflow),
}

/// Elements valid inside a context block. Interactive elements are excluded
/// by the platform, so the type only offers images and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextElement {
    Image(ImageElement),
    PlainText { text: String, emoji: bool },
    Mrkdwn { text: String },
}

impl ContextElement {
    pub fn image(image_url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self::Image(ImageElement::new(image_url, alt_text))
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText {
            text: text.into(),
            emoji: true,
        }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

/// Interactive elements valid inside an actions block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionsElement {
    Button(Button),
    Overflow(Overflow),
}

/// One renderable unit of a structured message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: TextObject,
    },
    Section {
        text: TextObject,
        accessory: Option<Accessory>,
    },
    Divider,
    Context {
        elements: Vec<ContextElement>,
    },
    Actions {
        elements: Vec<ActionsElement>,
    },
    Image {
        image_url: String,
        alt_text: String,
    },
}

impl Block {
    pub fn header(text: impl Into<String>) -> Self {
        Self::Header {
            text: TextObject::plain(text),
        }
    }

    pub fn section(text: TextObject) -> Self {
        Self::Section {
            text,
            accessory: None,
        }
    }

    pub fn section_with_accessory(text: TextObject, accessory: Accessory) -> Self {
        Self::Section {
            text,
            accessory: Some(accessory),
        }
    }

    pub fn divider() -> Self {
        Self::Divider
    }

    pub fn context(elements: Vec<ContextElement>) -> Self {
        Self::Context { elements }
    }

    pub fn actions(elements: Vec<ActionsElement>) -> Self {
        Self::Actions { elements }
    }

    pub fn image(image_url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self::Image {
            image_url: image_url.into(),
            alt_text: alt_text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn section_without_accessory_serializes_null_accessory() {
        let block = Block::section(TextObject::mrkdwn("hello"));
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": "hello" },
                "accessory": null,
            })
        );
    }

    #[test]
    fn section_accessory_is_a_single_tagged_element() {
        let block = Block::section_with_accessory(
            TextObject::mrkdwn("*Windsor Court Hotel*"),
            Accessory::Image(ImageElement::new(
                "https://example.com/hotel.png",
                "hotel thumbnail",
            )),
        );
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": "*Windsor Court Hotel*" },
                "accessory": {
                    "type": "image",
                    "image_url": "https://example.com/hotel.png",
                    "alt_text": "hotel thumbnail",
                },
            })
        );
    }

    #[test]
    fn overflow_rejects_too_few_options() {
        let err = Overflow::new("menu", vec![OverflowOption::new("value-0", "Only")])
            .expect_err("one option");
        assert_eq!(err, BlockError::OverflowOptionCount(1));
    }

    #[test]
    fn overflow_accepts_five_distinct_options() {
        let options = (0..5)
            .map(|i| OverflowOption::new(format!("value-{i}"), format!("Option {i}")))
            .collect();
        let overflow = Overflow::new("menu", options).expect("five distinct options");
        assert_eq!(overflow.options.len(), 5);
    }

    #[test]
    fn overflow_rejects_duplicate_values() {
        let options = vec![
            OverflowOption::new("value-0", "First"),
            OverflowOption::new("value-1", "Second"),
            OverflowOption::new("value-0", "Third"),
        ];
        let err = Overflow::new("menu", options).expect_err("duplicate value");
        assert_eq!(err, BlockError::DuplicateOptionValue("value-0".into()));
    }

    #[test]
    fn overflow_rejects_six_options() {
        let options = (0..6)
            .map(|i| OverflowOption::new(format!("value-{i}"), format!("Option {i}")))
            .collect();
        let err = Overflow::new("menu", options).expect_err("six options");
        assert_eq!(err, BlockError::OverflowOptionCount(6));
    }

    #[test]
    fn context_serializes_mixed_elements_in_order() {
        let block = Block::context(vec![
            ContextElement::image("https://example.com/pin.png", "Location Pin Icon"),
            ContextElement::plain("Location: French Quarter"),
        ]);
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "context",
                "elements": [
                    {
                        "type": "image",
                        "image_url": "https://example.com/pin.png",
                        "alt_text": "Location Pin Icon",
                    },
                    { "type": "plain_text", "text": "Location: French Quarter", "emoji": true },
                ],
            })
        );
    }

    #[test]
    fn actions_serializes_buttons_and_overflow() {
        let overflow = Overflow::new(
            "more",
            vec![
                OverflowOption::new("value-0", "Option One"),
                OverflowOption::new("value-1", "Option Two"),
            ],
        )
        .unwrap();
        let block = Block::actions(vec![
            ActionsElement::Button(Button::new("next_page", "Next 2 Results", "click_me_123")),
            ActionsElement::Overflow(overflow),
        ]);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "actions");
        assert_eq!(value["elements"][0]["type"], "button");
        assert_eq!(value["elements"][0]["text"]["text"], "Next 2 Results");
        assert_eq!(value["elements"][1]["type"], "overflow");
        assert_eq!(value["elements"][1]["options"][1]["value"], "value-1");
    }

    #[test]
    fn block_order_is_preserved() {
        let blocks = vec![
            Block::header("Results"),
            Block::divider(),
            Block::section(TextObject::mrkdwn("We found *100 Clusters*")),
            Block::image("https://example.com/map.png", "map"),
        ];
        let value = serde_json::to_value(&blocks).unwrap();
        let kinds: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|block| block["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["header", "divider", "section", "image"]);
    }

    #[test]
    fn construction_is_deterministic() {
        let build = || {
            Block::section_with_accessory(
                TextObject::mrkdwn("hello"),
                Accessory::Button(Button::new("ack", "Ack", "ack-1")),
            )
        };
        assert_eq!(
            serde_json::to_value(build()).unwrap(),
            serde_json::to_value(build()).unwrap()
        );
    }
}
