//! The subset of the Bot Framework activity schema the assistant reads and writes
use aide::agent::Reply;
use aide::card::{card_attachment, profile_card};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MESSAGE: &str = "message";
pub const MARKDOWN: &str = "markdown";

lazy_static! {
    static ref MENTION: Regex = Regex::new(r"(?s)<at>.*?</at>").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Value>,
}

impl Activity {
    pub fn is_message(&self) -> bool {
        self.activity_type.eq_ignore_ascii_case(MESSAGE)
    }

    /// The user's text without bot mentions
    pub fn user_text(&self) -> String {
        self.text.as_deref().map(strip_mentions).unwrap_or_default()
    }

    /// A message addressed back to the sender of this activity
    pub fn reply(&self) -> Activity {
        Activity {
            activity_type: MESSAGE.to_string(),
            channel_id: self.channel_id.clone(),
            service_url: self.service_url.clone(),
            from: self.recipient.clone(),
            recipient: self.from.clone(),
            conversation: self.conversation.clone(),
            reply_to_id: self.id.clone(),
            ..Default::default()
        }
    }

    pub fn with_markdown<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self.text_format = Some(MARKDOWN.to_string());
        self
    }

    pub fn with_attachment(mut self, attachment: Value) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Render the assistant's reply as a message to the sender
    pub fn reply_with(&self, reply: Reply) -> Activity {
        match reply {
            Reply::Text(text) => self.reply().with_markdown(text),
            Reply::ProfileCard {
                picture_url,
                details,
            } => self
                .reply()
                .with_attachment(card_attachment(profile_card(picture_url.as_deref(), &details))),
        }
    }
}

/// Remove `<at>…</at>` mentions and surrounding whitespace
pub fn strip_mentions(text: &str) -> String {
    MENTION.replace_all(text, "").trim().to_string()
}

/// Reply body in the Bot Framework `expectReplies` shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedReplies {
    pub activities: Vec<Activity>,
}

impl ExpectedReplies {
    pub fn single(activity: Activity) -> Self {
        Self {
            activities: vec![activity],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aide::card::ADAPTIVE_CARD_CONTENT_TYPE;
    use serde_json::json;

    fn inbound() -> Activity {
        serde_json::from_value(json!({
            "type": "message",
            "id": "act-1",
            "channelId": "msteams",
            "serviceUrl": "https://smba.trafficmanager.net/emea/",
            "from": {"id": "user-1", "name": "Ana"},
            "recipient": {"id": "bot-1", "name": "Aide"},
            "conversation": {"id": "conv-1"},
            "text": "<at>Aide</at> what's on my calendar today? "
        }))
        .unwrap()
    }

    #[test]
    fn test_strip_mentions() {
        assert_eq!(strip_mentions("<at>Aide</at> hello"), "hello");
        assert_eq!(strip_mentions("hi <at>Aide</at> and <at>Bo</at>!"), "hi  and !");
        assert_eq!(strip_mentions("  plain  "), "plain");
    }

    #[test]
    fn test_user_text() {
        assert_eq!(inbound().user_text(), "what's on my calendar today?");
        assert_eq!(Activity::default().user_text(), "");
    }

    #[test]
    fn test_reply_addresses_sender() {
        let reply = inbound().reply_with(Reply::Text("**Nothing** today 🎉".to_string()));

        assert!(reply.is_message());
        assert_eq!(reply.reply_to_id.as_deref(), Some("act-1"));
        assert_eq!(reply.from.unwrap().id.as_deref(), Some("bot-1"));
        assert_eq!(reply.recipient.unwrap().id.as_deref(), Some("user-1"));
        assert_eq!(reply.text.as_deref(), Some("**Nothing** today 🎉"));
        assert_eq!(reply.text_format.as_deref(), Some("markdown"));
    }

    #[test]
    fn test_reply_with_profile_card() {
        let reply = inbound().reply_with(Reply::ProfileCard {
            picture_url: None,
            details: "Ana Lopez".to_string(),
        });

        assert!(reply.text.is_none());
        assert_eq!(reply.attachments.len(), 1);
        assert_eq!(reply.attachments[0]["contentType"], ADAPTIVE_CARD_CONTENT_TYPE);
    }

    #[test]
    fn test_serialized_shape() {
        let body = serde_json::to_value(ExpectedReplies::single(
            inbound().reply().with_markdown("hi"),
        ))
        .unwrap();

        assert_eq!(body["activities"][0]["type"], "message");
        assert_eq!(body["activities"][0]["textFormat"], "markdown");
        assert_eq!(body["activities"][0]["replyToId"], "act-1");
        assert!(body["activities"][0].get("attachments").is_none());
    }
}
