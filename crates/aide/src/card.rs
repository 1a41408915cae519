use serde_json::{json, Value};

pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
const ADAPTIVE_CARD_VERSION: &str = "1.4";

/// The profile card shown when the user asks who they are.
/// The picture is left out when no photo could be loaded.
pub fn profile_card(picture_url: Option<&str>, details: &str) -> Value {
    let mut body = Vec::new();
    if let Some(url) = picture_url {
        body.push(json!({
            "type": "Image",
            "url": url,
            "size": "Large",
            "style": "Person",
            "horizontalAlignment": "Center",
        }));
    }
    body.push(json!({
        "type": "TextBlock",
        "text": details,
        "wrap": true,
        "horizontalAlignment": "Center",
    }));

    json!({
        "type": "AdaptiveCard",
        "$schema": ADAPTIVE_CARD_SCHEMA,
        "version": ADAPTIVE_CARD_VERSION,
        "body": body,
    })
}

/// Wrap a card as a Bot Framework attachment
pub fn card_attachment(card: Value) -> Value {
    json!({
        "contentType": ADAPTIVE_CARD_CONTENT_TYPE,
        "content": card,
    })
}
