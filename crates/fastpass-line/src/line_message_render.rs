//! Rendering of outbound messages into LINE Messaging API message objects.
//!
//! Cards become flex messages: one panel renders as a bubble, several as a
//! carousel.

use fastpass_core::{CardAction, CardPanel, CardPayload, OutboundMessage};
use serde_json::{json, Map, Value};

const LINE_ALT_TEXT_MAX_CHARS: usize = 400;
const LINE_ACTION_LABEL_MAX_CHARS: usize = 40;
const BADGE_BACKGROUND_COLOR: &str = "#EC3D44";
const TITLE_COLOR: &str = "#222222";
const FIELD_LABEL_COLOR: &str = "#aaaaaa";
const FIELD_VALUE_COLOR: &str = "#666666";

pub fn render_line_messages(messages: &[OutboundMessage]) -> Vec<Value> {
    messages.iter().map(render_line_message).collect()
}

pub fn render_line_message(message: &OutboundMessage) -> Value {
    match message {
        OutboundMessage::Text(text) => json!({
            "type": "text",
            "text": text,
        }),
        OutboundMessage::Card(card) => render_flex_message(card),
    }
}

fn render_flex_message(card: &CardPayload) -> Value {
    let contents = match card.panels.as_slice() {
        [panel] => render_bubble(panel),
        panels => json!({
            "type": "carousel",
            "contents": panels.iter().map(render_bubble).collect::<Vec<_>>(),
        }),
    };
    json!({
        "type": "flex",
        "altText": truncate_chars(&card.alt_text, LINE_ALT_TEXT_MAX_CHARS),
        "contents": contents,
    })
}

fn render_bubble(panel: &CardPanel) -> Value {
    let mut bubble = Map::new();
    bubble.insert("type".to_string(), json!("bubble"));

    if let Some(image_url) = panel.image_url.as_deref() {
        let mut hero_contents = vec![json!({
            "type": "image",
            "url": image_url,
            "size": "full",
            "aspectMode": "cover",
            "aspectRatio": "2:3",
            "gravity": "top",
        })];
        if let Some(badge) = panel.badge.as_deref() {
            hero_contents.push(json!({
                "type": "box",
                "layout": "vertical",
                "position": "absolute",
                "offsetTop": "18px",
                "offsetStart": "18px",
                "cornerRadius": "20px",
                "backgroundColor": BADGE_BACKGROUND_COLOR,
                "paddingAll": "4px",
                "contents": [{
                    "type": "text",
                    "text": badge,
                    "color": "#ffffff",
                    "size": "xs",
                    "align": "center",
                }],
            }));
        }
        bubble.insert(
            "header".to_string(),
            json!({
                "type": "box",
                "layout": "vertical",
                "paddingAll": "0px",
                "contents": hero_contents,
            }),
        );
    }

    let mut body_contents = Vec::new();
    if let Some(title) = panel.title.as_deref() {
        body_contents.push(json!({
            "type": "text",
            "text": title,
            "weight": "bold",
            "size": "xl",
            "color": TITLE_COLOR,
            "wrap": true,
        }));
    }
    body_contents.extend(panel.fields.iter().map(|field| {
        json!({
            "type": "box",
            "layout": "baseline",
            "spacing": "sm",
            "contents": [
                {
                    "type": "text",
                    "text": field.label,
                    "color": FIELD_LABEL_COLOR,
                    "size": "sm",
                    "flex": 1,
                },
                {
                    "type": "text",
                    "text": field.value,
                    "color": FIELD_VALUE_COLOR,
                    "size": "sm",
                    "flex": 4,
                    "wrap": true,
                },
            ],
        })
    }));
    if !body_contents.is_empty() {
        bubble.insert(
            "body".to_string(),
            json!({
                "type": "box",
                "layout": "vertical",
                "spacing": "md",
                "contents": body_contents,
            }),
        );
    }

    if !panel.actions.is_empty() {
        let buttons = panel
            .actions
            .iter()
            .map(|action| {
                json!({
                    "type": "button",
                    "style": "primary",
                    "height": "sm",
                    "action": render_action(action),
                })
            })
            .collect::<Vec<_>>();
        bubble.insert(
            "footer".to_string(),
            json!({
                "type": "box",
                "layout": "vertical",
                "spacing": "sm",
                "contents": buttons,
            }),
        );
    }

    Value::Object(bubble)
}

fn render_action(action: &CardAction) -> Value {
    let label = truncate_chars(action.label(), LINE_ACTION_LABEL_MAX_CHARS);
    match action {
        CardAction::OpenUri { uri, .. } => json!({
            "type": "uri",
            "label": label,
            "uri": uri,
        }),
        CardAction::SendText { text, .. } => json!({
            "type": "message",
            "label": label,
            "text": text,
        }),
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
