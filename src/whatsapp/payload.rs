//! Inbound webhook payloads from the WhatsApp Cloud API.
//!
//! Only the first entry, change, contact and message are ever looked at;
//! batched deliveries are not split up.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    pub value: ChangeValue,
}

#[derive(Debug, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub messages: Vec<WaMessage>,
}

#[derive(Debug, Deserialize)]
pub struct Contact {
    pub wa_id: String,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub name: String,
}

/// Only text messages carry a body; media and stickers leave `text` empty.
#[derive(Debug, Deserialize)]
pub struct WaMessage {
    #[serde(default)]
    pub text: Option<WaText>,
}

#[derive(Debug, Deserialize)]
pub struct WaText {
    pub body: String,
}

#[derive(Debug)]
pub enum PayloadError {
    /// The JSON does not have the webhook structure at all.
    Shape(serde_json::Error),
    /// A required piece is absent, e.g. `contacts[0]` or `text.body`.
    Missing(&'static str),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(e) => write!(f, "malformed webhook payload: {e}"),
            Self::Missing(what) => write!(f, "webhook payload has no {what}"),
        }
    }
}

impl std::error::Error for PayloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Shape(e) => Some(e),
            Self::Missing(_) => None,
        }
    }
}

/// Sender and text of the first message in a webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub wa_id: String,
    pub name: String,
    pub text: String,
}

impl InboundMessage {
    pub fn extract(payload: &Value) -> Result<Self, PayloadError> {
        let payload = WebhookPayload::deserialize(payload).map_err(PayloadError::Shape)?;

        let value = payload
            .entry
            .into_iter()
            .next()
            .ok_or(PayloadError::Missing("entry"))?
            .changes
            .into_iter()
            .next()
            .ok_or(PayloadError::Missing("changes"))?
            .value;

        let contact = value
            .contacts
            .into_iter()
            .next()
            .ok_or(PayloadError::Missing("contacts"))?;
        let message = value
            .messages
            .into_iter()
            .next()
            .ok_or(PayloadError::Missing("messages"))?;
        let text = message.text.ok_or(PayloadError::Missing("text body"))?;

        Ok(Self {
            wa_id: contact.wa_id,
            name: contact.profile.name,
            text: text.body,
        })
    }
}

/// Loose JSON truthiness: null, false, 0, "" and empty containers are falsy.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn first(value: Option<&Value>) -> Option<&Value> {
    value.and_then(|v| v.get(0))
}

/// Whether the event carries a message at `entry[0].changes[0].value.messages[0]`.
///
/// Status callbacks (delivered/read receipts) fail this check and should be
/// acknowledged without dispatching.
pub fn is_valid_whatsapp_message(body: &Value) -> bool {
    let entry = body.get("entry");
    let changes = first(entry).and_then(|e| e.get("changes"));
    let value = first(changes).and_then(|c| c.get("value"));
    let messages = value.and_then(|v| v.get("messages"));

    truthy(body.get("object"))
        && truthy(entry)
        && truthy(changes)
        && truthy(value)
        && truthy(messages)
        && truthy(first(messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "102290129340398",
                "changes": [{
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {
                            "display_phone_number": "15550783881",
                            "phone_number_id": "106540352242922"
                        },
                        "contacts": [{"profile": {"name": "Asha"}, "wa_id": "16505551234"}],
                        "messages": [{
                            "from": "16505551234",
                            "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgA=",
                            "timestamp": "1749416383",
                            "type": "text",
                            "text": {"body": "bought coffee for 400"}
                        }]
                    },
                    "field": "messages"
                }]
            }]
        })
    }

    #[test]
    fn test_valid_message() {
        assert!(is_valid_whatsapp_message(&sample()));
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(!is_valid_whatsapp_message(&json!({})));
        assert!(!is_valid_whatsapp_message(&json!({"object": "whatsapp_business_account"})));
        assert!(!is_valid_whatsapp_message(&json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": []}]
        })));
        assert!(!is_valid_whatsapp_message(&json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {"statuses": [{"status": "read"}]}}]}]
        })));
        assert!(!is_valid_whatsapp_message(&json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {"messages": [{}]}}]}]
        })));

        let mut no_object = sample();
        no_object["object"] = json!("");
        assert!(!is_valid_whatsapp_message(&no_object));
    }

    #[test]
    fn test_non_object_payload_is_invalid() {
        assert!(!is_valid_whatsapp_message(&json!([])));
        assert!(!is_valid_whatsapp_message(&json!("text")));
        assert!(!is_valid_whatsapp_message(&Value::Null));
    }

    #[test]
    fn test_extract_first_message() {
        let msg = InboundMessage::extract(&sample()).unwrap();
        assert_eq!(
            msg,
            InboundMessage {
                wa_id: "16505551234".into(),
                name: "Asha".into(),
                text: "bought coffee for 400".into(),
            }
        );
    }

    #[test]
    fn test_extract_ignores_later_messages() {
        let mut payload = sample();
        payload["entry"][0]["changes"][0]["value"]["messages"]
            .as_array_mut()
            .unwrap()
            .push(json!({"type": "text", "text": {"body": "second"}}));
        assert_eq!(InboundMessage::extract(&payload).unwrap().text, "bought coffee for 400");
    }

    #[test]
    fn test_extract_non_text_message() {
        let mut payload = sample();
        payload["entry"][0]["changes"][0]["value"]["messages"][0] =
            json!({"type": "image", "image": {"id": "123"}});
        assert!(matches!(
            InboundMessage::extract(&payload),
            Err(PayloadError::Missing("text body"))
        ));
    }

    #[test]
    fn test_extract_without_contacts() {
        let mut payload = sample();
        payload["entry"][0]["changes"][0]["value"]["contacts"] = json!([]);
        assert!(matches!(
            InboundMessage::extract(&payload),
            Err(PayloadError::Missing("contacts"))
        ));
    }

    #[test]
    fn test_extract_only_reads_sender_and_body() {
        let mut payload = sample();
        payload["entry"][0]["id"] = json!({"unexpected": true});
        payload["entry"][0]["changes"][0]["field"] = json!(7);
        payload["entry"][0]["changes"][0]["value"]["messages"][0] =
            json!({"id": 123, "from": null, "type": ["text"], "text": {"body": "tea 50"}});

        let msg = InboundMessage::extract(&payload).unwrap();
        assert_eq!(msg.wa_id, "16505551234");
        assert_eq!(msg.text, "tea 50");
    }

    #[test]
    fn test_extract_wrong_types() {
        let payload = json!({"object": "x", "entry": "nope"});
        assert!(matches!(InboundMessage::extract(&payload), Err(PayloadError::Shape(_))));
    }
}
