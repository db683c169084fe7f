use serde::{Deserialize, Serialize};

use crate::notification::NotificationEvent;

/// Messages sent from server to client over the push channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PushMessage {
    #[serde(rename = "new_notification")]
    NewNotification { notification: NotificationEvent },
}

impl PushMessage {
    /// Decode a text frame. Unknown `type` values, missing fields and
    /// invalid JSON are all errors.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn new_notification(notification: NotificationEvent) -> Self {
        Self::NewNotification { notification }
    }

    pub fn into_notification(self) -> NotificationEvent {
        match self {
            PushMessage::NewNotification { notification } => notification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationType;

    #[test]
    fn test_parse_new_notification() {
        let json = r#"{"type":"new_notification","notification":{"id":"n1","type":"general","title":"T","message":"M","created_at":"2024-01-01T00:00:00Z"}}"#;

        let event = PushMessage::from_json(json).unwrap().into_notification();
        assert_eq!(event.id, "n1");
        assert_eq!(event.notification_type, NotificationType::General);
        assert_eq!(event.title, "T");
        assert_eq!(event.message, "M");
    }

    #[test]
    fn test_rejects_unknown_message_type() {
        let json = r#"{"type":"heartbeat"}"#;
        assert!(PushMessage::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_missing_notification() {
        assert!(PushMessage::from_json(r#"{"type":"new_notification"}"#).is_err());
        assert!(PushMessage::from_json(r#"{"type":"new_notification","notification":null}"#).is_err());
    }

    #[test]
    fn test_rejects_invalid_json() {
        assert!(PushMessage::from_json("not json").is_err());
        assert!(PushMessage::from_json("").is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let event = NotificationEvent::new("n2", NotificationType::TeamInvite, "Invite", "Join us");
        let json = PushMessage::new_notification(event).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "new_notification");
        assert_eq!(value["notification"]["id"], "n2");
        assert_eq!(value["notification"]["type"], "team_invite");
    }
}
