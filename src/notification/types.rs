use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of league notification
///
/// Unknown type strings are kept as `Other` so a new server-side type never
/// makes an otherwise valid notification undeliverable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    RaceScheduled,
    ResultPublished,
    TeamInvite,
    ChampionshipUpdate,
    #[default]
    General,
    Other(String),
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::RaceScheduled => "race_scheduled",
            NotificationType::ResultPublished => "result_published",
            NotificationType::TeamInvite => "team_invite",
            NotificationType::ChampionshipUpdate => "championship_update",
            NotificationType::General => "general",
            NotificationType::Other(s) => s,
        }
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "race_scheduled" => NotificationType::RaceScheduled,
            "result_published" => NotificationType::ResultPublished,
            "team_invite" => NotificationType::TeamInvite,
            "championship_update" => NotificationType::ChampionshipUpdate,
            "general" => NotificationType::General,
            _ => NotificationType::Other(value),
        }
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification pushed over the live channel when one is created for the
/// current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(
        id: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            notification_type,
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Item returned by the notification listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationListItem {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationListItem {
    /// App route for the race, championship or team this notification is
    /// about, if it links to one
    pub fn entity_path(&self) -> Option<String> {
        let id = self.entity_id?;
        let section = match self.entity_type.as_deref()? {
            "race" => "races",
            "championship" => "championships",
            "team" => "teams",
            _ => return None,
        };
        Some(format!("/{}/{}", section, id))
    }
}

/// Full notification record, returned when marking as read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub marked_count: u64,
}

/// Read-status tab of the notification list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadFilter {
    pub fn is_read(&self) -> Option<bool> {
        match self {
            ReadFilter::All => None,
            ReadFilter::Unread => Some(false),
            ReadFilter::Read => Some(true),
        }
    }
}

/// Query filters for listing notifications
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub is_read: Option<bool>,
    pub notification_type: Option<NotificationType>,
}

impl NotificationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_status(mut self, filter: ReadFilter) -> Self {
        self.is_read = filter.is_read();
        self
    }

    pub fn of_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = Some(notification_type);
        self
    }

    /// Query pairs in the order the listing endpoint documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(is_read) = self.is_read {
            pairs.push(("is_read", is_read.to_string()));
        }
        if let Some(ref t) = self.notification_type {
            pairs.push(("type", t.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_event() {
        let json = r#"{
            "id": "n1",
            "type": "race_scheduled",
            "title": "Round 3",
            "message": "Interlagos on Sunday",
            "created_at": "2024-01-01T00:00:00Z"
        }"#;

        let event: NotificationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "n1");
        assert_eq!(event.notification_type, NotificationType::RaceScheduled);
        assert_eq!(event.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let t: NotificationType = serde_json::from_str(r#""penalty_issued""#).unwrap();
        assert_eq!(t, NotificationType::Other("penalty_issued".to_string()));
        assert_eq!(serde_json::to_string(&t).unwrap(), r#""penalty_issued""#);
    }

    #[test]
    fn test_list_item_with_null_entity() {
        let json = r#"{
            "id": "5f0c3c3e-8a53-4b53-9a3b-2d1f1c1e0a01",
            "type": "general",
            "title": "Welcome",
            "message": "Season 2024 is open",
            "entity_type": null,
            "entity_id": null,
            "is_read": false,
            "created_at": "2024-03-10T12:30:00Z"
        }"#;

        let item: NotificationListItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.notification_type, NotificationType::General);
        assert!(item.entity_id.is_none());
        assert!(!item.is_read);
        assert_eq!(item.entity_path(), None);
    }

    #[test]
    fn test_entity_path() {
        let id = Uuid::parse_str("5f0c3c3e-8a53-4b53-9a3b-2d1f1c1e0a01").unwrap();
        let item = |entity_type: Option<&str>, entity_id: Option<Uuid>| NotificationListItem {
            id: Uuid::nil(),
            notification_type: NotificationType::General,
            title: "T".to_string(),
            message: "M".to_string(),
            entity_type: entity_type.map(str::to_string),
            entity_id,
            is_read: false,
            created_at: Utc::now(),
        };

        assert_eq!(
            item(Some("race"), Some(id)).entity_path().as_deref(),
            Some("/races/5f0c3c3e-8a53-4b53-9a3b-2d1f1c1e0a01")
        );
        assert_eq!(
            item(Some("championship"), Some(id)).entity_path().as_deref(),
            Some("/championships/5f0c3c3e-8a53-4b53-9a3b-2d1f1c1e0a01")
        );
        assert_eq!(
            item(Some("team"), Some(id)).entity_path().as_deref(),
            Some("/teams/5f0c3c3e-8a53-4b53-9a3b-2d1f1c1e0a01")
        );
        assert_eq!(item(Some("driver"), Some(id)).entity_path(), None);
        assert_eq!(item(Some("race"), None).entity_path(), None);
        assert_eq!(item(None, Some(id)).entity_path(), None);
    }

    #[test]
    fn test_filter_query_pairs() {
        assert!(NotificationFilter::new().query_pairs().is_empty());

        let filter = NotificationFilter::new()
            .read_status(ReadFilter::Unread)
            .of_type(NotificationType::TeamInvite);
        assert_eq!(
            filter.query_pairs(),
            vec![("is_read", "false".to_string()), ("type", "team_invite".to_string())]
        );

        let all = NotificationFilter::new().read_status(ReadFilter::All);
        assert_eq!(all.is_read, None);
    }
}
