//! Notification payloads mirroring the platform's template shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rendering template of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Basic,
    Image,
    List,
    Progress,
}

impl Default for TemplateType {
    fn default() -> Self {
        TemplateType::Basic
    }
}

/// An action button attached to a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationButton {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl NotificationButton {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon_url: None,
        }
    }
}

/// One row of a list-template notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub title: String,
    pub message: String,
}

/// Options supplied to `notifications.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(rename = "type", default)]
    pub kind: TemplateType,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<NotificationButton>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<NotificationItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_interaction: Option<bool>,
}

impl NotificationOptions {
    /// Basic-template options with a title and message.
    pub fn basic(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: TemplateType::Basic,
            title: title.into(),
            message: message.into(),
            icon_url: None,
            context_message: None,
            image_url: None,
            buttons: None,
            items: None,
            progress: None,
            priority: None,
            require_interaction: None,
        }
    }

    pub fn with_kind(mut self, kind: TemplateType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<NotificationButton>) -> Self {
        self.buttons = Some(buttons);
        self
    }

    pub fn with_items(mut self, items: Vec<NotificationItem>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Merge an update into these options. Only fields present in the
    /// update are overwritten.
    pub fn apply(&mut self, update: &NotificationUpdate) {
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        if let Some(ref message) = update.message {
            self.message = message.clone();
        }
        if let Some(ref icon_url) = update.icon_url {
            self.icon_url = Some(icon_url.clone());
        }
        if let Some(ref context_message) = update.context_message {
            self.context_message = Some(context_message.clone());
        }
        if let Some(ref image_url) = update.image_url {
            self.image_url = Some(image_url.clone());
        }
        if let Some(ref buttons) = update.buttons {
            self.buttons = Some(buttons.clone());
        }
        if let Some(ref items) = update.items {
            self.items = Some(items.clone());
        }
        if let Some(progress) = update.progress {
            self.progress = Some(progress);
        }
        if let Some(priority) = update.priority {
            self.priority = Some(priority);
        }
        if let Some(require_interaction) = update.require_interaction {
            self.require_interaction = Some(require_interaction);
        }
    }
}

/// Partial options accepted by `notifications.update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUpdate {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TemplateType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<NotificationButton>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<NotificationItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_interaction: Option<bool>,
}

impl NotificationUpdate {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// A live notification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub options: NotificationOptions,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
