use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::encoder::ContentKind;

/// A saved QR code. Row shape shared by every backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QrRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub content: String, // exact payload encoded in the symbol
    #[serde(default)]
    pub meta: Value, // style choices, free-form
    #[serde(default)]
    pub scan_count: i64,
    pub created_at: DateTime<Utc>,
}

impl QrRecord {
    pub fn new(user_id: String, title: String, kind: ContentKind, content: String, meta: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            title,
            kind,
            content,
            meta,
            scan_count: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_type_tag() {
        let record = QrRecord::new(
            "u1".into(),
            "Menu".into(),
            ContentKind::Url,
            "https://example.com".into(),
            serde_json::json!({ "color": "#000000" }),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "url");
        assert_eq!(json["scan_count"], 0);
        assert_eq!(json["meta"]["color"], "#000000");
        let back: QrRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
