use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type tag stored with every QR record.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Url,
    Text,
    Phone,
    Sms,
    Email,
    Wifi,
    Vcard,
    Location,
    Event,
    Crypto,
    Social,
    Image,
}

impl ContentKind {
    pub fn all() -> [ContentKind; 12] {
        [
            ContentKind::Url,
            ContentKind::Text,
            ContentKind::Phone,
            ContentKind::Sms,
            ContentKind::Email,
            ContentKind::Wifi,
            ContentKind::Vcard,
            ContentKind::Location,
            ContentKind::Event,
            ContentKind::Crypto,
            ContentKind::Social,
            ContentKind::Image,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Url => "url",
            ContentKind::Text => "text",
            ContentKind::Phone => "phone",
            ContentKind::Sms => "sms",
            ContentKind::Email => "email",
            ContentKind::Wifi => "wifi",
            ContentKind::Vcard => "vcard",
            ContentKind::Location => "location",
            ContentKind::Event => "event",
            ContentKind::Crypto => "crypto",
            ContentKind::Social => "social",
            ContentKind::Image => "image",
        }
    }

    /// File stem used for downloads, e.g. `qrforge-wifi`.
    pub fn export_name(&self) -> String {
        format!("qrforge-{}", self.as_str())
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKind::all()
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown content kind: {}", s))
    }
}
