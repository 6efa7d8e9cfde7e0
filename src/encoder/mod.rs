//! Form fields to QR payload strings.
//!
//! Every content kind maps to a scanner-recognised mini-format (`tel:`,
//! `SMSTO:`, `MATMSG:`, `WIFI:`, vCard, `geo:`, VEVENT, payment URIs or a
//! plain URL). Encoding is pure: no I/O and no failure mode besides falling
//! back to a placeholder.

pub mod kind;
pub mod wifi;

use serde::{Deserialize, Serialize};

pub use kind::ContentKind;

/// Placeholder used when the URL form is empty.
pub const PLACEHOLDER_URL: &str = "https://qrforge.app";
pub const PLACEHOLDER_TEXT: &str = "Hello World";
pub const PLACEHOLDER_PHONE: &str = "tel:1234567890";
pub const PLACEHOLDER_IMAGE: &str = "https://qrforge.app/demo-image";

/// Raw form inputs, tagged by content kind.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QrContent {
    Url {
        #[serde(default)]
        url: String,
    },
    Text {
        #[serde(default)]
        text: String,
    },
    Phone {
        #[serde(default)]
        number: String,
    },
    Sms {
        #[serde(default)]
        phone: String,
        #[serde(default)]
        message: String,
    },
    Email {
        #[serde(default)]
        to: String,
        #[serde(default)]
        subject: String,
        #[serde(default)]
        body: String,
    },
    Wifi {
        #[serde(default)]
        ssid: String,
        #[serde(default)]
        password: String,
        #[serde(default = "default_encryption")]
        encryption: String,
        #[serde(default)]
        hidden: bool,
    },
    Vcard {
        #[serde(default)]
        name: String,
        #[serde(default)]
        phone: String,
        #[serde(default)]
        email: String,
        #[serde(default)]
        org: String,
    },
    Location {
        #[serde(default)]
        latitude: String,
        #[serde(default)]
        longitude: String,
    },
    Event {
        #[serde(default)]
        title: String,
        #[serde(default)]
        location: String,
        #[serde(default)]
        start: String,
        #[serde(default)]
        end: String,
        #[serde(default)]
        description: String,
    },
    Crypto {
        #[serde(default = "default_currency")]
        currency: String,
        #[serde(default)]
        address: String,
        #[serde(default)]
        amount: String,
    },
    Social {
        #[serde(default = "default_platform")]
        platform: String,
        #[serde(default)]
        username: String,
    },
    Image {
        #[serde(default)]
        url: String,
    },
}

fn default_encryption() -> String {
    "WPA".to_string()
}

fn default_currency() -> String {
    "bitcoin".to_string()
}

fn default_platform() -> String {
    SocialPlatform::Twitter.as_str().to_string()
}

/// Result of encoding a form.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Payload {
    pub value: String,
    /// Set when the form carries no user input yet. Such payloads are only
    /// fit for previews and must not be persisted.
    pub placeholder: bool,
}

/// Supported social networks. Anything else is treated as Twitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    Twitter,
    Facebook,
    Instagram,
    LinkedIn,
    YouTube,
    GitHub,
}

impl SocialPlatform {
    pub fn parse(value: &str) -> Self {
        match value {
            "facebook" => SocialPlatform::Facebook,
            "instagram" => SocialPlatform::Instagram,
            "linkedin" => SocialPlatform::LinkedIn,
            "youtube" => SocialPlatform::YouTube,
            "github" => SocialPlatform::GitHub,
            _ => SocialPlatform::Twitter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::LinkedIn => "linkedin",
            SocialPlatform::YouTube => "youtube",
            SocialPlatform::GitHub => "github",
        }
    }

    pub fn profile_base(&self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "https://twitter.com/",
            SocialPlatform::Facebook => "https://facebook.com/",
            SocialPlatform::Instagram => "https://instagram.com/",
            SocialPlatform::LinkedIn => "https://linkedin.com/in/",
            SocialPlatform::YouTube => "https://youtube.com/@",
            SocialPlatform::GitHub => "https://github.com/",
        }
    }
}

/// True when `value` already starts with an http(s) scheme.
pub fn has_http_scheme(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Prefix `https://` unless an http(s) scheme is present.
pub fn with_https(value: &str) -> String {
    if has_http_scheme(value) {
        value.to_string()
    } else {
        format!("https://{}", value)
    }
}

/// `2024-05-01T10:30` -> `20240501T103000`. Empty input stays empty.
fn compact_timestamp(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let mut compact: String = value.chars().filter(|c| *c != '-' && *c != ':').collect();
    compact.push_str("00");
    compact
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

impl QrContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            QrContent::Url { .. } => ContentKind::Url,
            QrContent::Text { .. } => ContentKind::Text,
            QrContent::Phone { .. } => ContentKind::Phone,
            QrContent::Sms { .. } => ContentKind::Sms,
            QrContent::Email { .. } => ContentKind::Email,
            QrContent::Wifi { .. } => ContentKind::Wifi,
            QrContent::Vcard { .. } => ContentKind::Vcard,
            QrContent::Location { .. } => ContentKind::Location,
            QrContent::Event { .. } => ContentKind::Event,
            QrContent::Crypto { .. } => ContentKind::Crypto,
            QrContent::Social { .. } => ContentKind::Social,
            QrContent::Image { .. } => ContentKind::Image,
        }
    }

    /// Whether the user has typed anything meaningful for this kind.
    pub fn has_user_content(&self) -> bool {
        match self {
            QrContent::Url { url } => filled(url),
            QrContent::Text { text } => filled(text),
            QrContent::Phone { number } => filled(number),
            QrContent::Sms { phone, message } => filled(phone) || filled(message),
            QrContent::Email { to, .. } => filled(to),
            QrContent::Wifi { ssid, .. } => filled(ssid),
            QrContent::Vcard { name, .. } => filled(name),
            QrContent::Location {
                latitude,
                longitude,
            } => filled(latitude) || filled(longitude),
            QrContent::Event { title, .. } => filled(title),
            QrContent::Crypto { address, .. } => filled(address),
            QrContent::Social { username, .. } => filled(username),
            QrContent::Image { url } => filled(url),
        }
    }

    /// Encode the form into the payload string placed in the QR symbol.
    pub fn encode(&self) -> Payload {
        let value = self.render();
        Payload {
            value: if value.is_empty() {
                PLACEHOLDER_URL.to_string()
            } else {
                value
            },
            placeholder: !self.has_user_content(),
        }
    }

    fn render(&self) -> String {
        match self {
            QrContent::Url { url } => {
                let url = url.trim();
                if url.is_empty() {
                    PLACEHOLDER_URL.to_string()
                } else {
                    with_https(url)
                }
            }
            QrContent::Text { text } => {
                if text.is_empty() {
                    PLACEHOLDER_TEXT.to_string()
                } else {
                    text.clone()
                }
            }
            QrContent::Phone { number } => {
                if number.is_empty() {
                    PLACEHOLDER_PHONE.to_string()
                } else {
                    format!("tel:{}", number)
                }
            }
            QrContent::Sms { phone, message } => format!("SMSTO:{}:{}", phone, message),
            QrContent::Email { to, subject, body } => {
                format!("MATMSG:TO:{};SUB:{};BODY:{};;", to, subject, body)
            }
            QrContent::Wifi {
                ssid,
                password,
                encryption,
                hidden,
            } => format!(
                "WIFI:T:{};S:{};P:{};H:{};;",
                encryption,
                wifi::escape(ssid),
                wifi::escape(password),
                hidden
            ),
            QrContent::Vcard {
                name,
                phone,
                email,
                org,
            } => [
                "BEGIN:VCARD".to_string(),
                "VERSION:3.0".to_string(),
                format!("N:{}", name),
                format!("FN:{}", name),
                format!("ORG:{}", org),
                format!("TEL:{}", phone),
                format!("EMAIL:{}", email),
                "END:VCARD".to_string(),
            ]
            .join("\n"),
            QrContent::Location {
                latitude,
                longitude,
            } => format!("geo:{},{}", latitude, longitude),
            QrContent::Event {
                title,
                location,
                start,
                end,
                description,
            } => [
                "BEGIN:VEVENT".to_string(),
                format!("SUMMARY:{}", title),
                format!("LOCATION:{}", location),
                format!("DTSTART:{}", compact_timestamp(start)),
                format!("DTEND:{}", compact_timestamp(end)),
                format!("DESCRIPTION:{}", description),
                "END:VEVENT".to_string(),
            ]
            .join("\n"),
            QrContent::Crypto {
                currency,
                address,
                amount,
            } => match currency.as_str() {
                "bitcoin" | "ethereum" => format!("{}:{}?amount={}", currency, address, amount),
                _ => address.clone(),
            },
            QrContent::Social { platform, username } => {
                let platform = SocialPlatform::parse(platform);
                format!("{}{}", platform.profile_base(), username.trim())
            }
            QrContent::Image { url } => {
                if url.is_empty() {
                    PLACEHOLDER_IMAGE.to_string()
                } else {
                    url.clone()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(value: &str) -> QrContent {
        QrContent::Url {
            url: value.to_string(),
        }
    }

    #[test]
    fn url_gets_https_prefix() {
        assert_eq!(url("example.com").encode().value, "https://example.com");
        assert_eq!(url("  example.com/a ").encode().value, "https://example.com/a");
    }

    #[test]
    fn url_keeps_existing_scheme() {
        assert_eq!(url("http://example.com").encode().value, "http://example.com");
        assert_eq!(url("https://example.com").encode().value, "https://example.com");
    }

    #[test]
    fn empty_url_is_placeholder() {
        let payload = url("").encode();
        assert_eq!(payload.value, PLACEHOLDER_URL);
        assert!(payload.placeholder);

        let payload = url("   ").encode();
        assert!(!payload.value.is_empty());
        assert!(payload.placeholder);
    }

    #[test]
    fn text_and_phone() {
        let text = QrContent::Text {
            text: "hi there".into(),
        };
        assert_eq!(text.encode().value, "hi there");
        let empty = QrContent::Text {
            text: String::new(),
        };
        assert_eq!(empty.encode().value, PLACEHOLDER_TEXT);

        let phone = QrContent::Phone {
            number: "+15550100".into(),
        };
        assert_eq!(phone.encode().value, "tel:+15550100");
    }

    #[test]
    fn sms_and_email() {
        let sms = QrContent::Sms {
            phone: "5550100".into(),
            message: "on my way".into(),
        };
        assert_eq!(sms.encode().value, "SMSTO:5550100:on my way");

        let email = QrContent::Email {
            to: "a@b.c".into(),
            subject: "Hi".into(),
            body: "Body".into(),
        };
        assert_eq!(email.encode().value, "MATMSG:TO:a@b.c;SUB:Hi;BODY:Body;;");
    }

    #[test]
    fn wifi_escapes_fields_independently() {
        let wifi = QrContent::Wifi {
            ssid: "Cafe;Guest".into(),
            password: r"p:a,s\s".into(),
            encryption: "WPA".into(),
            hidden: true,
        };
        assert_eq!(
            wifi.encode().value,
            r"WIFI:T:WPA;S:Cafe\;Guest;P:p\:a\,s\\s;H:true;;"
        );
    }

    #[test]
    fn wifi_defaults_from_json() {
        let content: QrContent =
            serde_json::from_str(r#"{"type":"wifi","ssid":"Home"}"#).unwrap();
        assert_eq!(content.encode().value, "WIFI:T:WPA;S:Home;P:;H:false;;");
    }

    #[test]
    fn vcard_lines() {
        let card = QrContent::Vcard {
            name: "Ada Lovelace".into(),
            phone: "555".into(),
            email: "ada@example.com".into(),
            org: "Engines".into(),
        };
        assert_eq!(
            card.encode().value,
            "BEGIN:VCARD\nVERSION:3.0\nN:Ada Lovelace\nFN:Ada Lovelace\nORG:Engines\nTEL:555\nEMAIL:ada@example.com\nEND:VCARD"
        );
    }

    #[test]
    fn location_and_event() {
        let geo = QrContent::Location {
            latitude: "52.52".into(),
            longitude: "13.405".into(),
        };
        assert_eq!(geo.encode().value, "geo:52.52,13.405");

        let event = QrContent::Event {
            title: "Launch".into(),
            location: "HQ".into(),
            start: "2024-05-01T10:30".into(),
            end: String::new(),
            description: "Cake".into(),
        };
        assert_eq!(
            event.encode().value,
            "BEGIN:VEVENT\nSUMMARY:Launch\nLOCATION:HQ\nDTSTART:20240501T103000\nDTEND:\nDESCRIPTION:Cake\nEND:VEVENT"
        );
    }

    #[test]
    fn crypto_uris() {
        let btc = QrContent::Crypto {
            currency: "bitcoin".into(),
            address: "bc1q".into(),
            amount: "0.1".into(),
        };
        assert_eq!(btc.encode().value, "bitcoin:bc1q?amount=0.1");

        let eth = QrContent::Crypto {
            currency: "ethereum".into(),
            address: "0xabc".into(),
            amount: "2".into(),
        };
        assert_eq!(eth.encode().value, "ethereum:0xabc?amount=2");

        let other = QrContent::Crypto {
            currency: "dogecoin".into(),
            address: "D123".into(),
            amount: "5".into(),
        };
        assert_eq!(other.encode().value, "D123");
    }

    #[test]
    fn crypto_never_empty() {
        let other = QrContent::Crypto {
            currency: "dogecoin".into(),
            address: String::new(),
            amount: String::new(),
        };
        let payload = other.encode();
        assert_eq!(payload.value, PLACEHOLDER_URL);
        assert!(payload.placeholder);
    }

    #[test]
    fn social_profiles() {
        let github = QrContent::Social {
            platform: "github".into(),
            username: "octocat".into(),
        };
        assert_eq!(github.encode().value, "https://github.com/octocat");

        let linkedin = QrContent::Social {
            platform: "linkedin".into(),
            username: " ada ".into(),
        };
        assert_eq!(linkedin.encode().value, "https://linkedin.com/in/ada");

        let youtube = QrContent::Social {
            platform: "youtube".into(),
            username: "chan".into(),
        };
        assert_eq!(youtube.encode().value, "https://youtube.com/@chan");

        let unknown = QrContent::Social {
            platform: "myspace".into(),
            username: "tom".into(),
        };
        assert_eq!(unknown.encode().value, "https://twitter.com/tom");
    }

    #[test]
    fn image_uses_uploaded_url() {
        let image = QrContent::Image {
            url: "https://qrforge.app/i/1-abc.png".into(),
        };
        assert_eq!(image.encode().value, "https://qrforge.app/i/1-abc.png");
        let empty = QrContent::Image { url: String::new() };
        assert_eq!(empty.encode().value, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn every_kind_is_deterministic_and_non_empty() {
        let forms: Vec<QrContent> = ContentKind::all()
            .iter()
            .map(|kind| {
                serde_json::from_value(serde_json::json!({ "type": kind.as_str() })).unwrap()
            })
            .collect();
        for form in forms {
            let first = form.encode();
            assert_eq!(first, form.clone().encode());
            assert!(!first.value.is_empty(), "{:?}", form.kind());
            assert!(first.placeholder, "{:?}", form.kind());
        }
    }

    #[test]
    fn user_content_detection() {
        let sms = QrContent::Sms {
            phone: String::new(),
            message: "hello".into(),
        };
        assert!(sms.has_user_content());
        let geo = QrContent::Location {
            latitude: " ".into(),
            longitude: String::new(),
        };
        assert!(!geo.has_user_content());
    }
}
