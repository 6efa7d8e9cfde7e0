use serde::{Deserialize, Serialize};

/// Uploaded image as handed to object storage. Immutable once stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub key: String, // storage key, also the viewer id
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

// bson stores Vec<u8> as an array of ints by default; base64 keeps documents small
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
