use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::db::store::{ImageStore, QrStore, StoreError, UserStore};
use crate::models::image::UploadedImage;
use crate::models::plan::Plan;
use crate::models::qr_record::QrRecord;
use crate::models::user::User;

/// Connection settings for a hosted backend-as-a-service.
#[derive(Clone)]
pub struct HostedConfig {
    /// Project URL, e.g. `https://abc.example.co`.
    pub url: String,
    /// Public (anon) API key.
    pub api_key: String,
    /// Object storage bucket for uploads.
    pub bucket: String,
}

impl std::fmt::Debug for HostedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// REST client for the hosted database, RPC and storage endpoints.
pub struct HostedStore {
    client: Client,
    config: HostedConfig,
}

impl HostedStore {
    pub fn new(config: HostedConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            config: HostedConfig {
                url: config.url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.config.url, function)
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url, self.config.bucket, key
        )
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::CONFLICT {
            return Err(StoreError::Conflict(message));
        }
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(filters);
        let response = Self::check(self.authed(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Option<T>, StoreError> {
        Ok(self.select(table, filters).await?.into_iter().next())
    }

    async fn insert<T: serde::Serialize + Sync>(&self, table: &str, row: &T) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(row);
        Self::check(self.authed(request).send().await?).await?;
        Ok(())
    }

    /// PATCH matching rows; returns how many were touched.
    async fn update(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: serde_json::Value,
    ) -> Result<usize, StoreError> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(filters)
            .header("Prefer", "return=representation")
            .json(&body);
        let response = Self::check(self.authed(request).send().await?).await?;
        let rows: Vec<serde_json::Value> = response.json().await?;
        Ok(rows.len())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl QrStore for HostedStore {
    async fn insert_qr(&self, record: &QrRecord) -> Result<(), StoreError> {
        self.insert("qr_codes", record).await
    }

    async fn find_qr(&self, id: &str) -> Result<Option<QrRecord>, StoreError> {
        self.select_one("qr_codes", &[("id", eq(id))]).await
    }

    async fn list_qr(&self, user_id: &str) -> Result<Vec<QrRecord>, StoreError> {
        self.select(
            "qr_codes",
            &[
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn delete_qr(&self, id: &str, user_id: &str) -> Result<bool, StoreError> {
        let request = self
            .client
            .delete(self.table_url("qr_codes"))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .header("Prefer", "return=representation");
        let response = Self::check(self.authed(request).send().await?).await?;
        let rows: Vec<serde_json::Value> = response.json().await?;
        Ok(!rows.is_empty())
    }

    async fn increment_scan_count(&self, id: &str) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.rpc_url("increment_scan_count"))
            .json(&serde_json::json!({ "row_id": id }));
        Self::check(self.authed(request).send().await?).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self
            .client
            .get(self.table_url("qr_codes"))
            .query(&[("select", "id"), ("limit", "1")]);
        Self::check(self.authed(request).send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for HostedStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        if self.find_user_by_username(&user.username).await?.is_some() {
            return Err(StoreError::Conflict(format!("user {}", user.username)));
        }
        self.insert("users", user).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.select_one("users", &[("username", eq(username))]).await
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.select_one("users", &[("id", eq(id))]).await
    }

    async fn set_plan(&self, id: &str, plan: Plan) -> Result<bool, StoreError> {
        let touched = self
            .update(
                "users",
                &[("id", eq(id))],
                serde_json::json!({ "plan": plan }),
            )
            .await?;
        Ok(touched > 0)
    }

    async fn touch_last_login(&self, id: &str) -> Result<(), StoreError> {
        self.update(
            "users",
            &[("id", eq(id))],
            serde_json::json!({ "last_login": chrono::Utc::now() }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ImageStore for HostedStore {
    async fn put_image(&self, image: &UploadedImage) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.object_url(&image.key))
            .header(reqwest::header::CONTENT_TYPE, &image.content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(image.bytes.clone());
        Self::check(self.authed(request).send().await?).await?;
        Ok(())
    }

    async fn get_image(&self, key: &str) -> Result<Option<UploadedImage>, StoreError> {
        let response = self.client.get(self.public_url(key)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND
            || response.status() == reqwest::StatusCode::BAD_REQUEST
        {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(Some(UploadedImage {
            key: key.to_string(),
            content_type,
            bytes,
        }))
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url, self.config.bucket, key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HostedStore {
        HostedStore::new(HostedConfig {
            url: "https://project.example.co/".into(),
            api_key: "anon-key".into(),
            bucket: "uploads".into(),
        })
        .unwrap()
    }

    #[test]
    fn builds_endpoint_urls() {
        let store = store();
        assert_eq!(
            store.table_url("qr_codes"),
            "https://project.example.co/rest/v1/qr_codes"
        );
        assert_eq!(
            store.rpc_url("increment_scan_count"),
            "https://project.example.co/rest/v1/rpc/increment_scan_count"
        );
        assert_eq!(
            store.object_url("1-abc.png"),
            "https://project.example.co/storage/v1/object/uploads/1-abc.png"
        );
        assert_eq!(
            store.public_url("1-abc.png"),
            "https://project.example.co/storage/v1/object/public/uploads/1-abc.png"
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let debug = format!("{:?}", store().config);
        assert!(!debug.contains("anon-key"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn filters_use_eq_operator() {
        assert_eq!(eq("abc"), "eq.abc");
    }
}
