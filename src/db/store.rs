use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::image::UploadedImage;
use crate::models::plan::Plan;
use crate::models::qr_record::QrRecord;
use crate::models::user::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("{0} already exists")]
    Conflict(String),
}

/// Saved QR records and their scan counters.
#[async_trait]
pub trait QrStore: Send + Sync {
    async fn insert_qr(&self, record: &QrRecord) -> Result<(), StoreError>;

    async fn find_qr(&self, id: &str) -> Result<Option<QrRecord>, StoreError>;

    /// Records owned by `user_id`, newest first.
    async fn list_qr(&self, user_id: &str) -> Result<Vec<QrRecord>, StoreError>;

    /// Delete a record if `user_id` owns it. Returns `true` if it existed.
    async fn delete_qr(&self, id: &str, user_id: &str) -> Result<bool, StoreError>;

    /// Add one to the scan counter. Missing ids are not an error.
    async fn increment_scan_count(&self, id: &str) -> Result<(), StoreError>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the username is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn set_plan(&self, id: &str, plan: Plan) -> Result<bool, StoreError>;

    async fn touch_last_login(&self, id: &str) -> Result<(), StoreError>;
}

/// Object storage for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store a new object. Existing keys are never overwritten.
    async fn put_image(&self, image: &UploadedImage) -> Result<(), StoreError>;

    /// Fetch bytes for backends that serve images themselves.
    async fn get_image(&self, key: &str) -> Result<Option<UploadedImage>, StoreError>;

    /// Public URL of the raw object.
    fn public_url(&self, key: &str) -> String;
}

/// One configured backend seen through all three store traits.
#[derive(Clone)]
pub struct Backend {
    pub name: &'static str,
    pub qr: Arc<dyn QrStore>,
    pub users: Arc<dyn UserStore>,
    pub images: Arc<dyn ImageStore>,
}

impl Backend {
    pub fn new<S>(name: &'static str, store: S) -> Self
    where
        S: QrStore + UserStore + ImageStore + 'static,
    {
        Self::from_shared(name, Arc::new(store))
    }

    /// Like [`Backend::new`] but keeps a handle to the concrete store.
    pub fn from_shared<S>(name: &'static str, store: Arc<S>) -> Self
    where
        S: QrStore + UserStore + ImageStore + 'static,
    {
        Self {
            name,
            qr: store.clone(),
            users: store.clone(),
            images: store,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("name", &self.name).finish()
    }
}
