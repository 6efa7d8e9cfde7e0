#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::db::store::{ImageStore, QrStore, StoreError, UserStore};
use crate::models::image::UploadedImage;
use crate::models::plan::Plan;
use crate::models::qr_record::QrRecord;
use crate::models::user::User;

/// In-process backend for local runs and tests. Images are served by this
/// service under `/storage/{key}`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    origin: String,
    qr_codes: DashMap<String, QrRecord>,
    users: DashMap<String, User>,
    images: DashMap<String, UploadedImage>,
    #[cfg(test)]
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Make every write fail, to exercise error paths.
    #[cfg(test)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                message: "memory store is read-only".into(),
            });
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn check_writable(&self) -> Result<(), StoreError> {
        Ok(())
    }

    #[cfg(test)]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

#[async_trait]
impl QrStore for MemoryStore {
    async fn insert_qr(&self, record: &QrRecord) -> Result<(), StoreError> {
        self.check_writable()?;
        match self.qr_codes.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("QR code {}", record.id))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn find_qr(&self, id: &str) -> Result<Option<QrRecord>, StoreError> {
        Ok(self.qr_codes.get(id).map(|r| r.value().clone()))
    }

    async fn list_qr(&self, user_id: &str) -> Result<Vec<QrRecord>, StoreError> {
        let mut records: Vec<QrRecord> = self
            .qr_codes
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete_qr(&self, id: &str, user_id: &str) -> Result<bool, StoreError> {
        self.check_writable()?;
        Ok(self
            .qr_codes
            .remove_if(id, |_, record| record.user_id == user_id)
            .is_some())
    }

    async fn increment_scan_count(&self, id: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        if let Some(mut record) = self.qr_codes.get_mut(id) {
            record.scan_count += 1;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!("user {}", user.username)));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn set_plan(&self, id: &str, plan: Plan) -> Result<bool, StoreError> {
        self.check_writable()?;
        match self.users.get_mut(id) {
            Some(mut user) => {
                user.plan = plan;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(&self, id: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        if let Some(mut user) = self.users.get_mut(id) {
            user.last_login = Some(chrono::Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn put_image(&self, image: &UploadedImage) -> Result<(), StoreError> {
        self.check_writable()?;
        match self.images.entry(image.key.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("object {}", image.key))),
            Entry::Vacant(slot) => {
                slot.insert(image.clone());
                Ok(())
            }
        }
    }

    async fn get_image(&self, key: &str) -> Result<Option<UploadedImage>, StoreError> {
        Ok(self.images.get(key).map(|i| i.value().clone()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/storage/{}", self.origin, key)
    }
}
