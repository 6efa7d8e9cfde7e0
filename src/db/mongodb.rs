use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection, Database};

use crate::db::store::{ImageStore, QrStore, StoreError, UserStore};
use crate::models::image::UploadedImage;
use crate::models::plan::Plan;
use crate::models::qr_record::QrRecord;
use crate::models::user::User;

/// Connect and select the database.
pub async fn get_database(uri: &str, name: &str) -> mongodb::error::Result<Database> {
    let client = Client::with_uri_str(uri).await?;
    Ok(client.database(name))
}

/// Self-hosted backend on MongoDB. Records are keyed by their own `id`
/// field; the driver-generated `_id` is ignored.
pub struct MongoStore {
    db: Database,
    origin: String,
}

impl MongoStore {
    pub fn new(db: Database, origin: impl Into<String>) -> Self {
        Self {
            db,
            origin: origin.into(),
        }
    }

    fn qr_codes(&self) -> Collection<QrRecord> {
        self.db.collection::<QrRecord>("qr_codes")
    }

    fn users(&self) -> Collection<User> {
        self.db.collection::<User>("users")
    }

    fn images(&self) -> Collection<UploadedImage> {
        self.db.collection::<UploadedImage>("images")
    }
}

#[async_trait]
impl QrStore for MongoStore {
    async fn insert_qr(&self, record: &QrRecord) -> Result<(), StoreError> {
        self.qr_codes().insert_one(record).await?;
        Ok(())
    }

    async fn find_qr(&self, id: &str) -> Result<Option<QrRecord>, StoreError> {
        Ok(self.qr_codes().find_one(doc! { "id": id }).await?)
    }

    async fn list_qr(&self, user_id: &str) -> Result<Vec<QrRecord>, StoreError> {
        let mut records: Vec<QrRecord> = self
            .qr_codes()
            .find(doc! { "user_id": user_id })
            .await?
            .try_collect()
            .await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete_qr(&self, id: &str, user_id: &str) -> Result<bool, StoreError> {
        let result = self
            .qr_codes()
            .delete_one(doc! { "id": id, "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn increment_scan_count(&self, id: &str) -> Result<(), StoreError> {
        self.qr_codes()
            .update_one(doc! { "id": id }, doc! { "$inc": { "scan_count": 1 } })
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        // Check if username already exists
        let existing = self
            .users()
            .find_one(doc! { "username": &user.username })
            .await?;
        if existing.is_some() {
            return Err(StoreError::Conflict(format!("user {}", user.username)));
        }
        self.users().insert_one(user).await?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "username": username }).await?)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "id": id }).await?)
    }

    async fn set_plan(&self, id: &str, plan: Plan) -> Result<bool, StoreError> {
        let result = self
            .users()
            .update_one(doc! { "id": id }, doc! { "$set": { "plan": plan.as_str() } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn touch_last_login(&self, id: &str) -> Result<(), StoreError> {
        self.users()
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "last_login": chrono::Utc::now().to_rfc3339() } },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ImageStore for MongoStore {
    async fn put_image(&self, image: &UploadedImage) -> Result<(), StoreError> {
        let existing = self.images().find_one(doc! { "key": &image.key }).await?;
        if existing.is_some() {
            return Err(StoreError::Conflict(format!("object {}", image.key)));
        }
        self.images().insert_one(image).await?;
        Ok(())
    }

    async fn get_image(&self, key: &str) -> Result<Option<UploadedImage>, StoreError> {
        Ok(self.images().find_one(doc! { "key": key }).await?)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/storage/{}", self.origin, key)
    }
}
