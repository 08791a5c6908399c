use crate::{profile::model::UserProfile, Database};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::ReplaceOptions,
};
use std::sync::Arc;
use utils::AppResult;

pub type DynProfileRepository = Arc<dyn ProfileRepositoryTrait + Send + Sync>;

// Mounted in the engine to mark the Database as providing this capability.
#[async_trait]
pub trait ProfileRepositoryTrait {
    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<UserProfile>>;

    // Lookup by the stable external identity
    async fn find_by_telegram_id(&self, telegram_id: &str) -> AppResult<Option<UserProfile>>;

    // Lazy creation on first contact
    async fn find_or_create(
        &self,
        telegram_id: &str,
        username: Option<String>,
        first_name: Option<String>,
    ) -> AppResult<UserProfile>;

    // Upsert by telegram_id; the single write path for profile mutations
    async fn save(&self, profile: &UserProfile) -> AppResult<()>;
}

#[async_trait]
impl ProfileRepositoryTrait for Database {
    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<UserProfile>> {
        let filter = doc! {"_id": id};
        let profile = self.profiles.find_one(filter, None).await?;

        Ok(profile)
    }

    async fn find_by_telegram_id(&self, telegram_id: &str) -> AppResult<Option<UserProfile>> {
        let filter = doc! {"telegram_id": telegram_id};
        let profile = self.profiles.find_one(filter, None).await?;

        Ok(profile)
    }

    async fn find_or_create(
        &self,
        telegram_id: &str,
        username: Option<String>,
        first_name: Option<String>,
    ) -> AppResult<UserProfile> {
        if let Some(existing) = self.find_by_telegram_id(telegram_id).await? {
            return Ok(existing);
        }

        let new_doc = UserProfile::new(telegram_id, username, first_name);
        let inserted = self.profiles.insert_one(&new_doc, None).await?;

        let mut profile = new_doc;
        profile.id = inserted.inserted_id.as_object_id();

        Ok(profile)
    }

    async fn save(&self, profile: &UserProfile) -> AppResult<()> {
        let filter = doc! {"telegram_id": &profile.telegram_id};
        let options = ReplaceOptions::builder().upsert(true).build();
        self.profiles.replace_one(filter, profile, options).await?;

        Ok(())
    }
}
