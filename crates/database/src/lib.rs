////////////////////////////////////////////////////////////////////////
//
// 1. Each domain (entity) gets its own folder
// 2. Each domain has two parts:
//    - model: schema definition
//    - repository: the actual low-level database operations
//
//////////////////////////////////////////////////////////////////////

use mongodb::{Client, Collection};
use std::sync::Arc;
use tracing::info;
use utils::{AppConfig, AppResult};

pub mod profile;

#[derive(Clone, Debug)]
pub struct Database {
    pub profiles: Collection<profile::model::UserProfile>,
}

impl Database {
    pub async fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        let db: mongodb::Database = client.database(&config.mongo_db);

        let profiles = db.collection("UserProfile");

        info!("🧱 database({:#}) connected.", &config.mongo_db);

        Ok(Database { profiles })
    }
}

pub use profile::model::{ReferralRecord, UserProfile};
pub use profile::repository::{DynProfileRepository, ProfileRepositoryTrait};
