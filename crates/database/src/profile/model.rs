use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One referral attribution, appended to the referrer's profile when a
/// referred user finishes the onboarding form. Append-only afterwards,
/// except the `claimed` flag which is reserved for a future claim flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralRecord {
    /// Telegram id of the referred user
    pub user_id: String,
    /// Display name of the referred user at completion time
    pub username: Option<String>,
    pub completed: bool,
    pub claimed: bool,
    /// Completion timestamp (unix seconds)
    pub referred_at: u64,
}

/// User profile model
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    /// MongoDB document id
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Stable Telegram user id, the external identity key
    pub telegram_id: String,
    /// Platform username snapshot taken on first contact
    pub username: Option<String>,
    /// Platform first name snapshot taken on first contact
    pub first_name: Option<String>,
    /// Step-1 answer, always `@`-prefixed
    #[validate(length(min = 5))]
    pub telegram_handle: Option<String>,
    /// Step-2 answer, stored without the `@`
    #[validate(length(min = 1, max = 15))]
    pub twitter_handle: Option<String>,
    /// Step-3 answer, a validated USDT (BEP20) address
    pub payout_address: Option<String>,
    /// Balance in USD
    pub balance: f64,
    pub referrals: Vec<ReferralRecord>,
    pub profile_completed: bool,
    /// Creation timestamp (unix seconds)
    pub created_at: u64,
}

impl UserProfile {
    /// Fresh profile for a first-contact user. Form fields start empty.
    pub fn new(telegram_id: &str, username: Option<String>, first_name: Option<String>) -> Self {
        Self {
            id: None,
            telegram_id: telegram_id.to_string(),
            username,
            first_name,
            telegram_handle: None,
            twitter_handle: None,
            payout_address: None,
            balance: 0.0,
            referrals: Vec::new(),
            profile_completed: false,
            created_at: Utc::now().timestamp() as u64,
        }
    }

    /// All three form answers are present.
    pub fn has_all_answers(&self) -> bool {
        self.telegram_handle.is_some() && self.twitter_handle.is_some() && self.payout_address.is_some()
    }

    /// Whatever name we can show for this user: username first, then
    /// first name, then the bare id.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .unwrap_or_else(|| self.telegram_id.clone())
    }
}
