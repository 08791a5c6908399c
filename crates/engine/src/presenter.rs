use crate::form::Identity;
use async_trait::async_trait;
use std::sync::Arc;
use utils::AppResult;

/// Everything the engine ever says, as intent. Rendering (HTML, emoji,
/// keyboards) is the presenter's concern, not the engine's.
#[derive(Debug, Clone, PartialEq)]
pub enum BotReply {
    /// Edit intro + step-1 prompt (Telegram handle)
    EditIntro,
    /// Step-2 prompt (Twitter handle)
    TwitterPrompt,
    /// Step-3 prompt (payout address)
    AddressPrompt,

    TelegramHandleNeedsAt,
    TelegramHandleTooShort,
    TwitterHandleEmpty,
    TwitterHandleTooLong,
    AddressRejected,

    /// The completing user was brought here by someone
    ReferralWelcome { referrer: String },
    /// Final summary once all three steps are done
    ProfileCompleted {
        telegram_handle: String,
        twitter_handle: String,
        payout_address: String,
    },
    ProfileSummary {
        telegram_handle: Option<String>,
        twitter_handle: Option<String>,
        payout_address: Option<String>,
        balance: f64,
        referral_count: usize,
        completed: bool,
    },
    MainMenu,
    /// Free text arrived outside any form step
    CommandHint,

    /// Store unavailable; the step was not consumed, resubmitting retries it
    StoreUnavailable,
    /// Anything else went wrong
    Unexpected,
}

#[async_trait]
pub trait Presenter {
    async fn present(&self, who: &Identity, reply: BotReply) -> AppResult<()>;
}

pub type DynPresenter = Arc<dyn Presenter + Send + Sync>;
